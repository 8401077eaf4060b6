use crate::{
    area::Axis,
    map::ATTRIBUTION,
    screen::{EditForm, Phase, Screen},
};
use std::fmt::Write;

const STYLE: &str = r#"
body { margin: 0; font-family: sans-serif; }
#map { display: block; margin: 0 auto; }
.attribution { text-align: center; font-size: 0.8em; }
#form { position: absolute; top: 1em; left: 1em; max-width: 600px; padding: 1em; border-radius: 0.75em; background: rgba(88, 28, 135, 0.85); color: white; }
#form label { display: inline-block; width: 8em; }
#toggle { position: fixed; bottom: 0.5em; left: 0.5em; z-index: 50; }
.notice { position: fixed; top: 0.5em; right: 0.5em; z-index: 50; padding: 0.5em; background: #fee2e2; color: #991b1b; border-radius: 0.25em; }
.result { position: fixed; top: 25%; left: 25%; width: 50%; padding: 2em; text-align: center; background: rgba(88, 28, 135, 0.8); color: white; }
"#;

pub fn escape(str: &str) -> String {
    str.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{}</title>
<style>{STYLE}</style>
</head>
<body>
{body}
</body>
</html>
"#,
        escape(title),
    )
}

pub fn error_page(status: u16, message: &str) -> String {
    layout(
        "Error",
        &format!(
            r#"<div class="result"><h1>{status}</h1><p>{}</p><p><a href="/edit">Open the area editor</a></p></div>"#,
            escape(message),
        ),
    )
}

pub fn screen_page(screen: &Screen) -> String {
    let base = format!("/edit/{}", screen.id());
    let mut body = String::new();
    let toggle_label = if screen.form_visible() {
        "Hide Form"
    } else {
        "Show Form"
    };
    let _ = write!(
        body,
        r#"<form method="post" action="{base}/toggle-form"><button id="toggle" type="submit">{toggle_label}</button></form>"#
    );
    if let Some(notice) = screen.notice() {
        let _ = write!(body, r#"<p id="notice" class="notice">{}</p>"#, escape(notice));
    }
    match screen.phase() {
        Phase::Submitted => body.push_str(&result_panel("Successfully submitted")),
        Phase::Deleted => body.push_str(&result_panel("Successfully deleted")),
        _ => {
            if let Some(view) = screen.map().current() {
                let _ = write!(
                    body,
                    r#"<img id="map" src="{base}/map/{}" width="{}" height="{}" alt="Area map"><p class="attribution">{ATTRIBUTION}</p>"#,
                    view.id(),
                    view.options().width,
                    view.options().height,
                );
            }
            if screen.form_visible() {
                body.push_str(&form_panel(screen, &base));
            }
        }
    }
    layout("Edit area", &body)
}

fn result_panel(title: &str) -> String {
    format!(
        r#"<div class="result"><h1>{}</h1><p><a href="/maps">See the areas</a> <a href="/">Home Page</a></p></div>"#,
        escape(title),
    )
}

fn form_panel(screen: &Screen, base: &str) -> String {
    let mut html = String::from(r#"<div id="form">"#);
    html.push_str(&selector(screen, base));
    match screen.draft() {
        Some(draft) => {
            let _ = write!(
                html,
                r#"<form method="post" action="{base}/submit">
<p><label for="name">Area name</label><input id="name" name="name" placeholder="name" value="{}" required></p>
<p><label for="code">Area code</label><input id="code" name="code" placeholder="code" value="{}" required></p>
"#,
                escape(&draft.name),
                escape(&draft.code),
            );
            for (index, vertex) in draft.geometry.ring().iter().enumerate() {
                html.push_str("<div>");
                for (axis, label) in [(Axis::Lat, "Latitude"), (Axis::Lng, "Longitude")] {
                    let field = EditForm::coordinate_field(index, axis);
                    let _ = write!(
                        html,
                        r#"<p><label for="{field}">{label} {}</label><input id="{field}" name="{field}" inputmode="decimal" value="{}"></p>"#,
                        index + 1,
                        vertex.get(axis),
                    );
                }
                html.push_str("</div>\n");
            }
            let _ = write!(
                html,
                r#"<p><button type="submit" formaction="{base}/coordinates" formnovalidate>Update map</button> <button type="submit">Submit</button></p>
</form>
"#
            );
        }
        None => {
            let _ = write!(
                html,
                r#"<form method="post" action="{base}/edit"><p><label>Edit the info</label><button type="submit">Edit</button></p></form>"#
            );
        }
    }
    let _ = write!(
        html,
        r#"<form method="post" action="{base}/delete"><p><label>Delete</label><button type="submit">Delete</button></p></form>"#
    );
    html.push_str("</div>");
    html
}

fn selector(screen: &Screen, base: &str) -> String {
    let Some(areas) = screen.areas() else {
        return r#"<p><label>Select Area</label>No areas available</p>"#.into();
    };
    let selected = screen.current_area().map(|it| it.id);
    let mut html = format!(
        r#"<form method="post" action="{base}/select"><p><label for="area_id">Select Area</label><select id="area_id" name="area_id" required>"#
    );
    for area in areas {
        let _ = write!(
            html,
            r#"<option value="{}"{}>{}</option>"#,
            area.id,
            if selected == Some(area.id) {
                " selected"
            } else {
                ""
            },
            escape(&area.name),
        );
    }
    html.push_str(r#"</select> <button type="submit">Load</button></p></form>"#);
    html
}
