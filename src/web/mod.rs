pub mod html;

use crate::{
    area::{AreaApi, AreaId},
    map,
    screen::{service, EditForm, ScreenStore},
    Error, Result,
};
use actix_web::{
    get,
    http::header,
    post,
    web::{self, Data, Form, Path},
    HttpResponse, Responder,
};
use serde::Deserialize;
use std::{collections::HashMap, sync::Arc};
use tracing::warn;
use uuid::Uuid;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("edit")
            .service(mount)
            .service(get_screen)
            .service(select)
            .service(start_editing)
            .service(coordinates)
            .service(submit)
            .service(delete)
            .service(toggle_form)
            .service(get_map),
    );
}

#[derive(Deserialize)]
pub struct SelectArgs {
    area_id: AreaId,
}

fn screen_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).map_err(|_| Error::NotFound(format!("Screen {id} doesn't exist")))
}

fn redirect(id: Uuid) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, format!("/edit/{id}")))
        .finish()
}

// Rejected transitions are already on the screen as a notice, the user just
// sees the screen again
fn redirect_unless_fatal<T>(id: Uuid, res: Result<T>) -> Result<HttpResponse> {
    match res {
        Ok(_) => Ok(redirect(id)),
        Err(Error::InvalidState(e)) | Err(Error::InvalidInput(e)) => {
            warn!(screen = %id, reason = %e, "Rejected screen action");
            Ok(redirect(id))
        }
        Err(e) => Err(e),
    }
}

#[get("")]
pub async fn mount(store: Data<ScreenStore>, api: Data<dyn AreaApi>) -> Result<impl Responder> {
    let id = store.mount();
    service::load_areas(&store, api.get_ref(), id).await?;
    Ok(redirect(id))
}

#[get("/{screen}")]
pub async fn get_screen(screen: Path<String>, store: Data<ScreenStore>) -> Result<impl Responder> {
    let page = store.with(screen_id(&screen)?, |it| html::screen_page(it))?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(page))
}

#[post("/{screen}/select")]
pub async fn select(
    screen: Path<String>,
    args: Form<SelectArgs>,
    store: Data<ScreenStore>,
    api: Data<dyn AreaApi>,
) -> Result<impl Responder> {
    let id = screen_id(&screen)?;
    let res = service::select_area(&store, api.get_ref(), id, args.area_id).await;
    redirect_unless_fatal(id, res)
}

#[post("/{screen}/edit")]
pub async fn start_editing(screen: Path<String>, store: Data<ScreenStore>) -> Result<impl Responder> {
    let id = screen_id(&screen)?;
    let res = store.with(id, |it| it.start_editing())?;
    redirect_unless_fatal(id, res)
}

#[post("/{screen}/coordinates")]
pub async fn coordinates(
    screen: Path<String>,
    args: Form<HashMap<String, String>>,
    store: Data<ScreenStore>,
) -> Result<impl Responder> {
    let id = screen_id(&screen)?;
    let form = EditForm::from(args.into_inner());
    let res = store.with(id, |it| it.apply_coordinates(&form))?;
    redirect_unless_fatal(id, res)
}

#[post("/{screen}/submit")]
pub async fn submit(
    screen: Path<String>,
    args: Form<HashMap<String, String>>,
    store: Data<ScreenStore>,
    api: Data<dyn AreaApi>,
) -> Result<impl Responder> {
    let id = screen_id(&screen)?;
    let form = EditForm::from(args.into_inner());
    let res = service::submit(&store, api.get_ref(), id, &form).await;
    redirect_unless_fatal(id, res)
}

#[post("/{screen}/delete")]
pub async fn delete(
    screen: Path<String>,
    store: Data<ScreenStore>,
    api: Data<dyn AreaApi>,
) -> Result<impl Responder> {
    let id = screen_id(&screen)?;
    let res = service::delete(&store, api.get_ref(), id).await;
    redirect_unless_fatal(id, res)
}

#[post("/{screen}/toggle-form")]
pub async fn toggle_form(screen: Path<String>, store: Data<ScreenStore>) -> Result<impl Responder> {
    let id = screen_id(&screen)?;
    store.with(id, |it| it.toggle_form())?;
    Ok(redirect(id))
}

#[get("/{screen}/map/{map}")]
pub async fn get_map(
    path: Path<(String, String)>,
    store: Data<ScreenStore>,
) -> Result<impl Responder> {
    let (screen, map_id) = path.into_inner();
    let id = screen_id(&screen)?;
    let map_id =
        Uuid::parse_str(&map_id).map_err(|_| Error::NotFound(format!("Map {map_id} doesn't exist")))?;
    let view = store.with(id, |it| {
        it.map()
            .get(map_id)
            .map(|view| (view.png(), view.render()))
    })?;
    let Some((cached, render)) = view else {
        return Err(Error::NotFound(format!("Map {map_id} doesn't exist")));
    };
    let png = match cached {
        Some(png) => png,
        None => {
            let png = Arc::new(map::render(render).await?);
            // the view may have been replaced while rendering
            store.with(id, |it| {
                if let Some(view) = it.map_mut().get_mut(map_id) {
                    view.set_png(png.clone());
                }
            })?;
            png
        }
    };
    Ok(HttpResponse::Ok()
        .content_type("image/png")
        .body(png.to_vec()))
}

#[cfg(test)]
mod test {
    use crate::area::Vertex;
    use crate::screen::Phase;
    use crate::test::{mock_state, MockCall, MockOp};
    use crate::Result;
    use actix_web::dev::ServiceResponse;
    use actix_web::http::{header, StatusCode};
    use actix_web::test::{self, TestRequest};
    use actix_web::App;
    use uuid::Uuid;

    macro_rules! app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data($state.store.clone())
                    .app_data($state.api_data())
                    .configure(super::configure),
            )
            .await
        };
    }

    fn location<B>(res: &ServiceResponse<B>) -> String {
        res.headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string()
    }

    fn screen_id(location: &str) -> Uuid {
        Uuid::parse_str(location.trim_start_matches("/edit/")).unwrap()
    }

    #[actix_web::test]
    async fn mount_populates_selector() -> Result<()> {
        let state = mock_state();
        let app = app!(state);
        let res = test::call_service(&app, TestRequest::get().uri("/edit").to_request()).await;
        assert_eq!(StatusCode::SEE_OTHER, res.status());
        let location = location(&res);
        let req = TestRequest::get().uri(&location).to_request();
        let body = String::from_utf8(test::call_and_read_body(&app, req).await.to_vec()).unwrap();
        assert!(body.contains(r#"<option value="1">North</option>"#));
        assert!(body.contains(r#"<option value="2">South</option>"#));
        Ok(())
    }

    #[actix_web::test]
    async fn mount_with_failing_backend() -> Result<()> {
        let state = mock_state();
        state.api.fail(MockOp::GetAreas);
        let app = app!(state);
        let res = test::call_service(&app, TestRequest::get().uri("/edit").to_request()).await;
        assert_eq!(StatusCode::SEE_OTHER, res.status());
        let req = TestRequest::get().uri(&location(&res)).to_request();
        let body = String::from_utf8(test::call_and_read_body(&app, req).await.to_vec()).unwrap();
        assert!(!body.contains("<option"));
        assert!(body.contains("Failed to load areas"));
        Ok(())
    }

    #[actix_web::test]
    async fn edit_coordinates_and_submit() -> Result<()> {
        let state = mock_state();
        let app = app!(state);
        let res = test::call_service(&app, TestRequest::get().uri("/edit").to_request()).await;
        let location = location(&res);
        let id = screen_id(&location);

        let req = TestRequest::post()
            .uri(&format!("{location}/select"))
            .set_form([("area_id", "1")])
            .to_request();
        assert_eq!(StatusCode::SEE_OTHER, test::call_service(&app, req).await.status());
        let req = TestRequest::post().uri(&format!("{location}/edit")).to_request();
        assert_eq!(StatusCode::SEE_OTHER, test::call_service(&app, req).await.status());

        let req = TestRequest::get().uri(&location).to_request();
        let body = String::from_utf8(test::call_and_read_body(&app, req).await.to_vec()).unwrap();
        assert!(body.contains("Latitude 3"));
        assert!(body.contains(r#"name="lng_1" inputmode="decimal" value="21""#));

        let req = TestRequest::post()
            .uri(&format!("{location}/coordinates"))
            .set_form([("lat_0", "15.5")])
            .to_request();
        test::call_service(&app, req).await;
        let center = state
            .store
            .with(id, |it| it.map().current().map(|it| it.center()))?;
        assert_eq!(Some(Vertex::new(15.5, 20.)), center);

        let req = TestRequest::post()
            .uri(&format!("{location}/submit"))
            .set_form([
                ("name", "North"),
                ("code", "N2"),
                ("lat_0", "15.5"),
                ("lng_0", "20"),
                ("lat_1", "11"),
                ("lng_1", "99"),
                ("lat_2", "12"),
                ("lng_2", "22"),
            ])
            .to_request();
        assert_eq!(StatusCode::SEE_OTHER, test::call_service(&app, req).await.status());
        let calls = state.api.calls();
        assert_eq!(1, calls.len());
        let MockCall::Update(1, update) = &calls[0] else {
            panic!("expected update of area 1");
        };
        assert_eq!("N2", update.code);
        assert_eq!(
            vec![
                Vertex::new(15.5, 20.),
                Vertex::new(11., 99.),
                Vertex::new(12., 22.)
            ],
            update.geometry.ring()
        );

        let req = TestRequest::get().uri(&location).to_request();
        let body = String::from_utf8(test::call_and_read_body(&app, req).await.to_vec()).unwrap();
        assert!(body.contains("Successfully submitted"));
        assert!(body.contains(r#"href="/maps""#));
        assert!(!body.contains(r#"id="form""#));
        assert!(!body.contains(r#"id="map""#));
        Ok(())
    }

    #[actix_web::test]
    async fn failed_delete_keeps_form() -> Result<()> {
        let state = mock_state();
        state.api.fail(MockOp::Delete);
        let app = app!(state);
        let res = test::call_service(&app, TestRequest::get().uri("/edit").to_request()).await;
        let location = location(&res);
        let req = TestRequest::post()
            .uri(&format!("{location}/select"))
            .set_form([("area_id", "2")])
            .to_request();
        test::call_service(&app, req).await;
        let req = TestRequest::post().uri(&format!("{location}/delete")).to_request();
        assert_eq!(StatusCode::SEE_OTHER, test::call_service(&app, req).await.status());
        let req = TestRequest::get().uri(&location).to_request();
        let body = String::from_utf8(test::call_and_read_body(&app, req).await.to_vec()).unwrap();
        assert!(body.contains(r#"id="form""#));
        assert!(body.contains(r#"id="map""#));
        assert!(body.contains("Failed to delete area"));
        assert!(state.api.calls().is_empty());
        Ok(())
    }

    #[actix_web::test]
    async fn delete_shows_result() -> Result<()> {
        let state = mock_state();
        let app = app!(state);
        let res = test::call_service(&app, TestRequest::get().uri("/edit").to_request()).await;
        let location = location(&res);
        let id = screen_id(&location);
        let req = TestRequest::post()
            .uri(&format!("{location}/select"))
            .set_form([("area_id", "2")])
            .to_request();
        test::call_service(&app, req).await;
        let req = TestRequest::post().uri(&format!("{location}/delete")).to_request();
        test::call_service(&app, req).await;
        assert_eq!(Phase::Deleted, state.store.with(id, |it| it.phase().clone())?);
        let req = TestRequest::get().uri(&location).to_request();
        let body = String::from_utf8(test::call_and_read_body(&app, req).await.to_vec()).unwrap();
        assert!(body.contains("Successfully deleted"));
        assert!(body.contains(r#"href="/""#));
        Ok(())
    }

    #[actix_web::test]
    async fn edit_without_selection_shows_notice() -> Result<()> {
        let state = mock_state();
        let app = app!(state);
        let res = test::call_service(&app, TestRequest::get().uri("/edit").to_request()).await;
        let location = location(&res);
        let req = TestRequest::post().uri(&format!("{location}/edit")).to_request();
        assert_eq!(StatusCode::SEE_OTHER, test::call_service(&app, req).await.status());
        let req = TestRequest::get().uri(&location).to_request();
        let body = String::from_utf8(test::call_and_read_body(&app, req).await.to_vec()).unwrap();
        assert!(body.contains("Select an area before editing"));
        Ok(())
    }

    #[actix_web::test]
    async fn toggle_form_keeps_state() -> Result<()> {
        let state = mock_state();
        let app = app!(state);
        let res = test::call_service(&app, TestRequest::get().uri("/edit").to_request()).await;
        let location = location(&res);
        let id = screen_id(&location);
        let req = TestRequest::post()
            .uri(&format!("{location}/select"))
            .set_form([("area_id", "1")])
            .to_request();
        test::call_service(&app, req).await;
        let before = state.store.with(id, |it| it.phase().clone())?;

        let req = TestRequest::post().uri(&format!("{location}/toggle-form")).to_request();
        test::call_service(&app, req).await;
        let req = TestRequest::get().uri(&location).to_request();
        let body = String::from_utf8(test::call_and_read_body(&app, req).await.to_vec()).unwrap();
        assert!(body.contains("Show Form"));
        assert!(!body.contains(r#"id="form""#));
        assert!(body.contains(r#"id="map""#));
        assert_eq!(before, state.store.with(id, |it| it.phase().clone())?);

        let req = TestRequest::post().uri(&format!("{location}/toggle-form")).to_request();
        test::call_service(&app, req).await;
        let req = TestRequest::get().uri(&location).to_request();
        let body = String::from_utf8(test::call_and_read_body(&app, req).await.to_vec()).unwrap();
        assert!(body.contains("Hide Form"));
        assert!(body.contains(r#"id="form""#));
        assert_eq!(before, state.store.with(id, |it| it.phase().clone())?);
        Ok(())
    }

    #[actix_web::test]
    async fn notice_shown_with_hidden_form() -> Result<()> {
        let state = mock_state();
        state.api.fail(MockOp::Delete);
        let app = app!(state);
        let res = test::call_service(&app, TestRequest::get().uri("/edit").to_request()).await;
        let location = location(&res);
        let req = TestRequest::post()
            .uri(&format!("{location}/select"))
            .set_form([("area_id", "1")])
            .to_request();
        test::call_service(&app, req).await;
        let req = TestRequest::post().uri(&format!("{location}/toggle-form")).to_request();
        test::call_service(&app, req).await;
        let req = TestRequest::post().uri(&format!("{location}/delete")).to_request();
        test::call_service(&app, req).await;
        let req = TestRequest::get().uri(&location).to_request();
        let body = String::from_utf8(test::call_and_read_body(&app, req).await.to_vec()).unwrap();
        assert!(!body.contains(r#"id="form""#));
        assert!(body.contains("Failed to delete area"));
        Ok(())
    }

    #[actix_web::test]
    async fn update_map_keeps_typed_fields() -> Result<()> {
        let state = mock_state();
        let app = app!(state);
        let res = test::call_service(&app, TestRequest::get().uri("/edit").to_request()).await;
        let location = location(&res);
        let id = screen_id(&location);
        let req = TestRequest::post()
            .uri(&format!("{location}/select"))
            .set_form([("area_id", "1")])
            .to_request();
        test::call_service(&app, req).await;
        let req = TestRequest::post().uri(&format!("{location}/edit")).to_request();
        test::call_service(&app, req).await;

        let req = TestRequest::post()
            .uri(&format!("{location}/coordinates"))
            .set_form([
                ("name", "Renamed"),
                ("code", "RN"),
                ("lat_0", "15"),
                ("lng_0", "20"),
            ])
            .to_request();
        assert_eq!(StatusCode::SEE_OTHER, test::call_service(&app, req).await.status());
        let req = TestRequest::get().uri(&location).to_request();
        let body = String::from_utf8(test::call_and_read_body(&app, req).await.to_vec()).unwrap();
        assert!(body.contains(r#"value="Renamed""#));
        assert!(body.contains(r#"value="RN""#));
        assert!(body.contains(r#"name="lat_0" inputmode="decimal" value="15""#));

        let req = TestRequest::post()
            .uri(&format!("{location}/coordinates"))
            .set_form([("lat_0", "77"), ("lat_9", "1")])
            .to_request();
        assert_eq!(StatusCode::SEE_OTHER, test::call_service(&app, req).await.status());
        let ring = state.store.with(id, |it| {
            it.draft().map(|it| it.geometry.ring().to_vec()).unwrap_or_default()
        })?;
        assert_eq!(Vertex::new(15., 20.), ring[0]);
        assert_eq!(3, ring.len());
        Ok(())
    }

    #[actix_web::test]
    async fn unknown_screen() {
        let state = mock_state();
        let app = app!(state);
        let req = TestRequest::get()
            .uri(&format!("/edit/{}", Uuid::new_v4()))
            .to_request();
        assert_eq!(StatusCode::NOT_FOUND, test::call_service(&app, req).await.status());
        let req = TestRequest::get().uri("/edit/not-a-uuid").to_request();
        assert_eq!(StatusCode::NOT_FOUND, test::call_service(&app, req).await.status());
    }

    #[actix_web::test]
    async fn stale_map_is_gone() -> Result<()> {
        let state = mock_state();
        let app = app!(state);
        let res = test::call_service(&app, TestRequest::get().uri("/edit").to_request()).await;
        let location = location(&res);
        let id = screen_id(&location);
        let req = TestRequest::post()
            .uri(&format!("{location}/select"))
            .set_form([("area_id", "1")])
            .to_request();
        test::call_service(&app, req).await;
        let first = state
            .store
            .with(id, |it| it.map().current().map(|it| it.id()))?
            .unwrap();
        let req = TestRequest::post()
            .uri(&format!("{location}/select"))
            .set_form([("area_id", "2")])
            .to_request();
        test::call_service(&app, req).await;
        let req = TestRequest::get()
            .uri(&format!("{location}/map/{first}"))
            .to_request();
        assert_eq!(StatusCode::NOT_FOUND, test::call_service(&app, req).await.status());
        Ok(())
    }
}
