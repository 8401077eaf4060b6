use crate::{
    area::{Polygon, Vertex},
    conf::Conf,
    Result,
};
use actix_web::web;
use staticmap::{
    tools::{Color, LineBuilder},
    StaticMapBuilder,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

pub const ATTRIBUTION: &str = r#"Map data &copy; <a href="https://www.openstreetmap.org/">OpenStreetMap</a> contributors"#;

const OUTLINE_WIDTH: f32 = 3.;

#[derive(Clone, Debug, PartialEq)]
pub struct MapOptions {
    pub tile_url: String,
    pub zoom: u8,
    pub width: u32,
    pub height: u32,
}

impl From<&Conf> for MapOptions {
    fn from(conf: &Conf) -> Self {
        MapOptions {
            tile_url: conf.tile_url.clone(),
            zoom: conf.map_zoom,
            width: conf.map_width,
            height: conf.map_height,
        }
    }
}

/// A single rendered map: centered on the first vertex of the ring, with the
/// ring drawn on top of the tile layer. Views are never mutated after
/// creation apart from caching their PNG, any geometry change requires a new
/// view.
#[derive(Debug)]
pub struct MapView {
    id: Uuid,
    render: MapRender,
    png: Option<Arc<Vec<u8>>>,
}

impl MapView {
    fn new(polygon: &Polygon, options: &MapOptions) -> Option<MapView> {
        let center = polygon.first_vertex()?;
        Some(MapView {
            id: Uuid::new_v4(),
            render: MapRender {
                center,
                ring: polygon.ring().to_vec(),
                options: options.clone(),
            },
            png: None,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn center(&self) -> Vertex {
        self.render.center
    }

    pub fn ring(&self) -> &[Vertex] {
        &self.render.ring
    }

    pub fn options(&self) -> &MapOptions {
        &self.render.options
    }

    pub fn png(&self) -> Option<Arc<Vec<u8>>> {
        self.png.clone()
    }

    pub fn set_png(&mut self, png: Arc<Vec<u8>>) {
        self.png = Some(png);
    }

    pub fn render(&self) -> MapRender {
        self.render.clone()
    }
}

impl Drop for MapView {
    fn drop(&mut self) {
        debug!(map_id = %self.id, "Removed map view");
    }
}

/// Owns at most one map view. Replacing the view always removes the previous
/// one first, so a screen can't end up with two live maps.
#[derive(Debug, Default)]
pub struct MapSlot {
    view: Option<MapView>,
    created: u64,
    removed: u64,
}

impl MapSlot {
    pub fn replace(&mut self, polygon: Option<&Polygon>, options: &MapOptions) -> Option<Uuid> {
        self.clear();
        self.view = polygon.and_then(|it| MapView::new(it, options));
        let view = self.view.as_ref()?;
        self.created += 1;
        debug!(
            map_id = %view.id,
            lat = view.center().lat,
            lng = view.center().lng,
            zoom = options.zoom,
            vertices = view.ring().len(),
            live = self.created - self.removed,
            "Created map view",
        );
        Some(view.id)
    }

    pub fn clear(&mut self) {
        if self.view.take().is_some() {
            self.removed += 1;
        }
    }

    pub fn current(&self) -> Option<&MapView> {
        self.view.as_ref()
    }

    pub fn get(&self, id: Uuid) -> Option<&MapView> {
        self.view.as_ref().filter(|it| it.id == id)
    }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut MapView> {
        self.view.as_mut().filter(|it| it.id == id)
    }

    #[cfg(test)]
    pub fn created(&self) -> u64 {
        self.created
    }

    #[cfg(test)]
    pub fn removed(&self) -> u64 {
        self.removed
    }
}

/// Everything needed to draw a map, detached from the view so rendering can
/// happen off the screen lock.
#[derive(Clone, Debug, PartialEq)]
pub struct MapRender {
    pub center: Vertex,
    pub ring: Vec<Vertex>,
    pub options: MapOptions,
}

impl MapRender {
    /// Outline points, with the first vertex repeated at the end when the ring
    /// isn't closed already.
    pub fn outline(&self) -> (Vec<f64>, Vec<f64>) {
        let mut ring = self.ring.clone();
        if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
            if ring.len() > 1 && first != last {
                ring.push(first);
            }
        }
        ring.into_iter().map(|it| (it.lat, it.lng)).unzip()
    }

    pub fn render_png(&self) -> Result<Vec<u8>> {
        let mut map = StaticMapBuilder::default()
            .width(self.options.width)
            .height(self.options.height)
            .zoom(self.options.zoom)
            .lat_center(self.center.lat)
            .lon_center(self.center.lng)
            .url_template(self.options.tile_url.as_str())
            .build()?;
        let (lats, lngs) = self.outline();
        let outline = LineBuilder::default()
            .lat_coordinates(lats)
            .lon_coordinates(lngs)
            .width(OUTLINE_WIDTH)
            .simplify(false)
            .color(Color::new(true, 128, 0, 128, 255))
            .build()?;
        map.add_tool(outline);
        Ok(map.encode_png()?)
    }
}

/// Tile fetching and encoding are blocking, so they run on the blocking pool.
pub async fn render(render: MapRender) -> Result<Vec<u8>> {
    Ok(web::block(move || render.render_png()).await??)
}
