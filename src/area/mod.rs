pub mod client;
pub mod model;

pub use client::AreaApi;
pub use client::AreaUpdate;
pub use client::RestAreaApi;
pub use model::Area;
pub use model::AreaId;
pub use model::AreaListEntry;
pub use model::Axis;
pub use model::Polygon;
pub use model::Vertex;
