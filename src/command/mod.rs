pub mod areas;
pub mod render_map;
pub mod server;
