use crate::area::{AreaApi, AreaId, RestAreaApi};
use crate::conf::Conf;
use crate::map::{self, MapOptions, MapSlot};
use crate::{Error, Result};
use std::fs;
use tracing::info;

pub async fn run(conf: Conf, args: &[String]) -> Result<()> {
    let [id, path] = args else {
        return Err(Error::CLI("Usage: render-map <area-id> <file.png>".into()));
    };
    let id: AreaId = id
        .parse()
        .map_err(|_| Error::CLI(format!("Invalid area id: {id}")))?;
    let api = RestAreaApi::new(&conf)?;
    let area = api.get_area_by_id(id).await?;
    let mut slot = MapSlot::default();
    slot.replace(Some(&area.geometry), &MapOptions::from(&conf));
    let Some(view) = slot.current() else {
        return Err(Error::InvalidInput(format!("Area {id} has no vertices")));
    };
    let png = map::render(view.render()).await?;
    fs::write(path, &png)?;
    info!(area_id = id, path, bytes = png.len(), "Saved area map");
    Ok(())
}
