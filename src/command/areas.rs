use crate::area::{AreaApi, RestAreaApi};
use crate::conf::Conf;
use crate::Result;
use tracing::info;

pub async fn run(conf: Conf) -> Result<()> {
    let api = RestAreaApi::new(&conf)?;
    let areas = api.get_areas().await?;
    info!(count = areas.len(), "Fetched areas");
    for area in areas {
        println!("{}\t{}", area.id, area.name);
    }
    Ok(())
}
