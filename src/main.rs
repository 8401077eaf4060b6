pub use error::Error;
mod area;
mod command;
mod conf;
mod error;
mod map;
mod screen;
mod web;
use conf::Conf;
use std::env;
use tracing_subscriber::EnvFilter;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[actix_web::main]
async fn main() -> Result<()> {
    init_logging();

    let conf = Conf::from_env()?;

    let args: Vec<String> = env::args().collect();

    let command = args.get(1).map(String::as_str).unwrap_or("server");

    match command {
        "server" => command::server::run(conf).await?,
        "areas" => command::areas::run(conf).await?,
        "render-map" => command::render_map::run(conf, &args[2..]).await?,
        first_arg => Err(Error::CLI(format!("Unknown command: {first_arg}")))?,
    }

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if cfg!(debug_assertions) {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt()
            .json()
            .without_time()
            .with_env_filter(filter)
            .init();
    }
}
