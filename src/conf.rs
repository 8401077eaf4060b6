use crate::{Error, Result};
use std::{env, str::FromStr, time::Duration};
use url::Url;

pub const DEFAULT_TILE_URL: &str = "https://a.tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const MAX_ZOOM: u8 = 19;

#[derive(Clone, Debug)]
pub struct Conf {
    pub api_url: Url,
    pub api_token: Option<String>,
    pub bind: String,
    pub port: u16,
    pub tile_url: String,
    pub map_zoom: u8,
    pub map_width: u32,
    pub map_height: u32,
    pub screen_ttl: Duration,
    pub request_timeout: Option<Duration>,
}

const API_URL: &str = "AREA_EDITOR_API_URL";
const API_TOKEN: &str = "AREA_EDITOR_API_TOKEN";
const BIND: &str = "AREA_EDITOR_BIND";
const PORT: &str = "AREA_EDITOR_PORT";
const TILE_URL: &str = "AREA_EDITOR_TILE_URL";
const MAP_ZOOM: &str = "AREA_EDITOR_MAP_ZOOM";
const MAP_WIDTH: &str = "AREA_EDITOR_MAP_WIDTH";
const MAP_HEIGHT: &str = "AREA_EDITOR_MAP_HEIGHT";
const SCREEN_TTL_SEC: &str = "AREA_EDITOR_SCREEN_TTL_SEC";
const REQUEST_TIMEOUT_SEC: &str = "AREA_EDITOR_REQUEST_TIMEOUT_SEC";

impl Conf {
    pub fn from_env() -> Result<Conf> {
        Conf::from_vars(|name| env::var(name).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Conf> {
        let var = |name: &str| var(name).filter(|it| !it.trim().is_empty());
        let api_url = var(API_URL).unwrap_or("http://127.0.0.1:8000".into());
        let tile_url = var(TILE_URL).unwrap_or(DEFAULT_TILE_URL.into());
        if !tile_url.contains("{z}") || !tile_url.contains("{x}") || !tile_url.contains("{y}") {
            return Err(Error::Conf(format!(
                "{TILE_URL} must contain {{z}}, {{x}} and {{y}} placeholders"
            )));
        }
        let map_zoom: u8 = parse(MAP_ZOOM, var(MAP_ZOOM))?.unwrap_or(MAX_ZOOM);
        if map_zoom > MAX_ZOOM {
            return Err(Error::Conf(format!(
                "{MAP_ZOOM} can't be greater than {MAX_ZOOM}"
            )));
        }
        Ok(Conf {
            api_url: Url::parse(&api_url)
                .map_err(|e| Error::Conf(format!("{API_URL} is not a valid URL: {e}")))?,
            api_token: var(API_TOKEN),
            bind: var(BIND).unwrap_or("127.0.0.1".into()),
            port: parse(PORT, var(PORT))?.unwrap_or(8080),
            tile_url,
            map_zoom,
            map_width: parse(MAP_WIDTH, var(MAP_WIDTH))?.unwrap_or(800),
            map_height: parse(MAP_HEIGHT, var(MAP_HEIGHT))?.unwrap_or(600),
            screen_ttl: Duration::from_secs(
                parse(SCREEN_TTL_SEC, var(SCREEN_TTL_SEC))?.unwrap_or(1800),
            ),
            request_timeout: parse(REQUEST_TIMEOUT_SEC, var(REQUEST_TIMEOUT_SEC))?
                .map(Duration::from_secs),
        })
    }

    #[cfg(test)]
    pub fn mock() -> Conf {
        Conf::from_vars(|_| None).unwrap()
    }
}

fn parse<T: FromStr>(name: &str, value: Option<String>) -> Result<Option<T>> {
    value
        .map(|it| {
            it.trim()
                .parse()
                .map_err(|_| Error::Conf(format!("{name} has invalid value: {it}")))
        })
        .transpose()
}
