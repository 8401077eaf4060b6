use crate::{Error, Result};
use geojson::{Geometry, Value};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub type AreaId = i64;

/// Selector item, as returned by the area listing.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AreaListEntry {
    pub id: AreaId,
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Area {
    pub id: AreaId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
    pub geometry: Polygon,
}

/// Positions keep the backend's `[lat, lng]` order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub lat: f64,
    pub lng: f64,
}

impl Vertex {
    pub fn new(lat: f64, lng: f64) -> Self {
        Vertex { lat, lng }
    }

    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Lat => self.lat,
            Axis::Lng => self.lng,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Axis {
    Lat,
    Lng,
}

/// Single outer ring, no holes. The vertex count is fixed once loaded.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(try_from = "Geometry", into = "Geometry")]
pub struct Polygon {
    ring: Vec<Vertex>,
}

impl Polygon {
    pub fn new(ring: Vec<Vertex>) -> Self {
        Polygon { ring }
    }

    pub fn ring(&self) -> &[Vertex] {
        &self.ring
    }

    pub fn first_vertex(&self) -> Option<Vertex> {
        self.ring.first().copied()
    }

    pub fn set_coordinate(&mut self, index: usize, axis: Axis, value: f64) -> Result<()> {
        let len = self.ring.len();
        let Some(vertex) = self.ring.get_mut(index) else {
            return Err(Error::InvalidInput(format!(
                "Vertex {index} is out of range, ring has {len} vertices"
            )));
        };
        match axis {
            Axis::Lat => vertex.lat = value,
            Axis::Lng => vertex.lng = value,
        }
        Ok(())
    }
}

impl TryFrom<Geometry> for Polygon {
    type Error = Error;

    fn try_from(geometry: Geometry) -> Result<Self> {
        let Value::Polygon(rings) = geometry.value else {
            return Err(Error::InvalidInput("Expected Polygon geometry".into()));
        };
        let ring = match rings.into_iter().next() {
            Some(outer) => outer
                .into_iter()
                .map(|position| match position[..] {
                    [lat, lng, ..] => Ok(Vertex::new(lat, lng)),
                    _ => Err(Error::InvalidInput(format!(
                        "Position must have at least 2 values, got {}",
                        position.len()
                    ))),
                })
                .collect::<Result<Vec<_>>>()?,
            None => vec![],
        };
        Ok(Polygon::new(ring))
    }
}

impl From<Polygon> for Geometry {
    fn from(polygon: Polygon) -> Self {
        let ring = polygon
            .ring
            .into_iter()
            .map(|it| vec![it.lat, it.lng])
            .collect();
        Geometry::new(Value::Polygon(vec![ring]))
    }
}

/// Number input coercion: the longest numeric prefix wins, anything that
/// doesn't start with a number (or evaluates to zero or a non-finite value)
/// becomes 0.
pub fn coerce_coordinate(input: &str) -> f64 {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let digits_from = |mut pos: usize| {
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        pos
    };
    let mut end = match bytes.first() {
        Some(b'+' | b'-') => 1,
        _ => 0,
    };
    let int_end = digits_from(end);
    let mut digits = int_end - end;
    end = int_end;
    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        let frac_digits = frac_end - end - 1;
        if digits + frac_digits > 0 {
            digits += frac_digits;
            end = frac_end;
        }
    }
    if digits == 0 {
        return 0.0;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_start = end + 1;
        if matches!(bytes.get(exp_start), Some(b'+' | b'-')) {
            exp_start += 1;
        }
        let exp_end = digits_from(exp_start);
        if exp_end > exp_start {
            end = exp_end;
        }
    }
    match s[..end].parse::<f64>() {
        Ok(value) if value.is_finite() && value != 0.0 => value,
        _ => 0.0,
    }
}
