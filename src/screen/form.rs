use crate::area::Axis;
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq)]
pub struct CoordinateEdit {
    pub index: usize,
    pub axis: Axis,
    pub value: String,
}

/// Fields posted by the edit form. Coordinate inputs are named `lat_{index}`
/// and `lng_{index}` with a zero-based vertex index.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EditForm {
    pub name: Option<String>,
    pub code: Option<String>,
    pub coordinates: Vec<CoordinateEdit>,
}

impl EditForm {
    #[cfg(test)]
    pub fn new(name: Option<&str>, code: Option<&str>, coordinates: &[(usize, Axis, &str)]) -> Self {
        EditForm {
            name: name.map(Into::into),
            code: code.map(Into::into),
            coordinates: coordinates
                .iter()
                .map(|(index, axis, value)| CoordinateEdit {
                    index: *index,
                    axis: *axis,
                    value: value.to_string(),
                })
                .collect(),
        }
    }

    pub fn coordinate_field(index: usize, axis: Axis) -> String {
        format!("{axis}_{index}")
    }
}

impl From<HashMap<String, String>> for EditForm {
    fn from(mut fields: HashMap<String, String>) -> Self {
        let name = fields.remove("name");
        let code = fields.remove("code");
        let mut coordinates: Vec<CoordinateEdit> = fields
            .into_iter()
            .filter_map(|(key, value)| {
                let (axis, index) = key.split_once('_')?;
                Some(CoordinateEdit {
                    index: index.parse().ok()?,
                    axis: axis.parse().ok()?,
                    value,
                })
            })
            .collect();
        coordinates.sort_by_key(|it| (it.index, it.axis == Axis::Lng));
        EditForm {
            name,
            code,
            coordinates,
        }
    }
}
