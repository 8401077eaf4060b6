pub mod form;
pub mod service;
pub mod store;

use crate::{
    area::{model::coerce_coordinate, Area, AreaId, AreaListEntry, AreaUpdate, Polygon},
    map::{MapOptions, MapSlot},
    Error, Result,
};
pub use form::EditForm;
use serde_json::Value;
pub use store::ScreenStore;
use strum::Display;
use tracing::{debug, error, info};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq)]
pub struct Draft {
    pub name: String,
    pub code: String,
    pub geometry: Polygon,
}

impl From<&Area> for Draft {
    fn from(area: &Area) -> Self {
        Draft {
            name: area.name.clone(),
            code: area.code.clone(),
            geometry: area.geometry.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Phase {
    Idle,
    ListLoaded,
    AreaSelected(Area),
    Editing { area: Area, draft: Draft },
    Submitted,
    Deleted,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Submitted | Phase::Deleted)
    }

    pub fn area(&self) -> Option<&Area> {
        match self {
            Phase::AreaSelected(area) | Phase::Editing { area, .. } => Some(area),
            _ => None,
        }
    }

    /// Geometry as it should appear on the map: the draft while editing.
    pub fn displayed_geometry(&self) -> Option<&Polygon> {
        match self {
            Phase::AreaSelected(area) => Some(&area.geometry),
            Phase::Editing { draft, .. } => Some(&draft.geometry),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum RequestKind {
    List,
    Detail,
    Mutation,
}

/// Issued when a backend call starts. Only the latest token of each kind is
/// accepted when the response comes back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token {
    kind: RequestKind,
    seq: u64,
}

#[derive(Debug, Default)]
struct InFlight {
    list: u64,
    detail: u64,
    mutation: u64,
}

impl InFlight {
    fn counter(&mut self, kind: RequestKind) -> &mut u64 {
        match kind {
            RequestKind::List => &mut self.list,
            RequestKind::Detail => &mut self.detail,
            RequestKind::Mutation => &mut self.mutation,
        }
    }

    fn begin(&mut self, kind: RequestKind) -> Token {
        let counter = self.counter(kind);
        *counter += 1;
        Token {
            kind,
            seq: *counter,
        }
    }

    fn is_current(&mut self, token: Token) -> bool {
        *self.counter(token.kind) == token.seq
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Outcome {
    Applied,
    Failed,
    Stale,
}

/// One mounted instance of the area editor.
#[derive(Debug)]
pub struct Screen {
    id: Uuid,
    phase: Phase,
    areas: Option<Vec<AreaListEntry>>,
    form_visible: bool,
    notice: Option<String>,
    map: MapSlot,
    map_options: MapOptions,
    in_flight: InFlight,
}

impl Screen {
    pub fn new(id: Uuid, map_options: MapOptions) -> Self {
        Screen {
            id,
            phase: Phase::Idle,
            areas: None,
            form_visible: true,
            notice: None,
            map: MapSlot::default(),
            map_options,
            in_flight: InFlight::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn areas(&self) -> Option<&[AreaListEntry]> {
        self.areas.as_deref()
    }

    pub fn current_area(&self) -> Option<&Area> {
        self.phase.area()
    }

    pub fn draft(&self) -> Option<&Draft> {
        match &self.phase {
            Phase::Editing { draft, .. } => Some(draft),
            _ => None,
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.phase, Phase::Editing { .. })
    }

    pub fn form_visible(&self) -> bool {
        self.form_visible
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn map(&self) -> &MapSlot {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut MapSlot {
        &mut self.map
    }

    pub fn toggle_form(&mut self) {
        self.form_visible = !self.form_visible;
    }

    pub fn begin_list(&mut self) -> Token {
        self.in_flight.begin(RequestKind::List)
    }

    pub fn list_loaded(&mut self, token: Token, res: Result<Vec<AreaListEntry>>) -> Outcome {
        if !self.accept(token) {
            return Outcome::Stale;
        }
        match res {
            Ok(areas) => {
                info!(screen = %self.id, count = areas.len(), "Loaded areas");
                self.areas = Some(areas);
                if self.phase == Phase::Idle {
                    self.phase = Phase::ListLoaded;
                }
                Outcome::Applied
            }
            Err(e) => self.fail("Failed to load areas", e),
        }
    }

    pub fn begin_select(&mut self) -> Result<Token> {
        self.notice = None;
        self.ensure_not_terminal()?;
        Ok(self.in_flight.begin(RequestKind::Detail))
    }

    /// Replaces the current area wholesale, unsaved edits are dropped. Edit
    /// mode survives the switch with a fresh draft.
    pub fn area_loaded(&mut self, token: Token, res: Result<Area>) -> Outcome {
        if !self.accept(token) {
            return Outcome::Stale;
        }
        if self.phase.is_terminal() {
            return Outcome::Stale;
        }
        match res {
            Ok(area) => {
                info!(screen = %self.id, area_id = area.id, "Loaded area");
                self.phase = if self.is_editing() {
                    Phase::Editing {
                        draft: Draft::from(&area),
                        area,
                    }
                } else {
                    Phase::AreaSelected(area)
                };
                self.redraw_map();
                Outcome::Applied
            }
            Err(e) => self.fail("Failed to fetch area details", e),
        }
    }

    pub fn start_editing(&mut self) -> Result<()> {
        self.notice = None;
        let phase = std::mem::replace(&mut self.phase, Phase::Idle);
        self.phase = match phase {
            Phase::AreaSelected(area) => Phase::Editing {
                draft: Draft::from(&area),
                area,
            },
            editing @ Phase::Editing { .. } => editing,
            other => {
                self.phase = other;
                return Err(self.reject(Error::InvalidState(
                    "Select an area before editing".into(),
                )));
            }
        };
        self.redraw_map();
        Ok(())
    }

    /// Keeps the typed name and code in the draft and applies the coordinate
    /// edits as single-scalar updates of the ring. The ring only changes when
    /// every edit succeeds, then the map is redrawn once.
    pub fn apply_coordinates(&mut self, form: &EditForm) -> Result<()> {
        self.notice = None;
        let Phase::Editing { draft, .. } = &mut self.phase else {
            return Err(self.reject(Error::InvalidState(
                "Coordinates can only be changed in edit mode".into(),
            )));
        };
        if let Some(name) = &form.name {
            draft.name = name.clone();
        }
        if let Some(code) = &form.code {
            draft.code = code.clone();
        }
        if form.coordinates.is_empty() {
            return Ok(());
        }
        let mut geometry = draft.geometry.clone();
        let res = form.coordinates.iter().try_for_each(|it| {
            geometry.set_coordinate(it.index, it.axis, coerce_coordinate(&it.value))
        });
        match res {
            Ok(()) => {
                draft.geometry = geometry;
                self.redraw_map();
                Ok(())
            }
            Err(e) => Err(self.reject(e)),
        }
    }

    pub fn begin_submit(&mut self, form: &EditForm) -> Result<(Token, AreaId, AreaUpdate)> {
        self.notice = None;
        if !self.is_editing() {
            return Err(self.reject(Error::InvalidState(
                "Enable editing before submitting".into(),
            )));
        }
        self.apply_coordinates(form)?;
        let blank = |it: &Option<String>| it.as_deref().map_or(true, |it| it.trim().is_empty());
        if blank(&form.name) {
            return Err(self.reject(Error::InvalidInput("Please enter area name".into())));
        }
        if blank(&form.code) {
            return Err(self.reject(Error::InvalidInput("Please enter area code".into())));
        }
        let Phase::Editing { area, draft } = &self.phase else {
            return Err(Error::InvalidState("Nothing to submit".into()));
        };
        let id = area.id;
        let update = AreaUpdate {
            name: draft.name.clone(),
            code: draft.code.clone(),
            geometry: draft.geometry.clone(),
        };
        Ok((self.in_flight.begin(RequestKind::Mutation), id, update))
    }

    pub fn submit_finished(&mut self, token: Token, res: Result<Value>) -> Outcome {
        self.mutation_finished(token, res, Phase::Submitted, "Failed to submit area")
    }

    pub fn begin_delete(&mut self) -> Result<(Token, AreaId)> {
        self.notice = None;
        self.ensure_not_terminal()?;
        let Some(id) = self.current_area().map(|it| it.id) else {
            return Err(self.reject(Error::InvalidState("Select an area to delete".into())));
        };
        Ok((self.in_flight.begin(RequestKind::Mutation), id))
    }

    pub fn delete_finished(&mut self, token: Token, res: Result<Value>) -> Outcome {
        self.mutation_finished(token, res, Phase::Deleted, "Failed to delete area")
    }

    fn mutation_finished(
        &mut self,
        token: Token,
        res: Result<Value>,
        done: Phase,
        failure: &str,
    ) -> Outcome {
        if !self.accept(token) || self.phase.is_terminal() {
            return Outcome::Stale;
        }
        match res {
            Ok(response) => {
                info!(screen = %self.id, %response, phase = ?done, "Backend accepted change");
                self.phase = done;
                self.map.clear();
                Outcome::Applied
            }
            Err(e) => self.fail(failure, e),
        }
    }

    fn accept(&mut self, token: Token) -> bool {
        let current = self.in_flight.is_current(token);
        if !current {
            debug!(screen = %self.id, kind = %token.kind, seq = token.seq, "Discarding stale response");
        }
        current
    }

    fn ensure_not_terminal(&mut self) -> Result<()> {
        if self.phase.is_terminal() {
            return Err(self.reject(Error::InvalidState(
                "This area has already been saved, open the editor again".into(),
            )));
        }
        Ok(())
    }

    fn fail(&mut self, context: &str, e: Error) -> Outcome {
        error!(screen = %self.id, error = %e, "{context}");
        self.notice = Some(format!("{context}: {e}"));
        Outcome::Failed
    }

    fn reject(&mut self, e: Error) -> Error {
        self.notice = Some(e.to_string());
        e
    }

    fn redraw_map(&mut self) {
        self.map
            .replace(self.phase.displayed_geometry(), &self.map_options);
    }
}
