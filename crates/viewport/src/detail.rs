//! Detail panel lookup for the selected asset.
//!
//! The lookup is keyed by the selected id only; it does not care whether
//! that asset is in the rendered page.

use catalog::Asset;
use foundation::ids::RequestSeq;
use runtime::sequence::{Admission, SequenceGate};
use tracing::debug;

/// A lookup the host must perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRequest {
    pub seq: RequestSeq,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailOutcome {
    Found(Asset),
    NotFound,
    /// Transport failure; not the same as an unknown id.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    Empty,
    Loading { id: String, seq: RequestSeq },
    NotFound { id: String },
    Failed { id: String, message: String },
    Loaded(Asset),
}

impl DetailState {
    fn id(&self) -> Option<&str> {
        match self {
            DetailState::Empty => None,
            DetailState::Loading { id, .. }
            | DetailState::NotFound { id }
            | DetailState::Failed { id, .. } => Some(id),
            DetailState::Loaded(asset) => Some(&asset.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailRecord {
    pub title: String,
    pub rows: Vec<(&'static str, String)>,
    /// `[lon, lat]` to center the map on.
    pub fly_to: [f64; 2],
}

/// What the panel shows. One variant per lookup state.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailView {
    NoSelection,
    Loading,
    NotFound,
    Unavailable { message: String },
    Record(DetailRecord),
}

#[derive(Debug, Clone)]
pub struct DetailLookup {
    gate: SequenceGate,
    state: DetailState,
}

impl Default for DetailLookup {
    fn default() -> Self {
        Self {
            gate: SequenceGate::new(),
            state: DetailState::Empty,
        }
    }
}

impl DetailLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DetailState {
        &self.state
    }

    /// Follows the selection. Returns a request when a fetch is needed.
    ///
    /// Re-selecting the id already shown (or loading) issues nothing. Any
    /// change supersedes an in-flight lookup.
    pub fn select(&mut self, id: Option<&str>) -> Option<DetailRequest> {
        let Some(id) = id else {
            self.clear();
            return None;
        };
        let retry = matches!(self.state, DetailState::Failed { .. });
        if self.state.id() == Some(id) && !retry {
            return None;
        }

        let seq = self.gate.issue();

        self.state = DetailState::Loading {
            id: id.to_string(),
            seq,
        };
        Some(DetailRequest {
            seq,
            id: id.to_string(),
        })
    }

    /// Drops the selection. An in-flight lookup can no longer land.
    pub fn clear(&mut self) {
        if matches!(self.state, DetailState::Empty) {
            return;
        }
        self.gate.issue();
        self.state = DetailState::Empty;
    }

    /// Applies a lookup response. Responses for superseded selections are
    /// dropped; returns whether the state changed.
    pub fn resolve(&mut self, seq: RequestSeq, outcome: DetailOutcome) -> bool {
        if self.gate.admit(seq) != Admission::Apply {
            debug!(%seq, "dropping superseded detail response");
            return false;
        }
        let DetailState::Loading { id, .. } = &self.state else {
            return false;
        };
        let id = id.clone();

        self.state = match outcome {
            DetailOutcome::Found(asset) => DetailState::Loaded(asset),
            DetailOutcome::NotFound => DetailState::NotFound { id },
            DetailOutcome::Failed(message) => DetailState::Failed { id, message },
        };
        true
    }

    pub fn view(&self) -> DetailView {
        match &self.state {
            DetailState::Empty => DetailView::NoSelection,
            DetailState::Loading { .. } => DetailView::Loading,
            DetailState::NotFound { .. } => DetailView::NotFound,
            DetailState::Failed { message, .. } => DetailView::Unavailable {
                message: message.clone(),
            },
            DetailState::Loaded(asset) => DetailView::Record(record_for(asset)),
        }
    }
}

fn record_for(asset: &Asset) -> DetailRecord {
    let mut rows = vec![("ID", asset.id.clone()), ("Type", asset.kind.to_string())];
    if let Some(h) = asset.height {
        rows.push(("Height", format!("{h} m")));
    }
    rows.push((
        "LonLat",
        format!("{:.6}, {:.6}", asset.lon(), asset.lat()),
    ));

    DetailRecord {
        title: asset.name.clone(),
        rows,
        fly_to: asset.centroid,
    }
}
