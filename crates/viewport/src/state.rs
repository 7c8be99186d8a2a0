use catalog::AssetKind;
use foundation::ids::RequestSeq;
use query::QueryResult;

use crate::highlight::HighlightState;

/// Attribute filters chosen in the sidebar. Search text is debounced
/// separately and lives in [`ClientViewState`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    pub kind: Option<AssetKind>,
    pub min_height: Option<f64>,
    pub max_height: Option<f64>,
}

impl FilterState {
    /// Unsets every attribute filter.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Builds height bounds from free-form text fields.
    ///
    /// Characters other than digits, `.` and `-` are dropped first; whatever
    /// is left must be a finite number or the bound is unset.
    pub fn with_height_inputs(mut self, min_text: &str, max_text: &str) -> Self {
        self.min_height = parse_height_input(min_text);
        self.max_height = parse_height_input(max_text);
        self
    }
}

pub fn sanitize_numeric_input(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect()
}

pub fn parse_height_input(raw: &str) -> Option<f64> {
    let cleaned = sanitize_numeric_input(raw);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Fetch indicator for the sidebar header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// Nothing requested yet.
    Idle,
    /// The latest issued query has not come back.
    Fetching,
    /// The latest issued query is rendered.
    Ready { total: usize },
}

impl FetchStatus {
    pub fn label(&self) -> String {
        match self {
            FetchStatus::Idle => String::new(),
            FetchStatus::Fetching => "Loading…".to_string(),
            FetchStatus::Ready { total } => format!("{total} records"),
        }
    }
}

/// Ephemeral view state owned by the map client.
///
/// Only [`crate::ViewportSyncController`] mutates it, through named
/// transitions.
#[derive(Debug, Clone, Default)]
pub struct ClientViewState {
    /// `bbox` wire parameter of the current viewport.
    pub bbox: Option<String>,
    pub filters: FilterState,
    /// Raw search box content, updated on every keystroke.
    pub search_text: String,
    /// Search text after the quiet period; what queries actually use.
    pub debounced_q: String,
    pub highlight: HighlightState,
    pub last_result: Option<QueryResult>,
    pub last_applied_seq: RequestSeq,
}

impl ClientViewState {
    pub fn hovered_id(&self) -> Option<&str> {
        self.highlight.hovered_id()
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.highlight.selected_id()
    }
}
