/// Render state of one feature. Declaration order is precedence order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Highlight {
    Selected,
    Hovered,
    Default,
}

/// Hover and selection identity, each zero-or-one system-wide.
///
/// The two are tracked independently; precedence is only applied when a
/// feature's render state is asked for. Neither is tied to the current
/// query result, so a selection survives pans that move the asset out of
/// the rendered page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightState {
    hovered_id: Option<String>,
    selected_id: Option<String>,
}

impl HighlightState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hovered_id(&self) -> Option<&str> {
        self.hovered_id.as_deref()
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    /// Pointer moved; `feature` is the id under the pointer, if any.
    ///
    /// Returns `true` if the hovered id changed.
    pub fn pointer_move(&mut self, feature: Option<&str>) -> bool {
        replace_if_changed(&mut self.hovered_id, feature)
    }

    /// Click; a hit selects that feature, a miss clears the selection.
    /// Clicking the selected feature again keeps it selected.
    ///
    /// Returns `true` if the selected id changed.
    pub fn click(&mut self, feature: Option<&str>) -> bool {
        replace_if_changed(&mut self.selected_id, feature)
    }

    pub fn clear_selection(&mut self) -> bool {
        self.selected_id.take().is_some()
    }

    pub fn highlight_for(&self, id: &str) -> Highlight {
        if self.selected_id.as_deref() == Some(id) {
            Highlight::Selected
        } else if self.hovered_id.as_deref() == Some(id) {
            Highlight::Hovered
        } else {
            Highlight::Default
        }
    }

    /// Cursor hint for the map viewport.
    pub fn wants_pointer_cursor(&self) -> bool {
        self.hovered_id.is_some()
    }
}

fn replace_if_changed(slot: &mut Option<String>, next: Option<&str>) -> bool {
    if slot.as_deref() == next {
        return false;
    }
    *slot = next.map(str::to_string);
    true
}
