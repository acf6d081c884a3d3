use std::fmt;

use rowwindow::{HeightTracker, RowId};

/// The row the user is looking at: the row covering the scroll offset, plus how far into that
/// row the viewport top sits.
///
/// Used to keep content visually stable when rows are inserted or removed above it.
#[derive(Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScrollAnchor<K> {
    pub id: K,
    /// Distance from the anchor row's top to the scroll offset.
    pub offset_in_row: f64,
}

impl<K: fmt::Debug> fmt::Debug for ScrollAnchor<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollAnchor")
            .field("id", &self.id)
            .field("offset_in_row", &self.offset_in_row)
            .finish()
    }
}

/// Captures the row covering `scroll_offset`.
///
/// Returns `None` for an empty sequence.
pub fn capture_anchor<K: RowId>(
    tracker: &HeightTracker<K>,
    scroll_offset: f64,
) -> Option<ScrollAnchor<K>> {
    let index = tracker.index_at_offset(scroll_offset)?;
    let start = tracker.offset_at(index)?;
    let id = tracker.id_at(index)?.clone();
    Some(ScrollAnchor {
        id,
        offset_in_row: (scroll_offset - start).max(0.0),
    })
}

/// Scroll offset that puts the anchor row back at its captured position.
///
/// Returns `None` when the anchor id is no longer tracked.
pub fn anchor_target<K: RowId>(
    tracker: &HeightTracker<K>,
    anchor: &ScrollAnchor<K>,
) -> Option<f64> {
    let start = tracker.offset(&anchor.id).ok()?;
    Some(start + anchor.offset_in_row)
}
