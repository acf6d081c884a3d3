use crate::error::WindowError;
use crate::key::RowId;
use crate::tracker::HeightTracker;
use crate::RowWindow;

/// Maps a scroll position to the rows that must be mounted.
///
/// The window starts at the first row whose bottom edge lies below
/// `scroll_offset - render_margin` and extends while rows start above
/// `scroll_offset + viewport_height + render_margin`.
///
/// - An empty sequence yields an empty window.
/// - A non-positive viewport yields an empty window (see [`try_compute_window`] to observe it).
/// - A scroll offset past the end is clamped so the last viewport of rows is returned.
pub fn compute_window<K: RowId>(
    tracker: &HeightTracker<K>,
    scroll_offset: f64,
    viewport_height: f64,
    render_margin: f64,
) -> RowWindow {
    match try_compute_window(tracker, scroll_offset, viewport_height, render_margin) {
        Ok(window) => window,
        Err(_err) => {
            vwarn!(error = %_err, "compute_window: empty window");
            RowWindow::EMPTY
        }
    }
}

/// Same as [`compute_window`], but reports an invalid viewport as an error.
pub fn try_compute_window<K: RowId>(
    tracker: &HeightTracker<K>,
    scroll_offset: f64,
    viewport_height: f64,
    render_margin: f64,
) -> Result<RowWindow, WindowError> {
    if !viewport_height.is_finite() || viewport_height <= 0.0 {
        return Err(WindowError::InvalidViewport {
            height: viewport_height,
        });
    }
    let count = tracker.len();
    if count == 0 {
        return Ok(RowWindow::EMPTY);
    }

    let margin = if render_margin.is_finite() {
        render_margin.max(0.0)
    } else {
        0.0
    };
    let max_scroll = (tracker.total_height() - viewport_height).max(0.0);
    let scroll_offset = if scroll_offset.is_finite() {
        scroll_offset.clamp(0.0, max_scroll)
    } else {
        0.0
    };

    let top = scroll_offset - margin;
    let bottom = scroll_offset + viewport_height + margin;

    let mut start = tracker.rows_ending_at_or_before(top).min(count - 1);
    // Zero-height rows sharing the first row's offset: prefer the earliest.
    while start > 0 && tracker.height_at(start - 1) == Some(0.0) {
        start -= 1;
    }
    let end = tracker
        .rows_starting_before(bottom)
        .max(start + 1)
        .min(count);

    vtrace!(scroll_offset, viewport_height, start, end, "compute_window");
    Ok(RowWindow {
        start_index: start,
        end_index: end,
    })
}
