use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use rowwindow::{
    Align, FrameState, HeightTracker, RowId, RowWindow, ScrollState, ViewportState, WindowError,
};

use crate::anchor::{ScrollAnchor, anchor_target, capture_anchor};
use crate::options::{ScrollerOptions, WindowChangeHook};
use crate::render::{RenderedRow, RenderedWindow, RowRenderer};
use crate::scheduler::Scheduler;
use crate::store::{SavedView, ViewStore};
use crate::throttle::Throttle;

/// Lifecycle of a scroller instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollerPhase {
    /// Window computed, mounted rows measured.
    Idle,
    /// Rows mounted by the last render still wait for their first height report.
    PendingMeasurement,
    /// A scroll-triggered recomputation is pending.
    Scrolling,
    /// A resize-triggered recomputation is pending.
    Resizing,
}

#[derive(Debug)]
struct ScrollerCore<K> {
    tracker: HeightTracker<K>,
    scroll_offset: f64,
    viewport_height: f64,
    render_margin: f64,
    window: RowWindow,
    phase: ScrollerPhase,
    awaiting: Vec<K>,
    throttle: Throttle,
}

impl<K: RowId> ScrollerCore<K> {
    fn max_scroll_offset(&self) -> f64 {
        (self.tracker.total_height() - self.viewport_height.max(0.0)).max(0.0)
    }

    fn clamp_scroll_offset(&self, offset: f64) -> f64 {
        if !offset.is_finite() {
            return 0.0;
        }
        offset.clamp(0.0, self.max_scroll_offset())
    }

    fn settle_phase(&mut self) {
        if self.throttle.is_pending() {
            return;
        }
        self.phase = if self.awaiting.is_empty() {
            ScrollerPhase::Idle
        } else {
            ScrollerPhase::PendingMeasurement
        };
    }

    /// Recomputes the window; returns it when it changed.
    fn recompute(&mut self) -> Option<RowWindow> {
        let next = self
            .tracker
            .window(self.scroll_offset, self.viewport_height, self.render_margin);
        let tracker = &self.tracker;
        self.awaiting
            .retain(|id| tracker.index_of(id).is_some_and(|i| next.contains(i)));
        if next == self.window {
            return None;
        }
        self.window = next;
        Some(next)
    }

    /// Runs a pending (or forced) throttled recomputation.
    fn flush(&mut self) -> Option<RowWindow> {
        self.throttle.clear();
        let changed = self.recompute();
        self.settle_phase();
        changed
    }

    fn apply_measurement(&mut self, id: &K, height: f64) -> Result<f64, WindowError> {
        let index = self.tracker.index_of(id).ok_or(WindowError::UnknownId)?;
        let start = self.tracker.offset_at(index).unwrap_or(0.0);
        let before = self.tracker.height_at(index).unwrap_or(0.0);
        let changed = self.tracker.report_measured(id, height)?;
        self.awaiting.retain(|k| k != id);
        if !changed {
            return Ok(0.0);
        }

        // Rows starting above the viewport top push the visible content down; follow them.
        if start >= self.scroll_offset {
            return Ok(0.0);
        }
        let delta = self.tracker.height_at(index).unwrap_or(before) - before;
        let next = (self.scroll_offset + delta).max(0.0);
        let applied = next - self.scroll_offset;
        self.scroll_offset = next;
        vtrace!(index, delta, applied, offset = next, "anchor adjusted");
        Ok(applied)
    }
}

/// Orchestrates windowed rendering of a row sequence.
///
/// The scroller owns a [`HeightTracker`] and the viewport state. The host drives it:
/// - [`Self::render`] / [`Self::render_window`] when the UI renders,
/// - [`Self::on_row_measured`] after mounted rows report their real height,
/// - [`Self::on_scroll`] / [`Self::on_resize`] from viewport events (throttled through the
///   injected [`Scheduler`]),
/// - [`Self::scroll_to_row`] / [`Self::is_row_fully_visible`] for imperative navigation.
///
/// Whenever the scroller moves the viewport itself it reports the new offset through
/// `on_scroll_request`; measurement-driven adjustments are reported synchronously, inside the
/// call that caused them, so the host can apply them before the next paint.
pub struct VirtualScroller<K> {
    core: Rc<RefCell<ScrollerCore<K>>>,
    alive: Rc<Cell<bool>>,
    scheduler: Rc<dyn Scheduler>,
    options: ScrollerOptions,
}

impl<K: RowId + 'static> VirtualScroller<K> {
    pub fn new(options: ScrollerOptions, scheduler: Rc<dyn Scheduler>) -> Self {
        let mut tracker =
            HeightTracker::new(options.default_row_height).with_epsilon(options.height_epsilon);
        if options.uniform_height.is_some() {
            tracker.set_height_mode(options.uniform_height);
        }
        let initial = options.initial_scroll_offset;
        vdebug!(
            default_row_height = options.default_row_height,
            uniform = ?options.uniform_height,
            "VirtualScroller::new"
        );
        let core = ScrollerCore {
            tracker,
            scroll_offset: if initial.is_finite() { initial.max(0.0) } else { 0.0 },
            viewport_height: options.viewport_height,
            render_margin: options.render_margin,
            window: RowWindow::EMPTY,
            phase: ScrollerPhase::Idle,
            awaiting: Vec::new(),
            throttle: Throttle::default(),
        };
        Self {
            core: Rc::new(RefCell::new(core)),
            alive: Rc::new(Cell::new(true)),
            scheduler,
            options,
        }
    }

    pub fn options(&self) -> &ScrollerOptions {
        &self.options
    }

    pub fn is_alive(&self) -> bool {
        self.alive.get()
    }

    pub fn phase(&self) -> ScrollerPhase {
        self.core.borrow().phase
    }

    /// The window computed by the last render or recomputation.
    pub fn window(&self) -> RowWindow {
        self.core.borrow().window
    }

    pub fn scroll_offset(&self) -> f64 {
        self.core.borrow().scroll_offset
    }

    pub fn viewport_height(&self) -> f64 {
        self.core.borrow().viewport_height
    }

    pub fn total_height(&self) -> f64 {
        self.core.borrow().tracker.total_height()
    }

    pub fn len(&self) -> usize {
        self.core.borrow().tracker.len()
    }

    pub fn is_empty(&self) -> bool {
        self.core.borrow().tracker.is_empty()
    }

    /// Read access to the height tracker.
    pub fn tracker<R>(&self, f: impl FnOnce(&HeightTracker<K>) -> R) -> R {
        f(&self.core.borrow().tracker)
    }

    /// Replaces the row sequence, keeping the row at the viewport top in place.
    ///
    /// When the anchor row itself was removed the scroll offset is only clamped.
    pub fn set_sequence(&mut self, ids: impl IntoIterator<Item = K>) -> Result<(), WindowError> {
        let (moved, changed) = {
            let mut core = self.core.borrow_mut();
            let anchor = capture_anchor(&core.tracker, core.scroll_offset);
            core.tracker.set_sequence(ids)?;
            let prev = core.scroll_offset;
            let target = anchor
                .and_then(|a| anchor_target(&core.tracker, &a))
                .unwrap_or(prev);
            core.scroll_offset = core.clamp_scroll_offset(target);
            let changed = core.recompute();
            core.settle_phase();
            let moved = (core.scroll_offset != prev).then_some(core.scroll_offset);
            (moved, changed)
        };
        self.emit_scroll_request(moved);
        self.emit_window_change(changed);
        Ok(())
    }

    /// Switches between per-row measurement and a uniform row height.
    pub fn set_height_mode(&mut self, uniform: Option<f64>) {
        let (moved, changed) = {
            let mut core = self.core.borrow_mut();
            let anchor = capture_anchor(&core.tracker, core.scroll_offset);
            core.tracker.set_height_mode(uniform);
            core.awaiting.clear();
            let prev = core.scroll_offset;
            let target = anchor
                .and_then(|a| anchor_target(&core.tracker, &a))
                .unwrap_or(prev);
            core.scroll_offset = core.clamp_scroll_offset(target);
            let changed = core.recompute();
            core.settle_phase();
            let moved = (core.scroll_offset != prev).then_some(core.scroll_offset);
            (moved, changed)
        };
        self.emit_scroll_request(moved);
        self.emit_window_change(changed);
    }

    /// Applies a viewport height immediately, without throttling.
    pub fn set_viewport_height(&mut self, viewport_height: f64) {
        self.core.borrow_mut().viewport_height = viewport_height;
    }

    /// Renders `ids` into a windowed tree for a viewport of `viewport_height` pixels.
    ///
    /// The sequence is only rebuilt when `ids` differs from the tracked one.
    pub fn render<R: RowRenderer<K>>(
        &mut self,
        ids: &[K],
        renderer: &mut R,
        viewport_height: f64,
    ) -> Result<RenderedWindow<K, R::Content>, WindowError> {
        let same = self.core.borrow().tracker.ids() == ids;
        if !same {
            self.set_sequence(ids.iter().cloned())?;
        }
        self.set_viewport_height(viewport_height);
        Ok(self.render_window(renderer))
    }

    /// Renders the current sequence at the current scroll position.
    ///
    /// Never fails: an empty sequence or an invalid viewport yields no rows, and a row whose
    /// renderer fails is mounted without content and reported through `on_render_failure`.
    pub fn render_window<R: RowRenderer<K>>(
        &mut self,
        renderer: &mut R,
    ) -> RenderedWindow<K, R::Content> {
        let (window, slots, total) = {
            let mut core = self.core.borrow_mut();
            let window = core
                .tracker
                .window(core.scroll_offset, core.viewport_height, core.render_margin);
            let mut slots = Vec::with_capacity(window.len());
            core.tracker.for_each_row(window, |row| slots.push(row));
            core.window = window;
            (window, slots, core.tracker.total_height())
        };

        let ids: Vec<K> = {
            let core = self.core.borrow();
            slots
                .iter()
                .filter_map(|row| core.tracker.id_at(row.index).cloned())
                .collect()
        };

        let mut rows = Vec::with_capacity(slots.len());
        for (row, id) in slots.iter().zip(ids) {
            let content = match renderer.render_row(&id) {
                Ok(content) => Some(content),
                Err(err) => {
                    self.report_render_failure(WindowError::RowRenderFailure {
                        index: row.index,
                        message: err.to_string(),
                    });
                    None
                }
            };
            rows.push(RenderedRow {
                id,
                index: row.index,
                start: row.start,
                height: row.height,
                content,
            });
        }

        let (top_spacer, bottom_spacer) = match (slots.first(), slots.last()) {
            (Some(first), Some(last)) => (first.start, (total - last.end()).max(0.0)),
            _ => (0.0, total),
        };

        {
            let mut core = self.core.borrow_mut();
            let core = &mut *core;
            core.awaiting.clear();
            for r in &rows {
                if core.tracker.row_height(&r.id).is_ok_and(|h| h.is_unknown()) {
                    core.awaiting.push(r.id.clone());
                }
            }
            core.settle_phase();
        }

        vtrace!(
            start = window.start_index,
            end = window.end_index,
            top_spacer,
            bottom_spacer,
            "render_window"
        );
        RenderedWindow {
            window,
            top_spacer,
            rows,
            bottom_spacer,
            total_height: total,
        }
    }

    /// Reports the real height of a mounted row.
    ///
    /// When the row starts above the viewport top and its height changed, the scroll offset is
    /// shifted by the same delta right away (and reported through `on_scroll_request`) so the
    /// visible content does not jump. Returns the applied scroll delta, which is smaller than the
    /// height change when the offset is clamped at 0.
    pub fn on_row_measured(&mut self, id: &K, height: f64) -> Result<f64, WindowError> {
        let (delta, offset, changed) = {
            let mut core = self.core.borrow_mut();
            let delta = core.apply_measurement(id, height)?;
            let changed = core.recompute();
            core.settle_phase();
            (delta, core.scroll_offset, changed)
        };
        self.emit_scroll_request((delta != 0.0).then_some(offset));
        self.emit_window_change(changed);
        Ok(delta)
    }

    /// Batch form of [`Self::on_row_measured`]: applies every report in order, then recomputes
    /// the window once. Unknown ids are skipped. Returns the summed scroll delta.
    pub fn on_rows_measured<'a>(&mut self, reports: impl IntoIterator<Item = (&'a K, f64)>) -> f64
    where
        K: 'a,
    {
        let (delta, offset, changed) = {
            let mut core = self.core.borrow_mut();
            let mut delta = 0.0;
            for (id, height) in reports {
                match core.apply_measurement(id, height) {
                    Ok(d) => delta += d,
                    Err(_err) => {
                        vdebug!(error = %_err, "on_rows_measured: skipped report");
                    }
                }
            }
            let changed = core.recompute();
            core.settle_phase();
            (delta, core.scroll_offset, changed)
        };
        self.emit_scroll_request((delta != 0.0).then_some(offset));
        self.emit_window_change(changed);
        delta
    }

    /// Computes the scroll offset that brings `id` into view with `align`, without moving.
    pub fn scroll_to_row_offset(&self, id: &K, align: Align) -> Option<f64> {
        let core = self.core.borrow();
        let index = core.tracker.index_of(id)?;
        let row = core.tracker.row(index)?;
        let view = core.viewport_height.max(0.0);
        let cur = core.scroll_offset;
        let target = match align {
            Align::Start => row.start,
            Align::End => row.end() - view,
            Align::Center => row.start + row.height / 2.0 - view / 2.0,
            Align::Auto => {
                if row.start >= cur && row.end() <= cur + view {
                    cur
                } else if row.start < cur {
                    row.start
                } else {
                    row.end() - view
                }
            }
        };
        Some(core.clamp_scroll_offset(target))
    }

    /// Scrolls so `id` is aligned in the viewport. Unknown ids are a no-op returning `None`.
    ///
    /// Returns the applied (clamped) offset.
    pub fn scroll_to_row(&mut self, id: &K, align: Align) -> Option<f64> {
        let target = self.scroll_to_row_offset(id, align)?;
        let changed = {
            let mut core = self.core.borrow_mut();
            core.scroll_offset = target;
            core.recompute()
        };
        self.emit_scroll_request(Some(target));
        self.emit_window_change(changed);
        Some(target)
    }

    /// Whether the whole row lies inside the viewport. Unknown ids are never visible.
    pub fn is_row_fully_visible(&self, id: &K) -> bool {
        let core = self.core.borrow();
        let view = core.viewport_height;
        if view.is_nan() || view <= 0.0 {
            return false;
        }
        let Some(row) = core.tracker.index_of(id).and_then(|i| core.tracker.row(i)) else {
            return false;
        };
        let top = core.scroll_offset;
        row.start >= top && row.end() <= top + view
    }

    /// Records a scroll position reported by the host and schedules a throttled recomputation.
    ///
    /// Ignored once the scroller is torn down.
    pub fn on_scroll(&mut self, offset: f64) {
        if !self.alive.get() {
            return;
        }
        {
            let mut core = self.core.borrow_mut();
            core.scroll_offset = if offset.is_finite() { offset.max(0.0) } else { 0.0 };
            core.phase = ScrollerPhase::Scrolling;
            vtrace!(offset = core.scroll_offset, "on_scroll");
        }
        self.schedule_flush(self.options.scroll_throttle_ms);
    }

    /// Records a viewport height reported by the host and schedules a throttled recomputation.
    ///
    /// Ignored once the scroller is torn down.
    pub fn on_resize(&mut self, viewport_height: f64) {
        if !self.alive.get() {
            return;
        }
        {
            let mut core = self.core.borrow_mut();
            core.viewport_height = viewport_height;
            core.phase = ScrollerPhase::Resizing;
            vtrace!(viewport_height, "on_resize");
        }
        self.schedule_flush(self.options.resize_throttle_ms);
    }

    /// Runs a pending recomputation now. Returns the new window when it changed.
    pub fn flush(&mut self) -> Option<RowWindow> {
        let changed = {
            let mut core = self.core.borrow_mut();
            core.throttle.cancel(self.scheduler.as_ref());
            core.flush()
        };
        self.emit_window_change(changed);
        changed
    }

    pub fn capture_anchor(&self) -> Option<ScrollAnchor<K>> {
        let core = self.core.borrow();
        capture_anchor(&core.tracker, core.scroll_offset)
    }

    /// Moves the viewport so the anchor row sits where it was captured.
    ///
    /// Returns `false` when the anchor row is no longer tracked.
    pub fn apply_anchor(&mut self, anchor: &ScrollAnchor<K>) -> bool {
        let (target, changed) = {
            let mut core = self.core.borrow_mut();
            let Some(target) = anchor_target(&core.tracker, anchor) else {
                return false;
            };
            core.scroll_offset = core.clamp_scroll_offset(target);
            (core.scroll_offset, core.recompute())
        };
        self.emit_scroll_request(Some(target));
        self.emit_window_change(changed);
        true
    }

    pub fn frame_state(&self) -> FrameState {
        let core = self.core.borrow();
        FrameState {
            viewport: ViewportState {
                height: core.viewport_height,
            },
            scroll: ScrollState {
                offset: core.scroll_offset,
                is_scrolling: core.phase == ScrollerPhase::Scrolling,
            },
        }
    }

    /// Persists scroll position and learned row heights under `collection`.
    pub fn save_view(&self, store: &mut dyn ViewStore<K>, collection: &str) {
        let view = SavedView {
            frame: self.frame_state(),
            measurements: self.core.borrow().tracker.export_measurements(),
        };
        vdebug!(collection, rows = view.measurements.len(), "save_view");
        store.save(collection, view);
    }

    /// Restores a view saved under `collection` onto the current sequence.
    ///
    /// Returns `false` when nothing was stored.
    pub fn restore_view(&mut self, store: &dyn ViewStore<K>, collection: &str) -> bool {
        let Some(view) = store.load(collection) else {
            return false;
        };
        let (offset, changed) = {
            let mut core = self.core.borrow_mut();
            core.tracker.import_measurements(view.measurements);
            core.viewport_height = view.frame.viewport.height;
            core.scroll_offset = core.clamp_scroll_offset(view.frame.scroll.offset);
            let changed = core.recompute();
            core.settle_phase();
            (core.scroll_offset, changed)
        };
        vdebug!(collection, offset, "restore_view");
        self.emit_scroll_request(Some(offset));
        self.emit_window_change(changed);
        true
    }

    /// Detaches the scroller: pending recomputations are cancelled and any task that still
    /// fires becomes a no-op.
    pub fn teardown(&mut self) {
        shutdown(&self.core, &self.alive, self.scheduler.as_ref());
    }

    fn schedule_flush(&mut self, interval_ms: u64) {
        if !self.alive.get() {
            return;
        }
        let Some(due_ms) = self
            .core
            .borrow_mut()
            .throttle
            .needs_schedule(self.scheduler.as_ref(), interval_ms)
        else {
            return;
        };
        let delay_ms = due_ms.saturating_sub(self.scheduler.now_ms());

        let weak: Weak<RefCell<ScrollerCore<K>>> = Rc::downgrade(&self.core);
        let alive = Rc::clone(&self.alive);
        let hook = self.options.on_window_change.clone();
        let token = self.scheduler.schedule_after(
            delay_ms,
            Box::new(move || {
                if !alive.get() {
                    return;
                }
                let Some(core) = weak.upgrade() else {
                    return;
                };
                let changed = core.borrow_mut().flush();
                notify_window_change(hook.as_ref(), changed);
            }),
        );
        vtrace!(interval_ms, due_ms, token = token.id(), "flush scheduled");
        self.core.borrow_mut().throttle.armed(token, due_ms);
    }

    fn emit_scroll_request(&self, offset: Option<f64>) {
        if let (Some(offset), Some(hook)) = (offset, &self.options.on_scroll_request) {
            hook(offset);
        }
    }

    fn emit_window_change(&self, window: Option<RowWindow>) {
        notify_window_change(self.options.on_window_change.as_ref(), window);
    }

    fn report_render_failure(&self, err: WindowError) {
        vwarn!(error = %err, "row render failed");
        if let Some(hook) = &self.options.on_render_failure {
            hook(&err);
        }
    }
}

impl<K> Drop for VirtualScroller<K> {
    fn drop(&mut self) {
        shutdown(&self.core, &self.alive, self.scheduler.as_ref());
    }
}

impl<K: core::fmt::Debug> core::fmt::Debug for VirtualScroller<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VirtualScroller")
            .field("core", &self.core)
            .field("alive", &self.alive.get())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

fn shutdown<K>(core: &RefCell<ScrollerCore<K>>, alive: &Cell<bool>, scheduler: &dyn Scheduler) {
    if !alive.replace(false) {
        return;
    }
    if let Ok(mut core) = core.try_borrow_mut() {
        core.throttle.cancel(scheduler);
        core.phase = ScrollerPhase::Idle;
    }
}

fn notify_window_change(hook: Option<&WindowChangeHook>, window: Option<RowWindow>) {
    if let (Some(hook), Some(window)) = (hook, window) {
        hook(window);
    }
}
