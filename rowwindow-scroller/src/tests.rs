use crate::*;

use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Copy, Debug)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u64(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }

    fn gen_range_u64(&mut self, start: u64, end_exclusive: u64) -> u64 {
        start + (self.next_u64() % (end_exclusive - start))
    }
}

fn scroller(count: u64, options: ScrollerOptions) -> (VirtualScroller<u64>, Rc<ManualScheduler>) {
    let scheduler = Rc::new(ManualScheduler::new());
    let mut s = VirtualScroller::new(options, scheduler.clone());
    s.set_sequence(0..count).unwrap();
    (s, scheduler)
}

fn recorder<T: Clone + 'static>() -> (Rc<RefCell<Vec<T>>>, impl Fn(T) + 'static) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    (log, move |v: T| sink.borrow_mut().push(v))
}

fn label(id: &u64) -> Result<String, String> {
    Ok(format!("row {id}"))
}

#[test]
fn render_of_empty_sequence_is_empty() {
    let (mut s, _) = scroller(0, ScrollerOptions::new(50.0));
    let out = s.render(&[], &mut label, 400.0).unwrap();
    assert!(out.is_empty());
    assert!(out.window.is_empty());
    assert_eq!(out.top_spacer, 0.0);
    assert_eq!(out.bottom_spacer, 0.0);
    assert_eq!(s.phase(), ScrollerPhase::Idle);
}

#[test]
fn render_mounts_window_between_spacers() {
    let (mut s, _) = scroller(1000, ScrollerOptions::new(50.0));
    let ids: Vec<u64> = (0..1000).collect();
    let out = s.render(&ids, &mut label, 400.0).unwrap();

    assert_eq!(out.window.first_index(), Some(0));
    assert_eq!(out.window.last_index(), Some(8));
    assert_eq!(out.rows.len(), 9);
    assert_eq!(out.rows[2].content.as_deref(), Some("row 2"));
    assert_eq!(out.rows[2].start, 100.0);
    assert_eq!(out.top_spacer, 0.0);
    assert_eq!(out.bottom_spacer, 50_000.0 - 450.0);
    assert_eq!(
        out.top_spacer + out.rows.iter().map(|r| r.height).sum::<f64>() + out.bottom_spacer,
        out.total_height
    );
    assert_eq!(s.phase(), ScrollerPhase::PendingMeasurement);
}

#[test]
fn render_replaces_a_different_sequence() {
    let (mut s, _) = scroller(1000, ScrollerOptions::new(50.0));
    let out = s.render(&[7, 8, 9], &mut label, 400.0).unwrap();
    let ids: Vec<u64> = out.rows.iter().map(|r| r.id).collect();
    assert_eq!(ids, [7, 8, 9]);
    assert_eq!(out.bottom_spacer, 0.0);
    assert_eq!(s.len(), 3);
}

#[test]
fn render_rejects_duplicate_ids() {
    let (mut s, _) = scroller(3, ScrollerOptions::new(50.0));
    assert_eq!(
        s.render(&[1, 1], &mut label, 400.0),
        Err(WindowError::DuplicateId { index: 1 })
    );
    assert_eq!(s.len(), 3);
}

#[test]
fn measuring_mounted_rows_settles_to_idle() {
    let (mut s, _) = scroller(100, ScrollerOptions::new(50.0).with_viewport_height(400.0));
    let out = s.render_window(&mut label);
    assert_eq!(s.phase(), ScrollerPhase::PendingMeasurement);

    let delta = s.on_rows_measured(out.rows.iter().map(|r| (&r.id, 50.0)));
    assert_eq!(delta, 0.0);
    assert_eq!(s.phase(), ScrollerPhase::Idle);
}

#[test]
fn failing_rows_are_isolated_and_reported() {
    let (failures, sink) = recorder::<WindowError>();
    let options = ScrollerOptions::new(50.0)
        .with_on_render_failure(Some(move |e: &WindowError| sink(e.clone())));
    let (mut s, _) = scroller(1000, options);
    let ids: Vec<u64> = (0..1000).collect();

    let mut renderer = |id: &u64| {
        if *id == 3 {
            Err(String::from("boom"))
        } else {
            Ok(*id)
        }
    };
    let out = s.render(&ids, &mut renderer, 400.0).unwrap();

    assert_eq!(out.rows.len(), 9);
    assert_eq!(out.rows[3].content, None);
    assert_eq!(out.rows[4].content, Some(4));
    assert_eq!(out.failed_rows().count(), 1);
    assert_eq!(
        *failures.borrow(),
        [WindowError::RowRenderFailure {
            index: 3,
            message: String::from("boom"),
        }]
    );
}

#[test]
fn growth_above_viewport_shifts_scroll_by_the_delta() {
    let (requests, sink) = recorder::<f64>();
    let options = ScrollerOptions::new(50.0)
        .with_viewport_height(400.0)
        .with_on_scroll_request(Some(sink));
    let (mut s, _) = scroller(1000, options);
    s.on_scroll(25_010.0);
    s.flush();

    // Row 500 straddles the viewport top; row 501 is the row whose screen position holds.
    let next_row_on_screen = s.tracker(|t| t.offset(&501).unwrap()) - s.scroll_offset();
    assert_eq!(s.on_row_measured(&500, 200.0), Ok(150.0));
    assert_eq!(s.scroll_offset(), 25_160.0);
    assert_eq!(*requests.borrow(), [25_160.0]);
    assert_eq!(
        s.tracker(|t| t.offset(&501).unwrap()) - s.scroll_offset(),
        next_row_on_screen
    );
}

#[test]
fn shrink_past_viewport_top_reports_clamped_delta() {
    let (requests, sink) = recorder::<f64>();
    let options = ScrollerOptions::new(50.0)
        .with_viewport_height(400.0)
        .with_on_scroll_request(Some(sink));
    let (mut s, _) = scroller(1000, options);
    s.on_scroll(10.0);
    s.flush();

    // Row 0 straddles the top; collapsing it would move the offset to -40.
    assert_eq!(s.on_row_measured(&0, 0.0), Ok(-10.0));
    assert_eq!(s.scroll_offset(), 0.0);
    assert_eq!(*requests.borrow(), [0.0]);

    let (mut s, _) = scroller(1000, ScrollerOptions::new(50.0).with_viewport_height(400.0));
    s.on_scroll(70.0);
    s.flush();
    let delta = s.on_rows_measured([(&0, 0.0), (&1, 20.0)]);
    assert_eq!(delta, -70.0);
    assert_eq!(s.scroll_offset(), 0.0);
}

#[test]
fn anchor_row_keeps_its_screen_position() {
    let mut rng = Lcg::new(11);
    let (mut s, _) = scroller(2000, ScrollerOptions::new(40.0).with_viewport_height(600.0));
    s.on_scroll(30_000.0);
    s.flush();

    for _ in 0..200 {
        let anchor = s.capture_anchor().unwrap();
        let anchor_index = s.tracker(|t| t.index_of(&anchor.id).unwrap());
        let on_screen = s.tracker(|t| t.offset(&anchor.id).unwrap()) - s.scroll_offset();

        let index = rng.gen_range_u64(0, anchor_index as u64);
        let before = s.tracker(|t| t.height(&index).unwrap());
        let height = rng.gen_range_u64(1, 400) as f64 / 4.0;
        let offset_before = s.scroll_offset();

        let delta = s.on_row_measured(&index, height).unwrap();
        assert_eq!(delta, height - before);
        assert_eq!(s.scroll_offset(), offset_before + delta);
        assert_eq!(
            s.tracker(|t| t.offset(&anchor.id).unwrap()) - s.scroll_offset(),
            on_screen
        );
    }
}

#[test]
fn rows_at_or_below_viewport_top_do_not_move_scroll() {
    let (requests, sink) = recorder::<f64>();
    let options = ScrollerOptions::new(50.0)
        .with_viewport_height(400.0)
        .with_on_scroll_request(Some(sink));
    let (mut s, _) = scroller(1000, options);
    s.on_scroll(25_000.0);
    s.flush();

    assert_eq!(s.on_row_measured(&500, 120.0), Ok(0.0));
    assert_eq!(s.on_row_measured(&900, 80.0), Ok(0.0));
    assert_eq!(s.scroll_offset(), 25_000.0);
    assert!(requests.borrow().is_empty());
}

#[test]
fn measuring_unknown_row_is_an_error() {
    let (mut s, _) = scroller(10, ScrollerOptions::new(50.0));
    assert_eq!(s.on_row_measured(&5000, 10.0), Err(WindowError::UnknownId));
}

#[test]
fn scroll_to_row_aligns_and_clamps() {
    let (requests, sink) = recorder::<f64>();
    let options = ScrollerOptions::new(50.0)
        .with_viewport_height(400.0)
        .with_on_scroll_request(Some(sink));
    let (mut s, _) = scroller(1000, options);

    assert_eq!(s.scroll_to_row(&999, Align::End), Some(49_600.0));
    assert_eq!(s.scroll_offset(), s.total_height() - s.viewport_height());
    assert_eq!(s.window().last_index(), Some(999));

    assert_eq!(s.scroll_to_row(&10, Align::Start), Some(500.0));
    assert_eq!(s.scroll_to_row(&10, Align::Center), Some(325.0));
    // Already fully visible.
    assert_eq!(s.scroll_to_row(&12, Align::Auto), Some(325.0));
    assert_eq!(s.scroll_to_row(&100, Align::Auto), Some(4_650.0));
    assert_eq!(s.scroll_to_row(&0, Align::End), Some(0.0));

    assert_eq!(s.scroll_to_row(&5000, Align::Start), None);
    assert_eq!(s.scroll_offset(), 0.0);
    assert_eq!(
        *requests.borrow(),
        [49_600.0, 500.0, 325.0, 325.0, 4_650.0, 0.0]
    );
}

#[test]
fn full_visibility_requires_both_edges_inside() {
    let (mut s, _) = scroller(1000, ScrollerOptions::new(50.0).with_viewport_height(400.0));
    s.scroll_to_row(&10, Align::Center);
    assert_eq!(s.scroll_offset(), 325.0);

    assert!(s.is_row_fully_visible(&7));
    assert!(s.is_row_fully_visible(&13));
    assert!(!s.is_row_fully_visible(&6));
    assert!(!s.is_row_fully_visible(&14));
    assert!(!s.is_row_fully_visible(&5000));

    s.set_viewport_height(0.0);
    assert!(!s.is_row_fully_visible(&10));
}

#[test]
fn scroll_events_are_throttled_to_one_flush() {
    let (changes, sink) = recorder::<RowWindow>();
    let options = ScrollerOptions::new(50.0)
        .with_viewport_height(400.0)
        .with_on_window_change(Some(sink));
    let (mut s, scheduler) = scroller(1000, options);
    s.render_window(&mut label);
    let initial = changes.borrow().len();

    s.on_scroll(10.0);
    s.on_scroll(20.0);
    s.on_scroll(1_000.0);
    assert_eq!(scheduler.pending(), 1);
    assert_eq!(s.phase(), ScrollerPhase::Scrolling);

    assert_eq!(scheduler.advance(15), 0);
    assert_eq!(scheduler.advance(1), 1);
    assert_eq!(
        changes.borrow()[initial..],
        [RowWindow {
            start_index: 19,
            end_index: 29,
        }]
    );
    assert_eq!(s.phase(), ScrollerPhase::Idle);
    assert_eq!(scheduler.pending(), 0);
}

#[test]
fn unchanged_window_is_not_reported() {
    let (changes, sink) = recorder::<RowWindow>();
    let options = ScrollerOptions::new(50.0)
        .with_viewport_height(400.0)
        .with_on_window_change(Some(sink));
    let (mut s, scheduler) = scroller(1000, options);

    s.on_scroll(1_020.0);
    scheduler.advance(16);
    let seen = changes.borrow().len();
    assert_eq!(
        changes.borrow().last().copied(),
        Some(RowWindow {
            start_index: 19,
            end_index: 30,
        })
    );

    s.on_scroll(1_030.0);
    scheduler.advance(16);
    assert_eq!(changes.borrow().len(), seen);
}

#[test]
fn scroll_supersedes_a_slower_pending_resize() {
    let (mut s, scheduler) = scroller(1000, ScrollerOptions::new(50.0).with_viewport_height(400.0));

    s.on_resize(600.0);
    assert_eq!(s.phase(), ScrollerPhase::Resizing);
    s.on_scroll(1_000.0);
    assert_eq!(scheduler.pending(), 1);

    assert_eq!(scheduler.advance(16), 1);
    assert_eq!(
        s.window(),
        RowWindow {
            start_index: 19,
            end_index: 33,
        }
    );
    assert_eq!(scheduler.advance(1_000), 0);

    // A resize while a scroll flush is pending rides along with it.
    s.on_scroll(2_000.0);
    s.on_resize(200.0);
    assert_eq!(scheduler.pending(), 1);
    assert_eq!(scheduler.advance(16), 1);
    assert_eq!(s.viewport_height(), 200.0);
}

#[test]
fn late_scroll_keeps_the_earlier_resize_deadline() {
    let (mut s, scheduler) = scroller(1000, ScrollerOptions::new(50.0).with_viewport_height(400.0));

    s.on_resize(600.0);
    assert_eq!(scheduler.advance(395), 0);
    s.on_scroll(1_000.0);
    assert_eq!(scheduler.pending(), 1);

    assert_eq!(scheduler.advance(5), 1);
    assert_eq!(scheduler.now_ms(), 400);
    assert_eq!(
        s.window(),
        RowWindow {
            start_index: 19,
            end_index: 33,
        }
    );
    assert_eq!(scheduler.pending(), 0);
}

#[test]
fn forced_flush_cancels_the_pending_task() {
    let (mut s, scheduler) = scroller(1000, ScrollerOptions::new(50.0).with_viewport_height(400.0));
    s.on_scroll(1_000.0);
    assert_eq!(scheduler.pending(), 1);
    assert!(s.flush().is_some());
    assert_eq!(scheduler.pending(), 0);
    assert_eq!(s.flush(), None);
}

struct NoCancel(ManualScheduler);

impl Scheduler for NoCancel {
    fn now_ms(&self) -> u64 {
        self.0.now_ms()
    }

    fn schedule_after(&self, delay_ms: u64, task: Task) -> CancelToken {
        self.0.schedule_after(delay_ms, task)
    }

    fn cancel(&self, _token: CancelToken) {}
}

#[test]
fn stale_tasks_after_teardown_are_no_ops() {
    let (changes, sink) = recorder::<RowWindow>();
    let scheduler = Rc::new(NoCancel(ManualScheduler::new()));
    let options = ScrollerOptions::new(50.0)
        .with_viewport_height(400.0)
        .with_on_window_change(Some(sink));
    let mut s = VirtualScroller::new(options.clone(), scheduler.clone());
    s.set_sequence(0..1000u64).unwrap();
    let seen = changes.borrow().len();

    s.on_scroll(5_000.0);
    s.teardown();
    assert!(!s.is_alive());
    assert_eq!(scheduler.0.advance(16), 1);
    assert_eq!(changes.borrow().len(), seen);

    let mut dropped = VirtualScroller::new(options, scheduler.clone());
    dropped.set_sequence(0..1000u64).unwrap();
    let seen = changes.borrow().len();
    dropped.on_scroll(5_000.0);
    drop(dropped);
    assert_eq!(scheduler.0.advance(16), 1);
    assert_eq!(changes.borrow().len(), seen);
}

#[test]
fn teardown_cancels_pending_flush() {
    let (mut s, scheduler) = scroller(1000, ScrollerOptions::new(50.0).with_viewport_height(400.0));
    s.on_scroll(1_000.0);
    s.teardown();
    assert_eq!(scheduler.pending(), 0);
    assert_eq!(s.phase(), ScrollerPhase::Idle);

    // No new work is scheduled once torn down.
    s.on_scroll(2_000.0);
    s.on_resize(100.0);
    assert_eq!(scheduler.pending(), 0);
    assert_eq!(s.phase(), ScrollerPhase::Idle);
    assert_eq!(s.scroll_offset(), 1_000.0);
    assert_eq!(s.viewport_height(), 400.0);
}

#[test]
fn prepend_keeps_the_anchor_row_in_place() {
    let (requests, sink) = recorder::<f64>();
    let options = ScrollerOptions::new(50.0)
        .with_viewport_height(400.0)
        .with_on_scroll_request(Some(sink));
    let scheduler = Rc::new(ManualScheduler::new());
    let mut s = VirtualScroller::new(options, scheduler);
    s.set_sequence(100..200u64).unwrap();
    s.on_scroll(510.0);
    s.flush();

    let anchor = s.capture_anchor().unwrap();
    assert_eq!(anchor.id, 110);
    assert_eq!(anchor.offset_in_row, 10.0);

    s.set_sequence((0..10u64).chain(100..200)).unwrap();
    assert_eq!(s.scroll_offset(), 1_010.0);
    assert_eq!(*requests.borrow(), [1_010.0]);

    // The anchor row itself disappears: only clamping applies.
    s.set_sequence((0..10u64).chain(100..200).filter(|id| *id != 110))
        .unwrap();
    assert_eq!(s.scroll_offset(), 1_010.0);
    assert_eq!(requests.borrow().len(), 1);

    // Shrinking below the scroll position clamps.
    s.set_sequence(0..5u64).unwrap();
    assert_eq!(s.scroll_offset(), 0.0);
}

#[test]
fn apply_anchor_restores_a_captured_position() {
    let (mut s, _) = scroller(100, ScrollerOptions::new(50.0).with_viewport_height(400.0));
    s.on_scroll(730.0);
    let anchor = s.capture_anchor().unwrap();
    assert_eq!(anchor.id, 14);

    s.scroll_to_row(&0, Align::Start);
    s.on_row_measured(&3, 90.0).unwrap();
    assert!(s.apply_anchor(&anchor));
    assert_eq!(s.scroll_offset(), 770.0);

    let gone = ScrollAnchor {
        id: 5000,
        offset_in_row: 0.0,
    };
    assert!(!s.apply_anchor(&gone));
}

#[test]
fn uniform_mode_skips_measurement() {
    let options = ScrollerOptions::new(50.0)
        .with_uniform_height(Some(30.0))
        .with_viewport_height(600.0);
    let (mut s, _) = scroller(10_000, options);
    assert_eq!(s.total_height(), 300_000.0);

    s.render_window(&mut label);
    assert_eq!(s.phase(), ScrollerPhase::Idle);
    assert_eq!(s.on_row_measured(&5, 100.0), Ok(0.0));
    assert_eq!(s.total_height(), 300_000.0);

    assert_eq!(s.scroll_to_row(&5000, Align::Start), Some(150_000.0));
    assert_eq!(s.window().first_index(), Some(4998));
}

#[test]
fn height_mode_switch_keeps_the_anchor() {
    let (requests, sink) = recorder::<f64>();
    let options = ScrollerOptions::new(50.0)
        .with_viewport_height(400.0)
        .with_on_scroll_request(Some(sink));
    let (mut s, _) = scroller(1000, options);
    s.on_scroll(25_010.0);
    s.flush();

    s.set_height_mode(Some(20.0));
    assert_eq!(s.scroll_offset(), 10_010.0);
    assert_eq!(*requests.borrow(), [10_010.0]);
    assert_eq!(s.total_height(), 20_000.0);
}

#[test]
fn views_roundtrip_through_the_store() {
    let mut store: MemoryViewStore<u64> = MemoryViewStore::new();
    let options = ScrollerOptions::new(50.0).with_viewport_height(400.0);

    let (mut s1, _) = scroller(100, options.clone());
    s1.on_row_measured(&3, 80.0).unwrap();
    s1.on_scroll(600.0);
    s1.flush();
    s1.save_view(&mut store, "orders");
    assert_eq!(store.len(), 1);

    let (mut s2, _) = scroller(100, options.with_viewport_height(0.0));
    assert!(!s2.restore_view(&store, "missing"));
    assert!(s2.restore_view(&store, "orders"));
    assert_eq!(s2.scroll_offset(), 600.0);
    assert_eq!(s2.viewport_height(), 400.0);
    assert_eq!(s2.tracker(|t| t.height(&3)), Ok(80.0));
    assert_eq!(s2.total_height(), 5_030.0);
}
