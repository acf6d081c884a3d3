// Example: prepend rows above the viewport (chat history style) without moving the visible content.
use std::rc::Rc;

use rowwindow_scroller::{ManualScheduler, RowWindow, ScrollerOptions, VirtualScroller};

fn main() {
    let scheduler = Rc::new(ManualScheduler::new());
    let options = ScrollerOptions::new(40.0)
        .with_viewport_height(320.0)
        .with_on_scroll_request(Some(|offset: f64| println!("host: scroll to {offset}")))
        .with_on_window_change(Some(|w: RowWindow| println!("host: window changed to {w:?}")));
    let mut s = VirtualScroller::new(options, scheduler.clone());

    s.set_sequence(100..200u64).expect("ids are unique");
    s.on_scroll(410.0);
    scheduler.advance(16);

    let out = s.render_window(&mut |id: &u64| Ok::<_, String>(format!("message {id}")));
    for row in &out.rows {
        s.on_row_measured(&row.id, 40.0 + (row.id % 3) as f64 * 8.0)
            .expect("mounted rows are tracked");
    }
    let anchor = s.capture_anchor().expect("sequence is not empty");
    println!("before: offset={} anchor={anchor:?}", s.scroll_offset());

    // Older history arrives above.
    s.set_sequence((0..100u64).chain(100..200)).expect("ids are unique");
    println!(
        "after: offset={} anchor={:?}",
        s.scroll_offset(),
        s.capture_anchor()
    );
}
