// Example: measured heights refine offsets; uniform mode skips measurement entirely.
use rowwindow::HeightTracker;

fn main() {
    let mut t = HeightTracker::new(50.0);
    t.set_sequence(["intro", "body", "footer"]).expect("ids are unique");
    println!("estimated: total={}", t.total_height());

    let changed = t.report_measured(&"body", 180.0).expect("id is tracked");
    println!(
        "measured body: changed={changed} footer_offset={:?} total={}",
        t.offset(&"footer"),
        t.total_height()
    );

    // Same height again: nothing downstream moves.
    let changed = t.report_measured(&"body", 180.0).expect("id is tracked");
    println!("re-measured body: changed={changed}");

    t.set_height_mode(Some(30.0));
    println!(
        "uniform: footer_offset={:?} total={}",
        t.offset(&"footer"),
        t.total_height()
    );
}
