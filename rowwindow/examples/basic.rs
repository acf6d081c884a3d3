use rowwindow::HeightTracker;

fn main() {
    let mut t = HeightTracker::new(50.0);
    t.set_sequence(0u64..1000).expect("ids are unique");

    let w = t.window(0.0, 400.0, 50.0);
    println!("total={} window={w:?}", t.total_height());
    t.for_each_row(w, |row| {
        println!("row {} at {}..{}", row.index, row.start, row.end());
    });
}
