use unbiased_space_saving::UnbiasedSpaceSaving;

fn main() {
    // Create a sketch with:
    // - capacity=3 (number of items tracked at once)
    // - seed=42 (eviction decisions are reproducible for a given seed)
    let mut sketch = UnbiasedSpaceSaving::new(3, 42).expect("capacity is non-zero");

    let stream = "to be or not to be that is the question to be";
    sketch.extend(stream.split_whitespace());

    // Print the items and their estimated counts in order of frequency
    println!("Top items and their estimated frequencies:");
    for node in sketch.top_n(3) {
        println!("{}: {}", node.item, node.count);
    }

    // Demonstrate the count() method
    let item = "to";
    println!("\nEstimated count for '{}': {:?}", item, sketch.count(item));

    // Demonstrate the query() method
    println!("Is '{}' resident? {}",
        item,
        if sketch.query(item) { "yes" } else { "no" });

    // into_top_n() consumes the sketch
    let best = sketch.into_top_n(1);
    println!("\nWinner: {} ({})", best[0].item, best[0].count);
}
