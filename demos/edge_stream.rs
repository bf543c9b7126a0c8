use std::collections::HashMap;
use std::time::Instant;

use rand::prelude::*;
use rand::rngs::SmallRng;
use unbiased_space_saving::edges::{self, EdgeReader, NodeId};
use unbiased_space_saving::{Node, UnbiasedSpaceSaving};

// Builds a synthetic edge stream where a few hub nodes have most of the edges,
// tracks node degrees with a small sketch and compares against exact degrees.
fn main() -> unbiased_space_saving::Result<()> {
    let mut rng = SmallRng::seed_from_u64(4177);
    let mut text = String::new();
    for t in 0..200_000u32 {
        let hub: NodeId = rng.random_range(0..50);
        let other: NodeId = rng.random_range(50..100_000);
        let u = if rng.random_bool(0.6) { hub } else { other };
        let v: NodeId = rng.random_range(0..100_000);
        text.push_str(&format!("{} {} {}\n", u, v, t));
    }

    let mut exact: HashMap<NodeId, u64> = HashMap::new();
    let mut sketch = UnbiasedSpaceSaving::new(500, 4177)?;

    let start = Instant::now();
    for edge in EdgeReader::new(text.as_bytes()) {
        let (u, v) = edge?;
        sketch.update(u);
        sketch.update(v);
        *exact.entry(u).or_insert(0) += 1;
        *exact.entry(v).or_insert(0) += 1;
    }
    println!("use {} seconds", start.elapsed().as_secs_f64());

    let n_bar = 50;
    let mut truth: Vec<Node<NodeId>> = exact.into_iter().map(Node::from).collect();
    truth.sort_unstable_by(|a, b| b.count.cmp(&a.count).then(a.item.cmp(&b.item)));
    truth.truncate(n_bar);

    let estimate = sketch.into_top_n(n_bar);
    println!("recall@{}: {}", n_bar, edges::recall(&truth, &estimate));

    edges::write_top_nodes(std::io::stdout().lock(), &estimate[..estimate.len().min(10)])?;
    Ok(())
}
