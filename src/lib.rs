//! Unbiased Space-Saving: approximate top-k frequency estimation over a stream
//!
//! The sketch keeps at most `k` items in a min-heap keyed by estimated count,
//! with an index for constant-time lookup. An unseen item arriving when the
//! sketch is full replaces the minimum entry only with probability
//! `1 / (min + 1)`, which removes the overestimate that plain Space-Saving
//! assigns to newly admitted items.
//!
//! ```
//! use unbiased_space_saving::UnbiasedSpaceSaving;
//!
//! let mut sketch = UnbiasedSpaceSaving::new(2, 42).unwrap();
//! sketch.extend(["a", "b", "a", "a", "c"]);
//!
//! let top = sketch.top_n(1);
//! assert_eq!(top[0].item, "a");
//! assert_eq!(top[0].count, 3);
//! ```

mod error;
pub use error::{Error, Result};

mod sketch;
pub use sketch::{Node, UnbiasedSpaceSaving};

mod random;
pub use random::{SeededUniform, UniformSource};

pub mod edges;

mod store;
