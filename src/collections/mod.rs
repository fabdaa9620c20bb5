//! Containers and views backing the state layers.
//!
//! - [`IndexedRandomSet`]: O(1) add / remove / uniform sample.
//! - [`SequenceView`], [`StackedView`], [`FnView`], [`SliceView`]: zero-copy
//!   composition of indexable sequences.
//! - [`shuffled_range`], [`shuffled`]: allocation-free random-looking order.

mod random_set;
mod shuffle;
mod view;

pub use random_set::IndexedRandomSet;
pub use shuffle::{shuffled, shuffled_range, ShuffledRange};
pub use view::{FnView, SequenceView, SliceView, StackedView, ViewIter};
