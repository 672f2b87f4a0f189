//! Ordered map backed by a [left-leaning-red-black][llrb] tree.
//!
//! Apart from the usual get/set/delete, [`Llrb`] supports min/max,
//! floor/ceiling, rank/select, ordered range iteration and a
//! cancellable [`Stream`] of keys.
//!
//! [llrb]: https://en.wikipedia.org/wiki/Left-leaning_red-black_tree

mod depth;
mod empty;
mod error;
mod llrb;
mod stream;

pub use crate::depth::Depth;
pub use crate::empty::Empty;
pub use crate::error::LlrbError;
pub use crate::llrb::{Llrb, Range, Reverse, Stats, ITER_LIMIT};
pub use crate::stream::{CancelToken, Keys, Stream};

#[cfg(test)]
mod llrb_test;
