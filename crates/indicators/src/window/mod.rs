//! Window combinators shared by every calculator.
//!
//! Each combinator turns "apply a reducer to a view of consecutive records"
//! into a reusable primitive. Sliding windows keep their output aligned 1:1
//! with the input; the accumulating window emits one value per group.

pub mod accumulating;
pub mod mapped;
pub mod sliding;

pub use accumulating::AccumulatingWindow;
pub use mapped::MappedSlidingWindow;
pub use sliding::SlidingWindow;
