//! Fixed-Capacity Ring Buffer
//!
//! Holds the most recent N items of a stream, overwriting the oldest once
//! full. Used for the rolling landmark window behind capture-and-average.

mod buffer;

pub use buffer::{RingBuffer, DEFAULT_CAPACITY};
