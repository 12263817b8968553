//! Statistics over tick samples.
//!
//! Samples are never stored: each round trip is folded into a running
//! [`Stat`] and only the summary survives the size block.

mod running;

pub use running::Stat;
