//! Eviction policy for the buffer pool.
//!
//! The replacer only *selects* victims; write-back, page-table maintenance,
//! and descriptor resets stay in the manager.

mod clock;

pub use clock::ClockReplacer;
