//! Concurrent frame assembly: per-frame slots, the output merger, and the
//! finished-frame handoff queue.

pub mod merger;
pub mod slot;
