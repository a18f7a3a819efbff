//! RTP statistics
//!
//! Receive-side measurements that feed the jitter buffer's statistics.

pub mod jitter;

pub use jitter::JitterEstimator;
