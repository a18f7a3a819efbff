//! Receive-side buffering
//!
//! The jitter buffer absorbs network delay variation between the socket
//! reader and the media scheduler, restoring sequence order and assigning
//! each packet its playout duration.

mod config;
mod jitter;

pub use config::*;
pub use jitter::{BufferListener, JitterBuffer, JitterBufferStats};
