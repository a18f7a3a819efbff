//! RTP Core library for the tmedia media server
//!
//! This crate provides the receive path between the network and the media
//! pipeline: RTP packet encoding/decoding, wraparound-aware sequence and
//! timestamp arithmetic, and a fixed-capacity jitter buffer.
//!
//! The library is organized into several modules:
//!
//! - `packet`: RTP header/packet codec and the buffered packet record
//! - `sequence`: 16-bit sequence ring arithmetic and extended numbers
//! - `buffer`: the jitter buffer and its configuration
//! - `stats`: interarrival jitter estimation
//! - `time`: RTP clock and timestamp utilities

mod error;

// Main modules
pub mod buffer;
pub mod packet;
pub mod sequence;
pub mod stats;
pub mod time;

// Re-export core types
pub use error::Error;

pub use buffer::{BufferListener, JitterBuffer, JitterBufferConfig, JitterBufferStats};
pub use packet::{RtpHeader, RtpPacket, RtpPacketRecord};
pub use time::RtpClock;

/// The default maximum size for RTP packets in bytes
pub const DEFAULT_MAX_PACKET_SIZE: usize = 1500;

/// Typedef for RTP timestamp values
pub type RtpTimestamp = u32;

/// Typedef for RTP sequence numbers
pub type RtpSequenceNumber = u16;

/// Typedef for RTP synchronization source identifier
pub type RtpSsrc = u32;

/// Typedef for RTP contributing source identifier
pub type RtpCsrc = u32;

/// Result type for RTP operations
pub type Result<T> = std::result::Result<T, Error>;

/// Prelude module with commonly used types
pub mod prelude {
    pub use crate::{
        BufferListener, Error, JitterBuffer, JitterBufferConfig, JitterBufferStats,
        Result, RtpClock, RtpHeader, RtpPacket, RtpPacketRecord,
        RtpCsrc, RtpSequenceNumber, RtpSsrc, RtpTimestamp,
    };
}
