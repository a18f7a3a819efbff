//! RTP Packet module
//!
//! Wire-level RTP packets (RFC 3550 header plus payload) and the decoded
//! [`RtpPacketRecord`] that the jitter buffer stores and hands back.

pub mod header;
pub mod rtp;
pub mod record;

pub use header::*;
pub use rtp::*;
pub use record::*;

/// Hex dump of a byte slice, for trace logging
pub fn hex_dump(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
