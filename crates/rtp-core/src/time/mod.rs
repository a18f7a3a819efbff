//! Time and clock utilities for RTP
//!
//! This module converts between RTP timestamps and wall-clock durations and
//! provides [`RtpClock`], which anchors a stream's timestamps to a media
//! timeline measured in milliseconds.

mod clock;

pub use clock::RtpClock;

use std::time::Duration;

use crate::RtpTimestamp;

/// Convert an RTP timestamp span to a duration at a given clock rate
pub fn rtp_timestamp_to_duration(timestamp: RtpTimestamp, clock_rate: u32) -> Duration {
    if clock_rate == 0 {
        return Duration::from_secs(0);
    }

    let seconds = timestamp / clock_rate;
    let remainder = timestamp % clock_rate;
    let nanos = ((remainder as u64) * 1_000_000_000) / (clock_rate as u64);

    Duration::new(seconds as u64, nanos as u32)
}

/// Convert a duration to an RTP timestamp span at a given clock rate
pub fn duration_to_rtp_timestamp(duration: Duration, clock_rate: u32) -> RtpTimestamp {
    let seconds = duration.as_secs();
    let nanos = duration.subsec_nanos();

    let timestamp_seconds = seconds * (clock_rate as u64);
    let timestamp_fraction = ((nanos as u64) * (clock_rate as u64)) / 1_000_000_000;

    (timestamp_seconds + timestamp_fraction) as RtpTimestamp
}

/// Signed difference `a - b` between two RTP timestamps, handling wraparound
///
/// The shorter way around the 32-bit ring wins.
pub fn rtp_timestamp_delta(a: RtpTimestamp, b: RtpTimestamp) -> i64 {
    a.wrapping_sub(b) as i32 as i64
}

/// Absolute difference between two RTP timestamps, handling wraparound
pub fn rtp_timestamp_diff(a: RtpTimestamp, b: RtpTimestamp) -> u32 {
    rtp_timestamp_delta(a, b).unsigned_abs() as u32
}

/// Typical clock rates for common audio codecs
pub mod clock_rates {
    /// G.711, G.726, G.729 (8kHz)
    pub const AUDIO_8KHZ: u32 = 8000;

    /// G.722 (16kHz)
    pub const AUDIO_16KHZ: u32 = 16000;

    /// Opus, AAC (48kHz)
    pub const AUDIO_48KHZ: u32 = 48000;
}
