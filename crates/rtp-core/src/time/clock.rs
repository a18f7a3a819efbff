use tracing::warn;

use crate::error::Error;
use crate::{Result, RtpTimestamp};

/// Maps RTP timestamps of one stream onto a millisecond media timeline.
///
/// The first timestamp handed to [`RtpClock::synchronize`] becomes time zero.
/// Later timestamps are placed on the timeline by their signed distance from
/// that origin, so a 32-bit timestamp wrap does not produce a jump.
#[derive(Debug, Clone)]
pub struct RtpClock {
    clock_rate: u32,
    origin: Option<RtpTimestamp>,
}

impl RtpClock {
    /// Create a clock for the given rate in Hz
    pub fn new(clock_rate: u32) -> Result<Self> {
        if clock_rate == 0 {
            return Err(Error::InvalidConfig("clock rate must be greater than zero".to_string()));
        }
        Ok(Self { clock_rate, origin: None })
    }

    pub fn clock_rate(&self) -> u32 {
        self.clock_rate
    }

    /// Change the clock rate, e.g. after a payload format switch
    pub fn set_clock_rate(&mut self, clock_rate: u32) -> Result<()> {
        if clock_rate == 0 {
            return Err(Error::InvalidConfig("clock rate must be greater than zero".to_string()));
        }
        if clock_rate != self.clock_rate {
            warn!(old = self.clock_rate, new = clock_rate, "RTP clock rate changed");
            self.clock_rate = clock_rate;
        }
        Ok(())
    }

    /// Anchor the timeline at `timestamp`
    pub fn synchronize(&mut self, timestamp: RtpTimestamp) {
        self.origin = Some(timestamp);
    }

    pub fn is_synchronized(&self) -> bool {
        self.origin.is_some()
    }

    /// Forget the timeline origin
    pub fn reset(&mut self) {
        self.origin = None;
    }

    /// Milliseconds to clock units
    pub fn millis_to_units(&self, millis: u64) -> u64 {
        millis * self.clock_rate as u64 / 1000
    }

    /// Clock units to milliseconds, truncating
    pub fn units_to_millis(&self, units: u64) -> u64 {
        units * 1000 / self.clock_rate as u64
    }

    /// Position of `timestamp` on the media timeline, in milliseconds.
    ///
    /// Negative for timestamps that precede the origin. An unsynchronized
    /// clock uses zero as its origin.
    pub fn to_absolute_time(&self, timestamp: RtpTimestamp) -> i64 {
        let origin = self.origin.unwrap_or(0);
        let units = super::rtp_timestamp_delta(timestamp, origin);
        units * 1000 / self.clock_rate as i64
    }

    /// RTP timestamp of a point on the media timeline
    pub fn to_rtp_time(&self, millis: i64) -> RtpTimestamp {
        let origin = self.origin.unwrap_or(0);
        let units = millis * self.clock_rate as i64 / 1000;
        origin.wrapping_add(units as RtpTimestamp)
    }

    /// Local time, given as milliseconds since an arbitrary epoch, in clock units
    pub fn local_rtp_time(&self, elapsed_millis: u64) -> RtpTimestamp {
        self.millis_to_units(elapsed_millis) as RtpTimestamp
    }
}
