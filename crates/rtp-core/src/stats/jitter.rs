use crate::RtpTimestamp;

/// Interarrival jitter estimator (RFC 3550 section 6.4.1 / appendix A.8).
///
/// Works in RTP clock units with the integer form of the filter: the running
/// value is kept scaled by 16, so `J += |D| - ((J + 8) >> 4)` and the
/// estimate is `J >> 4`.
#[derive(Debug, Clone, Default)]
pub struct JitterEstimator {
    /// Jitter scaled by 16
    jitter: u64,

    /// Relative transit time of the previous packet
    last_transit: Option<i64>,

    /// Largest estimate seen
    max_jitter: u64,

    samples: u64,
}

impl JitterEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one packet: its RTP timestamp and its arrival time in the same clock units
    pub fn update(&mut self, timestamp: RtpTimestamp, arrival: RtpTimestamp) -> u64 {
        // Transit is only meaningful relative to the previous packet, so the
        // 32-bit difference is read as signed and wraps harmlessly.
        let transit = arrival.wrapping_sub(timestamp) as i32 as i64;

        if let Some(last) = self.last_transit {
            let d = (transit - last).unsigned_abs();
            self.jitter = (self.jitter + d).saturating_sub((self.jitter + 8) >> 4);
            self.samples += 1;
            self.max_jitter = self.max_jitter.max(self.estimate());
        }

        self.last_transit = Some(transit);
        self.estimate()
    }

    /// Current estimate in RTP clock units
    pub fn estimate(&self) -> u64 {
        self.jitter >> 4
    }

    /// Largest estimate seen, in RTP clock units
    pub fn max_estimate(&self) -> u64 {
        self.max_jitter
    }

    /// Current estimate in milliseconds at `clock_rate`
    pub fn estimate_ms(&self, clock_rate: u32) -> f64 {
        if clock_rate == 0 {
            return 0.0;
        }
        self.estimate() as f64 * 1000.0 / clock_rate as f64
    }

    /// Number of transit differences folded into the estimate
    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steady_stream_has_no_jitter() {
        let mut estimator = JitterEstimator::new();
        for i in 0..50u32 {
            estimator.update(i * 160, 1000 + i * 160);
        }
        assert_eq!(estimator.estimate(), 0);
        assert_eq!(estimator.samples(), 49);
    }

    #[test]
    fn test_delayed_packets_raise_estimate() {
        // 20ms packets at 8kHz; arrivals at 0, 20, 50, 70, 100 ms
        let mut estimator = JitterEstimator::new();
        assert_eq!(estimator.update(160, 0), 0);
        assert_eq!(estimator.update(320, 160), 0);
        assert_eq!(estimator.update(480, 400), 5);
        assert_eq!(estimator.update(640, 560), 4);
        assert_eq!(estimator.update(800, 800), 9);
        assert_eq!(estimator.max_estimate(), 9);
        assert!((estimator.estimate_ms(8000) - 1.125).abs() < 1e-9);

        estimator.reset();
        assert_eq!(estimator.estimate(), 0);
        assert_eq!(estimator.samples(), 0);
    }

    #[test]
    fn test_timestamp_wrap_is_harmless() {
        let mut estimator = JitterEstimator::new();
        estimator.update(u32::MAX - 159, 5000);
        estimator.update(0, 5160);
        estimator.update(160, 5320);
        assert_eq!(estimator.estimate(), 0);
    }
}
