//! Wraparound-aware arithmetic on 16-bit RTP sequence numbers
//!
//! Sequence numbers live on a ring of 65536 values. Every comparison in this
//! module takes the shorter arc between two numbers, so `65535 -> 0` is a
//! step forward by one and `0 -> 65535` is a step back by one.
//!
//! Extended sequence numbers (`cycles * 65536 + wire`) are plain `u64`
//! values. They are derived from a reference extended number plus the signed
//! ring distance, with checked arithmetic, so an extended number is never
//! negative and never aliases another cycle as long as both ends of a
//! comparison are within half the ring of each other.

use crate::RtpSequenceNumber;

/// Number of distinct wire sequence numbers
pub const SEQ_MODULO: u64 = 1 << 16;

/// Half the sequence space; distances beyond this are read as having wrapped
pub const SEQ_HALF_RANGE: u32 = 0x8000;

/// Largest buffer capacity for which extended numbers cannot alias
pub const MAX_UNAMBIGUOUS_WINDOW: usize = 0x8000;

/// Forward jump beyond which a packet is treated as an outlier (RFC 3550 A.1)
pub const DEFAULT_MAX_DROPOUT: u16 = 3000;

/// Backward jump beyond which a packet is treated as an outlier (RFC 3550 A.1)
pub const DEFAULT_MAX_MISORDER: u16 = 100;

/// Signed distance `a - b` on the sequence ring, in `[-32768, 32767]`.
///
/// A raw difference of exactly half the ring resolves to the negative side.
pub fn seq_distance(a: RtpSequenceNumber, b: RtpSequenceNumber) -> i32 {
    a.wrapping_sub(b) as i16 as i32
}

/// True when `a` comes after `b` on the shorter arc
pub fn seq_is_newer(a: RtpSequenceNumber, b: RtpSequenceNumber) -> bool {
    seq_distance(a, b) > 0
}

/// The newer of two sequence numbers
pub fn seq_max(a: RtpSequenceNumber, b: RtpSequenceNumber) -> RtpSequenceNumber {
    if seq_is_newer(b, a) { b } else { a }
}

/// True when moving forward from `reference` to `seq` crosses `65535 -> 0`
pub fn wraps_forward(seq: RtpSequenceNumber, reference: RtpSequenceNumber) -> bool {
    seq_distance(seq, reference) > 0 && seq < reference
}

/// Interpret `seq` relative to the extended number `reference`.
///
/// Returns `None` when the closest interpretation would fall below zero,
/// i.e. the packet predates the very first cycle of the stream.
pub fn extend_sequence(reference: u64, seq: RtpSequenceNumber) -> Option<u64> {
    let delta = seq_distance(seq, reference as RtpSequenceNumber);
    reference.checked_add_signed(delta as i64)
}

/// Number of completed 16-bit cycles contained in an extended number
pub fn sequence_cycles(extended: u64) -> u64 {
    extended / SEQ_MODULO
}

/// Wire value of an extended number
pub fn wire_sequence(extended: u64) -> RtpSequenceNumber {
    (extended % SEQ_MODULO) as RtpSequenceNumber
}

/// Where a newly arrived sequence number sits relative to the highest one seen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceOrder {
    /// Exactly the next number after the highest
    Next,
    /// Ahead of the highest, leaving `missing` numbers in between
    Ahead { missing: u16 },
    /// Equal to the highest
    Duplicate,
    /// Behind the highest by `distance`; may still fill a hole
    Behind { distance: u16 },
    /// Too far from the highest in either direction to be trusted
    Outlier { delta: i32 },
}

/// Thresholds separating reordering from stream discontinuities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceLimits {
    /// Largest accepted forward jump
    pub max_dropout: u16,
    /// Largest accepted backward jump
    pub max_misorder: u16,
}

impl Default for SequenceLimits {
    fn default() -> Self {
        Self {
            max_dropout: DEFAULT_MAX_DROPOUT,
            max_misorder: DEFAULT_MAX_MISORDER,
        }
    }
}

/// Classify `seq` against the highest sequence number seen so far
pub fn classify(
    seq: RtpSequenceNumber,
    highest: RtpSequenceNumber,
    limits: &SequenceLimits,
) -> SequenceOrder {
    let delta = seq_distance(seq, highest);
    match delta {
        0 => SequenceOrder::Duplicate,
        1 => SequenceOrder::Next,
        d if d > 1 && d <= limits.max_dropout as i32 => SequenceOrder::Ahead {
            missing: (d - 1) as u16,
        },
        d if d < 0 && -d <= limits.max_misorder as i32 => SequenceOrder::Behind {
            distance: (-d) as u16,
        },
        d => SequenceOrder::Outlier { delta: d },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_shortest_arc() {
        assert_eq!(seq_distance(10, 5), 5);
        assert_eq!(seq_distance(5, 10), -5);
        assert_eq!(seq_distance(0, 65535), 1);
        assert_eq!(seq_distance(65535, 0), -1);
        assert_eq!(seq_distance(1, 65533), 4);
        assert_eq!(seq_distance(32767, 0), 32767);
        assert_eq!(seq_distance(32768, 0), -32768);
    }

    #[test]
    fn test_newer_and_max() {
        assert!(seq_is_newer(0, 65535));
        assert!(!seq_is_newer(65535, 0));
        assert!(!seq_is_newer(7, 7));
        assert_eq!(seq_max(65534, 2), 2);
        assert_eq!(seq_max(100, 99), 100);
    }

    #[test]
    fn test_wraps_forward() {
        assert!(wraps_forward(0, 65535));
        assert!(wraps_forward(3, 65500));
        assert!(!wraps_forward(65535, 0));
        assert!(!wraps_forward(11, 10));
    }

    #[test]
    fn test_extend_across_wrap() {
        let reference = 65535;
        assert_eq!(extend_sequence(reference, 0), Some(65536));
        assert_eq!(extend_sequence(reference, 65534), Some(65534));

        let reference = 65536 + 2;
        assert_eq!(extend_sequence(reference, 65535), Some(65535));
        assert_eq!(sequence_cycles(65536 + 2), 1);
        assert_eq!(wire_sequence(65536 + 2), 2);
    }

    #[test]
    fn test_extend_never_negative() {
        // 65535 relative to extended 1 would be -1
        assert_eq!(extend_sequence(1, 65535), None);
        assert_eq!(extend_sequence(0, 0), Some(0));
    }

    #[test]
    fn test_classify() {
        let limits = SequenceLimits::default();
        assert_eq!(classify(11, 10, &limits), SequenceOrder::Next);
        assert_eq!(classify(0, 65535, &limits), SequenceOrder::Next);
        assert_eq!(classify(14, 10, &limits), SequenceOrder::Ahead { missing: 3 });
        assert_eq!(classify(10, 10, &limits), SequenceOrder::Duplicate);
        assert_eq!(classify(65534, 1, &limits), SequenceOrder::Behind { distance: 3 });
        assert_eq!(classify(10 + 3001, 10, &limits), SequenceOrder::Outlier { delta: 3001 });
        assert_eq!(classify(10, 200, &limits), SequenceOrder::Outlier { delta: -190 });
    }
}
