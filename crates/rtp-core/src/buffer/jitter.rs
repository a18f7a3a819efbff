//! Fixed-capacity jitter buffer for RTP audio
//!
//! Packets are written from the network receive path in whatever order they
//! arrive and read back in sequence order, once per scheduler tick, by the
//! media pipeline. Storage is a ring of `capacity` slots addressed by
//! `extended_sequence % capacity`; whether a slot is live is decided purely
//! by comparing its extended sequence number with the read and write
//! cursors, so there are no tombstones to keep consistent.
//!
//! Cursor invariants, held under the lock at all times:
//!
//! - `read_cursor <= write_cursor`
//! - `write_cursor - read_cursor <= capacity`
//! - a slot is live only while it holds the packet whose extended sequence
//!   number lies in `[read_cursor, write_cursor)` and maps to that slot
//!
//! Neither `write` nor `read` ever blocks, allocates beyond moving the
//! record into its slot, or fails.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::packet::RtpPacketRecord;
use crate::sequence::{
    classify, extend_sequence, sequence_cycles, wire_sequence, wraps_forward,
    SequenceLimits, SequenceOrder,
};
use crate::stats::JitterEstimator;
use crate::time::RtpClock;
use crate::{Result, RtpSequenceNumber, RtpTimestamp};

use super::config::JitterBufferConfig;

/// Notified when the buffer has accumulated its jitter depth and playout starts
pub trait BufferListener: Send + Sync {
    fn on_fill(&self);
}

/// Statistics for jitter buffer
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JitterBufferStats {
    /// Total packets handed to `write`
    pub packets_received: u64,

    /// Total packets returned by `read`
    pub packets_played: u64,

    /// Packets rejected because their slot already held them
    pub duplicates: u64,

    /// Packets dropped because playout had already passed them
    pub packets_too_late: u64,

    /// Unread packets discarded to make room for newer ones
    pub packets_overflow: u64,

    /// Sequence numbers skipped at playout because they never arrived
    pub packets_lost: u64,

    /// Packets dropped for an implausible sequence jump
    pub outliers: u64,

    /// Confirmed sequence discontinuities that restarted the stream
    pub resyncs: u64,

    /// Timestamp gaps bridged with the nominal packet duration
    pub silence_gaps: u64,

    /// Reads that found the buffer drained during playout
    pub underruns: u64,

    /// Packets currently stored and unread
    pub buffered_packets: usize,

    /// Completed 16-bit sequence cycles of the current stream
    pub sequence_cycles: u64,

    /// Interarrival jitter estimate in RTP clock units
    pub jitter: u64,

    /// Interarrival jitter estimate in milliseconds
    pub jitter_ms: f64,
}

struct Slot {
    ext_seq: u64,
    packet: RtpPacketRecord,
}

/// Everything guarded by the buffer lock
struct JitterState {
    slots: Vec<Option<Slot>>,
    capacity: u64,
    depth_packets: u64,
    nominal_ms: u64,
    silence_factor: u64,
    buffering: bool,
    limits: SequenceLimits,
    clock: RtpClock,

    started: bool,
    write_cursor: u64,
    read_cursor: u64,
    playing: bool,

    /// Packets placed in a slot since the last restart
    stored: u64,

    /// Packets dropped by `reset` or a resync since the last restart
    discarded: u64,

    /// Extended sequence number and timestamp of the last packet played out
    last_delivered: Option<(u64, RtpTimestamp)>,

    /// Sequence number that would confirm a pending discontinuity
    bad_seq: Option<RtpSequenceNumber>,

    last_read_time: Option<u64>,
    drift_pending: bool,
    drift_ms: i64,

    estimator: JitterEstimator,
    stats: JitterBufferStats,
    listener: Option<Arc<dyn BufferListener>>,
}

/// Jitter buffer shared between one producer and one consumer.
///
/// All methods take `&self`; wrap the buffer in an `Arc` to hand it to the
/// receive path and the scheduler.
pub struct JitterBuffer {
    config: JitterBufferConfig,
    state: Mutex<JitterState>,
    epoch: Instant,
}

impl JitterBuffer {
    /// Create a buffer, rejecting an unusable configuration
    pub fn new(config: JitterBufferConfig) -> Result<Self> {
        config.validate()?;
        let clock = RtpClock::new(config.clock_rate)?;

        let state = JitterState {
            slots: (0..config.capacity).map(|_| None).collect(),
            capacity: config.capacity as u64,
            depth_packets: depth_in_packets(&clock, &config),
            nominal_ms: config.packet_duration_ms as u64,
            silence_factor: config.silence_factor as u64,
            buffering: config.buffering,
            limits: config.sequence_limits(),
            clock,
            started: false,
            write_cursor: 0,
            read_cursor: 0,
            playing: false,
            stored: 0,
            discarded: 0,
            last_delivered: None,
            bad_seq: None,
            last_read_time: None,
            drift_pending: false,
            drift_ms: 0,
            estimator: JitterEstimator::new(),
            stats: JitterBufferStats::default(),
            listener: None,
        };

        debug!(
            capacity = config.capacity,
            depth_ms = config.jitter_depth_ms,
            depth_packets = state.depth_packets,
            clock_rate = config.clock_rate,
            "jitter buffer created"
        );

        Ok(Self {
            config,
            state: Mutex::new(state),
            epoch: Instant::now(),
        })
    }

    /// Create a buffer from a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Self::new(JitterBufferConfig::from_toml_str(source)?)
    }

    pub fn config(&self) -> &JitterBufferConfig {
        &self.config
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Register the listener told when playout can start
    pub fn set_listener(&self, listener: Arc<dyn BufferListener>) {
        self.state.lock().listener = Some(listener);
    }

    /// Switch to another clock rate, e.g. after a payload format change
    pub fn set_clock_rate(&self, clock_rate: u32) -> Result<()> {
        let mut state = self.state.lock();
        state.clock.set_clock_rate(clock_rate)?;
        let mut config = self.config.clone();
        config.clock_rate = clock_rate;
        state.depth_packets = depth_in_packets(&state.clock, &config);
        Ok(())
    }

    /// Accept a packet, stamping its arrival with the buffer's monotonic clock
    pub fn write(&self, packet: RtpPacketRecord) {
        let arrival_ms = self.epoch.elapsed().as_millis() as u64;
        self.write_at(packet, arrival_ms);
    }

    /// Accept a packet that arrived `arrival_ms` after an arbitrary fixed epoch
    pub fn write_at(&self, packet: RtpPacketRecord, arrival_ms: u64) {
        let listener = {
            let mut state = self.state.lock();
            if state.write(packet, arrival_ms) {
                state.listener.clone()
            } else {
                None
            }
        };

        // Called outside the lock so the listener may use the buffer
        if let Some(listener) = listener {
            listener.on_fill();
        }
    }

    /// Next packet in sequence order, or `None` if nothing is playable yet.
    ///
    /// `current_time_ms` is the consumer's clock and must not go backwards.
    pub fn read(&self, current_time_ms: u64) -> Option<RtpPacketRecord> {
        self.state.lock().read(current_time_ms)
    }

    /// Sequence positions between the read and write cursors, holes included
    pub fn available(&self) -> usize {
        let state = self.state.lock();
        (state.write_cursor - state.read_cursor) as usize
    }

    /// Drop every stored packet and start over with the next write
    pub fn reset(&self) {
        self.state.lock().clear_stream();
        debug!("jitter buffer reset");
    }

    /// Reset, and also forget statistics, jitter estimate and clock origin
    pub fn restart(&self) {
        let mut state = self.state.lock();
        state.clear_stream();
        state.stats = JitterBufferStats::default();
        state.stored = 0;
        state.discarded = 0;
        state.estimator.reset();
        state.clock.reset();
        state.drift_ms = 0;
        state.last_read_time = None;
        debug!("jitter buffer restarted");
    }

    pub fn stats(&self) -> JitterBufferStats {
        let state = self.state.lock();
        let mut stats = state.stats.clone();
        let buffered = state.buffered();
        stats.buffered_packets = buffered as usize;
        // Whatever was stored and is neither played, discarded nor still queued was evicted
        stats.packets_overflow = state
            .stored
            .saturating_sub(state.stats.packets_played + state.discarded + buffered);
        stats.sequence_cycles = if state.started {
            sequence_cycles(state.write_cursor - 1)
        } else {
            0
        };
        stats.jitter = state.estimator.estimate();
        stats.jitter_ms = state.estimator.estimate_ms(state.clock.clock_rate());
        stats
    }

    /// RFC 3550 interarrival jitter in RTP clock units
    pub fn estimated_jitter(&self) -> u64 {
        self.state.lock().estimator.estimate()
    }

    /// Media time minus consumer time, measured when the current playout run began
    pub fn drift_ms(&self) -> i64 {
        self.state.lock().drift_ms
    }
}

/// Jitter depth expressed as a whole number of packets, at least one
fn depth_in_packets(clock: &RtpClock, config: &JitterBufferConfig) -> u64 {
    let depth_units = clock.millis_to_units(config.jitter_depth_ms as u64);
    let packet_units = clock.millis_to_units(config.packet_duration_ms as u64).max(1);
    (depth_units / packet_units).max(1)
}

impl JitterState {
    fn slot_index(&self, ext_seq: u64) -> usize {
        (ext_seq % self.capacity) as usize
    }

    fn holds(&self, ext_seq: u64) -> bool {
        matches!(&self.slots[self.slot_index(ext_seq)], Some(slot) if slot.ext_seq == ext_seq)
    }

    fn queued(&self) -> u64 {
        self.write_cursor - self.read_cursor
    }

    /// Stored packets inside the read window
    fn buffered(&self) -> u64 {
        (self.read_cursor..self.write_cursor)
            .filter(|&position| self.holds(position))
            .count() as u64
    }

    /// Oldest extended number that still fits the window ending at the write cursor
    fn window_start(&self) -> u64 {
        self.write_cursor.saturating_sub(self.capacity)
    }

    /// Jitter depth in packets, reduced so a full buffer always satisfies it
    fn effective_depth(&self) -> u64 {
        if self.buffering {
            self.depth_packets.min(self.capacity.saturating_sub(2))
        } else {
            0
        }
    }

    /// Enough newer media is queued to start playout
    fn can_start(&self) -> bool {
        if self.buffering {
            self.queued() > (self.depth_packets + 1).min(self.capacity - 1)
        } else {
            self.queued() > 0
        }
    }

    /// Enough newer media is queued to give up on a missing packet
    fn hole_expired(&self) -> bool {
        self.queued().saturating_sub(1) > self.effective_depth()
    }

    /// Returns true when this write started playout
    fn write(&mut self, packet: RtpPacketRecord, arrival_ms: u64) -> bool {
        self.stats.packets_received += 1;
        let seq = packet.sequence_number();
        let timestamp = packet.timestamp();

        if !self.started {
            self.start_stream(seq as u64, packet);
            self.estimator.update(timestamp, self.clock.local_rtp_time(arrival_ms));
            return self.check_fill();
        }

        let highest_ext = self.write_cursor - 1;
        let highest = wire_sequence(highest_ext);

        if let SequenceOrder::Outlier { delta } = classify(seq, highest, &self.limits) {
            if self.bad_seq != Some(seq) {
                warn!(seq, highest, delta, "dropping packet with implausible sequence jump");
                self.bad_seq = Some(seq.wrapping_add(1));
                self.stats.outliers += 1;
                return false;
            }

            // Two consecutive packets agree on the new numbering
            let resume = self.write_cursor
                + (seq.wrapping_sub(wire_sequence(self.write_cursor)) as u64);
            info!(seq, highest, "sequence discontinuity confirmed, resynchronizing stream");
            self.stats.resyncs += 1;
            self.clear_stream();
            self.start_stream(resume, packet);
            self.estimator.update(timestamp, self.clock.local_rtp_time(arrival_ms));
            return self.check_fill();
        }
        self.bad_seq = None;

        let Some(ext_seq) = extend_sequence(highest_ext, seq) else {
            trace!(seq, "packet predates the stream, dropping");
            self.stats.packets_too_late += 1;
            return false;
        };

        // Until playout delivers something, an earlier packet may still open the stream
        if ext_seq < self.read_cursor
            && self.last_delivered.is_none()
            && ext_seq >= self.window_start()
        {
            debug!(seq, from = self.read_cursor, to = ext_seq, "moving stream start back");
            self.read_cursor = ext_seq;
        }

        if ext_seq >= self.write_cursor {
            if wraps_forward(seq, highest) {
                debug!(seq, cycles = sequence_cycles(ext_seq), "sequence number wrapped");
            }
            self.advance_write(ext_seq, packet);
        } else if ext_seq >= self.read_cursor {
            let index = self.slot_index(ext_seq);
            if matches!(&self.slots[index], Some(slot) if slot.ext_seq >= ext_seq) {
                trace!(seq, "duplicate packet");
                self.stats.duplicates += 1;
                return false;
            }
            self.slots[index] = Some(Slot { ext_seq, packet });
            self.stored += 1;
        } else {
            trace!(seq, read_cursor = self.read_cursor, "packet too late for playout");
            self.stats.packets_too_late += 1;
            return false;
        }

        self.estimator.update(timestamp, self.clock.local_rtp_time(arrival_ms));
        self.check_fill()
    }

    fn start_stream(&mut self, ext_seq: u64, packet: RtpPacketRecord) {
        debug!(seq = packet.sequence_number(), "stream started");
        self.clock.synchronize(packet.timestamp());
        self.started = true;
        self.read_cursor = ext_seq;
        self.write_cursor = ext_seq;
        self.advance_write(ext_seq, packet);
    }

    /// Store a packet at or beyond the write cursor, giving up the oldest
    /// unread positions when the window would exceed the capacity.
    ///
    /// Evicted slots are left in place: once the read cursor has passed them
    /// their extended numbers no longer match any live position.
    fn advance_write(&mut self, ext_seq: u64, packet: RtpPacketRecord) {
        let new_write = ext_seq + 1;

        if new_write - self.read_cursor > self.capacity {
            let new_read = new_write - self.capacity;
            debug!(from = self.read_cursor, to = new_read, "jitter buffer overflow");
            self.read_cursor = new_read;
        }

        let index = self.slot_index(ext_seq);
        self.slots[index] = Some(Slot { ext_seq, packet });
        self.stored += 1;
        self.write_cursor = new_write;
    }

    fn check_fill(&mut self) -> bool {
        if self.playing || !self.can_start() {
            return false;
        }
        self.playing = true;
        self.drift_pending = true;
        info!(queued = self.queued(), "jitter buffer filled, playout starting");
        true
    }

    fn read(&mut self, now_ms: u64) -> Option<RtpPacketRecord> {
        if let Some(last) = self.last_read_time {
            if now_ms < last {
                debug!(now_ms, last, "read time went backwards, ignoring");
            }
        }
        self.last_read_time = Some(self.last_read_time.map_or(now_ms, |last| last.max(now_ms)));

        if self.queued() == 0 {
            if self.playing {
                debug!("jitter buffer drained, rebuffering");
                self.playing = false;
                self.stats.underruns += 1;
            }
            return None;
        }

        if !self.playing {
            return None;
        }

        if !self.holds(self.read_cursor) {
            if !self.hole_expired() {
                return None;
            }
            self.skip_hole();
        }

        let index = self.slot_index(self.read_cursor);
        let Slot { ext_seq, mut packet } = self.slots[index].take()?;
        self.read_cursor += 1;

        let duration = self.playout_duration(ext_seq, &packet);
        packet.set_duration(duration);

        if self.drift_pending {
            self.drift_pending = false;
            let now = i64::try_from(now_ms).unwrap_or(i64::MAX);
            self.drift_ms = self.clock.to_absolute_time(packet.timestamp()).saturating_sub(now);
        }

        self.last_delivered = Some((ext_seq, packet.timestamp()));
        self.stats.packets_played += 1;
        Some(packet)
    }

    /// Move the read cursor to the next stored packet
    fn skip_hole(&mut self) {
        let from = self.read_cursor;
        let mut position = from + 1;
        while position < self.write_cursor && !self.holds(position) {
            position += 1;
        }
        let lost = position - from;
        debug!(from, to = position, lost, "giving up on missing packets");
        self.stats.packets_lost += lost;
        self.read_cursor = position;
    }

    /// Playout duration from the timestamp step since the last delivered packet
    fn playout_duration(&mut self, ext_seq: u64, packet: &RtpPacketRecord) -> u64 {
        let Some((last_ext, last_ts)) = self.last_delivered else {
            return if packet.duration_ms() > 0 {
                packet.duration_ms()
            } else {
                self.nominal_ms
            };
        };

        let elapsed = self.clock.to_absolute_time(packet.timestamp())
            - self.clock.to_absolute_time(last_ts);
        if elapsed <= 0 {
            return 0;
        }

        let steps = ext_seq.saturating_sub(last_ext).max(1);
        // Lost packets in between account for one nominal period each
        let missing_ms = (steps - 1).saturating_mul(self.nominal_ms);
        let gap = (elapsed as u64).saturating_sub(missing_ms);
        if gap > self.nominal_ms * self.silence_factor {
            debug!(
                seq = packet.sequence_number(),
                gap_ms = elapsed,
                "silence gap, using nominal packet duration"
            );
            self.stats.silence_gaps += 1;
            self.nominal_ms
        } else {
            elapsed as u64 / steps
        }
    }

    fn clear_stream(&mut self) {
        self.discarded += self.buffered();
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
        self.started = false;
        self.write_cursor = 0;
        self.read_cursor = 0;
        self.playing = false;
        self.drift_pending = false;
        self.last_delivered = None;
        self.bad_seq = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn create_test_packet(seq: RtpSequenceNumber, ts: u32) -> RtpPacketRecord {
        RtpPacketRecord::from_slice(seq, ts, b"test")
    }

    fn buffer_with(config: JitterBufferConfig) -> JitterBuffer {
        JitterBuffer::new(config).unwrap()
    }

    #[test]
    fn test_construction_rejects_bad_config() {
        assert!(JitterBuffer::new(JitterBufferConfig::new(0, 40)).is_err());
        assert!(JitterBuffer::new(JitterBufferConfig::new(40000, 40)).is_err());
        let config = JitterBufferConfig { clock_rate: 0, ..Default::default() };
        assert!(JitterBuffer::new(config).is_err());
    }

    #[test]
    fn test_depth_in_packets() {
        let clock = RtpClock::new(8000).unwrap();
        assert_eq!(depth_in_packets(&clock, &JitterBufferConfig::new(100, 40)), 2);
        assert_eq!(depth_in_packets(&clock, &JitterBufferConfig::new(100, 100)), 5);
        assert_eq!(depth_in_packets(&clock, &JitterBufferConfig::new(100, 0)), 1);
    }

    #[test]
    fn test_out_of_order_packets() {
        let jitter = buffer_with(JitterBufferConfig::default());

        jitter.write(create_test_packet(1, 160));
        jitter.write(create_test_packet(3, 480));
        jitter.write(create_test_packet(2, 320));
        jitter.write(create_test_packet(4, 640));

        for expected in 1..=4 {
            assert_eq!(jitter.read(0).unwrap().sequence_number(), expected);
        }
        assert!(jitter.read(0).is_none());
    }

    #[test]
    fn test_duplicate_rejected() {
        let jitter = buffer_with(JitterBufferConfig::default());

        jitter.write(create_test_packet(10, 0));
        jitter.write(create_test_packet(12, 320));
        jitter.write(create_test_packet(11, 160));
        jitter.write(create_test_packet(11, 160));
        jitter.write(create_test_packet(12, 320));

        let stats = jitter.stats();
        assert_eq!(stats.duplicates, 2);
        assert_eq!(stats.buffered_packets, 3);
        assert_eq!(jitter.available(), 3);
    }

    #[test]
    fn test_late_packet_after_playout_dropped() {
        let jitter = buffer_with(JitterBufferConfig::default());

        jitter.write(create_test_packet(1, 160));
        jitter.write(create_test_packet(3, 480));
        jitter.write(create_test_packet(5, 800));
        jitter.write(create_test_packet(6, 960));

        assert_eq!(jitter.read(100).unwrap().sequence_number(), 1);
        // 2 is missing but 4 newer positions are queued behind it
        assert_eq!(jitter.read(120).unwrap().sequence_number(), 3);

        jitter.write(create_test_packet(2, 320));
        assert_eq!(jitter.stats().packets_too_late, 1);
        assert_eq!(jitter.stats().packets_lost, 1);
    }

    #[test]
    fn test_hole_waits_for_jitter_depth() {
        let jitter = buffer_with(JitterBufferConfig::default());

        for seq in 1..=4 {
            jitter.write(create_test_packet(seq, seq as u32 * 160));
        }
        for seq in 1..=4 {
            assert_eq!(jitter.read(0).unwrap().sequence_number(), seq);
        }

        // 5 is missing; only 6 and 7 have arrived
        jitter.write(create_test_packet(6, 960));
        jitter.write(create_test_packet(7, 1120));
        assert!(jitter.read(0).is_none());
        assert_eq!(jitter.available(), 3);

        // late 5 still makes it
        jitter.write(create_test_packet(5, 800));
        assert_eq!(jitter.read(0).unwrap().sequence_number(), 5);
        assert_eq!(jitter.stats().packets_lost, 0);
    }

    #[test]
    fn test_pass_through_mode() {
        let config = JitterBufferConfig { buffering: false, ..Default::default() };
        let jitter = buffer_with(config);

        jitter.write(create_test_packet(1, 160));
        assert_eq!(jitter.read(0).unwrap().sequence_number(), 1);

        jitter.write(create_test_packet(3, 480));
        assert_eq!(jitter.read(20).unwrap().sequence_number(), 3);
        assert_eq!(jitter.stats().packets_lost, 1);
    }

    #[test]
    fn test_listener_notified_once_per_fill() {
        struct Counter(AtomicUsize);
        impl BufferListener for Counter {
            fn on_fill(&self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let jitter = buffer_with(JitterBufferConfig::default());
        jitter.set_listener(counter.clone());

        for seq in 1..=6 {
            jitter.write(create_test_packet(seq, seq as u32 * 160));
        }
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);

        while jitter.read(0).is_some() {}
        assert!(jitter.read(0).is_none());
        for seq in 7..=10 {
            jitter.write(create_test_packet(seq, seq as u32 * 160));
        }
        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
        assert_eq!(jitter.stats().underruns, 1);
    }

    #[test]
    fn test_outlier_then_resync() {
        let jitter = buffer_with(JitterBufferConfig::default());
        for seq in 100..=103 {
            jitter.write(create_test_packet(seq, seq as u32 * 160));
        }

        // a single wild packet is dropped
        jitter.write(create_test_packet(40000, 0));
        assert_eq!(jitter.stats().outliers, 1);
        assert_eq!(jitter.available(), 4);

        // two in a row mean the sender restarted its numbering
        jitter.write(create_test_packet(20000, 0));
        jitter.write(create_test_packet(20001, 160));
        let stats = jitter.stats();
        assert_eq!(stats.outliers, 2);
        assert_eq!(stats.resyncs, 1);
        assert_eq!(stats.buffered_packets, 1);
        assert_eq!(jitter.available(), 1);

        for seq in 20002..=20004 {
            jitter.write(create_test_packet(seq, (seq - 20000) as u32 * 160));
        }
        assert_eq!(jitter.read(0).unwrap().sequence_number(), 20001);
    }

    #[test]
    fn test_drift_recorded_at_playout_start() {
        let jitter = buffer_with(JitterBufferConfig::default());
        for seq in 0..4 {
            jitter.write(create_test_packet(seq, 8000 + seq as u32 * 160));
        }
        let packet = jitter.read(1000).unwrap();
        assert_eq!(packet.sequence_number(), 0);
        // first packet is the clock origin
        assert_eq!(jitter.drift_ms(), -1000);
    }

    #[test]
    fn test_drift_with_huge_consumer_clock() {
        let jitter = buffer_with(JitterBufferConfig::default());
        for seq in 0..6 {
            jitter.write(create_test_packet(seq, seq as u32 * 160));
        }
        assert_eq!(jitter.read(1u64 << 63).unwrap().sequence_number(), 0);
        assert_eq!(jitter.drift_ms(), -i64::MAX);
        assert_eq!(jitter.read(u64::MAX).unwrap().sequence_number(), 1);
    }

    #[test]
    fn test_forward_jump_evicts_whole_window() {
        let jitter = buffer_with(JitterBufferConfig::default());
        for seq in 1..=4 {
            jitter.write(create_test_packet(seq, seq as u32 * 160));
        }

        jitter.write(create_test_packet(500, 500 * 160));
        jitter.write(create_test_packet(499, 499 * 160));
        let stats = jitter.stats();
        assert_eq!(stats.packets_overflow, 4);
        assert_eq!(stats.buffered_packets, 2);
        assert_eq!(jitter.available(), 100);

        let played: Vec<_> = std::iter::from_fn(|| jitter.read(0))
            .map(|p| p.sequence_number())
            .collect();
        assert_eq!(played, vec![499, 500]);

        // stale packets 1 and 2 still sit in the slots of 501 and 502
        for seq in [503, 504, 505, 506] {
            jitter.write(create_test_packet(seq, seq as u32 * 160));
        }
        assert_eq!(jitter.read(0).unwrap().sequence_number(), 503);
        let stats = jitter.stats();
        assert_eq!(stats.packets_lost, 98 + 2);
        assert_eq!(stats.packets_overflow, 4);
        assert_eq!(stats.buffered_packets, 3);
    }

    #[test]
    fn test_arrival_jitter_estimate() {
        let jitter = buffer_with(JitterBufferConfig::default());
        jitter.write_at(create_test_packet(1, 160), 0);
        jitter.write_at(create_test_packet(2, 320), 20);
        jitter.write_at(create_test_packet(3, 480), 50);
        assert_eq!(jitter.estimated_jitter(), 5);
        jitter.write_at(create_test_packet(4, 640), 70);
        assert_eq!(jitter.estimated_jitter(), 4);
        jitter.write_at(create_test_packet(5, 800), 100);
        assert_eq!(jitter.estimated_jitter(), 9);

        jitter.restart();
        assert_eq!(jitter.estimated_jitter(), 0);
        assert_eq!(jitter.stats(), JitterBufferStats::default());
    }

    #[test]
    fn test_reset_clears_stream_keeps_stats() {
        let jitter = buffer_with(JitterBufferConfig::default());
        for seq in 1..=5 {
            jitter.write(create_test_packet(seq, seq as u32 * 160));
        }
        jitter.reset();
        assert_eq!(jitter.available(), 0);
        assert!(jitter.read(0).is_none());
        assert_eq!(jitter.stats().packets_received, 5);
        assert_eq!(jitter.stats().buffered_packets, 0);

        // a new stream with unrelated numbering starts cleanly
        for seq in 900..=903 {
            jitter.write(create_test_packet(seq, 0));
        }
        assert_eq!(jitter.read(0).unwrap().sequence_number(), 900);
    }

    #[test]
    fn test_set_clock_rate_updates_depth() {
        let jitter = buffer_with(JitterBufferConfig::default());
        assert!(jitter.set_clock_rate(0).is_err());
        jitter.set_clock_rate(16000).unwrap();

        for seq in 1..=4 {
            jitter.write(create_test_packet(seq, seq as u32 * 320));
        }
        jitter.read(0).unwrap();
        let second = jitter.read(20).unwrap();
        assert_eq!(second.duration_ms(), 20);
    }
}
