//! Synthetic RTP sender and network path
//!
//! Produces the datagrams a 20 ms audio sender would emit, then perturbs
//! their delivery the way a congested UDP path does: random loss, random
//! per-packet delay (which reorders packets whose delays cross), duplication
//! and talk-spurt pauses.

use bytes::Bytes;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use tmedia_rtp_core::packet::RtpPacket;
use tmedia_rtp_core::{RtpSequenceNumber, RtpSsrc};

/// PCMU
const PAYLOAD_TYPE: u8 = 0;

/// Impairments applied to the stream
#[derive(Debug, Clone, Serialize)]
pub struct NetworkProfile {
    /// Probability that a packet is never delivered
    pub loss: f64,

    /// Probability that a packet is delivered twice
    pub duplicate: f64,

    /// Fixed one-way delay in milliseconds
    pub base_delay_ms: u64,

    /// Upper bound of the random extra delay in milliseconds
    pub jitter_ms: u64,

    /// Every this many packets the sender pauses; 0 disables pauses
    pub silence_every: u32,

    /// Length of each pause in milliseconds
    pub silence_ms: u32,
}

impl Default for NetworkProfile {
    fn default() -> Self {
        Self {
            loss: 0.02,
            duplicate: 0.01,
            base_delay_ms: 30,
            jitter_ms: 60,
            silence_every: 0,
            silence_ms: 1000,
        }
    }
}

/// A datagram and the time, from the start of the run, it reaches the receiver
#[derive(Debug, Clone)]
pub struct Delivery {
    pub at_ms: u64,
    pub datagram: Bytes,
}

/// Sender side of one RTP stream
pub struct SyntheticStream {
    ssrc: RtpSsrc,
    clock_rate: u32,
    packet_duration_ms: u32,
    next_seq: RtpSequenceNumber,
    next_timestamp: u32,
    send_time_ms: u64,
    rng: SmallRng,
}

impl SyntheticStream {
    pub fn new(
        first_seq: RtpSequenceNumber,
        clock_rate: u32,
        packet_duration_ms: u32,
        seed: u64,
    ) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        Self {
            ssrc: rng.gen(),
            clock_rate,
            packet_duration_ms,
            next_seq: first_seq,
            next_timestamp: rng.gen(),
            send_time_ms: 0,
            rng,
        }
    }

    fn units_per_packet(&self) -> u32 {
        (self.clock_rate as u64 * self.packet_duration_ms as u64 / 1000) as u32
    }

    /// Emit `count` packets and return their deliveries in arrival order
    pub fn schedule(&mut self, count: u32, profile: &NetworkProfile) -> anyhow::Result<Vec<Delivery>> {
        let units = self.units_per_packet();
        let mut deliveries = Vec::with_capacity(count as usize);

        for index in 0..count {
            if profile.silence_every > 0 && index > 0 && index % profile.silence_every == 0 {
                self.send_time_ms += profile.silence_ms as u64;
                let pause_units = self.clock_rate as u64 * profile.silence_ms as u64 / 1000;
                self.next_timestamp = self.next_timestamp.wrapping_add(pause_units as u32);
            }

            let payload = Bytes::from(vec![0xffu8; units as usize]);
            let mut packet = RtpPacket::new_with_payload(
                PAYLOAD_TYPE,
                self.next_seq,
                self.next_timestamp,
                self.ssrc,
                payload,
            );
            packet.header.marker = index == 0;
            let datagram = packet.serialize()?;

            if !self.rng.gen_bool(profile.loss.clamp(0.0, 1.0)) {
                let at_ms = self.send_time_ms + profile.base_delay_ms + self.extra_delay(profile);
                deliveries.push(Delivery { at_ms, datagram: datagram.clone() });

                if self.rng.gen_bool(profile.duplicate.clamp(0.0, 1.0)) {
                    let at_ms = at_ms + self.extra_delay(profile);
                    deliveries.push(Delivery { at_ms, datagram });
                }
            }

            self.next_seq = self.next_seq.wrapping_add(1);
            self.next_timestamp = self.next_timestamp.wrapping_add(units);
            self.send_time_ms += self.packet_duration_ms as u64;
        }

        deliveries.sort_by_key(|delivery| delivery.at_ms);
        Ok(deliveries)
    }

    fn extra_delay(&mut self, profile: &NetworkProfile) -> u64 {
        if profile.jitter_ms == 0 {
            0
        } else {
            self.rng.gen_range(0..=profile.jitter_ms)
        }
    }
}
