use bytes::Bytes;

use crate::{RtpSequenceNumber, RtpSsrc, RtpTimestamp};

use super::rtp::RtpPacket;

/// A decoded media packet as exchanged with the jitter buffer.
///
/// Everything except the playout duration is fixed at construction. The
/// payload is an immutable [`Bytes`] handle, so the producer and the buffer
/// never share writable memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpPacketRecord {
    sequence_number: RtpSequenceNumber,
    timestamp: RtpTimestamp,
    payload: Bytes,
    duration_ms: u64,
    marker: bool,
    end_of_stream: bool,
    payload_type: u8,
    ssrc: RtpSsrc,
}

impl RtpPacketRecord {
    /// Create a record with no duration, marker or end-of-stream flag
    pub fn new(sequence_number: RtpSequenceNumber, timestamp: RtpTimestamp, payload: Bytes) -> Self {
        Self {
            sequence_number,
            timestamp,
            payload,
            duration_ms: 0,
            marker: false,
            end_of_stream: false,
            payload_type: 0,
            ssrc: 0,
        }
    }

    /// Create a record holding its own copy of `payload`
    pub fn from_slice(sequence_number: RtpSequenceNumber, timestamp: RtpTimestamp, payload: &[u8]) -> Self {
        Self::new(sequence_number, timestamp, Bytes::copy_from_slice(payload))
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_marker(mut self, marker: bool) -> Self {
        self.marker = marker;
        self
    }

    pub fn with_end_of_stream(mut self, end_of_stream: bool) -> Self {
        self.end_of_stream = end_of_stream;
        self
    }

    pub fn with_payload_type(mut self, payload_type: u8) -> Self {
        self.payload_type = payload_type;
        self
    }

    pub fn with_ssrc(mut self, ssrc: RtpSsrc) -> Self {
        self.ssrc = ssrc;
        self
    }

    pub fn sequence_number(&self) -> RtpSequenceNumber {
        self.sequence_number
    }

    pub fn timestamp(&self) -> RtpTimestamp {
        self.timestamp
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Playout duration in milliseconds
    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// Start-of-talkburst indicator
    pub fn marker(&self) -> bool {
        self.marker
    }

    pub fn end_of_stream(&self) -> bool {
        self.end_of_stream
    }

    pub fn payload_type(&self) -> u8 {
        self.payload_type
    }

    pub fn ssrc(&self) -> RtpSsrc {
        self.ssrc
    }

    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    /// Only the jitter buffer rewrites the duration
    pub(crate) fn set_duration(&mut self, duration_ms: u64) {
        self.duration_ms = duration_ms;
    }

    /// Build a wire packet carrying this record
    pub fn to_packet(&self) -> RtpPacket {
        let mut packet = RtpPacket::new_with_payload(
            self.payload_type,
            self.sequence_number,
            self.timestamp,
            self.ssrc,
            self.payload.clone(),
        );
        packet.header.marker = self.marker;
        packet
    }
}

impl From<RtpPacket> for RtpPacketRecord {
    fn from(packet: RtpPacket) -> Self {
        Self::new(packet.header.sequence_number, packet.header.timestamp, packet.payload)
            .with_marker(packet.header.marker)
            .with_payload_type(packet.header.payload_type)
            .with_ssrc(packet.header.ssrc)
    }
}
