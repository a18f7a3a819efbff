use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

use crate::error::Error;
use crate::{Result, RtpSequenceNumber, RtpSsrc, RtpTimestamp};

use super::header::RtpHeader;

/// RTP packet as it appears on the wire: header plus payload
#[derive(Clone, PartialEq, Eq)]
pub struct RtpPacket {
    /// RTP header
    pub header: RtpHeader,

    /// Payload data, with any padding stripped
    pub payload: Bytes,
}

impl RtpPacket {
    /// Create a new RTP packet
    pub fn new(header: RtpHeader, payload: Bytes) -> Self {
        Self { header, payload }
    }

    /// Create a new RTP packet with basic parameters
    pub fn new_with_payload(
        payload_type: u8,
        sequence_number: RtpSequenceNumber,
        timestamp: RtpTimestamp,
        ssrc: RtpSsrc,
        payload: Bytes,
    ) -> Self {
        let header = RtpHeader::new(payload_type, sequence_number, timestamp, ssrc);
        Self { header, payload }
    }

    /// Number of padding bytes appended on serialization (0 when the flag is clear)
    fn padding_len(&self) -> usize {
        if self.header.padding {
            // The count byte is itself part of the padding
            4 - (self.header.size() + self.payload.len()) % 4
        } else {
            0
        }
    }

    /// Total serialized size of the packet in bytes
    pub fn size(&self) -> usize {
        self.header.size() + self.payload.len() + self.padding_len()
    }

    /// Parse an RTP packet from datagram bytes
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut buf = Bytes::copy_from_slice(data);

        let header = RtpHeader::parse(&mut buf)?;

        let padding_bytes = if header.padding {
            let count = buf.last().copied().unwrap_or(0) as usize;
            if count == 0 || count > buf.len() {
                return Err(Error::InvalidPacket(format!(
                    "Invalid padding value: {} with {} bytes remaining",
                    count, buf.len()
                )));
            }
            count
        } else {
            0
        };

        let payload = buf.slice(0..buf.len() - padding_bytes);

        Ok(Self { header, payload })
    }

    /// Serialize the packet to bytes
    pub fn serialize(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(self.size());

        self.header.serialize(&mut buf)?;
        buf.put_slice(&self.payload);

        let padding = self.padding_len();
        if padding > 0 {
            buf.put_bytes(0, padding - 1);
            buf.put_u8(padding as u8);
        }

        Ok(buf.freeze())
    }
}

impl fmt::Debug for RtpPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RtpPacket")
            .field("header", &self.header)
            .field("payload_len", &self.payload.len())
            .finish()
    }
}
