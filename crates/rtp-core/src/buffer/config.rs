use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::sequence::{SequenceLimits, DEFAULT_MAX_DROPOUT, DEFAULT_MAX_MISORDER, MAX_UNAMBIGUOUS_WINDOW};
use crate::time::clock_rates;
use crate::Result;

/// Default number of packet slots
pub const DEFAULT_CAPACITY: usize = 100;

/// Default jitter depth in milliseconds
pub const DEFAULT_JITTER_DEPTH_MS: u32 = 40;

/// Default nominal packet duration (ptime) in milliseconds
pub const DEFAULT_PACKET_DURATION_MS: u32 = 20;

/// Default multiple of the packet duration that marks a silence gap
pub const DEFAULT_SILENCE_FACTOR: u32 = 3;

/// Jitter buffer configuration
///
/// Every field has a default, so a TOML document only needs the values it
/// changes:
///
/// ```toml
/// capacity = 200
/// jitter_depth_ms = 60
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JitterBufferConfig {
    /// Number of packet slots (1..=32768)
    pub capacity: usize,

    /// Media queued behind the read position before playout starts
    /// and before a missing packet is given up as lost
    pub jitter_depth_ms: u32,

    /// RTP clock rate in Hz
    pub clock_rate: u32,

    /// Nominal duration of one packet in milliseconds
    pub packet_duration_ms: u32,

    /// A per-packet timestamp step above this multiple of
    /// `packet_duration_ms` is treated as silence, not media
    pub silence_factor: u32,

    /// When false, packets are released as soon as they are present
    pub buffering: bool,

    /// Largest forward sequence jump accepted without probation
    pub max_dropout: u16,

    /// Largest backward sequence jump accepted without probation
    pub max_misorder: u16,
}

impl Default for JitterBufferConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            jitter_depth_ms: DEFAULT_JITTER_DEPTH_MS,
            clock_rate: clock_rates::AUDIO_8KHZ,
            packet_duration_ms: DEFAULT_PACKET_DURATION_MS,
            silence_factor: DEFAULT_SILENCE_FACTOR,
            buffering: true,
            max_dropout: DEFAULT_MAX_DROPOUT,
            max_misorder: DEFAULT_MAX_MISORDER,
        }
    }
}

impl JitterBufferConfig {
    /// Default configuration with the given capacity and jitter depth
    pub fn new(capacity: usize, jitter_depth_ms: u32) -> Self {
        Self {
            capacity,
            jitter_depth_ms,
            ..Default::default()
        }
    }

    /// Reject values the buffer cannot operate with
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::InvalidConfig("capacity must be at least 1".to_string()));
        }
        if self.capacity > MAX_UNAMBIGUOUS_WINDOW {
            return Err(Error::InvalidConfig(format!(
                "capacity {} exceeds {} slots; extended sequence numbers would alias",
                self.capacity, MAX_UNAMBIGUOUS_WINDOW
            )));
        }
        if self.clock_rate == 0 {
            return Err(Error::InvalidConfig("clock rate must be greater than zero".to_string()));
        }
        if self.packet_duration_ms == 0 {
            return Err(Error::InvalidConfig("packet duration must be greater than zero".to_string()));
        }
        if self.silence_factor == 0 {
            return Err(Error::InvalidConfig("silence factor must be greater than zero".to_string()));
        }
        if self.max_dropout == 0 {
            return Err(Error::InvalidConfig("max dropout must be greater than zero".to_string()));
        }
        Ok(())
    }

    /// Sequence thresholds; misordering is tolerated across the whole buffer
    pub fn sequence_limits(&self) -> SequenceLimits {
        let window = self.capacity.min(u16::MAX as usize) as u16;
        SequenceLimits {
            max_dropout: self.max_dropout,
            max_misorder: self.max_misorder.max(window),
        }
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&source)
    }
}
