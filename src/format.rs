//! Fixed PCM stream format for queue playback.
//!
//! The decoder always produces 44.1 kHz stereo 16-bit signed native-endian
//! packed samples, so the format is a single immutable descriptor constructed
//! once and attached to the player state rather than a set of process-wide
//! constants.

/// Output sample rate in Hz
pub const SAMPLE_RATE: u32 = 44_100;

/// Number of interleaved channels (stereo)
pub const CHANNELS: u16 = 2;

/// Bits per sample (signed integer, native endian)
pub const BITS_PER_SAMPLE: u16 = 16;

/// Immutable PCM format descriptor for a playback session.
///
/// Packed samples, no padding, 1 frame per packet. Invariant for the
/// lifetime of the session that carries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of interleaved channels
    pub channels: u16,
    /// Bits per sample (signed integer, native endian)
    pub bits_per_sample: u16,
    /// Audio frames per packet (always 1, packed PCM)
    pub frames_per_packet: u32,
}

impl PcmFormat {
    /// Bytes occupied by a single sample of one channel
    pub fn bytes_per_sample(&self) -> usize {
        usize::from(self.bits_per_sample / 8)
    }

    /// Bytes occupied by one audio frame (one sample per channel)
    pub fn bytes_per_frame(&self) -> usize {
        self.bytes_per_sample() * usize::from(self.channels)
    }

    /// Bytes occupied by one packet
    pub fn bytes_per_packet(&self) -> usize {
        self.bytes_per_frame() * self.frames_per_packet as usize
    }
}

impl Default for PcmFormat {
    /// The fixed session format: 44.1 kHz stereo, 16-bit signed packed PCM.
    fn default() -> Self {
        PcmFormat {
            sample_rate: SAMPLE_RATE,
            channels: CHANNELS,
            bits_per_sample: BITS_PER_SAMPLE,
            frames_per_packet: 1,
        }
    }
}
