//! Decoder contract.
//!
//! The playback core is decoder-agnostic: anything that can produce one
//! fixed-size chunk of PCM per call, together with position/time/loop
//! metadata, can drive a session. Exhaustion is a normal outcome, not an
//! error; decoder failures map to [`crate::PlaybackError::Decode`].

use crate::Result;

/// One decoded chunk of PCM audio plus its playback metadata.
///
/// `position` counts decoder-side position units (for tracker modules, the
/// pattern-order position); `elapsed_ms` is the elapsed playback time in
/// milliseconds; `loop_count` is how many times the decoder has wrapped back
/// to the start of the material. The PCM bytes borrow from the decoder and
/// must be copied out before the next pull.
#[derive(Debug)]
pub struct DecodedFrame<'a> {
    /// Playback position in decoder units
    pub position: u32,
    /// Elapsed playback time in milliseconds
    pub elapsed_ms: u64,
    /// Number of times the decoder has looped back to the start
    pub loop_count: u32,
    /// Decoded PCM bytes, exactly the reported chunk size
    pub pcm: &'a [u8],
}

/// Outcome of a single decoder pull.
#[derive(Debug)]
pub enum Pull<'a> {
    /// One chunk was decoded
    Frame(DecodedFrame<'a>),
    /// No more material (normal end of stream)
    Exhausted,
}

/// Pull-based frame decoder.
///
/// One call to [`pull`](FrameDecoder::pull) decodes one fixed-size chunk.
/// The chunk size never exceeds the buffer capacity negotiated at session
/// construction.
pub trait FrameDecoder: Send {
    /// Decode the next chunk of PCM audio.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PlaybackError::Decode`] on a non-exhaustion decoder
    /// failure. Exhaustion is reported as [`Pull::Exhausted`], not an error.
    fn pull(&mut self) -> Result<Pull<'_>>;
}
