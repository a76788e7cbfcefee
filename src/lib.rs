//! Buffer-queue playback core for tracker module audio.
//!
//! Streams decoded audio frames into a small fixed pool of playback buffers
//! consumed by an asynchronous audio output device. Buffers are primed before
//! playback starts, handed to the device, refilled from the device's
//! completion callback, and retired on end-of-stream or stop. Position and
//! time updates are deduplicated before reaching the UI-facing notification
//! sink, and a single finished event fires once the device confirms its halt.
//!
//! The crate owns the queue lifecycle only. The decoder, the output device,
//! and the notification sink are collaborators supplied through traits:
//! - [`FrameDecoder`] - pull-based source of fixed-size PCM chunks plus
//!   position/time/loop metadata
//! - [`OutputQueue`] - asynchronous playback device that invokes
//!   [`QueueCallbacks`] per finished buffer and on halt
//! - [`NotificationSink`] - receiver of position/time/finished events
//!
//! # Crate feature flags
//! - `streaming` (opt-in): rodio-backed [`RodioQueue`] output device
//!   (enables optional `rodio` dep)
//!
//! # Quick start
//! ```ignore
//! use modqueue::{QueuePlayer, RodioQueue};
//! use std::sync::Arc;
//!
//! let (stream, handle) = rodio::OutputStream::try_default().unwrap();
//! let queue = Arc::new(RodioQueue::new(&handle).unwrap());
//! let player = QueuePlayer::new(decoder, queue, sink, 50_000).unwrap();
//! player.play().unwrap();
//! // the device refills buffers from its callback thread until the
//! // decoder is exhausted; the sink then receives a single on_finished()
//! ```

#![warn(missing_docs)]

pub mod buffer;
pub mod decoder;
pub mod device;
pub mod format;
pub mod notify;
pub mod scheduler;
pub mod source;
pub mod state;
#[cfg(feature = "streaming")]
pub mod streaming; // Audio Output & Streaming

/// Error types for playback queue operations
#[derive(thiserror::Error, Debug)]
pub enum PlaybackError {
    /// Buffer pool or state allocation failed
    #[error("Allocation error: {0}")]
    Allocation(String),

    /// The decoder reported a non-exhaustion failure
    #[error("Decode error: {0}")]
    Decode(String),

    /// The decoder has no more material (normal exhaustion or detected loop)
    #[error("End of stream")]
    EndOfStream,

    /// An enqueue/stop call to the output device failed
    #[error("Audio device error: {0}")]
    Device(String),

    /// Invalid configuration or API misuse
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for playback queue operations
pub type Result<T> = std::result::Result<T, PlaybackError>;

// Public API exports
pub use buffer::{QueueBuffer, BUFFER_COUNT};
pub use decoder::{DecodedFrame, FrameDecoder, Pull};
pub use device::{OutputQueue, QueueCallbacks};
pub use format::PcmFormat;
pub use notify::{NotificationGate, NotificationSink};
pub use scheduler::QueuePlayer;
pub use source::{FillOutcome, FrameSource};
pub use state::PlayerState;
#[cfg(feature = "streaming")]
pub use streaming::RodioQueue;
