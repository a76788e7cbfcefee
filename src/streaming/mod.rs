//! Real-time audio output for the playback queue.
//!
//! Provides a rodio-backed [`OutputQueue`](crate::OutputQueue)
//! implementation. Each enqueued pool buffer plays as its own source; when
//! its samples are exhausted the buffer moves back to the scheduler through
//! the completion callback, which keeps the refill cycle going without the
//! core owning any threads.

pub mod audio_device;

pub use audio_device::RodioQueue;
