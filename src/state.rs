//! Shared playback session state.
//!
//! One `PlayerState` exists per playback session. It holds the decoder, the
//! fixed PCM format, the negotiated buffer capacity, the running flag, and
//! the last position/time values reported to the notification sink. The
//! state is shared between the session owner and whatever threads the output
//! device uses for its callbacks, so the running flag is atomic and the
//! progress record sits behind a mutex.

use std::sync::atomic::{AtomicU8, Ordering};

use parking_lot::{Mutex, MutexGuard};

use crate::decoder::FrameDecoder;
use crate::format::PcmFormat;

// Lifecycle encoding for the atomic running flag. A session moves forward
// only: primed -> running -> halted.
const PRIMED: u8 = 0;
const RUNNING: u8 = 1;
const HALTED: u8 = 2;

/// Last values handed to the notification sink.
///
/// Both start unset so that the very first reported position (commonly 0)
/// and second (commonly 0) each produce one notification.
#[derive(Debug, Default)]
struct Progress {
    position: Option<u32>,
    seconds: Option<u64>,
}

/// Shared record for one playback session.
pub struct PlayerState {
    decoder: Mutex<Box<dyn FrameDecoder>>,
    format: PcmFormat,
    buffer_capacity: usize,
    lifecycle: AtomicU8,
    progress: Mutex<Progress>,
}

impl PlayerState {
    /// Create session state around a decoder and the fixed buffer capacity.
    ///
    /// The state starts not running, with the fixed PCM format filled in and
    /// no progress reported yet.
    pub fn new(decoder: Box<dyn FrameDecoder>, buffer_capacity: usize) -> Self {
        PlayerState {
            decoder: Mutex::new(decoder),
            format: PcmFormat::default(),
            buffer_capacity,
            lifecycle: AtomicU8::new(PRIMED),
            progress: Mutex::new(Progress::default()),
        }
    }

    /// The fixed PCM format of this session
    pub fn format(&self) -> PcmFormat {
        self.format
    }

    /// Byte capacity of every pool buffer
    pub fn buffer_capacity(&self) -> usize {
        self.buffer_capacity
    }

    /// Whether the session is between start and stop-or-exhaustion
    pub fn is_running(&self) -> bool {
        self.lifecycle.load(Ordering::Acquire) == RUNNING
    }

    /// Mark the session running. The transition happens at most once per
    /// session; returns false if the session already ran or was halted.
    pub fn begin_running(&self) -> bool {
        self.lifecycle
            .compare_exchange(PRIMED, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Mark the session no longer running. Returns true only for the caller
    /// that performed the running-to-halted transition.
    pub fn halt(&self) -> bool {
        self.lifecycle
            .compare_exchange(RUNNING, HALTED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Lock the decoder for one pull
    pub(crate) fn lock_decoder(&self) -> MutexGuard<'_, Box<dyn FrameDecoder>> {
        self.decoder.lock()
    }

    /// Record a newly observed position. Returns true when it differs from
    /// the last reported one; the stored value is updated before the caller
    /// emits the notification.
    pub(crate) fn update_position(&self, position: u32) -> bool {
        let mut progress = self.progress.lock();
        if progress.position != Some(position) {
            progress.position = Some(position);
            true
        } else {
            false
        }
    }

    /// Record a newly observed whole-seconds value. Same contract as
    /// [`update_position`](Self::update_position).
    pub(crate) fn update_seconds(&self, seconds: u64) -> bool {
        let mut progress = self.progress.lock();
        if progress.seconds != Some(seconds) {
            progress.seconds = Some(seconds);
            true
        } else {
            false
        }
    }

    /// Last position reported to the sink, if any
    pub fn last_position(&self) -> Option<u32> {
        self.progress.lock().position
    }

    /// Last whole-seconds value reported to the sink, if any
    pub fn last_seconds(&self) -> Option<u64> {
        self.progress.lock().seconds
    }
}

impl std::fmt::Debug for PlayerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerState")
            .field("format", &self.format)
            .field("buffer_capacity", &self.buffer_capacity)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::Pull;
    use crate::Result;

    struct NullDecoder;

    impl FrameDecoder for NullDecoder {
        fn pull(&mut self) -> Result<Pull<'_>> {
            Ok(Pull::Exhausted)
        }
    }

    fn state() -> PlayerState {
        PlayerState::new(Box::new(NullDecoder), 1024)
    }

    #[test]
    fn test_initial_state() {
        let state = state();
        assert!(!state.is_running());
        assert_eq!(state.buffer_capacity(), 1024);
        assert_eq!(state.format(), PcmFormat::default());
        assert_eq!(state.last_position(), None);
        assert_eq!(state.last_seconds(), None);
    }

    #[test]
    fn test_running_transitions_once_each_way() {
        let state = state();
        assert!(state.begin_running());
        assert!(!state.begin_running(), "second start must not transition");
        assert!(state.is_running());

        assert!(state.halt());
        assert!(!state.halt(), "second halt must not transition");
        assert!(!state.is_running());

        // A halted session never restarts
        assert!(!state.begin_running());
    }

    #[test]
    fn test_progress_change_detection() {
        let state = state();
        assert!(state.update_position(0), "first position 0 is a change");
        assert!(!state.update_position(0));
        assert!(state.update_position(1));
        assert_eq!(state.last_position(), Some(1));

        assert!(state.update_seconds(0), "first second 0 is a change");
        assert!(!state.update_seconds(0));
        assert!(state.update_seconds(2));
        assert_eq!(state.last_seconds(), Some(2));
    }
}
