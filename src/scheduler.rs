//! Buffer scheduler: priming and the refill-on-completion cycle.
//!
//! A [`QueuePlayer`] owns one playback session. `play()` fills every pool
//! buffer through the frame source and enqueues it before the device starts
//! (priming), so the device never starves waiting for the first decode.
//! From then on each completion callback refills the returned buffer and
//! re-enqueues it, one buffer in flight per callback, until the source is
//! exhausted or fails; at that point the session halts and the device is
//! asked for a non-immediate stop so queued audio drains.
//!
//! Session lifecycle: primed -> running (`play`) -> draining (exhaustion,
//! decode failure, or `stop`) -> stopped (device-confirmed halt, routed to
//! the notification gate). No transition leaves stopped.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::buffer::{QueueBuffer, BUFFER_COUNT};
use crate::decoder::FrameDecoder;
use crate::device::{OutputQueue, QueueCallbacks};
use crate::notify::{NotificationGate, NotificationSink};
use crate::source::{FillOutcome, FrameSource};
use crate::state::PlayerState;
use crate::{PlaybackError, Result};

/// One playback session over a decoder, an output device, and a sink.
pub struct QueuePlayer {
    state: Arc<PlayerState>,
    source: FrameSource,
    queue: Arc<dyn OutputQueue>,
    gate: Arc<NotificationGate>,
    /// Buffers the core still holds; a slot goes empty when its buffer is
    /// enqueued and stays empty for the rest of the session (completed
    /// buffers circulate between device and callback, never back here).
    pool: Mutex<Vec<Option<QueueBuffer>>>,
}

impl QueuePlayer {
    /// Create a playback session.
    ///
    /// Allocates the fixed pool of [`BUFFER_COUNT`] buffers through the
    /// device and registers this player as the device's callback receiver.
    /// No audio is decoded or enqueued yet.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::Allocation`] or [`PlaybackError::Device`]
    /// when a pool buffer cannot be obtained. This is the only failure mode
    /// of construction.
    pub fn new(
        decoder: Box<dyn FrameDecoder>,
        queue: Arc<dyn OutputQueue>,
        sink: Arc<dyn NotificationSink>,
        buffer_capacity: usize,
    ) -> Result<Arc<Self>> {
        let state = Arc::new(PlayerState::new(decoder, buffer_capacity));
        let gate = Arc::new(NotificationGate::new(sink));
        let source = FrameSource::new(state.clone(), gate.clone());

        let mut pool = Vec::with_capacity(BUFFER_COUNT);
        for index in 0..BUFFER_COUNT {
            pool.push(Some(queue.allocate_buffer(index, buffer_capacity)?));
        }

        let player = Arc::new(QueuePlayer {
            state,
            source,
            queue: queue.clone(),
            gate,
            pool: Mutex::new(pool),
        });

        let callbacks: Arc<dyn QueueCallbacks> = player.clone();
        queue.register_callbacks(&callbacks);

        Ok(player)
    }

    /// Whether the session is between start and stop-or-exhaustion
    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Shared session state (format, capacity, last reported progress)
    pub fn state(&self) -> &Arc<PlayerState> {
        &self.state
    }

    /// Fill one pool buffer and enqueue it, before the device is running.
    ///
    /// On [`FillOutcome::Filled`] the buffer is handed to the device; on any
    /// other outcome it is returned to its slot un-enqueued. A device error
    /// on the enqueue degrades that slot only: the error is logged, the slot
    /// never enters playback, and priming of other buffers is unaffected.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::Config`] if the index is out of range or the
    /// buffer was already enqueued.
    pub fn prime_buffer(&self, index: usize) -> Result<FillOutcome> {
        let mut buffer = {
            let mut pool = self.pool.lock();
            let slot = pool.get_mut(index).ok_or_else(|| {
                PlaybackError::Config(format!("buffer index {index} out of range"))
            })?;
            slot.take().ok_or_else(|| {
                PlaybackError::Config(format!("buffer {index} already enqueued"))
            })?
        };

        let outcome = self.source.fill_buffer(&mut buffer);
        if outcome == FillOutcome::Filled {
            if let Err(err) = self.queue.enqueue(buffer) {
                log::error!("failed to enqueue buffer {index} while priming: {err}");
                return Ok(outcome);
            }
        } else {
            self.pool.lock()[index] = Some(buffer);
        }
        Ok(outcome)
    }

    /// Prime every pool buffer, start the device, and mark the session
    /// running.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::EndOfStream`] or [`PlaybackError::Decode`]
    /// when the source ends or fails while priming; the session is aborted
    /// and the device never starts. Returns [`PlaybackError::Device`] when
    /// the device cannot be started.
    pub fn play(&self) -> Result<()> {
        for index in 0..BUFFER_COUNT {
            match self.prime_buffer(index)? {
                FillOutcome::Filled => {}
                FillOutcome::EndOfStream => {
                    log::warn!("source ended while priming buffer {index}");
                    return Err(PlaybackError::EndOfStream);
                }
                FillOutcome::DecodeFailed => {
                    return Err(PlaybackError::Decode(format!(
                        "decode failed while priming buffer {index}"
                    )));
                }
            }
        }

        self.queue.start()?;
        self.state.begin_running();
        Ok(())
    }

    /// Cooperative stop: halt the session and request a non-immediate stop
    /// so already-queued buffers drain. Safe to call more than once; a stop
    /// request failure is logged, the device halts on its own once empty.
    pub fn stop(&self) {
        self.begin_drain();
    }

    /// Pause the device, keeping queued buffers.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::Device`] if the device rejects the call.
    pub fn pause(&self) -> Result<()> {
        self.queue.pause()
    }

    /// Resume a paused device.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::Device`] if the device rejects the call.
    pub fn resume(&self) -> Result<()> {
        self.queue.resume()
    }

    /// Set the playback volume (1.0 is unity gain).
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::Device`] if the device rejects the call.
    pub fn set_volume(&self, volume: f32) -> Result<()> {
        self.queue.set_volume(volume)
    }

    fn begin_drain(&self) {
        if !self.state.halt() {
            return;
        }
        if let Err(err) = self.queue.request_stop(false) {
            // Non-fatal: the device halts once its queue empties
            log::error!("stop request failed: {err}");
        }
    }
}

impl QueueCallbacks for QueuePlayer {
    /// Refill a completed buffer and hand it back to the device.
    ///
    /// Invoked by the device from whatever thread it uses for completions.
    /// Late callbacks arriving after the session halted are no-ops.
    fn on_buffer_complete(&self, mut buffer: QueueBuffer) {
        if !self.state.is_running() {
            return;
        }

        match self.source.fill_buffer(&mut buffer) {
            FillOutcome::Filled => {
                if let Err(err) = self.queue.enqueue(buffer) {
                    log::error!("failed to re-enqueue buffer: {err}");
                    self.begin_drain();
                }
            }
            outcome => {
                log::debug!("refill ended: {outcome:?}, draining");
                self.begin_drain();
            }
        }
    }

    /// The device confirmed its halt; emit the finished notification.
    fn on_device_stopped(&self) {
        self.state.halt();
        self.gate.report_device_stopped();
    }
}
