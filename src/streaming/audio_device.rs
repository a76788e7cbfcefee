//! Audio device integration using rodio
//!
//! Maps the buffer-queue device contract onto a rodio [`Sink`]: buffers are
//! appended as finite PCM sources, completions fire from the mixer thread
//! when a source's samples are exhausted, and the stopped callback fires once
//! the sink has drained after a stop request.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use rodio::{OutputStreamHandle, Sink, Source};

use crate::buffer::QueueBuffer;
use crate::device::{OutputQueue, QueueCallbacks};
use crate::format::PcmFormat;
use crate::{PlaybackError, Result};

/// One enqueued pool buffer, played as a finite rodio source.
///
/// The buffer is handed back to the scheduler through the completion
/// callback when the last sample has been consumed, never more than once.
struct BufferSource {
    buffer: Option<QueueBuffer>,
    /// Byte offset of the next sample within the occupied portion
    pos: usize,
    format: PcmFormat,
    callbacks: Option<Weak<dyn QueueCallbacks>>,
}

impl BufferSource {
    fn new(
        buffer: QueueBuffer,
        format: PcmFormat,
        callbacks: Option<Weak<dyn QueueCallbacks>>,
    ) -> Self {
        BufferSource {
            buffer: Some(buffer),
            pos: 0,
            format,
            callbacks,
        }
    }
}

impl Iterator for BufferSource {
    type Item = i16;

    fn next(&mut self) -> Option<i16> {
        if let Some(buffer) = self.buffer.as_ref() {
            let bytes = buffer.bytes();
            if self.pos + 2 <= bytes.len() {
                let sample = i16::from_ne_bytes([bytes[self.pos], bytes[self.pos + 1]]);
                self.pos += 2;
                return Some(sample);
            }
            // Played through; ownership of the buffer returns to the core
            if let Some(done) = self.buffer.take() {
                match self.callbacks.as_ref().and_then(Weak::upgrade) {
                    Some(callbacks) => callbacks.on_buffer_complete(done),
                    None => log::warn!(
                        "buffer {} completed with no callback receiver",
                        done.index()
                    ),
                }
            }
        }
        None
    }
}

impl Source for BufferSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        self.format.channels
    }

    fn sample_rate(&self) -> u32 {
        self.format.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

/// Buffer-queue playback device backed by a rodio sink.
///
/// The caller keeps the [`rodio::OutputStream`] alive for the lifetime of
/// the device. The sink starts paused; nothing plays until
/// [`OutputQueue::start`]. Completion and stopped callbacks are delivered on
/// threads owned by rodio and by this device, never on the caller's thread.
pub struct RodioQueue {
    sink: Arc<Sink>,
    format: PcmFormat,
    callbacks: Mutex<Option<Weak<dyn QueueCallbacks>>>,
    stop_watcher: AtomicBool,
}

impl RodioQueue {
    /// Create a paused playback device on the given output stream.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::Device`] when the sink cannot be created
    /// (no audio backend available).
    pub fn new(stream_handle: &OutputStreamHandle) -> Result<Self> {
        let sink = Sink::try_new(stream_handle)
            .map_err(|e| PlaybackError::Device(format!("failed to create audio sink: {e}")))?;
        sink.pause();

        Ok(RodioQueue {
            sink: Arc::new(sink),
            format: PcmFormat::default(),
            callbacks: Mutex::new(None),
            stop_watcher: AtomicBool::new(false),
        })
    }

    fn upgraded_callbacks(&self) -> Option<Arc<dyn QueueCallbacks>> {
        self.callbacks.lock().as_ref().and_then(Weak::upgrade)
    }
}

impl OutputQueue for RodioQueue {
    fn enqueue(&self, buffer: QueueBuffer) -> Result<()> {
        let callbacks = self.callbacks.lock().clone();
        if callbacks.is_none() {
            log::warn!(
                "buffer {} enqueued before callback registration and will not be returned",
                buffer.index()
            );
        }
        self.sink
            .append(BufferSource::new(buffer, self.format, callbacks));
        Ok(())
    }

    fn start(&self) -> Result<()> {
        self.sink.play();
        Ok(())
    }

    fn request_stop(&self, immediate: bool) -> Result<()> {
        if immediate {
            self.sink.stop();
            if let Some(callbacks) = self.upgraded_callbacks() {
                callbacks.on_device_stopped();
            }
            return Ok(());
        }

        // One watcher per device; it reports the halt once queued buffers
        // have drained
        if self.stop_watcher.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let sink = Arc::clone(&self.sink);
        let callbacks = self.callbacks.lock().clone();
        std::thread::spawn(move || {
            sink.sleep_until_end();
            if let Some(callbacks) = callbacks.as_ref().and_then(Weak::upgrade) {
                callbacks.on_device_stopped();
            }
        });
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        self.sink.pause();
        Ok(())
    }

    fn resume(&self) -> Result<()> {
        self.sink.play();
        Ok(())
    }

    fn set_volume(&self, volume: f32) -> Result<()> {
        self.sink.set_volume(volume);
        Ok(())
    }

    fn register_callbacks(&self, callbacks: &Arc<dyn QueueCallbacks>) {
        *self.callbacks.lock() = Some(Arc::downgrade(callbacks));
    }
}
