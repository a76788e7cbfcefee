//! Output device contract.
//!
//! The playback device consumes pre-allocated buffers and plays them
//! asynchronously. It must invoke [`QueueCallbacks::on_buffer_complete`]
//! exactly once per enqueued buffer, after that buffer finished playing, and
//! [`QueueCallbacks::on_device_stopped`] when it transitions to stopped.
//! Callbacks may be delivered on any thread the device owns; the core is
//! safe to invoke from those threads and never assumes serialized delivery.

use std::sync::Arc;

use crate::buffer::QueueBuffer;
use crate::Result;

/// Asynchronous playback device that consumes pool buffers.
pub trait OutputQueue: Send + Sync {
    /// Allocate one pool buffer. Called once per slot at session setup.
    ///
    /// The default implementation allocates a plain in-memory buffer, which
    /// suits devices without their own buffer allocator.
    fn allocate_buffer(&self, index: usize, capacity: usize) -> Result<QueueBuffer> {
        QueueBuffer::new(index, capacity)
    }

    /// Hand a filled buffer to the device for playback.
    ///
    /// The device owns the buffer until it returns it through
    /// [`QueueCallbacks::on_buffer_complete`], exactly once per enqueue.
    fn enqueue(&self, buffer: QueueBuffer) -> Result<()>;

    /// Start (or restart) playback of enqueued buffers.
    fn start(&self) -> Result<()>;

    /// Ask the device to stop.
    ///
    /// With `immediate == false` the device lets already-queued buffers
    /// drain before halting; with `immediate == true` it discards them. The
    /// core's drain path always passes `false`.
    fn request_stop(&self, immediate: bool) -> Result<()>;

    /// Pause playback, keeping queued buffers
    fn pause(&self) -> Result<()>;

    /// Resume paused playback
    fn resume(&self) -> Result<()>;

    /// Set the playback volume (1.0 is unity gain)
    fn set_volume(&self, volume: f32) -> Result<()>;

    /// Register the completion/state-change callback receiver.
    ///
    /// Called once at session setup. Devices that are driven manually (such
    /// as test queues) may ignore the registration, which is why the default
    /// implementation is a no-op.
    fn register_callbacks(&self, callbacks: &Arc<dyn QueueCallbacks>) {
        let _ = callbacks;
    }
}

/// Callbacks the device fires back into the playback core.
///
/// Implemented by [`crate::QueuePlayer`]. Both callbacks are safe to invoke
/// from any device thread; the device guarantees that the stopped callback
/// arrives only after it has ceased delivering buffer completions.
pub trait QueueCallbacks: Send + Sync {
    /// A previously enqueued buffer has finished playing.
    ///
    /// Ownership of the buffer returns to the core with this call.
    fn on_buffer_complete(&self, buffer: QueueBuffer);

    /// The device's running state has become false.
    fn on_device_stopped(&self);
}
