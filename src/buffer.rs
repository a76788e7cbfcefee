//! Fixed-capacity playback buffers.
//!
//! A playback session owns exactly [`BUFFER_COUNT`] buffers for its whole
//! lifetime. Each buffer alternates ownership between the scheduler (while
//! being filled) and the output device (while enqueued/playing); ownership
//! moves back to the scheduler through the device's completion callback.
//! Move semantics make concurrent access to a buffer impossible by
//! construction.

use crate::{PlaybackError, Result};

/// Number of buffers in the playback pool
pub const BUFFER_COUNT: usize = 3;

/// Largest accepted buffer capacity in bytes (sanity cap against OOM)
const MAX_BUFFER_BYTES: usize = 16 * 1024 * 1024;

/// A fixed-capacity byte buffer from the playback pool.
///
/// Carries its pool index, its fixed capacity, and the occupied size of the
/// most recent fill. The capacity never changes after allocation.
#[derive(Debug)]
pub struct QueueBuffer {
    index: usize,
    data: Box<[u8]>,
    len: usize,
}

impl QueueBuffer {
    /// Allocate a pool buffer with the given index and byte capacity.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::Allocation`] if the capacity is 0 or exceeds
    /// the maximum safe size.
    pub fn new(index: usize, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(PlaybackError::Allocation(
                "buffer capacity must be greater than 0".into(),
            ));
        }
        if capacity > MAX_BUFFER_BYTES {
            return Err(PlaybackError::Allocation(format!(
                "buffer capacity {capacity} exceeds maximum safe size {MAX_BUFFER_BYTES}"
            )));
        }

        Ok(QueueBuffer {
            index,
            data: vec![0u8; capacity].into_boxed_slice(),
            len: 0,
        })
    }

    /// Pool slot index this buffer was allocated for
    pub fn index(&self) -> usize {
        self.index
    }

    /// Fixed byte capacity
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// The occupied portion written by the last fill
    pub fn bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Copy decoded PCM into the buffer byte-for-byte and set the occupied
    /// size to the exact reported length.
    ///
    /// The decoder contract guarantees `pcm.len() <= capacity`; an oversized
    /// chunk is clamped to capacity with a warning rather than overrunning.
    pub fn fill_from(&mut self, pcm: &[u8]) {
        let n = pcm.len().min(self.data.len());
        if n < pcm.len() {
            log::warn!(
                "decoded chunk of {} bytes exceeds buffer capacity {}, clamping",
                pcm.len(),
                self.data.len()
            );
        }
        self.data[..n].copy_from_slice(&pcm[..n]);
        self.len = n;
    }

    /// Discard the occupied contents (capacity is unchanged)
    pub fn clear(&mut self) {
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation() {
        let buffer = QueueBuffer::new(1, 64).unwrap();
        assert_eq!(buffer.index(), 1);
        assert_eq!(buffer.capacity(), 64);
        assert!(buffer.bytes().is_empty());
    }

    #[test]
    fn test_zero_capacity_error() {
        let result = QueueBuffer::new(0, 0);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("greater than 0"));
    }

    #[test]
    fn test_max_capacity_exceeded() {
        let result = QueueBuffer::new(0, 16 * 1024 * 1024 + 1);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("exceeds maximum"));
    }

    #[test]
    fn test_fill_sets_exact_occupied_size() {
        let mut buffer = QueueBuffer::new(0, 8).unwrap();
        buffer.fill_from(&[1, 2, 3]);
        assert_eq!(buffer.bytes(), &[1, 2, 3]);

        // A shorter refill shrinks the occupied size
        buffer.fill_from(&[9]);
        assert_eq!(buffer.bytes(), &[9]);
    }

    #[test]
    fn test_fill_clamps_oversized_chunk() {
        let mut buffer = QueueBuffer::new(0, 4).unwrap();
        buffer.fill_from(&[1, 2, 3, 4, 5, 6]);
        assert_eq!(buffer.bytes(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_clear() {
        let mut buffer = QueueBuffer::new(0, 4).unwrap();
        buffer.fill_from(&[1, 2]);
        buffer.clear();
        assert!(buffer.bytes().is_empty());
        assert_eq!(buffer.capacity(), 4);
    }
}
