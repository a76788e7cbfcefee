//! Frame source: one decoder pull per buffer fill.
//!
//! Adapts the pull-based decoder to the buffer-refill protocol. A nonzero
//! loop counter on a successful pull means the decoder wrapped back to the
//! start of the material; a single linear playthrough is the only supported
//! mode, so that counts as end of stream rather than a position update.

use std::sync::Arc;

use crate::buffer::QueueBuffer;
use crate::decoder::Pull;
use crate::notify::NotificationGate;
use crate::state::PlayerState;

/// Outcome of one buffer fill attempt.
///
/// `EndOfStream` and `DecodeFailed` are handled identically by the
/// scheduler (playback drains); they stay distinct for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    /// The buffer was filled and is ready to enqueue
    Filled,
    /// Normal exhaustion, or the decoder looped back to the start
    EndOfStream,
    /// The decoder reported a non-exhaustion failure (already logged)
    DecodeFailed,
}

impl FillOutcome {
    /// Whether this outcome ends the refill cycle
    pub fn is_terminal(self) -> bool {
        !matches!(self, FillOutcome::Filled)
    }
}

// Frame metadata extracted while the decoder lock is held, so the sink can
// be notified after the lock is released.
enum FillStep {
    Frame { position: u32, elapsed_ms: u64 },
    End,
    Failed,
}

/// Pulls decoded frames into pool buffers and reports their metadata.
pub struct FrameSource {
    state: Arc<PlayerState>,
    gate: Arc<NotificationGate>,
}

impl FrameSource {
    /// Bind a source to the session state and notification gate
    pub fn new(state: Arc<PlayerState>, gate: Arc<NotificationGate>) -> Self {
        FrameSource { state, gate }
    }

    /// Fill one buffer with the next decoded chunk.
    ///
    /// Calls the decoder exactly once. On success without a loop-back, the
    /// decoded bytes are copied into the buffer byte-for-byte, the occupied
    /// size is set, and the new position/time reach the notification gate.
    pub fn fill_buffer(&self, buffer: &mut QueueBuffer) -> FillOutcome {
        let step = {
            let mut decoder = self.state.lock_decoder();
            match decoder.pull() {
                Ok(Pull::Frame(frame)) => {
                    if frame.loop_count != 0 {
                        // Decoder wrapped around; single playthrough only
                        FillStep::End
                    } else {
                        buffer.fill_from(frame.pcm);
                        FillStep::Frame {
                            position: frame.position,
                            elapsed_ms: frame.elapsed_ms,
                        }
                    }
                }
                Ok(Pull::Exhausted) => FillStep::End,
                Err(err) => {
                    log::warn!("no frame: {err}");
                    FillStep::Failed
                }
            }
        };

        match step {
            FillStep::Frame {
                position,
                elapsed_ms,
            } => {
                self.gate.report_frame(&self.state, position, elapsed_ms);
                FillOutcome::Filled
            }
            FillStep::End => FillOutcome::EndOfStream,
            FillStep::Failed => FillOutcome::DecodeFailed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::{DecodedFrame, FrameDecoder};
    use crate::notify::NotificationSink;
    use crate::{PlaybackError, Result};
    use parking_lot::Mutex;

    #[derive(Clone)]
    enum Step {
        Frame {
            position: u32,
            elapsed_ms: u64,
            loop_count: u32,
        },
        Exhausted,
        Fail,
    }

    struct ScriptedDecoder {
        steps: Vec<Step>,
        cursor: usize,
        chunk: Vec<u8>,
    }

    impl ScriptedDecoder {
        fn new(steps: Vec<Step>) -> Self {
            ScriptedDecoder {
                steps,
                cursor: 0,
                chunk: vec![0x11, 0x22, 0x33, 0x44],
            }
        }
    }

    impl FrameDecoder for ScriptedDecoder {
        fn pull(&mut self) -> Result<Pull<'_>> {
            let step = self
                .steps
                .get(self.cursor)
                .cloned()
                .unwrap_or(Step::Exhausted);
            self.cursor += 1;
            match step {
                Step::Frame {
                    position,
                    elapsed_ms,
                    loop_count,
                } => Ok(Pull::Frame(DecodedFrame {
                    position,
                    elapsed_ms,
                    loop_count,
                    pcm: &self.chunk,
                })),
                Step::Exhausted => Ok(Pull::Exhausted),
                Step::Fail => Err(PlaybackError::Decode("scripted failure".into())),
            }
        }
    }

    #[derive(Default)]
    struct CountingSink {
        positions: Mutex<Vec<u32>>,
    }

    impl NotificationSink for CountingSink {
        fn on_position_changed(&self, position: u32) {
            self.positions.lock().push(position);
        }

        fn on_time_changed(&self, _seconds: u64) {}

        fn on_finished(&self) {}
    }

    fn setup(steps: Vec<Step>) -> (Arc<PlayerState>, Arc<CountingSink>, FrameSource) {
        let state = Arc::new(PlayerState::new(Box::new(ScriptedDecoder::new(steps)), 64));
        let sink = Arc::new(CountingSink::default());
        let gate = Arc::new(NotificationGate::new(sink.clone()));
        let source = FrameSource::new(state.clone(), gate);
        (state, sink, source)
    }

    #[test]
    fn test_fill_copies_chunk_and_reports() {
        let (state, sink, source) = setup(vec![Step::Frame {
            position: 2,
            elapsed_ms: 1500,
            loop_count: 0,
        }]);
        state.begin_running();

        let mut buffer = QueueBuffer::new(0, 64).unwrap();
        assert_eq!(source.fill_buffer(&mut buffer), FillOutcome::Filled);
        assert_eq!(buffer.bytes(), &[0x11, 0x22, 0x33, 0x44]);
        assert_eq!(sink.positions.lock().as_slice(), &[2]);
    }

    #[test]
    fn test_loop_count_is_end_of_stream() {
        let (state, sink, source) = setup(vec![Step::Frame {
            position: 0,
            elapsed_ms: 0,
            loop_count: 1,
        }]);
        state.begin_running();

        let mut buffer = QueueBuffer::new(0, 64).unwrap();
        assert_eq!(source.fill_buffer(&mut buffer), FillOutcome::EndOfStream);
        assert!(
            sink.positions.lock().is_empty(),
            "a looped frame must not report a position"
        );
        assert!(buffer.bytes().is_empty(), "a looped frame is not copied");
    }

    #[test]
    fn test_exhaustion_and_failure_outcomes() {
        let (state, _sink, source) = setup(vec![Step::Fail, Step::Exhausted]);
        state.begin_running();

        let mut buffer = QueueBuffer::new(0, 64).unwrap();
        assert_eq!(source.fill_buffer(&mut buffer), FillOutcome::DecodeFailed);
        assert_eq!(source.fill_buffer(&mut buffer), FillOutcome::EndOfStream);
        assert!(FillOutcome::DecodeFailed.is_terminal());
        assert!(FillOutcome::EndOfStream.is_terminal());
        assert!(!FillOutcome::Filled.is_terminal());
    }
}
