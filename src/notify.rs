//! Change-detected, throttled playback notifications.
//!
//! UI layers only care about whole-position and whole-second changes, so the
//! gate deduplicates the per-frame metadata stream before it reaches the
//! sink. End of playback is signalled exactly once, and only from the
//! device's own confirmed halt, so the finished event reflects reality even
//! when the core's stop request never reached the device.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::state::PlayerState;

/// Receiver of playback events, typically a UI layer.
pub trait NotificationSink: Send + Sync {
    /// The playback position moved to a new value
    fn on_position_changed(&self, position: u32);

    /// The elapsed playback time reached a new whole second
    fn on_time_changed(&self, seconds: u64);

    /// Playback has finished; fired once per session
    fn on_finished(&self);
}

/// Deduplicates position/time updates and latches the finished signal.
pub struct NotificationGate {
    sink: Arc<dyn NotificationSink>,
    finished: AtomicBool,
}

impl NotificationGate {
    /// Wrap a sink in a fresh gate (nothing reported yet)
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        NotificationGate {
            sink,
            finished: AtomicBool::new(false),
        }
    }

    /// Report the metadata of a freshly decoded frame.
    ///
    /// No-op unless the session is running. Seconds are derived from the
    /// elapsed milliseconds by integer truncation. Position and time checks
    /// are independent; either, both, or neither event may fire per frame,
    /// and an unchanged value never fires twice. The stored last-reported
    /// values are updated before the sink is called.
    pub fn report_frame(&self, state: &PlayerState, position: u32, elapsed_ms: u64) {
        if !state.is_running() {
            return;
        }

        if state.update_position(position) {
            self.sink.on_position_changed(position);
        }

        let seconds = elapsed_ms / 1000;
        if state.update_seconds(seconds) {
            self.sink.on_time_changed(seconds);
        }
    }

    /// Report that the device's running property has become false.
    ///
    /// Emits the finished event exactly once per session, even when the
    /// device delivers its state-change callback more than once.
    pub fn report_device_stopped(&self) {
        if !self.finished.swap(true, Ordering::AcqRel) {
            self.sink.on_finished();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::{FrameDecoder, Pull};
    use crate::Result;
    use parking_lot::Mutex;

    struct NullDecoder;

    impl FrameDecoder for NullDecoder {
        fn pull(&mut self) -> Result<Pull<'_>> {
            Ok(Pull::Exhausted)
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<String>>,
    }

    impl RecordingSink {
        fn events(&self) -> Vec<String> {
            self.events.lock().clone()
        }
    }

    impl NotificationSink for RecordingSink {
        fn on_position_changed(&self, position: u32) {
            self.events.lock().push(format!("pos {position}"));
        }

        fn on_time_changed(&self, seconds: u64) {
            self.events.lock().push(format!("sec {seconds}"));
        }

        fn on_finished(&self) {
            self.events.lock().push("finished".into());
        }
    }

    fn setup() -> (PlayerState, Arc<RecordingSink>, NotificationGate) {
        let state = PlayerState::new(Box::new(NullDecoder), 1024);
        let sink = Arc::new(RecordingSink::default());
        let gate = NotificationGate::new(sink.clone());
        (state, sink, gate)
    }

    #[test]
    fn test_no_events_unless_running() {
        let (state, sink, gate) = setup();
        gate.report_frame(&state, 0, 0);
        assert!(sink.events().is_empty(), "gate must be silent before start");
        assert_eq!(state.last_position(), None);
    }

    #[test]
    fn test_first_zero_values_fire_once() {
        let (state, sink, gate) = setup();
        state.begin_running();

        gate.report_frame(&state, 0, 0);
        gate.report_frame(&state, 0, 500);
        assert_eq!(sink.events(), vec!["pos 0", "sec 0"]);
    }

    #[test]
    fn test_independent_position_and_time_checks() {
        let (state, sink, gate) = setup();
        state.begin_running();

        gate.report_frame(&state, 0, 0); // both fire
        gate.report_frame(&state, 1, 900); // position only
        gate.report_frame(&state, 1, 1000); // time only
        gate.report_frame(&state, 1, 1400); // neither
        assert_eq!(sink.events(), vec!["pos 0", "sec 0", "pos 1", "sec 1"]);
    }

    #[test]
    fn test_seconds_truncate() {
        let (state, sink, gate) = setup();
        state.begin_running();

        gate.report_frame(&state, 0, 2999);
        assert_eq!(sink.events(), vec!["pos 0", "sec 2"]);
    }

    #[test]
    fn test_finished_fires_once() {
        let (_state, sink, gate) = setup();
        gate.report_device_stopped();
        gate.report_device_stopped();
        gate.report_device_stopped();
        assert_eq!(sink.events(), vec!["finished"]);
    }
}
