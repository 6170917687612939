use treecmp_common::{RelPath, Side};

/// Stage of a comparison run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Scanning(Side),
    Comparing,
    DetectingRenames,
}

/// Receives progress notifications while the engine runs.
///
/// Hashing workers call `item_finished` concurrently, so implementations
/// must be thread-safe. Every method has an empty default.
pub trait ProgressObserver: Send + Sync {
    /// `total` is the number of items the phase will process, or 0 if unknown
    fn phase_started(&self, _phase: Phase, _total: u64) {}

    fn item_finished(&self, _phase: Phase, _path: &RelPath) {}

    fn phase_finished(&self, _phase: Phase) {}
}

/// Observer that ignores every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records phase transitions and item counts for assertions
    #[derive(Default)]
    pub struct RecordingObserver {
        pub phases: Mutex<Vec<(Phase, u64)>>,
        pub items: Mutex<Vec<(Phase, String)>>,
        pub finished: Mutex<Vec<Phase>>,
    }

    impl ProgressObserver for RecordingObserver {
        fn phase_started(&self, phase: Phase, total: u64) {
            self.phases.lock().unwrap().push((phase, total));
        }

        fn item_finished(&self, phase: Phase, path: &RelPath) {
            self.items.lock().unwrap().push((phase, path.to_string()));
        }

        fn phase_finished(&self, phase: Phase) {
            self.finished.lock().unwrap().push(phase);
        }
    }
}
