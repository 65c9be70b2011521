//! Progress reporting for long-running tool operations.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Progress of the current operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// The operation is not decomposable into known work units.
    Indeterminate,
    /// `done` of `total` work units (pages, images, entries) are finished.
    Determinate { done: usize, total: usize },
}

impl Progress {
    /// Completed fraction, if known.
    pub fn fraction(&self) -> Option<f64> {
        match *self {
            Progress::Indeterminate => None,
            Progress::Determinate { total: 0, .. } => Some(1.0),
            Progress::Determinate { done, total } => Some(done.min(total) as f64 / total as f64),
        }
    }
}

/// Progress reporter callback type.
pub type ProgressReporter = Box<dyn Fn(Progress, &str) + Send + Sync>;

/// Handle passed to tools so they can report work units as they finish.
///
/// Safe to share across rayon workers; `advance` counts completions
/// atomically so units finishing out of order still report monotonically.
pub struct ProgressSink<'a> {
    reporter: Option<&'a (dyn Fn(Progress, &str) + Send + Sync)>,
    done: AtomicUsize,
    total: AtomicUsize,
}

impl<'a> ProgressSink<'a> {
    pub fn new(reporter: Option<&'a (dyn Fn(Progress, &str) + Send + Sync)>) -> Self {
        Self {
            reporter,
            done: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
        }
    }

    /// A sink that discards every report.
    pub fn silent() -> ProgressSink<'static> {
        ProgressSink::new(None)
    }

    /// Announce an operation with no known work units.
    pub fn indeterminate(&self, message: &str) {
        self.emit(Progress::Indeterminate, message);
    }

    /// Start a determinate phase of `total` units.
    pub fn begin(&self, total: usize, message: &str) {
        self.total.store(total, Ordering::SeqCst);
        self.done.store(0, Ordering::SeqCst);
        self.emit(Progress::Determinate { done: 0, total }, message);
    }

    /// Mark one unit of the current phase as finished.
    pub fn advance(&self, message: &str) {
        let done = self.done.fetch_add(1, Ordering::SeqCst) + 1;
        let total = self.total.load(Ordering::SeqCst);
        self.emit(
            Progress::Determinate {
                done: done.min(total),
                total,
            },
            message,
        );
    }

    fn emit(&self, progress: Progress, message: &str) {
        if let Some(reporter) = self.reporter {
            reporter(progress, message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_fraction() {
        assert_eq!(Progress::Indeterminate.fraction(), None);
        assert_eq!(Progress::Determinate { done: 1, total: 4 }.fraction(), Some(0.25));
        assert_eq!(Progress::Determinate { done: 0, total: 0 }.fraction(), Some(1.0));
    }

    #[test]
    fn test_sink_counts_units() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let reporter: ProgressReporter = Box::new(move |p, _msg| {
            seen_clone.lock().unwrap().push(p);
        });

        let sink = ProgressSink::new(Some(reporter.as_ref()));
        sink.begin(2, "start");
        sink.advance("one");
        sink.advance("two");
        sink.advance("overshoot");

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0], Progress::Determinate { done: 0, total: 2 });
        assert_eq!(seen[2], Progress::Determinate { done: 2, total: 2 });
        assert_eq!(seen[3], Progress::Determinate { done: 2, total: 2 });
    }

    #[test]
    fn test_silent_sink() {
        let sink = ProgressSink::silent();
        sink.begin(1, "start");
        sink.advance("done");
        sink.indeterminate("working");
    }
}
