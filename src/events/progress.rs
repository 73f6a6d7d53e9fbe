//! Shared progress counter for worker pools.

use super::{BatchKind, BatchProgress, Event, EventSender};
use std::sync::Mutex;

/// Number of completed items between progress events.
///
/// Larger batches report more coarsely so the update overhead stays bounded.
pub fn progress_increment(total: usize) -> usize {
    match total {
        t if t > 50_000 => 1000,
        t if t > 5_000 => 100,
        _ => 10,
    }
}

/// Parallel progress monitor.
///
/// Workers call [`ProgressMonitor::step`] after each item; an
/// [`Event::Progress`] goes out every [`progress_increment`] steps and
/// when the last item finishes.
pub struct ProgressMonitor {
    batch: BatchKind,
    total: usize,
    increment: usize,
    completed: Mutex<usize>,
    events: EventSender,
}

impl ProgressMonitor {
    pub fn new(batch: BatchKind, total: usize, events: EventSender) -> Self {
        Self {
            batch,
            total,
            increment: progress_increment(total),
            completed: Mutex::new(0),
            events,
        }
    }

    /// Record one finished item
    pub fn step(&self) {
        let Ok(mut completed) = self.completed.lock() else {
            return;
        };
        *completed += 1;
        if *completed % self.increment == 0 || *completed == self.total {
            self.events.send(Event::Progress(BatchProgress {
                batch: self.batch,
                completed: *completed,
                total: self.total,
            }));
        }
    }

    /// Items finished so far
    pub fn completed(&self) -> usize {
        self.completed.lock().map(|c| *c).unwrap_or(0)
    }
}
