use std::thread;
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, Sender};

/// Cancellable single-shot delayed task.
///
/// Scheduling a task cancels the pending one, so a burst of calls runs only
/// the last task, once, `delay` after the last call. Cancellation is
/// signalled by dropping the pending task's channel sender.
pub struct Debouncer {
    delay: Duration,
    pending: Option<Sender<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn schedule<F>(&mut self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        let (cancel_tx, cancel_rx) = crossbeam_channel::bounded::<()>(1);
        let delay = self.delay;
        thread::spawn(move || {
            if let Err(RecvTimeoutError::Timeout) = cancel_rx.recv_timeout(delay) {
                task();
            }
        });
        self.pending = Some(cancel_tx);
    }

    /// Drops the pending task, if any. A task already running is unaffected.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
