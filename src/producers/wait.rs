use std::sync::{Condvar, Mutex};
use std::time::Instant;

use crate::core::lock::lock_mutex;

/// Cancellable sleep for tick loops.
///
/// `cancel` is sticky: a wait that starts after cancellation returns at once,
/// so a stop request can never be lost between two waits.
pub struct StopWait {
    cancelled: Mutex<bool>,
    condvar: Condvar,
}

impl StopWait {
    pub fn new() -> Self {
        Self {
            cancelled: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    /// Sleeps until `deadline`. Returns `true` if cancelled.
    pub fn wait_until(&self, deadline: Instant) -> bool {
        let mut cancelled = lock_mutex(&self.cancelled, "StopWait::wait_until");
        loop {
            if *cancelled {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            cancelled = match self.condvar.wait_timeout(cancelled, deadline - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }

    pub fn cancel(&self) {
        *lock_mutex(&self.cancelled, "StopWait::cancel") = true;
        self.condvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *lock_mutex(&self.cancelled, "StopWait::is_cancelled")
    }
}

impl Default for StopWait {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_wait_times_out() {
        let wait = StopWait::new();
        let start = Instant::now();
        assert!(!wait.wait_until(start + Duration::from_millis(20)));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_cancel_wakes_waiter() {
        let wait = Arc::new(StopWait::new());
        let waiter = wait.clone();
        let handle = std::thread::spawn(move || {
            waiter.wait_until(Instant::now() + Duration::from_secs(10))
        });

        std::thread::sleep(Duration::from_millis(20));
        wait.cancel();
        assert!(handle.join().unwrap());
    }

    #[test]
    fn test_cancel_before_wait_is_not_lost() {
        let wait = StopWait::new();
        wait.cancel();
        assert!(wait.is_cancelled());
        assert!(wait.wait_until(Instant::now() + Duration::from_secs(10)));
    }
}
