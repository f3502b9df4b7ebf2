// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! One-shot timer guarding a hardware run.
//!
//! A single worker thread waits for the armed deadline and calls the expiry callback with the id
//! of the job it was armed for. Cancelling or re-arming replaces the deadline; a callback that
//! races with a cancel may still run, so the callee checks the job id against the job it holds.

use std::sync::Arc;
use std::sync::Condvar;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;
use std::time::Instant;

#[derive(Default)]
struct TimerState {
    deadline: Option<(Instant, u64)>,
    shutdown: bool,
}

struct Shared {
    state: Mutex<TimerState>,
    cvar: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, TimerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct Watchdog {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl Watchdog {
    pub fn new<F>(on_expire: F) -> Self
    where
        F: Fn(u64) + Send + 'static,
    {
        let shared = Arc::new(Shared {
            state: Mutex::new(TimerState::default()),
            cvar: Condvar::new(),
        });

        let worker_shared = shared.clone();
        let worker = thread::spawn(move || {
            let mut state = worker_shared.lock();
            loop {
                if state.shutdown {
                    break;
                }
                let deadline = state.deadline;
                state = match deadline {
                    None => worker_shared
                        .cvar
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner),
                    Some((deadline, job)) => {
                        let now = Instant::now();
                        if now >= deadline {
                            state.deadline = None;
                            drop(state);
                            on_expire(job);
                            worker_shared.lock()
                        } else {
                            worker_shared
                                .cvar
                                .wait_timeout(state, deadline - now)
                                .unwrap_or_else(PoisonError::into_inner)
                                .0
                        }
                    }
                };
            }
        });

        Self {
            shared,
            worker: Some(worker),
        }
    }

    /// Starts the timer for `job`, replacing any pending deadline.
    pub fn arm(&self, job: u64, timeout: Duration) {
        self.shared.lock().deadline = Some((Instant::now() + timeout, job));
        self.shared.cvar.notify_all();
    }

    pub fn cancel(&self) {
        self.shared.lock().deadline = None;
        self.shared.cvar.notify_all();
    }

    pub fn is_armed(&self) -> bool {
        self.shared.lock().deadline.is_some()
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.shared.lock().shutdown = true;
        self.shared.cvar.notify_all();

        if let Some(worker) = self.worker.take() {
            // The last owner may be the expiry callback itself.
            if worker.thread().id() == thread::current().id() {
                return;
            }
            if worker.join().is_err() {
                log::error!("watchdog thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;

    #[test]
    fn test_expires_once() {
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        let watchdog = Watchdog::new(move |job| {
            let _ = tx.lock().unwrap().send(job);
        });

        watchdog.arm(7, Duration::from_millis(10));
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 7);
        assert!(!watchdog.is_armed());
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn test_cancel() {
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        let watchdog = Watchdog::new(move |job| {
            let _ = tx.lock().unwrap().send(job);
        });

        watchdog.arm(1, Duration::from_millis(100));
        watchdog.cancel();
        assert!(!watchdog.is_armed());
        assert!(rx.recv_timeout(Duration::from_millis(300)).is_err());

        // Re-arming replaces the deadline and the job.
        watchdog.arm(2, Duration::from_secs(60));
        watchdog.arm(3, Duration::from_millis(10));
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 3);
    }
}
