//! Coarse progress signal for long-running backend jobs.
//!
//! One value for the whole UI, whatever the job: idle (0) until a job
//! starts, a small nonzero value the instant one is in flight (feedback
//! before the server ever answers), 100 when it resolves, then back to
//! idle after a short hold so the completed state stays visible. A failed
//! job drops straight back to idle; the bar is never left stuck partway.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub const IDLE_PERCENT: u8 = 0;
pub const STARTED_PERCENT: u8 = 10;
pub const DONE_PERCENT: u8 = 100;

const DEFAULT_RESET_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Running,
    Done { since: Instant },
}

/// Cloneable handle to the shared progress value. Only one job is tracked
/// at a time: starting another while one is in flight simply snaps the
/// value back to the running mark, with no queueing and no cancellation of
/// the underlying request.
#[derive(Debug, Clone)]
pub struct JobProgress {
    phase: Arc<Mutex<Phase>>,
    reset_delay: Duration,
}

impl Default for JobProgress {
    fn default() -> Self {
        Self::new(DEFAULT_RESET_DELAY)
    }
}

impl JobProgress {
    pub fn new(reset_delay: Duration) -> Self {
        Self {
            phase: Arc::new(Mutex::new(Phase::Idle)),
            reset_delay,
        }
    }

    /// Wrap a pending job. The value jumps to the running mark the instant
    /// this is called, before the server has answered anything, then to 100
    /// when the job resolves and to idle on failure. The job's own output
    /// is returned unchanged so callers keep chaining on it.
    pub fn track<'a, T, E, F>(&'a self, job: F) -> impl Future<Output = Result<T, E>> + 'a
    where
        F: Future<Output = Result<T, E>> + 'a,
    {
        self.set(Phase::Running);
        async move {
            let out = job.await;
            match &out {
                Ok(_) => self.set(Phase::Done {
                    since: Instant::now(),
                }),
                // A rejected job must not leave the bar stuck at a
                // non-terminal value: reset immediately, skipping the
                // completion hold.
                Err(_) => self.set(Phase::Idle),
            }
            out
        }
    }

    /// Current value in percent. A completed job reads as 100 until the
    /// reset delay has elapsed, then as idle again.
    pub fn percent(&self) -> u8 {
        let mut phase = match self.phase.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match *phase {
            Phase::Idle => IDLE_PERCENT,
            Phase::Running => STARTED_PERCENT,
            Phase::Done { since } => {
                if since.elapsed() >= self.reset_delay {
                    *phase = Phase::Idle;
                    IDLE_PERCENT
                } else {
                    DONE_PERCENT
                }
            }
        }
    }

    pub fn is_idle(&self) -> bool {
        self.percent() == IDLE_PERCENT
    }

    fn set(&self, next: Phase) {
        let mut phase = match self.phase.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *phase = next;
    }
}
