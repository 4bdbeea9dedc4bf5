//! Task definition and run policies

use std::time::Duration;

use futures::future::BoxFuture;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Default deadline for a single task body.
pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// What a task body reports back to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Work finished, discard the task.
    Done,
    /// Transient failure, reschedule with exponential backoff.
    Retry,
    /// Reschedule after a fixed delay; resets the backoff base to it.
    RetryAfter(Duration),
}

/// The work function: runs under a cancellation token derived from the
/// scheduler's lifetime and bounded by the task timeout.
pub type ExecuteFn = Box<dyn FnMut(CancellationToken) -> BoxFuture<'static, TaskOutcome> + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunPolicy {
    InOrder,
    Immediate,
    At(Instant),
    After(Duration),
    WhenIdle,
}

/// A unit of asynchronous work owned by the scheduler.
///
/// The `group` ties the task to a catalog item: cancellation and retry
/// bookkeeping operate per group.
pub struct Task {
    pub group: String,
    pub(crate) work: ExecuteFn,
    pub(crate) policy: RunPolicy,
    pub(crate) timeout: Duration,
    pub(crate) backoff: Duration,
    pub(crate) scheduled_at: Instant,
}

impl Task {
    pub fn new(group: impl Into<String>, work: ExecuteFn) -> Self {
        Task {
            group: group.into(),
            work,
            policy: RunPolicy::InOrder,
            timeout: DEFAULT_TASK_TIMEOUT,
            backoff: Duration::ZERO,
            scheduled_at: Instant::now(),
        }
    }

    /// Run ahead of already queued in-order tasks.
    pub fn immediately(mut self) -> Self {
        self.policy = RunPolicy::Immediate;
        self
    }

    /// Run no earlier than `delay` from enqueue time.
    pub fn after(mut self, delay: Duration) -> Self {
        self.policy = RunPolicy::After(delay);
        self
    }

    /// Run no earlier than the given instant.
    pub fn at(mut self, when: Instant) -> Self {
        self.policy = RunPolicy::At(when);
        self
    }

    /// Run only when nothing else is queued.
    pub fn when_idle(mut self) -> Self {
        self.policy = RunPolicy::WhenIdle;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Applies a body outcome; returns whether the task must be rescheduled
    /// and, if so, leaves `scheduled_at` pointing at the next attempt.
    ///
    /// Retry backoff starts at one second and doubles on every consecutive
    /// retry, unbounded. `RetryAfter` pins the next attempt and resets the
    /// doubling base to the given period.
    pub(crate) fn apply_outcome(&mut self, outcome: TaskOutcome, now: Instant) -> bool {
        match outcome {
            TaskOutcome::Done => false,
            TaskOutcome::Retry => {
                self.backoff = if self.backoff.is_zero() {
                    Duration::from_secs(1)
                } else {
                    self.backoff * 2
                };
                self.scheduled_at = now + self.backoff;
                true
            }
            TaskOutcome::RetryAfter(delay) => {
                self.backoff = delay;
                self.scheduled_at = now + delay;
                true
            }
        }
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("group", &self.group)
            .field("policy", &self.policy)
            .field("timeout", &self.timeout)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_task() -> Task {
        Task::new("g", Box::new(|_| Box::pin(async { TaskOutcome::Done })))
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_backoff_doubles_without_cap() {
        let mut task = noop_task();
        let now = Instant::now();

        let mut delays = Vec::new();
        for _ in 0..5 {
            assert!(task.apply_outcome(TaskOutcome::Retry, now));
            delays.push(task.scheduled_at - now);
        }

        assert_eq!(
            delays,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8),
                Duration::from_secs(16),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_resets_backoff_base() {
        let mut task = noop_task();
        let now = Instant::now();

        task.apply_outcome(TaskOutcome::Retry, now);
        task.apply_outcome(TaskOutcome::Retry, now);
        assert_eq!(task.backoff, Duration::from_secs(2));

        let period = Duration::from_secs(60);
        assert!(task.apply_outcome(TaskOutcome::RetryAfter(period), now));
        assert_eq!(task.scheduled_at - now, period);
        assert_eq!(task.backoff, period);

        // The next plain retry doubles from the fixed period.
        task.apply_outcome(TaskOutcome::Retry, now);
        assert_eq!(task.scheduled_at - now, Duration::from_secs(120));
    }

    #[tokio::test(start_paused = true)]
    async fn test_done_is_terminal() {
        let mut task = noop_task();
        assert!(!task.apply_outcome(TaskOutcome::Done, Instant::now()));
    }
}
