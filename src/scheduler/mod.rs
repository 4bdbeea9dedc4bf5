//! Retry-aware, delay-aware work queue with a single sequential executor
//!
//! All asynchronous acquisition and reconciliation work goes through one
//! scheduler. Exactly one task body runs at a time: a slow task delays all
//! others, which keeps per-item work trivially serialized and is relied on
//! throughout the watcher. Time-ordered tasks whose due time arrives without
//! new work being added are picked up by a fixed 10 s wake-up tick.

mod queue;
mod task;
pub mod wrappers;

use std::sync::Arc;

use parking_lot::Mutex;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use queue::Queue;
pub use task::{DEFAULT_TASK_TIMEOUT, ExecuteFn, Task, TaskOutcome};

const TICK_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Default)]
struct State {
    queue: Queue,
    running_group: Option<String>,
    cancel_running: bool,
    stopped: bool,
}

struct Shared {
    state: Mutex<State>,
    notify: Notify,
}

/// The work queue. Construct one per process (or per test); it owns a single
/// worker that drains the queue until [`Scheduler::stop`].
pub struct Scheduler {
    shared: Arc<Shared>,
    root: CancellationToken,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new() -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(State::default()),
            notify: Notify::new(),
        });
        let root = CancellationToken::new();

        let worker_shared = shared.clone();
        let worker_root = root.clone();
        let worker = tokio::spawn(async move {
            run_worker(worker_shared, worker_root).await;
        });

        Scheduler {
            shared,
            root,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Enqueues a task according to its run policy. Returns false once the
    /// scheduler has been stopped.
    pub fn add(&self, task: Task) -> bool {
        {
            let mut state = self.shared.state.lock();
            if state.stopped {
                return false;
            }
            state.queue.push(task, Instant::now());
        }
        self.shared.notify.notify_one();
        true
    }

    /// Removes every pending task of `group` from all queues. If a task of
    /// that group is currently executing it is left to finish, but its
    /// reschedule is suppressed regardless of the outcome it returns.
    pub fn cancel(&self, group: &str) {
        let mut state = self.shared.state.lock();
        state.queue.remove_group(group);
        if state.running_group.as_deref() == Some(group) {
            state.cancel_running = true;
        }
    }

    /// Stops accepting work, cancels the execution context and waits for the
    /// in-flight task body to finish.
    pub async fn stop(&self) {
        self.shared.state.lock().stopped = true;
        self.root.cancel();
        self.shared.notify.notify_one();

        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_worker(shared: Arc<Shared>, root: CancellationToken) {
    let mut ticker = tokio::time::interval(TICK_INTERVAL);
    loop {
        tokio::select! {
            _ = shared.notify.notified() => drain(&shared, &root).await,
            _ = ticker.tick() => drain(&shared, &root).await,
            _ = root.cancelled() => return,
        }
    }
}

/// Runs eligible tasks back to back until none is due.
async fn drain(shared: &Arc<Shared>, root: &CancellationToken) {
    loop {
        if root.is_cancelled() {
            return;
        }
        let task = {
            let mut state = shared.state.lock();
            let task = state.queue.pop(Instant::now());
            state.running_group = task.as_ref().map(|t| t.group.clone());
            task
        };
        let Some(task) = task else { return };
        run_task(shared, root, task).await;
    }
}

async fn run_task(shared: &Arc<Shared>, root: &CancellationToken, mut task: Task) {
    let child = root.child_token();
    let body = (task.work)(child.clone());

    let outcome = match tokio::time::timeout(task.timeout, body).await {
        Ok(outcome) => outcome,
        Err(_) => {
            child.cancel();
            warn!(group = %task.group, timeout = ?task.timeout, "task deadline exceeded");
            TaskOutcome::Retry
        }
    };

    let mut state = shared.state.lock();
    let cancelled = state.cancel_running;
    if !cancelled && task.apply_outcome(outcome, Instant::now()) {
        debug!(group = %task.group, next_in = ?task.backoff, "task rescheduled");
        state.queue.schedule(task);
    }
    state.running_group = None;
    state.cancel_running = false;
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;
    use tokio::sync::oneshot;

    use super::*;

    /// A task that records its start order and optionally waits on a gate
    /// before finishing.
    fn recording_task(
        group: &str,
        log: Arc<Mutex<Vec<String>>>,
        gate: Option<oneshot::Receiver<()>>,
    ) -> Task {
        let group_name = group.to_string();
        let mut gate = Some(gate);
        Task::new(
            group,
            Box::new(move |_| {
                let log = log.clone();
                let name = group_name.clone();
                let gate = gate.take().flatten();
                Box::pin(async move {
                    log.lock().push(name);
                    if let Some(gate) = gate {
                        let _ = gate.await;
                    }
                    TaskOutcome::Done
                })
            }),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_due_timed_then_fifo_then_idle() {
        let sched = Scheduler::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let (release, gate) = oneshot::channel();

        // Occupy the worker so the remaining adds land in the queue together.
        assert!(sched.add(recording_task("gate", log.clone(), Some(gate))));
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert!(sched.add(recording_task("idle", log.clone(), None).when_idle()));
        assert!(sched.add(recording_task("fifo", log.clone(), None)));
        assert!(sched.add(
            recording_task("timed", log.clone(), None).after(Duration::from_millis(1))
        ));

        // Let the timed task come due, then release the worker.
        tokio::time::sleep(Duration::from_millis(5)).await;
        release.send(()).unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(*log.lock(), vec!["gate", "timed", "fifo", "idle"]);
        sched.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_task_body_at_a_time() {
        let sched = Scheduler::new();
        let started = Arc::new(Mutex::new(Vec::<(String, Instant)>::new()));

        let slow_started = started.clone();
        sched.add(Task::new(
            "slow",
            Box::new(move |_| {
                let started = slow_started.clone();
                Box::pin(async move {
                    started.lock().push(("slow".into(), Instant::now()));
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    TaskOutcome::Done
                })
            }),
        ));
        let fast_started = started.clone();
        sched.add(Task::new(
            "fast",
            Box::new(move |_| {
                let started = fast_started.clone();
                Box::pin(async move {
                    started.lock().push(("fast".into(), Instant::now()));
                    TaskOutcome::Done
                })
            }),
        ));

        tokio::time::sleep(Duration::from_secs(10)).await;

        let started = started.lock();
        assert_eq!(started.len(), 2);
        assert_eq!(started[0].0, "slow");
        assert_eq!(started[1].0, "fast");
        // The fast task had to wait out the slow body.
        assert!(started[1].1 - started[0].1 >= Duration::from_secs(5));
        sched.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_removes_pending_tasks() {
        let sched = Scheduler::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let (release, gate) = oneshot::channel();

        sched.add(recording_task("gate", log.clone(), Some(gate)));
        tokio::time::sleep(Duration::from_millis(1)).await;

        sched.add(recording_task("doomed", log.clone(), None));
        sched.add(recording_task("doomed", log.clone(), None).when_idle());
        sched.add(recording_task("kept", log.clone(), None));

        sched.cancel("doomed");
        release.send(()).unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(*log.lock(), vec!["gate", "kept"]);
        sched.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_suppresses_reschedule_of_running_task() {
        let sched = Scheduler::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let (release, gate) = oneshot::channel();

        let task_runs = runs.clone();
        let mut gate = Some(gate);
        sched.add(Task::new(
            "g",
            Box::new(move |_| {
                let runs = task_runs.clone();
                let gate = gate.take();
                Box::pin(async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                    if let Some(gate) = gate {
                        let _ = gate.await;
                    }
                    TaskOutcome::Retry
                })
            }),
        ));
        tokio::time::sleep(Duration::from_millis(1)).await;

        // The task is mid-flight; cancelling must drop its reschedule even
        // though it returns Retry.
        sched.cancel("g");
        release.send(()).unwrap();

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        sched.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_reschedules_until_done() {
        let sched = Scheduler::new();
        let runs = Arc::new(AtomicUsize::new(0));

        let task_runs = runs.clone();
        sched.add(Task::new(
            "flaky",
            Box::new(move |_| {
                let runs = task_runs.clone();
                Box::pin(async move {
                    let n = runs.fetch_add(1, Ordering::SeqCst);
                    if n < 2 {
                        TaskOutcome::Retry
                    } else {
                        TaskOutcome::Done
                    }
                })
            }),
        ));

        // Retries land on the time-ordered list and are picked up by the
        // periodic tick even without new arrivals.
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);
        sched.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_body_is_retried() {
        let sched = Scheduler::new();
        let runs = Arc::new(AtomicUsize::new(0));

        let task_runs = runs.clone();
        sched.add(
            Task::new(
                "stuck",
                Box::new(move |_| {
                    let runs = task_runs.clone();
                    Box::pin(async move {
                        runs.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_secs(3600)).await;
                        TaskOutcome::Done
                    })
                }),
            )
            .with_timeout(Duration::from_secs(1)),
        );

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(runs.load(Ordering::SeqCst) >= 2);
        sched.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_after_stop_is_rejected() {
        let sched = Scheduler::new();
        sched.stop().await;
        let accepted = sched.add(Task::new(
            "late",
            Box::new(|_| Box::pin(async { TaskOutcome::Done })),
        ));
        assert!(!accepted);
    }
}
