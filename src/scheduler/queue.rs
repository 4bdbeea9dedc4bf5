//! Three-list task queue: time-ordered, FIFO and idle

use std::collections::VecDeque;

use tokio::time::Instant;

use super::task::{RunPolicy, Task};

/// Live tasks, each present in exactly one of the three lists.
#[derive(Default)]
pub(crate) struct Queue {
    /// Ascending by `scheduled_at`; holds `At`/`After` and rescheduled tasks.
    timed: VecDeque<Task>,
    /// `InOrder` appends, `Immediate` prepends.
    ordered: VecDeque<Task>,
    /// Consulted only when the other two lists are empty.
    idle: VecDeque<Task>,
}

impl Queue {
    pub fn push(&mut self, mut task: Task, now: Instant) {
        match task.policy {
            RunPolicy::InOrder => self.ordered.push_back(task),
            RunPolicy::Immediate => self.ordered.push_front(task),
            RunPolicy::After(delay) => {
                task.scheduled_at = now + delay;
                self.schedule(task);
            }
            RunPolicy::At(when) => {
                task.scheduled_at = when;
                self.schedule(task);
            }
            RunPolicy::WhenIdle => self.idle.push_back(task),
        }
    }

    /// Inserts into the time-ordered list, keeping ascending `scheduled_at`.
    pub fn schedule(&mut self, task: Task) {
        let pos = self
            .timed
            .iter()
            .position(|queued| queued.scheduled_at > task.scheduled_at)
            .unwrap_or(self.timed.len());
        self.timed.insert(pos, task);
    }

    /// Next eligible task: a due timed task wins, then FIFO, then idle.
    pub fn pop(&mut self, now: Instant) -> Option<Task> {
        if let Some(head) = self.timed.front() {
            if head.scheduled_at < now {
                return self.timed.pop_front();
            }
        }
        if let Some(task) = self.ordered.pop_front() {
            return Some(task);
        }
        self.idle.pop_front()
    }

    pub fn remove_group(&mut self, group: &str) {
        self.timed.retain(|t| t.group != group);
        self.ordered.retain(|t| t.group != group);
        self.idle.retain(|t| t.group != group);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.timed.len() + self.ordered.len() + self.idle.len()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::super::task::TaskOutcome;
    use super::*;

    fn task(group: &str) -> Task {
        Task::new(group, Box::new(|_| Box::pin(async { TaskOutcome::Done })))
    }

    #[tokio::test(start_paused = true)]
    async fn test_due_timed_task_wins_over_fifo_and_idle() {
        let mut q = Queue::default();
        let now = Instant::now();

        q.push(task("idle").when_idle(), now);
        q.push(task("fifo"), now);
        q.push(task("timed").after(Duration::from_millis(1)), now);

        let later = now + Duration::from_millis(5);
        assert_eq!(q.pop(later).unwrap().group, "timed");
        assert_eq!(q.pop(later).unwrap().group, "fifo");
        assert_eq!(q.pop(later).unwrap().group, "idle");
        assert!(q.pop(later).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_undue_timed_task_does_not_block_fifo() {
        let mut q = Queue::default();
        let now = Instant::now();

        q.push(task("timed").after(Duration::from_secs(60)), now);
        q.push(task("fifo"), now);

        assert_eq!(q.pop(now).unwrap().group, "fifo");
        // Only the future-dated task remains; nothing is eligible yet.
        assert!(q.pop(now).is_none());
        assert_eq!(q.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_prepends_to_fifo() {
        let mut q = Queue::default();
        let now = Instant::now();

        q.push(task("first"), now);
        q.push(task("jumped"), now);
        q.push(task("urgent").immediately(), now);

        assert_eq!(q.pop(now).unwrap().group, "urgent");
        assert_eq!(q.pop(now).unwrap().group, "first");
        assert_eq!(q.pop(now).unwrap().group, "jumped");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_list_stays_sorted() {
        let mut q = Queue::default();
        let now = Instant::now();

        q.push(task("late").after(Duration::from_secs(30)), now);
        q.push(task("early").after(Duration::from_secs(5)), now);
        q.push(task("middle").after(Duration::from_secs(10)), now);

        let later = now + Duration::from_secs(60);
        assert_eq!(q.pop(later).unwrap().group, "early");
        assert_eq!(q.pop(later).unwrap().group, "middle");
        assert_eq!(q.pop(later).unwrap().group, "late");
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_group_covers_all_lists() {
        let mut q = Queue::default();
        let now = Instant::now();

        q.push(task("g"), now);
        q.push(task("g").when_idle(), now);
        q.push(task("g").after(Duration::from_secs(1)), now);
        q.push(task("other"), now);

        q.remove_group("g");
        assert_eq!(q.len(), 1);
        assert_eq!(q.pop(now).unwrap().group, "other");
    }
}
