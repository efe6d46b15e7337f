//! Deferred work.
//!
//! Every deferred effect on a page is a [`Task`] value rather than a
//! closure, so a pending effect can be inspected, cancelled through its
//! [`TaskHandle`], and executed by whoever owns the controllers.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::{ElementId, Scheduler};

/// A deferred page effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum Task {
    AddClass {
        element: ElementId,
        class: String,
    },
    SetStyle {
        element: ElementId,
        property: String,
        value: String,
    },
    /// Reveal `element` if its top edge is inside the viewport.
    RevealIfInViewport { element: ElementId },
    StartTimer { timer_type: String, minutes: u64 },
}

/// Cancellation handle returned by [`Scheduler::schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

/// Manually driven clock. Time only moves through `advance_to`.
#[derive(Debug, Clone, Default)]
pub struct VirtualScheduler {
    now_ms: u64,
    next_seq: u64,
    /// Keyed by (due, seq) so equal due times keep scheduling order.
    queue: BTreeMap<(u64, u64), Task>,
    due_by_seq: HashMap<u64, u64>,
}

impl VirtualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Pending tasks in due order.
    pub fn pending_tasks(&self) -> impl Iterator<Item = (u64, &Task)> {
        self.queue.iter().map(|((due, _), task)| (*due, task))
    }
}

impl Scheduler for VirtualScheduler {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn schedule(&mut self, delay_ms: u64, task: Task) -> TaskHandle {
        let seq = self.next_seq;
        self.next_seq += 1;
        let due = self.now_ms.saturating_add(delay_ms);
        self.queue.insert((due, seq), task);
        self.due_by_seq.insert(seq, due);
        TaskHandle(seq)
    }

    fn cancel(&mut self, handle: TaskHandle) -> bool {
        match self.due_by_seq.remove(&handle.0) {
            Some(due) => self.queue.remove(&(due, handle.0)).is_some(),
            None => false,
        }
    }

    fn next_due(&self) -> Option<u64> {
        self.queue.keys().next().map(|(due, _)| *due)
    }

    fn advance_to(&mut self, at_ms: u64) -> Vec<Task> {
        self.now_ms = self.now_ms.max(at_ms);
        let later = self.queue.split_off(&(self.now_ms.saturating_add(1), 0));
        let due = std::mem::replace(&mut self.queue, later);
        due.into_iter()
            .map(|((_, seq), task)| {
                self.due_by_seq.remove(&seq);
                task
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class_task(class: &str) -> Task {
        Task::AddClass {
            element: ElementId(1),
            class: class.into(),
        }
    }

    #[test]
    fn drains_in_due_then_schedule_order() {
        let mut s = VirtualScheduler::new();
        s.schedule(300, class_task("late"));
        s.schedule(16, class_task("first"));
        s.schedule(16, class_task("second"));
        assert_eq!(s.next_due(), Some(16));

        let due = s.advance_to(100);
        assert_eq!(due, vec![class_task("first"), class_task("second")]);
        assert_eq!(s.now_ms(), 100);
        assert_eq!(s.pending(), 1);

        assert_eq!(s.advance_to(300), vec![class_task("late")]);
        assert_eq!(s.next_due(), None);
    }

    #[test]
    fn cancelled_tasks_never_run() {
        let mut s = VirtualScheduler::new();
        let handle = s.schedule(300, class_task("hide"));
        assert!(s.cancel(handle));
        assert!(!s.cancel(handle));
        assert!(s.advance_to(1_000).is_empty());
    }

    #[test]
    fn clock_never_goes_backwards() {
        let mut s = VirtualScheduler::new();
        s.advance_to(500);
        s.advance_to(200);
        assert_eq!(s.now_ms(), 500);
        let h = s.schedule(0, class_task("now"));
        assert_eq!(s.advance_to(0), vec![class_task("now")]);
        assert!(!s.cancel(h));
    }
}
