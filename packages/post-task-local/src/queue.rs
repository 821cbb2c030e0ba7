use post_task::Task;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

/// A FIFO queue of callbacks.
///
/// Callbacks are popped one at a time and the borrow is released before
/// running them, so a callback may push onto the queue it came from.
#[derive(Default)]
pub struct TaskQueue {
    queue: RefCell<VecDeque<Task>>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, task: Task) {
        self.queue.borrow_mut().push_back(task);
    }

    pub fn pop(&self) -> Option<Task> {
        self.queue.borrow_mut().pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Runs until empty, including callbacks queued while draining.
    /// Returns how many ran.
    pub fn drain(&self) -> usize {
        let mut ran = 0;
        while let Some(task) = self.pop() {
            task();
            ran += 1;
        }
        ran
    }
}

/// Callbacks keyed by deadline. Ties keep insertion order.
#[derive(Default)]
pub struct DeadlineQueue {
    entries: RefCell<BTreeMap<(Duration, u64), Task>>,
    next_seq: Cell<u64>,
}

impl DeadlineQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, deadline: Duration, task: Task) {
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);
        self.entries.borrow_mut().insert((deadline, seq), task);
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.entries
            .borrow()
            .first_key_value()
            .map(|(&(deadline, _), _)| deadline)
    }

    /// Removes the earliest entry if it is due at or before `limit`.
    pub fn pop_due(&self, limit: Duration) -> Option<(Duration, Task)> {
        let mut entries = self.entries.borrow_mut();
        let due = entries
            .first_key_value()
            .is_some_and(|(&(deadline, _), _)| deadline <= limit);
        if !due {
            return None;
        }
        entries
            .pop_first()
            .map(|((deadline, _), task)| (deadline, task))
    }

    /// Removes the earliest entry regardless of its deadline.
    pub fn pop_first(&self) -> Option<(Duration, Task)> {
        self.entries
            .borrow_mut()
            .pop_first()
            .map(|((deadline, _), task)| (deadline, task))
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}
