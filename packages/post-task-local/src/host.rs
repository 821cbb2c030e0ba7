use crate::profile::Profile;
use crate::queue::{DeadlineQueue, TaskQueue};
use post_task::{
    CapabilitySnapshot, CompletionHandle, Host, Priority, PriorityMap, Task, completion,
};
use std::cell::{Cell, RefCell};
use std::time::Duration;

/// A single-threaded event loop with a virtual clock.
///
/// Nothing runs on its own: the owner drives the loop with
/// [`run_microtasks`](Self::run_microtasks), [`advance`](Self::advance),
/// [`run_native`](Self::run_native), [`run_idle`](Self::run_idle) or
/// [`run_until_stalled`](Self::run_until_stalled). Microtasks are drained
/// after every macrotask, as a browser does between turns.
#[derive(Default)]
pub struct LocalHost {
    profile: Cell<Profile>,
    now: Cell<Duration>,
    microtasks: TaskQueue,
    native: PriorityMap<TaskQueue>,
    /// `scheduler.yield()` continuations run ahead of `user-visible` tasks.
    continuations: TaskQueue,
    timers: DeadlineQueue,
    idle: DeadlineQueue,
    executed: Cell<usize>,
    native_posts: RefCell<Vec<Priority>>,
}

impl LocalHost {
    pub fn new(profile: Profile) -> Self {
        let host = Self::default();
        host.profile.set(profile);
        host
    }

    pub fn profile(&self) -> Profile {
        self.profile.get()
    }

    /// Changes what the host advertises. Already queued work is kept.
    pub fn set_profile(&self, profile: Profile) {
        tracing::debug!(?profile, "LocalHost profile changed");
        self.profile.set(profile);
    }

    /// Virtual time since the host was created.
    pub fn now(&self) -> Duration {
        self.now.get()
    }

    /// Callbacks run so far, across every queue.
    pub fn executed(&self) -> usize {
        self.executed.get()
    }

    /// Callbacks still queued.
    pub fn pending(&self) -> usize {
        self.microtasks.len()
            + self.native.iter().map(|(_, q)| q.len()).sum::<usize>()
            + self.continuations.len()
            + self.timers.len()
            + self.idle.len()
    }

    /// Priorities passed to the native scheduler, in call order.
    pub fn native_posts(&self) -> Vec<Priority> {
        self.native_posts.borrow().clone()
    }

    /// Drains the microtask queue, including microtasks queued by microtasks.
    pub fn run_microtasks(&self) -> usize {
        let ran = self.microtasks.drain();
        self.executed.set(self.executed.get() + ran);
        ran
    }

    fn run_macrotask(&self, task: Task) -> usize {
        task();
        self.executed.set(self.executed.get() + 1);
        1 + self.run_microtasks()
    }

    /// Moves the clock forward by `by`, firing every timer and every idle
    /// callback whose deadline falls in the window, earliest first.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now.get() + by;
        let mut ran = self.run_microtasks();

        loop {
            let next_timer = self.timers.next_deadline().filter(|d| *d <= target);
            let next_idle = self.idle.next_deadline().filter(|d| *d <= target);
            let queue = match (next_timer, next_idle) {
                (Some(t), Some(i)) if i < t => &self.idle,
                (Some(_), _) => &self.timers,
                (None, Some(_)) => &self.idle,
                (None, None) => break,
            };
            let Some((deadline, task)) = queue.pop_due(target) else {
                break;
            };
            self.now.set(self.now.get().max(deadline));
            ran += self.run_macrotask(task);
        }

        self.now.set(target);
        tracing::debug!(now_ms = target.as_millis() as u64, ran, "LocalHost advanced");
        ran
    }

    /// Runs every queued native task, most urgent first and FIFO within a
    /// priority. Yield continuations sit between `user-blocking` and
    /// `user-visible`.
    pub fn run_native(&self) -> usize {
        let mut ran = self.run_microtasks();
        while let Some(task) = self.next_native() {
            ran += self.run_macrotask(task);
        }
        ran
    }

    fn next_native(&self) -> Option<Task> {
        self.native[Priority::UserBlocking]
            .pop()
            .or_else(|| self.continuations.pop())
            .or_else(|| self.native[Priority::UserVisible].pop())
            .or_else(|| self.native[Priority::Background].pop())
    }

    /// Simulates an idle period: every idle callback queued so far runs,
    /// earliest deadline first. Callbacks they queue wait for the next period.
    pub fn run_idle(&self) -> usize {
        let mut ran = self.run_microtasks();
        for _ in 0..self.idle.len() {
            let Some((_, task)) = self.idle.pop_first() else {
                break;
            };
            ran += self.run_macrotask(task);
        }
        ran
    }

    /// Drives the loop until nothing is left, jumping the clock to the next
    /// timer whenever the loop would otherwise sit idle.
    pub fn run_until_stalled(&self) -> usize {
        let mut ran = 0;
        loop {
            let turn = self.run_native() + self.advance(Duration::ZERO);
            ran += turn;
            if turn > 0 {
                continue;
            }
            if !self.idle.is_empty() {
                ran += self.run_idle();
                continue;
            }
            match self.timers.next_deadline() {
                Some(deadline) => {
                    let now = self.now.get();
                    ran += self.advance(deadline.saturating_sub(now));
                }
                None => break,
            }
        }
        ran
    }
}

impl Host for LocalHost {
    fn capabilities(&self) -> CapabilitySnapshot {
        self.profile.get().snapshot()
    }

    fn post_native(&self, task: Task, priority: Priority) -> CompletionHandle {
        self.native_posts.borrow_mut().push(priority);
        let (completer, handle) = completion();
        self.native[priority].push(Box::new(move || completer.run(task)));
        handle
    }

    fn yield_native(&self) -> CompletionHandle {
        let (completer, handle) = completion();
        self.continuations
            .push(Box::new(move || completer.complete()));
        handle
    }

    fn queue_microtask(&self, callback: Task) {
        self.microtasks.push(callback);
    }

    fn request_idle_callback(&self, callback: Task, timeout: Duration) {
        self.idle.insert(self.now.get() + timeout, callback);
    }

    fn set_timeout(&self, callback: Task, delay: Duration) {
        self.timers.insert(self.now.get() + delay, callback);
    }
}

impl Drop for LocalHost {
    fn drop(&mut self) {
        let pending = self.pending();
        if pending > 0 {
            tracing::warn!(pending, "LocalHost dropped with queued callbacks");
        }
    }
}
