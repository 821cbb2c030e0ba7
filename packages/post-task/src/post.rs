use crate::capability::{Host, Task};
use crate::completion::{CompletionHandle, completion};
use crate::delay::DelayTable;
use crate::error::Result;
use crate::priority::Priority;
use crate::selector::{Mechanism, YieldMechanism, select, select_yield};

/// Queues `task` on `host` at `priority` using the default delay table.
///
/// Never blocks: the task is handed to the best mechanism the host offers
/// right now and a handle is returned immediately. On a host with no
/// deferral primitive the task runs before this returns and the handle is
/// already resolved.
pub fn post_task<H, F>(host: &H, task: F, priority: Priority) -> CompletionHandle
where
    H: Host + ?Sized,
    F: FnOnce() + 'static,
{
    dispatch(host, &DelayTable::DEFAULT, task, priority)
}

/// Cooperatively cedes control at `user-visible` priority.
pub fn pause_task<H: Host + ?Sized>(host: &H) -> CompletionHandle {
    pause(host, &DelayTable::DEFAULT)
}

fn dispatch<H, F>(host: &H, delays: &DelayTable, task: F, priority: Priority) -> CompletionHandle
where
    H: Host + ?Sized,
    F: FnOnce() + 'static,
{
    let caps = host.capabilities();
    let mechanism = select(&caps, priority, delays);
    tracing::trace!(%priority, %mechanism, "post_task");
    engage(host, mechanism, task)
}

fn engage<H, F>(host: &H, mechanism: Mechanism, task: F) -> CompletionHandle
where
    H: Host + ?Sized,
    F: FnOnce() + 'static,
{
    match mechanism {
        // The native scheduler receives the caller's task untouched and
        // reports completion through its own handle.
        Mechanism::Native { priority } => host.post_native(Box::new(task), priority),
        Mechanism::Microtask => deferred(task, |callback| host.queue_microtask(callback)),
        Mechanism::Idle { timeout } => {
            deferred(task, |callback| host.request_idle_callback(callback, timeout))
        }
        Mechanism::Timer { delay } => deferred(task, |callback| host.set_timeout(callback, delay)),
        Mechanism::Immediate => deferred(task, |callback| callback()),
    }
}

/// Wraps `task` so that running it resolves the returned handle, then
/// hands the wrapper to `enqueue`.
fn deferred<F>(task: F, enqueue: impl FnOnce(Task)) -> CompletionHandle
where
    F: FnOnce() + 'static,
{
    let (completer, handle) = completion();
    enqueue(Box::new(move || completer.run(task)));
    handle
}

fn pause<H: Host + ?Sized>(host: &H, delays: &DelayTable) -> CompletionHandle {
    let caps = host.capabilities();
    match select_yield(&caps, delays) {
        YieldMechanism::Yield => {
            tracing::trace!("pause_task via native yield");
            host.yield_native()
        }
        YieldMechanism::Post(Mechanism::Immediate) => CompletionHandle::resolved(),
        YieldMechanism::Post(mechanism) => {
            tracing::trace!(%mechanism, "pause_task");
            engage(host, mechanism, || {})
        }
    }
}

/// A host paired with its own delay table.
///
/// The free functions use [`DelayTable::DEFAULT`]; this type is for callers
/// that load a tuned table from configuration.
#[derive(Debug, Clone)]
pub struct TaskScheduler<H> {
    host: H,
    delays: DelayTable,
}

impl<H: Host> TaskScheduler<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            delays: DelayTable::DEFAULT,
        }
    }

    /// Replaces the default delays. Tables that let a less urgent priority
    /// wait less than a more urgent one are refused.
    pub fn with_delays(mut self, delays: DelayTable) -> Result<Self> {
        delays.validate()?;
        self.delays = delays;
        Ok(self)
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn delays(&self) -> &DelayTable {
        &self.delays
    }

    pub fn post_task<F>(&self, task: F, priority: Priority) -> CompletionHandle
    where
        F: FnOnce() + 'static,
    {
        dispatch(&self.host, &self.delays, task, priority)
    }

    pub fn pause_task(&self) -> CompletionHandle {
        pause(&self.host, &self.delays)
    }

    /// The mechanism a `post_task` at `priority` would use right now.
    pub fn mechanism_for(&self, priority: Priority) -> Mechanism {
        select(&self.host.capabilities(), priority, &self.delays)
    }
}
