use crate::completion::{CompletionHandle, completion};
use crate::priority::Priority;
use std::rc::Rc;
use std::time::Duration;

/// A unit of deferred work. Scheduling is single-threaded, so tasks are
/// not required to be `Send`.
pub type Task = Box<dyn FnOnce() + 'static>;

/// Which scheduling primitives a host exposes right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapabilitySnapshot {
    pub native_scheduler: bool,
    pub native_yield: bool,
    pub microtask_queue: bool,
    pub idle_callback: bool,
    pub timer: bool,
}

impl CapabilitySnapshot {
    /// A non-interactive context: nothing can be deferred.
    pub const NONE: CapabilitySnapshot = CapabilitySnapshot {
        native_scheduler: false,
        native_yield: false,
        microtask_queue: false,
        idle_callback: false,
        timer: false,
    };

    /// Whether any deferral primitive is present at all.
    pub fn is_deferring(&self) -> bool {
        self.native_scheduler
            || self.native_yield
            || self.microtask_queue
            || self.idle_callback
            || self.timer
    }
}

/// The host environment's scheduling surface.
///
/// `capabilities` is asked on every call and never cached, since hosts may
/// gain or lose primitives between calls. The primitive methods are only
/// invoked when the snapshot taken in the same call reports them present.
pub trait Host {
    fn capabilities(&self) -> CapabilitySnapshot;

    /// Hand `task` to the native priority scheduler. The returned handle
    /// resolves once the scheduler has run it.
    fn post_native(&self, task: Task, priority: Priority) -> CompletionHandle;

    /// The native scheduler's cooperative yield.
    fn yield_native(&self) -> CompletionHandle;

    /// Run `callback` after the current synchronous work, before any timer.
    fn queue_microtask(&self, callback: Task);

    /// Run `callback` in idle time, but no later than `timeout` from now.
    fn request_idle_callback(&self, callback: Task, timeout: Duration);

    /// Run `callback` no sooner than `delay` from now.
    fn set_timeout(&self, callback: Task, delay: Duration);
}

impl<H: Host + ?Sized> Host for &H {
    fn capabilities(&self) -> CapabilitySnapshot {
        (**self).capabilities()
    }

    fn post_native(&self, task: Task, priority: Priority) -> CompletionHandle {
        (**self).post_native(task, priority)
    }

    fn yield_native(&self) -> CompletionHandle {
        (**self).yield_native()
    }

    fn queue_microtask(&self, callback: Task) {
        (**self).queue_microtask(callback)
    }

    fn request_idle_callback(&self, callback: Task, timeout: Duration) {
        (**self).request_idle_callback(callback, timeout)
    }

    fn set_timeout(&self, callback: Task, delay: Duration) {
        (**self).set_timeout(callback, delay)
    }
}

impl<H: Host + ?Sized> Host for Rc<H> {
    fn capabilities(&self) -> CapabilitySnapshot {
        (**self).capabilities()
    }

    fn post_native(&self, task: Task, priority: Priority) -> CompletionHandle {
        (**self).post_native(task, priority)
    }

    fn yield_native(&self) -> CompletionHandle {
        (**self).yield_native()
    }

    fn queue_microtask(&self, callback: Task) {
        (**self).queue_microtask(callback)
    }

    fn request_idle_callback(&self, callback: Task, timeout: Duration) {
        (**self).request_idle_callback(callback, timeout)
    }

    fn set_timeout(&self, callback: Task, delay: Duration) {
        (**self).set_timeout(callback, delay)
    }
}

/// A non-interactive host (CLI tools, servers, test runners without an
/// event loop). Reports no capabilities, so every task runs inline.
#[derive(Debug, Clone, Copy, Default)]
pub struct Batch;

impl Host for Batch {
    fn capabilities(&self) -> CapabilitySnapshot {
        CapabilitySnapshot::NONE
    }

    // Unreachable through the selector. Called directly, they still run the
    // work so that nothing is dropped.

    fn post_native(&self, task: Task, _priority: Priority) -> CompletionHandle {
        let (completer, handle) = completion();
        completer.run(task);
        handle
    }

    fn yield_native(&self) -> CompletionHandle {
        CompletionHandle::resolved()
    }

    fn queue_microtask(&self, callback: Task) {
        callback()
    }

    fn request_idle_callback(&self, callback: Task, _timeout: Duration) {
        callback()
    }

    fn set_timeout(&self, callback: Task, _delay: Duration) {
        callback()
    }
}
