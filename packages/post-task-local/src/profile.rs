use post_task::CapabilitySnapshot;

/// Which primitives a [`LocalHost`](crate::LocalHost) advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Profile {
    pub native_scheduler: bool,
    pub native_yield: bool,
    pub microtask_queue: bool,
    pub idle_callback: bool,
    pub timer: bool,
}

impl Profile {
    /// No event loop at all.
    pub const fn batch() -> Self {
        Self {
            native_scheduler: false,
            native_yield: false,
            microtask_queue: false,
            idle_callback: false,
            timer: false,
        }
    }

    /// An event loop that only has timers.
    pub const fn timers() -> Self {
        Self {
            timer: true,
            ..Self::batch()
        }
    }

    /// Timers plus a microtask queue.
    pub const fn microtasks() -> Self {
        Self {
            microtask_queue: true,
            ..Self::timers()
        }
    }

    /// Timers plus idle callbacks.
    pub const fn idle() -> Self {
        Self {
            idle_callback: true,
            ..Self::timers()
        }
    }

    /// Everything, including the native scheduler and its yield.
    pub const fn native() -> Self {
        Self {
            native_scheduler: true,
            native_yield: true,
            microtask_queue: true,
            idle_callback: true,
            timer: true,
        }
    }

    /// A native scheduler that predates `yield`.
    pub const fn native_without_yield() -> Self {
        Self {
            native_yield: false,
            ..Self::native()
        }
    }

    pub fn snapshot(&self) -> CapabilitySnapshot {
        CapabilitySnapshot {
            native_scheduler: self.native_scheduler,
            native_yield: self.native_yield,
            microtask_queue: self.microtask_queue,
            idle_callback: self.idle_callback,
            timer: self.timer,
        }
    }

    /// All 32 combinations of the five flags.
    pub fn all() -> impl Iterator<Item = Profile> {
        (0..32u8).map(|bits| Profile {
            native_scheduler: bits & 1 != 0,
            native_yield: bits & 2 != 0,
            microtask_queue: bits & 4 != 0,
            idle_callback: bits & 8 != 0,
            timer: bits & 16 != 0,
        })
    }
}
