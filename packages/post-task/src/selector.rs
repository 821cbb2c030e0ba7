use crate::capability::CapabilitySnapshot;
use crate::delay::DelayTable;
use crate::priority::Priority;
use std::fmt;
use std::time::Duration;

/// The primitive a single `post_task` call is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mechanism {
    /// The host's own priority scheduler, which owns ordering and fairness.
    Native { priority: Priority },
    /// Microtask queue; only chosen for `user-blocking` work.
    Microtask,
    /// Idle-time callback with a hard ceiling.
    Idle { timeout: Duration },
    /// Plain timer.
    Timer { delay: Duration },
    /// No deferral available; the task runs inline.
    Immediate,
}

impl Mechanism {
    pub fn name(&self) -> &'static str {
        match self {
            Mechanism::Native { .. } => "native",
            Mechanism::Microtask => "microtask",
            Mechanism::Idle { .. } => "idle",
            Mechanism::Timer { .. } => "timer",
            Mechanism::Immediate => "immediate",
        }
    }
}

impl fmt::Display for Mechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mechanism::Native { priority } => write!(f, "native({priority})"),
            Mechanism::Idle { timeout } => write!(f, "idle(timeout={}ms)", timeout.as_millis()),
            Mechanism::Timer { delay } => write!(f, "timer(delay={}ms)", delay.as_millis()),
            other => f.write_str(other.name()),
        }
    }
}

/// Picks exactly one mechanism. First match wins:
///
/// 1. native scheduler, if present;
/// 2. microtask queue, for `user-blocking` only;
/// 3. idle callback, bounded by the idle timeout for `priority`;
/// 4. timer, delayed by the timer delay for `priority`;
/// 5. inline execution when the host cannot defer anything.
pub fn select(caps: &CapabilitySnapshot, priority: Priority, delays: &DelayTable) -> Mechanism {
    if caps.native_scheduler {
        Mechanism::Native { priority }
    } else if priority == Priority::UserBlocking && caps.microtask_queue {
        Mechanism::Microtask
    } else if caps.idle_callback {
        Mechanism::Idle {
            timeout: delays.idle_timeout(priority),
        }
    } else if caps.timer {
        Mechanism::Timer {
            delay: delays.timer_delay(priority),
        }
    } else {
        Mechanism::Immediate
    }
}

/// How `pause_task` cedes control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YieldMechanism {
    /// The native scheduler's dedicated yield.
    Yield,
    /// An empty `user-visible` task through the regular chain.
    Post(Mechanism),
}

/// `yield` only counts when it belongs to a native scheduler.
pub fn select_yield(caps: &CapabilitySnapshot, delays: &DelayTable) -> YieldMechanism {
    if caps.native_scheduler && caps.native_yield {
        YieldMechanism::Yield
    } else {
        YieldMechanism::Post(select(caps, Priority::UserVisible, delays))
    }
}
