//! Defer work to a later turn of the host's event loop at one of three
//! priorities, using the best scheduling primitive the host offers.
//!
//! Hosts describe what they can do through the [`Host`] trait. Each call to
//! [`post_task`] takes a fresh [`CapabilitySnapshot`], picks one
//! [`Mechanism`] and returns a [`CompletionHandle`] that resolves once the
//! task has run.

pub mod capability;
pub mod completion;
pub mod delay;
pub mod error;
pub mod post;
pub mod priority;
pub mod selector;

pub use capability::{Batch, CapabilitySnapshot, Host, Task};
pub use completion::{Completer, CompletionHandle, completion};
pub use delay::DelayTable;
pub use error::{Error, Result};
pub use post::{TaskScheduler, pause_task, post_task};
pub use priority::{Priority, PriorityMap};
pub use selector::{Mechanism, YieldMechanism, select, select_yield};
