//! An in-process host for `post-task`.
//!
//! [`LocalHost`] implements every scheduling primitive on top of plain
//! queues and a virtual clock, and can switch each primitive on or off at
//! runtime through a [`Profile`]. It is deterministic, which makes it the
//! host of choice for tests, benchmarks and simulations.

pub mod host;
pub mod profile;
pub mod queue;

pub use host::LocalHost;
pub use profile::Profile;
pub use queue::{DeadlineQueue, TaskQueue};
