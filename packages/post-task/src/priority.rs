use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

/// Urgency tier of a deferred task.
///
/// The identifiers are the ones the native Scheduler API expects and are
/// forwarded to it verbatim. Ordering follows urgency, so
/// `Background < UserVisible < UserBlocking`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    Background,
    UserVisible,
    UserBlocking,
}

impl Priority {
    /// All priorities, least urgent first.
    pub const ALL: [Priority; 3] = [
        Priority::Background,
        Priority::UserVisible,
        Priority::UserBlocking,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Priority::Background => "background",
            Priority::UserVisible => "user-visible",
            Priority::UserBlocking => "user-blocking",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "background" => Ok(Priority::Background),
            "user-visible" => Ok(Priority::UserVisible),
            "user-blocking" => Ok(Priority::UserBlocking),
            other => Err(Error::UnknownPriority(other.to_string())),
        }
    }
}

/// One value per priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PriorityMap<T> {
    #[serde(rename = "background")]
    pub background: T,
    #[serde(rename = "user-visible")]
    pub user_visible: T,
    #[serde(rename = "user-blocking")]
    pub user_blocking: T,
}

impl<T> PriorityMap<T> {
    pub const fn new(background: T, user_visible: T, user_blocking: T) -> Self {
        Self {
            background,
            user_visible,
            user_blocking,
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> PriorityMap<U> {
        PriorityMap {
            background: f(self.background),
            user_visible: f(self.user_visible),
            user_blocking: f(self.user_blocking),
        }
    }

    /// Entries least urgent first.
    pub fn iter(&self) -> impl Iterator<Item = (Priority, &T)> {
        Priority::ALL.into_iter().map(move |p| (p, &self[p]))
    }
}

impl<T> Index<Priority> for PriorityMap<T> {
    type Output = T;

    fn index(&self, priority: Priority) -> &T {
        match priority {
            Priority::Background => &self.background,
            Priority::UserVisible => &self.user_visible,
            Priority::UserBlocking => &self.user_blocking,
        }
    }
}

impl<T> IndexMut<Priority> for PriorityMap<T> {
    fn index_mut(&mut self, priority: Priority) -> &mut T {
        match priority {
            Priority::Background => &mut self.background,
            Priority::UserVisible => &mut self.user_visible,
            Priority::UserBlocking => &mut self.user_blocking,
        }
    }
}
