use crate::error::{Error, Result};
use crate::priority::{Priority, PriorityMap};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-priority durations used by the idle-callback and timer fallbacks.
///
/// `idle_timeouts` is the hard ceiling handed to an idle callback: the task
/// runs in spare time but never later than this. `timer_delays` is the
/// minimum delay handed to a plain timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DelayTableConfig", into = "DelayTableConfig")]
pub struct DelayTable {
    pub idle_timeouts: PriorityMap<Duration>,
    pub timer_delays: PriorityMap<Duration>,
}

impl DelayTable {
    pub const DEFAULT: DelayTable = DelayTable {
        idle_timeouts: PriorityMap::new(
            Duration::from_millis(1000),
            Duration::from_millis(100),
            Duration::from_millis(50),
        ),
        timer_delays: PriorityMap::new(
            Duration::from_millis(150),
            Duration::ZERO,
            Duration::ZERO,
        ),
    };

    pub fn idle_timeout(&self, priority: Priority) -> Duration {
        self.idle_timeouts[priority]
    }

    pub fn timer_delay(&self, priority: Priority) -> Duration {
        self.timer_delays[priority]
    }

    /// Checks that a less urgent priority never waits less than a more urgent one.
    pub fn validate(&self) -> Result<()> {
        check_monotonic("idle", &self.idle_timeouts)?;
        check_monotonic("timer", &self.timer_delays)
    }

    /// Parses a JSON table with millisecond values. Omitted tables keep
    /// their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: DelayTableConfig =
            serde_json::from_str(json).map_err(|e| Error::InvalidDelayTable(e.to_string()))?;
        DelayTable::try_from(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::InvalidDelayTable(e.to_string()))
    }
}

impl Default for DelayTable {
    fn default() -> Self {
        Self::DEFAULT
    }
}

fn check_monotonic(delays: &'static str, map: &PriorityMap<Duration>) -> Result<()> {
    let entries: Vec<_> = map.iter().collect();
    for pair in entries.windows(2) {
        let (less, less_delay) = pair[0];
        let (more, more_delay) = pair[1];
        if less_delay < more_delay {
            return Err(Error::NonMonotonicDelays {
                delays,
                less: less.as_str(),
                less_ms: less_delay.as_millis(),
                more: more.as_str(),
                more_ms: more_delay.as_millis(),
            });
        }
    }
    Ok(())
}

/// On-disk shape of a [`DelayTable`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct DelayTableConfig {
    #[serde(default = "default_idle_ms")]
    idle_timeouts_ms: PriorityMap<u64>,
    #[serde(default = "default_timer_ms")]
    timer_delays_ms: PriorityMap<u64>,
}

fn to_millis(map: PriorityMap<Duration>) -> PriorityMap<u64> {
    map.map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

fn default_idle_ms() -> PriorityMap<u64> {
    to_millis(DelayTable::DEFAULT.idle_timeouts)
}

fn default_timer_ms() -> PriorityMap<u64> {
    to_millis(DelayTable::DEFAULT.timer_delays)
}

impl TryFrom<DelayTableConfig> for DelayTable {
    type Error = Error;

    fn try_from(config: DelayTableConfig) -> Result<Self> {
        let table = DelayTable {
            idle_timeouts: config.idle_timeouts_ms.map(Duration::from_millis),
            timer_delays: config.timer_delays_ms.map(Duration::from_millis),
        };
        table.validate()?;
        Ok(table)
    }
}

impl From<DelayTable> for DelayTableConfig {
    fn from(table: DelayTable) -> Self {
        Self {
            idle_timeouts_ms: to_millis(table.idle_timeouts),
            timer_delays_ms: to_millis(table.timer_delays),
        }
    }
}
