//! Drain policy for replay sessions

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the scheduler drains buffered documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplayMode {
    /// Drain the whole queue whenever data arrives or a tick fires
    Fullspeed,

    /// Drain at most one document per tick
    #[default]
    Throttled,
}

impl ReplayMode {
    pub fn from_fullspeed(fullspeed: bool) -> Self {
        if fullspeed { ReplayMode::Fullspeed } else { ReplayMode::Throttled }
    }

    pub fn is_fullspeed(self) -> bool {
        matches!(self, ReplayMode::Fullspeed)
    }

    /// Documents drained per tick, `None` meaning the whole queue
    pub fn per_tick_budget(self) -> Option<usize> {
        match self {
            ReplayMode::Fullspeed => None,
            ReplayMode::Throttled => Some(1),
        }
    }

    /// Nominal document rate for a tick interval. Unbounded in fullspeed mode.
    pub fn documents_per_second(self, tick: Duration) -> Option<f64> {
        match self {
            ReplayMode::Fullspeed => None,
            ReplayMode::Throttled if tick.is_zero() => None,
            ReplayMode::Throttled => Some(1.0 / tick.as_secs_f64()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fullspeed_flag_maps_to_mode() {
        assert_eq!(ReplayMode::from_fullspeed(true), ReplayMode::Fullspeed);
        assert_eq!(ReplayMode::from_fullspeed(false), ReplayMode::Throttled);
        assert_eq!(ReplayMode::default(), ReplayMode::Throttled);
    }

    #[test]
    fn throttled_rate_follows_tick() {
        let rate = ReplayMode::Throttled.documents_per_second(Duration::from_millis(50)).unwrap();
        assert!((rate - 20.0).abs() < 1e-9);
        assert_eq!(ReplayMode::Fullspeed.documents_per_second(Duration::from_millis(50)), None);
        assert_eq!(ReplayMode::Throttled.per_tick_budget(), Some(1));
    }
}
