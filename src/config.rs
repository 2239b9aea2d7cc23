use std::time::Duration;

use thiserror::Error;

use crate::constants::{
    BOTTOM_MARGIN, CHECK_INTERVAL, EVENT_ITEM_MARGIN, EVICT_INTERVAL, MAX_LIVE_TIME,
    STACK_MAX_SIZE, STICKY_LABELS, TERMINAL_GAP, TERMINAL_MARGIN,
};

/// Upper bound accepted for the stack size. The pool allocates one surface per
/// row, so this also bounds the number of surfaces created at startup.
pub const STACK_SIZE_LIMIT: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("stack size must be between 1 and {limit}, got {0}", limit = STACK_SIZE_LIMIT)]
    StackSize(usize),
    #[error("{name} must be greater than zero")]
    ZeroDuration { name: &'static str },
    #[error("refresh interval ({refresh:?}) must be shorter than the live time ({live:?})")]
    RefreshTooSlow { refresh: Duration, live: Duration },
}

/// Runtime configuration for the chord engine and its timers.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayConfig {
    /// Cap on live cards and size of the surface pool.
    pub stack_max_size: usize,
    /// Idle time after which a card is evicted.
    pub max_live_time: Duration,
    /// Period of the refresh/reconcile timer.
    pub refresh_interval: Duration,
    /// Period of the eviction-only timer.
    pub evict_interval: Duration,
    /// Distance from the right and bottom monitor edges.
    pub margin: u32,
    /// Vertical gap between stacked cards.
    pub gap: u32,
    /// Labels that keep the newest card alive while held.
    pub sticky_labels: Vec<String>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            stack_max_size: STACK_MAX_SIZE,
            max_live_time: MAX_LIVE_TIME,
            refresh_interval: CHECK_INTERVAL,
            evict_interval: EVICT_INTERVAL,
            margin: BOTTOM_MARGIN,
            gap: EVENT_ITEM_MARGIN,
            sticky_labels: STICKY_LABELS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl OverlayConfig {
    /// Defaults with edge distances measured in terminal cells.
    pub fn for_terminal() -> Self {
        Self {
            margin: TERMINAL_MARGIN,
            gap: TERMINAL_GAP,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=STACK_SIZE_LIMIT).contains(&self.stack_max_size) {
            return Err(ConfigError::StackSize(self.stack_max_size));
        }
        for (name, value) in [
            ("max live time", self.max_live_time),
            ("refresh interval", self.refresh_interval),
            ("evict interval", self.evict_interval),
        ] {
            if value.is_zero() {
                return Err(ConfigError::ZeroDuration { name });
            }
        }
        if self.refresh_interval >= self.max_live_time {
            return Err(ConfigError::RefreshTooSlow {
                refresh: self.refresh_interval,
                live: self.max_live_time,
            });
        }
        Ok(())
    }
}
