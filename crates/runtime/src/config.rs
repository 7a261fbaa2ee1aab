//! Runtime configuration and environment loading.
use std::env;
use std::str::FromStr;
use std::time::Duration;

use game_core::{StackPolicy, StackingRules};

/// Runtime configuration shared by every map and zone worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Delay between two zone ticks.
    pub tick_interval: Duration,
    /// Replaces the tile layout's zone count (testing only).
    pub zone_count_override: Option<usize>,
    /// Policy for re-applying a non-stackable option, per category.
    pub stacking: StackingRules,
    pub command_buffer_size: usize,
    pub event_buffer_size: usize,
}

impl RuntimeConfig {
    pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `ZONE_TICK_INTERVAL_MS` - Milliseconds between zone ticks (default: 100)
    /// - `ZONE_COUNT_OVERRIDE` - Force every map to this many zones (default: unset)
    /// - `OPTION_BUFF_POLICY` - `refresh` or `reject` (default: refresh)
    /// - `OPTION_DEBUFF_POLICY` - `refresh` or `reject` (default: refresh)
    /// - `ZONE_COMMAND_BUFFER` - Per-zone command queue size (default: 64)
    /// - `EVENT_BUFFER` - Per-topic event buffer size (default: 256)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(ms) = read_env::<u64>("ZONE_TICK_INTERVAL_MS") {
            config.tick_interval = Duration::from_millis(ms.max(1));
        }

        config.zone_count_override = read_env::<usize>("ZONE_COUNT_OVERRIDE");

        if let Some(policy) = read_env::<StackPolicy>("OPTION_BUFF_POLICY") {
            config.stacking.buff = policy;
        }
        if let Some(policy) = read_env::<StackPolicy>("OPTION_DEBUFF_POLICY") {
            config.stacking.debuff = policy;
        }

        if let Some(capacity) = read_env::<usize>("ZONE_COMMAND_BUFFER") {
            config.command_buffer_size = capacity.max(1);
        }
        if let Some(capacity) = read_env::<usize>("EVENT_BUFFER") {
            config.event_buffer_size = capacity.max(1);
        }

        config
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    pub fn with_stacking(mut self, stacking: StackingRules) -> Self {
        self.stacking = stacking;
        self
    }

    pub fn with_zone_count_override(mut self, zone_count: usize) -> Self {
        self.zone_count_override = Some(zone_count);
        self
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_interval: Self::DEFAULT_TICK_INTERVAL,
            zone_count_override: None,
            stacking: StackingRules::default(),
            command_buffer_size: 64,
            event_buffer_size: 256,
        }
    }
}

fn read_env<T: FromStr>(key: &str) -> Option<T> {
    let value = env::var(key).ok()?;
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!(key, value = %value, "ignoring unparsable environment variable");
            None
        }
    }
}
