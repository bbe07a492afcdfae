//! Configuration types for the shared DMA engine

use super::error::{ConfigError, ConfigResult};
use crate::internal::constants::{
    CHANNEL_COUNT, DEFAULT_PRIORITY_LEVELS, DEFAULT_RESERVED_CHANNELS, ERRATA_POLL_LIMIT,
};

/// Engine lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// `init` has not run yet
    #[default]
    Uninitialized,
    /// DMAC reset, tables registered, reserved channels configured
    Initialized,
}

/// Shared DMA engine configuration
///
/// Use the `with_*` builders to adjust the defaults:
///
/// ```ignore
/// let config = DmaConfig::new()
///     .with_reserved_channels(2)
///     .with_priority_levels(0b0011);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DmaConfig {
    /// Channels `0..reserved_channels` are configured at init for
    /// continuous users and never handed out by general allocation
    pub reserved_channels: u8,
    /// Route reserved channels' completion to the event system
    pub reserved_event_output: bool,
    /// Priority levels enabled in `CTRL.LVLENx` (bit n enables level n)
    pub priority_levels: u8,
    /// Samples taken by the start-up check before re-kicking channels
    pub errata_poll_limit: u8,
}

impl DmaConfig {
    /// Default configuration: 4 reserved channels with event output,
    /// priority level 0 only, 10 start-up samples.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            reserved_channels: DEFAULT_RESERVED_CHANNELS,
            reserved_event_output: true,
            priority_levels: DEFAULT_PRIORITY_LEVELS,
            errata_poll_limit: ERRATA_POLL_LIMIT,
        }
    }

    /// Set the size of the reserved partition.
    #[must_use]
    pub const fn with_reserved_channels(mut self, count: u8) -> Self {
        self.reserved_channels = count;
        self
    }

    /// Enable or disable event output on reserved channels.
    #[must_use]
    pub const fn with_reserved_event_output(mut self, enabled: bool) -> Self {
        self.reserved_event_output = enabled;
        self
    }

    /// Set the enabled priority levels (low four bits).
    #[must_use]
    pub const fn with_priority_levels(mut self, levels: u8) -> Self {
        self.priority_levels = levels;
        self
    }

    /// Set the number of start-up samples before errata recovery.
    #[must_use]
    pub const fn with_errata_poll_limit(mut self, limit: u8) -> Self {
        self.errata_poll_limit = limit;
        self
    }

    /// Check the configuration against the DMAC's limits.
    ///
    /// A transfer needs two general-purpose channels, so the reserved
    /// partition must leave at least two.
    pub const fn validate(&self) -> ConfigResult<()> {
        if self.reserved_channels as usize + 2 > CHANNEL_COUNT {
            return Err(ConfigError::InvalidConfig);
        }
        if self.priority_levels == 0 || self.priority_levels > 0xF {
            return Err(ConfigError::InvalidConfig);
        }
        if self.errata_poll_limit == 0 {
            return Err(ConfigError::InvalidConfig);
        }
        Ok(())
    }
}

impl Default for DmaConfig {
    fn default() -> Self {
        Self::new()
    }
}
