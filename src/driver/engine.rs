//! Shared DMA engine core.
//!
//! This module contains the [`DmaEngine`] structure and its channel-level
//! operations:
//!
//! - Initialization (clock, reset, descriptor tables, reserved channels)
//! - Channel allocation and release
//! - Low-level channel control and status
//!
//! The transfer lifecycle (`start` / `finished` / `close` and the blocking
//! wrappers) lives in the [`lifecycle`](super::lifecycle) module.

use super::config::{DmaConfig, State};
use super::error::{ConfigError, DmaError, Result};
use super::pool::{ChannelId, ChannelPool};
use crate::hal::dmac::{DmacAccess, TransferStatus};
use crate::internal::constants::TRIGSRC_DISABLE;
use crate::internal::descriptor::{Descriptor, DescriptorTable};

// =============================================================================
// DMA Engine
// =============================================================================

/// Shared DMA engine
///
/// Owns the DMAC, its descriptor tables and the channel pool. Peripherals
/// borrow channels from it for the duration of a transfer.
///
/// The DMAC keeps the descriptor table addresses registered by
/// [`init`](Self::init), so the engine must not move afterwards. Place it in
/// a `static` (see [`SharedDma`](crate::sync::SharedDma)). A moved engine
/// refuses to allocate channels or start transfers with
/// [`ConfigError::NotInitialized`].
///
/// # Type Parameters
/// * `H` - DMAC register access, [`Dmac`](crate::hal::Dmac) on hardware
///
/// # Example
/// ```ignore
/// static DMA: SharedDma<Dmac> = SharedDma::new(Dmac::new());
///
/// DMA.with(|dma| dma.init(DmaConfig::default()))?;
/// let mut sercom = Sercom::new(4).unwrap();
/// let sent = DMA.with(|dma| dma.serial_write(&mut sercom, &[0x9F, 0, 0, 0]))?;
/// ```
pub struct DmaEngine<H: DmacAccess> {
    pub(super) table: DescriptorTable,
    pub(super) pool: ChannelPool,
    pub(super) hal: H,
    pub(super) config: DmaConfig,
    pub(super) state: State,
    /// Table addresses handed to `BASEADDR` / `WRBADDR`
    registered: (u32, u32),
}

impl<H: DmacAccess> DmaEngine<H> {
    /// Create an uninitialized engine. Const-compatible for static placement.
    pub const fn new(hal: H) -> Self {
        let config = DmaConfig::new();
        Self {
            table: DescriptorTable::new(),
            pool: ChannelPool::new(config.reserved_channels),
            hal,
            config,
            state: State::Uninitialized,
            registered: (0, 0),
        }
    }

    /// Bring up the DMAC.
    ///
    /// Enables the bus clock, resets the controller, registers the
    /// descriptor tables, enables the configured priority levels and
    /// configures every reserved channel with no trigger. Runs once.
    ///
    /// # Errors
    /// - [`ConfigError::AlreadyInitialized`] on a second call
    /// - [`ConfigError::InvalidConfig`] if `config` fails validation
    pub fn init(&mut self, config: DmaConfig) -> Result<()> {
        if self.state == State::Initialized {
            return Err(ConfigError::AlreadyInitialized.into());
        }
        config.validate()?;

        self.config = config;
        self.pool = ChannelPool::new(config.reserved_channels);
        self.table.reset();

        self.hal.enable_clock();
        self.hal.reset();
        let (descriptors, write_back) = self.table.base_addresses();
        self.hal.set_base_addresses(descriptors, write_back);
        self.registered = (descriptors, write_back);
        self.hal.enable(config.priority_levels);

        for index in 0..config.reserved_channels {
            if let Some(channel) = ChannelId::new(index) {
                self.hal
                    .configure_channel(channel, TRIGSRC_DISABLE, config.reserved_event_output);
            }
        }

        self.state = State::Initialized;

        #[cfg(feature = "defmt")]
        defmt::info!(
            "DMAC up: {} reserved channels, descriptors at {:#010x}",
            config.reserved_channels,
            descriptors
        );

        Ok(())
    }

    /// Whether [`init`](Self::init) has completed.
    #[inline(always)]
    pub fn is_initialized(&self) -> bool {
        self.state == State::Initialized
    }

    /// Current lifecycle state.
    #[inline(always)]
    pub fn state(&self) -> State {
        self.state
    }

    /// Active configuration.
    #[inline(always)]
    pub fn config(&self) -> &DmaConfig {
        &self.config
    }

    /// Channel allocation state.
    #[inline(always)]
    pub fn pool(&self) -> &ChannelPool {
        &self.pool
    }

    /// DMAC register access.
    #[inline(always)]
    pub fn hal(&self) -> &H {
        &self.hal
    }

    /// Mutable DMAC register access.
    #[inline(always)]
    pub fn hal_mut(&mut self) -> &mut H {
        &mut self.hal
    }

    /// Initialized, and the descriptor tables are still where the DMAC
    /// expects them.
    pub(super) fn ensure_initialized(&self) -> Result<()> {
        if self.state != State::Initialized {
            return Err(ConfigError::NotInitialized.into());
        }
        if self.table.base_addresses() != self.registered {
            #[cfg(feature = "log")]
            log::warn!("DMA engine moved after init, descriptor tables are stale");
            #[cfg(feature = "defmt")]
            defmt::warn!("DMA engine moved after init");
            return Err(ConfigError::NotInitialized.into());
        }
        Ok(())
    }

    // =========================================================================
    // Channel allocation
    // =========================================================================

    /// Allocate the lowest free channel from the reserved or general partition.
    ///
    /// # Errors
    /// - [`ConfigError::NotInitialized`] before [`init`](Self::init)
    /// - [`DmaError::NoChannelAvailable`] when the partition is exhausted
    pub fn allocate_channel(&mut self, reserved: bool) -> Result<ChannelId> {
        self.ensure_initialized()?;
        match self.pool.allocate(reserved) {
            Ok(channel) => Ok(channel),
            Err(e) => {
                #[cfg(feature = "defmt")]
                defmt::debug!("no free DMA channel (reserved: {})", reserved);
                Err(e.into())
            }
        }
    }

    /// Disable a channel and return it to the pool. `None` is a no-op.
    ///
    /// # Errors
    /// [`DmaError::ChannelNotAllocated`] if the channel is already free.
    pub fn free_channel(&mut self, channel: Option<ChannelId>) -> Result<()> {
        let Some(channel) = channel else {
            return Ok(());
        };
        if !self.pool.is_allocated(channel) {
            return Err(DmaError::ChannelNotAllocated.into());
        }
        self.hal.disable_channel(channel);
        self.pool.free(channel)?;
        Ok(())
    }

    /// Free a channel on a path that has no way to report the failure.
    pub(super) fn release(&mut self, channel: Option<ChannelId>) {
        if let Err(_e) = self.free_channel(channel) {
            #[cfg(feature = "log")]
            log::warn!("releasing DMA channel failed: {}", _e);
        }
    }

    // =========================================================================
    // Channel control
    // =========================================================================

    /// Reset a channel and route `trigger` to it.
    pub fn configure_channel(&mut self, channel: ChannelId, trigger: u8, output_event: bool) {
        self.hal.configure_channel(channel, trigger, output_event);
    }

    /// Enable a channel, starting its descriptor.
    pub fn enable_channel(&mut self, channel: ChannelId) {
        self.hal.enable_channel(channel);
    }

    /// Disable a channel.
    pub fn disable_channel(&mut self, channel: ChannelId) {
        self.hal.disable_channel(channel);
    }

    /// Suspend a channel after its current beat.
    pub fn suspend_channel(&mut self, channel: ChannelId) {
        self.hal.suspend_channel(channel);
    }

    /// Resume a suspended channel.
    pub fn resume_channel(&mut self, channel: ChannelId) {
        self.hal.resume_channel(channel);
    }

    /// Whether a channel is enabled.
    pub fn is_channel_enabled(&self, channel: ChannelId) -> bool {
        self.hal.is_channel_enabled(channel)
    }

    /// Whether a channel is neither pending nor busy.
    pub fn is_channel_idle(&self, channel: ChannelId) -> bool {
        self.hal.is_channel_idle(channel)
    }

    /// Interrupt flags of a channel.
    pub fn transfer_status(&self, channel: ChannelId) -> TransferStatus {
        self.hal.transfer_status(channel)
    }

    /// Active descriptor of a channel.
    ///
    /// # Errors
    /// [`DmaError::InvalidChannel`] for a channel outside the table.
    pub fn descriptor(&self, channel: ChannelId) -> Result<&Descriptor> {
        Ok(self.table.descriptor(channel)?)
    }

    /// Write-back descriptor of a channel, as last stored by the DMAC.
    ///
    /// # Errors
    /// [`DmaError::InvalidChannel`] for a channel outside the table.
    pub fn write_back_descriptor(&self, channel: ChannelId) -> Result<&Descriptor> {
        Ok(self.table.write_back(channel)?)
    }
}
