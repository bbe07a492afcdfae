//! DMAC register access
//!
//! [`DmacAccess`] is the small set of controller operations the engine
//! needs. [`Dmac`] implements it on the real registers; tests substitute a
//! simulated controller.

use core::sync::atomic::{Ordering, fence};

use crate::driver::pool::ChannelId;
use crate::internal::descriptor::Descriptor;
use crate::internal::register::dmac::{
    DMAC_CHINTFLAG_SUSP, DMAC_CHINTFLAG_TCMPL, DMAC_CHINTFLAG_TERR, DMAC_CHSTATUS_BUSY,
    DMAC_CHSTATUS_PEND, DMAC_CHCTRLA_ENABLE, DMAC_CHCTRLA_SWRST, DMAC_CHCTRLB_CMD_RESUME,
    DMAC_CHCTRLB_CMD_SHIFT, DMAC_CHCTRLB_CMD_SUSPEND, DMAC_CTRL_DMAENABLE,
    DMAC_CTRL_LVLEN_MASK, DMAC_CTRL_LVLEN_SHIFT, DmacClock, DmacRegs,
};

#[cfg(feature = "samd21")]
use crate::internal::register::dmac::{
    DMAC_CHCTRLB_EVOE, DMAC_CHCTRLB_TRIGACT_BEAT, DMAC_CHCTRLB_TRIGSRC_MASK,
    DMAC_CHCTRLB_TRIGSRC_SHIFT,
};
#[cfg(feature = "samd51")]
use crate::internal::register::dmac::{
    DMAC_CHCTRLA_BURSTLEN_SINGLE, DMAC_CHCTRLA_TRIGACT_BURST, DMAC_CHCTRLA_TRIGSRC_MASK,
    DMAC_CHCTRLA_TRIGSRC_SHIFT, DMAC_CHEVCTRL_EVOE,
};

// =============================================================================
// Channel transfer status
// =============================================================================

/// Snapshot of a channel's interrupt flags (`CHINTFLAG`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransferStatus(pub u8);

impl TransferStatus {
    /// Both terminal bits (error, complete)
    pub const TERMINAL_MASK: u8 = DMAC_CHINTFLAG_TERR | DMAC_CHINTFLAG_TCMPL;

    /// Status reported after a successful transfer
    pub const COMPLETE: Self = Self(DMAC_CHINTFLAG_TCMPL);

    /// Status reported after a bus or descriptor error
    pub const ERROR: Self = Self(DMAC_CHINTFLAG_TERR);

    /// Transfer has concluded, successfully or not.
    #[inline(always)]
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        (self.0 & Self::TERMINAL_MASK) != 0
    }

    /// Transfer concluded with exactly "transfer complete" and nothing else.
    #[inline(always)]
    #[must_use]
    pub const fn is_complete(self) -> bool {
        self.0 == DMAC_CHINTFLAG_TCMPL
    }

    /// Transfer error flag set.
    #[inline(always)]
    #[must_use]
    pub const fn is_error(self) -> bool {
        (self.0 & DMAC_CHINTFLAG_TERR) != 0
    }

    /// Channel suspended.
    #[inline(always)]
    #[must_use]
    pub const fn is_suspended(self) -> bool {
        (self.0 & DMAC_CHINTFLAG_SUSP) != 0
    }
}

// =============================================================================
// DMAC access trait
// =============================================================================

/// Stops channels on behalf of a transfer handle that no longer has the
/// engine at hand.
pub trait ChannelHalt {
    /// Disable a channel.
    fn halt(&self, channel: ChannelId);
}

/// Controller-level operations used by the transfer engine.
///
/// Read methods take `&self`; implementations with observable side effects
/// (simulators) use interior mutability.
pub trait DmacAccess {
    /// Handle carried by each [`Transfer`](crate::driver::Transfer) so that
    /// dropping it disables the transfer's channels.
    type Halt: ChannelHalt;

    /// Create a halt handle for a new transfer.
    fn halt_handle(&self) -> Self::Halt;

    /// Enable the DMAC bus clock(s).
    fn enable_clock(&mut self);

    /// Software-reset the whole controller.
    fn reset(&mut self);

    /// Register the descriptor and write-back table addresses.
    fn set_base_addresses(&mut self, descriptors: u32, write_back: u32);

    /// Enable the controller with the given priority levels (bit n = level n).
    fn enable(&mut self, priority_levels: u8);

    /// Reset one channel and set its trigger source.
    fn configure_channel(&mut self, channel: ChannelId, trigger: u8, output_event: bool);

    /// Called after a descriptor's VALID bit has been set, before the
    /// channel is enabled.
    fn descriptor_ready(&mut self, channel: ChannelId, descriptor: &Descriptor);

    /// Enable a channel, clearing stale interrupt flags first.
    fn enable_channel(&mut self, channel: ChannelId);

    /// Disable a channel.
    fn disable_channel(&mut self, channel: ChannelId);

    /// Whether the channel's ENABLE bit is set.
    fn is_channel_enabled(&self, channel: ChannelId) -> bool;

    /// Suspend a running channel.
    fn suspend_channel(&mut self, channel: ChannelId);

    /// Resume a suspended channel.
    fn resume_channel(&mut self, channel: ChannelId);

    /// Issue a software trigger on a channel.
    fn software_trigger(&mut self, channel: ChannelId);

    /// Read the channel's interrupt flags.
    fn transfer_status(&self, channel: ChannelId) -> TransferStatus;

    /// Whether the channel is neither pending nor busy (`CHSTATUS`).
    fn is_channel_idle(&self, channel: ChannelId) -> bool;

    /// Whether the controller is servicing any channel (`ACTIVE.ABUSY`).
    fn is_any_busy(&self) -> bool;
}

// =============================================================================
// Register backend
// =============================================================================

/// DMAC register backend.
///
/// Zero-sized handle over the fixed DMAC register block. Only one should
/// exist; the engine owns it.
#[derive(Debug, Default)]
pub struct Dmac {
    _private: (),
}

impl Dmac {
    /// Create the register handle.
    pub const fn new() -> Self {
        Self { _private: () }
    }
}

/// The SAMD21 channel window is selected through CHID, so every channel
/// access pair must not be interleaved with another one.
#[cfg(feature = "samd21")]
#[inline(always)]
fn channel_access<R>(f: impl FnOnce() -> R) -> R {
    critical_section::with(|_| f())
}

#[cfg(feature = "samd51")]
#[inline(always)]
fn channel_access<R>(f: impl FnOnce() -> R) -> R {
    f()
}

fn disable(channel: ChannelId) {
    let ch = channel.number();
    channel_access(|| {
        DmacRegs::set_channel_ctrl_a(ch, DmacRegs::channel_ctrl_a(ch) & !DMAC_CHCTRLA_ENABLE);
    });
}

/// Halt handle for the register backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct DmacHalt {
    _private: (),
}

impl ChannelHalt for DmacHalt {
    fn halt(&self, channel: ChannelId) {
        disable(channel);
    }
}

impl DmacAccess for Dmac {
    type Halt = DmacHalt;

    fn halt_handle(&self) -> DmacHalt {
        DmacHalt { _private: () }
    }

    fn enable_clock(&mut self) {
        DmacClock::enable();
    }

    fn reset(&mut self) {
        DmacRegs::software_reset();
    }

    fn set_base_addresses(&mut self, descriptors: u32, write_back: u32) {
        DmacRegs::set_base_addr(descriptors);
        DmacRegs::set_write_back_addr(write_back);
    }

    fn enable(&mut self, priority_levels: u8) {
        let levels = ((priority_levels as u16) << DMAC_CTRL_LVLEN_SHIFT) & DMAC_CTRL_LVLEN_MASK;
        DmacRegs::set_ctrl(DMAC_CTRL_DMAENABLE | levels);
    }

    #[cfg(feature = "samd51")]
    fn configure_channel(&mut self, channel: ChannelId, trigger: u8, output_event: bool) {
        let ch = channel.number();
        DmacRegs::set_channel_ctrl_a(ch, DmacRegs::channel_ctrl_a(ch) & !DMAC_CHCTRLA_ENABLE);
        DmacRegs::set_channel_ctrl_a(ch, DMAC_CHCTRLA_SWRST);
        while DmacRegs::channel_ctrl_a(ch) & DMAC_CHCTRLA_SWRST != 0 {}

        if output_event {
            DmacRegs::set_channel_event_ctrl(ch, DMAC_CHEVCTRL_EVOE);
        }
        DmacRegs::set_channel_ctrl_a(
            ch,
            (((trigger as u32) << DMAC_CHCTRLA_TRIGSRC_SHIFT) & DMAC_CHCTRLA_TRIGSRC_MASK)
                | DMAC_CHCTRLA_TRIGACT_BURST
                | DMAC_CHCTRLA_BURSTLEN_SINGLE,
        );
    }

    #[cfg(feature = "samd21")]
    fn configure_channel(&mut self, channel: ChannelId, trigger: u8, output_event: bool) {
        let ch = channel.number();
        channel_access(|| {
            DmacRegs::set_channel_ctrl_a(ch, DmacRegs::channel_ctrl_a(ch) & !DMAC_CHCTRLA_ENABLE);
            DmacRegs::set_channel_ctrl_a(ch, DMAC_CHCTRLA_SWRST);
            while DmacRegs::channel_ctrl_a(ch) & DMAC_CHCTRLA_SWRST != 0 {}
            DmacRegs::clear_trigger(ch);

            let mut ctrl_b = (((trigger as u32) << DMAC_CHCTRLB_TRIGSRC_SHIFT)
                & DMAC_CHCTRLB_TRIGSRC_MASK)
                | DMAC_CHCTRLB_TRIGACT_BEAT;
            if output_event {
                ctrl_b |= DMAC_CHCTRLB_EVOE;
            }
            DmacRegs::set_channel_ctrl_b(ch, ctrl_b);
        });
    }

    fn descriptor_ready(&mut self, _channel: ChannelId, _descriptor: &Descriptor) {
        // Descriptor writes must land in SRAM before the DMAC can fetch them
        fence(Ordering::SeqCst);
    }

    fn enable_channel(&mut self, channel: ChannelId) {
        let ch = channel.number();
        channel_access(|| {
            DmacRegs::clear_channel_int_flag(
                ch,
                DMAC_CHINTFLAG_TERR | DMAC_CHINTFLAG_TCMPL | DMAC_CHINTFLAG_SUSP,
            );
            DmacRegs::set_channel_ctrl_a(ch, DmacRegs::channel_ctrl_a(ch) | DMAC_CHCTRLA_ENABLE);
        });
    }

    fn disable_channel(&mut self, channel: ChannelId) {
        disable(channel);
    }

    fn is_channel_enabled(&self, channel: ChannelId) -> bool {
        let ch = channel.number();
        channel_access(|| DmacRegs::channel_ctrl_a(ch) & DMAC_CHCTRLA_ENABLE != 0)
    }

    fn suspend_channel(&mut self, channel: ChannelId) {
        let ch = channel.number();
        channel_access(|| {
            let ctrl_b = DmacRegs::channel_ctrl_b(ch) & !(0x3 << DMAC_CHCTRLB_CMD_SHIFT);
            DmacRegs::set_channel_ctrl_b(
                ch,
                ctrl_b | (DMAC_CHCTRLB_CMD_SUSPEND << DMAC_CHCTRLB_CMD_SHIFT),
            );
        });
    }

    fn resume_channel(&mut self, channel: ChannelId) {
        let ch = channel.number();
        channel_access(|| {
            let ctrl_b = DmacRegs::channel_ctrl_b(ch) & !(0x3 << DMAC_CHCTRLB_CMD_SHIFT);
            DmacRegs::set_channel_ctrl_b(
                ch,
                ctrl_b | (DMAC_CHCTRLB_CMD_RESUME << DMAC_CHCTRLB_CMD_SHIFT),
            );
        });
    }

    fn software_trigger(&mut self, channel: ChannelId) {
        DmacRegs::trigger(channel.number());
    }

    fn transfer_status(&self, channel: ChannelId) -> TransferStatus {
        let ch = channel.number();
        TransferStatus(channel_access(|| DmacRegs::channel_int_flag(ch)))
    }

    fn is_channel_idle(&self, channel: ChannelId) -> bool {
        let ch = channel.number();
        let status = channel_access(|| DmacRegs::channel_status(ch));
        status & (DMAC_CHSTATUS_PEND | DMAC_CHSTATUS_BUSY) == 0
    }

    fn is_any_busy(&self) -> bool {
        DmacRegs::is_any_busy()
    }
}
