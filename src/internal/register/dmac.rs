//! DMAC (Direct Memory Access Controller) Register Definitions
//!
//! The DMAC moves data between memory and peripherals using per-channel
//! descriptors stored in SRAM. The SAMD21 exposes channel registers through a
//! channel-select window (`CHID`); the SAMD51 has one register block per channel.

#![allow(dead_code)]

use super::{
    DMAC_BASE, read_reg, read_reg8, read_reg16, reg_bit_ops, reg_ro, reg_rw, write_reg,
    write_reg8, write_reg16,
};

// =============================================================================
// Register Offsets (common)
// =============================================================================

/// Control register offset (16-bit)
pub const DMAC_CTRL_OFFSET: usize = 0x00;
/// Software Trigger Control register offset
pub const DMAC_SWTRIGCTRL_OFFSET: usize = 0x10;
/// Priority Control 0 register offset
pub const DMAC_PRICTRL0_OFFSET: usize = 0x14;
/// Channel Busy register offset (read-only)
pub const DMAC_BUSYCH_OFFSET: usize = 0x28;
/// Channel Pending register offset (read-only)
pub const DMAC_PENDCH_OFFSET: usize = 0x2C;
/// Active Channel and Levels register offset (read-only)
pub const DMAC_ACTIVE_OFFSET: usize = 0x30;
/// Descriptor Memory Section Base Address register offset
pub const DMAC_BASEADDR_OFFSET: usize = 0x34;
/// Write-Back Memory Section Base Address register offset
pub const DMAC_WRBADDR_OFFSET: usize = 0x38;

// =============================================================================
// Register Offsets (SAMD21 channel window)
// =============================================================================

/// Channel ID register offset (8-bit), selects the channel window
#[cfg(feature = "samd21")]
pub const DMAC_CHID_OFFSET: usize = 0x3F;
/// Channel Control A register offset (8-bit)
#[cfg(feature = "samd21")]
pub const DMAC_CHCTRLA_OFFSET: usize = 0x40;
/// Channel Control B register offset (32-bit)
#[cfg(feature = "samd21")]
pub const DMAC_CHCTRLB_OFFSET: usize = 0x44;
/// Channel Interrupt Flag Status and Clear register offset (8-bit)
#[cfg(feature = "samd21")]
pub const DMAC_CHINTFLAG_OFFSET: usize = 0x4E;
/// Channel Status register offset (8-bit)
#[cfg(feature = "samd21")]
pub const DMAC_CHSTATUS_OFFSET: usize = 0x4F;

// =============================================================================
// Register Offsets (SAMD51 per-channel blocks)
// =============================================================================

/// Offset of channel 0's register block
#[cfg(feature = "samd51")]
pub const DMAC_CHANNEL_OFFSET: usize = 0x40;
/// Stride between channel register blocks
#[cfg(feature = "samd51")]
pub const DMAC_CHANNEL_STRIDE: usize = 0x10;
/// Channel Control A register offset within a channel block (32-bit)
#[cfg(feature = "samd51")]
pub const CH_CHCTRLA_OFFSET: usize = 0x00;
/// Channel Control B register offset within a channel block (8-bit)
#[cfg(feature = "samd51")]
pub const CH_CHCTRLB_OFFSET: usize = 0x04;
/// Channel Event Control register offset within a channel block (8-bit)
#[cfg(feature = "samd51")]
pub const CH_CHEVCTRL_OFFSET: usize = 0x06;
/// Channel Interrupt Flag Status and Clear offset within a channel block (8-bit)
#[cfg(feature = "samd51")]
pub const CH_CHINTFLAG_OFFSET: usize = 0x0E;
/// Channel Status register offset within a channel block (8-bit)
#[cfg(feature = "samd51")]
pub const CH_CHSTATUS_OFFSET: usize = 0x0F;

// =============================================================================
// Control Register (CTRL) Bits
// =============================================================================

/// Software Reset
pub const DMAC_CTRL_SWRST: u16 = 1 << 0;
/// DMA Enable
pub const DMAC_CTRL_DMAENABLE: u16 = 1 << 1;
/// Priority level enable shift (LVLEN0..LVLEN3)
pub const DMAC_CTRL_LVLEN_SHIFT: u16 = 8;
/// Priority level enable mask
pub const DMAC_CTRL_LVLEN_MASK: u16 = 0xF << 8;

// =============================================================================
// Active Register (ACTIVE) Bits
// =============================================================================

/// Active Channel Busy: a channel is currently being serviced
pub const DMAC_ACTIVE_ABUSY: u32 = 1 << 15;

// =============================================================================
// Channel Control A (CHCTRLA) Bits
// =============================================================================

/// Channel Software Reset
pub const DMAC_CHCTRLA_SWRST: u32 = 1 << 0;
/// Channel Enable
pub const DMAC_CHCTRLA_ENABLE: u32 = 1 << 1;
/// Trigger Source shift (SAMD51, in CHCTRLA)
#[cfg(feature = "samd51")]
pub const DMAC_CHCTRLA_TRIGSRC_SHIFT: u32 = 8;
/// Trigger Source mask (SAMD51, 7 bits)
#[cfg(feature = "samd51")]
pub const DMAC_CHCTRLA_TRIGSRC_MASK: u32 = 0x7F << 8;
/// Trigger Action: one burst per trigger (SAMD51)
#[cfg(feature = "samd51")]
pub const DMAC_CHCTRLA_TRIGACT_BURST: u32 = 0x2 << 20;
/// Burst Length: single beat (SAMD51)
#[cfg(feature = "samd51")]
pub const DMAC_CHCTRLA_BURSTLEN_SINGLE: u32 = 0x0 << 24;

// =============================================================================
// Channel Control B (CHCTRLB) Bits
// =============================================================================

/// Event Output Enable (SAMD21, in CHCTRLB)
#[cfg(feature = "samd21")]
pub const DMAC_CHCTRLB_EVOE: u32 = 1 << 4;
/// Trigger Source shift (SAMD21, in CHCTRLB)
#[cfg(feature = "samd21")]
pub const DMAC_CHCTRLB_TRIGSRC_SHIFT: u32 = 8;
/// Trigger Source mask (SAMD21, 6 bits)
#[cfg(feature = "samd21")]
pub const DMAC_CHCTRLB_TRIGSRC_MASK: u32 = 0x3F << 8;
/// Trigger Action: one beat per trigger (SAMD21)
#[cfg(feature = "samd21")]
pub const DMAC_CHCTRLB_TRIGACT_BEAT: u32 = 0x2 << 22;
/// Software command shift (SAMD21)
#[cfg(feature = "samd21")]
pub const DMAC_CHCTRLB_CMD_SHIFT: u32 = 24;
/// Software command shift (SAMD51)
#[cfg(feature = "samd51")]
pub const DMAC_CHCTRLB_CMD_SHIFT: u32 = 0;
/// Software command: suspend
pub const DMAC_CHCTRLB_CMD_SUSPEND: u32 = 0x1;
/// Software command: resume
pub const DMAC_CHCTRLB_CMD_RESUME: u32 = 0x2;

/// Event Output Enable (SAMD51, in CHEVCTRL)
#[cfg(feature = "samd51")]
pub const DMAC_CHEVCTRL_EVOE: u8 = 1 << 7;

// =============================================================================
// Channel Interrupt Flag (CHINTFLAG) and Status (CHSTATUS) Bits
// =============================================================================

/// Transfer Error
pub const DMAC_CHINTFLAG_TERR: u8 = 1 << 0;
/// Transfer Complete
pub const DMAC_CHINTFLAG_TCMPL: u8 = 1 << 1;
/// Channel Suspend
pub const DMAC_CHINTFLAG_SUSP: u8 = 1 << 2;

/// Channel Pending
pub const DMAC_CHSTATUS_PEND: u8 = 1 << 0;
/// Channel Busy
pub const DMAC_CHSTATUS_BUSY: u8 = 1 << 1;
/// Fetch Error
pub const DMAC_CHSTATUS_FERR: u8 = 1 << 2;

// =============================================================================
// DMAC Register Access Functions
// =============================================================================

/// DMAC register block for type-safe access
pub struct DmacRegs;

impl DmacRegs {
    /// Get the base address
    #[inline(always)]
    pub const fn base() -> usize {
        DMAC_BASE
    }

    // -------------------------------------------------------------------------
    // Register accessors (generated by macros)
    // -------------------------------------------------------------------------

    reg_rw!(base_addr, set_base_addr, DMAC_BASE, DMAC_BASEADDR_OFFSET, "Descriptor Base Address register");
    reg_rw!(write_back_addr, set_write_back_addr, DMAC_BASE, DMAC_WRBADDR_OFFSET, "Write-Back Base Address register");
    reg_rw!(sw_trigger, set_sw_trigger, DMAC_BASE, DMAC_SWTRIGCTRL_OFFSET, "Software Trigger Control register");
    reg_rw!(priority_control, set_priority_control, DMAC_BASE, DMAC_PRICTRL0_OFFSET, "Priority Control 0 register");

    reg_ro!(active, DMAC_BASE, DMAC_ACTIVE_OFFSET, "Active Channel and Levels register");
    reg_ro!(busy_channels, DMAC_BASE, DMAC_BUSYCH_OFFSET, "Busy Channels register");
    reg_ro!(pending_channels, DMAC_BASE, DMAC_PENDCH_OFFSET, "Pending Channels register");

    // -------------------------------------------------------------------------
    // Control register (16-bit)
    // -------------------------------------------------------------------------

    /// Read the Control register
    #[inline(always)]
    pub fn ctrl() -> u16 {
        unsafe { read_reg16(DMAC_BASE + DMAC_CTRL_OFFSET) }
    }

    /// Write the Control register
    #[inline(always)]
    pub fn set_ctrl(value: u16) {
        unsafe { write_reg16(DMAC_BASE + DMAC_CTRL_OFFSET, value) }
    }

    /// Issue a software reset and wait for the controller to clear it.
    ///
    /// The DMAC must be disabled (`DMAENABLE` clear) for the reset to take effect.
    pub fn software_reset() {
        Self::set_ctrl(Self::ctrl() & !DMAC_CTRL_DMAENABLE);
        Self::set_ctrl(DMAC_CTRL_SWRST);
        while Self::ctrl() & DMAC_CTRL_SWRST != 0 {}
    }

    /// Check whether any channel is currently being serviced.
    #[inline(always)]
    pub fn is_any_busy() -> bool {
        (Self::active() & DMAC_ACTIVE_ABUSY) != 0
    }

    /// Issue a software trigger on one channel.
    #[inline(always)]
    pub fn trigger(channel: u8) {
        unsafe { super::set_bits(DMAC_BASE + DMAC_SWTRIGCTRL_OFFSET, 1 << channel) }
    }

    /// Clear a pending software trigger on one channel.
    #[inline(always)]
    pub fn clear_trigger(channel: u8) {
        unsafe { super::clear_bits(DMAC_BASE + DMAC_SWTRIGCTRL_OFFSET, 1 << channel) }
    }

    // -------------------------------------------------------------------------
    // Channel registers (SAMD21: CHID window)
    // -------------------------------------------------------------------------

    /// Select a channel in the CHID window.
    #[cfg(feature = "samd21")]
    #[inline(always)]
    pub fn select(channel: u8) {
        unsafe { write_reg8(DMAC_BASE + DMAC_CHID_OFFSET, channel) }
    }

    /// Read CHCTRLA of a channel.
    #[cfg(feature = "samd21")]
    #[inline(always)]
    pub fn channel_ctrl_a(channel: u8) -> u32 {
        Self::select(channel);
        unsafe { read_reg8(DMAC_BASE + DMAC_CHCTRLA_OFFSET) as u32 }
    }

    /// Write CHCTRLA of a channel.
    #[cfg(feature = "samd21")]
    #[inline(always)]
    pub fn set_channel_ctrl_a(channel: u8, value: u32) {
        Self::select(channel);
        unsafe { write_reg8(DMAC_BASE + DMAC_CHCTRLA_OFFSET, value as u8) }
    }

    /// Read CHCTRLB of a channel.
    #[cfg(feature = "samd21")]
    #[inline(always)]
    pub fn channel_ctrl_b(channel: u8) -> u32 {
        Self::select(channel);
        unsafe { read_reg(DMAC_BASE + DMAC_CHCTRLB_OFFSET) }
    }

    /// Write CHCTRLB of a channel.
    #[cfg(feature = "samd21")]
    #[inline(always)]
    pub fn set_channel_ctrl_b(channel: u8, value: u32) {
        Self::select(channel);
        unsafe { write_reg(DMAC_BASE + DMAC_CHCTRLB_OFFSET, value) }
    }

    /// Read CHINTFLAG of a channel.
    #[cfg(feature = "samd21")]
    #[inline(always)]
    pub fn channel_int_flag(channel: u8) -> u8 {
        Self::select(channel);
        unsafe { read_reg8(DMAC_BASE + DMAC_CHINTFLAG_OFFSET) }
    }

    /// Clear CHINTFLAG bits of a channel (write-one-to-clear).
    #[cfg(feature = "samd21")]
    #[inline(always)]
    pub fn clear_channel_int_flag(channel: u8, bits: u8) {
        Self::select(channel);
        unsafe { write_reg8(DMAC_BASE + DMAC_CHINTFLAG_OFFSET, bits) }
    }

    /// Read CHSTATUS of a channel.
    #[cfg(feature = "samd21")]
    #[inline(always)]
    pub fn channel_status(channel: u8) -> u8 {
        Self::select(channel);
        unsafe { read_reg8(DMAC_BASE + DMAC_CHSTATUS_OFFSET) }
    }

    // -------------------------------------------------------------------------
    // Channel registers (SAMD51: one block per channel)
    // -------------------------------------------------------------------------

    #[cfg(feature = "samd51")]
    #[inline(always)]
    const fn channel_base(channel: u8) -> usize {
        DMAC_BASE + DMAC_CHANNEL_OFFSET + (channel as usize) * DMAC_CHANNEL_STRIDE
    }

    /// Read CHCTRLA of a channel.
    #[cfg(feature = "samd51")]
    #[inline(always)]
    pub fn channel_ctrl_a(channel: u8) -> u32 {
        unsafe { read_reg(Self::channel_base(channel) + CH_CHCTRLA_OFFSET) }
    }

    /// Write CHCTRLA of a channel.
    #[cfg(feature = "samd51")]
    #[inline(always)]
    pub fn set_channel_ctrl_a(channel: u8, value: u32) {
        unsafe { write_reg(Self::channel_base(channel) + CH_CHCTRLA_OFFSET, value) }
    }

    /// Read CHCTRLB of a channel.
    #[cfg(feature = "samd51")]
    #[inline(always)]
    pub fn channel_ctrl_b(channel: u8) -> u32 {
        unsafe { read_reg8(Self::channel_base(channel) + CH_CHCTRLB_OFFSET) as u32 }
    }

    /// Write CHCTRLB of a channel.
    #[cfg(feature = "samd51")]
    #[inline(always)]
    pub fn set_channel_ctrl_b(channel: u8, value: u32) {
        unsafe { write_reg8(Self::channel_base(channel) + CH_CHCTRLB_OFFSET, value as u8) }
    }

    /// Write CHEVCTRL of a channel.
    #[cfg(feature = "samd51")]
    #[inline(always)]
    pub fn set_channel_event_ctrl(channel: u8, value: u8) {
        unsafe { write_reg8(Self::channel_base(channel) + CH_CHEVCTRL_OFFSET, value) }
    }

    /// Read CHINTFLAG of a channel.
    #[cfg(feature = "samd51")]
    #[inline(always)]
    pub fn channel_int_flag(channel: u8) -> u8 {
        unsafe { read_reg8(Self::channel_base(channel) + CH_CHINTFLAG_OFFSET) }
    }

    /// Clear CHINTFLAG bits of a channel (write-one-to-clear).
    #[cfg(feature = "samd51")]
    #[inline(always)]
    pub fn clear_channel_int_flag(channel: u8, bits: u8) {
        unsafe { write_reg8(Self::channel_base(channel) + CH_CHINTFLAG_OFFSET, bits) }
    }

    /// Read CHSTATUS of a channel.
    #[cfg(feature = "samd51")]
    #[inline(always)]
    pub fn channel_status(channel: u8) -> u8 {
        unsafe { read_reg8(Self::channel_base(channel) + CH_CHSTATUS_OFFSET) }
    }
}

// =============================================================================
// Bus clock gating
// =============================================================================

/// Clock gate for the DMAC bus interface.
pub struct DmacClock;

#[cfg(feature = "samd51")]
impl DmacClock {
    reg_bit_ops!(enable, disable, super::MCLK_AHBMASK_REG, 0, super::MCLK_AHBMASK_DMAC,
                 "DMAC AHB clock", "Enable", "Disable");
}

#[cfg(feature = "samd21")]
impl DmacClock {
    reg_bit_ops!(enable_ahb, disable_ahb, super::PM_AHBMASK_REG, 0, super::PM_AHBMASK_DMAC,
                 "DMAC AHB clock", "Enable", "Disable");
    reg_bit_ops!(enable_apb, disable_apb, super::PM_APBBMASK_REG, 0, super::PM_APBBMASK_DMAC,
                 "DMAC APB clock", "Enable", "Disable");

    /// Enable both DMAC bus clocks.
    #[inline(always)]
    pub fn enable() {
        Self::enable_ahb();
        Self::enable_apb();
    }
}
