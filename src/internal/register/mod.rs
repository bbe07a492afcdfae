//! Memory-mapped register definitions for the SAMD DMAC and SERCOM SPI
//!
//! This module provides type-safe access to the peripheral registers used by
//! the shared DMA engine. All register access is volatile to ensure proper
//! hardware interaction.

pub mod dmac;
pub mod sercom;

// SAMD21 and SAMD51 are mutually exclusive; lib.rs rejects any other combination.

/// DMAC register block base address
#[cfg(feature = "samd21")]
pub const DMAC_BASE: usize = 0x4100_4800;

/// DMAC register block base address
#[cfg(feature = "samd51")]
pub const DMAC_BASE: usize = 0x4100_A000;

/// Power Manager AHB mask register (SAMD21 gates the DMAC AHB clock here)
#[cfg(feature = "samd21")]
pub const PM_AHBMASK_REG: usize = 0x4000_0414;

/// Power Manager APBB mask register
#[cfg(feature = "samd21")]
pub const PM_APBBMASK_REG: usize = 0x4000_041C;

/// DMAC enable bit in `PM_AHBMASK`
#[cfg(feature = "samd21")]
pub const PM_AHBMASK_DMAC: u32 = 1 << 5;

/// DMAC enable bit in `PM_APBBMASK`
#[cfg(feature = "samd21")]
pub const PM_APBBMASK_DMAC: u32 = 1 << 4;

/// Main Clock AHB mask register
#[cfg(feature = "samd51")]
pub const MCLK_AHBMASK_REG: usize = 0x4000_0810;

/// DMAC enable bit in `MCLK_AHBMASK`
#[cfg(feature = "samd51")]
pub const MCLK_AHBMASK_DMAC: u32 = 1 << 9;

/// Read an 8-bit register at the given address
///
/// # Safety
/// The caller must ensure the address is a valid register.
#[inline(always)]
pub unsafe fn read_reg8(addr: usize) -> u8 {
    unsafe { core::ptr::read_volatile(addr as *const u8) }
}

/// Write an 8-bit register at the given address
///
/// # Safety
/// The caller must ensure the address is a valid register.
#[inline(always)]
pub unsafe fn write_reg8(addr: usize, value: u8) {
    unsafe { core::ptr::write_volatile(addr as *mut u8, value) }
}

/// Read a 16-bit register at the given address
///
/// # Safety
/// The caller must ensure the address is valid and 2-byte aligned.
#[inline(always)]
pub unsafe fn read_reg16(addr: usize) -> u16 {
    unsafe { core::ptr::read_volatile(addr as *const u16) }
}

/// Write a 16-bit register at the given address
///
/// # Safety
/// The caller must ensure the address is valid and 2-byte aligned.
#[inline(always)]
pub unsafe fn write_reg16(addr: usize, value: u16) {
    unsafe { core::ptr::write_volatile(addr as *mut u16, value) }
}

/// Read a 32-bit register at the given address
///
/// # Safety
/// The caller must ensure the address is valid and properly aligned.
#[inline(always)]
pub unsafe fn read_reg(addr: usize) -> u32 {
    unsafe { core::ptr::read_volatile(addr as *const u32) }
}

/// Write a 32-bit value to a register at the given address
///
/// # Safety
/// The caller must ensure the address is valid and properly aligned.
#[inline(always)]
pub unsafe fn write_reg(addr: usize, value: u32) {
    unsafe { core::ptr::write_volatile(addr as *mut u32, value) }
}

/// Modify a register using a read-modify-write operation
///
/// # Safety
/// The caller must ensure the address is valid and properly aligned.
#[inline(always)]
pub unsafe fn modify_reg<F>(addr: usize, f: F)
where
    F: FnOnce(u32) -> u32,
{
    // SAFETY: caller guarantees address validity
    let value = unsafe { read_reg(addr) };
    unsafe { write_reg(addr, f(value)) }
}

/// Set bits in a register (read-modify-write)
///
/// # Safety
/// The caller must ensure the address is valid and properly aligned.
#[inline(always)]
pub unsafe fn set_bits(addr: usize, bits: u32) {
    // SAFETY: caller guarantees address validity
    unsafe { modify_reg(addr, |v| v | bits) }
}

/// Clear bits in a register (read-modify-write)
///
/// # Safety
/// The caller must ensure the address is valid and properly aligned.
#[inline(always)]
pub unsafe fn clear_bits(addr: usize, bits: u32) {
    // SAFETY: caller guarantees address validity
    unsafe { modify_reg(addr, |v| v & !bits) }
}

// =============================================================================
// Register Access Macros
// =============================================================================

/// Generate read/write accessor methods for a 32-bit register.
///
/// # Example
/// ```ignore
/// impl DmacRegs {
///     reg_rw!(base_addr, set_base_addr, DMAC_BASE, DMAC_BASEADDR_OFFSET,
///             "Descriptor Memory Section Base Address register");
/// }
/// ```
macro_rules! reg_rw {
    ($read_fn:ident, $write_fn:ident, $base:expr, $offset:expr, $doc:expr) => {
        #[doc = concat!("Read ", $doc)]
        #[inline(always)]
        pub fn $read_fn() -> u32 {
            unsafe { $crate::internal::register::read_reg($base + $offset) }
        }

        #[doc = concat!("Write ", $doc)]
        #[inline(always)]
        pub fn $write_fn(value: u32) {
            unsafe { $crate::internal::register::write_reg($base + $offset, value) }
        }
    };
}

/// Generate a read-only accessor method for a 32-bit register.
macro_rules! reg_ro {
    ($read_fn:ident, $base:expr, $offset:expr, $doc:expr) => {
        #[doc = concat!("Read ", $doc)]
        #[inline(always)]
        pub fn $read_fn() -> u32 {
            unsafe { $crate::internal::register::read_reg($base + $offset) }
        }
    };
}

/// Generate set/clear bit operation methods for a 32-bit register.
///
/// # Example
/// ```ignore
/// impl DmacRegs {
///     reg_bit_ops!(enable_crc, disable_crc, DMAC_BASE, DMAC_CTRL_OFFSET, DMAC_CTRL_CRCENABLE,
///                  "CRC module", "Enable", "Disable");
/// }
/// ```
macro_rules! reg_bit_ops {
    ($set_fn:ident, $clear_fn:ident, $base:expr, $offset:expr, $bit:expr, $what:expr, $set_verb:expr, $clear_verb:expr) => {
        #[doc = concat!($set_verb, " ", $what)]
        #[inline(always)]
        pub fn $set_fn() {
            unsafe { $crate::internal::register::set_bits($base + $offset, $bit) }
        }

        #[doc = concat!($clear_verb, " ", $what)]
        #[inline(always)]
        pub fn $clear_fn() {
            unsafe { $crate::internal::register::clear_bits($base + $offset, $bit) }
        }
    };
}

// Export macros for use in submodules
pub(crate) use reg_bit_ops;
pub(crate) use reg_ro;
pub(crate) use reg_rw;
