//! SERCOM SPI Register Definitions
//!
//! Only the registers the DMA engine touches are described here: interrupt
//! flags, status and the data register. Mode and baud configuration belong to
//! the SPI driver that owns the SERCOM.

#![allow(dead_code)]

use super::{read_reg, read_reg8, read_reg16, write_reg8, write_reg16};

// =============================================================================
// Register Offsets
// =============================================================================

/// Interrupt Flag Status and Clear register offset (8-bit)
pub const SPI_INTFLAG_OFFSET: usize = 0x18;
/// Status register offset (16-bit)
pub const SPI_STATUS_OFFSET: usize = 0x1A;
/// Data register offset (32-bit)
pub const SPI_DATA_OFFSET: usize = 0x28;

// =============================================================================
// Interrupt Flag (INTFLAG) Bits
// =============================================================================

/// Data Register Empty
pub const SPI_INTFLAG_DRE: u8 = 1 << 0;
/// Transmit Complete
pub const SPI_INTFLAG_TXC: u8 = 1 << 1;
/// Receive Complete
pub const SPI_INTFLAG_RXC: u8 = 1 << 2;
/// Slave Select Low
pub const SPI_INTFLAG_SSL: u8 = 1 << 3;
/// Combined Error
pub const SPI_INTFLAG_ERROR: u8 = 1 << 7;

// =============================================================================
// Status (STATUS) Bits
// =============================================================================

/// Buffer Overflow
pub const SPI_STATUS_BUFOVF: u16 = 1 << 2;

// =============================================================================
// Instance base addresses
// =============================================================================

/// SERCOM instance base addresses, indexed by SERCOM number
#[cfg(feature = "samd21")]
pub const SERCOM_BASES: [usize; 6] = [
    0x4200_0800,
    0x4200_0C00,
    0x4200_1000,
    0x4200_1400,
    0x4200_1800,
    0x4200_1C00,
];

/// SERCOM instance base addresses, indexed by SERCOM number
#[cfg(feature = "samd51")]
pub const SERCOM_BASES: [usize; 8] = [
    0x4000_3000,
    0x4000_3400,
    0x4101_2000,
    0x4101_4000,
    0x4300_0000,
    0x4300_0400,
    0x4300_0800,
    0x4300_0C00,
];

// =============================================================================
// SERCOM SPI Register Access Functions
// =============================================================================

/// SERCOM SPI register block at a runtime base address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SercomSpiRegs {
    base: usize,
}

impl SercomSpiRegs {
    /// Wrap the register block at `base`.
    pub const fn new(base: usize) -> Self {
        Self { base }
    }

    /// Register block base address
    #[inline(always)]
    pub const fn base(&self) -> usize {
        self.base
    }

    /// Address of the DATA register (DMA source/destination)
    #[inline(always)]
    pub const fn data_addr(&self) -> usize {
        self.base + SPI_DATA_OFFSET
    }

    /// Read INTFLAG
    #[inline(always)]
    pub fn int_flag(&self) -> u8 {
        unsafe { read_reg8(self.base + SPI_INTFLAG_OFFSET) }
    }

    /// Write INTFLAG (write-one-to-clear for clearable bits)
    #[inline(always)]
    pub fn set_int_flag(&self, value: u8) {
        unsafe { write_reg8(self.base + SPI_INTFLAG_OFFSET, value) }
    }

    /// Read STATUS
    #[inline(always)]
    pub fn status(&self) -> u16 {
        unsafe { read_reg16(self.base + SPI_STATUS_OFFSET) }
    }

    /// Write STATUS (write-one-to-clear)
    #[inline(always)]
    pub fn set_status(&self, value: u16) {
        unsafe { write_reg16(self.base + SPI_STATUS_OFFSET, value) }
    }

    /// Read DATA, popping one received unit
    #[inline(always)]
    pub fn data(&self) -> u32 {
        unsafe { read_reg(self.data_addr()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_register_follows_base() {
        let regs = SercomSpiRegs::new(SERCOM_BASES[1]);
        assert_eq!(regs.data_addr(), SERCOM_BASES[1] + 0x28);
    }

    #[test]
    fn sercom_bases_are_unique() {
        for (i, a) in SERCOM_BASES.iter().enumerate() {
            for b in &SERCOM_BASES[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
