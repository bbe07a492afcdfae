//! SERCOM SPI endpoint
//!
//! The SPI driver owning the SERCOM configures mode, pins and baud rate; the
//! DMA engine only needs the data register, the ready/complete flags and the
//! per-instance trigger sources.

use crate::constants::{FIRST_SERCOM_RX_TRIGSRC, FIRST_SERCOM_TX_TRIGSRC};
use crate::hal::peripheral::{DmaPeripheral, PeripheralKind};
use crate::internal::register::sercom::{
    SERCOM_BASES, SPI_INTFLAG_DRE, SPI_INTFLAG_ERROR, SPI_INTFLAG_RXC, SPI_INTFLAG_TXC,
    SPI_STATUS_BUFOVF, SercomSpiRegs,
};

/// A SERCOM instance in SPI mode.
///
/// Owned handle; a transfer borrows it mutably for its whole lifetime.
#[derive(Debug, PartialEq, Eq)]
pub struct Sercom {
    regs: SercomSpiRegs,
    index: u8,
}

impl Sercom {
    /// Number of SERCOM instances on this chip
    pub const COUNT: usize = SERCOM_BASES.len();

    /// SERCOM by instance number. `None` when out of range.
    pub const fn new(index: u8) -> Option<Self> {
        if index as usize >= Self::COUNT {
            return None;
        }
        Some(Self {
            regs: SercomSpiRegs::new(SERCOM_BASES[index as usize]),
            index,
        })
    }

    /// SERCOM whose register block starts at `base`. `None` for an address
    /// that is not a SERCOM instance.
    pub fn from_base(base: usize) -> Option<Self> {
        let index = SERCOM_BASES.iter().position(|&b| b == base)?;
        Self::new(index as u8)
    }

    /// Instance number
    pub const fn index(&self) -> u8 {
        self.index
    }

    /// Register block base address
    pub const fn base(&self) -> usize {
        self.regs.base()
    }

    /// Receive trigger source for SERCOM `index`.
    pub const fn rx_trigger_for(index: u8) -> u8 {
        index * 2 + FIRST_SERCOM_RX_TRIGSRC
    }

    /// Transmit trigger source for SERCOM `index`.
    pub const fn tx_trigger_for(index: u8) -> u8 {
        index * 2 + FIRST_SERCOM_TX_TRIGSRC
    }
}

impl DmaPeripheral for Sercom {
    fn kind(&self) -> PeripheralKind {
        PeripheralKind::Serial
    }

    fn tx_trigger(&self) -> u8 {
        Self::tx_trigger_for(self.index)
    }

    fn rx_trigger(&self) -> u8 {
        Self::rx_trigger_for(self.index)
    }

    fn tx_address(&self) -> u32 {
        self.regs.data_addr() as u32
    }

    fn rx_address(&self) -> u32 {
        self.regs.data_addr() as u32
    }

    fn clear_ready_flags(&mut self) {
        self.regs.set_int_flag(SPI_INTFLAG_RXC | SPI_INTFLAG_DRE);
    }

    fn is_transmit_complete(&self) -> bool {
        self.regs.int_flag() & SPI_INTFLAG_TXC != 0
    }

    fn is_receive_complete(&self) -> bool {
        self.regs.int_flag() & SPI_INTFLAG_RXC != 0
    }

    fn discard_data(&mut self) {
        let _ = self.regs.data();
    }

    fn clear_overflow(&mut self) {
        self.regs.set_status(SPI_STATUS_BUFOVF);
        self.regs.set_int_flag(SPI_INTFLAG_ERROR);
    }
}
