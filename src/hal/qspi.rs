//! QSPI flash window (SAMD51)
//!
//! The QSPI peripheral maps serial flash into the AHB address space; the
//! DMAC reads and writes it like memory, paced by the QSPI trigger sources.

use crate::constants::{QSPI_AHB_BASE, QSPI_AHB_SIZE, QSPI_DMAC_ID_RX, QSPI_DMAC_ID_TX};
use crate::hal::peripheral::{DmaPeripheral, PeripheralKind};

/// Transfer endpoint at `address` inside the QSPI memory window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QspiWindow {
    address: u32,
}

impl QspiWindow {
    /// Endpoint at flash offset `address`. `None` past the end of the window.
    pub const fn new(address: u32) -> Option<Self> {
        if address >= QSPI_AHB_SIZE {
            return None;
        }
        Some(Self { address })
    }

    /// Endpoint at `address` with room for `length` bytes before the end of
    /// the window.
    pub fn spanning(address: u32, length: usize) -> Option<Self> {
        let end = (address as usize).checked_add(length)?;
        if end > QSPI_AHB_SIZE as usize {
            return None;
        }
        Self::new(address)
    }

    /// Offset into flash
    pub const fn address(&self) -> u32 {
        self.address
    }

    /// Absolute bus address
    pub const fn bus_address(&self) -> u32 {
        QSPI_AHB_BASE + self.address
    }
}

impl DmaPeripheral for QspiWindow {
    fn kind(&self) -> PeripheralKind {
        PeripheralKind::MemoryMapped
    }

    fn tx_trigger(&self) -> u8 {
        QSPI_DMAC_ID_TX
    }

    fn rx_trigger(&self) -> u8 {
        QSPI_DMAC_ID_RX
    }

    fn tx_address(&self) -> u32 {
        self.bus_address()
    }

    fn rx_address(&self) -> u32 {
        self.bus_address()
    }
}
