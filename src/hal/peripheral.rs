//! Transfer endpoints
//!
//! A [`DmaPeripheral`] tells the engine where data goes, which trigger
//! sources pace it, and, for serial buses, how to observe the end of the
//! last shifted-out byte.

/// How the engine programs descriptors for a peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PeripheralKind {
    /// Byte-wide data register (SERCOM SPI). The register side never
    /// increments; completion also waits for the transmit shift register.
    Serial,
    /// Memory window (QSPI flash). Word beats, both sides increment, one
    /// direction per transfer.
    MemoryMapped,
}

impl PeripheralKind {
    /// Get kind name
    pub const fn as_str(&self) -> &'static str {
        match self {
            PeripheralKind::Serial => "serial",
            PeripheralKind::MemoryMapped => "memory-mapped",
        }
    }
}

/// A peripheral the engine can move data to and from.
///
/// The serial hooks default to no-ops so memory-mapped endpoints only
/// implement the addressing methods.
pub trait DmaPeripheral {
    /// Descriptor programming style.
    fn kind(&self) -> PeripheralKind;

    /// Trigger source pacing the transmit channel.
    fn tx_trigger(&self) -> u8;

    /// Trigger source pacing the receive channel.
    fn rx_trigger(&self) -> u8;

    /// Destination of transmitted data (data register, or window start).
    fn tx_address(&self) -> u32;

    /// Source of received data (data register, or window start).
    fn rx_address(&self) -> u32;

    /// Clear the receive-complete and data-register-empty flags before arming.
    fn clear_ready_flags(&mut self) {}

    /// Last byte has left the shift register.
    fn is_transmit_complete(&self) -> bool {
        true
    }

    /// A received unit is waiting in the data register.
    fn is_receive_complete(&self) -> bool {
        false
    }

    /// Pop one received unit, discarding it.
    fn discard_data(&mut self) {}

    /// Clear the buffer-overflow status and the error interrupt flag.
    fn clear_overflow(&mut self) {}
}

impl<P: DmaPeripheral + ?Sized> DmaPeripheral for &mut P {
    fn kind(&self) -> PeripheralKind {
        (**self).kind()
    }

    fn tx_trigger(&self) -> u8 {
        (**self).tx_trigger()
    }

    fn rx_trigger(&self) -> u8 {
        (**self).rx_trigger()
    }

    fn tx_address(&self) -> u32 {
        (**self).tx_address()
    }

    fn rx_address(&self) -> u32 {
        (**self).rx_address()
    }

    fn clear_ready_flags(&mut self) {
        (**self).clear_ready_flags();
    }

    fn is_transmit_complete(&self) -> bool {
        (**self).is_transmit_complete()
    }

    fn is_receive_complete(&self) -> bool {
        (**self).is_receive_complete()
    }

    fn discard_data(&mut self) {
        (**self).discard_data();
    }

    fn clear_overflow(&mut self) {
        (**self).clear_overflow();
    }
}
