//! `embedded-hal` SPI bus over the shared DMA engine.

use embedded_hal::spi::{ErrorType, SpiBus};

use crate::driver::engine::DmaEngine;
use crate::driver::error::Error;
use crate::hal::dmac::DmacAccess;
use crate::hal::peripheral::DmaPeripheral;
use crate::internal::constants::MAX_BEAT_COUNT;

/// Blocking SPI bus moving every byte by DMA.
///
/// Buffers longer than one descriptor's beat count are split into several
/// transfers. Each operation waits for the transmit shift register to drain,
/// so [`flush`](SpiBus::flush) has nothing left to do.
pub struct DmaSpi<'a, H: DmacAccess, P: DmaPeripheral> {
    engine: &'a mut DmaEngine<H>,
    sercom: P,
    fill_byte: u8,
}

impl<'a, H: DmacAccess, P: DmaPeripheral> DmaSpi<'a, H, P> {
    /// Wrap a SERCOM in SPI mode. Reads clock out `0x00`.
    pub fn new(engine: &'a mut DmaEngine<H>, sercom: P) -> Self {
        Self {
            engine,
            sercom,
            fill_byte: 0,
        }
    }

    /// Byte clocked out while only reading.
    #[must_use]
    pub fn with_fill_byte(mut self, fill_byte: u8) -> Self {
        self.fill_byte = fill_byte;
        self
    }

    /// Give the SERCOM back.
    pub fn release(self) -> P {
        self.sercom
    }
}

impl<H: DmacAccess, P: DmaPeripheral> ErrorType for DmaSpi<'_, H, P> {
    type Error = Error;
}

impl<H: DmacAccess, P: DmaPeripheral> SpiBus<u8> for DmaSpi<'_, H, P> {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Error> {
        for chunk in words.chunks_mut(MAX_BEAT_COUNT) {
            self.engine
                .serial_read(&mut self.sercom, chunk, self.fill_byte)?;
        }
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Error> {
        for chunk in words.chunks(MAX_BEAT_COUNT) {
            self.engine.serial_write(&mut self.sercom, chunk)?;
        }
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Error> {
        let common = read.len().min(write.len());
        let (read_common, read_rest) = read.split_at_mut(common);
        let (write_common, write_rest) = write.split_at(common);

        for (r, w) in read_common
            .chunks_mut(MAX_BEAT_COUNT)
            .zip(write_common.chunks(MAX_BEAT_COUNT))
        {
            let length = r.len();
            self.engine
                .serial_transfer(&mut self.sercom, w, r, length)?;
        }
        if !write_rest.is_empty() {
            self.write(write_rest)?;
        }
        if !read_rest.is_empty() {
            self.read(read_rest)?;
        }
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Error> {
        for chunk in words.chunks_mut(MAX_BEAT_COUNT) {
            self.engine.transfer_in_place(&mut self.sercom, chunk)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Error> {
        Ok(())
    }
}
