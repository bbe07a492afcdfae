//! Transfer lifecycle: start, poll, close.
//!
//! A transfer moves `length` bytes between caller buffers and a
//! [`DmaPeripheral`]. Serial peripherals get byte beats with the register
//! side fixed; memory-mapped peripherals get word beats with both sides
//! incrementing. The receive channel is always armed before the transmit
//! channel so no byte clocked in by a transmit beat is missed.

use core::sync::atomic::{Ordering, compiler_fence};

use super::engine::DmaEngine;
use super::error::{DmaError, Result};
use super::pool::ChannelId;
use super::transfer::{Progress, Transfer, TransferConfig};
use crate::hal::dmac::DmacAccess;
use crate::hal::peripheral::{DmaPeripheral, PeripheralKind};
use crate::internal::constants::{MAX_BEAT_COUNT, WORD_SIZE};
use crate::internal::descriptor::BeatSize;

/// Caller buffer reduced to its address and size.
#[derive(Debug, Clone, Copy)]
struct Span {
    addr: usize,
    len: usize,
}

impl Span {
    fn of(buffer: &[u8]) -> Self {
        Self {
            addr: buffer.as_ptr() as usize,
            len: buffer.len(),
        }
    }

    /// Address one past the last transferred byte.
    fn end(self, length: usize) -> u32 {
        (self.addr + length) as u32
    }
}

/// Beat layout decided before any channel is touched.
#[derive(Debug, Clone, Copy)]
struct Plan {
    beat_size: BeatSize,
    count: u16,
}

impl Plan {
    fn new(
        kind: PeripheralKind,
        out: Option<Span>,
        input: Option<Span>,
        length: usize,
    ) -> Result<Self> {
        if length == 0 {
            return Err(DmaError::InvalidLength.into());
        }
        if [out, input].iter().flatten().any(|span| span.len < length) {
            return Err(DmaError::InvalidLength.into());
        }

        let beat_size = match kind {
            PeripheralKind::Serial => BeatSize::Byte,
            PeripheralKind::MemoryMapped => {
                if out.is_none() && input.is_none() {
                    return Err(DmaError::InvalidLength.into());
                }
                let misaligned = [out, input]
                    .iter()
                    .flatten()
                    .any(|span| span.addr % WORD_SIZE != 0);
                if misaligned || length % WORD_SIZE != 0 {
                    return Err(DmaError::AlignmentError.into());
                }
                BeatSize::Word
            }
        };

        let beats = length / beat_size.bytes();
        if beats > MAX_BEAT_COUNT {
            return Err(DmaError::InvalidLength.into());
        }
        Ok(Self {
            beat_size,
            count: beats as u16,
        })
    }
}

impl<H: DmacAccess> DmaEngine<H> {
    // =========================================================================
    // Start
    // =========================================================================

    /// Start a transfer of `length` bytes from and into `'static` buffers.
    ///
    /// `buffer_out` supplies transmitted bytes; without it a serial
    /// peripheral clocks out `fill_byte` instead. `buffer_in` receives bytes;
    /// its presence allocates and arms a receive channel. Memory-mapped
    /// peripherals move one direction per transfer: a write when
    /// `buffer_out` is present, otherwise a read into `buffer_in`.
    ///
    /// Never blocks beyond the arming critical section (and the bounded
    /// start-up check on SAMD51). Any failure is recorded on the returned
    /// transfer, which then holds no channels.
    pub fn start<'a, P: DmaPeripheral>(
        &mut self,
        peripheral: &'a mut P,
        buffer_out: Option<&'static [u8]>,
        buffer_in: Option<&'static mut [u8]>,
        length: usize,
        fill_byte: u8,
    ) -> Transfer<'a, P, H::Halt> {
        // SAFETY: the buffers outlive any transfer, forgotten or not
        unsafe { self.start_borrowed(peripheral, buffer_out, buffer_in, length, fill_byte) }
    }

    /// Start a transfer over buffers borrowed for `'a`.
    ///
    /// Behaves like [`start`](Self::start).
    ///
    /// # Safety
    /// The returned transfer must be closed or dropped before `'a` ends.
    /// Leaking it (`core::mem::forget`, a reference cycle) leaves the DMAC
    /// reading `buffer_out` and writing `buffer_in` after the borrows have
    /// been given back.
    pub unsafe fn start_borrowed<'a, P: DmaPeripheral>(
        &mut self,
        peripheral: &'a mut P,
        buffer_out: Option<&'a [u8]>,
        buffer_in: Option<&'a mut [u8]>,
        length: usize,
        fill_byte: u8,
    ) -> Transfer<'a, P, H::Halt> {
        let out = buffer_out.map(Span::of);
        let input = buffer_in.map(|b| Span::of(b));
        self.start_spans(peripheral, out, input, length, fill_byte)
    }

    /// Start a serial exchange that transmits a `'static` buffer and
    /// overwrites it with the received bytes.
    ///
    /// Each received byte lands after the byte at the same offset has been
    /// read for transmission.
    pub fn start_in_place<'a, P: DmaPeripheral>(
        &mut self,
        peripheral: &'a mut P,
        buffer: &'static mut [u8],
    ) -> Transfer<'a, P, H::Halt> {
        // SAFETY: the buffer outlives any transfer, forgotten or not
        unsafe { self.start_in_place_borrowed(peripheral, buffer) }
    }

    /// In-place exchange over a buffer borrowed for `'a`.
    ///
    /// # Safety
    /// As for [`start_borrowed`](Self::start_borrowed).
    pub unsafe fn start_in_place_borrowed<'a, P: DmaPeripheral>(
        &mut self,
        peripheral: &'a mut P,
        buffer: &'a mut [u8],
    ) -> Transfer<'a, P, H::Halt> {
        let span = Span::of(buffer);
        let length = buffer.len();
        if peripheral.kind() != PeripheralKind::Serial {
            return Transfer::failed(peripheral, length, DmaError::InvalidLength.into());
        }
        self.start_spans(peripheral, Some(span), Some(span), length, 0)
    }

    fn start_spans<'a, P: DmaPeripheral>(
        &mut self,
        peripheral: &'a mut P,
        out: Option<Span>,
        input: Option<Span>,
        length: usize,
        fill_byte: u8,
    ) -> Transfer<'a, P, H::Halt> {
        match self.arm(peripheral, out, input, length, fill_byte) {
            Ok((config, recovery_attempted)) => {
                let halt = self.hal.halt_handle();
                Transfer::new(peripheral, config, recovery_attempted, halt)
            }
            Err(e) => Transfer::failed(peripheral, length, e),
        }
    }

    fn allocate_pair(&mut self, with_rx: bool) -> Result<(ChannelId, Option<ChannelId>)> {
        let tx = self.allocate_channel(false)?;
        if !with_rx {
            return Ok((tx, None));
        }
        match self.allocate_channel(false) {
            Ok(rx) => Ok((tx, Some(rx))),
            Err(e) => {
                self.release(Some(tx));
                Err(e)
            }
        }
    }

    fn arm<P: DmaPeripheral>(
        &mut self,
        peripheral: &mut P,
        out: Option<Span>,
        input: Option<Span>,
        length: usize,
        fill_byte: u8,
    ) -> Result<(TransferConfig, bool)> {
        self.ensure_initialized()?;
        let kind = peripheral.kind();
        let plan = Plan::new(kind, out, input, length)?;

        let (tx, rx) = self.allocate_pair(input.is_some())?;

        let (tx_active, rx_active) = match kind {
            PeripheralKind::Serial => (true, rx.is_some()),
            PeripheralKind::MemoryMapped => (out.is_some(), out.is_none()),
        };
        let config = TransferConfig {
            kind,
            length,
            tx_channel: Some(tx),
            rx_channel: rx,
            tx_active,
            rx_active,
        };

        if let Err(e) = self.program(peripheral, &config, plan, out, input, fill_byte) {
            self.release(config.rx_channel);
            self.release(config.tx_channel);
            return Err(e);
        }

        if kind == PeripheralKind::Serial {
            peripheral.clear_ready_flags();
        }

        let active_rx = config.active_rx();
        let active_tx = config.active_tx();
        critical_section::with(|_| {
            if let Some(channel) = active_rx {
                self.hal.enable_channel(channel);
            }
            if let Some(channel) = active_tx {
                self.hal.enable_channel(channel);
            }
        });

        if kind == PeripheralKind::MemoryMapped {
            if let Some(channel) = active_tx.or(active_rx) {
                self.hal.software_trigger(channel);
            }
        }

        #[cfg(feature = "samd51")]
        let recovery_attempted = self.check_started(active_rx, active_tx);
        #[cfg(not(feature = "samd51"))]
        let recovery_attempted = false;

        Ok((config, recovery_attempted))
    }

    /// Configure and program the active channels, receive side first.
    fn program<P: DmaPeripheral>(
        &mut self,
        peripheral: &P,
        config: &TransferConfig,
        plan: Plan,
        out: Option<Span>,
        input: Option<Span>,
        fill_byte: u8,
    ) -> Result<()> {
        let length = config.length;
        let memory_mapped = config.kind == PeripheralKind::MemoryMapped;

        if let (Some(channel), Some(input)) = (config.active_rx(), input) {
            self.hal
                .configure_channel(channel, peripheral.rx_trigger(), false);
            let src = if memory_mapped {
                peripheral.rx_address() + length as u32
            } else {
                peripheral.rx_address()
            };
            let desc = self.table.program(
                channel,
                plan.beat_size,
                memory_mapped,
                true,
                plan.count,
                src,
                input.end(length),
            )?;
            self.hal.descriptor_ready(channel, desc);
        }

        if let Some(channel) = config.active_tx() {
            self.hal
                .configure_channel(channel, peripheral.tx_trigger(), false);
            let (src, src_increment) = match out {
                Some(out) => (out.end(length), true),
                None => (self.table.set_fill(channel, fill_byte)?, false),
            };
            let dst = if memory_mapped {
                peripheral.tx_address() + length as u32
            } else {
                peripheral.tx_address()
            };
            let desc = self.table.program(
                channel,
                plan.beat_size,
                src_increment,
                memory_mapped,
                plan.count,
                src,
                dst,
            )?;
            self.hal.descriptor_ready(channel, desc);
        }
        Ok(())
    }

    // =========================================================================
    // Poll
    // =========================================================================

    /// Advance the completion protocol; `true` once the transfer is over.
    ///
    /// Idempotent: completed stages are not re-checked, and a failed
    /// transfer reports finished without touching any hardware.
    pub fn finished<P: DmaPeripheral>(&self, transfer: &mut Transfer<'_, P, H::Halt>) -> bool {
        if transfer.state.failure.is_some() {
            return true;
        }
        let config = transfer.config;
        let state = &mut transfer.state;

        if state.progress < Progress::ReceiveDone {
            if let Some(rx) = config.active_rx() {
                if !self.hal.transfer_status(rx).is_terminal() {
                    return false;
                }
            }
            state.progress = Progress::ReceiveDone;
        }

        if state.progress < Progress::TransmitDone {
            if let Some(tx) = config.active_tx() {
                if !self.hal.transfer_status(tx).is_terminal() {
                    return false;
                }
            }
            state.progress = Progress::TransmitDone;
        }

        if state.progress < Progress::Drained && config.kind == PeripheralKind::Serial {
            let peripheral = &mut *transfer.peripheral;
            if !peripheral.is_transmit_complete() {
                return false;
            }
            if config.rx_channel.is_none() {
                while peripheral.is_receive_complete() {
                    peripheral.discard_data();
                }
                peripheral.clear_overflow();
            }
            state.progress = Progress::Drained;
        }

        true
    }

    // =========================================================================
    // Close
    // =========================================================================

    /// Release the transfer's channels and report its outcome.
    ///
    /// Channels are freed on every path. Returns the transfer length when
    /// every active channel ended with exactly "transfer complete".
    ///
    /// # Errors
    /// - The failure recorded by [`start`](Self::start), if any
    /// - [`DmaError::IncompleteTransfer`] if an active channel ended otherwise
    pub fn close<P: DmaPeripheral>(
        &mut self,
        mut transfer: Transfer<'_, P, H::Halt>,
    ) -> Result<usize> {
        transfer.disarm();
        let config = transfer.config;
        self.release(config.tx_channel);
        self.release(config.rx_channel);
        // Reads of received data stay behind the channel disable
        compiler_fence(Ordering::Acquire);

        if let Some(failure) = transfer.state.failure {
            return Err(failure);
        }

        for channel in [config.active_rx(), config.active_tx()].into_iter().flatten() {
            let status = self.hal.transfer_status(channel);
            if !status.is_complete() {
                #[cfg(feature = "log")]
                log::warn!(
                    "DMA channel {} closed with status {:#04x}",
                    channel.number(),
                    status.0
                );
                return Err(DmaError::IncompleteTransfer.into());
            }
        }
        Ok(config.length)
    }

    // =========================================================================
    // Blocking wrappers
    // =========================================================================

    /// Start, wait for completion and close.
    ///
    /// # Errors
    /// Any error [`start`](Self::start) records or [`close`](Self::close)
    /// reports.
    pub fn transfer<P: DmaPeripheral>(
        &mut self,
        peripheral: &mut P,
        buffer_out: Option<&[u8]>,
        buffer_in: Option<&mut [u8]>,
        length: usize,
        fill_byte: u8,
    ) -> Result<usize> {
        // SAFETY: the transfer is closed or dropped before returning
        let mut transfer =
            unsafe { self.start_borrowed(peripheral, buffer_out, buffer_in, length, fill_byte) };
        if let Some(failure) = transfer.failure() {
            return Err(failure);
        }
        while !self.finished(&mut transfer) {}
        self.close(transfer)
    }

    /// Blocking in-place serial exchange.
    ///
    /// # Errors
    /// As for [`transfer`](Self::transfer).
    pub fn transfer_in_place<P: DmaPeripheral>(
        &mut self,
        peripheral: &mut P,
        buffer: &mut [u8],
    ) -> Result<usize> {
        // SAFETY: the transfer is closed or dropped before returning
        let mut transfer = unsafe { self.start_in_place_borrowed(peripheral, buffer) };
        if let Some(failure) = transfer.failure() {
            return Err(failure);
        }
        while !self.finished(&mut transfer) {}
        self.close(transfer)
    }

    /// Transmit `buffer` over a serial peripheral, discarding received bytes.
    ///
    /// # Errors
    /// As for [`transfer`](Self::transfer).
    pub fn serial_write<P: DmaPeripheral>(
        &mut self,
        sercom: &mut P,
        buffer: &[u8],
    ) -> Result<usize> {
        self.transfer(sercom, Some(buffer), None, buffer.len(), 0)
    }

    /// Fill `buffer` from a serial peripheral while clocking out `fill_byte`.
    ///
    /// # Errors
    /// As for [`transfer`](Self::transfer).
    pub fn serial_read<P: DmaPeripheral>(
        &mut self,
        sercom: &mut P,
        buffer: &mut [u8],
        fill_byte: u8,
    ) -> Result<usize> {
        let length = buffer.len();
        self.transfer(sercom, None, Some(buffer), length, fill_byte)
    }

    /// Full-duplex exchange of `length` bytes.
    ///
    /// # Errors
    /// As for [`transfer`](Self::transfer).
    pub fn serial_transfer<P: DmaPeripheral>(
        &mut self,
        sercom: &mut P,
        buffer_out: &[u8],
        buffer_in: &mut [u8],
        length: usize,
    ) -> Result<usize> {
        self.transfer(sercom, Some(buffer_out), Some(buffer_in), length, 0)
    }

    /// Write `buffer` into QSPI flash at `address`.
    ///
    /// # Errors
    /// [`DmaError::AlignmentError`] for a misaligned buffer or length,
    /// [`DmaError::InvalidLength`] when `address..address + buffer.len()`
    /// leaves the window, and anything [`transfer`](Self::transfer) reports.
    #[cfg(feature = "samd51")]
    #[cfg_attr(docsrs, doc(cfg(feature = "samd51")))]
    pub fn qspi_write(&mut self, address: u32, buffer: &[u8]) -> Result<usize> {
        let mut window = crate::hal::QspiWindow::spanning(address, buffer.len())
            .ok_or(DmaError::InvalidLength)?;
        self.transfer(&mut window, Some(buffer), None, buffer.len(), 0)
    }

    /// Read QSPI flash at `address` into `buffer`.
    ///
    /// # Errors
    /// As for [`qspi_write`](Self::qspi_write).
    #[cfg(feature = "samd51")]
    #[cfg_attr(docsrs, doc(cfg(feature = "samd51")))]
    pub fn qspi_read(&mut self, address: u32, buffer: &mut [u8]) -> Result<usize> {
        let mut window = crate::hal::QspiWindow::spanning(address, buffer.len())
            .ok_or(DmaError::InvalidLength)?;
        let length = buffer.len();
        self.transfer(&mut window, None, Some(buffer), length, 0)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::boxed::Box;

    use super::*;
    use crate::driver::config::DmaConfig;
    use crate::driver::error::{ConfigError, Error};
    use crate::internal::constants::CHANNEL_COUNT;
    use crate::internal::register::dmac::DMAC_CHINTFLAG_TERR;
    use crate::testing::{DmacEvent, MOCK_SPI_DATA, MockDmac, MockSpi, MockWindow, boxed_engine};

    #[repr(align(4))]
    struct Aligned([u8; 20]);

    fn engine() -> Box<DmaEngine<MockDmac>> {
        let dma = boxed_engine(DmaConfig::default());
        dma.hal().clear_events();
        dma
    }

    fn end_of(buffer: &[u8]) -> u32 {
        (buffer.as_ptr() as usize + buffer.len()) as u32
    }

    // =========================================================================
    // Serial transfers
    // =========================================================================

    #[test]
    fn write_only_16_bytes() {
        let mut dma = engine();
        let mut spi = MockSpi::new(1);
        let data = [0xA5u8; 16];

        assert_eq!(dma.serial_write(&mut spi, &data), Ok(16));

        let ready = dma.hal().ready_descriptors();
        assert_eq!(ready.len(), 1);
        let (channel, desc) = ready[0];
        assert_eq!(channel, 4);
        assert!(desc.valid);
        assert_eq!(desc.beat_size, BeatSize::Byte);
        assert_eq!(desc.count, 16);
        assert!(desc.src_increment);
        assert!(!desc.dst_increment);
        assert_eq!(desc.src, end_of(&data));
        assert_eq!(desc.dst, MOCK_SPI_DATA);

        assert_eq!(dma.hal().enabled_channels(), [4]);
        assert_eq!(dma.pool().allocated_count(), 0);
        assert_eq!(spi.ready_clears(), 1);
        assert_eq!(spi.overflow_clears(), 1);
    }

    #[test]
    fn bidirectional_8_bytes() {
        let mut dma = engine();
        let mut spi = MockSpi::new(2);
        let out = [1u8, 2, 3, 4, 5, 6, 7, 8];
        let mut input = [0u8; 8];
        let input_end = end_of(&input);

        let mut transfer =
            unsafe { dma.start_borrowed(&mut spi, Some(&out), Some(&mut input), 8, 0) };
        assert!(!transfer.is_failed());
        assert_eq!(transfer.config().tx_channel, ChannelId::new(4));
        assert_eq!(transfer.config().rx_channel, ChannelId::new(5));
        assert!(transfer.config().tx_active && transfer.config().rx_active);

        let ready = dma.hal().ready_descriptors();
        let (rx, rx_desc) = ready[0];
        let (tx, tx_desc) = ready[1];
        assert_eq!((rx, tx), (5, 4));
        assert_eq!(rx_desc.dst, input_end);
        assert!(rx_desc.dst_increment);
        assert_eq!(rx_desc.src, MOCK_SPI_DATA);
        assert!(!rx_desc.src_increment);
        assert_eq!(tx_desc.src, end_of(&out));
        assert_eq!(tx_desc.dst, MOCK_SPI_DATA);

        while !dma.finished(&mut transfer) {}
        assert_eq!(transfer.progress(), Progress::Drained);
        assert_eq!(transfer.peripheral().overflow_clears(), 0);
        assert_eq!(dma.close(transfer), Ok(8));
        assert_eq!(dma.pool().allocated_count(), 0);
    }

    #[test]
    fn channels_configured_with_peripheral_triggers() {
        let mut dma = engine();
        let mut spi = MockSpi::new(3);
        let out = [0u8; 4];
        let mut input = [0u8; 4];

        dma.serial_transfer(&mut spi, &out, &mut input, 4).unwrap();

        let events = dma.hal().events();
        assert!(events.contains(&DmacEvent::Configure {
            channel: 5,
            trigger: spi.rx_trigger(),
            output_event: false,
        }));
        assert!(events.contains(&DmacEvent::Configure {
            channel: 4,
            trigger: spi.tx_trigger(),
            output_event: false,
        }));
    }

    #[test]
    fn rx_armed_before_tx() {
        let mut dma = engine();
        let mut spi = MockSpi::new(0);
        let out = [0u8; 4];
        let mut input = [0u8; 4];

        let transfer = unsafe { dma.start_borrowed(&mut spi, Some(&out), Some(&mut input), 4, 0) };

        let events = dma.hal().events();
        let position = |wanted: DmacEvent| events.iter().position(|e| *e == wanted).unwrap();
        let rx_ready = events
            .iter()
            .position(|e| matches!(e, DmacEvent::DescriptorReady { channel: 5, .. }))
            .unwrap();
        let tx_ready = events
            .iter()
            .position(|e| matches!(e, DmacEvent::DescriptorReady { channel: 4, .. }))
            .unwrap();
        assert!(rx_ready < tx_ready);
        assert!(tx_ready < position(DmacEvent::EnableChannel(5)));
        assert!(position(DmacEvent::EnableChannel(5)) < position(DmacEvent::EnableChannel(4)));

        let _ = dma.close(transfer);
    }

    #[test]
    fn read_clocks_out_fill_byte() {
        let mut dma = engine();
        let mut spi = MockSpi::new(0);
        let mut input = [0u8; 4];
        let input_end = end_of(&input);

        assert_eq!(dma.serial_read(&mut spi, &mut input, 0xFF), Ok(4));

        let ready = dma.hal().ready_descriptors();
        let (_, rx_desc) = ready[0];
        let (_, tx_desc) = ready[1];
        assert_eq!(rx_desc.dst, input_end);
        assert!(!tx_desc.src_increment);
        assert_ne!(tx_desc.src, 0);
        assert_eq!(tx_desc.dst, MOCK_SPI_DATA);
    }

    #[test]
    fn in_place_exchange_shares_buffer() {
        let mut dma = engine();
        let mut spi = MockSpi::new(0);
        let mut buffer = [0x9Fu8, 0, 0, 0];
        let end = end_of(&buffer);

        assert_eq!(dma.transfer_in_place(&mut spi, &mut buffer), Ok(4));

        let ready = dma.hal().ready_descriptors();
        assert_eq!(ready[0].1.dst, end);
        assert_eq!(ready[1].1.src, end);
    }

    #[test]
    fn write_only_drains_stray_bytes() {
        let mut dma = engine();
        let mut spi = MockSpi::new(0).with_stray_rx(3);

        dma.serial_write(&mut spi, &[0u8; 2]).unwrap();
        assert_eq!(spi.discarded(), 3);
        assert_eq!(spi.overflow_clears(), 1);
    }

    #[test]
    fn finished_waits_for_transmit_complete() {
        let mut dma = engine();
        let mut spi = MockSpi::new(0).with_txc_delay(2);
        let out = [0u8; 1];

        let mut transfer = unsafe { dma.start_borrowed(&mut spi, Some(&out), None, 1, 0) };
        assert!(!dma.finished(&mut transfer));
        assert_eq!(transfer.progress(), Progress::TransmitDone);
        assert!(!dma.finished(&mut transfer));
        assert!(dma.finished(&mut transfer));
        assert_eq!(transfer.progress(), Progress::Drained);
        assert_eq!(dma.close(transfer), Ok(1));
    }

    #[test]
    fn finished_is_idempotent_once_done() {
        let mut dma = engine();
        let mut spi = MockSpi::new(0);
        let out = [0u8; 2];

        let mut transfer = unsafe { dma.start_borrowed(&mut spi, Some(&out), None, 2, 0) };
        while !dma.finished(&mut transfer) {}
        let reads = dma.hal().status_reads();
        let calls = transfer.peripheral().total_calls();

        assert!(dma.finished(&mut transfer));
        assert!(dma.finished(&mut transfer));
        assert_eq!(dma.hal().status_reads(), reads);
        assert_eq!(transfer.peripheral().total_calls(), calls);
        let _ = dma.close(transfer);
    }

    #[test]
    fn error_status_closes_incomplete() {
        let mut dma = engine();
        let mut spi = MockSpi::new(0);
        let out = [0u8; 8];
        let mut input = [0u8; 8];

        let mut transfer =
            unsafe { dma.start_borrowed(&mut spi, Some(&out), Some(&mut input), 8, 0) };
        let rx = transfer.config().rx_channel.unwrap();
        dma.hal().force_status(rx, DMAC_CHINTFLAG_TERR);

        while !dma.finished(&mut transfer) {}
        assert_eq!(
            dma.close(transfer),
            Err(Error::Dma(DmaError::IncompleteTransfer))
        );
        assert_eq!(dma.pool().allocated_count(), 0);
    }

    #[test]
    fn static_buffers_start_safely() {
        let mut dma = engine();
        let mut spi = MockSpi::new(0);
        let out: &'static [u8] = Box::leak(Box::new([0x3Cu8; 4]));
        let input: &'static mut [u8] = Box::leak(Box::new([0u8; 4]));

        let mut transfer = dma.start(&mut spi, Some(out), Some(input), 4, 0);
        while !dma.finished(&mut transfer) {}
        assert_eq!(dma.close(transfer), Ok(4));
        assert_eq!(dma.pool().allocated_count(), 0);
    }

    #[test]
    fn dropped_transfer_stops_its_channels() {
        let mut dma = engine();
        let mut spi = MockSpi::new(0);
        let mut input = [0u8; 8];

        let transfer = unsafe { dma.start_borrowed(&mut spi, None, Some(&mut input), 8, 0xFF) };
        let tx = transfer.config().tx_channel.unwrap();
        let rx = transfer.config().rx_channel.unwrap();
        assert!(dma.is_channel_enabled(rx));
        dma.hal().clear_events();

        drop(transfer);
        input[0] = 0x42;

        assert!(!dma.is_channel_enabled(rx));
        assert!(!dma.is_channel_enabled(tx));
        assert_eq!(
            dma.hal().events(),
            [
                DmacEvent::DisableChannel(rx.number()),
                DmacEvent::DisableChannel(tx.number())
            ]
        );
        assert_eq!(input[0], 0x42);

        assert_eq!(dma.pool().allocated_count(), 2);
        dma.free_channel(Some(rx)).unwrap();
        dma.free_channel(Some(tx)).unwrap();
        assert_eq!(dma.pool().allocated_count(), 0);
    }

    #[test]
    fn closed_transfer_is_not_stopped_twice() {
        let mut dma = engine();
        let mut spi = MockSpi::new(0);
        let out = [0u8; 2];

        let mut transfer = unsafe { dma.start_borrowed(&mut spi, Some(&out), None, 2, 0) };
        while !dma.finished(&mut transfer) {}
        dma.hal().clear_events();
        assert_eq!(dma.close(transfer), Ok(2));
        assert_eq!(dma.hal().events(), [DmacEvent::DisableChannel(4)]);
    }

    // =========================================================================
    // Validation and failure paths
    // =========================================================================

    #[test]
    fn start_before_init_fails() {
        let mut dma = DmaEngine::new(MockDmac::new());
        let mut spi = MockSpi::new(0);
        let out = [0u8; 4];

        let transfer = unsafe { dma.start_borrowed(&mut spi, Some(&out), None, 4, 0) };
        assert_eq!(
            transfer.failure(),
            Some(Error::Config(ConfigError::NotInitialized))
        );
    }

    #[test]
    fn invalid_lengths_are_rejected() {
        let mut dma = engine();
        let mut spi = MockSpi::new(0);
        let out = [0u8; 4];
        let invalid = Err(Error::Dma(DmaError::InvalidLength));

        assert_eq!(dma.transfer(&mut spi, Some(&out), None, 0, 0), invalid);
        assert_eq!(dma.transfer(&mut spi, Some(&out), None, 5, 0), invalid);

        let big = std::vec![0u8; MAX_BEAT_COUNT + 1];
        assert_eq!(dma.serial_write(&mut spi, &big), invalid);
        assert_eq!(dma.pool().allocated_count(), 0);
        assert!(dma.hal().events().is_empty());
    }

    #[test]
    fn exhaustion_leaves_pool_unchanged() {
        let mut dma = engine();
        for _ in 4..CHANNEL_COUNT - 1 {
            dma.allocate_channel(false).unwrap();
        }
        let before = dma.pool().allocated_count();

        let mut spi = MockSpi::new(0);
        let out = [0u8; 4];
        let mut input = [0u8; 4];
        let transfer = unsafe { dma.start_borrowed(&mut spi, Some(&out), Some(&mut input), 4, 0) };

        assert_eq!(
            transfer.failure(),
            Some(Error::Dma(DmaError::NoChannelAvailable))
        );
        assert!(transfer.config().tx_channel.is_none());
        assert_eq!(dma.pool().allocated_count(), before);
        assert_eq!(
            dma.close(transfer),
            Err(Error::Dma(DmaError::NoChannelAvailable))
        );
        assert_eq!(dma.pool().allocated_count(), before);
    }

    #[test]
    fn failed_transfer_touches_nothing() {
        let mut dma = engine();
        let mut window = MockWindow::new(0);
        let buffer = Aligned([0; 20]);

        let mut transfer =
            unsafe { dma.start_borrowed(&mut window, Some(&buffer.0[1..9]), None, 8, 0) };
        assert!(transfer.is_failed());
        dma.hal().clear_events();

        assert!(dma.finished(&mut transfer));
        assert!(dma.finished(&mut transfer));
        assert_eq!(dma.hal().status_reads(), 0);
        assert!(dma.hal().events().is_empty());
        assert_eq!(transfer.progress(), Progress::Started);

        let mut spi = MockSpi::new(0);
        let mut transfer = unsafe { dma.start_borrowed(&mut spi, Some(&[0u8; 2]), None, 0, 0) };
        assert!(dma.finished(&mut transfer));
        assert_eq!(transfer.peripheral().total_calls(), 0);
        let _ = dma.close(transfer);
    }

    #[test]
    fn misaligned_memory_mapped_fails_before_allocation() {
        let mut dma = engine();
        let mut window = MockWindow::new(0);
        let buffer = Aligned([0; 20]);
        let misaligned = Err(Error::Dma(DmaError::AlignmentError));

        assert_eq!(
            dma.transfer(&mut window, Some(&buffer.0[1..17]), None, 16, 0),
            misaligned
        );
        assert_eq!(
            dma.transfer(&mut window, Some(&buffer.0[..6]), None, 6, 0),
            misaligned
        );
        assert_eq!(dma.pool().allocated_count(), 0);
        assert!(dma.hal().events().is_empty());
    }

    #[test]
    fn moved_engine_starts_nothing() {
        let mut dma = DmaEngine::new(MockDmac::new());
        dma.init(DmaConfig::default()).unwrap();
        let mut moved = Box::new(dma);
        moved.hal().clear_events();
        let mut spi = MockSpi::new(0);
        let out = [0u8; 4];

        let transfer = unsafe { moved.start_borrowed(&mut spi, Some(&out), None, 4, 0) };
        assert_eq!(
            transfer.failure(),
            Some(Error::Config(ConfigError::NotInitialized))
        );
        drop(transfer);
        assert_eq!(moved.pool().allocated_count(), 0);
        assert!(moved.hal().events().is_empty());
    }

    #[test]
    fn mixed_sequence_conserves_channels() {
        let mut dma = engine();
        let mut spi = MockSpi::new(0);
        let mut window = MockWindow::new(0);
        let aligned = Aligned([0; 20]);
        let out = [0u8; 8];
        let mut input = [0u8; 8];
        let before = dma.pool().allocated_count();

        assert_eq!(dma.serial_transfer(&mut spi, &out, &mut input, 8), Ok(8));
        assert_eq!(
            dma.transfer(&mut window, Some(&aligned.0[1..9]), None, 8, 0),
            Err(Error::Dma(DmaError::AlignmentError))
        );

        let mut transfer =
            unsafe { dma.start_borrowed(&mut spi, Some(&out), Some(&mut input), 8, 0) };
        let rx = transfer.config().rx_channel.unwrap();
        dma.hal().force_status(rx, DMAC_CHINTFLAG_TERR);
        while !dma.finished(&mut transfer) {}
        assert_eq!(
            dma.close(transfer),
            Err(Error::Dma(DmaError::IncompleteTransfer))
        );

        let held: std::vec::Vec<_> = (4..CHANNEL_COUNT - 1)
            .map(|_| dma.allocate_channel(false).unwrap())
            .collect();
        assert_eq!(
            dma.serial_transfer(&mut spi, &out, &mut input, 8),
            Err(Error::Dma(DmaError::NoChannelAvailable))
        );
        for channel in held {
            dma.free_channel(Some(channel)).unwrap();
        }

        assert_eq!(dma.serial_write(&mut spi, &out), Ok(8));
        assert_eq!(dma.transfer(&mut window, Some(&aligned.0[..8]), None, 8, 0), Ok(8));
        assert_eq!(dma.pool().allocated_count(), before);
    }

    #[cfg(feature = "samd51")]
    #[test]
    fn qspi_overrun_is_rejected() {
        use crate::internal::constants::QSPI_AHB_SIZE;

        let mut dma = engine();
        let buffer = Aligned([0; 20]);

        assert_eq!(
            dma.qspi_write(QSPI_AHB_SIZE - 8, &buffer.0[..16]),
            Err(Error::Dma(DmaError::InvalidLength))
        );
        assert_eq!(dma.pool().allocated_count(), 0);
        assert!(dma.hal().events().is_empty());
    }

    // =========================================================================
    // Memory-mapped transfers
    // =========================================================================

    #[test]
    fn memory_mapped_write() {
        let mut dma = engine();
        let mut window = MockWindow::new(0x100);
        let buffer = Aligned([0x5A; 20]);
        let data = &buffer.0[..16];

        assert_eq!(dma.transfer(&mut window, Some(data), None, 16, 0), Ok(16));

        let ready = dma.hal().ready_descriptors();
        assert_eq!(ready.len(), 1);
        let (channel, desc) = ready[0];
        assert_eq!(channel, 4);
        assert_eq!(desc.beat_size, BeatSize::Word);
        assert_eq!(desc.count, 4);
        assert!(desc.src_increment && desc.dst_increment);
        assert_eq!(desc.src, end_of(data));
        assert_eq!(desc.dst, window.bus_address() + 16);

        let events = dma.hal().events();
        assert!(events.contains(&DmacEvent::SoftwareTrigger(4)));
        assert_eq!(dma.hal().enabled_channels(), [4]);
        assert_eq!(dma.pool().allocated_count(), 0);
    }

    #[test]
    fn memory_mapped_read_arms_rx_only() {
        let mut dma = engine();
        let mut window = MockWindow::new(0x40);
        let mut buffer = Aligned([0; 20]);
        let end = end_of(&buffer.0[..8]);
        let source = window.bus_address() + 8;

        let mut transfer =
            unsafe { dma.start_borrowed(&mut window, None, Some(&mut buffer.0[..8]), 8, 0) };
        let config = *transfer.config();
        assert_eq!(config.tx_channel, ChannelId::new(4));
        assert_eq!(config.rx_channel, ChannelId::new(5));
        assert!(!config.tx_active);
        assert!(config.rx_active);

        let ready = dma.hal().ready_descriptors();
        assert_eq!(ready.len(), 1);
        let (channel, desc) = ready[0];
        assert_eq!(channel, 5);
        assert_eq!(desc.src, source);
        assert_eq!(desc.dst, end);
        assert_eq!(desc.count, 2);

        let events = dma.hal().events();
        assert!(events.contains(&DmacEvent::SoftwareTrigger(5)));
        assert!(!events.contains(&DmacEvent::EnableChannel(4)));

        while !dma.finished(&mut transfer) {}
        assert_eq!(dma.close(transfer), Ok(8));
        assert_eq!(dma.pool().allocated_count(), 0);
    }

    #[test]
    fn memory_mapped_in_place_is_rejected() {
        let mut dma = engine();
        let mut window = MockWindow::new(0);
        let mut buffer = Aligned([0; 20]);

        let transfer = unsafe { dma.start_in_place_borrowed(&mut window, &mut buffer.0[..8]) };
        assert_eq!(transfer.failure(), Some(Error::Dma(DmaError::InvalidLength)));
    }

    // =========================================================================
    // Start-up check
    // =========================================================================

    #[cfg(feature = "samd51")]
    #[test]
    fn healthy_start_takes_one_sample() {
        let mut dma = engine();
        let mut spi = MockSpi::new(0);
        let out = [0u8; 4];

        let transfer = unsafe { dma.start_borrowed(&mut spi, Some(&out), None, 4, 0) };
        assert!(!transfer.recovery_attempted());
        assert_eq!(dma.hal().busy_reads(), 1);
        let _ = dma.close(transfer);
    }

    #[cfg(feature = "samd51")]
    #[test]
    fn stalled_start_is_rekicked() {
        let mut dma = engine();
        let mut spi = MockSpi::new(0);
        let out = [0u8; 8];
        let mut input = [0u8; 8];

        dma.hal().stall_next_enables(2);
        let mut transfer =
            unsafe { dma.start_borrowed(&mut spi, Some(&out), Some(&mut input), 8, 0) };

        assert!(transfer.recovery_attempted());
        assert_eq!(dma.hal().busy_reads(), 10);
        assert_eq!(dma.hal().enabled_channels(), [5, 4, 4, 5]);

        while !dma.finished(&mut transfer) {}
        assert_eq!(dma.close(transfer), Ok(8));
    }

    #[cfg(feature = "samd51")]
    #[test]
    fn poll_limit_is_configurable() {
        let mut dma = boxed_engine(DmaConfig::new().with_errata_poll_limit(3));
        let mut spi = MockSpi::new(0);
        let out = [0u8; 4];

        dma.hal().stall_next_enables(1);
        let transfer = unsafe { dma.start_borrowed(&mut spi, Some(&out), None, 4, 0) };
        assert!(transfer.recovery_attempted());
        assert_eq!(dma.hal().busy_reads(), 3);
        let _ = dma.close(transfer);
    }

    #[cfg(feature = "samd51")]
    #[test]
    fn rekick_leaves_idle_channels_alone() {
        let mut dma = engine();
        let mut spi = MockSpi::new(0);
        let out = [0u8; 4];

        dma.hal().stall_next_enables(1);
        let transfer = unsafe { dma.start_borrowed(&mut spi, Some(&out), None, 4, 0) };
        let disabled: std::vec::Vec<_> = dma
            .hal()
            .events()
            .into_iter()
            .filter(|e| matches!(e, DmacEvent::DisableChannel(_)))
            .collect();
        assert_eq!(disabled, [DmacEvent::DisableChannel(4)]);
        let _ = dma.close(transfer);
    }
}
