//! Transfer handle returned by [`DmaEngine::start`](super::engine::DmaEngine::start).
//!
//! A transfer is split into what was decided at start ([`TransferConfig`])
//! and what the completion poll has observed since ([`TransferState`]). The
//! handle borrows the peripheral and the caller's buffers, so neither can be
//! touched while the DMAC owns them. Dropping the handle disables its
//! channels before the borrows end.

use core::marker::PhantomData;
use core::sync::atomic::{Ordering, compiler_fence};

use super::error::Error;
use super::pool::ChannelId;
use crate::hal::dmac::ChannelHalt;
use crate::hal::peripheral::{DmaPeripheral, PeripheralKind};

/// Completion stage reached by [`DmaEngine::finished`](super::engine::DmaEngine::finished).
///
/// Stages only move forward; each one is entered once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Progress {
    /// Channels armed
    #[default]
    Started,
    /// Receive channel (if active) reached a terminal status
    ReceiveDone,
    /// Transmit channel (if active) reached a terminal status
    TransmitDone,
    /// Serial shift register empty and stray receive data drained
    Drained,
}

impl Progress {
    /// Stage number, 0 to 3
    pub const fn stage(self) -> u8 {
        self as u8
    }
}

/// Decisions fixed when the transfer was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransferConfig {
    /// How descriptors were programmed
    pub kind: PeripheralKind,
    /// Bytes to move
    pub length: usize,
    /// Transmit channel, held until close
    pub tx_channel: Option<ChannelId>,
    /// Receive channel, held until close
    pub rx_channel: Option<ChannelId>,
    /// Transmit channel was armed
    pub tx_active: bool,
    /// Receive channel was armed
    pub rx_active: bool,
}

impl TransferConfig {
    /// Configuration of a transfer that never armed anything.
    pub(crate) const fn idle(kind: PeripheralKind, length: usize) -> Self {
        Self {
            kind,
            length,
            tx_channel: None,
            rx_channel: None,
            tx_active: false,
            rx_active: false,
        }
    }

    /// Active receive channel, if any.
    pub(crate) fn active_rx(&self) -> Option<ChannelId> {
        self.rx_channel.filter(|_| self.rx_active)
    }

    /// Active transmit channel, if any.
    pub(crate) fn active_tx(&self) -> Option<ChannelId> {
        self.tx_channel.filter(|_| self.tx_active)
    }
}

/// What the completion poll has observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransferState {
    /// Completion stage
    pub progress: Progress,
    /// Set when the transfer could not be started
    pub failure: Option<Error>,
    /// The start-up check found the DMAC stalled and re-kicked enabled channels
    pub recovery_attempted: bool,
}

/// An in-flight (or failed) DMA transfer.
///
/// Poll with [`DmaEngine::finished`](super::engine::DmaEngine::finished) and
/// release with [`DmaEngine::close`](super::engine::DmaEngine::close).
/// Dropping a transfer without closing it disables its channels; they stay
/// allocated until freed with
/// [`DmaEngine::free_channel`](super::engine::DmaEngine::free_channel).
#[must_use = "a transfer holds DMA channels until it is closed"]
pub struct Transfer<'a, P: DmaPeripheral, S: ChannelHalt> {
    pub(crate) peripheral: &'a mut P,
    pub(crate) config: TransferConfig,
    pub(crate) state: TransferState,
    /// `None` once the channels have been handed back (or never armed)
    halt: Option<S>,
    _buffers: PhantomData<&'a mut [u8]>,
}

impl<'a, P: DmaPeripheral, S: ChannelHalt> Transfer<'a, P, S> {
    pub(crate) fn new(
        peripheral: &'a mut P,
        config: TransferConfig,
        recovery_attempted: bool,
        halt: S,
    ) -> Self {
        Self {
            peripheral,
            config,
            state: TransferState {
                recovery_attempted,
                ..TransferState::default()
            },
            halt: Some(halt),
            _buffers: PhantomData,
        }
    }

    pub(crate) fn failed(peripheral: &'a mut P, length: usize, failure: Error) -> Self {
        let kind = peripheral.kind();
        Self {
            peripheral,
            config: TransferConfig::idle(kind, length),
            state: TransferState {
                failure: Some(failure),
                ..TransferState::default()
            },
            halt: None,
            _buffers: PhantomData,
        }
    }

    /// Hand the channels over to the engine; dropping no longer touches them.
    pub(crate) fn disarm(&mut self) {
        self.halt = None;
    }

    /// Start-time decisions.
    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Completion state.
    pub fn state(&self) -> &TransferState {
        &self.state
    }

    /// Current completion stage.
    pub fn progress(&self) -> Progress {
        self.state.progress
    }

    /// Why the transfer could not start, if it didn't.
    pub fn failure(&self) -> Option<Error> {
        self.state.failure
    }

    /// Whether the transfer failed to start.
    pub fn is_failed(&self) -> bool {
        self.state.failure.is_some()
    }

    /// Whether the start-up check had to re-kick the DMAC.
    pub fn recovery_attempted(&self) -> bool {
        self.state.recovery_attempted
    }

    /// Peripheral the transfer is bound to.
    pub fn peripheral(&self) -> &P {
        self.peripheral
    }
}

impl<P: DmaPeripheral, S: ChannelHalt> Drop for Transfer<'_, P, S> {
    fn drop(&mut self) {
        if let Some(halt) = self.halt.take() {
            for channel in [self.config.rx_channel, self.config.tx_channel]
                .into_iter()
                .flatten()
            {
                halt.halt(channel);
            }
            // Buffer accesses after the borrow ends stay behind the disable
            compiler_fence(Ordering::Acquire);
        }
    }
}

impl<P: DmaPeripheral, S: ChannelHalt> core::fmt::Debug for Transfer<'_, P, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Transfer")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("armed", &self.halt.is_some())
            .finish_non_exhaustive()
    }
}
