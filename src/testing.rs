//! Testing utilities and mock implementations
//!
//! This module provides simulated DMAC and peripheral implementations for
//! testing the engine on the host without hardware access.
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use core::cell::RefCell;
use std::boxed::Box;
use std::rc::Rc;
use std::vec::Vec;

use crate::driver::config::DmaConfig;
use crate::driver::engine::DmaEngine;
use crate::driver::pool::ChannelId;
use crate::hal::dmac::{ChannelHalt, DmacAccess, TransferStatus};
use crate::hal::peripheral::{DmaPeripheral, PeripheralKind};
use crate::hal::sercom::Sercom;
use crate::internal::constants::CHANNEL_COUNT;
use crate::internal::descriptor::{BeatSize, Descriptor};
use crate::internal::register::dmac::DMAC_CHINTFLAG_TCMPL;

// =============================================================================
// Mock DMAC
// =============================================================================

/// Descriptor contents at the moment it was handed to the DMAC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorSnapshot {
    pub valid: bool,
    pub beat_size: BeatSize,
    pub src_increment: bool,
    pub dst_increment: bool,
    pub count: u16,
    pub src: u32,
    pub dst: u32,
}

impl DescriptorSnapshot {
    fn of(desc: &Descriptor) -> Self {
        Self {
            valid: desc.is_valid(),
            beat_size: desc.beat_size(),
            src_increment: desc.src_increment(),
            dst_increment: desc.dst_increment(),
            count: desc.count(),
            src: desc.src_addr(),
            dst: desc.dst_addr(),
        }
    }
}

/// Controller operation recorded by [`MockDmac`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmacEvent {
    ClockEnabled,
    Reset,
    BaseAddresses { descriptors: u32, write_back: u32 },
    Enabled { priority_levels: u8 },
    Configure { channel: u8, trigger: u8, output_event: bool },
    DescriptorReady { channel: u8, snapshot: DescriptorSnapshot },
    EnableChannel(u8),
    DisableChannel(u8),
    Suspend(u8),
    Resume(u8),
    SoftwareTrigger(u8),
}

#[derive(Debug, Clone, Copy, Default)]
struct ChannelSim {
    enabled: bool,
    beats: u16,
    elapsed: u16,
    flags: u8,
    stuck: bool,
    forced: Option<u8>,
}

impl ChannelSim {
    fn running(&self) -> bool {
        self.enabled && !self.stuck && self.forced.is_none() && self.flags == 0 && self.beats > 0
    }

    /// One beat per status read; the channel disables itself when done.
    fn advance(&mut self) {
        if self.running() {
            self.elapsed += 1;
            if self.elapsed >= self.beats {
                self.flags = DMAC_CHINTFLAG_TCMPL;
                self.enabled = false;
            }
        }
    }
}

#[derive(Debug)]
struct MockState {
    events: RefCell<Vec<DmacEvent>>,
    channels: RefCell<[ChannelSim; CHANNEL_COUNT]>,
    /// Upcoming channel enables that never start
    stall_enables: RefCell<usize>,
    status_reads: RefCell<usize>,
    busy_reads: RefCell<usize>,
}

impl MockState {
    fn record(&self, event: DmacEvent) {
        self.events.borrow_mut().push(event);
    }

    fn disable(&self, channel: ChannelId) {
        self.record(DmacEvent::DisableChannel(channel.number()));
        self.channels.borrow_mut()[channel.index()].enabled = false;
    }
}

/// Simulated DMAC
///
/// Records every controller operation and completes an enabled channel one
/// beat per status read. Status overrides and stalled starts can be injected.
/// Halt handles share the simulator state, so a dropped transfer shows up in
/// the event log.
///
/// # Example
///
/// ```ignore
/// let mut dma = boxed_engine(DmaConfig::default());
/// dma.hal().stall_next_enables(2);
/// ```
#[derive(Debug)]
pub struct MockDmac {
    state: Rc<MockState>,
}

impl Default for MockDmac {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDmac {
    pub fn new() -> Self {
        Self {
            state: Rc::new(MockState {
                events: RefCell::new(Vec::new()),
                channels: RefCell::new([ChannelSim::default(); CHANNEL_COUNT]),
                stall_enables: RefCell::new(0),
                status_reads: RefCell::new(0),
                busy_reads: RefCell::new(0),
            }),
        }
    }

    /// Recorded operations, oldest first
    pub fn events(&self) -> Vec<DmacEvent> {
        self.state.events.borrow().clone()
    }

    /// Forget recorded operations and counters
    pub fn clear_events(&self) {
        self.state.events.borrow_mut().clear();
        *self.state.status_reads.borrow_mut() = 0;
        *self.state.busy_reads.borrow_mut() = 0;
    }

    /// Descriptors handed over since the last clear, oldest first
    pub fn ready_descriptors(&self) -> Vec<(u8, DescriptorSnapshot)> {
        self.state
            .events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                DmacEvent::DescriptorReady { channel, snapshot } => Some((*channel, *snapshot)),
                _ => None,
            })
            .collect()
    }

    /// Channels enabled since the last clear, oldest first
    pub fn enabled_channels(&self) -> Vec<u8> {
        self.state
            .events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                DmacEvent::EnableChannel(ch) => Some(*ch),
                _ => None,
            })
            .collect()
    }

    /// Number of transfer status reads since the last clear
    pub fn status_reads(&self) -> usize {
        *self.state.status_reads.borrow()
    }

    /// Number of `ACTIVE.ABUSY` reads since the last clear
    pub fn busy_reads(&self) -> usize {
        *self.state.busy_reads.borrow()
    }

    /// Make a channel report `flags` from now on, frozen
    pub fn force_status(&self, channel: ChannelId, flags: u8) {
        self.state.channels.borrow_mut()[channel.index()].forced = Some(flags);
    }

    /// The next `count` channel enables leave their channel stuck
    pub fn stall_next_enables(&self, count: usize) {
        *self.state.stall_enables.borrow_mut() = count;
    }

    fn record(&self, event: DmacEvent) {
        self.state.record(event);
    }
}

/// Halt handle sharing a [`MockDmac`]'s state
#[derive(Debug)]
pub struct MockHalt {
    state: Rc<MockState>,
}

impl ChannelHalt for MockHalt {
    fn halt(&self, channel: ChannelId) {
        self.state.disable(channel);
    }
}

impl DmacAccess for MockDmac {
    type Halt = MockHalt;

    fn halt_handle(&self) -> MockHalt {
        MockHalt {
            state: Rc::clone(&self.state),
        }
    }

    fn enable_clock(&mut self) {
        self.record(DmacEvent::ClockEnabled);
    }

    fn reset(&mut self) {
        self.record(DmacEvent::Reset);
        *self.state.channels.borrow_mut() = [ChannelSim::default(); CHANNEL_COUNT];
    }

    fn set_base_addresses(&mut self, descriptors: u32, write_back: u32) {
        self.record(DmacEvent::BaseAddresses {
            descriptors,
            write_back,
        });
    }

    fn enable(&mut self, priority_levels: u8) {
        self.record(DmacEvent::Enabled { priority_levels });
    }

    fn configure_channel(&mut self, channel: ChannelId, trigger: u8, output_event: bool) {
        self.record(DmacEvent::Configure {
            channel: channel.number(),
            trigger,
            output_event,
        });
        self.state.channels.borrow_mut()[channel.index()] = ChannelSim::default();
    }

    fn descriptor_ready(&mut self, channel: ChannelId, descriptor: &Descriptor) {
        self.record(DmacEvent::DescriptorReady {
            channel: channel.number(),
            snapshot: DescriptorSnapshot::of(descriptor),
        });
        let mut channels = self.state.channels.borrow_mut();
        let sim = &mut channels[channel.index()];
        sim.beats = descriptor.count();
        sim.elapsed = 0;
    }

    fn enable_channel(&mut self, channel: ChannelId) {
        self.record(DmacEvent::EnableChannel(channel.number()));
        let mut stall = self.state.stall_enables.borrow_mut();
        let mut channels = self.state.channels.borrow_mut();
        let sim = &mut channels[channel.index()];
        sim.enabled = true;
        sim.flags = 0;
        sim.elapsed = 0;
        sim.stuck = *stall > 0;
        *stall = stall.saturating_sub(1);
    }

    fn disable_channel(&mut self, channel: ChannelId) {
        self.state.disable(channel);
    }

    fn is_channel_enabled(&self, channel: ChannelId) -> bool {
        self.state.channels.borrow()[channel.index()].enabled
    }

    fn suspend_channel(&mut self, channel: ChannelId) {
        self.record(DmacEvent::Suspend(channel.number()));
    }

    fn resume_channel(&mut self, channel: ChannelId) {
        self.record(DmacEvent::Resume(channel.number()));
    }

    fn software_trigger(&mut self, channel: ChannelId) {
        self.record(DmacEvent::SoftwareTrigger(channel.number()));
    }

    fn transfer_status(&self, channel: ChannelId) -> TransferStatus {
        *self.state.status_reads.borrow_mut() += 1;
        let mut channels = self.state.channels.borrow_mut();
        let sim = &mut channels[channel.index()];
        if let Some(flags) = sim.forced {
            return TransferStatus(flags);
        }
        sim.advance();
        TransferStatus(sim.flags)
    }

    fn is_channel_idle(&self, channel: ChannelId) -> bool {
        !self.state.channels.borrow()[channel.index()].running()
    }

    fn is_any_busy(&self) -> bool {
        *self.state.busy_reads.borrow_mut() += 1;
        self.state.channels.borrow().iter().any(ChannelSim::running)
    }
}

/// Engine over a [`MockDmac`], initialized in its final heap location so
/// the registered descriptor table addresses stay valid.
pub fn boxed_engine(config: DmaConfig) -> Box<DmaEngine<MockDmac>> {
    let mut dma = Box::new(DmaEngine::new(MockDmac::new()));
    dma.init(config).unwrap();
    dma
}

// =============================================================================
// Mock serial peripheral
// =============================================================================

/// Data register address reported by [`MockSpi`]
pub const MOCK_SPI_DATA: u32 = 0x4300_0828;

/// Simulated SERCOM SPI
///
/// Transmit-complete can be delayed by a number of polls, and stray
/// received bytes can be left in the data register for the drain step.
#[derive(Debug, Default)]
pub struct MockSpi {
    index: u8,
    txc_delay: RefCell<usize>,
    stray_rx: usize,
    txc_polls: RefCell<usize>,
    rxc_polls: RefCell<usize>,
    ready_clears: usize,
    discarded: usize,
    overflow_clears: usize,
}

impl MockSpi {
    pub fn new(index: u8) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    /// Report transmit-complete only after `polls` negative polls
    pub fn with_txc_delay(self, polls: usize) -> Self {
        *self.txc_delay.borrow_mut() = polls;
        self
    }

    /// Leave `bytes` unread bytes in the data register
    pub fn with_stray_rx(mut self, bytes: usize) -> Self {
        self.stray_rx = bytes;
        self
    }

    pub fn ready_clears(&self) -> usize {
        self.ready_clears
    }

    pub fn discarded(&self) -> usize {
        self.discarded
    }

    pub fn overflow_clears(&self) -> usize {
        self.overflow_clears
    }

    pub fn txc_polls(&self) -> usize {
        *self.txc_polls.borrow()
    }

    /// Every observation or mutation made through the peripheral trait
    pub fn total_calls(&self) -> usize {
        self.txc_polls() + *self.rxc_polls.borrow() + self.ready_clears + self.discarded
            + self.overflow_clears
    }
}

impl DmaPeripheral for MockSpi {
    fn kind(&self) -> PeripheralKind {
        PeripheralKind::Serial
    }

    fn tx_trigger(&self) -> u8 {
        Sercom::tx_trigger_for(self.index)
    }

    fn rx_trigger(&self) -> u8 {
        Sercom::rx_trigger_for(self.index)
    }

    fn tx_address(&self) -> u32 {
        MOCK_SPI_DATA
    }

    fn rx_address(&self) -> u32 {
        MOCK_SPI_DATA
    }

    fn clear_ready_flags(&mut self) {
        self.ready_clears += 1;
    }

    fn is_transmit_complete(&self) -> bool {
        *self.txc_polls.borrow_mut() += 1;
        let mut delay = self.txc_delay.borrow_mut();
        if *delay > 0 {
            *delay -= 1;
            return false;
        }
        true
    }

    fn is_receive_complete(&self) -> bool {
        *self.rxc_polls.borrow_mut() += 1;
        self.stray_rx > 0
    }

    fn discard_data(&mut self) {
        self.stray_rx = self.stray_rx.saturating_sub(1);
        self.discarded += 1;
    }

    fn clear_overflow(&mut self) {
        self.overflow_clears += 1;
    }
}

// =============================================================================
// Mock memory-mapped peripheral
// =============================================================================

/// Start of the simulated memory window
pub const MOCK_WINDOW_BASE: u32 = 0x0400_0000;
/// Receive trigger reported by [`MockWindow`]
pub const MOCK_WINDOW_RX_TRIGGER: u8 = 0x53;
/// Transmit trigger reported by [`MockWindow`]
pub const MOCK_WINDOW_TX_TRIGGER: u8 = 0x54;

/// Memory-mapped window at an offset into [`MOCK_WINDOW_BASE`]
#[derive(Debug, Clone, Copy, Default)]
pub struct MockWindow {
    pub address: u32,
}

impl MockWindow {
    pub fn new(address: u32) -> Self {
        Self { address }
    }

    pub fn bus_address(&self) -> u32 {
        MOCK_WINDOW_BASE + self.address
    }
}

impl DmaPeripheral for MockWindow {
    fn kind(&self) -> PeripheralKind {
        PeripheralKind::MemoryMapped
    }

    fn tx_trigger(&self) -> u8 {
        MOCK_WINDOW_TX_TRIGGER
    }

    fn rx_trigger(&self) -> u8 {
        MOCK_WINDOW_RX_TRIGGER
    }

    fn tx_address(&self) -> u32 {
        self.bus_address()
    }

    fn rx_address(&self) -> u32 {
        self.bus_address()
    }
}
