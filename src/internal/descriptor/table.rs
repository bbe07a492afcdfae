//! Active and write-back descriptor tables shared with the DMAC.

use super::{BeatSize, Descriptor, VolatileCell};
use crate::driver::error::{DmaError, DmaResult};
use crate::driver::pool::ChannelId;
use crate::internal::constants::CHANNEL_COUNT;

/// Descriptor memory registered with the DMAC (`BASEADDR` / `WRBADDR`).
///
/// The DMAC keeps the table addresses after `init`, so the table must not move
/// once registered. Place the owning engine in a `static`.
#[repr(C)]
pub struct DescriptorTable {
    /// Descriptors fetched by the DMAC when a channel is enabled
    descriptors: [Descriptor; CHANNEL_COUNT],
    /// Written by the DMAC when a channel is suspended, disabled or done
    write_back: [Descriptor; CHANNEL_COUNT],
    /// Fixed source byte for transfers without an output buffer
    fill: [VolatileCell<u8>; CHANNEL_COUNT],
}

impl DescriptorTable {
    /// Create a table with every descriptor invalid. Const-compatible.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            descriptors: [const { Descriptor::new() }; CHANNEL_COUNT],
            write_back: [const { Descriptor::new() }; CHANNEL_COUNT],
            fill: [const { VolatileCell::new(0) }; CHANNEL_COUNT],
        }
    }

    /// Total memory usage in bytes.
    #[must_use]
    pub const fn memory_usage() -> usize {
        core::mem::size_of::<Self>()
    }

    /// Addresses of the active and write-back tables, in that order.
    #[must_use]
    pub fn base_addresses(&self) -> (u32, u32) {
        (
            self.descriptors.as_ptr() as usize as u32,
            self.write_back.as_ptr() as usize as u32,
        )
    }

    /// Program one channel's descriptor. VALID is written last.
    pub fn program(
        &self,
        channel: ChannelId,
        beat_size: BeatSize,
        src_increment: bool,
        dst_increment: bool,
        count: u16,
        src_addr: u32,
        dst_addr: u32,
    ) -> DmaResult<&Descriptor> {
        let desc = self.descriptor(channel)?;
        desc.program(beat_size, src_increment, dst_increment, count, src_addr, dst_addr);
        Ok(desc)
    }

    /// Active descriptor of a channel.
    pub fn descriptor(&self, channel: ChannelId) -> DmaResult<&Descriptor> {
        self.descriptors
            .get(channel.index())
            .ok_or(DmaError::InvalidChannel)
    }

    /// Write-back descriptor of a channel (hardware owned, read-only).
    pub fn write_back(&self, channel: ChannelId) -> DmaResult<&Descriptor> {
        self.write_back
            .get(channel.index())
            .ok_or(DmaError::InvalidChannel)
    }

    /// Store a channel's fill byte and return its address for SRCADDR.
    pub(crate) fn set_fill(&self, channel: ChannelId, value: u8) -> DmaResult<u32> {
        let cell = self
            .fill
            .get(channel.index())
            .ok_or(DmaError::InvalidChannel)?;
        cell.set(value);
        Ok(cell.addr())
    }

    /// Invalidate every active descriptor.
    pub(crate) fn reset(&self) {
        for desc in &self.descriptors {
            desc.invalidate();
        }
    }
}

impl Default for DescriptorTable {
    fn default() -> Self {
        Self::new()
    }
}
