//! Channel allocation bookkeeping.
//!
//! Channels `0..reserved` form the reserved partition, configured once at
//! init for continuous users. The rest are handed out on demand, lowest index
//! first.

use super::error::{DmaError, DmaResult};
use crate::internal::constants::CHANNEL_COUNT;

/// Index of one DMAC channel, always below [`CHANNEL_COUNT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelId(u8);

impl ChannelId {
    /// Wrap a channel index, or `None` if it is outside the DMAC's range.
    #[must_use]
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < CHANNEL_COUNT {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Channel number as used in register bit positions.
    #[inline(always)]
    #[must_use]
    pub const fn number(self) -> u8 {
        self.0
    }

    /// Channel number as an array index.
    #[inline(always)]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Bit mask of this channel in per-channel registers.
    #[inline(always)]
    #[must_use]
    pub const fn mask(self) -> u32 {
        1 << self.0
    }
}

impl TryFrom<u8> for ChannelId {
    type Error = DmaError;

    fn try_from(index: u8) -> DmaResult<Self> {
        Self::new(index).ok_or(DmaError::InvalidChannel)
    }
}

/// Iterate every channel index of the DMAC.
pub fn all_channels() -> impl Iterator<Item = ChannelId> {
    (0..CHANNEL_COUNT as u8).map(ChannelId)
}

/// Allocation state of every DMAC channel.
#[derive(Debug, Clone)]
pub struct ChannelPool {
    allocated: [bool; CHANNEL_COUNT],
    reserved: u8,
}

impl ChannelPool {
    /// Create a pool with `reserved` channels in the reserved partition.
    ///
    /// `reserved` is clamped to the channel count.
    #[must_use]
    pub const fn new(reserved: u8) -> Self {
        let reserved = if reserved as usize > CHANNEL_COUNT {
            CHANNEL_COUNT as u8
        } else {
            reserved
        };
        Self {
            allocated: [false; CHANNEL_COUNT],
            reserved,
        }
    }

    /// Size of the reserved partition.
    #[inline(always)]
    pub const fn reserved_count(&self) -> u8 {
        self.reserved
    }

    /// Whether a channel belongs to the reserved partition.
    #[inline(always)]
    pub const fn is_reserved(&self, channel: ChannelId) -> bool {
        channel.0 < self.reserved
    }

    /// Take the lowest free channel of the requested partition.
    pub fn allocate(&mut self, reserved: bool) -> DmaResult<ChannelId> {
        let range = if reserved {
            0..self.reserved as usize
        } else {
            self.reserved as usize..CHANNEL_COUNT
        };

        for index in range {
            if !self.allocated[index] {
                self.allocated[index] = true;
                return Ok(ChannelId(index as u8));
            }
        }
        Err(DmaError::NoChannelAvailable)
    }

    /// Return a channel to the pool.
    pub fn free(&mut self, channel: ChannelId) -> DmaResult<()> {
        let slot = &mut self.allocated[channel.index()];
        if !*slot {
            return Err(DmaError::ChannelNotAllocated);
        }
        *slot = false;
        Ok(())
    }

    /// Whether a channel is currently allocated.
    #[inline(always)]
    pub fn is_allocated(&self, channel: ChannelId) -> bool {
        self.allocated[channel.index()]
    }

    /// Number of allocated channels across both partitions.
    pub fn allocated_count(&self) -> usize {
        self.allocated.iter().filter(|a| **a).count()
    }

    /// Number of free channels in the general-purpose partition.
    pub fn general_available(&self) -> usize {
        self.allocated[self.reserved as usize..]
            .iter()
            .filter(|a| !**a)
            .count()
    }
}
