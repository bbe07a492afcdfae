//! DMAC transfer descriptors and the descriptor tables.
//!
//! Each channel owns one slot in the active table (written by software, read
//! by the DMAC) and one slot in the write-back table (written by the DMAC).

pub mod bits;
pub mod table;

pub use table::DescriptorTable;

use bits::{beatsize, btctrl};

/// Volatile cell wrapper for descriptor fields
///
/// Ensures all accesses are volatile to prevent compiler optimization
/// from reordering or caching descriptor field accesses.
#[repr(transparent)]
pub(crate) struct VolatileCell<T: Copy> {
    value: core::cell::UnsafeCell<T>,
}

// Safety: VolatileCell is safe to share between threads because all access
// is through volatile operations which are single-copy atomic on Cortex-M.
unsafe impl<T: Copy> Sync for VolatileCell<T> {}

impl<T: Copy> VolatileCell<T> {
    /// Create a new volatile cell with the given initial value
    #[inline(always)]
    pub const fn new(value: T) -> Self {
        Self {
            value: core::cell::UnsafeCell::new(value),
        }
    }

    /// Read the value (volatile read)
    #[inline(always)]
    pub fn get(&self) -> T {
        unsafe { core::ptr::read_volatile(self.value.get()) }
    }

    /// Write a value (volatile write)
    #[inline(always)]
    pub fn set(&self, value: T) {
        unsafe { core::ptr::write_volatile(self.value.get(), value) }
    }

    /// Update the value using a function (read-modify-write)
    #[inline(always)]
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(T) -> T,
    {
        let old = self.get();
        self.set(f(old));
    }

    /// Address of the cell, as seen by the DMAC
    #[inline(always)]
    pub fn addr(&self) -> u32 {
        self.value.get() as usize as u32
    }
}

/// Size of one DMA beat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BeatSize {
    /// 8-bit beats (serial peripherals)
    #[default]
    Byte,
    /// 16-bit beats
    HalfWord,
    /// 32-bit beats (memory-mapped peripherals)
    Word,
}

impl BeatSize {
    /// Bytes moved per beat
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            BeatSize::Byte => 1,
            BeatSize::HalfWord => 2,
            BeatSize::Word => 4,
        }
    }

    const fn to_btctrl(self) -> u16 {
        let raw = match self {
            BeatSize::Byte => beatsize::BYTE,
            BeatSize::HalfWord => beatsize::HWORD,
            BeatSize::Word => beatsize::WORD,
        };
        raw << btctrl::BEATSIZE_SHIFT
    }

    const fn from_btctrl(value: u16) -> Self {
        match (value & btctrl::BEATSIZE_MASK) >> btctrl::BEATSIZE_SHIFT {
            beatsize::BYTE => BeatSize::Byte,
            beatsize::HWORD => BeatSize::HalfWord,
            _ => BeatSize::Word,
        }
    }
}

/// DMAC transfer descriptor (16 bytes, 16-byte aligned).
///
/// Incrementing addresses follow the DMAC end-pointer convention: the address
/// field holds the address one past the last beat, not the start address.
#[repr(C, align(16))]
pub struct Descriptor {
    /// BTCTRL: beat size, increments, valid
    btctrl: VolatileCell<u16>,
    /// BTCNT: number of beats
    btcnt: VolatileCell<u16>,
    /// SRCADDR
    srcaddr: VolatileCell<u32>,
    /// DSTADDR
    dstaddr: VolatileCell<u32>,
    /// DESCADDR: next descriptor (0 ends the chain)
    descaddr: VolatileCell<u32>,
}

impl Descriptor {
    /// Size of the descriptor in bytes
    pub const SIZE: usize = 16;

    /// Create a new zeroed (invalid) descriptor.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            btctrl: VolatileCell::new(0),
            btcnt: VolatileCell::new(0),
            srcaddr: VolatileCell::new(0),
            dstaddr: VolatileCell::new(0),
            descaddr: VolatileCell::new(0),
        }
    }

    /// Fill every field, then set VALID.
    pub(crate) fn program(
        &self,
        beat_size: BeatSize,
        src_increment: bool,
        dst_increment: bool,
        count: u16,
        src_addr: u32,
        dst_addr: u32,
    ) {
        let mut ctrl = beat_size.to_btctrl();
        if src_increment {
            ctrl |= btctrl::SRCINC;
        }
        if dst_increment {
            ctrl |= btctrl::DSTINC;
        }

        // VALID stays clear until the rest of the descriptor is in place
        self.btctrl.set(ctrl);
        self.btcnt.set(count);
        self.srcaddr.set(src_addr);
        self.dstaddr.set(dst_addr);
        self.descaddr.set(0);
        self.btctrl.update(|v| v | btctrl::VALID);
    }

    /// Clear VALID so the DMAC ignores this slot.
    pub(crate) fn invalidate(&self) {
        self.btctrl.update(|v| v & !btctrl::VALID);
    }

    /// Check if the descriptor is marked valid.
    #[inline(always)]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (self.btctrl.get() & btctrl::VALID) != 0
    }

    /// Beat size encoded in BTCTRL.
    #[must_use]
    pub fn beat_size(&self) -> BeatSize {
        BeatSize::from_btctrl(self.btctrl.get())
    }

    /// Check if the source address increments.
    #[inline(always)]
    #[must_use]
    pub fn src_increment(&self) -> bool {
        (self.btctrl.get() & btctrl::SRCINC) != 0
    }

    /// Check if the destination address increments.
    #[inline(always)]
    #[must_use]
    pub fn dst_increment(&self) -> bool {
        (self.btctrl.get() & btctrl::DSTINC) != 0
    }

    /// Number of beats (remaining beats, in the write-back copy).
    #[inline(always)]
    #[must_use]
    pub fn count(&self) -> u16 {
        self.btcnt.get()
    }

    /// Source address field.
    #[inline(always)]
    #[must_use]
    pub fn src_addr(&self) -> u32 {
        self.srcaddr.get()
    }

    /// Destination address field.
    #[inline(always)]
    #[must_use]
    pub fn dst_addr(&self) -> u32 {
        self.dstaddr.get()
    }

    /// Next descriptor address field.
    #[inline(always)]
    #[must_use]
    pub fn next_addr(&self) -> u32 {
        self.descaddr.get()
    }

    /// Raw BTCTRL value for debugging.
    #[inline(always)]
    #[must_use]
    pub fn raw_btctrl(&self) -> u16 {
        self.btctrl.get()
    }
}

impl Default for Descriptor {
    fn default() -> Self {
        Self::new()
    }
}
