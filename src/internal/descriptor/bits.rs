//! DMAC descriptor bit field constants.
//!
//! Based on the SAMD21/SAMD51 datasheet DMAC chapter (BTCTRL register).

#![allow(dead_code)]

/// Block Transfer Control (BTCTRL) bit field constants
pub mod btctrl {
    /// Descriptor Valid - must be written last
    pub const VALID: u16 = 1 << 0;
    /// Event Output Selection shift
    pub const EVOSEL_SHIFT: u16 = 1;
    /// Event Output Selection mask
    pub const EVOSEL_MASK: u16 = 0x3 << 1;
    /// Block Action shift
    pub const BLOCKACT_SHIFT: u16 = 3;
    /// Block Action mask (0 = disable channel when the last block completes)
    pub const BLOCKACT_MASK: u16 = 0x3 << 3;
    /// Beat Size shift
    pub const BEATSIZE_SHIFT: u16 = 8;
    /// Beat Size mask
    pub const BEATSIZE_MASK: u16 = 0x3 << 8;
    /// Source Address Increment Enable
    pub const SRCINC: u16 = 1 << 10;
    /// Destination Address Increment Enable
    pub const DSTINC: u16 = 1 << 11;
    /// Step Selection (0 = step size applies to destination)
    pub const STEPSEL: u16 = 1 << 12;
    /// Address Increment Step Size shift
    pub const STEPSIZE_SHIFT: u16 = 13;
    /// Address Increment Step Size mask
    pub const STEPSIZE_MASK: u16 = 0x7 << 13;
}

/// Beat size encodings for `btctrl::BEATSIZE`
pub mod beatsize {
    /// 8-bit beat
    pub const BYTE: u16 = 0x0;
    /// 16-bit beat
    pub const HWORD: u16 = 0x1;
    /// 32-bit beat
    pub const WORD: u16 = 0x2;
}
