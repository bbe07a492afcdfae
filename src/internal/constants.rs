//! Driver constants: channel counts, trigger sources, memory windows.

// =============================================================================
// Channel Counts
// =============================================================================

/// Number of DMAC channels on the SAMD21
#[cfg(feature = "samd21")]
pub const CHANNEL_COUNT: usize = 12;

/// Number of DMAC channels on the SAMD51
#[cfg(feature = "samd51")]
pub const CHANNEL_COUNT: usize = 32;

/// Default size of the reserved (continuous/periodic use) partition
pub const DEFAULT_RESERVED_CHANNELS: u8 = 4;

// =============================================================================
// Descriptor Format
// =============================================================================

/// Size of one hardware descriptor in bytes
pub const DESCRIPTOR_SIZE: usize = 16;

/// Required alignment of the descriptor and write-back tables
pub const DESCRIPTOR_ALIGN: usize = 16;

/// Maximum beats in one descriptor (BTCNT is 16 bits)
pub const MAX_BEAT_COUNT: usize = u16::MAX as usize;

/// Bytes per beat for word-oriented peripherals
pub const WORD_SIZE: usize = 4;

// =============================================================================
// Trigger Sources
// =============================================================================

/// SERCOM0 RX trigger source; SERCOMn RX is `FIRST_SERCOM_RX_TRIGSRC + 2n`
#[cfg(feature = "samd21")]
pub const FIRST_SERCOM_RX_TRIGSRC: u8 = 0x01;

/// SERCOM0 TX trigger source; SERCOMn TX is `FIRST_SERCOM_TX_TRIGSRC + 2n`
#[cfg(feature = "samd21")]
pub const FIRST_SERCOM_TX_TRIGSRC: u8 = 0x02;

/// SERCOM0 RX trigger source; SERCOMn RX is `FIRST_SERCOM_RX_TRIGSRC + 2n`
#[cfg(feature = "samd51")]
pub const FIRST_SERCOM_RX_TRIGSRC: u8 = 0x04;

/// SERCOM0 TX trigger source; SERCOMn TX is `FIRST_SERCOM_TX_TRIGSRC + 2n`
#[cfg(feature = "samd51")]
pub const FIRST_SERCOM_TX_TRIGSRC: u8 = 0x05;

/// QSPI receive trigger source
#[cfg(feature = "samd51")]
pub const QSPI_DMAC_ID_RX: u8 = 0x53;

/// QSPI transmit trigger source
#[cfg(feature = "samd51")]
pub const QSPI_DMAC_ID_TX: u8 = 0x54;

/// Trigger source used for software-only triggering
pub const TRIGSRC_DISABLE: u8 = 0x00;

// =============================================================================
// Memory Windows
// =============================================================================

/// Base address of the QSPI AHB (memory-mapped flash) window
#[cfg(feature = "samd51")]
pub const QSPI_AHB_BASE: u32 = 0x0400_0000;

/// Size of the QSPI AHB window in bytes
#[cfg(feature = "samd51")]
pub const QSPI_AHB_SIZE: u32 = 0x0100_0000;

// =============================================================================
// Errata Workaround
// =============================================================================

/// Samples taken before deciding that freshly armed channels never started
pub const ERRATA_POLL_LIMIT: u8 = 10;

// =============================================================================
// Priority Levels
// =============================================================================

/// Default enabled priority levels (LVLEN0 only)
pub const DEFAULT_PRIORITY_LEVELS: u8 = 0b0001;
