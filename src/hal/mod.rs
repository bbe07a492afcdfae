//! Hardware Abstraction Layer
//!
//! This module defines the seams between the transfer engine and the
//! hardware it drives, with register-backed implementations:
//!
//! - [`dmac`]: [`DmacAccess`] trait and the [`Dmac`] register backend
//! - [`peripheral`]: [`DmaPeripheral`] trait describing a transfer endpoint
//! - [`sercom`]: SERCOM SPI endpoint ([`Sercom`])
//! - [`qspi`]: memory-mapped QSPI flash window ([`QspiWindow`], SAMD51 only)
//!
//! Host tests drive the engine through simulated implementations of both
//! traits instead of the register backends.

pub mod dmac;
pub mod peripheral;
#[cfg(feature = "samd51")]
#[cfg_attr(docsrs, doc(cfg(feature = "samd51")))]
pub mod qspi;
pub mod sercom;

// Re-export commonly used types
pub use dmac::{ChannelHalt, Dmac, DmacAccess, DmacHalt, TransferStatus};
pub use peripheral::{DmaPeripheral, PeripheralKind};
#[cfg(feature = "samd51")]
pub use qspi::QspiWindow;
pub use sercom::Sercom;
