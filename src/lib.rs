//! SAMD Shared DMA Engine
//!
//! A `no_std`, `no_alloc` driver that multiplexes the DMAC channels of a
//! SAMD21 or SAMD51 microcontroller across peripherals: full-duplex SERCOM
//! SPI buses and, on SAMD51, the memory-mapped QSPI flash window.
//!
//! # Architecture
//!
//! 1. **Engine** ([`driver`]): channel pool, descriptor programming and the
//!    start / poll / close transfer lifecycle
//! 2. **HAL Layer** ([`hal`]): DMAC register access and transfer endpoints
//!    behind the [`DmacAccess`] and [`DmaPeripheral`] traits
//! 3. **Sharing** ([`sync`]): critical-section wrapper for a `static` engine
//! 4. **Integration** ([`integration`]): `embedded-hal` SPI bus
//!
//! ## Transfer lifecycle
//!
//! [`DmaEngine::start`] allocates channels, programs one descriptor per
//! direction (receive first), arms the channels and returns a [`Transfer`].
//! [`DmaEngine::finished`] advances the completion protocol without
//! blocking; [`DmaEngine::close`] releases the channels and reports the
//! byte count. The blocking wrappers (`serial_write`, `serial_read`,
//! `serial_transfer`, `qspi_write`, `qspi_read`) run all three.
//!
//! `start` only accepts `'static` buffers. Stack buffers go through the
//! blocking wrappers or the `unsafe` [`DmaEngine::start_borrowed`], whose
//! caller promises not to leak the transfer. Dropping a [`Transfer`]
//! disables its channels.
//!
//! # Features
//!
//! - `samd51` (default): Target SAMD51 (32 channels, QSPI, start-up erratum workaround)
//! - `samd21`: Target SAMD21 (12 channels)
//! - `defmt`: Enable defmt formatting and logging
//! - `log`: Enable `log` warnings for recovered stalls and incomplete transfers
//!
//! # Example
//!
//! ```ignore
//! use samd_shared_dma::{DmaConfig, Sercom, SharedDma};
//! use samd_shared_dma::hal::Dmac;
//!
//! static DMA: SharedDma<Dmac> = SharedDma::new(Dmac::new());
//!
//! DMA.with(|dma| dma.init(DmaConfig::default())).unwrap();
//!
//! let mut sercom = Sercom::new(4).unwrap();
//! let mut id = [0u8; 4];
//! DMA.with(|dma| dma.serial_transfer(&mut sercom, &[0x9F, 0, 0, 0], &mut id, 4))?;
//! ```
//!
//! # Memory Requirements
//!
//! The descriptor tables take 16 bytes per channel twice over, plus one fill
//! byte per channel: about 1 KB on SAMD51 and 400 bytes on SAMD21. The
//! engine must stay at a fixed address after `init`.

#![cfg_attr(docsrs, doc(cfg_hide(feature = "samd21")))]
#![no_std]
#![deny(missing_docs)]
#![allow(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
// Clippy lint levels live here; thresholds and config are in clippy.toml.
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::struct_excessive_bools,
    clippy::fn_params_excessive_bools,
    clippy::type_complexity,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements,
    clippy::let_underscore_future
)]
#[cfg(all(feature = "samd21", feature = "samd51"))]
compile_error!("Features 'samd21' and 'samd51' are mutually exclusive.");

#[cfg(not(any(feature = "samd21", feature = "samd51")))]
compile_error!("Either feature 'samd21' or 'samd51' must be enabled. The default is 'samd51'.");

// =============================================================================
// Modules
// =============================================================================

pub mod driver;
pub mod hal;
pub mod integration;
pub mod sync;

// Internal implementation details (pub(crate) only)
mod internal;

// Test utilities (only available during testing)
#[cfg(test)]
pub mod testing;

/// Chip constants: channel counts, trigger sources, memory windows.
pub mod constants {
    pub use crate::internal::constants::*;
}

// =============================================================================
// Re-exports
// =============================================================================

pub use driver::config::{DmaConfig, State};
pub use driver::engine::DmaEngine;
pub use driver::error::{ConfigError, ConfigResult, DmaError, DmaResult, Error, Result};
pub use driver::pool::{ChannelId, ChannelPool};
pub use driver::transfer::{Progress, Transfer, TransferConfig, TransferState};
pub use hal::{ChannelHalt, DmaPeripheral, DmacAccess, PeripheralKind, Sercom, TransferStatus};
#[cfg(feature = "samd51")]
pub use hal::QspiWindow;
pub use integration::DmaSpi;
pub use internal::descriptor::{BeatSize, Descriptor, DescriptorTable};
pub use sync::{CriticalSectionCell, SharedDma};

/// Low-level register accessors for advanced use.
///
/// These are intentionally separated from the primary facade. Most users should
/// prefer the engine APIs instead of touching registers directly.
///
/// # Safety
///
/// Direct register access bypasses engine invariants. Use only if you fully
/// understand the SAMD DMAC hardware and accept responsibility for correct
/// sequencing and synchronization.
pub mod unsafe_registers {
    pub use crate::internal::register::dmac::{DmacClock, DmacRegs};
    pub use crate::internal::register::sercom::SercomSpiRegs;
}
