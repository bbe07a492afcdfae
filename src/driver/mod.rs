//! Core engine components for the SAMD DMAC.
//!
//! - [`config`] - Configuration types and builder patterns
//! - [`error`] - Error types and result aliases
//! - [`pool`] - Channel identifiers and allocation bookkeeping
//! - [`engine`] - The [`DmaEngine`] and its channel operations
//! - [`lifecycle`] - Transfer start, completion polling and close
//! - [`transfer`] - The [`Transfer`] handle
//!
//! # Example
//!
//! ```ignore
//! use samd_shared_dma::driver::{DmaConfig, DmaEngine, Error};
//!
//! let config = DmaConfig::new()
//!     .with_reserved_channels(2)
//!     .with_priority_levels(0b0011);
//! ```

// Submodules
pub mod config;
pub mod engine;
#[cfg(feature = "samd51")]
mod errata;
pub mod error;
pub mod lifecycle;
pub mod pool;
pub mod transfer;

// Re-exports for convenience
pub use config::{DmaConfig, State};
pub use engine::DmaEngine;
pub use error::{ConfigError, ConfigResult, DmaError, DmaResult, Error, Result};
pub use pool::{ChannelId, ChannelPool, all_channels};
pub use transfer::{Progress, Transfer, TransferConfig, TransferState};
