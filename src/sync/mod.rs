//! Synchronization and Concurrency Support
//!
//! The engine is process-wide state reached from thread and interrupt
//! context. This module provides:
//!
//! - [`CriticalSectionCell`]: ISR-safe interior mutability
//! - [`SharedDma`]: critical-section protected engine for `static` placement
//!
//! # Example
//!
//! ```ignore
//! use samd_shared_dma::sync::SharedDma;
//! use samd_shared_dma::hal::Dmac;
//!
//! static DMA: SharedDma<Dmac> = SharedDma::new(Dmac::new());
//!
//! fn main() {
//!     DMA.with(|dma| dma.init(DmaConfig::default())).unwrap();
//! }
//!
//! #[interrupt]
//! fn SERCOM4_2() {
//!     // Back off if thread code is mid-transfer
//!     DMA.try_with(|dma| dma.allocate_channel(false));
//! }
//! ```

mod primitives;

pub use primitives::CriticalSectionCell;

mod shared;

pub use shared::SharedDma;
