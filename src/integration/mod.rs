//! External Stack Integrations
//!
//! - **embedded-hal** (`embedded_hal`): [`DmaSpi`] implements
//!   `embedded_hal::spi::SpiBus<u8>` on top of the shared engine, so drivers
//!   written against embedded-hal move their bytes by DMA.
//!
//! # Example
//!
//! ```ignore
//! use embedded_hal::spi::SpiBus;
//!
//! DMA.with(|dma| {
//!     let mut bus = DmaSpi::new(dma, Sercom::new(4).unwrap());
//!     bus.write(&[0x06])?;
//!     bus.transfer(&mut id, &[0x9F])
//! })?;
//! ```

pub mod embedded_hal;

pub use self::embedded_hal::DmaSpi;
