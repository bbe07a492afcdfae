//! Internal Implementation Details
//!
//! This module contains implementation details that are not part of the public API.
//! Types in this module may change without notice between minor versions.
//!
//! # Contents
//!
//! - [`register`]: Raw memory-mapped register definitions (DMAC, SERCOM SPI)
//! - [`constants`]: Channel counts, trigger sources and memory windows
//! - [`descriptor`]: DMAC transfer descriptors and the descriptor tables
//!
//! # Stability
//!
//! **WARNING:** This module is `pub(crate)` only. Do not depend on any types
//! or functions in this module from external code. They are subject to change
//! without notice.

pub(crate) mod constants;
pub(crate) mod descriptor;
pub(crate) mod register;

// Register types are accessed via submodules: register::dmac::DmacRegs, etc.
