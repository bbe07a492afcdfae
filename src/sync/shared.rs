//! ISR-safe engine wrapper using critical sections.

use super::primitives::CriticalSectionCell;
use crate::driver::engine::DmaEngine;
use crate::hal::dmac::DmacAccess;

/// ISR-safe DMA engine wrapper using critical sections.
///
/// All access goes through `critical_section::with()`, disabling interrupts
/// for the duration of the closure. Transfers started inside a closure do
/// not borrow the engine, so they can be polled across several short
/// closures instead of one long one.
///
/// # Example
///
/// ```ignore
/// static DMA: SharedDma<Dmac> = SharedDma::new(Dmac::new());
///
/// DMA.with(|dma| dma.init(DmaConfig::default())).unwrap();
///
/// static DATA: [u8; 4] = [0x9F, 0, 0, 0];
/// let mut sercom = Sercom::new(1).unwrap();
/// let sercom = &mut sercom;
/// let mut transfer = DMA.with(move |dma| dma.start(sercom, Some(&DATA), None, DATA.len(), 0));
/// while !DMA.with(|dma| dma.finished(&mut transfer)) {}
/// DMA.with(|dma| dma.close(transfer)).unwrap();
/// ```
pub struct SharedDma<H: DmacAccess> {
    inner: CriticalSectionCell<DmaEngine<H>>,
}

impl<H: DmacAccess> SharedDma<H> {
    /// Create a new shared engine (const, suitable for static initialization).
    pub const fn new(hal: H) -> Self {
        Self {
            inner: CriticalSectionCell::new(DmaEngine::new(hal)),
        }
    }

    /// Execute a closure with exclusive access to the engine.
    ///
    /// Interrupts are disabled for the duration of the closure.
    #[inline]
    pub fn with<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut DmaEngine<H>) -> R,
    {
        self.inner.with(f)
    }

    /// Try to execute a closure, returning `None` if already borrowed.
    #[inline]
    pub fn try_with<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut DmaEngine<H>) -> R,
    {
        self.inner.try_with(f)
    }

    /// Check whether the engine has been initialized.
    pub fn is_initialized(&self) -> bool {
        self.inner.with_ref(|dma| dma.is_initialized())
    }

    /// Number of allocated channels.
    pub fn allocated_channels(&self) -> usize {
        self.inner.with_ref(|dma| dma.pool().allocated_count())
    }
}
