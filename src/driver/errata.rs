//! SAMD51 DMAC start-up erratum workaround.
//!
//! On SAMD51 a freshly enabled channel occasionally never starts while
//! another channel sits pending. Right after arming, the engine samples the
//! controller a bounded number of times; if nothing is moving and the armed
//! channels have not concluded, every enabled channel is disabled and
//! re-enabled, which makes the DMAC re-fetch its descriptors.

use super::engine::DmaEngine;
use super::pool::{ChannelId, all_channels};
use crate::hal::dmac::DmacAccess;

impl<H: DmacAccess> DmaEngine<H> {
    /// Sample the controller after arming; re-kick it if it looks stalled.
    ///
    /// Returns `true` when the re-kick was performed. The re-kick is best
    /// effort and its outcome is not verified.
    pub(super) fn check_started(&mut self, rx: Option<ChannelId>, tx: Option<ChannelId>) -> bool {
        let active = [rx, tx];
        let healthy = (0..self.config.errata_poll_limit).any(|_| {
            self.hal.is_any_busy()
                || active
                    .iter()
                    .flatten()
                    .all(|&channel| self.hal.transfer_status(channel).is_terminal())
        });
        if healthy {
            return false;
        }

        #[cfg(feature = "log")]
        log::warn!(
            "DMAC stalled after {} samples, re-enabling active channels",
            self.config.errata_poll_limit
        );
        #[cfg(feature = "defmt")]
        defmt::warn!("DMAC stalled, re-enabling active channels");

        for channel in all_channels() {
            if self.hal.is_channel_enabled(channel) {
                self.hal.disable_channel(channel);
                self.hal.enable_channel(channel);
            }
        }
        true
    }
}
