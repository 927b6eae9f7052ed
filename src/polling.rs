//! The SoC polls the PHYs over the SMI bus on its own to detect link and
//! media changes. Patching or reconfiguring a PHY while it is being polled
//! may fail or leave it in an unpredictable state, so such sequences run
//! with polling for the port switched off.
//!
//! [`Switch::disable_polling`] hands out a [`PollingState`] snapshot of the
//! whole polling register; [`Switch::resume_polling`] consumes it and writes
//! it back verbatim.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embedded_hal::delay::DelayNs;

use crate::family::ChipFamily;
use crate::soc::{
    SocRegisters, RTL838X_SMI_POLL_CTRL, RTL839X_SMI_PORT_POLLING_CTRL, RTL930X_SMI_POLL_CTRL,
};
use crate::{Error, PhyAccess, Switch};

/// Protects the read-modify-write of the polling enable registers.
static POLL_LOCK: Mutex<CriticalSectionRawMutex, ()> = Mutex::new(());

/// Polling enable register contents saved by [`Switch::disable_polling`].
///
/// Wide enough for the 64 bit RTL839x register pair. Must be handed back to
/// [`Switch::resume_polling`] exactly once.
#[must_use = "polling stays disabled until the state is resumed"]
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollingState {
    saved: Option<u64>,
}

impl PollingState {
    /// The saved register value, `None` if the family cannot suspend polling.
    pub fn bits(&self) -> Option<u64> {
        self.saved
    }
}

impl<M: PhyAccess, R: SocRegisters, D: DelayNs> Switch<M, R, D> {
    /// Stop the SoC from polling `port` and return the previous polling state.
    pub fn disable_polling(&mut self, port: u8) -> Result<PollingState, Error> {
        let family = self.soc.family()?;
        let regs = &mut self.regs;
        let saved = POLL_LOCK.lock(|_| match family {
            ChipFamily::Rtl838x => {
                let saved = regs.read32(RTL838X_SMI_POLL_CTRL);
                regs.mask32(RTL838X_SMI_POLL_CTRL, bit32(port), 0);
                Some(u64::from(saved))
            }
            ChipFamily::Rtl839x => {
                let hi = regs.read32(RTL839X_SMI_PORT_POLLING_CTRL + 4);
                let lo = regs.read32(RTL839X_SMI_PORT_POLLING_CTRL);
                let reg = RTL839X_SMI_PORT_POLLING_CTRL + ((u32::from(port) >> 5) << 2);
                regs.mask32(reg, 1 << (port % 32), 0);
                Some(u64::from(hi) << 32 | u64::from(lo))
            }
            ChipFamily::Rtl930x => {
                let saved = regs.read32(RTL930X_SMI_POLL_CTRL);
                regs.mask32(RTL930X_SMI_POLL_CTRL, bit32(port), 0);
                Some(u64::from(saved))
            }
            ChipFamily::Rtl931x => None,
        });

        if saved.is_none() {
            warn!("disabling SMI polling is not implemented for RTL931x, port {}", port);
        }
        Ok(PollingState { saved })
    }

    /// Restore the polling register to the snapshot taken by [`Self::disable_polling`].
    pub fn resume_polling(&mut self, state: PollingState) -> Result<(), Error> {
        let family = self.soc.family()?;
        let Some(saved) = state.saved else {
            warn!("resuming SMI polling is not implemented for RTL931x");
            return Ok(());
        };

        let regs = &mut self.regs;
        POLL_LOCK.lock(|_| match family {
            ChipFamily::Rtl838x => regs.write32(RTL838X_SMI_POLL_CTRL, saved as u32),
            ChipFamily::Rtl839x => {
                regs.write32(RTL839X_SMI_PORT_POLLING_CTRL + 4, (saved >> 32) as u32);
                regs.write32(RTL839X_SMI_PORT_POLLING_CTRL, saved as u32);
            }
            ChipFamily::Rtl930x => regs.write32(RTL930X_SMI_POLL_CTRL, saved as u32),
            ChipFamily::Rtl931x => {}
        });
        Ok(())
    }

    /// Run `f` with polling of `port` disabled.
    ///
    /// Polling is resumed whether or not `f` succeeds.
    pub fn with_polling_disabled<T>(
        &mut self,
        port: u8,
        f: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let state = self.disable_polling(port)?;
        let res = f(self);
        self.resume_polling(state)?;
        res
    }
}

/// Ports past the register width wrap like the 32 bit shift of the hardware registers.
fn bit32(port: u8) -> u32 {
    1u32.wrapping_shl(u32::from(port))
}
