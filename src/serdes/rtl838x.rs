//! RTL838x internal SerDes.
//!
//! The SoC mirrors the standard page 0 registers of the two fibre SerDes
//! (PHY addresses 24 and 26) into 32 bit switch registers, one 16 bit PHY
//! register per word.

use embedded_hal::delay::DelayNs;

use super::{forward_soc_and_delay, SerdesBus};
use crate::soc::{SocRegisters, RTL838X_SDS4_FIB_REG0};
use crate::Error;

/// [`SerdesBus`] over the RTL838x SerDes register window. The lane is the
/// PHY address (24 or 26), pages do not exist.
pub struct Rtl838xBus<'a, R, D> {
    regs: &'a mut R,
    delay: &'a mut D,
}

impl<'a, R: SocRegisters, D: DelayNs> Rtl838xBus<'a, R, D> {
    pub(crate) fn new(regs: &'a mut R, delay: &'a mut D) -> Self {
        Self { regs, delay }
    }
}

forward_soc_and_delay!(Rtl838xBus);

fn window(phy_addr: u32, reg: u32) -> Result<u32, Error> {
    let offset = match phy_addr {
        24 => 0,
        26 => 0x100,
        _ => return Err(Error::InvalidAddress(phy_addr)),
    };
    if reg >= 0x20 {
        return Err(Error::InvalidAddress(reg));
    }
    Ok(RTL838X_SDS4_FIB_REG0 + offset + (reg << 2))
}

impl<'a, R: SocRegisters, D: DelayNs> SerdesBus for Rtl838xBus<'a, R, D> {
    fn read_sds(&mut self, lane: u32, _page: u32, reg: u32) -> Result<u16, Error> {
        let addr = window(lane, reg)?;
        Ok((self.regs.read32(addr) & 0xffff) as u16)
    }

    fn write_sds(&mut self, lane: u32, _page: u32, reg: u32, val: u16) -> Result<(), Error> {
        let addr = window(lane, reg)?;
        self.regs.mask32(addr, 0xffff, u32::from(val));
        Ok(())
    }
}
