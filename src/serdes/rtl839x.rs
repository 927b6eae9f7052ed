//! RTL839x internal SerDes 12 and 13.
//!
//! Both lanes are seen by the SoC as a simulated PHY (addresses 48 and 49)
//! whose registers live in the 2048 bit wide `SDS12_13_XSG0` register. Bit 15
//! of PHY register 0 is bit 1023 of it (byte 0x80), two 16 bit PHY registers
//! share one 32 bit word.

use embedded_hal::delay::DelayNs;

use super::{forward_soc_and_delay, LaneState, PhyInterface, SerdesBus, SerdesGeneration};
use crate::soc::{SocInfo, SocRegisters, RTL839X_SDS12_13_XSG0};
use crate::Error;

/// PHY address of SerDes 12.
pub const SDS12_PHY_ADDR: u32 = 48;
/// PHY address of SerDes 13.
pub const SDS13_PHY_ADDR: u32 = 49;

// In autoneg state, force link (SR4_CFG_EN_LINK_FIB1G)
const SR4_CFG_EN_LINK_FIB1G: u32 = 1 << 18;
// FRE16_EEE_RSG_FIB1G, FRE16_EEE_STD_FIB1G, FRE16_C1_PWRSAV_EN_FIB1G,
// FRE16_C2_PWRSAV_EN_FIB1G and FRE16_EEE_QUIET_FIB1G
const FRE16_EEE_FIB1G: u32 = 0x1f << 10;

/// Offset of the register block of the SerDes at `phy_addr`.
pub(crate) fn xsg_offset(phy_addr: u32) -> Result<u32, Error> {
    match phy_addr {
        SDS12_PHY_ADDR => Ok(0),
        SDS13_PHY_ADDR => Ok(0x100),
        _ => Err(Error::InvalidAddress(phy_addr)),
    }
}

/// [`SerdesBus`] over the simulated SerDes PHYs. The lane is the PHY
/// address (48 or 49), pages do not exist.
pub struct Rtl839xBus<'a, R, D> {
    regs: &'a mut R,
    delay: &'a mut D,
    fake_id: bool,
}

impl<'a, R: SocRegisters, D: DelayNs> Rtl839xBus<'a, R, D> {
    /// `fake_id`: answer the PHY id registers with the RTL8393 id, which
    /// would otherwise read as 0.
    pub(crate) fn new(regs: &'a mut R, delay: &'a mut D, fake_id: bool) -> Self {
        Self { regs, delay, fake_id }
    }
}

forward_soc_and_delay!(Rtl839xBus);

impl<'a, R: SocRegisters, D: DelayNs> SerdesBus for Rtl839xBus<'a, R, D> {
    fn read_sds(&mut self, lane: u32, _page: u32, reg: u32) -> Result<u16, Error> {
        let offset = xsg_offset(lane)?;
        if self.fake_id {
            match reg {
                2 => return Ok(0x1c),
                3 => return Ok(0x8393),
                _ => {}
            }
        }

        let v = self.regs.read32(RTL839X_SDS12_13_XSG0 + offset + 0x80 + ((reg << 1) & 0xfc));
        if reg & 1 != 0 {
            Ok((v >> 16) as u16)
        } else {
            Ok((v & 0xffff) as u16)
        }
    }

    fn write_sds(&mut self, lane: u32, _page: u32, reg: u32, val: u16) -> Result<(), Error> {
        let offset = xsg_offset(lane)?;
        let addr = RTL839X_SDS12_13_XSG0 + offset + 0x80 + ((reg << 1) & 0xfc);
        if reg & 1 != 0 {
            self.regs.mask32(addr, 0xffff_0000, u32::from(val) << 16);
        } else {
            self.regs.mask32(addr, 0xffff, u32::from(val));
        }
        Ok(())
    }
}

/// Read SPD_RD_00 (bit 13) and SPD_RD_01 (bit 6) of the SerDes at `phy_addr`:
/// `true` for 1000M, `false` for 100M.
pub(crate) fn speed_is_1000<R: SocRegisters>(regs: &mut R, phy_addr: u32) -> Result<bool, Error> {
    let v = regs.read32(RTL839X_SDS12_13_XSG0 + xsg_offset(phy_addr)? + 0x80);
    Ok(v & (1 << 13) == 0 && v & (1 << 6) != 0)
}

/// The RTL839x fibre SerDes 12 and 13.
pub struct Rtl839xSerdes;

impl SerdesGeneration for Rtl839xSerdes {
    const LANES: u32 = 14;

    /// Only SerDes 12 and 13 are handled, both run 1G fibre (SGMII or
    /// 1000BASE-X). The link is forced and EEE is switched off.
    fn set_mode<B: SerdesBus>(bus: &mut B, _soc: &SocInfo, lane: u32, mode: PhyInterface) -> Result<LaneState, Error> {
        let offset = match lane {
            12 => 0,
            13 => 0x100,
            _ => return Err(Error::InvalidLane(lane)),
        };
        let base = RTL839X_SDS12_13_XSG0 + offset;

        match mode {
            PhyInterface::Na => {
                bus.mask32(base + 0x0a, SR4_CFG_EN_LINK_FIB1G, 0);
                Ok(LaneState::Disabled)
            }
            PhyInterface::Sgmii | PhyInterface::_1000BaseX => {
                debug!("SerDes {}: forcing 1G fibre link", lane);
                bus.mask32(base + 0x0a, 0, SR4_CFG_EN_LINK_FIB1G);
                bus.mask32(base + 0xe0, FRE16_EEE_FIB1G, 0);
                Ok(LaneState::ModeForced(mode))
            }
            _ => Err(Error::UnsupportedMode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockDelay, MockRegs};

    #[test]
    fn odd_registers_use_upper_half() {
        let mut regs = MockRegs::default();
        let mut delay = MockDelay::default();
        regs.regs.insert(0xb800 + 0x80, 0x796d_1140);
        regs.regs.insert(0xb900 + 0x80 + 4, 0x0000_01e1);

        let mut bus = Rtl839xBus::new(&mut regs, &mut delay, false);
        assert_eq!(bus.read_sds(48, 0, 0), Ok(0x1140));
        assert_eq!(bus.read_sds(48, 0, 1), Ok(0x796d));
        assert_eq!(bus.read_sds(49, 0, 2), Ok(0x01e1));

        bus.write_sds(48, 0, 1, 0x7949).unwrap();
        assert_eq!(regs.get(0xb880), 0x7949_1140);
    }

    #[test]
    fn rtl8393_fakes_phy_id() {
        let mut regs = MockRegs::default();
        let mut delay = MockDelay::default();
        let mut bus = Rtl839xBus::new(&mut regs, &mut delay, true);
        assert_eq!(bus.read_sds(49, 0, 2), Ok(0x1c));
        assert_eq!(bus.read_sds(49, 0, 3), Ok(0x8393));
        assert_eq!(bus.read_sds(47, 0, 2), Err(Error::InvalidAddress(47)));
    }

    #[test]
    fn fibre_link_forced_and_eee_off() {
        let mut sw = crate::testing::switch(0x8393);
        sw.regs.regs.insert(0xb800 + 0xe0, 0xffff_ffff);
        let soc = *sw.soc();

        let state = Rtl839xSerdes::set_mode(&mut sw.rtl839x_bus(), &soc, 12, PhyInterface::_1000BaseX);
        assert_eq!(state, Ok(LaneState::ModeForced(PhyInterface::_1000BaseX)));
        assert_eq!(sw.regs.get(0xb800 + 0x0a), 1 << 18);
        assert_eq!(sw.regs.get(0xb800 + 0xe0), 0xffff_83ff);

        let state = Rtl839xSerdes::set_mode(&mut sw.rtl839x_bus(), &soc, 12, PhyInterface::_10GBaseR);
        assert_eq!(state, Err(Error::UnsupportedMode));
        let state = Rtl839xSerdes::set_mode(&mut sw.rtl839x_bus(), &soc, 3, PhyInterface::Sgmii);
        assert_eq!(state, Err(Error::InvalidLane(3)));
    }

    #[test]
    fn speed_bits() {
        let mut regs = MockRegs::default();
        regs.regs.insert(0xb980, 1 << 6);
        assert_eq!(speed_is_1000(&mut regs, 49), Ok(true));
        regs.regs.insert(0xb980, 1 << 6 | 1 << 13);
        assert_eq!(speed_is_1000(&mut regs, 49), Ok(false));
    }
}
