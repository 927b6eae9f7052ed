//! Probe time configuration and firmware patching of the PHYs.
//!
//! The octal and quad PHYs must be patched while they still accept it,
//! i.e. right after power up. Each chip is configured once, through the
//! PHY at its base address (a multiple of 8); the other ports of the chip
//! are left alone when they are probed.
//!
//! Patching follows the same steps on every chip: check the internal id,
//! load and validate the firmware image, request patch mode and wait until
//! each port reports ready, then write the firmware records in file order.
//! Per port records of the external PHYs are written once through the
//! broadcast id of the chip.

use embedded_hal::delay::DelayNs;

use crate::family::ChipFamily;
use crate::firmware::{self, Firmware, FirmwareLoader, Pairs};
use crate::phy::regs::*;
use crate::phy::{PhyDevice, PhyModel};
use crate::serdes::rtl839x::Rtl839xSerdes;
use crate::serdes::{rtl930x, PhyInterface, SerdesGeneration};
use crate::soc::*;
use crate::{Error, PhyAccess, Switch};

/// Internal id of the RTL8218B inside the RTL838x.
pub const INTERNAL_ID_RTL8218B_INT: u16 = 0x6275;
/// Internal id of the external RTL8218B and the RTL8214FC.
pub const INTERNAL_ID_RTL8218B_EXT: u16 = 0x6276;

/// Reads of the patch ready bit per port.
pub const READY_POLLS: u32 = 100;

const PATCH_REQUEST: u16 = 0x0010;
const PATCH_READY: u16 = 0x0040;

const REG_PATCH: C22 = C22(0x10);
const REG_BROADCAST_ID: C22 = C22(0x16);
const REG_AUTOSENSE: C22 = C22(0x10);
const REG_SERDES_MERGE: u32 = 0x13;

impl<M: PhyAccess, R: SocRegisters, D: DelayNs> Switch<M, R, D> {
    /// Configure `dev` when it is first attached.
    ///
    /// Images are fetched through `loader` only for the models that need
    /// them. A failure leaves the PHY unpatched; it must be probed again
    /// (after a power cycle) rather than used.
    pub fn probe<L: FirmwareLoader>(&mut self, dev: &PhyDevice, loader: &mut L) -> Result<(), Error> {
        let addr = dev.addr();
        let family = self.soc.family()?;
        let base = addr % 8 == 0;
        debug!("probe {:?} at {}", dev.model(), addr);

        match dev.model() {
            PhyModel::Rtl8214c if base => self.configure_rtl8214c(addr),
            PhyModel::Rtl8214fc => {
                // The RTL8393 has internal SerDes at these addresses.
                if self.soc.id() == 0x8393 {
                    return Err(Error::UnsupportedFamily);
                }
                if base {
                    self.configure_rtl8214fc(addr, loader)?;
                }
                Ok(())
            }
            PhyModel::Rtl8218bExternal if base && family == ChipFamily::Rtl838x => {
                self.configure_ext_rtl8218b(addr, loader)
            }
            PhyModel::Rtl8218bInternal => {
                if family != ChipFamily::Rtl838x || addr >= 24 {
                    return Err(Error::UnsupportedFamily);
                }
                if base {
                    self.configure_int_rtl8218b(addr, loader)?;
                }
                Ok(())
            }
            PhyModel::Rtl8380Serdes => {
                if family != ChipFamily::Rtl838x || addr < 24 || self.soc.id() != 0x8380 {
                    return Err(Error::UnsupportedFamily);
                }
                // PHYs 24 to 27 connect to the SerDes, configured once.
                if addr == 24 {
                    self.with_polling_disabled(addr, |sw| sw.configure_rtl8380_serdes(loader))?;
                }
                Ok(())
            }
            PhyModel::Rtl8393Serdes => {
                if family != ChipFamily::Rtl839x || addr < 24 {
                    return Err(Error::UnsupportedFamily);
                }
                info!("internal RTL8390 SerDes");
                let soc = self.soc;
                self.with_polling_disabled(addr, |sw| {
                    Rtl839xSerdes::set_mode(&mut sw.rtl839x_bus(), &soc, 12, PhyInterface::_1000BaseX)
                })?;
                Ok(())
            }
            PhyModel::Rtl8390Generic => {
                if family != ChipFamily::Rtl839x || addr < 24 {
                    return Err(Error::UnsupportedFamily);
                }
                self.configure_rtl8390_generic(addr)
            }
            PhyModel::Rtl9300Serdes => {
                if family != ChipFamily::Rtl930x || addr < 24 {
                    return Err(Error::UnsupportedFamily);
                }
                let Some(lane) = dev.sds() else {
                    error!("port {}: no SerDes assigned", addr);
                    return Err(Error::InvalidLane(u32::MAX));
                };
                let soc = self.soc;
                let mode = dev.interface();
                self.with_polling_disabled(addr, |sw| {
                    rtl930x::configure_serdes(&mut sw.rtl930x_bus(), &soc, addr, lane, mode)
                })?;
                Ok(())
            }
            // Nothing to patch (RTL8218D, RTL8226) or not the base address.
            _ => Ok(()),
        }
    }

    fn read_internal_id(&mut self, mac: u8) -> Result<u16, Error> {
        self.write_phy(mac, 31, REG_INDIRECT_ADDR, 0x0002)?;
        self.read_phy(mac, 31, REG_INDIRECT_DATA)
    }

    fn expect_internal_id(&mut self, mac: u8, expected: u16) -> Result<(), Error> {
        let id = self.read_internal_id(mac)?;
        if id != expected {
            error!("port {}: expected internal id {:x}, found {:x}", mac, expected, id);
            return Err(Error::UnexpectedPhyId(u32::from(id)));
        }
        Ok(())
    }

    /// Power the PHY up if it is powered down, soft reset it otherwise.
    fn power_up_or_reset(&mut self, mac: u8, fibre_combo: bool) -> Result<(), Error> {
        let power_reg = if fibre_combo { C22(0x10) } else { C22::BMCR };
        let v = self.read_phy(mac, 0, power_reg)?;
        if v & BMCR_POWER_DOWN != 0 {
            if fibre_combo {
                self.rtl8214fc_power(mac, true)?;
            } else {
                self.phy_power(mac, true)?;
            }
        } else {
            self.phy_reset(mac)?;
        }
        self.delay_ms(100);
        Ok(())
    }

    fn request_patch(&mut self, mac: u8, ports: u8) -> Result<(), Error> {
        for p in 0..ports {
            self.write_phy(mac + p, PAGE_PARK, PAGE_SELECT, PAGE_PATCH_REQ)?;
            self.write_phy(mac + p, PAGE_PARK, REG_PATCH, PATCH_REQUEST)?;
        }
        Ok(())
    }

    fn wait_patch_ready(&mut self, mac: u8, ports: u8) -> Result<(), Error> {
        for p in 0..ports {
            self.poll_bits(mac + p, PAGE_PATCH_STATUS, REG_PATCH, |v| v & PATCH_READY != 0)
                .map_err(|e| {
                    error!("port {} not ready for patch", mac + p);
                    e
                })?;
        }
        Ok(())
    }

    /// Read `reg` until `done` holds, at most [`READY_POLLS`] times, 1ms apart.
    fn poll_bits(&mut self, port: u8, page: u16, reg: C22, done: impl Fn(u16) -> bool) -> Result<(), Error> {
        for _ in 0..READY_POLLS {
            if done(self.read_phy(port, page, reg)?) {
                return Ok(());
            }
            self.delay_ms(1);
        }
        Err(Error::Timeout)
    }

    fn enable_phys(&mut self, mac: u8, ports: u8) -> Result<(), Error> {
        for p in 0..ports {
            self.write_phy(mac + p, PAGE_PARK, PAGE_SELECT, 0)?;
            self.write_phy(mac + p, PAGE_PARK, C22::BMCR, BMCR_ENABLE_1000_FULL)?;
        }
        self.delay_ms(100);
        Ok(())
    }

    /// Make writes to `mac` reach every port of the chip (`enter`), or
    /// restore unique addressing.
    fn broadcast(&mut self, mac: u8, enter: bool) -> Result<(), Error> {
        let id = if enter { 0xff00 + u16::from(mac) } else { u16::from(mac) };
        self.write_phy(mac, PAGE_PARK, PAGE_SELECT, 0)?;
        self.write_phy(mac, PAGE_PARK, REG_PORT_SELECT, 0x0008)?;
        self.write_phy(mac, PAGE_PARK, PAGE_SELECT, PAGE_BROADCAST)?;
        self.write_phy(mac, PAGE_PARK, REG_BROADCAST_ID, id)?;
        self.write_phy(mac, PAGE_PARK, PAGE_SELECT, 0)?;
        self.write_phy(mac, PAGE_PARK, REG_PORT_SELECT, 0)?;
        self.delay_ms(1);
        Ok(())
    }

    fn write_pairs(&mut self, port: u8, pairs: Pairs<'_>) -> Result<(), Error> {
        for (reg, val) in pairs {
            let reg = C22::from_raw(reg).ok_or(Error::InvalidAddress(reg))?;
            self.write_phy(port, PAGE_PARK, reg, val as u16)?;
        }
        Ok(())
    }

    fn triple_port(mac: u8, offset: u32) -> Result<u8, Error> {
        u8::try_from(offset)
            .ok()
            .and_then(|o| mac.checked_add(o))
            .ok_or(Error::InvalidAddress(offset))
    }

    fn configure_int_rtl8218b<L: FirmwareLoader>(&mut self, mac: u8, loader: &mut L) -> Result<(), Error> {
        let phy_id = self.read_phy_id(mac)?;
        debug!("phy on port {}: {:x}", mac, phy_id);
        self.expect_internal_id(mac, INTERNAL_ID_RTL8218B_INT)?;
        info!("internal RTL8218B on port {}", mac);

        let fw = firmware::request(loader, firmware::FW_RTL8380, firmware::MODEL_RTL8380)?;
        let intphy = fw.pairs(8)?;
        let hw_esd = fw.pairs(9)?;

        self.with_polling_disabled(mac, |sw| {
            let ipd_flag = sw.regs.read32(RTL838X_DMY_REG31) == 0x1;
            debug!("ipd flag {}", ipd_flag);

            sw.power_up_or_reset(mac, false)?;

            sw.request_patch(mac, 8)?;
            sw.delay_ms(500);
            sw.wait_patch_ready(mac, 8)?;

            for p in 0..8 {
                sw.write_pairs(mac + p, intphy.clone())?;
                sw.write_pairs(mac + p, hw_esd.clone())?;
            }
            Ok(())
        })
    }

    fn configure_ext_rtl8218b<L: FirmwareLoader>(&mut self, mac: u8, loader: &mut L) -> Result<(), Error> {
        if self.soc.family()? == ChipFamily::Rtl838x && mac != 0 && mac != 16 {
            error!("external RTL8218B must be at address 0 or 16, not {}", mac);
            return Err(Error::InvalidAddress(u32::from(mac)));
        }
        let phy_id = self.read_phy_id(mac)?;
        debug!("phy on port {}: {:x}", mac, phy_id);
        self.expect_internal_id(mac, INTERNAL_ID_RTL8218B_EXT)?;
        info!("external RTL8218B on port {}", mac);

        let fw = firmware::request(loader, firmware::FW_RTL8218B, firmware::MODEL_RTL8218B)?;

        self.with_polling_disabled(mac, |sw| {
            sw.power_up_or_reset(mac, false)?;

            // Chip revision
            sw.write_phy(mac, PAGE_PARK, PAGE_SELECT, 0)?;
            sw.write_phy(mac, PAGE_PARK, REG_INDIRECT_ADDR, 0x4)?;
            let rev = sw.read_phy(mac, PAGE_PARK, REG_INDIRECT_DATA)?;
            debug!("chip revision {:x}", rev);

            for t in fw.triples(0)? {
                let port = Self::triple_port(mac, t.offset)?;
                let reg = C22::from_raw(t.reg).ok_or(Error::InvalidAddress(t.reg))?;
                sw.write_phy(port, PAGE_PARK, reg, t.val as u16)?;
            }

            sw.enable_phys(mac, 8)?;
            sw.request_patch(mac, 8)?;
            sw.delay_ms(300);
            sw.wait_patch_ready(mac, 8)?;

            sw.broadcast(mac, true)?;

            sw.write_phy(mac, PAGE_PARK, REG_MEDIA_VIEW, 8)?;
            sw.write_phy(mac, PAGE_IPD, C22(17), 0xb)?;
            sw.write_phy(mac, PAGE_IPD, C22(16), 0x2)?;
            sw.delay_ms(1);
            let ipd = sw.read_phy(mac, PAGE_IPD, C22(19))?;
            sw.write_phy(mac, 0, REG_MEDIA_VIEW, 0)?;
            debug!("ipd {:x}", (ipd >> 4) & 0xf);

            sw.write_pairs(mac, fw.pairs(1)?)?;

            sw.broadcast(mac, false)
        })
    }

    fn configure_rtl8214fc<L: FirmwareLoader>(&mut self, mac: u8, loader: &mut L) -> Result<(), Error> {
        let phy_id = self.read_phy_id(mac)?;
        debug!("phy on port {}: {:x}", mac, phy_id);

        self.write_phy(mac, 0, REG_MEDIA_VIEW, 0x0001)?;
        self.write_phy(mac, 0, PAGE_SELECT, PAGE_GPHY)?;
        self.expect_internal_id(mac, INTERNAL_ID_RTL8218B_EXT)?;
        info!("RTL8214FC on port {}", mac);

        let fw = firmware::request(loader, firmware::FW_RTL8214FC, firmware::MODEL_RTL8214FC)?;

        self.with_polling_disabled(mac, |sw| {
            // Chip version
            sw.write_phy(mac, PAGE_PARK, REG_INDIRECT_ADDR, 0x0004)?;
            let rev = sw.read_phy(mac, PAGE_PARK, REG_INDIRECT_DATA)?;
            debug!("chip revision {:x}", rev);

            sw.power_up_or_reset(mac, true)?;
            sw.write_phy(mac, 0, REG_MEDIA_VIEW, 0x0001)?;

            sw.rtl8214fc_per_chip(mac, &fw)?;

            // Force copper
            for p in 0..4 {
                sw.write_phy(mac + p, PAGE_PARK, PAGE_SELECT, 0)?;
                sw.write_phy(mac + p, PAGE_PARK, REG_MEDIA_VIEW, 0x0001)?;
            }
            sw.enable_phys(mac, 4)?;

            // Autosensing must be off before patching.
            for p in 0..4 {
                sw.poll_bits(mac + p, PAGE_GPHY, REG_AUTOSENSE, |v| v & 0x7 >= 3)
                    .map_err(|e| {
                        error!("could not disable autosensing on port {}", mac + p);
                        e
                    })?;
            }

            sw.request_patch(mac, 4)?;
            sw.delay_ms(300);
            sw.wait_patch_ready(mac, 4)?;

            sw.broadcast(mac, true)?;
            sw.write_pairs(mac, fw.pairs(1)?)?;
            sw.broadcast(mac, false)?;

            // Automatic medium selection
            for p in 0..4 {
                sw.write_phy(mac + p, PAGE_PARK, PAGE_SELECT, 0)?;
                sw.write_phy(mac + p, PAGE_PARK, REG_MEDIA_VIEW, 0)?;
            }
            Ok(())
        })
    }

    /// Per chip records of the RTL8214FC. Register 0x13 of the SerDes
    /// configuration page keeps its bits 8..=12.
    fn rtl8214fc_per_chip(&mut self, mac: u8, fw: &Firmware<'_>) -> Result<(), Error> {
        let mut page = 0;
        for t in fw.triples(0)? {
            let port = Self::triple_port(mac, t.offset)?;
            let reg = C22::from_raw(t.reg).ok_or(Error::InvalidAddress(t.reg))?;
            if t.reg == u32::from(PAGE_SELECT.0) {
                page = t.val;
            }

            let val = if t.reg == REG_SERDES_MERGE && page == u32::from(PAGE_SERDES_CFG) {
                let cur = self.read_phy(port, PAGE_SERDES_CFG, reg)?;
                (cur & 0x1f00) | (t.val as u16 & 0xe0ff)
            } else {
                t.val as u16
            };
            self.write_phy(port, PAGE_PARK, reg, val)?;
        }
        Ok(())
    }

    fn configure_rtl8214c(&mut self, mac: u8) -> Result<(), Error> {
        let phy_id = self.read_phy_id(mac)?;
        debug!("phy on port {}: {:x}", mac, phy_id);
        info!("RTL8214C on port {}", mac);

        // GPHY auto configuration
        self.write_phy(mac, PAGE_GPHY, REG_PORT_SELECT, 0)
    }

    fn configure_rtl8390_generic(&mut self, mac: u8) -> Result<(), Error> {
        let phy_id = self.read_phy_id(mac)?;
        debug!("phy on port {}: {:x}", mac, phy_id);
        let id = self.read_internal_id(mac)?;
        info!("unknown internal phy {:x} on port {}", id, mac);
        Ok(())
    }

    /// Bring up the RTL8380 SerDes from the SoC side: SerDes 0 to 3 QSGMII,
    /// 4 and 5 1000BASE-X fibre.
    fn configure_rtl8380_serdes<L: FirmwareLoader>(&mut self, loader: &mut L) -> Result<(), Error> {
        info!("internal RTL8380 SerDes");
        let fw = firmware::request(loader, firmware::FW_RTL8380, firmware::MODEL_RTL8380)?;

        // Power down value, restored when done.
        let sds_conf = self.regs.read32(RTL838X_SDS_CFG_REG);
        debug!("SerDes power down value {:x}", sds_conf);

        // Take into reset, common patch
        for part in 0..2 {
            for (reg, val) in fw.pairs(part)? {
                self.regs.write32(reg, val);
                self.delay_us(1000);
            }
        }

        // Internal R/W enable
        self.regs.write32(RTL838X_INT_RW_CTRL, 3);
        // SerDes 4 and 5 are fibre
        self.regs.mask32(RTL838X_INT_MODE_CTRL, 0x7 | 0x38, 1 | (1 << 3));

        // QSGMII on 0 to 3, 1000BASE-X on 4 and 5
        let mode_sel = 0x6 << 25 | 0x6 << 20 | 0x6 << 15 | 0x6 << 10 | 0x4 << 5 | 0x4;
        self.regs.write32(RTL838X_SDS_MODE_SEL, mode_sel);

        let pll = self.regs.read32(RTL838X_PLL_CML_CTRL);
        debug!("PLL control {:x}", pll);
        self.regs.mask32(RTL838X_PLL_CML_CTRL, 0xffff_fff0, 0xaaaa_aaaf & 0xf);

        // QSGMII 0/1 and 2/3, fibre 4 and 5, reset, release reset
        for part in 2..8 {
            for (reg, val) in fw.pairs(part)? {
                self.regs.write32(reg, val);
            }
        }

        self.regs.write32(RTL838X_SDS_CFG_REG, sds_conf);
        info!("SerDes configured");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    extern crate alloc;
    use alloc::vec;
    use alloc::vec::Vec;

    use super::*;
    use crate::firmware::build::{image, Images};
    use crate::firmware::{FW_RTL8214FC, FW_RTL8218B, FW_RTL8380, MODEL_RTL8214FC, MODEL_RTL8218B, MODEL_RTL8380};
    use crate::phy::{PHY_ID_RTL8214FC, PHY_ID_RTL8218B_E, PHY_ID_RTL8218B_I, PHY_ID_RTL9300_I};
    use crate::testing::{switch, MockDelay, MockMdio, MockRegs, A};
    use crate::FirmwareError;

    type TestSwitch = Switch<MockMdio, MockRegs, MockDelay>;

    fn ready(sw: &mut TestSwitch, mac: u8, ports: u8) {
        for p in 0..ports {
            sw.mdio.set(mac + p, PAGE_PATCH_STATUS, 0x10, PATCH_READY);
        }
    }

    fn rtl8380_image() -> Vec<u8> {
        let common: &[u32] = &[0x0034, 0xffff, 0];
        let mut parts = vec![common; 8];
        parts.push(&[0x1f, 0x0bc0, 0x13, 0xa000, 0]);
        parts.push(&[0x1f, 0x0bc4, 0]);
        image(MODEL_RTL8380, &parts)
    }

    fn port_writes(sw: &TestSwitch, port: u8) -> Vec<(u8, u16)> {
        sw.mdio
            .writes()
            .iter()
            .filter_map(|a| match *a {
                A::Write(p, PAGE_PARK, reg, val) if p == port => Some((reg, val)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn internal_rtl8218b_patched_per_port() {
        let mut sw = switch(0x8380);
        sw.regs.regs.insert(RTL838X_SMI_POLL_CTRL, 0x00ff_ffff);
        sw.mdio.set(8, 31, 0x1c, INTERNAL_ID_RTL8218B_INT);
        sw.mdio.set(8, 0, 2, 0x001c);
        sw.mdio.set(8, 0, 3, 0xca40);
        ready(&mut sw, 8, 8);
        let mut images = Images(vec![(FW_RTL8380, rtl8380_image())]);

        let dev = sw.identify(8).unwrap();
        sw.probe(&dev, &mut images).unwrap();

        for p in 8..16 {
            let w = port_writes(&sw, p);
            assert_eq!(
                w[w.len() - 3..],
                [(0x1f, 0x0bc0), (0x13, 0xa000), (0x1f, 0x0bc4)],
                "port {}",
                p
            );
        }
        assert_eq!(sw.regs.get(RTL838X_SMI_POLL_CTRL), 0x00ff_ffff);
    }

    #[test]
    fn only_base_address_is_patched() {
        let mut sw = switch(0x8380);
        let dev = PhyDevice::new(sw.soc(), 9, PHY_ID_RTL8218B_I).unwrap();
        sw.probe(&dev, &mut Images::default()).unwrap();
        assert!(sw.mdio.log.is_empty());
    }

    #[test]
    fn wrong_internal_id_stops_before_firmware() {
        let mut sw = switch(0x8380);
        sw.mdio.set(0, 31, 0x1c, 0x6276);
        let dev = PhyDevice::new(sw.soc(), 0, PHY_ID_RTL8218B_I).unwrap();
        assert_eq!(sw.probe(&dev, &mut Images::default()), Err(Error::UnexpectedPhyId(0x6276)));
    }

    #[test]
    fn bad_firmware_aborts_without_patching() {
        let mut sw = switch(0x8380);
        sw.mdio.set(0, 31, 0x1c, INTERNAL_ID_RTL8218B_INT);
        ready(&mut sw, 0, 8);
        let mut images = Images(vec![(FW_RTL8380, image(MODEL_RTL8218B, &[]))]);
        let dev = PhyDevice::new(sw.soc(), 0, PHY_ID_RTL8218B_I).unwrap();

        assert_eq!(
            sw.probe(&dev, &mut images),
            Err(Error::Firmware(FirmwareError::BadModel))
        );
        assert!(!sw.mdio.writes().iter().any(|a| matches!(a, A::Write(_, PAGE_PARK, _, _))));
        assert!(sw.regs.writes.is_empty());
    }

    #[test]
    fn port_never_ready_times_out() {
        let mut sw = switch(0x8380);
        sw.regs.regs.insert(RTL838X_SMI_POLL_CTRL, 0xffff_ffff);
        sw.mdio.set(0, 31, 0x1c, INTERNAL_ID_RTL8218B_INT);
        ready(&mut sw, 0, 8);
        sw.mdio.set(3, PAGE_PATCH_STATUS, 0x10, 0);
        let mut images = Images(vec![(FW_RTL8380, rtl8380_image())]);
        let dev = PhyDevice::new(sw.soc(), 0, PHY_ID_RTL8218B_I).unwrap();

        assert_eq!(sw.probe(&dev, &mut images), Err(Error::Timeout));
        let polls = sw.mdio.log.iter().filter(|a| **a == A::Read(3, PAGE_PATCH_STATUS, 0x10)).count();
        assert_eq!(polls, READY_POLLS as usize);
        // No record was written, polling is back on.
        assert!(port_writes(&sw, 0).iter().all(|&(reg, _)| reg != 0x13));
        assert_eq!(sw.regs.get(RTL838X_SMI_POLL_CTRL), 0xffff_ffff);
    }

    #[test]
    fn external_rtl8218b_only_at_0_or_16() {
        let mut sw = switch(0x8380);
        assert_eq!(
            sw.configure_ext_rtl8218b(8, &mut Images::default()),
            Err(Error::InvalidAddress(8))
        );
    }

    #[test]
    fn external_rtl8218b_broadcasts_per_port_records() {
        let mut sw = switch(0x8380);
        sw.mdio.set(0, 31, 0x1c, INTERNAL_ID_RTL8218B_EXT);
        ready(&mut sw, 0, 8);
        let fw = image(
            MODEL_RTL8218B,
            &[&[0, 0x1f, 0x0000, 7, 0x1b, 0x0123, 0, 0, 0], &[0x1f, 0x0bc0, 0x12, 0x5555, 0]],
        );
        let mut images = Images(vec![(FW_RTL8218B, fw)]);
        let dev = PhyDevice::new(sw.soc(), 0, PHY_ID_RTL8218B_E).unwrap();
        sw.probe(&dev, &mut images).unwrap();

        assert!(port_writes(&sw, 7).contains(&(0x1b, 0x0123)));

        let w = port_writes(&sw, 0);
        let enter = w.iter().position(|&x| x == (0x16, 0xff00)).unwrap();
        let record = w.iter().position(|&x| x == (0x12, 0x5555)).unwrap();
        let exit = w.iter().rposition(|&x| x == (0x16, 0x0000)).unwrap();
        assert!(enter < record && record < exit);
        // Exit bracket restores port select.
        assert_eq!(w[w.len() - 1], (0x1d, 0));
    }

    #[test]
    fn rtl8214fc_merges_serdes_register() {
        let mut sw = switch(0x8380);
        sw.mdio.set(24, 31, 0x1c, INTERNAL_ID_RTL8218B_EXT);
        sw.mdio.set(25, PAGE_SERDES_CFG, 0x13, 0x1234);
        ready(&mut sw, 24, 4);
        for p in 24..28 {
            sw.mdio.set(p, PAGE_GPHY, 0x10, 3);
        }
        let fw = image(
            MODEL_RTL8214FC,
            &[&[1, 0x1f, 0x0260, 1, 0x13, 0xffff, 0, 0, 0], &[0x1f, 0x0266, 0]],
        );
        let mut images = Images(vec![(FW_RTL8214FC, fw)]);
        let dev = PhyDevice::new(sw.soc(), 24, PHY_ID_RTL8214FC).unwrap();
        sw.probe(&dev, &mut images).unwrap();

        assert!(port_writes(&sw, 25).contains(&(0x13, 0xf2ff)));
        // Back to automatic medium selection.
        for p in 24..28 {
            assert_eq!(sw.mdio.get(p, PAGE_PARK, 0x1e), 0);
        }
    }

    #[test]
    fn rtl8214fc_autosense_timeout() {
        let mut sw = switch(0x8380);
        sw.mdio.set(24, 31, 0x1c, INTERNAL_ID_RTL8218B_EXT);
        let mut images = Images(vec![(FW_RTL8214FC, image(MODEL_RTL8214FC, &[]))]);
        assert_eq!(sw.configure_rtl8214fc(24, &mut images), Err(Error::Timeout));
    }

    #[test]
    fn rtl8214fc_not_on_rtl8393() {
        let mut sw = switch(0x8393);
        let dev = PhyDevice::new(sw.soc(), 24, PHY_ID_RTL8214FC).unwrap();
        assert_eq!(sw.probe(&dev, &mut Images::default()), Err(Error::UnsupportedFamily));
    }

    #[test]
    fn rtl8380_serdes_restores_power_down_value() {
        let mut sw = switch(0x8380);
        sw.regs.regs.insert(RTL838X_SMI_POLL_CTRL, 0xffff_ffff);
        sw.regs.regs.insert(RTL838X_SDS_CFG_REG, 0x0000_003f);
        let fw = image(
            MODEL_RTL8380,
            &[
                &[0x0034, 0, 0x0e78, 1, 0],
                &[0x0ef8, 0x2, 0],
                &[0x0f00, 0x3, 0],
                &[0],
                &[0],
                &[0],
                &[0x0e78, 0x10, 0],
                &[0x0e78, 0x11, 0],
            ],
        );
        let mut images = Images(vec![(FW_RTL8380, fw)]);
        let dev = PhyDevice::new(sw.soc(), 24, PHY_ID_RTL8218B_I).unwrap();
        sw.probe(&dev, &mut images).unwrap();

        // Polling of port 24 is off for the whole bring-up.
        let writes = &sw.regs.writes;
        assert_eq!(writes.first(), Some(&(RTL838X_SMI_POLL_CTRL, 0xfeff_ffff)));
        assert_eq!(writes.last(), Some(&(RTL838X_SMI_POLL_CTRL, 0xffff_ffff)));
        assert_eq!(writes.iter().filter(|w| w.0 == RTL838X_SMI_POLL_CTRL).count(), 2);

        let regs: Vec<u32> = writes[1..].iter().map(|w| w.0).collect();
        assert_eq!(regs[..3], [0x0034, 0x0e78, 0x0ef8]);
        assert_eq!(sw.regs.get(0x0e78), 0x11);
        assert_eq!(sw.regs.get(RTL838X_SDS_MODE_SEL), 0x0c63_1884);
        assert_eq!(sw.regs.get(RTL838X_INT_MODE_CTRL), 0x9);
        assert_eq!(writes[writes.len() - 2], (RTL838X_SDS_CFG_REG, 0x3f));
        // One millisecond after each reset and common record.
        assert_eq!(sw.delay.elapsed_ns, 3_000_000);

        // The other SerDes ports have nothing to do.
        let dev = PhyDevice::new(sw.soc(), 26, PHY_ID_RTL8218B_I).unwrap();
        sw.probe(&dev, &mut Images::default()).unwrap();
    }

    #[test]
    fn rtl9300_serdes_needs_lane() {
        let mut sw = switch(0x9302);
        let dev = PhyDevice::new(sw.soc(), 26, PHY_ID_RTL9300_I).unwrap();
        assert_eq!(sw.probe(&dev, &mut Images::default()), Err(Error::InvalidLane(u32::MAX)));
    }

    #[test]
    fn rtl8393_serdes_forces_fibre_link() {
        let mut sw = switch(0x8393);
        let dev = PhyDevice::new(sw.soc(), 48, crate::phy::PHY_ID_RTL8393_I).unwrap();
        sw.probe(&dev, &mut Images::default()).unwrap();
        assert_eq!(sw.regs.get(RTL839X_SDS12_13_XSG0 + 0x0a), 1 << 18);
    }
}
