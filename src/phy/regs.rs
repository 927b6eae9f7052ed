// Copied from: https://rust.docs.kernel.org/src/kernel/net/phy/reg.rs.html
// SPDX-License-Identifier: GPL-2.0

// Copyright (C) 2024 FUJITA Tomonori <fujita.tomonori@gmail.com>
//! PHY register interfaces.
//!
//! Clause 22 register numbers, clause 45 device addresses, and the Realtek
//! vendor pages used by the RTL8214/RTL8218/RTL8226 PHY families.

/// A single MDIO clause 22 register address (5 bits).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct C22(pub u8);

impl C22 {
    /// Basic mode control.
    pub const BMCR: Self = C22(0x00);
    /// Basic mode status.
    pub const BMSR: Self = C22(0x01);
    /// PHY identifier 1.
    pub const PHYSID1: Self = C22(0x02);
    /// PHY identifier 2.
    pub const PHYSID2: Self = C22(0x03);
    /// Auto-negotiation advertisement.
    pub const ADVERTISE: Self = C22(0x04);
    /// Auto-negotiation link partner base page ability.
    pub const LPA: Self = C22(0x05);
    /// Master-slave control.
    pub const MASTER_SLAVE_CONTROL: Self = C22(0x09);
    /// Master-slave status.
    pub const MASTER_SLAVE_STATUS: Self = C22(0x0a);
    /// MMD Register control.
    pub const MMD_CONTROL: Self = C22(0x0d);
    /// MMD Register address data.
    pub const MMD_DATA: Self = C22(0x0e);

    /// Convert a register number taken from a firmware record.
    pub fn from_raw(reg: u32) -> Option<Self> {
        if reg < 0x20 {
            Some(C22(reg as u8))
        } else {
            None
        }
    }
}

/// A single MDIO clause 45 device address.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Mmd(pub u8);

impl Mmd {
    /// Physical coding sublayer.
    pub const PCS: Self = Mmd(3);
    /// Auto negotiation.
    pub const AN: Self = Mmd(7);
    /// Vendor specific 2.
    pub const VEND2: Self = Mmd(31);
}

/// A single MDIO clause 45 register device and address.
///
/// Clause 45 uses a 5-bit device address to access a specific MMD within
/// a port, then a 16-bit register address to access a location within
/// that device. `C45` represents this by storing a [`Mmd`] and
/// a register number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct C45 {
    pub(crate) devad: Mmd,
    pub(crate) regnum: u16,
}

impl C45 {
    /// Creates a new instance of `C45`.
    pub const fn new(devad: Mmd, regnum: u16) -> Self {
        Self { devad, regnum }
    }

    /// Device address.
    pub fn devad(&self) -> Mmd {
        self.devad
    }

    /// Register number within the device.
    pub fn regnum(&self) -> u16 {
        self.regnum
    }
}

// BMCR bits
pub(crate) const BMCR_RESTART_AN: u16 = 1 << 9;
pub(crate) const BMCR_POWER_DOWN: u16 = 1 << 11;
pub(crate) const BMCR_AN_ENABLE: u16 = 1 << 12;
pub(crate) const BMCR_RESET: u16 = 1 << 15;
/// Autonegotiation on, full duplex, 1000M.
pub(crate) const BMCR_ENABLE_1000_FULL: u16 = 0x1140;

// BMSR bits
pub(crate) const BMSR_LINK: u16 = 1 << 2;
pub(crate) const BMSR_AN_DONE: u16 = 1 << 5;

/// Page value that leaves the currently selected page alone ("park page").
pub const PAGE_PARK: u16 = 0xfff;
/// Page select register, written inside the parked page.
pub const PAGE_SELECT: C22 = C22(0x1f);

/// Vendor register selecting which internal PHY a broadcast or media
/// access addresses (RTL8214FC / RTL8218B).
pub(crate) const REG_PORT_SELECT: C22 = C22(0x1d);
/// Vendor register selecting copper/fibre register view (RTL8214FC) or
/// the GPHY page mode.
pub(crate) const REG_MEDIA_VIEW: C22 = C22(0x1e);
/// Internal id / chip revision indirection.
pub(crate) const REG_INDIRECT_ADDR: C22 = C22(0x1b);
pub(crate) const REG_INDIRECT_DATA: C22 = C22(0x1c);

/// GPHY standard control page.
pub(crate) const PAGE_GPHY: u16 = 0xa42;
/// GPHY extended control page, holds the MAC/PHY EEE selector.
pub(crate) const PAGE_GPHY_EXT: u16 = 0xa43;
/// Fibre/copper power control page.
pub(crate) const PAGE_POWER: u16 = 0xa40;
/// Patch request page.
pub(crate) const PAGE_PATCH_REQ: u16 = 0xb82;
/// Patch status page.
pub(crate) const PAGE_PATCH_STATUS: u16 = 0xb80;
/// Broadcast id / media configuration page.
pub(crate) const PAGE_BROADCAST: u16 = 0x266;
/// Serdes configuration page whose register 0x13 is merged rather than overwritten.
pub(crate) const PAGE_SERDES_CFG: u16 = 0x260;
/// IPD readout page.
pub(crate) const PAGE_IPD: u16 = 0x26e;

/// RTL8226 MMD registers.
pub(crate) mod rtl8226 {
    use super::{Mmd, C45};

    pub const AN_CTRL: C45 = C45::new(Mmd::AN, 0);
    pub const AN_ADV: C45 = C45::new(Mmd::AN, 16);
    pub const AN_10GBT_CTRL: C45 = C45::new(Mmd::AN, 32);
    pub const EEE_ADV: C45 = C45::new(Mmd::AN, 60);
    pub const EEE_ADV2: C45 = C45::new(Mmd::AN, 62);
    pub const GBCR: C45 = C45::new(Mmd::VEND2, 0xa412);
    pub const BMCR: C45 = C45::new(Mmd::VEND2, 0xa400);
    pub const BMSR: C45 = C45::new(Mmd::VEND2, 0xa402);
    pub const PHYSR: C45 = C45::new(Mmd::VEND2, 0xa434);
}

/// EEE advertisement (7.60), shared by the RTL8218B/D and RTL8214FC.
pub(crate) const EEE_ADV: C45 = C45::new(Mmd::AN, 60);
