use embedded_hal::delay::DelayNs;

use crate::family::ChipFamily;
use crate::phy::regs::*;
use crate::serdes::{rtl839x, PhyInterface, SerdesBus};
use crate::soc::{SocInfo, SocRegisters};
use crate::{Error, PhyAccess, Switch};

pub mod regs;

/// Link Speed
#[derive(Debug, PartialEq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Speed {
    /// 10 MBit
    _10,
    /// 100 MBit
    _100,
    /// 1000 MBit
    _1000,
    /// 2500 MBit
    _2500,
    /// 5000 MBit
    _5000,
    /// 10000 MBit
    _10000,
}

#[derive(Debug, PartialEq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Duplex
pub enum DuplexMode {
    /// Full
    Full,
    /// Half
    Half,
}

/// Link Status
#[derive(Debug, PartialEq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkStatus {
    /// Link Down
    Down,
    /// Link Up with `Speed` and `Duplex`
    Up {
        /// Link speed
        speed: Speed,
        /// Link Duplex
        duplex: DuplexMode,
    },
}

impl LinkStatus {
    /// Is link up
    pub fn is_up(&self) -> bool {
        matches!(self, Self::Up { speed: _, duplex: _ })
    }
    /// Is link down
    pub fn is_down(&self) -> bool {
        matches!(self, Self::Down)
    }
}

/// Active medium of a dual media port.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Medium {
    /// Twisted pair
    Copper,
    /// SFP
    Fibre,
}

/// RTL8214C
pub const PHY_ID_RTL8214C: u32 = 0x001c_c942;
/// RTL8214FC, shares its id with the external RTL8218B.
pub const PHY_ID_RTL8214FC: u32 = 0x001c_c981;
/// RTL8218B, external
pub const PHY_ID_RTL8218B_E: u32 = 0x001c_c981;
/// RTL8218D
pub const PHY_ID_RTL8218D: u32 = 0x001c_c983;
/// RTL8226
pub const PHY_ID_RTL8226: u32 = 0x001c_c838;
/// RTL8218B internal to the RTL838x, also reported by its SerDes.
pub const PHY_ID_RTL8218B_I: u32 = 0x001c_ca40;
/// RTL8393 internal SerDes
pub const PHY_ID_RTL8393_I: u32 = 0x001c_8393;
/// RTL839x SerDes
pub const PHY_ID_RTL8390_GENERIC: u32 = 0x001c_cab0;
/// RTL930x internal SerDes
pub const PHY_ID_RTL9300_I: u32 = 0x70d0_3106;

const PHY_ID_MODEL_MASK: u32 = 0xffff_fff0;

fn same_model(a: u32, b: u32) -> bool {
    a & PHY_ID_MODEL_MASK == b & PHY_ID_MODEL_MASK
}

/// PHY or SerDes handled by this crate.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PhyModel {
    /// Quad copper PHY
    Rtl8214c,
    /// Quad combo (copper/fibre) PHY
    Rtl8214fc,
    /// Octal copper PHY outside the SoC
    Rtl8218bExternal,
    /// Octal copper PHY inside the RTL838x
    Rtl8218bInternal,
    /// Octal copper PHY
    Rtl8218d,
    /// 2.5G copper PHY
    Rtl8226,
    /// RTL838x SerDes
    Rtl8380Serdes,
    /// RTL8393 SerDes
    Rtl8393Serdes,
    /// RTL839x SerDes
    Rtl8390Generic,
    /// RTL930x SerDes
    Rtl9300Serdes,
}

impl PhyModel {
    /// Match `phy_id` read at `addr` against the known models.
    ///
    /// The RTL8214FC and the external RTL8218B report the same id; they are
    /// told apart by address. SerDes ids only match on their own family at
    /// the SerDes addresses (24 and up).
    pub fn detect(soc: &SocInfo, addr: u8, phy_id: u32) -> Option<Self> {
        let family = soc.family().ok();
        let rtl838x = family == Some(ChipFamily::Rtl838x);

        if phy_id == PHY_ID_RTL8214C {
            return Some(Self::Rtl8214c);
        }
        if phy_id == PHY_ID_RTL8214FC && addr >= 24 {
            return Some(Self::Rtl8214fc);
        }
        if phy_id == PHY_ID_RTL8218B_E && (!rtl838x || addr < 8) {
            return Some(Self::Rtl8218bExternal);
        }
        if same_model(phy_id, PHY_ID_RTL8218D) {
            return Some(Self::Rtl8218d);
        }
        if same_model(phy_id, PHY_ID_RTL8226) {
            return Some(Self::Rtl8226);
        }
        if same_model(phy_id, PHY_ID_RTL8218B_I) && rtl838x {
            return if addr < 24 {
                Some(Self::Rtl8218bInternal)
            } else {
                Some(Self::Rtl8380Serdes)
            };
        }

        let serdes_addr = addr >= 24;
        if same_model(phy_id, PHY_ID_RTL8393_I) && family == Some(ChipFamily::Rtl839x) && serdes_addr {
            return Some(Self::Rtl8393Serdes);
        }
        if same_model(phy_id, PHY_ID_RTL8390_GENERIC) && family == Some(ChipFamily::Rtl839x) && serdes_addr {
            return Some(Self::Rtl8390Generic);
        }
        if same_model(phy_id, PHY_ID_RTL9300_I) && family == Some(ChipFamily::Rtl930x) && serdes_addr {
            return Some(Self::Rtl9300Serdes);
        }
        None
    }
}

/// One attached PHY instance.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhyDevice {
    addr: u8,
    phy_id: u32,
    model: PhyModel,
    sds: Option<u32>,
    interface: PhyInterface,
}

impl PhyDevice {
    /// Create a device for `phy_id` found at `addr`.
    pub fn new(soc: &SocInfo, addr: u8, phy_id: u32) -> Result<Self, Error> {
        let model = PhyModel::detect(soc, addr, phy_id).ok_or(Error::UnexpectedPhyId(phy_id))?;
        Ok(Self {
            addr,
            phy_id,
            model,
            sds: None,
            interface: PhyInterface::_10GBaseR,
        })
    }

    /// Assign the SerDes lane and interface mode the port is wired to
    /// (the `sds` device tree property). Defaults to no lane and 10GBASE-R.
    pub fn with_serdes(mut self, lane: u32, interface: PhyInterface) -> Self {
        self.sds = Some(lane);
        self.interface = interface;
        self
    }

    /// MDIO address.
    pub fn addr(&self) -> u8 {
        self.addr
    }

    /// Raw PHY id.
    pub fn phy_id(&self) -> u32 {
        self.phy_id
    }

    /// Detected model.
    pub fn model(&self) -> PhyModel {
        self.model
    }

    /// SerDes lane, if assigned.
    pub fn sds(&self) -> Option<u32> {
        self.sds
    }

    /// Interface mode of the SerDes lane.
    pub fn interface(&self) -> PhyInterface {
        self.interface
    }
}

// Vendor registers, see also `regs`.
const REG_EEE_500M: C22 = C22(20);
const REG_EEE_MAC_SEL: C22 = C22(25);
const REG_POWER: C22 = C22(16);

const EEE_500M: u16 = 1 << 7;
const EEE_PHY_BASED: u16 = 1 << 4;
const EEE_MAC_BASED_OFF: u16 = 1 << 5;
const EEE_100_1000: u16 = 0x6;

// Media select registers on the broadcast page, one per port of a chip.
const MEDIA_REGS: [u8; 4] = [16, 19, 20, 21];
const MEDIA_FIBRE_ONLY: u16 = 1 << 11;
const MEDIA_ENABLE: u16 = 1 << 10;

const VIEW_COPPER: u16 = 1;
const VIEW_FIBRE: u16 = 3;
const VIEW_BROADCAST: u16 = 8;

const POWER_POLLS: u32 = 10;

/// Decode BMCR/BMSR/ADVERTISE/LPA and the 1000BASE-T registers read
/// through `read`.
fn generic_status(mut read: impl FnMut(C22) -> Result<u16, Error>) -> Result<LinkStatus, Error> {
    let bmsr = read(C22::BMSR)?;
    if bmsr & BMSR_LINK == 0 {
        return Ok(LinkStatus::Down);
    }

    let bmcr = read(C22::BMCR)?;
    if bmcr & BMCR_AN_ENABLE == 0 {
        let speed = if bmcr & (1 << 6) != 0 {
            Speed::_1000
        } else if bmcr & (1 << 13) != 0 {
            Speed::_100
        } else {
            Speed::_10
        };
        let duplex = if bmcr & (1 << 8) != 0 {
            DuplexMode::Full
        } else {
            DuplexMode::Half
        };
        return Ok(LinkStatus::Up { speed, duplex });
    }

    if bmsr & BMSR_AN_DONE == 0 {
        return Ok(LinkStatus::Down);
    }

    let ctrl1000 = read(C22::MASTER_SLAVE_CONTROL)?;
    let stat1000 = read(C22::MASTER_SLAVE_STATUS)?;
    let gb = stat1000 & (ctrl1000 << 2);
    let common = read(C22::ADVERTISE)? & read(C22::LPA)?;

    let (speed, duplex) = if gb & (1 << 11) != 0 {
        (Speed::_1000, DuplexMode::Full)
    } else if gb & (1 << 10) != 0 {
        (Speed::_1000, DuplexMode::Half)
    } else if common & (1 << 8) != 0 {
        (Speed::_100, DuplexMode::Full)
    } else if common & (1 << 7) != 0 {
        (Speed::_100, DuplexMode::Half)
    } else if common & (1 << 6) != 0 {
        (Speed::_10, DuplexMode::Full)
    } else {
        (Speed::_10, DuplexMode::Half)
    };
    Ok(LinkStatus::Up { speed, duplex })
}

impl<M: PhyAccess, R: SocRegisters, D: DelayNs> Switch<M, R, D> {
    /// Read the 32 bit PHY id (registers 2 and 3 of page 0).
    pub fn read_phy_id(&mut self, port: u8) -> Result<u32, Error> {
        let hi = self.read_phy(port, 0, C22::PHYSID1)?;
        let lo = self.read_phy(port, 0, C22::PHYSID2)?;
        Ok(u32::from(hi) << 16 | u32::from(lo))
    }

    /// Read the id of the PHY at `port` and match it to a model.
    pub fn identify(&mut self, port: u8) -> Result<PhyDevice, Error> {
        let id = self.read_phy_id(port)?;
        debug!("phy on port {}: {:x}", port, id);
        PhyDevice::new(&self.soc, port, id)
    }

    /// Current link state of `dev`.
    pub fn read_status(&mut self, dev: &PhyDevice) -> Result<LinkStatus, Error> {
        let addr = dev.addr();
        match dev.model() {
            PhyModel::Rtl8226 => self.rtl8226_read_status(addr),
            PhyModel::Rtl8380Serdes => {
                let mut bus = self.rtl838x_bus();
                let status = generic_status(|reg| bus.read_sds(u32::from(addr), 0, u32::from(reg.0)))?;
                Ok(match status {
                    LinkStatus::Up { .. } => LinkStatus::Up {
                        speed: Speed::_1000,
                        duplex: DuplexMode::Full,
                    },
                    LinkStatus::Down => LinkStatus::Down,
                })
            }
            PhyModel::Rtl8393Serdes => {
                let mut bus = self.rtl839x_bus();
                let status = generic_status(|reg| bus.read_sds(u32::from(addr), 0, u32::from(reg.0)))?;
                if status.is_down() {
                    return Ok(status);
                }
                let speed = if rtl839x::speed_is_1000(&mut self.regs, u32::from(addr))? {
                    Speed::_1000
                } else {
                    Speed::_100
                };
                Ok(LinkStatus::Up {
                    speed,
                    duplex: DuplexMode::Full,
                })
            }
            _ => generic_status(|reg| self.mdio.read_phy(addr, 0, reg)),
        }
    }

    fn rtl8226_read_status(&mut self, port: u8) -> Result<LinkStatus, Error> {
        // Link status is latched, the second read is current.
        let _ = self.read_mmd(port, rtl8226::BMSR)?;
        let bmsr = self.read_mmd(port, rtl8226::BMSR)?;
        if bmsr & BMSR_LINK == 0 {
            return Ok(LinkStatus::Down);
        }

        let physr = self.read_mmd(port, rtl8226::PHYSR)?;
        let duplex = if physr & (1 << 3) != 0 {
            DuplexMode::Full
        } else {
            DuplexMode::Half
        };
        let speed = match physr & 0x0630 {
            0x0000 => Speed::_10,
            0x0010 => Speed::_100,
            0x0020 => Speed::_1000,
            0x0200 => Speed::_10000,
            0x0210 => Speed::_2500,
            0x0220 => Speed::_5000,
            other => {
                warn!("port {}: unknown speed code {:x}", port, other);
                return Ok(LinkStatus::Down);
            }
        };
        Ok(LinkStatus::Up { speed, duplex })
    }

    /// Enable and restart autonegotiation on `dev`.
    ///
    /// The RTL8226 additionally advertises 10/100 half and full, 1000 full
    /// and 2.5G.
    pub fn config_aneg(&mut self, dev: &PhyDevice) -> Result<(), Error> {
        let port = dev.addr();
        if dev.model() != PhyModel::Rtl8226 {
            let bmcr = self.read_phy(port, 0, C22::BMCR)?;
            return self.write_phy(port, 0, C22::BMCR, bmcr | BMCR_AN_ENABLE | BMCR_RESTART_AN);
        }

        // 10M and 100M, half and full
        let v = self.read_mmd(port, rtl8226::AN_ADV)?;
        self.write_mmd(port, rtl8226::AN_ADV, v | 0xf << 5)?;
        // 1000M full
        let v = self.read_mmd(port, rtl8226::GBCR)?;
        self.write_mmd(port, rtl8226::GBCR, v | 1 << 9)?;
        // 2.5G
        let v = self.read_mmd(port, rtl8226::AN_10GBT_CTRL)?;
        self.write_mmd(port, rtl8226::AN_10GBT_CTRL, v | 1 << 7)?;

        let v = self.read_mmd(port, rtl8226::AN_CTRL)?;
        self.write_mmd(port, rtl8226::AN_CTRL, v | BMCR_AN_ENABLE)?;
        let v = self.read_mmd(port, rtl8226::BMCR)?;
        self.write_mmd(port, rtl8226::BMCR, v | BMCR_RESTART_AN)
    }

    /// Selected page of an RTL8226.
    pub fn rtl8226_read_page(&mut self, port: u8) -> Result<u16, Error> {
        self.read_phy(port, 0, PAGE_SELECT)
    }

    /// Select a page of an RTL8226.
    pub fn rtl8226_write_page(&mut self, port: u8, page: u16) -> Result<(), Error> {
        self.write_phy(port, 0, PAGE_SELECT, page)
    }

    /// Whether EEE is advertised by `dev`.
    pub fn get_eee(&mut self, dev: &PhyDevice) -> Result<bool, Error> {
        let port = dev.addr();
        match dev.model() {
            PhyModel::Rtl8226 => {
                if self.read_mmd(port, rtl8226::EEE_ADV)? & (1 << 1) != 0 {
                    return Ok(true);
                }
                Ok(self.read_mmd(port, rtl8226::EEE_ADV2)? & 1 != 0)
            }
            PhyModel::Rtl8214fc => {
                if self.rtl8214fc_medium(port)? == Medium::Fibre {
                    error!("port {} configured for fibre", port);
                    return Err(Error::FibreMedium);
                }
                self.rtl8218b_get_eee(port)
            }
            PhyModel::Rtl8218bExternal | PhyModel::Rtl8218bInternal => self.rtl8218b_get_eee(port),
            PhyModel::Rtl8218d => {
                self.write_phy(port, PAGE_GPHY, REG_MEDIA_VIEW, 1)?;
                let v = self.read_mmd(port, EEE_ADV)?;
                self.write_phy(port, PAGE_GPHY, REG_MEDIA_VIEW, 0)?;
                Ok(v & (1 << 7) != 0)
            }
            _ => Err(Error::UnsupportedMode),
        }
    }

    fn rtl8218b_get_eee(&mut self, port: u8) -> Result<bool, Error> {
        self.write_phy(port, PAGE_GPHY, REG_PORT_SELECT, 1)?;
        let mut enabled = self.read_mmd(port, EEE_ADV)? & (1 << 7) != 0;
        if !enabled {
            // PHY based EEE
            enabled = self.read_phy(port, PAGE_GPHY_EXT, REG_EEE_MAC_SEL)? & EEE_PHY_BASED != 0;
        }
        self.write_phy(port, PAGE_GPHY, REG_PORT_SELECT, 0)?;
        Ok(enabled)
    }

    /// Enable or disable 100M/1000M (and on the RTL8226 2.5G) EEE on `dev`.
    ///
    /// Link polling of the port is suspended for the whole sequence.
    /// Autonegotiation is restarted only if it was enabled.
    pub fn set_eee(&mut self, dev: &PhyDevice, enable: bool) -> Result<(), Error> {
        let port = dev.addr();
        info!("port {}: set EEE {}", port, enable);
        match dev.model() {
            PhyModel::Rtl8226 => self.with_polling_disabled(port, |sw| sw.rtl8226_set_eee(port, enable)),
            PhyModel::Rtl8214fc => {
                if self.rtl8214fc_medium(port)? == Medium::Fibre {
                    error!("port {} configured for fibre", port);
                    return Err(Error::FibreMedium);
                }
                self.with_polling_disabled(port, |sw| sw.rtl8214fc_set_eee(port, enable))
            }
            PhyModel::Rtl8218bExternal | PhyModel::Rtl8218bInternal => {
                self.with_polling_disabled(port, |sw| sw.rtl8218b_set_eee(port, enable))
            }
            PhyModel::Rtl8218d => self.with_polling_disabled(port, |sw| sw.rtl8218d_set_eee(port, enable)),
            _ => Err(Error::UnsupportedMode),
        }
    }

    fn an_enabled(&mut self, port: u8) -> Result<bool, Error> {
        Ok(self.read_phy(port, 0, C22::BMCR)? & BMCR_AN_ENABLE != 0)
    }

    fn restart_an(&mut self, port: u8) -> Result<(), Error> {
        let v = self.read_phy(port, 0, C22::BMCR)?;
        self.write_phy(port, 0, C22::BMCR, v | BMCR_RESTART_AN)
    }

    fn set_eee_500m(&mut self, port: u8, enable: bool) -> Result<(), Error> {
        let v = self.read_phy(port, PAGE_GPHY, REG_EEE_500M)?;
        let v = if enable { v | EEE_500M } else { v & !EEE_500M };
        self.write_phy(port, PAGE_GPHY, REG_EEE_500M, v)
    }

    fn rtl8226_set_eee(&mut self, port: u8, enable: bool) -> Result<(), Error> {
        let an_enabled = self.read_mmd(port, rtl8226::AN_CTRL)? & BMCR_AN_ENABLE != 0;

        // 100M/1000M
        let v = self.read_mmd(port, rtl8226::EEE_ADV)?;
        let v = if enable { v | EEE_100_1000 } else { v & !EEE_100_1000 };
        self.write_mmd(port, rtl8226::EEE_ADV, v)?;

        // 2.5G
        let v = self.read_mmd(port, rtl8226::EEE_ADV2)?;
        let v = if enable { v | 1 } else { v & !1 };
        self.write_mmd(port, rtl8226::EEE_ADV2, v)?;

        if an_enabled {
            let v = self.read_mmd(port, rtl8226::BMCR)?;
            self.write_mmd(port, rtl8226::BMCR, v | BMCR_RESTART_AN)?;
        }
        Ok(())
    }

    fn rtl8214fc_set_eee(&mut self, port: u8, enable: bool) -> Result<(), Error> {
        // Copper view
        self.write_phy(port, PAGE_GPHY, REG_PORT_SELECT, 1)?;
        let an_enabled = self.an_enabled(port)?;

        // MAC based EEE
        let v = self.read_phy(port, PAGE_GPHY_EXT, REG_EEE_MAC_SEL)?;
        self.write_phy(port, PAGE_GPHY_EXT, REG_EEE_MAC_SEL, v & !EEE_MAC_BASED_OFF)?;

        self.write_mmd(port, EEE_ADV, if enable { EEE_100_1000 } else { 0 })?;
        self.set_eee_500m(port, enable)?;

        if an_enabled {
            self.restart_an(port)?;
        }
        self.write_phy(port, PAGE_GPHY, REG_PORT_SELECT, 0)
    }

    fn rtl8218b_set_eee(&mut self, port: u8, enable: bool) -> Result<(), Error> {
        self.write_phy(port, 0, REG_MEDIA_VIEW, 1)?;
        let an_enabled = self.an_enabled(port)?;

        self.write_mmd(port, EEE_ADV, if enable { EEE_100_1000 } else { 0 })?;
        let v = self.read_phy(port, PAGE_GPHY_EXT, REG_EEE_MAC_SEL)?;
        let v = if enable { v | EEE_PHY_BASED } else { v & !EEE_PHY_BASED };
        self.write_phy(port, PAGE_GPHY_EXT, REG_EEE_MAC_SEL, v)?;

        if an_enabled {
            self.restart_an(port)?;
        }
        self.write_phy(port, PAGE_GPHY, REG_MEDIA_VIEW, 0)
    }

    fn rtl8218d_set_eee(&mut self, port: u8, enable: bool) -> Result<(), Error> {
        self.write_phy(port, PAGE_GPHY, REG_MEDIA_VIEW, 1)?;
        let an_enabled = self.an_enabled(port)?;

        self.write_mmd(port, EEE_ADV, if enable { EEE_100_1000 } else { 0 })?;
        self.set_eee_500m(port, enable)?;

        if an_enabled {
            self.restart_an(port)?;
        }
        self.write_phy(port, PAGE_GPHY, REG_MEDIA_VIEW, 0)
    }

    /// Active medium of `dev`. Only the RTL8214FC has a fibre side.
    pub fn get_port(&mut self, dev: &PhyDevice) -> Result<Medium, Error> {
        match dev.model() {
            PhyModel::Rtl8214fc => self.rtl8214fc_medium(dev.addr()),
            _ => Ok(Medium::Copper),
        }
    }

    /// Switch an RTL8214FC port between copper and fibre.
    ///
    /// The active medium is powered off before the new one is selected and
    /// powered on. Selecting the active medium again changes nothing.
    pub fn set_port(&mut self, dev: &PhyDevice, medium: Medium) -> Result<(), Error> {
        match (dev.model(), medium) {
            (PhyModel::Rtl8214fc, _) => self.rtl8214fc_media_set(dev.addr(), medium),
            (_, Medium::Copper) => Ok(()),
            (_, Medium::Fibre) => Err(Error::UnsupportedMode),
        }
    }

    fn rtl8214fc_medium(&mut self, port: u8) -> Result<Medium, Error> {
        let base = port - port % 4;
        let reg = C22(MEDIA_REGS[usize::from(port % 4)]);

        self.write_phy(base, PAGE_PARK, REG_PORT_SELECT, VIEW_BROADCAST)?;
        let val = self.read_phy(base, PAGE_BROADCAST, reg)?;
        self.write_phy(base, PAGE_PARK, REG_PORT_SELECT, 0)?;

        Ok(if val & MEDIA_FIBRE_ONLY != 0 {
            Medium::Copper
        } else {
            Medium::Fibre
        })
    }

    fn rtl8214fc_media_set(&mut self, port: u8, medium: Medium) -> Result<(), Error> {
        let base = port - port % 4;
        let reg = C22(MEDIA_REGS[usize::from(port % 4)]);

        self.write_phy(base, PAGE_PARK, REG_PORT_SELECT, VIEW_BROADCAST)?;
        let val = self.read_phy(base, PAGE_BROADCAST, reg)?;
        let current = if val & MEDIA_FIBRE_ONLY != 0 {
            Medium::Copper
        } else {
            Medium::Fibre
        };
        if current == medium {
            debug!("port {}: medium unchanged", port);
            return self.write_phy(base, PAGE_PARK, REG_PORT_SELECT, 0);
        }

        info!("port {}: switching medium", port);
        self.rtl8214fc_media_power(base, current, false)?;

        let val = match medium {
            Medium::Fibre => (val | MEDIA_ENABLE) & !MEDIA_FIBRE_ONLY,
            Medium::Copper => val | MEDIA_ENABLE | MEDIA_FIBRE_ONLY,
        };
        self.write_phy(base, PAGE_PARK, REG_PORT_SELECT, VIEW_BROADCAST)?;
        self.write_phy(base, PAGE_BROADCAST, reg, val)?;
        self.write_phy(base, PAGE_PARK, REG_PORT_SELECT, 0)?;

        self.rtl8214fc_media_power(base, medium, true)?;
        self.write_phy(base, PAGE_PARK, REG_PORT_SELECT, 0)
    }

    /// Power `medium` of the chip at `base` up or down and wait until the
    /// power down bit reflects it.
    fn rtl8214fc_media_power(&mut self, base: u8, medium: Medium, on: bool) -> Result<(), Error> {
        let view = match medium {
            Medium::Copper => VIEW_COPPER,
            Medium::Fibre => VIEW_FIBRE,
        };
        self.write_phy(base, PAGE_PARK, REG_PORT_SELECT, view)?;

        let power = self.read_phy(base, PAGE_POWER, REG_POWER)?;
        let is_off = power & BMCR_POWER_DOWN != 0;
        if is_off == on {
            let power = if on {
                power & !BMCR_POWER_DOWN
            } else {
                power | BMCR_POWER_DOWN
            };
            self.write_phy(base, PAGE_POWER, REG_POWER, power)?;
        }

        for _ in 0..POWER_POLLS {
            let power = self.read_phy(base, PAGE_POWER, REG_POWER)?;
            if (power & BMCR_POWER_DOWN == 0) == on {
                return Ok(());
            }
            self.delay_ms(1);
        }
        error!("port {}: medium power did not switch", base);
        Err(Error::Timeout)
    }

    /// Power the (internal RTL8218B) PHY at `port` up or down.
    pub fn phy_power(&mut self, port: u8, on: bool) -> Result<(), Error> {
        let v = self.read_phy(port, 0, C22::BMCR)?;
        let v = if on { v & !BMCR_POWER_DOWN } else { v | BMCR_POWER_DOWN };
        self.write_phy(port, 0, C22::BMCR, v)
    }

    /// Power both media of the RTL8214FC at `port` up or down.
    pub fn rtl8214fc_power(&mut self, port: u8, on: bool) -> Result<(), Error> {
        let set = |v: u16| if on { v & !BMCR_POWER_DOWN } else { v | BMCR_POWER_DOWN };

        self.write_phy(port, PAGE_PARK, REG_MEDIA_VIEW, VIEW_FIBRE)?;
        let v = self.read_phy(port, 0, REG_POWER)?;
        self.write_phy(port, 0, REG_POWER, set(v))?;

        self.write_phy(port, PAGE_PARK, REG_MEDIA_VIEW, VIEW_COPPER)?;
        let v = self.read_phy(port, 0, REG_POWER)?;
        self.write_phy(port, PAGE_POWER, REG_POWER, set(v))
    }

    /// Soft reset the PHY at `port`.
    pub fn phy_reset(&mut self, port: u8) -> Result<(), Error> {
        let v = self.read_phy(port, 0, C22::BMCR)?;
        self.write_phy(port, 0, C22::BMCR, v | BMCR_RESET)
    }
}
