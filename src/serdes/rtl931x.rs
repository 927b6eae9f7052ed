//! RTL931x SerDes 0..=13.
//!
//! Same indirect access scheme as the RTL930x, with its own registers and a
//! two step write. Mode configuration addresses three different numberings of
//! the same lane: the logical SerDes, its analog lane ([`analog_lane`]) and
//! its digital lane ([`digital_lane`]).

use embedded_hal::delay::DelayNs;

use super::{check_lane, forward_soc_and_delay, LaneState, PhyInterface, SerdesBus, SerdesGeneration};
use crate::soc::{
    SocInfo, SocRegisters, RTL931X_CHIP_INFO, RTL931X_PS_SERDES_OFF_MODE_CTRL, RTL931X_SERDES_INDRT_ACCESS_CTRL,
    RTL931X_SERDES_INDRT_DATA_CTRL, RTL931X_SERDES_MODE_CTRL,
};
use crate::Error;

const INDRT_POLLS: u32 = 100;

const ANALOG_LANES: [u32; 14] = [0, 1, 2, 3, 6, 7, 10, 11, 14, 15, 18, 19, 22, 23];

// Tx amplitude of SerDes 2..=13, per board type
const BOARD_SDS_TX_TYPE1: [u16; 12] = [
    0x1c3, 0x1c3, 0x1c3, 0x1a3, 0x1a3, 0x1a3, 0x143, 0x143, 0x143, 0x143, 0x163, 0x163,
];
const BOARD_SDS_TX: [u16; 12] = [
    0x1a00, 0x1a00, 0x200, 0x200, 0x200, 0x200, 0x1a3, 0x1a3, 0x1a3, 0x1a3, 0x1e3, 0x1e3,
];
const BOARD_SDS_TX2: [u16; 12] = [
    0xdc0, 0x1c0, 0x200, 0x180, 0x160, 0x123, 0x123, 0x163, 0x1a3, 0x1a0, 0x1c3, 0x9c3,
];

/// One lane register write of a fixed configuration table.
struct SdsConfig {
    page: u32,
    reg: u32,
    data: u16,
}

const fn cfg(page: u32, reg: u32, data: u16) -> SdsConfig {
    SdsConfig { page, reg, data }
}

// 10.3125G, chip type 1
const SDS_CONFIG_10P3125G_TYPE1: [SdsConfig; 37] = [
    cfg(0x2e, 0x00, 0x0107),
    cfg(0x2e, 0x01, 0x01a3),
    cfg(0x2e, 0x02, 0x6a24),
    cfg(0x2e, 0x03, 0xd10d),
    cfg(0x2e, 0x04, 0x8000),
    cfg(0x2e, 0x05, 0xa17e),
    cfg(0x2e, 0x06, 0xe31d),
    cfg(0x2e, 0x07, 0x800e),
    cfg(0x2e, 0x08, 0x0294),
    cfg(0x2e, 0x09, 0x0ce4),
    cfg(0x2e, 0x0a, 0x7fc8),
    cfg(0x2e, 0x0b, 0xe0e7),
    cfg(0x2e, 0x0c, 0x0200),
    cfg(0x2e, 0x0d, 0xdf80),
    cfg(0x2e, 0x0e, 0x0000),
    cfg(0x2e, 0x0f, 0x1fc2),
    cfg(0x2e, 0x10, 0x0c3f),
    cfg(0x2e, 0x11, 0x0000),
    cfg(0x2e, 0x12, 0x27c0),
    cfg(0x2e, 0x13, 0x7e1d),
    cfg(0x2e, 0x14, 0x1300),
    cfg(0x2e, 0x15, 0x003f),
    cfg(0x2e, 0x16, 0xbe7f),
    cfg(0x2e, 0x17, 0x0090),
    cfg(0x2e, 0x18, 0x0000),
    cfg(0x2e, 0x19, 0x4000),
    cfg(0x2e, 0x1a, 0x0000),
    cfg(0x2e, 0x1b, 0x8000),
    cfg(0x2e, 0x1c, 0x011f),
    cfg(0x2e, 0x1d, 0x0000),
    cfg(0x2e, 0x1e, 0xc8ff),
    cfg(0x2e, 0x1f, 0x0000),
    cfg(0x2f, 0x00, 0xc000),
    cfg(0x2f, 0x01, 0xf000),
    cfg(0x2f, 0x02, 0x6010),
    cfg(0x2f, 0x12, 0x0ee7),
    cfg(0x2f, 0x13, 0x0000),
];

// 10.3125G CMU, chip type 1, written to the even lane of the pair
const SDS_CONFIG_10P3125G_CMU_TYPE1: [SdsConfig; 15] = [
    cfg(0x2f, 0x03, 0x4210),
    cfg(0x2f, 0x04, 0x0000),
    cfg(0x2f, 0x05, 0x0019),
    cfg(0x2f, 0x06, 0x18a6),
    cfg(0x2f, 0x07, 0x2990),
    cfg(0x2f, 0x08, 0xfff4),
    cfg(0x2f, 0x09, 0x1f08),
    cfg(0x2f, 0x0a, 0x0000),
    cfg(0x2f, 0x0b, 0x8000),
    cfg(0x2f, 0x0c, 0x4224),
    cfg(0x2f, 0x0d, 0x0000),
    cfg(0x2f, 0x0e, 0x0000),
    cfg(0x2f, 0x0f, 0xa470),
    cfg(0x2f, 0x10, 0x8000),
    cfg(0x2f, 0x11, 0x037b),
];

/// [`SerdesBus`] over the RTL931x indirect access engine.
pub struct Rtl931xBus<'a, R, D> {
    regs: &'a mut R,
    delay: &'a mut D,
}

impl<'a, R: SocRegisters, D: DelayNs> Rtl931xBus<'a, R, D> {
    pub(crate) fn new(regs: &'a mut R, delay: &'a mut D) -> Self {
        Self { regs, delay }
    }

    fn wait_idle(&mut self) -> Result<(), Error> {
        for _ in 0..INDRT_POLLS {
            if self.regs.read32(RTL931X_SERDES_INDRT_ACCESS_CTRL) & 0x1 == 0 {
                return Ok(());
            }
            self.delay.delay_ms(1);
        }
        error!("SerDes indirect access stuck busy");
        Err(Error::Io)
    }
}

forward_soc_and_delay!(Rtl931xBus);

impl<'a, R: SocRegisters, D: DelayNs> SerdesBus for Rtl931xBus<'a, R, D> {
    fn read_sds(&mut self, lane: u32, page: u32, reg: u32) -> Result<u16, Error> {
        let cmd = lane << 2 | page << 7 | reg << 13 | 0x1;
        self.regs.write32(RTL931X_SERDES_INDRT_ACCESS_CTRL, cmd);
        self.wait_idle()?;
        Ok((self.regs.read32(RTL931X_SERDES_INDRT_DATA_CTRL) & 0xffff) as u16)
    }

    fn write_sds(&mut self, lane: u32, page: u32, reg: u32, val: u16) -> Result<(), Error> {
        let cmd = lane << 2 | page << 7 | reg << 13;
        self.regs.write32(RTL931X_SERDES_INDRT_ACCESS_CTRL, cmd);
        self.regs.write32(RTL931X_SERDES_INDRT_DATA_CTRL, u32::from(val));

        let cmd = self.regs.read32(RTL931X_SERDES_INDRT_ACCESS_CTRL) | 0x3;
        self.regs.write32(RTL931X_SERDES_INDRT_ACCESS_CTRL, cmd);
        self.wait_idle()
    }
}

/// Analog lane of SerDes `sds`.
pub fn analog_lane(sds: u32) -> u32 {
    ANALOG_LANES.get(sds as usize).copied().unwrap_or(sds)
}

/// Digital lane of SerDes `sds`; XSGMII uses it and the lane after it.
pub fn digital_lane(sds: u32) -> u32 {
    if sds < 2 {
        sds
    } else {
        (sds - 1) * 2
    }
}

fn mode_ctrl(sds: u32) -> (u32, u32) {
    (RTL931X_SERDES_MODE_CTRL + 4 * (sds >> 2), (sds & 0x3) << 3)
}

/// Write the MAC side mode byte of `sds` in `SERDES_MODE_CTRL`.
fn write_mode_ctrl<B: SerdesBus>(bus: &mut B, sds: u32, val: u32) {
    let (reg, shift) = mode_ctrl(sds);
    bus.mask32(reg, 0xff << shift, (val & 0xff) << shift);
}

/// Pulse the mode byte of `sds` to "off" with the SerDes held in power-save.
pub fn sds_rst<B: SerdesBus>(bus: &mut B, sds: u32) -> Result<(), Error> {
    check_lane::<Rtl931xSerdes>(sds)?;
    let (reg, shift) = mode_ctrl(sds);

    let o = bus.read32(RTL931X_PS_SERDES_OFF_MODE_CTRL);
    bus.write32(RTL931X_PS_SERDES_OFF_MODE_CTRL, o | 1 << sds);

    let o_mode = bus.read32(reg);
    bus.mask32(reg, 0xff << shift, (1 << 7 | 0x1f) << shift);
    bus.write32(reg, o_mode);

    bus.write32(RTL931X_PS_SERDES_OFF_MODE_CTRL, o);
    Ok(())
}

/// Clear the symbol error counters before a mode change. Only XSGMII keeps any.
pub fn symerr_clear<B: SerdesBus>(bus: &mut B, sds: u32, mode: PhyInterface) -> Result<(), Error> {
    if mode != PhyInterface::Xgmii {
        return Ok(());
    }

    let xsg_0 = digital_lane(sds);
    let xsg_1 = xsg_0 + 1;
    for lane in [xsg_0, xsg_1] {
        for i in 0..4 {
            bus.write_field(lane, 0x1, 24, 2, 0, i)?;
            bus.write_field(lane, 0x1, 3, 15, 8, 0x0)?;
            bus.write_field(lane, 0x1, 2, 15, 0, 0x0)?;
        }
    }
    for lane in [xsg_0, xsg_1] {
        bus.write_field(lane, 0x1, 0, 15, 0, 0x0)?;
        bus.write_field(lane, 0x1, 1, 15, 8, 0x0)?;
    }
    Ok(())
}

/// Switch the analog fibre mode of `sds` off.
pub fn fiber_disable<B: SerdesBus>(bus: &mut B, sds: u32) -> Result<(), Error> {
    bus.write_field(analog_lane(sds), 0x1f, 0x9, 11, 6, 0x3f)
}

/// Analog mode code of a fibre mode.
pub fn fiber_mode_code(mode: PhyInterface) -> u32 {
    match mode {
        PhyInterface::Sgmii => 0x5,
        PhyInterface::_1000BaseX => 0x9,
        PhyInterface::_10GBaseR | PhyInterface::_10GKr => 0x35,
        PhyInterface::Usxgmii => 0x1b,
        _ => 0x25,
    }
}

/// Program the analog fibre mode of `sds`, with the MAC side mode off.
pub fn fiber_mode_set<B: SerdesBus>(bus: &mut B, sds: u32, mode: PhyInterface) -> Result<(), Error> {
    symerr_clear(bus, sds, mode)?;
    write_mode_ctrl(bus, sds, 0x9f);

    let val = fiber_mode_code(mode);
    debug!("SerDes {}: analog mode {:x}", sds, val);
    bus.write_field(analog_lane(sds), 0x1f, 0x9, 11, 6, val)
}

/// CMU page of `mode`.
pub fn cmu_page(mode: PhyInterface) -> Option<u32> {
    match mode {
        PhyInterface::Sgmii | PhyInterface::_1000BaseX => Some(0x24),
        PhyInterface::Hsgmii | PhyInterface::_2500BaseX => Some(0x28),
        PhyInterface::Qsgmii => Some(0x2a),
        PhyInterface::Xaui => Some(0x2c),
        PhyInterface::Xgmii | PhyInterface::_10GKr | PhyInterface::_10GBaseR => Some(0x2e),
        _ => None,
    }
}

/// Configure the clock management unit of analog lane `asds` for `mode`.
///
/// The CMU is shared by a lane pair; its fields live in the even lane.
pub fn cmu_type_set<B: SerdesBus>(bus: &mut B, asds: u32, mode: PhyInterface, chip_type: u8) -> Result<(), Error> {
    let frc_cmu_spd = match mode {
        PhyInterface::Qsgmii | PhyInterface::_1000BaseX | PhyInterface::Sgmii => 0,
        PhyInterface::Hsgmii | PhyInterface::_2500BaseX => 1,
        PhyInterface::Na
        | PhyInterface::_10GKr
        | PhyInterface::Xgmii
        | PhyInterface::_10GBaseR
        | PhyInterface::Usxgmii => return Ok(()),
        _ => {
            warn!("SerDes {}: no CMU setting for {:?}", asds, mode);
            return Ok(());
        }
    };
    let page = cmu_page(mode).ok_or(Error::UnsupportedMode)?;

    let lane = asds % 2;
    let (frc_lc_mode_bit, frc_lc_mode_val_bit) = if lane == 0 { (4, 5) } else { (6, 7) };
    let even = asds - lane;
    trace!("SerDes {}: CMU page {:x} speed {} even {}", asds, page, frc_cmu_spd, even);

    bus.write_field(asds, page, 0x7, 15, 15, 0)?;
    if chip_type != 0 {
        bus.write_field(asds, page, 0xd, 14, 14, 0)?;
    }

    bus.write_field(even, 0x20, 0x12, 3, 2, 0x3)?;
    bus.write_field(even, 0x20, 0x12, frc_lc_mode_bit, frc_lc_mode_bit, 1)?;
    bus.write_field(even, 0x20, 0x12, frc_lc_mode_val_bit, frc_lc_mode_val_bit, 0)?;
    bus.write_field(even, 0x20, 0x12, 12, 12, 1)?;
    bus.write_field(even, 0x20, 0x12, 15, 13, frc_cmu_spd)
}

/// Reset the receiver of `sds`. SerDes 0 and 1 have none.
pub fn rx_rst<B: SerdesBus>(bus: &mut B, sds: u32) -> Result<(), Error> {
    if sds < 2 {
        return Ok(());
    }
    let asds = analog_lane(sds);

    bus.write_sds(asds, 0x2e, 0x12, 0x2740)?;
    bus.write_sds(asds, 0x2f, 0x0, 0x0)?;
    bus.write_sds(asds, 0x2f, 0x2, 0x2010)?;
    bus.write_sds(asds, 0x20, 0x0, 0xc10)?;

    bus.write_sds(asds, 0x2e, 0x12, 0x27c0)?;
    bus.write_sds(asds, 0x2f, 0x0, 0xc000)?;
    bus.write_sds(asds, 0x2f, 0x2, 0x6010)?;
    bus.write_sds(asds, 0x20, 0x0, 0xc30)?;

    bus.delay_ms(50);
    Ok(())
}

/// Switch the MAC side mode of `sds` off.
pub fn disable<B: SerdesBus>(bus: &mut B, sds: u32) {
    write_mode_ctrl(bus, sds, 1 << 7 | 0x1f);
}

/// MAC side mode code of a MII mode, `None` for fibre modes.
pub fn mii_mode_code(mode: PhyInterface) -> Option<u32> {
    match mode {
        PhyInterface::Qsgmii => Some(0x6),
        PhyInterface::Xgmii => Some(0x10),
        PhyInterface::Usxgmii | PhyInterface::_2500BaseX => Some(0xd),
        PhyInterface::Hsgmii => Some(0x12),
        PhyInterface::Sgmii => Some(0x2),
        _ => None,
    }
}

/// Program the MAC side mode of `sds`.
pub fn mii_mode_set<B: SerdesBus>(bus: &mut B, sds: u32, mode: PhyInterface) {
    if let Some(val) = mii_mode_code(mode) {
        write_mode_ctrl(bus, sds, val | 1 << 7);
    }
}

fn is_supported(mode: PhyInterface) -> bool {
    matches!(
        mode,
        PhyInterface::Na
            | PhyInterface::Xgmii
            | PhyInterface::Usxgmii
            | PhyInterface::_10GBaseR
            | PhyInterface::Hsgmii
            | PhyInterface::_1000BaseX
            | PhyInterface::Sgmii
            | PhyInterface::_2500BaseX
    )
}

/// The RTL931x SerDes mode configuration.
pub struct Rtl931xSerdes;

impl SerdesGeneration for Rtl931xSerdes {
    const LANES: u32 = 14;

    /// There is no lock detection on this generation; a successful
    /// configuration ends in [`LaneState::ModeForced`].
    fn set_mode<B: SerdesBus>(bus: &mut B, soc: &SocInfo, sds: u32, mode: PhyInterface) -> Result<LaneState, Error> {
        check_lane::<Self>(sds)?;
        if !is_supported(mode) {
            error!("SerDes {}: mode {:?} not supported", sds, mode);
            return Err(Error::UnsupportedMode);
        }

        let asds = analog_lane(sds);
        let dsds = digital_lane(sds);
        let chip_type = soc.chip_type();
        info!("SerDes {}: set mode {:?}, analog {} digital {}", sds, mode, asds, dsds);
        let stored = bus.read_field(asds, 0x1f, 0x9, 11, 6)?;
        trace!("SerDes {}: stored mode {:x}", sds, stored);

        let ori = bus.read32(RTL931X_PS_SERDES_OFF_MODE_CTRL);
        bus.write32(RTL931X_PS_SERDES_OFF_MODE_CTRL, ori | 1 << sds);
        trace!("SerDes {}: {:?}", sds, LaneState::Reset);

        match mode {
            PhyInterface::Xgmii => {
                if chip_type != 0 {
                    // fifo inv clk
                    for lane in [dsds, dsds + 1] {
                        bus.write_field(lane, 0x1, 0x1, 7, 4, 0xf)?;
                        bus.write_field(lane, 0x1, 0x1, 3, 0, 0xf)?;
                    }
                }
                bus.write_field(dsds, 0x0, 0xe, 12, 12, 1)?;
                bus.write_field(dsds + 1, 0x0, 0xe, 12, 12, 1)?;
            }
            PhyInterface::Usxgmii => {
                if chip_type != 0 {
                    bus.write_field(asds, 0x6, 0x2, 12, 12, 1)?;
                    for c in &SDS_CONFIG_10P3125G_TYPE1 {
                        bus.write_sds(asds, c.page - 0x4, c.reg, c.data)?;
                    }
                    let even = asds - asds % 2;
                    for c in &SDS_CONFIG_10P3125G_CMU_TYPE1 {
                        bus.write_sds(even, c.page - 0x4, c.reg, c.data)?;
                    }
                    bus.write_field(asds, 0x6, 0x2, 12, 12, 0)?;
                } else {
                    bus.write_field(asds, 0x2e, 0xd, 6, 0, 0x0)?;
                    bus.write_field(asds, 0x2e, 0xd, 7, 7, 0x1)?;

                    bus.write_field(asds, 0x2e, 0x1c, 5, 0, 0x1e)?;
                    bus.write_field(asds, 0x2e, 0x1d, 11, 0, 0x00)?;
                    bus.write_field(asds, 0x2e, 0x1f, 11, 0, 0x00)?;
                    bus.write_field(asds, 0x2f, 0x0, 11, 0, 0x00)?;
                    bus.write_field(asds, 0x2f, 0x1, 11, 0, 0x00)?;

                    bus.write_field(asds, 0x2e, 0xf, 12, 6, 0x7f)?;
                    bus.write_sds(asds, 0x2f, 0x12, 0xaaa)?;

                    rx_rst(bus, sds)?;

                    bus.write_sds(asds, 0x7, 0x10, 0x6003)?;
                    bus.write_sds(asds, 0x6, 0x1d, 0x0480)?;
                    bus.write_sds(asds, 0x6, 0xe, 0x0400)?;
                }
            }
            PhyInterface::_10GBaseR => {
                // 10GR fibre mode
                bus.write_field(asds, 0x1f, 0xb, 1, 1, 1)?;
                init_fiber_1g(bus, dsds)?;

                bus.write_field(asds, 0x1f, 13, 15, 0, 0x109e)?;
                bus.write_field(asds, 0x1f, 0x6, 14, 10, 0x8)?;
                bus.write_field(asds, 0x1f, 0x7, 10, 4, 0x7f)?;
            }
            PhyInterface::Hsgmii | PhyInterface::_2500BaseX => {
                bus.write_field(dsds, 0x1, 0x14, 8, 8, 1)?;
            }
            PhyInterface::_1000BaseX => init_fiber_1g(bus, dsds)?,
            PhyInterface::Sgmii => {
                bus.write_field(asds, 0x24, 0x9, 15, 15, 0)?;
            }
            _ => {}
        }

        cmu_type_set(bus, asds, mode, chip_type)?;

        if (2..=13).contains(&sds) {
            let i = (sds - 2) as usize;
            if chip_type != 0 {
                bus.write_sds(asds, 0x2e, 0x1, BOARD_SDS_TX_TYPE1[i])?;
            } else {
                bus.write32(RTL931X_CHIP_INFO, 0xa0000);
                // RTL9313 and friends
                let table = if bus.read32(RTL931X_CHIP_INFO) & (1 << 28) != 0 {
                    &BOARD_SDS_TX2
                } else {
                    &BOARD_SDS_TX
                };
                bus.write_sds(asds, 0x2e, 0x1, table[i])?;
                bus.write32(RTL931X_CHIP_INFO, 0);
            }
        }

        bus.write32(RTL931X_PS_SERDES_OFF_MODE_CTRL, ori & !(1 << sds));

        let state = match mode {
            PhyInterface::Na => {
                disable(bus, sds);
                fiber_disable(bus, sds)?;
                LaneState::Disabled
            }
            PhyInterface::Xgmii => {
                mii_mode_set(bus, sds, mode);
                LaneState::ModeForced(mode)
            }
            PhyInterface::Hsgmii
            | PhyInterface::Sgmii
            | PhyInterface::Usxgmii
            | PhyInterface::_1000BaseX
            | PhyInterface::_10GBaseR => {
                fiber_mode_set(bus, sds, mode)?;
                LaneState::ModeForced(mode)
            }
            _ => LaneState::ModeForced(mode),
        };
        debug!("SerDes {}: {:?}", sds, state);
        Ok(state)
    }
}

fn init_fiber_1g<B: SerdesBus>(bus: &mut B, dsds: u32) -> Result<(), Error> {
    bus.write_field(dsds, 0x3, 0x13, 15, 14, 0)?;
    bus.write_field(dsds, 0x2, 0x0, 12, 12, 1)?;
    bus.write_field(dsds, 0x2, 0x0, 6, 6, 1)?;
    bus.write_field(dsds, 0x2, 0x0, 13, 13, 0)
}

/// Set the CMU band of the pair `sds` belongs to, then reset the SerDes.
pub fn cmu_band_set<B: SerdesBus>(bus: &mut B, sds: u32, band: u32, mode: PhyInterface) -> Result<(), Error> {
    check_lane::<Rtl931xSerdes>(sds)?;
    let page = cmu_page(mode).ok_or(Error::UnsupportedMode)? + 1;
    let sds = sds & !1;
    let asds = analog_lane(sds);

    bus.write_field(asds, page, 0x7, 13, 13, 0)?;
    bus.write_field(asds, page, 0x7, 11, 11, 0)?;
    bus.write_field(asds, page, 0x7, 4, 0, band)?;

    sds_rst(bus, sds)
}

/// CMU band of the pair `sds` belongs to.
pub fn cmu_band_get<B: SerdesBus>(bus: &mut B, sds: u32, mode: PhyInterface) -> Result<u32, Error> {
    check_lane::<Rtl931xSerdes>(sds)?;
    let page = cmu_page(mode).ok_or(Error::UnsupportedMode)? + 1;
    let asds = analog_lane(sds & !1);

    bus.write_sds(asds, 0x1f, 0x02, 73)?;
    bus.write_field(asds, page, 0x5, 15, 15, 1)?;
    let band = bus.read_field(asds, 0x1f, 0x15, 8, 3)?;
    debug!("SerDes {}: CMU band {}", sds, band);
    Ok(band)
}

/// Link status of `sds` as seen by its digital lane.
pub fn link_status<B: SerdesBus>(bus: &mut B, sds: u32) -> Result<u32, Error> {
    let asds = analog_lane(sds);
    let dsds = digital_lane(sds);

    let sts = bus.read_field(asds, 0x5, 0, 12, 12)?;
    let latch_sts = bus.read_field(asds, 0x4, 1, 2, 2)?;
    let latch_sts1 = bus.read_field(dsds, 0x2, 1, 2, 2)?;
    let sts1 = bus.read_field(dsds, 0x2, 1, 2, 2)?;
    trace!(
        "SerDes {}: sts {} sts1 {} latch_sts {} latch_sts1 {}",
        sds,
        sts,
        sts1,
        latch_sts,
        latch_sts1
    );
    Ok(sts1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serdes::mock::{IndirectSds, MockSerdes};
    use crate::testing::MockDelay;

    fn soc(chip_type: u8) -> SocInfo {
        SocInfo::new(0x9313, 0).with_chip_type(chip_type)
    }

    #[test]
    fn two_step_write() {
        let mut hw = IndirectSds::new(RTL931X_SERDES_INDRT_ACCESS_CTRL, RTL931X_SERDES_INDRT_DATA_CTRL);
        let mut delay = MockDelay::default();
        hw.sds.set(6, 0x1f, 0x9, 0x0440);

        let mut bus = Rtl931xBus::new(&mut hw, &mut delay);
        assert_eq!(bus.read_sds(6, 0x1f, 0x9), Ok(0x0440));
        bus.write_sds(6, 0x1f, 0x9, 0x0580).unwrap();
        assert_eq!(hw.sds.get(6, 0x1f, 0x9), 0x0580);
        // command without the start bit first
        assert_eq!(hw.regs.writes[2], (RTL931X_SERDES_INDRT_ACCESS_CTRL, 6 << 2 | 0x1f << 7 | 0x9 << 13));
    }

    #[test]
    fn lane_numbering() {
        assert_eq!(analog_lane(0), 0);
        assert_eq!(analog_lane(4), 6);
        assert_eq!(analog_lane(13), 23);
        assert_eq!(analog_lane(20), 20);
        assert_eq!(digital_lane(1), 1);
        assert_eq!(digital_lane(5), 8);
    }

    #[test]
    fn odd_lane_writes_even_cmu() {
        let mut bus = MockSerdes::default();
        cmu_type_set(&mut bus, 7, PhyInterface::Hsgmii, 0).unwrap();
        assert!(!bus.writes_to(6, 0x20, 0x12).is_empty());
        assert!(bus.writes_to(7, 0x20, 0x12).is_empty());
        assert_eq!(bus.writes_to(7, 0x28, 0x7).len(), 1);
        assert!(bus.writes_to(7, 0x28, 0xd).is_empty());
    }

    #[test]
    fn ten_g_has_no_cmu_step() {
        let mut bus = MockSerdes::default();
        cmu_type_set(&mut bus, 2, PhyInterface::_10GBaseR, 1).unwrap();
        assert!(bus.log.is_empty());
    }

    #[test]
    fn sgmii_fibre_mode() {
        let mut bus = MockSerdes::default();
        bus.regs.regs.insert(RTL931X_PS_SERDES_OFF_MODE_CTRL, 0x10);

        let state = Rtl931xSerdes::set_mode(&mut bus, &soc(0), 4, PhyInterface::Sgmii);
        assert_eq!(state, Ok(LaneState::ModeForced(PhyInterface::Sgmii)));

        // analog lane 6, mode field 11..6 holds 4 bits
        assert_eq!(bus.get(6, 0x1f, 0x9) >> 6 & 0xf, 0x5);
        assert_eq!(bus.get(6, 0x2e, 0x1), BOARD_SDS_TX[2]);
        assert!(bus.regs.writes.contains(&(RTL931X_CHIP_INFO, 0xa0000)));
        assert_eq!(bus.regs.get(RTL931X_PS_SERDES_OFF_MODE_CTRL), 0x00);
        assert_eq!(bus.regs.get(RTL931X_CHIP_INFO), 0);
        assert_eq!(bus.regs.get(RTL931X_SERDES_MODE_CTRL + 4), 0x9f);
    }

    #[test]
    fn usxgmii_type1_tables() {
        let mut bus = MockSerdes::default();
        let state = Rtl931xSerdes::set_mode(&mut bus, &soc(1), 5, PhyInterface::Usxgmii);
        assert_eq!(state, Ok(LaneState::ModeForced(PhyInterface::Usxgmii)));
        assert_eq!(bus.get(7, 0x2a, 0x02), 0x6a24);
        assert_eq!(bus.get(6, 0x2b, 0x11), 0x037b);
        assert_eq!(bus.get(7, 0x2e, 0x1), BOARD_SDS_TX_TYPE1[3]);
    }

    #[test]
    fn qsgmii_rejected_up_front() {
        let mut bus = MockSerdes::default();
        assert_eq!(
            Rtl931xSerdes::set_mode(&mut bus, &soc(0), 3, PhyInterface::Qsgmii),
            Err(Error::UnsupportedMode)
        );
        assert_eq!(
            Rtl931xSerdes::set_mode(&mut bus, &soc(0), 14, PhyInterface::Sgmii),
            Err(Error::InvalidLane(14))
        );
        assert!(bus.log.is_empty());
        assert!(bus.regs.writes.is_empty());
    }

    #[test]
    fn na_switches_lane_off() {
        let mut bus = MockSerdes::default();
        let state = Rtl931xSerdes::set_mode(&mut bus, &soc(0), 1, PhyInterface::Na);
        assert_eq!(state, Ok(LaneState::Disabled));
        assert_eq!(bus.regs.get(RTL931X_SERDES_MODE_CTRL), 0x9f << 8);
    }

    #[test]
    fn cmu_band() {
        let mut bus = MockSerdes::default();
        bus.set(2, 0x1f, 0x15, 0x1a << 3);
        assert_eq!(cmu_band_get(&mut bus, 3, PhyInterface::_1000BaseX), Ok(0x1a & 0xf));
        assert_eq!(bus.writes_to(2, 0x1f, 0x02), [73]);

        cmu_band_set(&mut bus, 3, 0x7, PhyInterface::_1000BaseX).unwrap();
        assert_eq!(bus.get(2, 0x25, 0x7) & 0x7, 0x7);
        assert_eq!(cmu_band_get(&mut bus, 3, PhyInterface::Na), Err(Error::UnsupportedMode));
    }

    #[test]
    fn out_of_range_lane_rejected() {
        let mut bus = MockSerdes::default();
        assert_eq!(sds_rst(&mut bus, 40), Err(Error::InvalidLane(40)));
        assert_eq!(
            cmu_band_set(&mut bus, 40, 1, PhyInterface::_1000BaseX),
            Err(Error::InvalidLane(40))
        );
        assert_eq!(cmu_band_get(&mut bus, 40, PhyInterface::_1000BaseX), Err(Error::InvalidLane(40)));
        assert!(bus.regs.writes.is_empty());
    }
}
