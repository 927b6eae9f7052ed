//! RTL930x SerDes 0..=11.
//!
//! Lane registers are reached through an indirect access engine: a command
//! word carrying lane, page and register is written to `SDS_INDACS_CMD` and
//! its busy bit polled, data passes through `SDS_INDACS_DATA`.
//!
//! Lanes come in pairs sharing the LC and ring oscillators; those fields live
//! in the even lane of the pair.

use embedded_hal::delay::DelayNs;

use super::{check_lane, forward_soc_and_delay, LaneState, PhyInterface, SerdesBus, SerdesGeneration};
use crate::soc::{SocInfo, SocRegisters, RTL930X_MAC_FORCE_MODE_CTRL, RTL930X_SDS_INDACS_CMD, RTL930X_SDS_INDACS_DATA};
use crate::Error;

/// Busy polls of the indirect access engine, 1ms apart.
const INDACS_POLLS: u32 = 100;
/// Clock lock polls, 200ms apart.
pub(crate) const LOCK_POLLS: u32 = 20;
const LOCK_POLL_INTERVAL_MS: u32 = 200;

/// SerDes mode select code for "off".
pub const SDS_MODE_OFF: u32 = 0x1f;

/// Mode select register and field LSB of each lane.
const SDS_MODE_SEL_REGS: [u32; 12] = [
    0x0194, 0x0194, 0x0194, 0x0194, 0x02a0, 0x02a0, 0x02a0, 0x02a0, 0x02a4, 0x02a4, 0x0198, 0x0198,
];
const SDS_MODE_SEL_LSB: [u32; 12] = [0, 6, 12, 18, 0, 6, 12, 18, 0, 6, 0, 6];

// Lane power control: page 2 for the 1G PHY, page 4 for the 10G PHY
const PAGE_1G_PHY: u32 = 2;
const PAGE_10G_PHY: u32 = 4;
const PHY_CTRL_REG: u32 = 0;
const PHY_POWER_DOWN: u16 = 1 << 11;

/// [`SerdesBus`] over the RTL930x indirect access engine.
pub struct Rtl930xBus<'a, R, D> {
    regs: &'a mut R,
    delay: &'a mut D,
}

impl<'a, R: SocRegisters, D: DelayNs> Rtl930xBus<'a, R, D> {
    pub(crate) fn new(regs: &'a mut R, delay: &'a mut D) -> Self {
        Self { regs, delay }
    }

    fn wait_idle(&mut self) -> Result<(), Error> {
        for _ in 0..INDACS_POLLS {
            if self.regs.read32(RTL930X_SDS_INDACS_CMD) & 0x1 == 0 {
                return Ok(());
            }
            self.delay.delay_ms(1);
        }
        error!("SerDes indirect access stuck busy");
        Err(Error::Io)
    }
}

forward_soc_and_delay!(Rtl930xBus);

fn command(lane: u32, page: u32, reg: u32) -> u32 {
    lane << 2 | page << 7 | reg << 13
}

impl<'a, R: SocRegisters, D: DelayNs> SerdesBus for Rtl930xBus<'a, R, D> {
    fn read_sds(&mut self, lane: u32, page: u32, reg: u32) -> Result<u16, Error> {
        self.regs.write32(RTL930X_SDS_INDACS_CMD, command(lane, page, reg) | 0x1);
        self.wait_idle()?;
        let v = (self.regs.read32(RTL930X_SDS_INDACS_DATA) & 0xffff) as u16;
        trace!("SerDes {} page {:x} reg {}: {:04x}", lane, page, reg, v);
        Ok(v)
    }

    fn write_sds(&mut self, lane: u32, page: u32, reg: u32, val: u16) -> Result<(), Error> {
        self.regs.write32(RTL930X_SDS_INDACS_DATA, u32::from(val));
        self.regs.write32(RTL930X_SDS_INDACS_CMD, command(lane, page, reg) | 0x3);
        self.wait_idle()
    }
}

/// Parameters of a mode the lock state machine can force.
struct ForceMode {
    code: u32,
    /// Clock from the LC oscillator instead of the ring.
    lc_on: bool,
    lc_value: u32,
}

fn force_mode_params(mode: PhyInterface) -> Option<ForceMode> {
    let (code, lc_on, lc_value) = match mode {
        PhyInterface::Sgmii => (0x02, false, 0x1),
        PhyInterface::Hsgmii => (0x12, false, 0x3),
        PhyInterface::_1000BaseX => (0x04, false, 0x1),
        PhyInterface::_2500BaseX => (0x16, false, 0x3),
        PhyInterface::_10GBaseR => (0x1a, true, 0x5),
        _ => return None,
    };
    Some(ForceMode { code, lc_on, lc_value })
}

/// Mode select code used by [`sds_rst`] during [`serdes_setup`].
pub fn setup_mode_code(mode: PhyInterface) -> Option<u32> {
    match mode {
        PhyInterface::Hsgmii => Some(0x12),
        PhyInterface::_1000BaseX => Some(0x04),
        PhyInterface::Xgmii => Some(0x10),
        PhyInterface::_10GBaseR => Some(0x1a),
        PhyInterface::Usxgmii => Some(0x0d),
        _ => None,
    }
}

/// The RTL930x SerDes lock state machine.
pub struct Rtl930xSerdes;

impl SerdesGeneration for Rtl930xSerdes {
    const LANES: u32 = 12;

    /// Power the lane down, force `mode` and wait for the clock to lock,
    /// toggling the oscillator between polls. The lane is disabled again
    /// if it never locks.
    fn set_mode<B: SerdesBus>(bus: &mut B, _soc: &SocInfo, lane: u32, mode: PhyInterface) -> Result<LaneState, Error> {
        check_lane::<Self>(lane)?;
        let params = match mode {
            PhyInterface::Na => None,
            _ => Some(force_mode_params(mode).ok_or(Error::UnsupportedMode)?),
        };
        info!("SerDes {}: force mode {:?}", lane, mode);

        trace!("SerDes {}: {:?}", lane, LaneState::Reset);
        disable(bus, lane)?;
        let Some(params) = params else {
            return Ok(LaneState::Disabled);
        };

        let lane_0 = lane & !1;
        let (m_bit, l_bit) = if lane == lane_0 { (5, 4) } else { (7, 6) };

        // Enable LC and ring
        bus.write_field(lane_0, 0x20, 18, 3, 0, 0xf)?;
        bus.write_field(lane_0, 0x20, 18, m_bit, l_bit, 0x1)?;
        bus.write_field(lane, 0x20, 0, 5, 4, 0x3)?;
        if params.lc_on {
            bus.write_field(lane_0, 0x20, 18, 11, 8, params.lc_value)?;
        } else {
            bus.write_field(lane_0, 0x20, 18, 15, 12, params.lc_value)?;
        }

        // Force analog LC and ring on
        bus.write_field(lane_0, 0x21, 11, 3, 0, 0xf)?;
        let v = if params.lc_on { 0x3 } else { 0x1 };
        bus.write_field(lane_0, 0x20, 18, m_bit, l_bit, v)?;

        bus.write_field(lane, 0x1f, 9, 6, 6, 0x1)?;
        bus.write_field(lane, 0x1f, 9, 11, 7, params.code)?;
        trace!("SerDes {}: {:?}", lane, LaneState::ModeForced(mode));

        let ten_g = mode == PhyInterface::_10GBaseR;
        for _ in 0..LOCK_POLLS {
            bus.delay_ms(LOCK_POLL_INTERVAL_MS);
            trace!("SerDes {}: {:?}", lane, LaneState::ClockWaiting);

            if clock_ready(bus, lane, lane_0)? && (!ten_g || ten_g_locked(bus, lane)?) {
                // Re-enable power
                bus.write_field(lane, 0x20, 0, 7, 6, 0)?;

                // Reset RX
                bus.write_field(lane, 0x2e, 0x15, 4, 4, 0x1)?;
                bus.delay_ms(5);
                bus.write_field(lane, 0x2e, 0x15, 4, 4, 0x0)?;

                debug!("SerDes {}: locked in mode {:?}", lane, mode);
                return Ok(LaneState::Locked(mode));
            }

            // Toggle LC or ring
            let (m_bit, l_bit) = if ten_g { (3, 2) } else { (1, 0) };
            bus.write_field(lane_0, 0x21, 11, m_bit, l_bit, 0x2)?;
            bus.delay_ms(10);
            bus.write_field(lane_0, 0x21, 11, m_bit, l_bit, 0x3)?;
        }

        error!("SerDes {}: no clock lock in mode {:?}", lane, mode);
        disable(bus, lane)?;
        Err(Error::NoLock)
    }
}

/// Power down `lane` and switch its mode select off.
fn disable<B: SerdesBus>(bus: &mut B, lane: u32) -> Result<(), Error> {
    bus.write_field(lane, 0x0, 0, 7, 6, 0x3)?;
    // Force mode enable
    bus.write_field(lane, 0x1f, 9, 6, 6, 0x1)?;
    bus.write_field(lane, 0x1f, 9, 11, 7, SDS_MODE_OFF)
}

/// Three consecutive samples of the clock ready flag, all of which must be set.
fn clock_ready<B: SerdesBus>(bus: &mut B, lane: u32, lane_0: u32) -> Result<bool, Error> {
    bus.write_sds(lane_0, 0x1f, 2, 53)?;
    let bit = if lane == lane_0 { 4 } else { 5 };

    let cr_0 = bus.read_field(lane_0, 0x1f, 20, bit, bit)?;
    bus.delay_ms(10);
    let cr_1 = bus.read_field(lane_0, 0x1f, 20, bit, bit)?;
    bus.delay_ms(10);
    let cr_2 = bus.read_field(lane_0, 0x1f, 20, bit, bit)?;

    Ok(cr_0 != 0 && cr_1 != 0 && cr_2 != 0)
}

/// 10GBASE-R lock detect, with the state machine reset around it.
fn ten_g_locked<B: SerdesBus>(bus: &mut B, lane: u32) -> Result<bool, Error> {
    let t = bus.read_field(lane, 0x6, 0x1, 2, 2)?;
    bus.write_field(lane, 0x6, 0x1, 2, 2, 0x1)?;
    reset_fsm(bus, lane)?;

    // The first read returns a latched value
    bus.read_field(lane, 0x5, 0, 12, 12)?;
    bus.delay_ms(1);
    let v = bus.read_field(lane, 0x5, 0, 12, 12)?;

    bus.write_field(lane, 0x6, 0x1, 2, 2, t)?;
    reset_fsm(bus, lane)?;

    Ok(v == 1)
}

fn reset_fsm<B: SerdesBus>(bus: &mut B, lane: u32) -> Result<(), Error> {
    bus.write_field(lane, 0x6, 0x2, 12, 12, 0x1)?;
    bus.delay_ms(10);
    bus.write_field(lane, 0x6, 0x2, 12, 12, 0x0)?;
    bus.delay_ms(10);
    Ok(())
}

/// Switch `lane` off and back on in mode select `code`.
///
/// Codes: 0x01 QSGMII, 0x04 1000BASE-X, 0x05 100BASE-FX, 0x06 QSGMII,
/// 0x09 RSGMII, 0x0d USXGMII, 0x10 XSGMII, 0x12 HSGMII, 0x16 2500BASE-X,
/// 0x17 RXAUI lite, 0x19 RXAUI plus, 0x1a 10GBASE-R, 0x1b 10GBASE-R/1000BASE-X
/// auto, 0x1f off.
pub fn sds_rst<B: SerdesBus>(bus: &mut B, lane: u32, code: u32) -> Result<(), Error> {
    check_lane::<Rtl930xSerdes>(lane)?;
    let reg = SDS_MODE_SEL_REGS[lane as usize];
    let lsb = SDS_MODE_SEL_LSB[lane as usize];
    debug!("SerDes {}: mode select {:x}", lane, code);

    bus.mask32(reg, 0x1f << lsb, SDS_MODE_OFF << lsb);
    bus.delay_ms(10);
    bus.mask32(reg, 0x1f << lsb, (code & 0x1f) << lsb);
    bus.delay_ms(10);
    Ok(())
}

/// Apply the fixed Tx equalization parameters of `mode`.
///
/// SGMII has no table and is left alone.
pub fn tx_config<B: SerdesBus>(bus: &mut B, lane: u32, mode: PhyInterface) -> Result<(), Error> {
    const IMPEDANCE: u32 = 0x8;
    const PRE_AMP: u32 = 0x2;
    const MAIN_AMP: u32 = 0x9;
    const POST_AMP: u32 = 0x2;
    const PRE_EN: u32 = 0x1;
    const POST_EN: u32 = 0x1;

    let page = match mode {
        PhyInterface::_1000BaseX => 0x25,
        PhyInterface::Hsgmii | PhyInterface::_2500BaseX => 0x29,
        PhyInterface::_10GBaseR => 0x2f,
        PhyInterface::Sgmii => return Ok(()),
        _ => return Err(Error::UnsupportedMode),
    };

    bus.write_field(lane, page, 0x1, 15, 11, PRE_AMP)?;
    bus.write_field(lane, page, 0x7, 0, 0, PRE_EN)?;
    bus.write_field(lane, page, 0x7, 8, 4, MAIN_AMP)?;
    bus.write_field(lane, page, 0x6, 4, 0, POST_AMP)?;
    bus.write_field(lane, page, 0x7, 3, 3, POST_EN)?;
    bus.write_field(lane, page, 0x18, 15, 12, IMPEDANCE)
}

/// Wait up to `timeout_ms` for the XGMII clock of SerDes 2 to become ready.
pub fn clock_wait<B: SerdesBus>(bus: &mut B, timeout_ms: u32) -> Result<(), Error> {
    for _ in 0..timeout_ms.max(1) {
        bus.write_field(2, 0x1f, 0x2, 15, 0, 53)?;
        // two bit field 5..=4
        if bus.read_field(2, 0x1f, 20, 6, 4)? == 3 {
            return Ok(());
        }
        bus.delay_ms(1);
    }
    Err(Error::Timeout)
}

/// Put the MAC side Tx and Rx of both the 1G and the 10G PHY of `lane` into
/// normal (`true`) or inverted (`false`) polarity.
pub fn mac_link_config<B: SerdesBus>(bus: &mut B, lane: u32, tx_normal: bool, rx_normal: bool) -> Result<(), Error> {
    let mut v10 = bus.read_sds(lane, 6, 2)?;
    let mut v1 = bus.read_sds(lane, 0, 0)?;
    trace!("SerDes {}: link config before {:04x} {:04x}", lane, v10, v1);

    v10 &= !(1 << 13 | 1 << 14);
    v1 &= !(1 << 8 | 1 << 9);
    if !rx_normal {
        v10 |= 1 << 13;
        v1 |= 1 << 9;
    }
    if !tx_normal {
        v10 |= 1 << 14;
        v1 |= 1 << 8;
    }

    bus.write_sds(lane, 6, 2, v10)?;
    bus.write_sds(lane, 0, 0, v1)
}

fn power_up<B: SerdesBus>(bus: &mut B, lane: u32, page: u32) -> Result<(), Error> {
    let v = bus.read_sds(lane, page, PHY_CTRL_REG)?;
    bus.write_sds(lane, page, PHY_CTRL_REG, v & !PHY_POWER_DOWN)
}

/// Full bring-up of `lane` in `mode`: fibre medium, mode select, MAC link,
/// PHY power, then the lock state machine and Tx equalization.
///
/// XGMII and USXGMII are selected through the mode select register only.
pub fn serdes_setup<B: SerdesBus>(bus: &mut B, soc: &SocInfo, lane: u32, mode: PhyInterface) -> Result<LaneState, Error> {
    check_lane::<Rtl930xSerdes>(lane)?;
    let code = setup_mode_code(mode).ok_or(Error::UnsupportedMode)?;
    info!("configuring SerDes {}, mode {:x}", lane, code);

    // Default medium is fibre
    let v = bus.read_sds(lane, 0x1f, 11)?;
    bus.write_sds(lane, 0x1f, 11, v | 1 << 1)?;

    sds_rst(bus, lane, code)?;
    mac_link_config(bus, lane, true, true)?;
    power_up(bus, lane, PAGE_1G_PHY)?;
    power_up(bus, lane, PAGE_10G_PHY)?;

    Rtl930xSerdes::set_mode(bus, soc, lane, PhyInterface::Na)?;
    let state = match force_mode_params(mode) {
        Some(_) => {
            let state = Rtl930xSerdes::set_mode(bus, soc, lane, mode)?;
            tx_config(bus, lane, mode)?;
            state
        }
        None => LaneState::ModeForced(mode),
    };

    sds_rst(bus, lane, code)?;
    Ok(state)
}

/// Probe time configuration of the SerDes behind MAC `port`: force the MAC
/// to `mode`'s speed with the link down, then run [`serdes_setup`].
pub fn configure_serdes<B: SerdesBus>(
    bus: &mut B,
    soc: &SocInfo,
    port: u8,
    lane: u32,
    mode: PhyInterface,
) -> Result<LaneState, Error> {
    let speed = match mode {
        PhyInterface::_10GBaseR => 4,
        PhyInterface::_1000BaseX => 2,
        _ => return Err(Error::UnsupportedMode),
    };
    check_lane::<Rtl930xSerdes>(lane)?;

    let reg = RTL930X_MAC_FORCE_MODE_CTRL + 4 * u32::from(port);
    let mut v = bus.read32(reg);
    // MAC forced, link down
    v |= 1 << 0;
    v &= !(7 << 3);
    v |= speed << 3;
    v &= !(1 << 1);
    bus.write32(reg, v);
    bus.delay_ms(20);

    serdes_setup(bus, soc, lane, mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serdes::mock::{IndirectSds, MockSerdes, S};
    use crate::soc::RTL930X_SMI_POLL_CTRL;
    use crate::testing::{MockDelay, MockMdio};
    use crate::Switch;

    fn soc() -> SocInfo {
        SocInfo::new(0x9302, 0)
    }

    fn clock_polls(bus: &MockSerdes, lane_0: u32) -> usize {
        bus.writes_to(lane_0, 0x1f, 2).iter().filter(|v| **v == 53).count()
    }

    #[test]
    fn indirect_access_commands() {
        let mut hw = IndirectSds::new(RTL930X_SDS_INDACS_CMD, RTL930X_SDS_INDACS_DATA);
        let mut delay = MockDelay::default();
        hw.sds.set(3, 0x1f, 11, 0xbeef);

        let mut bus = Rtl930xBus::new(&mut hw, &mut delay);
        assert_eq!(bus.read_sds(3, 0x1f, 11), Ok(0xbeef));
        bus.write_sds(5, 0x20, 18, 0x1234).unwrap();

        assert_eq!(hw.sds.get(5, 0x20, 18), 0x1234);
        assert_eq!(hw.sds.log, [S::Read(3, 0x1f, 11), S::Write(5, 0x20, 18, 0x1234)]);
        assert_eq!(delay.elapsed_ns, 0);
    }

    #[test]
    fn stuck_engine_is_an_io_error() {
        let mut regs = crate::testing::MockRegs::default();
        let mut delay = MockDelay::default();
        regs.regs.insert(RTL930X_SDS_INDACS_CMD, 1);
        let mut bus = Rtl930xBus::new(&mut regs, &mut delay);
        assert_eq!(bus.read_sds(0, 0, 0), Err(Error::Io));
        assert_eq!(delay.elapsed_ns, 100 * 1_000_000);
    }

    #[test]
    fn locks_on_third_poll() {
        let mut bus = MockSerdes::default();
        bus.script(4, 0x1f, 20, &[0, 0, 0, 0x10, 0, 0x10, 0x10, 0x10, 0x10]);

        let state = Rtl930xSerdes::set_mode(&mut bus, &soc(), 4, PhyInterface::Sgmii);
        assert_eq!(state, Ok(LaneState::Locked(PhyInterface::Sgmii)));
        assert_eq!(clock_polls(&bus, 4), 3);
        // ring toggled after each failed poll
        assert_eq!(bus.writes_to(4, 0x21, 11).len(), 1 + 2 * 2);
    }

    #[test]
    fn odd_lane_samples_its_own_bit() {
        let mut bus = MockSerdes::default();
        bus.set(6, 0x1f, 20, 0x20);

        let state = Rtl930xSerdes::set_mode(&mut bus, &soc(), 7, PhyInterface::_1000BaseX);
        assert_eq!(state, Ok(LaneState::Locked(PhyInterface::_1000BaseX)));
        assert_eq!(clock_polls(&bus, 6), 1);
        assert!(bus.log.contains(&S::Read(6, 0x1f, 20)));
        assert!(!bus.log.contains(&S::Read(7, 0x1f, 20)));
    }

    #[test]
    fn never_locks() {
        let mut bus = MockSerdes::default();

        let state = Rtl930xSerdes::set_mode(&mut bus, &soc(), 2, PhyInterface::Hsgmii);
        assert_eq!(state, Err(Error::NoLock));
        assert_eq!(clock_polls(&bus, 2), LOCK_POLLS as usize);
        // left off
        assert_eq!(bus.get(2, 0x1f, 9) >> 7 & 0x7, (SDS_MODE_OFF & 0x7) as u16);
        assert!(bus.delay.elapsed_ns >= u64::from(LOCK_POLLS * LOCK_POLL_INTERVAL_MS) * 1_000_000);
    }

    #[test]
    fn ten_g_needs_lock_detect() {
        let mut bus = MockSerdes::default();
        bus.set(0, 0x1f, 20, 0x10);
        bus.script(0, 0x5, 0, &[0x1000, 0x0000, 0x0000, 0x1000]);

        let state = Rtl930xSerdes::set_mode(&mut bus, &soc(), 0, PhyInterface::_10GBaseR);
        assert_eq!(state, Ok(LaneState::Locked(PhyInterface::_10GBaseR)));
        assert_eq!(clock_polls(&bus, 0), 2);
        // LC oscillator toggled, not the ring
        assert_eq!(bus.writes_to(0, 0x21, 11).len(), 1 + 2);
    }

    #[test]
    fn na_disables_without_polling() {
        let mut bus = MockSerdes::default();
        let state = Rtl930xSerdes::set_mode(&mut bus, &soc(), 1, PhyInterface::Na);
        assert_eq!(state, Ok(LaneState::Disabled));
        assert_eq!(clock_polls(&bus, 0), 0);
        assert_eq!(bus.delay.elapsed_ns, 0);
    }

    #[test]
    fn unsupported_mode_touches_nothing() {
        let mut bus = MockSerdes::default();
        assert_eq!(
            Rtl930xSerdes::set_mode(&mut bus, &soc(), 1, PhyInterface::Qsgmii),
            Err(Error::UnsupportedMode)
        );
        assert_eq!(
            Rtl930xSerdes::set_mode(&mut bus, &soc(), 12, PhyInterface::Sgmii),
            Err(Error::InvalidLane(12))
        );
        assert!(bus.log.is_empty());
    }

    #[test]
    fn mode_select_tables() {
        let mut bus = MockSerdes::default();
        bus.regs.regs.insert(0x2a4, 0xffff_ffff);
        sds_rst(&mut bus, 9, 0x1a).unwrap();
        assert_eq!(bus.regs.writes, [(0x2a4, 0xffff_ffff), (0x2a4, 0xffff_febf)]);
    }

    #[test]
    fn setup_xgmii_skips_lock() {
        let mut bus = MockSerdes::default();
        let state = serdes_setup(&mut bus, &soc(), 2, PhyInterface::Xgmii);
        assert_eq!(state, Ok(LaneState::ModeForced(PhyInterface::Xgmii)));
        assert_eq!(bus.get(2, 0x1f, 11), 1 << 1);
        assert_eq!(bus.regs.get(0x194) >> 12 & 0x1f, 0x10);
    }

    #[test]
    fn configure_forces_mac_speed() {
        let mut bus = MockSerdes::default();
        bus.set(2, 0x1f, 20, 0x10);
        bus.set(2, 0x5, 0, 0x1000);
        bus.regs.regs.insert(RTL930X_MAC_FORCE_MODE_CTRL + 4 * 26, 0x3a);

        let state = configure_serdes(&mut bus, &soc(), 26, 2, PhyInterface::_10GBaseR);
        assert_eq!(state, Ok(LaneState::Locked(PhyInterface::_10GBaseR)));
        assert_eq!(bus.regs.writes[0], (RTL930X_MAC_FORCE_MODE_CTRL + 4 * 26, 0x21));
    }

    #[test]
    fn mac_link_polarity() {
        let mut bus = MockSerdes::default();
        bus.set(3, 6, 2, 0xffff);
        bus.set(3, 0, 0, 0x0000);
        mac_link_config(&mut bus, 3, true, false).unwrap();
        assert_eq!(bus.get(3, 6, 2), 0x9fff | 1 << 13);
        assert_eq!(bus.get(3, 0, 0), 1 << 9);
    }

    #[test]
    fn clock_wait_times_out() {
        let mut bus = MockSerdes::default();
        assert_eq!(clock_wait(&mut bus, 5), Err(Error::Timeout));
        bus.set(2, 0x1f, 20, 3 << 4);
        assert_eq!(clock_wait(&mut bus, 5), Ok(()));
    }

    #[test]
    fn port_brought_up_in_1000base_x() {
        let mut hw = IndirectSds::new(RTL930X_SDS_INDACS_CMD, RTL930X_SDS_INDACS_DATA);
        hw.regs.regs.insert(RTL930X_SMI_POLL_CTRL, 0xffff_ffff);
        hw.sds.script(2, 0x1f, 20, &[0, 0, 0, 0, 0, 0]);
        hw.sds.set(2, 0x1f, 20, 0x10);
        let mut sw = Switch::new(soc(), MockMdio::default(), hw, MockDelay::default());

        let state = sw.set_serdes_mode(0, 2, PhyInterface::_1000BaseX);
        assert_eq!(state, Ok(LaneState::Locked(PhyInterface::_1000BaseX)));

        let hw = &sw.regs;
        assert_eq!(hw.sds.get(2, 0x1f, 9) >> 7 & 0x7, 0x04);
        assert_eq!(clock_polls(&hw.sds, 2), 3);
        // Tx equalization of page 0x25, once
        assert_eq!(hw.sds.writes_to(2, 0x25, 0x18).len(), 1);
        assert_eq!(hw.sds.get(2, 0x25, 0x18) >> 12 & 0x7, 0);
        assert!(hw.sds.writes_to(2, 0x29, 0x18).is_empty());
        assert_eq!(hw.regs.get(RTL930X_SMI_POLL_CTRL), 0xffff_ffff);
        assert!(sw.delay.elapsed_ns <= u64::from(LOCK_POLLS * LOCK_POLL_INTERVAL_MS + 1000) * 1_000_000);
    }
}
