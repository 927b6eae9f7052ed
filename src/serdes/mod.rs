//! Internal SerDes lanes.
//!
//! Every SerDes register access goes through a [`SerdesBus`]: one
//! implementation per generation performs the raw 16 bit lane register
//! access, while the bit field accessors on top of it are shared.
//!
//! The bit field length convention of the vendor SDK is kept as is: a field
//! `(end_bit, start_bit)` is `end_bit - start_bit - 1` bits long, so e.g.
//! `(11, 7)` covers bits 7..=9. The register tables of every generation are
//! written against that convention.

use embedded_hal::delay::DelayNs;

use crate::family::ChipFamily;
use crate::soc::{SocInfo, SocRegisters};
use crate::{Error, PhyAccess, Switch};

pub mod rtl838x;
pub mod rtl839x;
pub mod rtl930x;
pub mod rtl931x;

/// Electrical/protocol mode of a SerDes lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PhyInterface {
    /// No mode, the lane is switched off.
    Na,
    /// SGMII
    Sgmii,
    /// 2.5G SGMII
    Hsgmii,
    /// Quad SGMII
    Qsgmii,
    /// 10G XGMII (XSGMII on the wire)
    Xgmii,
    /// USXGMII
    Usxgmii,
    /// 1000BASE-X
    _1000BaseX,
    /// 2500BASE-X
    _2500BaseX,
    /// 10GBASE-R
    _10GBaseR,
    /// 10GBASE-KR
    _10GKr,
    /// XAUI (RXAUI lite)
    Xaui,
}

/// State of a SerDes lane as driven by the mode state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LaneState {
    /// Powered down, mode select off.
    Disabled,
    /// Powered down, about to be forced into a mode.
    Reset,
    /// Mode code written. Terminal for generations without lock detection.
    ModeForced(PhyInterface),
    /// Waiting for the clock to become ready.
    ClockWaiting,
    /// Clock ready and locked.
    Locked(PhyInterface),
}

/// Raw SerDes lane register access of one SoC generation, plus the switch
/// core registers and the delay source the SerDes sequences need.
pub trait SerdesBus: SocRegisters + DelayNs {
    /// Read a 16 bit lane register.
    fn read_sds(&mut self, lane: u32, page: u32, reg: u32) -> Result<u16, Error>;
    /// Write a 16 bit lane register.
    fn write_sds(&mut self, lane: u32, page: u32, reg: u32, val: u16) -> Result<(), Error>;

    /// Read the field `(end_bit, start_bit)` of a lane register.
    ///
    /// Lengths of 32 or more return the whole register.
    fn read_field(&mut self, lane: u32, page: u32, reg: u32, end_bit: u32, start_bit: u32) -> Result<u32, Error> {
        let v = u32::from(self.read_sds(lane, page, reg)?);
        match field_mask(end_bit, start_bit) {
            Some(mask) => Ok(v.wrapping_shr(start_bit) & mask),
            None => Ok(v),
        }
    }

    /// Write the field `(end_bit, start_bit)` of a lane register, keeping
    /// all other bits.
    ///
    /// Lengths of 32 or more write `v` to the whole register without reading it.
    fn write_field(
        &mut self,
        lane: u32,
        page: u32,
        reg: u32,
        end_bit: u32,
        start_bit: u32,
        v: u32,
    ) -> Result<(), Error> {
        let data = match field_mask(end_bit, start_bit) {
            Some(mask) => {
                let mut data = u32::from(self.read_sds(lane, page, reg)?);
                data &= !mask.wrapping_shl(start_bit);
                data |= (v & mask).wrapping_shl(start_bit);
                data
            }
            None => v,
        };
        self.write_sds(lane, page, reg, data as u16)
    }
}

/// Mask of a field in the SDK length convention, `None` if it spans the whole word.
///
/// Single bit fields come out with a negative length; the shift then wraps
/// like the 32 bit shift instruction of the SoC.
pub(crate) fn field_mask(end_bit: u32, start_bit: u32) -> Option<u32> {
    let len = end_bit as i32 - start_bit as i32 - 1;
    if len >= 32 {
        return None;
    }
    Some(1u32.wrapping_shl(len as u32).wrapping_sub(1))
}

/// Mode state machine of one SerDes generation.
pub trait SerdesGeneration {
    /// Number of lanes.
    const LANES: u32;

    /// Force `lane` into `mode`.
    ///
    /// [`PhyInterface::Na`] disables the lane. Unsupported modes are rejected
    /// before any register is touched.
    fn set_mode<B: SerdesBus>(bus: &mut B, soc: &SocInfo, lane: u32, mode: PhyInterface) -> Result<LaneState, Error>;
}

pub(crate) fn check_lane<G: SerdesGeneration>(lane: u32) -> Result<(), Error> {
    if lane >= G::LANES {
        error!("wrong SerDes number: {}", lane);
        return Err(Error::InvalidLane(lane));
    }
    Ok(())
}

impl<M: PhyAccess, R: SocRegisters, D: DelayNs> Switch<M, R, D> {
    /// Force SerDes `lane`, serving `port`, into `mode`.
    ///
    /// Link polling of `port` is suspended for the whole sequence.
    pub fn set_serdes_mode(&mut self, port: u8, lane: u32, mode: PhyInterface) -> Result<LaneState, Error> {
        let family = self.soc.family()?;
        let soc = self.soc;
        self.with_polling_disabled(port, |sw| match family {
            ChipFamily::Rtl838x => Err(Error::UnsupportedFamily),
            ChipFamily::Rtl839x => rtl839x::Rtl839xSerdes::set_mode(&mut sw.rtl839x_bus(), &soc, lane, mode),
            ChipFamily::Rtl930x => {
                let mut bus = sw.rtl930x_bus();
                let state = rtl930x::Rtl930xSerdes::set_mode(&mut bus, &soc, lane, mode)?;
                if let LaneState::Locked(mode) = state {
                    rtl930x::tx_config(&mut bus, lane, mode)?;
                }
                Ok(state)
            }
            ChipFamily::Rtl931x => rtl931x::Rtl931xSerdes::set_mode(&mut sw.rtl931x_bus(), &soc, lane, mode),
        })
    }

    pub(crate) fn rtl838x_bus(&mut self) -> rtl838x::Rtl838xBus<'_, R, D> {
        rtl838x::Rtl838xBus::new(&mut self.regs, &mut self.delay)
    }

    pub(crate) fn rtl839x_bus(&mut self) -> rtl839x::Rtl839xBus<'_, R, D> {
        rtl839x::Rtl839xBus::new(&mut self.regs, &mut self.delay, self.soc.id() == 0x8393)
    }

    pub(crate) fn rtl930x_bus(&mut self) -> rtl930x::Rtl930xBus<'_, R, D> {
        rtl930x::Rtl930xBus::new(&mut self.regs, &mut self.delay)
    }

    pub(crate) fn rtl931x_bus(&mut self) -> rtl931x::Rtl931xBus<'_, R, D> {
        rtl931x::Rtl931xBus::new(&mut self.regs, &mut self.delay)
    }
}

/// Forwards the switch core registers and the delay of a SerDes bus wrapper
/// holding `regs` and `delay` fields.
macro_rules! forward_soc_and_delay {
    ($bus:ident) => {
        impl<'a, R: $crate::soc::SocRegisters, D: embedded_hal::delay::DelayNs> $crate::soc::SocRegisters
            for $bus<'a, R, D>
        {
            fn read32(&mut self, reg: u32) -> u32 {
                self.regs.read32(reg)
            }
            fn write32(&mut self, reg: u32, val: u32) {
                self.regs.write32(reg, val)
            }
        }

        impl<'a, R: $crate::soc::SocRegisters, D: embedded_hal::delay::DelayNs> embedded_hal::delay::DelayNs
            for $bus<'a, R, D>
        {
            fn delay_ns(&mut self, ns: u32) {
                self.delay.delay_ns(ns)
            }
            fn delay_us(&mut self, us: u32) {
                self.delay.delay_us(us)
            }
            fn delay_ms(&mut self, ms: u32) {
                self.delay.delay_ms(ms)
            }
        }
    };
}
pub(crate) use forward_soc_and_delay;

#[cfg(test)]
pub(crate) mod mock {
    extern crate alloc;
    use alloc::collections::BTreeMap;
    use alloc::vec::Vec;

    use embedded_hal::delay::DelayNs;

    use super::SerdesBus;
    use crate::soc::SocRegisters;
    use crate::testing::{MockDelay, MockRegs};
    use crate::Error;

    #[derive(Debug, Clone, Copy, PartialEq)]
    pub enum S {
        Read(u32, u32, u32),
        Write(u32, u32, u32, u16),
    }

    /// Lane register file with scripted reads.
    #[derive(Default)]
    pub struct MockSerdes {
        pub lanes: BTreeMap<(u32, u32, u32), u16>,
        pub scripted: BTreeMap<(u32, u32, u32), Vec<u16>>,
        pub log: Vec<S>,
        pub regs: MockRegs,
        pub delay: MockDelay,
    }

    impl MockSerdes {
        pub fn get(&self, lane: u32, page: u32, reg: u32) -> u16 {
            self.lanes.get(&(lane, page, reg)).copied().unwrap_or(0)
        }

        pub fn set(&mut self, lane: u32, page: u32, reg: u32, val: u16) {
            self.lanes.insert((lane, page, reg), val);
        }

        pub fn script(&mut self, lane: u32, page: u32, reg: u32, values: &[u16]) {
            self.scripted.insert((lane, page, reg), values.to_vec());
        }

        pub fn writes_to(&self, lane: u32, page: u32, reg: u32) -> Vec<u16> {
            self.log
                .iter()
                .filter_map(|s| match *s {
                    S::Write(l, p, r, v) if (l, p, r) == (lane, page, reg) => Some(v),
                    _ => None,
                })
                .collect()
        }
    }

    impl SocRegisters for MockSerdes {
        fn read32(&mut self, reg: u32) -> u32 {
            self.regs.read32(reg)
        }
        fn write32(&mut self, reg: u32, val: u32) {
            self.regs.write32(reg, val)
        }
    }

    impl DelayNs for MockSerdes {
        fn delay_ns(&mut self, ns: u32) {
            self.delay.delay_ns(ns)
        }
    }

    /// Switch core registers of a RTL930x/RTL931x style indirect SerDes
    /// engine: a command register with a busy bit and a data register, in
    /// front of a lane register file.
    #[derive(Default)]
    pub struct IndirectSds {
        pub cmd_reg: u32,
        pub data_reg: u32,
        pub regs: MockRegs,
        pub sds: MockSerdes,
    }

    impl IndirectSds {
        pub fn new(cmd_reg: u32, data_reg: u32) -> Self {
            Self {
                cmd_reg,
                data_reg,
                ..Default::default()
            }
        }
    }

    impl SocRegisters for IndirectSds {
        fn read32(&mut self, reg: u32) -> u32 {
            self.regs.read32(reg)
        }

        fn write32(&mut self, reg: u32, val: u32) {
            if reg == self.cmd_reg && val & 1 != 0 {
                let lane = (val >> 2) & 0x1f;
                let page = (val >> 7) & 0x3f;
                let r = (val >> 13) & 0x1f;
                if val & 2 != 0 {
                    let data = self.regs.get(self.data_reg) as u16;
                    self.sds.write_sds(lane, page, r, data).unwrap();
                } else {
                    let data = self.sds.read_sds(lane, page, r).unwrap();
                    self.regs.write32(self.data_reg, u32::from(data));
                }
                self.regs.write32(reg, val & !1);
            } else {
                self.regs.write32(reg, val);
            }
        }
    }

    impl SerdesBus for MockSerdes {
        fn read_sds(&mut self, lane: u32, page: u32, reg: u32) -> Result<u16, Error> {
            self.log.push(S::Read(lane, page, reg));
            if let Some(script) = self.scripted.get_mut(&(lane, page, reg)) {
                if !script.is_empty() {
                    return Ok(script.remove(0));
                }
            }
            Ok(self.get(lane, page, reg))
        }

        fn write_sds(&mut self, lane: u32, page: u32, reg: u32, val: u16) -> Result<(), Error> {
            self.log.push(S::Write(lane, page, reg, val));
            self.lanes.insert((lane, page, reg), val);
            Ok(())
        }
    }
}
