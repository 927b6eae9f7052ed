#![no_std]
#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

// This must go FIRST so that other mods see its macros.
mod fmt;

use embedded_hal::delay::DelayNs;

use crate::phy::regs::{C22, C45};
use crate::soc::{SocInfo, SocRegisters};

/// Chip family detection and register access dispatch
pub mod family;
/// Firmware container parsing and validation
pub mod firmware;
/// Firmware patch application
pub mod patch;
/// Phy
pub mod phy;
/// Suspension of the automatic SMI link polling
pub mod polling;
/// Internal SerDes lanes
pub mod serdes;
/// Switch core register window
pub mod soc;

#[allow(dead_code)]
#[repr(u16)]
enum Reg13Op {
    Addr = 0b00 << 14,
    Write = 0b01 << 14,
    PostReadIncAddr = 0b10 << 14,
    Read = 0b11 << 14,
}
const DEV_MASK: u8 = 0x1f;

/// Page 0, used for the standard register set and the clause 45 tunnel.
const PAGE_STD: u16 = 0;

/// Error type of this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A bus transaction failed.
    Io,
    /// The operation is not implemented for the detected chip family.
    UnsupportedFamily,
    /// A firmware image was rejected.
    Firmware(FirmwareError),
    /// A bounded readiness loop ran out of iterations.
    Timeout,
    /// A SerDes lane did not reach clock lock. The lane has been disabled.
    NoLock,
    /// The requested interface mode has no code for this chip family.
    UnsupportedMode,
    /// The PHY reported an unexpected (internal) id.
    UnexpectedPhyId(u32),
    /// SerDes lane index out of range for the chip family.
    InvalidLane(u32),
    /// PHY address out of range, or not valid for this PHY model.
    InvalidAddress(u32),
    /// The port is configured for the fibre medium, which does not support the request.
    FibreMedium,
}

/// Reasons for rejecting a firmware image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FirmwareError {
    /// The host has no image with that name.
    NotFound,
    /// The image is shorter than its header.
    TooSmall,
    /// Header magic mismatch.
    BadMagic,
    /// CRC32 mismatch.
    BadChecksum,
    /// The image is meant for another PHY model.
    BadModel,
    /// A part table entry points outside the image.
    BadPartOffset,
}

impl From<FirmwareError> for Error {
    fn from(e: FirmwareError) -> Self {
        Error::Firmware(e)
    }
}

/// Paged register access to the PHYs behind one switch SoC.
///
/// Each chip family reaches its PHYs through a different SoC engine; the host
/// provides one implementation per family and [`family::Dispatcher`] routes
/// between them.
pub trait PhyAccess {
    /// Read a register of `page` on the PHY at `port`.
    fn read_phy(&mut self, port: u8, page: u16, reg: C22) -> Result<u16, Error>;
    /// Write a register of `page` on the PHY at `port`.
    fn write_phy(&mut self, port: u8, page: u16, reg: C22, val: u16) -> Result<(), Error>;

    /// Read, Clause 45
    /// This is the default implementation, tunneled through registers 13/14 of page 0.
    /// Implement this function when the SoC engine supports direct Clause 45 operations.
    fn read_mmd(&mut self, port: u8, reg: C45) -> Result<u16, Error> {
        let devad = u16::from(reg.devad.0 & DEV_MASK);

        // Write FN
        let val = (Reg13Op::Addr as u16) | devad;
        self.write_phy(port, PAGE_STD, C22::MMD_CONTROL, val)?;
        // Write Addr
        self.write_phy(port, PAGE_STD, C22::MMD_DATA, reg.regnum)?;

        // Write FN
        let val = (Reg13Op::Read as u16) | devad;
        self.write_phy(port, PAGE_STD, C22::MMD_CONTROL, val)?;
        // Read Data
        self.read_phy(port, PAGE_STD, C22::MMD_DATA)
    }

    /// Write, Clause 45
    /// This is the default implementation, tunneled through registers 13/14 of page 0.
    /// Implement this function when the SoC engine supports direct Clause 45 operations.
    fn write_mmd(&mut self, port: u8, reg: C45, reg_val: u16) -> Result<(), Error> {
        let devad = u16::from(reg.devad.0 & DEV_MASK);

        // Write FN
        let val = (Reg13Op::Addr as u16) | devad;
        self.write_phy(port, PAGE_STD, C22::MMD_CONTROL, val)?;
        // Write Addr
        self.write_phy(port, PAGE_STD, C22::MMD_DATA, reg.regnum)?;

        // Write FN
        let val = (Reg13Op::Write as u16) | devad;
        self.write_phy(port, PAGE_STD, C22::MMD_CONTROL, val)?;
        // Write Data
        self.write_phy(port, PAGE_STD, C22::MMD_DATA, reg_val)
    }
}

impl<T: PhyAccess + ?Sized> PhyAccess for &mut T {
    fn read_phy(&mut self, port: u8, page: u16, reg: C22) -> Result<u16, Error> {
        T::read_phy(self, port, page, reg)
    }
    fn write_phy(&mut self, port: u8, page: u16, reg: C22, val: u16) -> Result<(), Error> {
        T::write_phy(self, port, page, reg, val)
    }
    fn read_mmd(&mut self, port: u8, reg: C45) -> Result<u16, Error> {
        T::read_mmd(self, port, reg)
    }
    fn write_mmd(&mut self, port: u8, reg: C45, reg_val: u16) -> Result<(), Error> {
        T::write_mmd(self, port, reg, reg_val)
    }
}

/// One switch SoC: its identity, the PHY register path, the switch core
/// registers and a delay source for the busy-wait loops.
///
/// Every configuration sequence borrows the `Switch` mutably for its whole
/// duration, so no other configuration path can run (or re-enable link
/// polling) in the middle of it.
pub struct Switch<M, R, D> {
    soc: SocInfo,
    mdio: M,
    regs: R,
    delay: D,
}

impl<M: PhyAccess, R: SocRegisters, D: DelayNs> Switch<M, R, D> {
    /// Create a new `Switch`.
    pub fn new(soc: SocInfo, mdio: M, regs: R, delay: D) -> Self {
        Self { soc, mdio, regs, delay }
    }

    /// SoC identity this instance was created with.
    pub fn soc(&self) -> &SocInfo {
        &self.soc
    }

    /// Direct access to the PHY register path.
    pub fn mdio(&mut self) -> &mut M {
        &mut self.mdio
    }

    /// Direct access to the switch core registers.
    pub fn regs(&mut self) -> &mut R {
        &mut self.regs
    }

    /// Release the owned resources.
    pub fn release(self) -> (M, R, D) {
        (self.mdio, self.regs, self.delay)
    }

    pub(crate) fn read_phy(&mut self, port: u8, page: u16, reg: C22) -> Result<u16, Error> {
        self.mdio.read_phy(port, page, reg)
    }

    pub(crate) fn write_phy(&mut self, port: u8, page: u16, reg: C22, val: u16) -> Result<(), Error> {
        self.mdio.write_phy(port, page, reg, val)
    }

    pub(crate) fn read_mmd(&mut self, port: u8, reg: C45) -> Result<u16, Error> {
        self.mdio.read_mmd(port, reg)
    }

    pub(crate) fn write_mmd(&mut self, port: u8, reg: C45, val: u16) -> Result<(), Error> {
        self.mdio.write_mmd(port, reg, val)
    }

    pub(crate) fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    pub(crate) fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }
}

#[cfg(feature = "time")]
impl<M: PhyAccess, R: SocRegisters> Switch<M, R, embassy_time::Delay> {
    /// Create a new `Switch` sleeping through `embassy_time::Delay`.
    pub fn new_blocking(soc: SocInfo, mdio: M, regs: R) -> Self {
        Self::new(soc, mdio, regs, embassy_time::Delay)
    }
}


#[cfg(test)]
mod tests {
    extern crate alloc;
    use alloc::{vec, vec::Vec};

    use crate::phy::regs::{Mmd, C22, C45};
    use crate::{Error, PhyAccess};

    #[derive(Debug, PartialEq)]
    enum A {
        Read(u8, u16, C22),
        Write(u8, u16, C22, u16),
    }

    struct MockMdioBus(Vec<A>);

    impl MockMdioBus {
        pub fn clear(&mut self) {
            self.0.clear();
        }
    }

    impl PhyAccess for MockMdioBus {
        fn read_phy(&mut self, port: u8, page: u16, reg: C22) -> Result<u16, Error> {
            self.0.push(A::Read(port, page, reg));
            Ok(0)
        }

        fn write_phy(&mut self, port: u8, page: u16, reg: C22, val: u16) -> Result<(), Error> {
            self.0.push(A::Write(port, page, reg, val));
            Ok(())
        }
    }

    #[test]
    fn read_test() {
        let mut mdiobus = MockMdioBus(Vec::with_capacity(20));

        mdiobus.clear();
        assert_eq!(mdiobus.read_phy(0x01, 0xa42, C22(0x10)), Ok(0));
        assert_eq!(mdiobus.0, vec![A::Read(0x01, 0xa42, C22(0x10))]);

        mdiobus.clear();
        assert_eq!(mdiobus.read_mmd(0x01, C45::new(Mmd::AN, 60)), Ok(0));
        assert_eq!(
            mdiobus.0,
            vec![
                #[allow(clippy::identity_op)]
                A::Write(0x01, 0, C22::MMD_CONTROL, (0b00 << 14) | 7),
                A::Write(0x01, 0, C22::MMD_DATA, 60),
                A::Write(0x01, 0, C22::MMD_CONTROL, (0b11 << 14) | 7),
                A::Read(0x01, 0, C22::MMD_DATA)
            ]
        );
    }

    #[test]
    fn write_test() {
        let mut mdiobus = MockMdioBus(Vec::with_capacity(20));

        mdiobus.clear();
        mdiobus.write_phy(0x1f, 0xfff, C22(0x1d), 0x0008).unwrap();
        assert_eq!(mdiobus.0, vec![A::Write(0x1f, 0xfff, C22(0x1d), 0x0008)]);

        // The same sequence the RTL8218B uses to advertise 100/1000M EEE.
        mdiobus.clear();
        assert_eq!(mdiobus.write_mmd(0x08, C45::new(Mmd::AN, 0x3c), 0x0006), Ok(()));
        assert_eq!(
            mdiobus.0,
            vec![
                A::Write(0x08, 0, C22::MMD_CONTROL, 0x0007),
                A::Write(0x08, 0, C22::MMD_DATA, 0x003c),
                A::Write(0x08, 0, C22::MMD_CONTROL, 0x4007),
                A::Write(0x08, 0, C22::MMD_DATA, 0x0006)
            ]
        );
    }
}
