use crate::phy::regs::{C22, C45};
use crate::soc::SocInfo;
use crate::{Error, PhyAccess};

/// Switch SoC generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChipFamily {
    /// RTL8380/RTL8382 (Maple)
    Rtl838x,
    /// RTL8391/RTL8392/RTL8393 (Cypress)
    Rtl839x,
    /// RTL9301/RTL9302/RTL9303 (Longan)
    Rtl930x,
    /// RTL9311/RTL9312/RTL9313 (Mango)
    Rtl931x,
}

impl ChipFamily {
    /// Family of a chip id, `None` for unknown silicon.
    pub fn from_chip_id(id: u16) -> Option<Self> {
        match id & 0xfff0 {
            0x8380 => Some(Self::Rtl838x),
            0x8390 => Some(Self::Rtl839x),
            0x9300 => Some(Self::Rtl930x),
            0x9310 => Some(Self::Rtl931x),
            _ => None,
        }
    }
}

/// Placeholder backend for a family the host does not support.
///
/// Every access fails with [`Error::UnsupportedFamily`].
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBackend;

impl PhyAccess for NoBackend {
    fn read_phy(&mut self, _port: u8, _page: u16, _reg: C22) -> Result<u16, Error> {
        Err(Error::UnsupportedFamily)
    }

    fn write_phy(&mut self, _port: u8, _page: u16, _reg: C22, _val: u16) -> Result<(), Error> {
        Err(Error::UnsupportedFamily)
    }

    fn read_mmd(&mut self, _port: u8, _reg: C45) -> Result<u16, Error> {
        Err(Error::UnsupportedFamily)
    }

    fn write_mmd(&mut self, _port: u8, _reg: C45, _reg_val: u16) -> Result<(), Error> {
        Err(Error::UnsupportedFamily)
    }
}

/// Routes PHY and MMD accesses to the backend of the detected family.
///
/// The family is fixed when the dispatcher is built; the backends are opaque
/// and only need to satisfy [`PhyAccess`].
pub struct Dispatcher<A = NoBackend, B = NoBackend, C = NoBackend, D = NoBackend> {
    family: Option<ChipFamily>,
    rtl838x: A,
    rtl839x: B,
    rtl930x: C,
    rtl931x: D,
}

impl<A, B, C, D> Dispatcher<A, B, C, D>
where
    A: PhyAccess,
    B: PhyAccess,
    C: PhyAccess,
    D: PhyAccess,
{
    /// Create a dispatcher for the family of `soc`.
    pub fn new(soc: &SocInfo, rtl838x: A, rtl839x: B, rtl930x: C, rtl931x: D) -> Self {
        Self {
            family: soc.family().ok(),
            rtl838x,
            rtl839x,
            rtl930x,
            rtl931x,
        }
    }

    /// The family accesses are routed to.
    pub fn family(&self) -> Option<ChipFamily> {
        self.family
    }

    fn backend(&mut self) -> Result<&mut dyn PhyAccess, Error> {
        match self.family {
            Some(ChipFamily::Rtl838x) => Ok(&mut self.rtl838x),
            Some(ChipFamily::Rtl839x) => Ok(&mut self.rtl839x),
            Some(ChipFamily::Rtl930x) => Ok(&mut self.rtl930x),
            Some(ChipFamily::Rtl931x) => Ok(&mut self.rtl931x),
            None => Err(Error::UnsupportedFamily),
        }
    }
}

impl<A, B, C, D> PhyAccess for Dispatcher<A, B, C, D>
where
    A: PhyAccess,
    B: PhyAccess,
    C: PhyAccess,
    D: PhyAccess,
{
    fn read_phy(&mut self, port: u8, page: u16, reg: C22) -> Result<u16, Error> {
        self.backend()?.read_phy(port, page, reg)
    }

    fn write_phy(&mut self, port: u8, page: u16, reg: C22, val: u16) -> Result<(), Error> {
        self.backend()?.write_phy(port, page, reg, val)
    }

    fn read_mmd(&mut self, port: u8, reg: C45) -> Result<u16, Error> {
        self.backend()?.read_mmd(port, reg)
    }

    fn write_mmd(&mut self, port: u8, reg: C45, reg_val: u16) -> Result<(), Error> {
        self.backend()?.write_mmd(port, reg, reg_val)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phy::regs::Mmd;
    use crate::testing::{MockMdio, A};

    #[test]
    fn routes_to_detected_family() {
        let soc = SocInfo::new(0x9302, 0);
        let mut d = Dispatcher::new(&soc, NoBackend, NoBackend, MockMdio::default(), NoBackend);
        assert_eq!(d.family(), Some(ChipFamily::Rtl930x));

        d.write_phy(3, 0xa42, C22(0x10), 0x1234).unwrap();
        assert_eq!(d.read_phy(3, 0xa42, C22(0x10)), Ok(0x1234));
        d.write_mmd(3, C45::new(Mmd::AN, 60), 6).unwrap();
        assert_eq!(
            d.rtl930x.log,
            [
                A::Write(3, 0xa42, 0x10, 0x1234),
                A::Read(3, 0xa42, 0x10),
                A::WriteMmd(3, 7, 60, 6)
            ]
        );
    }

    #[test]
    fn unknown_family_is_unsupported() {
        let soc = SocInfo::new(0x1234, 0);
        let mut d = Dispatcher::new(
            &soc,
            MockMdio::default(),
            MockMdio::default(),
            MockMdio::default(),
            MockMdio::default(),
        );
        assert_eq!(d.read_phy(0, 0, C22::BMCR), Err(Error::UnsupportedFamily));
        assert_eq!(d.write_mmd(0, C45::new(Mmd::AN, 0), 0), Err(Error::UnsupportedFamily));
        assert!(d.rtl838x.log.is_empty());
    }

    #[test]
    fn missing_backend_is_unsupported() {
        let soc = SocInfo::new(0x8380, 0);
        let mut d: Dispatcher = Dispatcher::new(&soc, NoBackend, NoBackend, NoBackend, NoBackend);
        assert_eq!(d.read_mmd(0, C45::new(Mmd::AN, 0)), Err(Error::UnsupportedFamily));
    }
}
