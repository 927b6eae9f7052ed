use crate::family::ChipFamily;
use crate::Error;

/// 32-bit switch core register window (`sw_r32` / `sw_w32`).
pub trait SocRegisters {
    /// Read the register at byte offset `reg`.
    fn read32(&mut self, reg: u32) -> u32;
    /// Write the register at byte offset `reg`.
    fn write32(&mut self, reg: u32, val: u32);

    /// Clear `clear`, then set `set`.
    fn mask32(&mut self, reg: u32, clear: u32, set: u32) {
        let v = self.read32(reg);
        self.write32(reg, (v & !clear) | set);
    }
}

impl<T: SocRegisters + ?Sized> SocRegisters for &mut T {
    fn read32(&mut self, reg: u32) -> u32 {
        T::read32(self, reg)
    }
    fn write32(&mut self, reg: u32, val: u32) {
        T::write32(self, reg, val)
    }
}

/// Identity of the switch SoC, read once from the hardware at start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SocInfo {
    id: u16,
    family: Option<ChipFamily>,
    chip_type: u8,
}

impl SocInfo {
    /// Build from the chip id (e.g. `0x8380`, `0x9302`) and the raw model
    /// name info register.
    pub fn new(id: u16, model_info: u32) -> Self {
        Self {
            id,
            family: ChipFamily::from_chip_id(id),
            chip_type: ((model_info >> 4) & 0x1) as u8,
        }
    }

    /// Read the model name info register of each generation until one
    /// reports a known chip id.
    pub fn detect<R: SocRegisters>(regs: &mut R) -> Self {
        for reg in [MODEL_NAME_INFO_838X, MODEL_NAME_INFO_839X, MODEL_NAME_INFO_93XX] {
            let info = regs.read32(reg);
            let id = (info >> 16) as u16;
            if ChipFamily::from_chip_id(id).is_some() {
                debug!("detected switch SoC {:x}", id);
                return Self::new(id, info);
            }
        }
        warn!("unknown switch SoC");
        Self::new(0, 0)
    }

    /// Chip id, e.g. `0x8393`.
    pub fn id(&self) -> u16 {
        self.id
    }

    /// Chip family, or [`Error::UnsupportedFamily`] for unknown silicon.
    pub fn family(&self) -> Result<ChipFamily, Error> {
        self.family.ok_or(Error::UnsupportedFamily)
    }

    /// RTL931x chip type (bit 4 of the model info register).
    pub fn chip_type(&self) -> u8 {
        self.chip_type
    }

    /// Same identity with the RTL931x chip type forced.
    pub fn with_chip_type(mut self, chip_type: u8) -> Self {
        self.chip_type = chip_type;
        self
    }
}

pub(crate) const MODEL_NAME_INFO_838X: u32 = 0x00d4;
pub(crate) const MODEL_NAME_INFO_839X: u32 = 0x0ff0;
pub(crate) const MODEL_NAME_INFO_93XX: u32 = 0x0004;

// RTL838x
pub(crate) const RTL838X_SMI_POLL_CTRL: u32 = 0xa17c;
pub(crate) const RTL838X_SDS4_FIB_REG0: u32 = 0xf800;
pub(crate) const RTL838X_SDS_CFG_REG: u32 = 0x0034;
pub(crate) const RTL838X_SDS_MODE_SEL: u32 = 0x0028;
pub(crate) const RTL838X_INT_RW_CTRL: u32 = 0x0058;
pub(crate) const RTL838X_INT_MODE_CTRL: u32 = 0x005c;
pub(crate) const RTL838X_PLL_CML_CTRL: u32 = 0x0ff8;
pub(crate) const RTL838X_DMY_REG31: u32 = 0x3b28;

// RTL839x
pub(crate) const RTL839X_SMI_PORT_POLLING_CTRL: u32 = 0x03fc;
pub(crate) const RTL839X_SDS12_13_XSG0: u32 = 0xb800;

// RTL930x
pub(crate) const RTL930X_SMI_POLL_CTRL: u32 = 0xca90;
pub(crate) const RTL930X_SDS_INDACS_CMD: u32 = 0x03b0;
pub(crate) const RTL930X_SDS_INDACS_DATA: u32 = 0x03b4;
pub(crate) const RTL930X_MAC_FORCE_MODE_CTRL: u32 = 0xca1c;

// RTL931x
pub(crate) const RTL931X_SERDES_INDRT_ACCESS_CTRL: u32 = 0x5638;
pub(crate) const RTL931X_SERDES_INDRT_DATA_CTRL: u32 = 0x563c;
pub(crate) const RTL931X_PS_SERDES_OFF_MODE_CTRL: u32 = 0x13f4;
pub(crate) const RTL931X_SERDES_MODE_CTRL: u32 = 0x13cc;
pub(crate) const RTL931X_CHIP_INFO: u32 = 0x0008;
