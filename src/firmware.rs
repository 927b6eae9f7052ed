//! Vendor patch firmware container.
//!
//! ```text
//! +--------+----------+-----------+-------------------+---------
//! | magic  | checksum | phy_model | part start [10]   | payload
//! +--------+----------+-----------+-------------------+---------
//!   u32      u32        u32         u32 each            u32 records
//! ```
//!
//! All words are little endian. Part starts are byte offsets relative to the
//! end of the header. The checksum is the CRC32 of the whole image with the
//! checksum word read as zero.

use crate::FirmwareError;

/// Magic number of every image.
pub const MAGIC: u32 = 0x8380_8380;

/// Number of entries in the part table.
pub const PARTS: usize = 10;

/// Size of the header in bytes.
pub const HEADER_LEN: usize = 12 + 4 * PARTS;

/// Image for the RTL8380 internal PHYs and SerDes.
pub const FW_RTL8380: &str = "rtl838x_phy/rtl838x_8380.fw";
/// Image for the external RTL8218B.
pub const FW_RTL8218B: &str = "rtl838x_phy/rtl838x_8218b.fw";
/// Image for the RTL8214FC.
pub const FW_RTL8214FC: &str = "rtl838x_phy/rtl838x_8214fc.fw";

/// `phy_model` of [`FW_RTL8380`].
pub const MODEL_RTL8380: u32 = 0x8380_0000;
/// `phy_model` of [`FW_RTL8218B`].
pub const MODEL_RTL8218B: u32 = 0x8218_b000;
/// `phy_model` of [`FW_RTL8214FC`].
pub const MODEL_RTL8214FC: u32 = 0x8214_fc00;

/// Host side source of firmware images.
pub trait FirmwareLoader {
    /// Return the image stored under `name`, or [`FirmwareError::NotFound`].
    fn load(&mut self, name: &str) -> Result<&[u8], FirmwareError>;
}

impl<T: FirmwareLoader + ?Sized> FirmwareLoader for &mut T {
    fn load(&mut self, name: &str) -> Result<&[u8], FirmwareError> {
        T::load(self, name)
    }
}

/// A validated firmware image.
///
/// Only borrows the loader's buffer; it cannot outlive the patch sequence
/// it was loaded for.
#[derive(Debug, Clone, Copy)]
pub struct Firmware<'a> {
    data: &'a [u8],
    model: u32,
}

impl<'a> Firmware<'a> {
    /// Validate `data` as an image for `model`.
    ///
    /// Checks run in order: length, magic, checksum, model, part table.
    pub fn parse(data: &'a [u8], model: u32) -> Result<Self, FirmwareError> {
        if data.len() < HEADER_LEN {
            error!("firmware too small: {} bytes", data.len());
            return Err(FirmwareError::TooSmall);
        }

        let magic = le32(data, 0);
        if magic != MAGIC {
            error!("firmware magic mismatch: {:x}", magic);
            return Err(FirmwareError::BadMagic);
        }

        let stored = le32(data, 4);
        let computed = checksum(data);
        if stored != computed {
            error!("firmware checksum mismatch: {:x} != {:x}", stored, computed);
            return Err(FirmwareError::BadChecksum);
        }

        let phy = le32(data, 8);
        if phy != model {
            error!("firmware is for phy {:x}, expected {:x}", phy, model);
            return Err(FirmwareError::BadModel);
        }

        let payload = data.len() - HEADER_LEN;
        for part in 0..PARTS {
            let start = le32(data, 12 + 4 * part) as usize;
            if start > payload {
                error!("firmware part {} starts outside the image", part);
                return Err(FirmwareError::BadPartOffset);
            }
        }

        debug!("firmware loaded, {} bytes, model {:x}", data.len(), model);
        Ok(Self { data, model })
    }

    /// `phy_model` of the image.
    pub fn model(&self) -> u32 {
        self.model
    }

    /// Raw words of `part`, up to the end of the image.
    fn part(&self, part: usize) -> Result<&'a [u8], FirmwareError> {
        if part >= PARTS {
            return Err(FirmwareError::BadPartOffset);
        }
        let start = HEADER_LEN + le32(self.data, 12 + 4 * part) as usize;
        self.data.get(start..).ok_or(FirmwareError::BadPartOffset)
    }

    /// `(register, value)` records of `part`.
    pub fn pairs(&self, part: usize) -> Result<Pairs<'a>, FirmwareError> {
        Ok(Pairs { words: self.part(part)? })
    }

    /// `(port offset, register, value)` records of `part`.
    pub fn triples(&self, part: usize) -> Result<Triples<'a>, FirmwareError> {
        Ok(Triples { words: self.part(part)? })
    }
}

/// Iterator over `(register, value)` records. Ends at a zero register or
/// at the end of the image.
#[derive(Debug, Clone)]
pub struct Pairs<'a> {
    words: &'a [u8],
}

impl Iterator for Pairs<'_> {
    type Item = (u32, u32);

    fn next(&mut self) -> Option<Self::Item> {
        if self.words.len() < 8 {
            return None;
        }
        let reg = le32(self.words, 0);
        if reg == 0 {
            self.words = &[];
            return None;
        }
        let val = le32(self.words, 4);
        self.words = &self.words[8..];
        Some((reg, val))
    }
}

/// `(port offset, register, value)` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Triple {
    /// Offset from the base PHY address.
    pub offset: u32,
    /// Register number.
    pub reg: u32,
    /// Value.
    pub val: u32,
}

/// Iterator over [`Triple`] records. Ends at a zero register or at the end
/// of the image.
#[derive(Debug, Clone)]
pub struct Triples<'a> {
    words: &'a [u8],
}

impl Iterator for Triples<'_> {
    type Item = Triple;

    fn next(&mut self) -> Option<Self::Item> {
        if self.words.len() < 12 {
            return None;
        }
        let t = Triple {
            offset: le32(self.words, 0),
            reg: le32(self.words, 4),
            val: le32(self.words, 8),
        };
        if t.reg == 0 {
            self.words = &[];
            return None;
        }
        self.words = &self.words[12..];
        Some(t)
    }
}

/// Load `name` through `loader` and validate it for `model`.
pub fn request<'a, L: FirmwareLoader>(loader: &'a mut L, name: &str, model: u32) -> Result<Firmware<'a>, FirmwareError> {
    let data = loader.load(name).map_err(|e| {
        error!("firmware {} not available", name);
        e
    })?;
    Firmware::parse(data, model)
}

fn le32(data: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

/// Image checksum: CRC32 of `data` with the checksum word taken as zero.
fn checksum(data: &[u8]) -> u32 {
    let crc = crc32_update(0xFFFF_FFFF, &data[..4]);
    let crc = crc32_update(crc, &[0; 4]);
    !crc32_update(crc, &data[8..])
}

fn crc32_update(mut crc: u32, data: &[u8]) -> u32 {
    const POLYNOMIAL: u32 = 0xEDB88320;

    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLYNOMIAL;
            } else {
                crc >>= 1;
            }
        }
    }

    crc
}
