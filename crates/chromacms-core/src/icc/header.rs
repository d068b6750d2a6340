//! ICC profile header
//!
//! The header is exactly 128 bytes (ICC.1:2022 section 7.2). Fields that
//! this crate never interprets (platform, attributes, creator, ...) are kept
//! as raw big-endian words so serialization is byte-stable.

use super::error::IccError;
use super::types::{DateTimeNumber, XyzNumber};

/// Profile file signature, 'acsp'
pub const PROFILE_SIGNATURE: u32 = 0x6163_7370;

/// Header length; also the minimum size of any profile
pub const HEADER_SIZE: usize = 128;

/// Device class four-char codes this crate cares about
pub mod class {
    pub const DISPLAY: u32 = u32::from_be_bytes(*b"mntr");
    pub const INPUT: u32 = u32::from_be_bytes(*b"scnr");
    pub const OUTPUT: u32 = u32::from_be_bytes(*b"prtr");
}

/// Data color space four-char codes this crate cares about
pub mod space {
    pub const RGB: u32 = u32::from_be_bytes(*b"RGB ");
    pub const XYZ: u32 = u32::from_be_bytes(*b"XYZ ");
    pub const GRAY: u32 = u32::from_be_bytes(*b"GRAY");
}

/// Profile version, stored in its encoded binary-coded-decimal form
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ProfileVersion(pub u32);

impl ProfileVersion {
    /// Version 4.3, what this crate writes for synthesized profiles
    pub const V4_3: Self = Self(0x0430_0000);

    pub fn major(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub fn minor(self) -> u8 {
        ((self.0 >> 20) & 0x0F) as u8
    }

    pub fn is_v4_or_later(self) -> bool {
        self.0 >= 0x0400_0000
    }
}

/// The 128-byte ICC profile header
#[derive(Debug, Clone, PartialEq)]
pub struct IccHeader {
    pub size: u32,
    pub cmm_type: u32,
    pub version: ProfileVersion,
    pub device_class: u32,
    pub color_space: u32,
    pub pcs: u32,
    pub creation_date: DateTimeNumber,
    pub platform: u32,
    pub flags: u32,
    pub manufacturer: u32,
    pub model: u32,
    pub attributes: u64,
    pub rendering_intent: u32,
    pub illuminant: XyzNumber,
    pub creator: u32,
    pub profile_id: [u8; 16],
}

fn be32(data: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

impl IccHeader {
    /// Parse and validate the header from the front of a profile
    pub fn parse(data: &[u8]) -> Result<Self, IccError> {
        if data.len() < HEADER_SIZE {
            return Err(IccError::TooSmall {
                expected: HEADER_SIZE,
                actual: data.len(),
            });
        }

        let signature = be32(data, 36);
        if signature != PROFILE_SIGNATURE {
            return Err(IccError::BadSignature(signature));
        }

        let size = be32(data, 0);
        if size as usize > data.len() {
            return Err(IccError::SizeMismatch {
                header_size: size,
                actual_size: data.len(),
            });
        }

        let mut profile_id = [0u8; 16];
        profile_id.copy_from_slice(&data[84..100]);

        Ok(Self {
            size,
            cmm_type: be32(data, 4),
            version: ProfileVersion(be32(data, 8)),
            device_class: be32(data, 12),
            color_space: be32(data, 16),
            pcs: be32(data, 20),
            creation_date: DateTimeNumber::from_bytes(&data[24..36]).unwrap_or_default(),
            platform: be32(data, 40),
            flags: be32(data, 44),
            manufacturer: be32(data, 48),
            model: be32(data, 52),
            attributes: u64::from_be_bytes([
                data[56], data[57], data[58], data[59], data[60], data[61], data[62], data[63],
            ]),
            rendering_intent: be32(data, 64),
            illuminant: XyzNumber::from_bytes(&data[68..80]).unwrap_or_default(),
            creator: be32(data, 80),
            profile_id,
        })
    }

    /// Serialize to the 128-byte wire form. `size` is written as stored;
    /// the profile writer patches it after the tag data is laid out.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = Vec::with_capacity(HEADER_SIZE);
        out.extend_from_slice(&self.size.to_be_bytes());
        out.extend_from_slice(&self.cmm_type.to_be_bytes());
        out.extend_from_slice(&self.version.0.to_be_bytes());
        out.extend_from_slice(&self.device_class.to_be_bytes());
        out.extend_from_slice(&self.color_space.to_be_bytes());
        out.extend_from_slice(&self.pcs.to_be_bytes());
        self.creation_date.write_to(&mut out);
        out.extend_from_slice(&PROFILE_SIGNATURE.to_be_bytes());
        out.extend_from_slice(&self.platform.to_be_bytes());
        out.extend_from_slice(&self.flags.to_be_bytes());
        out.extend_from_slice(&self.manufacturer.to_be_bytes());
        out.extend_from_slice(&self.model.to_be_bytes());
        out.extend_from_slice(&self.attributes.to_be_bytes());
        out.extend_from_slice(&self.rendering_intent.to_be_bytes());
        self.illuminant.write_to(&mut out);
        out.extend_from_slice(&self.creator.to_be_bytes());
        out.extend_from_slice(&self.profile_id);
        out.resize(HEADER_SIZE, 0);

        let mut fixed = [0u8; HEADER_SIZE];
        fixed.copy_from_slice(&out);
        fixed
    }

    /// A fresh v4.3 display-RGB header with XYZ connection space, as used
    /// for synthesized profiles
    pub fn new_display_rgb() -> Self {
        Self {
            size: 0,
            cmm_type: 0,
            version: ProfileVersion::V4_3,
            device_class: class::DISPLAY,
            color_space: space::RGB,
            pcs: space::XYZ,
            creation_date: DateTimeNumber::default(),
            platform: 0,
            flags: 0,
            manufacturer: 0,
            model: 0,
            attributes: 0,
            rendering_intent: 0,
            illuminant: XyzNumber::D50,
            creator: 0,
            profile_id: [0u8; 16],
        }
    }
}
