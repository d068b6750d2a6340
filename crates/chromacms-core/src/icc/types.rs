//! Primitive ICC number and signature types
//!
//! Layouts follow ICC.1:2022 section 4. Everything on the wire is
//! big-endian; fixed-point conversions round to the nearest representable
//! value so synthesized profiles survive a parse round trip.

use std::fmt;

/// A 4-byte tag signature, e.g. `rXYZ` or `desc`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagSignature(pub u32);

impl TagSignature {
    /// Build a signature from its 4 ASCII characters read big-endian
    pub const fn new(name: &[u8; 4]) -> Self {
        Self(u32::from_be_bytes(*name))
    }

    pub const RED_COLORANT: Self = Self::new(b"rXYZ");
    pub const GREEN_COLORANT: Self = Self::new(b"gXYZ");
    pub const BLUE_COLORANT: Self = Self::new(b"bXYZ");
    pub const MEDIA_WHITE: Self = Self::new(b"wtpt");
    pub const CHAD: Self = Self::new(b"chad");
    pub const LUMINANCE: Self = Self::new(b"lumi");
    pub const DESC: Self = Self::new(b"desc");
    pub const COPYRIGHT: Self = Self::new(b"cprt");
    pub const RED_TRC: Self = Self::new(b"rTRC");
    pub const GREEN_TRC: Self = Self::new(b"gTRC");
    pub const BLUE_TRC: Self = Self::new(b"bTRC");
    pub const A2B0: Self = Self::new(b"A2B0");
    pub const CICP: Self = Self::new(b"cicp");
}

impl fmt::Display for TagSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0.to_be_bytes() {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02X}")?;
            }
        }
        Ok(())
    }
}

/// A 4-byte tag *type* signature, e.g. `curv` or `mluc`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeSignature(pub u32);

impl TypeSignature {
    pub const fn new(name: &[u8; 4]) -> Self {
        Self(u32::from_be_bytes(*name))
    }

    pub const XYZ: Self = Self::new(b"XYZ ");
    pub const CURVE: Self = Self::new(b"curv");
    pub const PARA: Self = Self::new(b"para");
    pub const TEXT: Self = Self::new(b"text");
    pub const DESC: Self = Self::new(b"desc");
    pub const MLUC: Self = Self::new(b"mluc");
    pub const SF32: Self = Self::new(b"sf32");
    pub const CICP: Self = Self::new(b"cicp");
    pub const LUT_A2B: Self = Self::new(b"mAB ");

    /// Read the type signature off the front of a raw tag
    pub fn of(tag_data: &[u8]) -> Option<Self> {
        let head = tag_data.get(..4)?;
        Some(Self(u32::from_be_bytes([head[0], head[1], head[2], head[3]])))
    }
}

/// s15Fixed16Number: signed 16.16 fixed point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct S15Fixed16(pub i32);

impl S15Fixed16 {
    pub const ONE: Self = Self(0x0001_0000);

    pub fn from_f64(val: f64) -> Self {
        Self((val * 65536.0).round() as i32)
    }

    pub fn to_f64(self) -> f64 {
        f64::from(self.0) / 65536.0
    }

    pub fn from_be_bytes(bytes: [u8; 4]) -> Self {
        Self(i32::from_be_bytes(bytes))
    }

    pub fn to_be_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

/// u8Fixed8Number: unsigned 8.8 fixed point (the `curv` single-gamma encoding)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct U8Fixed8(pub u16);

impl U8Fixed8 {
    pub fn from_f64(val: f64) -> Self {
        Self((val * 256.0).round().clamp(0.0, 65535.0) as u16)
    }

    pub fn to_f64(self) -> f64 {
        f64::from(self.0) / 256.0
    }
}

/// XYZNumber: three s15Fixed16 components
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct XyzNumber {
    pub x: S15Fixed16,
    pub y: S15Fixed16,
    pub z: S15Fixed16,
}

impl XyzNumber {
    /// PCS illuminant D50 as encoded by ICC (0x F6D6 / 1 0000 / D32D)
    pub const D50: Self = Self {
        x: S15Fixed16(0x0000_F6D6),
        y: S15Fixed16(0x0001_0000),
        z: S15Fixed16(0x0000_D32D),
    };

    pub fn from_f64(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: S15Fixed16::from_f64(x),
            y: S15Fixed16::from_f64(y),
            z: S15Fixed16::from_f64(z),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 12 {
            return None;
        }
        Some(Self {
            x: S15Fixed16::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            y: S15Fixed16::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            z: S15Fixed16::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
        })
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.x.to_be_bytes());
        out.extend_from_slice(&self.y.to_be_bytes());
        out.extend_from_slice(&self.z.to_be_bytes());
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x.to_f64(), self.y.to_f64(), self.z.to_f64()]
    }
}

/// dateTimeNumber: six big-endian u16 fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateTimeNumber {
    pub year: u16,
    pub month: u16,
    pub day: u16,
    pub hour: u16,
    pub minute: u16,
    pub second: u16,
}

impl DateTimeNumber {
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 12 {
            return None;
        }
        let field = |i: usize| u16::from_be_bytes([bytes[i], bytes[i + 1]]);
        Some(Self {
            year: field(0),
            month: field(2),
            day: field(4),
            hour: field(6),
            minute: field(8),
            second: field(10),
        })
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        for field in [self.year, self.month, self.day, self.hour, self.minute, self.second] {
            out.extend_from_slice(&field.to_be_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s15fixed16_roundtrip() {
        for val in [0.0, 1.0, 0.5, -1.5, 0.9642, 2.4] {
            let fixed = S15Fixed16::from_f64(val);
            assert!((fixed.to_f64() - val).abs() < 1e-5, "value {val}");
        }
    }

    #[test]
    fn s15fixed16_rounds_to_nearest() {
        // 2.4 is not representable; rounding keeps the error at half an ulp
        let fixed = S15Fixed16::from_f64(2.4);
        assert!((fixed.to_f64() - 2.4).abs() <= 0.5 / 65536.0);
    }

    #[test]
    fn xyz_number_d50() {
        let [x, y, z] = XyzNumber::D50.to_array();
        assert!((x - 0.9642).abs() < 1e-4);
        assert!((y - 1.0).abs() < 1e-9);
        assert!((z - 0.8249).abs() < 1e-4);
    }

    #[test]
    fn xyz_number_bytes_roundtrip() {
        let xyz = XyzNumber::from_f64(0.25, 1.0, -0.75);
        let mut buf = Vec::new();
        xyz.write_to(&mut buf);
        assert_eq!(XyzNumber::from_bytes(&buf), Some(xyz));
    }

    #[test]
    fn signature_display() {
        assert_eq!(TagSignature::RED_COLORANT.to_string(), "rXYZ");
        assert_eq!(TagSignature::new(b"A2B0").to_string(), "A2B0");
    }
}
