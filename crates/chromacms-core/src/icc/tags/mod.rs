//! Codecs for the tag types this crate interprets
//!
//! Every codec works on the *full* raw tag (type signature + reserved bytes
//! + payload) so callers can move raw tags around without re-framing them.
//! Tags whose type the crate does not interpret are carried verbatim by the
//! container.

pub mod curves;
pub mod text;
pub mod xyz;

use super::error::IccError;
use super::types::{S15Fixed16, TypeSignature};

/// Parse an `sf32` tag as a 3x3 row-major matrix (the `chad` tag)
pub fn read_sf32_matrix(raw: &[u8]) -> Result<[[f64; 3]; 3], IccError> {
    if TypeSignature::of(raw) != Some(TypeSignature::SF32) {
        return Err(IccError::MalformedTag {
            kind: "sf32",
            reason: "wrong type signature",
        });
    }
    let payload = raw.get(8..).unwrap_or_default();
    if payload.len() < 36 {
        return Err(IccError::MalformedTag {
            kind: "sf32",
            reason: "payload shorter than nine s15Fixed16 values",
        });
    }

    let mut matrix = [[0.0f64; 3]; 3];
    for (i, cell) in matrix.iter_mut().flatten().enumerate() {
        let at = i * 4;
        *cell = S15Fixed16::from_be_bytes([
            payload[at],
            payload[at + 1],
            payload[at + 2],
            payload[at + 3],
        ])
        .to_f64();
    }
    Ok(matrix)
}

/// Serialize a 3x3 row-major matrix as an `sf32` tag
pub fn write_sf32_matrix(matrix: &[[f64; 3]; 3]) -> Vec<u8> {
    let mut out = Vec::with_capacity(44);
    out.extend_from_slice(&TypeSignature::SF32.0.to_be_bytes());
    out.extend_from_slice(&[0u8; 4]);
    for cell in matrix.iter().flatten() {
        out.extend_from_slice(&S15Fixed16::from_f64(*cell).to_be_bytes());
    }
    out
}

/// Coding-independent code points (ITU-T H.273), carried by the `cicp` tag.
/// The transfer characteristics field is how HDR profiles declare PQ or HLG
/// without a representative tone curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cicp {
    pub color_primaries: u8,
    pub transfer_characteristics: u8,
    pub matrix_coefficients: u8,
    pub full_range: u8,
}

impl Cicp {
    /// SMPTE ST.2084 transfer characteristics code
    pub const TRANSFER_PQ: u8 = 16;
    /// ARIB STD-B67 (HLG) transfer characteristics code
    pub const TRANSFER_HLG: u8 = 18;

    pub fn parse(raw: &[u8]) -> Result<Self, IccError> {
        if TypeSignature::of(raw) != Some(TypeSignature::CICP) {
            return Err(IccError::MalformedTag {
                kind: "cicp",
                reason: "wrong type signature",
            });
        }
        let payload = raw.get(8..12).ok_or(IccError::MalformedTag {
            kind: "cicp",
            reason: "payload shorter than four code points",
        })?;
        Ok(Self {
            color_primaries: payload[0],
            transfer_characteristics: payload[1],
            matrix_coefficients: payload[2],
            full_range: payload[3],
        })
    }

    pub fn write(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(12);
        out.extend_from_slice(&TypeSignature::CICP.0.to_be_bytes());
        out.extend_from_slice(&[0u8; 4]);
        out.extend_from_slice(&[
            self.color_primaries,
            self.transfer_characteristics,
            self.matrix_coefficients,
            self.full_range,
        ]);
        out
    }
}
