//! `XYZ ` tag type: one or more XYZNumbers
//!
//! Used for the colorant tags, media white point and luminance.
//! ICC.1:2022 section 10.31.

use crate::icc::error::IccError;
use crate::icc::types::{TypeSignature, XyzNumber};

/// Read the first XYZNumber of an `XYZ ` tag. `raw` is the full tag,
/// type signature included.
pub fn read(raw: &[u8]) -> Result<XyzNumber, IccError> {
    if TypeSignature::of(raw) != Some(TypeSignature::XYZ) {
        return Err(IccError::MalformedTag {
            kind: "XYZ",
            reason: "wrong type signature",
        });
    }
    XyzNumber::from_bytes(raw.get(8..).unwrap_or_default()).ok_or(IccError::MalformedTag {
        kind: "XYZ",
        reason: "payload shorter than one XYZNumber",
    })
}

/// Serialize a single-value `XYZ ` tag
pub fn write(value: XyzNumber) -> Vec<u8> {
    let mut out = Vec::with_capacity(20);
    out.extend_from_slice(&TypeSignature::XYZ.0.to_be_bytes());
    out.extend_from_slice(&[0u8; 4]);
    value.write_to(&mut out);
    out
}
