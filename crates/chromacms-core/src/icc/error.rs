//! ICC container error types

use thiserror::Error;

/// Errors raised while reading or writing the ICC byte container
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IccError {
    /// Profile data is smaller than the structure being read requires
    #[error("profile too small: need {expected} bytes, have {actual}")]
    TooSmall { expected: usize, actual: usize },

    /// Profile file signature is not 'acsp'
    #[error("bad profile signature 0x{0:08X} (expected 'acsp')")]
    BadSignature(u32),

    /// Header claims a larger profile than the buffer holds
    #[error("header size {header_size} exceeds buffer size {actual_size}")]
    SizeMismatch { header_size: u32, actual_size: usize },

    /// A tag table entry points outside the profile
    #[error("tag 0x{tag:08X} out of bounds: offset {offset} + size {size} > {profile_size}")]
    TagOutOfBounds {
        tag: u32,
        offset: u32,
        size: u32,
        profile_size: usize,
    },

    /// Tag payload does not match its declared type
    #[error("malformed '{kind}' tag: {reason}")]
    MalformedTag {
        kind: &'static str,
        reason: &'static str,
    },

    /// Parametric curve function type outside 0..=4
    #[error("unknown parametric curve function type {0}")]
    UnknownCurveType(u16),
}
