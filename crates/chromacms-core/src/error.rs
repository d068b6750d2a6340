//! Error types for the color conversion core

use crate::icc::IccError;
use thiserror::Error;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in core operations.
///
/// Dispatch-matrix and pixel-format misses are not represented here: the
/// format and channel-lane enums are closed, so those classes of bug are
/// unreachable by construction. Depth arguments outside {8, 9..=16, 32}
/// are programming errors and assert.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// ICC byte stream is malformed, truncated or structurally broken
    #[error("profile parse error: {0}")]
    ProfileParse(#[from] IccError),

    /// Profile lacks the tags needed to answer a query (media white point,
    /// or any usable colorant source)
    #[error("profile query error: {0}")]
    ProfileQuery(&'static str),

    /// Profile synthesis was asked for a curve it cannot express
    #[error("cannot synthesize a profile for this curve: {0}")]
    UnsupportedCurve(&'static str),

    /// Chromaticities are degenerate (collinear RGB points or zero white y)
    #[error("degenerate primaries: {0}")]
    Primaries(&'static str),

    /// A pixel buffer is smaller than pixel count and format require
    #[error("buffer too small: need {expected} bytes, have {actual}")]
    BufferSize { expected: usize, actual: usize },

    /// The reference CMM refused a profile or transform
    #[error("reference CMM error: {0}")]
    Cmm(String),
}
