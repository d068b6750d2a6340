//! # chromacms-core
//!
//! The color conversion core of an image-processing pipeline: translate
//! pixel buffers between ICC-described RGB encodings and raw CIE XYZ,
//! across 8-bit, 9..16-bit and 32-bit float channel layouts, in parallel.
//!
//! ## What it does
//!
//! - **Profiles**: parse and serialize ICC bytes, query the primaries /
//!   tone curve / peak luminance triplet, synthesize display profiles from
//!   those primitives ([`Profile`]).
//! - **Transforms**: derive the 3x3 RGB matrices from chromaticities,
//!   apply gamma, SMPTE ST.2084 (PQ) or Hybrid Log-Gamma transfer
//!   functions, rescale channel depths, and shard the pixel range across
//!   worker threads ([`Transform`]).
//! - **Fallback**: profiles with tone curves the built-in math cannot
//!   reduce (LUTs, multi-segment parametrics) are delegated to the
//!   reference CMM (moxcms), absolute colorimetric intent.
//!
//! Conversion is absolute colorimetric only: no gamut mapping, no black
//! point compensation, no perceptual intents.
//!
//! ## Quick start
//!
//! ```
//! use chromacms_core::{Format, Profile, Transform};
//!
//! let srgb = Profile::create_stock_srgb();
//! let linear = srgb.create_linear()?;
//!
//! let mut transform = Transform::new(
//!     Some(&srgb), Format::Rgba, 8,
//!     Some(&linear), Format::Rgba, 8,
//! );
//!
//! let src = [255u8, 128, 64, 255];
//! let mut dst = [0u8; 4];
//! transform.run(1, &src, &mut dst, 1)?;
//! # Ok::<(), chromacms_core::Error>(())
//! ```

pub mod icc;
pub mod math;
pub mod profile;
pub mod task;
pub mod transform;

mod error;
mod kernels;

pub use error::{Error, Result};
pub use profile::{
    generate_description, profile_matches, Curve, Primaries, Profile, ProfileInfo,
    LUMINANCE_UNSPECIFIED,
};
pub use transform::{Format, Transfer, Transform};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
