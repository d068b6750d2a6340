//! The transform engine
//!
//! A [`Transform`] pairs a source and destination profile with pixel
//! layouts, prepares itself lazily (matrix composition and transfer
//! selection), and runs a per-pixel kernel over the buffer, sharded across
//! one-shot worker tasks. Profiles the built-in math cannot evaluate are
//! delegated per-slab to the reference CMM.
//!
//! Matrix convention: column vectors multiplied on the right,
//! `dst_rgb = mat_src_to_dst * src_rgb`.

use std::thread;

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::kernels::{self, Geometry, Kernel};
use crate::math::{matrix, transfer, Matrix3x3};
use crate::profile::{profile_matches, Curve, Profile};
use crate::task::Task;

/// Pixel format of a buffer handed to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Raw CIE XYZ triples, always 32-bit float
    Xyz,
    /// Three color channels
    Rgb,
    /// Three color channels plus alpha
    Rgba,
}

impl Format {
    pub fn channels(self) -> usize {
        match self {
            Self::Xyz | Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }

    pub fn has_alpha(self) -> bool {
        self == Self::Rgba
    }

    /// XYZ buffers are always float; RGB/RGBA at depth 32
    pub fn is_float(self, depth: u8) -> bool {
        match self {
            Self::Xyz => true,
            Self::Rgb | Self::Rgba => depth == 32,
        }
    }

    /// Bytes per pixel for this format at the given channel depth
    pub fn pixel_bytes(self, depth: u8) -> usize {
        let channel_bytes = if self.is_float(depth) {
            4
        } else if depth > 8 {
            2
        } else {
            1
        };
        self.channels() * channel_bytes
    }
}

/// Per-direction transfer function of a prepared transform. The
/// destination `Gamma` payload is the already-inverted exponent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transfer {
    /// Identity; XYZ pass-through endpoints
    None,
    Gamma(f32),
    Pq,
    Hlg,
}

impl Transfer {
    /// EOTF direction, code value to linear light
    #[inline]
    pub(crate) fn decode(self, c: f32) -> f32 {
        match self {
            Self::None => c,
            Self::Gamma(g) => c.max(0.0).powf(g),
            Self::Pq => transfer::pq_eotf(c.max(0.0)),
            Self::Hlg => transfer::hlg_eotf(c.max(0.0)),
        }
    }

    /// OETF direction, linear light to code value
    #[inline]
    pub(crate) fn encode(self, c: f32) -> f32 {
        match self {
            Self::None => c,
            Self::Gamma(inv_g) => c.max(0.0).powf(inv_g),
            Self::Pq => transfer::pq_oetf(c.max(0.0)),
            Self::Hlg => transfer::hlg_oetf(c.max(0.0)),
        }
    }
}

/// Channel storage lane, the monomorphization axis of the kernels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lane {
    F32,
    U8,
    U16,
}

impl Lane {
    fn of(format: Format, depth: u8) -> Self {
        if format.is_float(depth) {
            Self::F32
        } else if depth == 8 {
            Self::U8
        } else {
            Self::U16
        }
    }

    fn max_channel(self, depth: u8) -> f32 {
        match self {
            Self::F32 => 1.0,
            Self::U8 => 255.0,
            Self::U16 => ((1u32 << depth) - 1) as f32,
        }
    }
}

type FallbackExecutor = Box<dyn moxcms::TransformExecutor<f32> + Send + Sync>;

/// A prepared conversion between two profiles and two pixel layouts.
///
/// Profiles are borrowed for the life of the transform; `None` stands for
/// raw XYZ on that side. One `run` at a time per transform (enforced by
/// `&mut self`); the referenced profiles must not be mutated concurrently.
pub struct Transform<'a> {
    src_profile: Option<&'a Profile>,
    dst_profile: Option<&'a Profile>,
    src_format: Format,
    src_depth: u8,
    dst_format: Format,
    dst_depth: u8,
    ccmm_allowed: bool,
    prepared: Option<Kernel>,
    fallback: Option<FallbackExecutor>,
}

impl<'a> Transform<'a> {
    /// Create an unprepared transform. Depth must be 8, 9..=16 or 32 per
    /// side; anything else is a programming error.
    pub fn new(
        src_profile: Option<&'a Profile>,
        src_format: Format,
        src_depth: u8,
        dst_profile: Option<&'a Profile>,
        dst_format: Format,
        dst_depth: u8,
    ) -> Self {
        for depth in [src_depth, dst_depth] {
            assert!(
                matches!(depth, 8..=16 | 32),
                "unsupported channel depth {depth}"
            );
        }
        Self {
            src_profile,
            dst_profile,
            src_format,
            src_depth,
            dst_format,
            dst_depth,
            ccmm_allowed: true,
            prepared: None,
            fallback: None,
        }
    }

    /// Force the reference CMM even for natively evaluable profiles
    pub fn set_ccmm_allowed(&mut self, allowed: bool) {
        self.ccmm_allowed = allowed;
    }

    /// Will `run` use the built-in math, or delegate to the reference CMM?
    pub fn uses_ccmm(&self) -> bool {
        self.ccmm_allowed
            && self.src_profile.map_or(true, Profile::uses_ccmm)
            && self.dst_profile.map_or(true, Profile::uses_ccmm)
    }

    pub fn cmm_name(&self) -> &'static str {
        if self.uses_ccmm() {
            "CCMM"
        } else {
            "moxcms"
        }
    }

    /// Derive matrices and transfer functions. Idempotent; `run` calls it
    /// on first use.
    pub fn prepare(&mut self) -> Result<()> {
        if self.prepared.is_some() {
            return Ok(());
        }

        let (src_to_xyz, src_transfer) = derive_endpoint(self.src_profile)?;
        let (dst_to_xyz, dst_transfer) = derive_endpoint(self.dst_profile)?;
        let dst_transfer = match dst_transfer {
            Transfer::Gamma(g) if g != 0.0 => Transfer::Gamma(1.0 / g),
            other => other,
        };

        let xyz_to_dst = dst_to_xyz
            .inverse()
            .ok_or(Error::Primaries("destination RGB->XYZ matrix is singular"))?;
        let mat = xyz_to_dst.mul(&src_to_xyz);

        trace!(?src_transfer, ?dst_transfer, "transform prepared");
        self.prepared = Some(Kernel {
            mat: mat.to_f32(),
            src_transfer,
            dst_transfer,
        });
        Ok(())
    }

    /// Convert `pixel_count` pixels from `src` into `dst`, sharded over
    /// `task_count` worker tasks. The slab split affects parallelism only;
    /// output bytes are identical for every task count.
    pub fn run(
        &mut self,
        task_count: usize,
        src: &[u8],
        dst: &mut [u8],
        pixel_count: usize,
    ) -> Result<()> {
        assert!(task_count >= 1, "task count must be at least 1");

        let src_pixel_bytes = self.src_format.pixel_bytes(self.src_depth);
        let dst_pixel_bytes = self.dst_format.pixel_bytes(self.dst_depth);
        let src_needed = pixel_count * src_pixel_bytes;
        let dst_needed = pixel_count * dst_pixel_bytes;
        if src.len() < src_needed {
            return Err(Error::BufferSize {
                expected: src_needed,
                actual: src.len(),
            });
        }
        if dst.len() < dst_needed {
            return Err(Error::BufferSize {
                expected: dst_needed,
                actual: dst.len(),
            });
        }
        if pixel_count == 0 {
            return Ok(());
        }

        let src_lane = Lane::of(self.src_format, self.src_depth);
        let dst_lane = Lane::of(self.dst_format, self.dst_depth);
        let geo = Geometry {
            src_pixel_bytes,
            dst_pixel_bytes,
            src_has_alpha: self.src_format.has_alpha(),
            dst_has_alpha: self.dst_format.has_alpha(),
            src_max: src_lane.max_channel(self.src_depth),
            dst_max: dst_lane.max_channel(self.dst_depth),
        };

        if self.uses_ccmm() {
            self.prepare()?;
            let kernel = self.prepared.expect("prepare() just ran");
            let reformat_only = profile_matches(self.src_profile, self.dst_profile);
            run_sharded(task_count, src, dst, &geo, pixel_count, |s, d, n| {
                dispatch(&kernel, reformat_only, src_lane, dst_lane, &geo, s, d, n);
            });
        } else {
            self.ensure_fallback()?;
            let executor = self.fallback.as_deref().expect("fallback just built");
            run_sharded(task_count, src, dst, &geo, pixel_count, |s, d, n| {
                fallback_slab(executor, src_lane, dst_lane, &geo, s, d, n);
            });
        }
        Ok(())
    }

    /// Lazily build the reference-CMM executor for profiles the built-in
    /// math cannot evaluate. Absent endpoints are stood in for by the XYZ
    /// pass-through profile.
    fn ensure_fallback(&mut self) -> Result<()> {
        if self.fallback.is_some() {
            return Ok(());
        }
        trace!("building reference CMM transform");

        let pack_endpoint = |profile: Option<&Profile>| match profile {
            Some(p) => p.pack(),
            None => Profile::create_xyz_passthrough().pack(),
        };
        let src = moxcms::ColorProfile::new_from_slice(&pack_endpoint(self.src_profile))
            .map_err(|e| Error::Cmm(format!("source profile: {e:?}")))?;
        let dst = moxcms::ColorProfile::new_from_slice(&pack_endpoint(self.dst_profile))
            .map_err(|e| Error::Cmm(format!("destination profile: {e:?}")))?;

        let options = moxcms::TransformOptions {
            rendering_intent: moxcms::RenderingIntent::AbsoluteColorimetric,
            ..Default::default()
        };
        let executor = src
            .create_transform_f32(moxcms::Layout::Rgba, &dst, moxcms::Layout::Rgba, options)
            .map_err(|e| Error::Cmm(format!("transform: {e:?}")))?;
        self.fallback = Some(executor);
        Ok(())
    }
}

/// Matrix and transfer function of one endpoint. An absent profile is the
/// XYZ pass-through: identity matrix, identity transfer.
fn derive_endpoint(profile: Option<&Profile>) -> Result<(Matrix3x3, Transfer)> {
    let Some(profile) = profile else {
        return Ok((Matrix3x3::identity(), Transfer::None));
    };

    let info = profile.query()?;
    let transfer = match info.curve {
        Curve::Pq => Transfer::Pq,
        Curve::Hlg => Transfer::Hlg,
        Curve::Gamma(g) => Transfer::Gamma(g),
        // only reachable when the caller prepares a fallback-bound
        // transform by hand; use the estimate so the math stays sane
        Curve::Complex { estimated_gamma, .. } => {
            Transfer::Gamma(estimated_gamma.filter(|g| *g > 0.0).unwrap_or(1.0))
        }
        Curve::Unknown => Transfer::Gamma(1.0),
    };
    let to_xyz = matrix::rgb_to_xyz(&info.primaries)
        .ok_or(Error::Primaries("collinear profile primaries"))?;
    Ok((to_xyz, transfer))
}

/// Pick the kernel monomorphization for a (source lane, destination lane)
/// pair and run it over one slab.
fn dispatch(
    kernel: &Kernel,
    reformat_only: bool,
    src_lane: Lane,
    dst_lane: Lane,
    geo: &Geometry,
    src: &[u8],
    dst: &mut [u8],
    pixel_count: usize,
) {
    fn go<S: kernels::Channel, D: kernels::Channel>(
        kernel: &Kernel,
        reformat_only: bool,
        geo: &Geometry,
        src: &[u8],
        dst: &mut [u8],
        pixel_count: usize,
    ) {
        if reformat_only {
            kernels::reformat_slab::<S, D>(geo, src, dst, pixel_count);
        } else {
            kernels::transform_slab::<S, D>(kernel, geo, src, dst, pixel_count);
        }
    }

    match (src_lane, dst_lane) {
        (Lane::F32, Lane::F32) => go::<f32, f32>(kernel, reformat_only, geo, src, dst, pixel_count),
        (Lane::F32, Lane::U8) => go::<f32, u8>(kernel, reformat_only, geo, src, dst, pixel_count),
        (Lane::F32, Lane::U16) => go::<f32, u16>(kernel, reformat_only, geo, src, dst, pixel_count),
        (Lane::U8, Lane::F32) => go::<u8, f32>(kernel, reformat_only, geo, src, dst, pixel_count),
        (Lane::U8, Lane::U8) => go::<u8, u8>(kernel, reformat_only, geo, src, dst, pixel_count),
        (Lane::U8, Lane::U16) => go::<u8, u16>(kernel, reformat_only, geo, src, dst, pixel_count),
        (Lane::U16, Lane::F32) => go::<u16, f32>(kernel, reformat_only, geo, src, dst, pixel_count),
        (Lane::U16, Lane::U8) => go::<u16, u8>(kernel, reformat_only, geo, src, dst, pixel_count),
        (Lane::U16, Lane::U16) => go::<u16, u16>(kernel, reformat_only, geo, src, dst, pixel_count),
    }
}

/// Delegate one slab to the reference CMM: decode to RGBA f32, transform,
/// encode back to the destination layout.
fn fallback_slab(
    executor: &(dyn moxcms::TransformExecutor<f32> + Send + Sync),
    src_lane: Lane,
    dst_lane: Lane,
    geo: &Geometry,
    src: &[u8],
    dst: &mut [u8],
    pixel_count: usize,
) {
    let mut staged = vec![0.0f32; pixel_count * 4];
    match src_lane {
        Lane::F32 => kernels::decode_to_rgba_f32::<f32>(geo, src, &mut staged, pixel_count),
        Lane::U8 => kernels::decode_to_rgba_f32::<u8>(geo, src, &mut staged, pixel_count),
        Lane::U16 => kernels::decode_to_rgba_f32::<u16>(geo, src, &mut staged, pixel_count),
    }

    let mut converted = vec![0.0f32; pixel_count * 4];
    if let Err(err) = executor.transform(&staged, &mut converted) {
        // slab sizes are validated before sharding; a failure here is a bug
        panic!("reference CMM transform failed: {err:?}");
    }

    match dst_lane {
        Lane::F32 => kernels::encode_from_rgba_f32::<f32>(geo, &converted, dst, pixel_count),
        Lane::U8 => kernels::encode_from_rgba_f32::<u8>(geo, &converted, dst, pixel_count),
        Lane::U16 => kernels::encode_from_rgba_f32::<u16>(geo, &converted, dst, pixel_count),
    }
}

/// Split the pixel range into contiguous slabs and run `work` over each on
/// its own task; a single task runs inline. The first `task_count - 1`
/// slabs hold `pixel_count / task_count` pixels, the last takes the rest.
fn run_sharded<F>(
    task_count: usize,
    src: &[u8],
    dst: &mut [u8],
    geo: &Geometry,
    pixel_count: usize,
    work: F,
) where
    F: Fn(&[u8], &mut [u8], usize) + Sync,
{
    let task_count = task_count.min(pixel_count);
    let src = &src[..pixel_count * geo.src_pixel_bytes];
    let dst = &mut dst[..pixel_count * geo.dst_pixel_bytes];

    if task_count <= 1 {
        work(src, dst, pixel_count);
        return;
    }

    debug!(tasks = task_count, pixels = pixel_count, "sharding pixel transform");
    let per_task = pixel_count / task_count;

    thread::scope(|scope| {
        let work = &work;
        let mut tasks = Vec::with_capacity(task_count);
        let mut src_rest = src;
        let mut dst_rest = dst;
        for i in 0..task_count {
            let slab = if i == task_count - 1 {
                pixel_count - per_task * (task_count - 1)
            } else {
                per_task
            };
            let (s, s_rest) = src_rest.split_at(slab * geo.src_pixel_bytes);
            let (d, d_rest) = std::mem::take(&mut dst_rest).split_at_mut(slab * geo.dst_pixel_bytes);
            src_rest = s_rest;
            dst_rest = d_rest;
            tasks.push(Task::spawn(scope, move || work(s, d, slab)));
        }
        for task in tasks {
            task.join();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_bytes_table() {
        assert_eq!(Format::Xyz.pixel_bytes(32), 12);
        assert_eq!(Format::Rgb.pixel_bytes(8), 3);
        assert_eq!(Format::Rgb.pixel_bytes(10), 6);
        assert_eq!(Format::Rgb.pixel_bytes(16), 6);
        assert_eq!(Format::Rgb.pixel_bytes(32), 12);
        assert_eq!(Format::Rgba.pixel_bytes(8), 4);
        assert_eq!(Format::Rgba.pixel_bytes(12), 8);
        assert_eq!(Format::Rgba.pixel_bytes(32), 16);
    }

    #[test]
    fn float_detection() {
        assert!(Format::Xyz.is_float(8));
        assert!(Format::Rgb.is_float(32));
        assert!(!Format::Rgb.is_float(16));
        assert!(!Format::Rgba.is_float(8));
    }

    #[test]
    #[should_panic(expected = "unsupported channel depth")]
    fn bad_depth_asserts() {
        let _ = Transform::new(None, Format::Rgb, 7, None, Format::Rgb, 8);
    }

    #[test]
    fn prepare_is_idempotent() {
        let srgb = Profile::create_stock_srgb();
        let mut transform = Transform::new(
            Some(&srgb),
            Format::Rgb,
            8,
            Some(&srgb),
            Format::Rgb,
            8,
        );
        transform.prepare().unwrap();
        let first = transform.prepared.expect("prepared").mat;
        transform.prepare().unwrap();
        assert_eq!(first, transform.prepared.expect("still prepared").mat);
    }

    #[test]
    fn same_profile_composes_to_identity() {
        let srgb = Profile::create_stock_srgb();
        let mut transform = Transform::new(
            Some(&srgb),
            Format::Rgb,
            32,
            Some(&srgb),
            Format::Rgb,
            32,
        );
        transform.prepare().unwrap();
        let mat = transform.prepared.expect("prepared").mat;
        for (i, row) in mat.iter().enumerate() {
            for (j, cell) in row.iter().enumerate() {
                let want = if i == j { 1.0 } else { 0.0 };
                assert!((cell - want).abs() < 1e-4, "mat[{i}][{j}] = {cell}");
            }
        }
    }

    #[test]
    fn destination_gamma_is_inverted() {
        let srgb = Profile::create_stock_srgb();
        let mut transform =
            Transform::new(None, Format::Xyz, 32, Some(&srgb), Format::Rgb, 32);
        transform.prepare().unwrap();
        match transform.prepared.expect("prepared").dst_transfer {
            Transfer::Gamma(inv) => assert!((inv - 1.0 / 2.4).abs() < 1e-4),
            other => panic!("expected inverted gamma, got {other:?}"),
        }
    }

    #[test]
    fn lane_maxima() {
        assert_eq!(Lane::U8.max_channel(8), 255.0);
        assert_eq!(Lane::U16.max_channel(10), 1023.0);
        assert_eq!(Lane::U16.max_channel(16), 65535.0);
        assert_eq!(Lane::F32.max_channel(32), 1.0);
    }

    #[test]
    fn run_rejects_short_buffers() {
        let srgb = Profile::create_stock_srgb();
        let mut transform = Transform::new(
            Some(&srgb),
            Format::Rgb,
            8,
            Some(&srgb),
            Format::Rgb,
            8,
        );
        let src = [0u8; 10];
        let mut dst = [0u8; 12];
        assert!(matches!(
            transform.run(1, &src, &mut dst, 4),
            Err(Error::BufferSize { expected: 12, .. })
        ));
    }

    #[test]
    fn cmm_selection_honors_the_switch() {
        let srgb = Profile::create_stock_srgb();
        let mut transform = Transform::new(
            Some(&srgb),
            Format::Rgb,
            8,
            Some(&srgb),
            Format::Rgb,
            8,
        );
        assert!(transform.uses_ccmm());
        assert_eq!(transform.cmm_name(), "CCMM");
        transform.set_ccmm_allowed(false);
        assert!(!transform.uses_ccmm());
        assert_eq!(transform.cmm_name(), "moxcms");
    }
}
