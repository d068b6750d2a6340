//! Per-pixel conversion kernels
//!
//! One transform kernel and one reformat kernel, generic over the source
//! and destination channel representations and monomorphized once per
//! (source, destination) pair. The engine picks the instantiation from the
//! runtime depth/format pair; alpha presence is a runtime flag since it
//! only adds one branch per pixel.
//!
//! Kernels are pure per-pixel functions of their input, so splitting a
//! buffer into slabs cannot change the output.

use num_traits::AsPrimitive;

use crate::transform::Transfer;

/// The prepared math of a transform: composed src->dst matrix plus the
/// transfer function on each side.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Kernel {
    pub mat: [[f32; 3]; 3],
    pub src_transfer: Transfer,
    pub dst_transfer: Transfer,
}

/// Byte strides and channel scales of one (src, dst) buffer pair
#[derive(Debug, Clone, Copy)]
pub(crate) struct Geometry {
    pub src_pixel_bytes: usize,
    pub dst_pixel_bytes: usize,
    pub src_has_alpha: bool,
    pub dst_has_alpha: bool,
    /// Maximum channel code value; 1.0 for float lanes
    pub src_max: f32,
    pub dst_max: f32,
}

/// A storable channel representation: u8, u16 or f32 in native byte order
pub(crate) trait Channel: Copy + Send + Sync + AsPrimitive<f32> + 'static {
    const BYTES: usize;

    fn load(bytes: &[u8]) -> Self;
    fn store(self, bytes: &mut [u8]);

    /// Scaled value -> code value. Integer lanes round half away from
    /// zero and saturate on the cast; the float lane stores as-is.
    fn quantize(v: f32) -> Self;
}

impl Channel for u8 {
    const BYTES: usize = 1;

    #[inline]
    fn load(bytes: &[u8]) -> Self {
        bytes[0]
    }

    #[inline]
    fn store(self, bytes: &mut [u8]) {
        bytes[0] = self;
    }

    #[inline]
    fn quantize(v: f32) -> Self {
        v.round() as u8
    }
}

impl Channel for u16 {
    const BYTES: usize = 2;

    #[inline]
    fn load(bytes: &[u8]) -> Self {
        u16::from_ne_bytes([bytes[0], bytes[1]])
    }

    #[inline]
    fn store(self, bytes: &mut [u8]) {
        bytes[..2].copy_from_slice(&self.to_ne_bytes());
    }

    #[inline]
    fn quantize(v: f32) -> Self {
        v.round() as u16
    }
}

impl Channel for f32 {
    const BYTES: usize = 4;

    #[inline]
    fn load(bytes: &[u8]) -> Self {
        f32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    #[inline]
    fn store(self, bytes: &mut [u8]) {
        bytes[..4].copy_from_slice(&self.to_ne_bytes());
    }

    #[inline]
    fn quantize(v: f32) -> Self {
        v
    }
}

#[inline]
fn load_channel<C: Channel>(pixel: &[u8], ch: usize) -> f32 {
    C::load(&pixel[ch * C::BYTES..]).as_()
}

#[inline]
fn store_channel<C: Channel>(pixel: &mut [u8], ch: usize, v: f32) {
    C::quantize(v).store(&mut pixel[ch * C::BYTES..]);
}

#[inline]
fn mat_mul(m: &[[f32; 3]; 3], v: [f32; 3]) -> [f32; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

/// Full conversion: decode, source EOTF, matrix, destination OETF, encode.
/// Alpha bypasses the color math (rescaled, or fabricated at full opacity).
pub(crate) fn transform_slab<S: Channel, D: Channel>(
    kernel: &Kernel,
    geo: &Geometry,
    src: &[u8],
    dst: &mut [u8],
    pixel_count: usize,
) {
    let src_norm = 1.0 / geo.src_max;
    for i in 0..pixel_count {
        let sp = &src[i * geo.src_pixel_bytes..];
        let dp = &mut dst[i * geo.dst_pixel_bytes..];

        let linear = [
            kernel.src_transfer.decode(load_channel::<S>(sp, 0) * src_norm),
            kernel.src_transfer.decode(load_channel::<S>(sp, 1) * src_norm),
            kernel.src_transfer.decode(load_channel::<S>(sp, 2) * src_norm),
        ];
        let out = mat_mul(&kernel.mat, linear);
        store_channel::<D>(dp, 0, kernel.dst_transfer.encode(out[0]) * geo.dst_max);
        store_channel::<D>(dp, 1, kernel.dst_transfer.encode(out[1]) * geo.dst_max);
        store_channel::<D>(dp, 2, kernel.dst_transfer.encode(out[2]) * geo.dst_max);

        if geo.dst_has_alpha {
            let alpha = if geo.src_has_alpha {
                load_channel::<S>(sp, 3) * src_norm
            } else {
                1.0
            };
            store_channel::<D>(dp, 3, alpha * geo.dst_max);
        }
    }
}

/// Format conversion only: rescale channel codes, no color math
pub(crate) fn reformat_slab<S: Channel, D: Channel>(
    geo: &Geometry,
    src: &[u8],
    dst: &mut [u8],
    pixel_count: usize,
) {
    let rescale = geo.dst_max / geo.src_max;
    for i in 0..pixel_count {
        let sp = &src[i * geo.src_pixel_bytes..];
        let dp = &mut dst[i * geo.dst_pixel_bytes..];

        store_channel::<D>(dp, 0, load_channel::<S>(sp, 0) * rescale);
        store_channel::<D>(dp, 1, load_channel::<S>(sp, 1) * rescale);
        store_channel::<D>(dp, 2, load_channel::<S>(sp, 2) * rescale);

        if geo.dst_has_alpha {
            if geo.src_has_alpha {
                store_channel::<D>(dp, 3, load_channel::<S>(sp, 3) * rescale);
            } else {
                store_channel::<D>(dp, 3, geo.dst_max);
            }
        }
    }
}

/// Decode a slab into the RGBA f32 staging layout the reference CMM
/// consumes; missing alpha is fabricated at full opacity.
pub(crate) fn decode_to_rgba_f32<S: Channel>(
    geo: &Geometry,
    src: &[u8],
    out: &mut [f32],
    pixel_count: usize,
) {
    let src_norm = 1.0 / geo.src_max;
    for i in 0..pixel_count {
        let sp = &src[i * geo.src_pixel_bytes..];
        let op = &mut out[i * 4..i * 4 + 4];
        op[0] = load_channel::<S>(sp, 0) * src_norm;
        op[1] = load_channel::<S>(sp, 1) * src_norm;
        op[2] = load_channel::<S>(sp, 2) * src_norm;
        op[3] = if geo.src_has_alpha {
            load_channel::<S>(sp, 3) * src_norm
        } else {
            1.0
        };
    }
}

/// Encode the RGBA f32 staging layout back into the destination slab
pub(crate) fn encode_from_rgba_f32<D: Channel>(
    geo: &Geometry,
    staged: &[f32],
    dst: &mut [u8],
    pixel_count: usize,
) {
    for i in 0..pixel_count {
        let ip = &staged[i * 4..i * 4 + 4];
        let dp = &mut dst[i * geo.dst_pixel_bytes..];
        store_channel::<D>(dp, 0, ip[0] * geo.dst_max);
        store_channel::<D>(dp, 1, ip[1] * geo.dst_max);
        store_channel::<D>(dp, 2, ip[2] * geo.dst_max);
        if geo.dst_has_alpha {
            store_channel::<D>(dp, 3, ip[3] * geo.dst_max);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(spb: usize, dpb: usize, src_max: f32, dst_max: f32) -> Geometry {
        Geometry {
            src_pixel_bytes: spb,
            dst_pixel_bytes: dpb,
            src_has_alpha: false,
            dst_has_alpha: false,
            src_max,
            dst_max,
        }
    }

    #[test]
    fn quantize_rounds_half_away_from_zero() {
        assert_eq!(u8::quantize(127.5), 128);
        assert_eq!(u8::quantize(127.4), 127);
        assert_eq!(u16::quantize(513.5), 514);
    }

    #[test]
    fn quantize_saturates() {
        assert_eq!(u8::quantize(300.0), 255);
        assert_eq!(u8::quantize(-5.0), 0);
        assert_eq!(u16::quantize(70_000.0), 65_535);
    }

    #[test]
    fn reformat_u8_identity_is_exact() {
        let geo = geometry(3, 3, 255.0, 255.0);
        let src: Vec<u8> = (0..=255).flat_map(|v| [v, v, v]).collect();
        let mut dst = vec![0u8; src.len()];
        reformat_slab::<u8, u8>(&geo, &src, &mut dst, 256);
        assert_eq!(src, dst);
    }

    #[test]
    fn reformat_widens_8_to_10_bits() {
        let geo = geometry(3, 6, 255.0, 1023.0);
        let src = [128u8, 0, 255];
        let mut dst = vec![0u8; 6];
        reformat_slab::<u8, u16>(&geo, &src, &mut dst, 1);

        let out = u16::from_ne_bytes([dst[0], dst[1]]);
        let expected = (128.0f32 * 1023.0 / 255.0).round() as u16;
        assert_eq!(out, expected);
        assert_eq!(u16::from_ne_bytes([dst[2], dst[3]]), 0);
        assert_eq!(u16::from_ne_bytes([dst[4], dst[5]]), 1023);
    }

    #[test]
    fn reformat_fabricates_opaque_alpha() {
        let geo = Geometry {
            src_pixel_bytes: 3,
            dst_pixel_bytes: 4,
            src_has_alpha: false,
            dst_has_alpha: true,
            src_max: 255.0,
            dst_max: 255.0,
        };
        let src = [10u8, 20, 30];
        let mut dst = [0u8; 4];
        reformat_slab::<u8, u8>(&geo, &src, &mut dst, 1);
        assert_eq!(dst, [10, 20, 30, 255]);
    }

    #[test]
    fn transform_identity_kernel_is_rescale() {
        let kernel = Kernel {
            mat: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            src_transfer: Transfer::None,
            dst_transfer: Transfer::None,
        };
        let geo = geometry(3, 3, 255.0, 255.0);
        let src = [0u8, 128, 255];
        let mut dst = [0u8; 3];
        transform_slab::<u8, u8>(&kernel, &geo, &src, &mut dst, 1);
        assert_eq!(dst, src);
    }

    #[test]
    fn staging_roundtrip_preserves_rgba() {
        let geo = Geometry {
            src_pixel_bytes: 4,
            dst_pixel_bytes: 4,
            src_has_alpha: true,
            dst_has_alpha: true,
            src_max: 255.0,
            dst_max: 255.0,
        };
        let src = [12u8, 99, 200, 40];
        let mut staged = [0.0f32; 4];
        decode_to_rgba_f32::<u8>(&geo, &src, &mut staged, 1);
        assert!((staged[3] - 40.0 / 255.0).abs() < 1e-6);

        let mut dst = [0u8; 4];
        encode_from_rgba_f32::<u8>(&geo, &staged, &mut dst, 1);
        assert_eq!(dst, src);
    }
}
