//! Bradford chromatic adaptation
//!
//! Used when synthesizing profiles: colorants are stored relative to the
//! PCS illuminant (D50), so the native white point must be adapted. Bradford
//! is the ICC default method (ICC.1:2022 Annex E).

use super::matrix::Matrix3x3;

/// Bradford XYZ -> cone response
const BRADFORD: Matrix3x3 = Matrix3x3::new([
    [0.8951, 0.2664, -0.1614],
    [-0.7502, 1.7135, 0.0367],
    [0.0389, -0.0685, 1.0296],
]);

/// Compute the matrix adapting colors from `src_white` to `dst_white`,
/// both given as XYZ columns: `xyz_dst = m * xyz_src`.
pub fn adaptation_matrix(src_white: [f64; 3], dst_white: [f64; 3]) -> Matrix3x3 {
    let bradford_inv = BRADFORD
        .inverse()
        .expect("Bradford matrix is invertible by construction");

    let src_lms = BRADFORD.mul_vec(src_white);
    let dst_lms = BRADFORD.mul_vec(dst_white);

    let ratio = |d: f64, s: f64| if s.abs() > 1e-10 { d / s } else { 1.0 };
    let scale = Matrix3x3::diagonal(
        ratio(dst_lms[0], src_lms[0]),
        ratio(dst_lms[1], src_lms[1]),
        ratio(dst_lms[2], src_lms[2]),
    );

    bradford_inv.mul(&scale.mul(&BRADFORD))
}
