//! 3x3 matrices for RGB/XYZ conversions
//!
//! Row-major, f64, column vectors multiplied on the right: `xyz = m * rgb`.
//! The per-pixel kernels downcast to f32 once a transform is prepared.

use crate::profile::Primaries;

/// A 3x3 matrix, row-major
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix3x3 {
    pub m: [[f64; 3]; 3],
}

impl Matrix3x3 {
    #[inline]
    pub const fn new(m: [[f64; 3]; 3]) -> Self {
        Self { m }
    }

    #[inline]
    pub const fn identity() -> Self {
        Self::new([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
    }

    #[inline]
    pub const fn diagonal(d0: f64, d1: f64, d2: f64) -> Self {
        Self::new([[d0, 0.0, 0.0], [0.0, d1, 0.0], [0.0, 0.0, d2]])
    }

    /// `self * v`
    #[inline]
    pub fn mul_vec(&self, v: [f64; 3]) -> [f64; 3] {
        let m = &self.m;
        [
            m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
            m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
            m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
        ]
    }

    /// `self * other`
    pub fn mul(&self, other: &Self) -> Self {
        let mut out = [[0.0f64; 3]; 3];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = self.m[i][0] * other.m[0][j]
                    + self.m[i][1] * other.m[1][j]
                    + self.m[i][2] * other.m[2][j];
            }
        }
        Self::new(out)
    }

    pub fn determinant(&self) -> f64 {
        let m = &self.m;
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// Inverse via the adjugate; None for singular matrices
    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if det.abs() < 1e-12 {
            return None;
        }
        let inv_det = 1.0 / det;
        let m = &self.m;
        Some(Self::new([
            [
                (m[1][1] * m[2][2] - m[1][2] * m[2][1]) * inv_det,
                (m[0][2] * m[2][1] - m[0][1] * m[2][2]) * inv_det,
                (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inv_det,
            ],
            [
                (m[1][2] * m[2][0] - m[1][0] * m[2][2]) * inv_det,
                (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inv_det,
                (m[0][2] * m[1][0] - m[0][0] * m[1][2]) * inv_det,
            ],
            [
                (m[1][0] * m[2][1] - m[1][1] * m[2][0]) * inv_det,
                (m[0][1] * m[2][0] - m[0][0] * m[2][1]) * inv_det,
                (m[0][0] * m[1][1] - m[0][1] * m[1][0]) * inv_det,
            ],
        ]))
    }

    /// Downcast for the f32 pixel kernels
    pub fn to_f32(&self) -> [[f32; 3]; 3] {
        let m = &self.m;
        [
            [m[0][0] as f32, m[0][1] as f32, m[0][2] as f32],
            [m[1][0] as f32, m[1][1] as f32, m[1][2] as f32],
            [m[2][0] as f32, m[2][1] as f32, m[2][2] as f32],
        ]
    }

    pub fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.m
            .iter()
            .flatten()
            .zip(other.m.iter().flatten())
            .all(|(a, b)| (a - b).abs() <= epsilon)
    }
}

impl Default for Matrix3x3 {
    fn default() -> Self {
        Self::identity()
    }
}

/// Derive the RGB -> XYZ matrix from chromaticities, Hoffmann's
/// formulation (docs-hoffmann.de/ciexyz29082000.pdf, section 11.4).
///
/// Returns None when the primaries are collinear (the matrix of their
/// xyz coordinates is singular) or the white y is zero.
pub fn rgb_to_xyz(primaries: &Primaries) -> Option<Matrix3x3> {
    let [xr, yr] = primaries.red;
    let [xg, yg] = primaries.green;
    let [xb, yb] = primaries.blue;
    let [xw, yw] = primaries.white;

    // columns are the xyz coordinates of each primary
    let p = Matrix3x3::new([
        [f64::from(xr), f64::from(xg), f64::from(xb)],
        [f64::from(yr), f64::from(yg), f64::from(yb)],
        [
            f64::from(1.0 - xr - yr),
            f64::from(1.0 - xg - yg),
            f64::from(1.0 - xb - yb),
        ],
    ]);
    let w = [
        f64::from(xw),
        f64::from(yw),
        f64::from(1.0 - xw - yw),
    ];
    if w[1] == 0.0 {
        return None;
    }

    let u = p.inverse()?.mul_vec(w);
    let d = Matrix3x3::diagonal(u[0] / w[1], u[1] / w[1], u[2] / w[1]);
    Some(p.mul(&d))
}
