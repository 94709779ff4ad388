use crate::{error::GeometryError, homography::Homography};

/// Determinants at or below this magnitude are treated as singular.
pub const SINGULAR_EPS: f64 = 1e-12;

/// Determinant of a row-major 3x3 matrix.
#[rustfmt::skip]
pub fn determinant3x3(m: &[f64; 9]) -> f64 {
    m[0] * (m[4] * m[8] - m[5] * m[7]) -
    m[1] * (m[3] * m[8] - m[5] * m[6]) +
    m[2] * (m[3] * m[7] - m[4] * m[6])
}

/// Adjugate (transposed cofactor matrix) of a row-major 3x3 matrix.
#[rustfmt::skip]
pub fn adjugate3x3(m: &[f64; 9]) -> [f64; 9] {
    [
        m[4] * m[8] - m[5] * m[7],  // [0, 0]
        m[2] * m[7] - m[1] * m[8],  // [0, 1]
        m[1] * m[5] - m[2] * m[4],  // [0, 2]
        m[5] * m[6] - m[3] * m[8],  // [1, 0]
        m[0] * m[8] - m[2] * m[6],  // [1, 1]
        m[2] * m[3] - m[0] * m[5],  // [1, 2]
        m[3] * m[7] - m[4] * m[6],  // [2, 0]
        m[1] * m[6] - m[0] * m[7],  // [2, 1]
        m[0] * m[4] - m[1] * m[3],  // [2, 2]
    ]
}

/// Product of two row-major 3x3 matrices.
pub fn mat33_mul(a: &[f64; 9], b: &[f64; 9]) -> [f64; 9] {
    let mut out = [0.0; 9];
    for i in 0..3 {
        for j in 0..3 {
            out[i * 3 + j] = (0..3).map(|k| a[i * 3 + k] * b[k * 3 + j]).sum();
        }
    }
    out
}

/// Invert a 3x3 matrix using its cofactor expansion.
///
/// The result is not renormalized, so `invert3x3(invert3x3(m))` reproduces
/// `m` entry by entry.
///
/// # Errors
///
/// Returns [`GeometryError::SingularMatrix`] if `|det(m)| <= 1e-12`.
///
/// # Example
///
/// ```
/// use woundlens_geometry::{invert3x3, Homography};
///
/// let shift = Homography::from_row_major([1.0, 0.0, -1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0]);
/// let inv = invert3x3(&shift).unwrap();
///
/// assert_eq!(inv.as_array(), &[1.0, 0.0, 1.0, 0.0, 1.0, -1.0, 0.0, 0.0, 1.0]);
/// ```
pub fn invert3x3(m: &Homography) -> Result<Homography, GeometryError> {
    let m = m.as_array();
    let det = determinant3x3(m);

    if det.is_nan() || det.abs() <= SINGULAR_EPS {
        return Err(GeometryError::SingularMatrix(det));
    }

    let adj = adjugate3x3(m);
    let inv_det = 1.0 / det;

    let mut inv_m = [0.0; 9];
    for (dst, a) in inv_m.iter_mut().zip(adj.iter()) {
        *dst = a * inv_det;
    }

    Ok(Homography::from_row_major(inv_m))
}
