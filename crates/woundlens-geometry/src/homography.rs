use serde::{Deserialize, Serialize};

use crate::{error::GeometryError, linalg};

/// Pivots at or below this magnitude abort the elimination.
pub const PIVOT_EPS: f64 = 1e-12;

/// Homogeneous weights below this magnitude have no finite projection.
pub const PROJECTION_EPS: f64 = 1e-12;

/// A 3x3 projective transform stored row-major.
///
/// Homographies produced by [`solve_homography`] map source to destination
/// coordinates and are normalized so that the bottom-right entry is `1.0`.
/// Serialized as a flat array of nine numbers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Homography([f64; 9]);

impl Homography {
    /// The identity transform.
    pub const IDENTITY: Homography =
        Homography([1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);

    /// Wrap nine row-major entries.
    pub fn from_row_major(m: [f64; 9]) -> Self {
        Self(m)
    }

    /// The nine row-major entries.
    #[inline]
    pub fn as_array(&self) -> &[f64; 9] {
        &self.0
    }

    /// The matrix as three rows.
    pub fn as_rows(&self) -> [[f64; 3]; 3] {
        let m = &self.0;
        [[m[0], m[1], m[2]], [m[3], m[4], m[5]], [m[6], m[7], m[8]]]
    }

    /// Inverse transform, see [`linalg::invert3x3`].
    pub fn inverse(&self) -> Result<Homography, GeometryError> {
        linalg::invert3x3(self)
    }

    /// Map a point through the transform with homogeneous division.
    ///
    /// Returns `None` when the point maps to infinity (`|w| < 1e-12`).
    #[inline]
    pub fn transform_point(&self, p: [f64; 2]) -> Option<[f64; 2]> {
        let m = &self.0;
        let w = m[6] * p[0] + m[7] * p[1] + m[8];
        if w.abs() < PROJECTION_EPS {
            return None;
        }
        Some([
            (m[0] * p[0] + m[1] * p[1] + m[2]) / w,
            (m[3] * p[0] + m[4] * p[1] + m[5]) / w,
        ])
    }
}

impl Default for Homography {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<Homography> for [f64; 9] {
    fn from(h: Homography) -> Self {
        h.0
    }
}

/// Compute the homography matrix from four 2d point correspondences.
///
/// Each correspondence `(x, y) -> (u, v)` contributes the two rows
///
/// ```text
/// [x y 1 0 0 0 -ux -uy] h = u
/// [0 0 0 x y 1 -vx -vy] h = v
/// ```
///
/// of an 8x8 system that is solved by Gauss-Jordan elimination with partial
/// pivoting. The ninth entry is fixed to `1.0`.
///
/// * `src` - The source points, e.g. marker corners tapped on the photo.
/// * `dst` - The destination points, e.g. the corners of the output raster.
///
/// # Errors
///
/// Returns [`GeometryError::DegenerateConfiguration`] if a pivot magnitude
/// drops to `1e-12` or below (repeated or collinear points).
///
/// # Example
///
/// ```
/// use woundlens_geometry::solve_homography;
///
/// let src = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
/// let dst = [[10.0, 20.0], [11.0, 20.0], [11.0, 21.0], [10.0, 21.0]];
///
/// let h = solve_homography(&src, &dst).unwrap();
/// let p = h.transform_point([0.5, 0.5]).unwrap();
///
/// assert!((p[0] - 10.5).abs() < 1e-9 && (p[1] - 20.5).abs() < 1e-9);
/// ```
pub fn solve_homography(
    src: &[[f64; 2]; 4],
    dst: &[[f64; 2]; 4],
) -> Result<Homography, GeometryError> {
    let mut mat_a = [[0.0f64; 8]; 8];
    let mut vec_b = [0.0f64; 8];

    for (i, (&[x, y], &[u, v])) in src.iter().zip(dst.iter()).enumerate() {
        mat_a[2 * i] = [x, y, 1.0, 0.0, 0.0, 0.0, -u * x, -u * y];
        vec_b[2 * i] = u;

        mat_a[2 * i + 1] = [0.0, 0.0, 0.0, x, y, 1.0, -v * x, -v * y];
        vec_b[2 * i + 1] = v;
    }

    let h = gauss_jordan(&mut mat_a, &mut vec_b)?;

    Ok(Homography([h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0]))
}

/// Same as [`solve_homography`] for point lists of unchecked length.
///
/// # Errors
///
/// Returns [`GeometryError::InvalidCorrespondenceCount`] unless both lists
/// hold exactly four points.
pub fn solve_homography_from_slices(
    src: &[[f64; 2]],
    dst: &[[f64; 2]],
) -> Result<Homography, GeometryError> {
    let src: &[[f64; 2]; 4] = src
        .try_into()
        .map_err(|_| GeometryError::InvalidCorrespondenceCount {
            expected: 4,
            actual: src.len(),
        })?;
    let dst: &[[f64; 2]; 4] = dst
        .try_into()
        .map_err(|_| GeometryError::InvalidCorrespondenceCount {
            expected: 4,
            actual: dst.len(),
        })?;

    solve_homography(src, dst)
}

// Solves `a * x = b` in place and returns `x`.
fn gauss_jordan<const N: usize>(
    a: &mut [[f64; N]; N],
    b: &mut [f64; N],
) -> Result<[f64; N], GeometryError> {
    for i in 0..N {
        // partial pivoting: bring the largest remaining entry of column i up
        let mut max_row = i;
        for r in (i + 1)..N {
            if a[r][i].abs() > a[max_row][i].abs() {
                max_row = r;
            }
        }
        if max_row != i {
            a.swap(i, max_row);
            b.swap(i, max_row);
        }

        let pivot = a[i][i];
        if pivot.is_nan() || pivot.abs() <= PIVOT_EPS {
            return Err(GeometryError::DegenerateConfiguration);
        }

        for c in i..N {
            a[i][c] /= pivot;
        }
        b[i] /= pivot;

        for r in 0..N {
            if r == i {
                continue;
            }
            let factor = a[r][i];
            if factor == 0.0 {
                continue;
            }
            for c in i..N {
                a[r][c] -= factor * a[i][c];
            }
            b[r] -= factor * b[i];
        }
    }

    Ok(*b)
}
