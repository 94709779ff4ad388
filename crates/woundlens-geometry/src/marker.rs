use serde::{Deserialize, Serialize};

use crate::{
    error::GeometryError,
    homography::{solve_homography, Homography},
};

/// The four corners of a square reference marker in image pixels.
///
/// Corners are collected in a fixed order: top-left, top-right,
/// bottom-right, bottom-left.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerCorners {
    /// Top-left corner.
    pub top_left: [f64; 2],
    /// Top-right corner.
    pub top_right: [f64; 2],
    /// Bottom-right corner.
    pub bottom_right: [f64; 2],
    /// Bottom-left corner.
    pub bottom_left: [f64; 2],
}

impl MarkerCorners {
    /// Build the corners from taps given in the fixed corner order.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidCorrespondenceCount`] unless exactly
    /// four taps are given.
    pub fn from_taps(taps: &[[f64; 2]]) -> Result<Self, GeometryError> {
        match taps {
            [tl, tr, br, bl] => Ok(Self {
                top_left: *tl,
                top_right: *tr,
                bottom_right: *br,
                bottom_left: *bl,
            }),
            _ => Err(GeometryError::InvalidCorrespondenceCount {
                expected: 4,
                actual: taps.len(),
            }),
        }
    }

    /// Corners of a `side x side` pixel raster, `[0, side - 1]` on both axes.
    pub fn square(side: usize) -> Self {
        let s = side.saturating_sub(1) as f64;
        Self {
            top_left: [0.0, 0.0],
            top_right: [s, 0.0],
            bottom_right: [s, s],
            bottom_left: [0.0, s],
        }
    }

    /// The corners in the fixed order.
    pub fn to_array(&self) -> [[f64; 2]; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    /// Homography mapping the marker onto a `side x side` square raster.
    pub fn rectification(&self, side: usize) -> Result<Homography, GeometryError> {
        solve_homography(&self.to_array(), &Self::square(side).to_array())
    }

    /// Physical length of one pixel given the printed marker side length.
    ///
    /// The pixel length of the marker side is the mean of its top and
    /// bottom edges. Returns `None` for a non-positive marker size or when
    /// both edges collapse to a point.
    ///
    /// # Example
    ///
    /// ```
    /// use woundlens_geometry::marker::MarkerCorners;
    ///
    /// let corners = MarkerCorners::from_taps(&[
    ///     [0.0, 0.0], [200.0, 0.0], [200.0, 200.0], [0.0, 200.0],
    /// ]).unwrap();
    ///
    /// // a 5 cm marker spanning 200 px
    /// assert_eq!(corners.calibration_factor(5.0), Some(0.025));
    /// ```
    pub fn calibration_factor(&self, marker_size: f64) -> Option<f64> {
        if marker_size.is_nan() || marker_size <= 0.0 {
            return None;
        }
        let top = distance(self.top_left, self.top_right);
        let bottom = distance(self.bottom_left, self.bottom_right);
        let mean = (top + bottom) / 2.0;
        if mean.is_nan() || mean <= 0.0 {
            return None;
        }
        Some(marker_size / mean)
    }
}

fn distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    (a[0] - b[0]).hypot(a[1] - b[1])
}
