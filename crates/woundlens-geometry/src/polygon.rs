use serde::{Deserialize, Serialize};

use crate::marker::MarkerCorners;

/// A closed wound outline in image pixels.
///
/// The first and last points are implicitly connected.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    /// Ordered `(x, y)` vertices.
    pub points: Vec<[f64; 2]>,
}

impl Outline {
    /// Create an outline from its ordered vertices.
    pub fn new(points: Vec<[f64; 2]>) -> Self {
        Self { points }
    }

    /// Whether the outline encloses an area (at least three vertices).
    pub fn is_closed_polygon(&self) -> bool {
        self.points.len() >= 3
    }

    /// See [`area_pixels`].
    pub fn area_pixels(&self) -> f64 {
        area_pixels(&self.points)
    }

    /// See [`perimeter_pixels`].
    pub fn perimeter_pixels(&self) -> f64 {
        perimeter_pixels(&self.points)
    }
}

/// Area enclosed by a closed polygon in square pixels (shoelace formula).
///
/// The result does not depend on the winding direction or on which vertex
/// comes first. Fewer than three points enclose no area.
///
/// # Example
///
/// ```
/// use woundlens_geometry::polygon::area_pixels;
///
/// assert_eq!(area_pixels(&[[0.0, 0.0], [4.0, 0.0], [0.0, 3.0]]), 6.0);
/// assert_eq!(area_pixels(&[[0.0, 0.0], [4.0, 0.0]]), 0.0);
/// ```
pub fn area_pixels(points: &[[f64; 2]]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }

    let sum: f64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(p, q)| p[0] * q[1] - q[0] * p[1])
        .sum();

    sum.abs() / 2.0
}

/// Length of the closed polygon boundary in pixels.
///
/// Fewer than two points have no boundary.
pub fn perimeter_pixels(points: &[[f64; 2]]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(p, q)| (q[0] - p[0]).hypot(q[1] - p[1]))
        .sum()
}

/// Convert a pixel area with a linear calibration factor.
///
/// `factor` is a length per pixel (e.g. cm/px), so the area scales with its
/// square and the result is in squared units (e.g. cm²).
#[inline]
pub fn physical_area_from_linear_factor(area_pixels: f64, factor: f64) -> f64 {
    area_pixels * factor * factor
}

/// Convert a pixel area with an areal calibration factor.
///
/// `factor` already is an area per pixel (e.g. cm²/px) and is applied as is.
#[inline]
pub fn physical_area_from_areal_factor(area_pixels: f64, factor: f64) -> f64 {
    area_pixels * factor
}

/// Length of one pixel in marker units, see [`MarkerCorners::calibration_factor`].
#[inline]
pub fn marker_calibration_factor(corners: &MarkerCorners, marker_size: f64) -> Option<f64> {
    corners.calibration_factor(marker_size)
}

/// Convert a pixel length with a linear calibration factor.
#[inline]
pub fn physical_length(length_pixels: f64, factor: f64) -> f64 {
    length_pixels * factor
}
