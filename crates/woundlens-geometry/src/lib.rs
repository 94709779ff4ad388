#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Marker path
//!
//! Four corners tapped on a reference marker are mapped onto a square, the
//! resulting [`Homography`] rectifies the photo, and the wound outline drawn
//! on the rectified image is measured with the polygon metrics.
//!
//! ```rust
//! use woundlens_geometry::{marker::MarkerCorners, polygon};
//!
//! let corners = MarkerCorners::from_taps(&[
//!     [100.0, 100.0],
//!     [300.0, 110.0],
//!     [310.0, 290.0],
//!     [95.0, 300.0],
//! ])?;
//!
//! let homography = corners.rectification(1000)?;
//! let mapped = homography.transform_point(corners.top_right).unwrap();
//! assert!((mapped[0] - 999.0).abs() < 1e-6);
//!
//! // a 5 cm marker gives the length of one pixel in centimeters
//! let cm_per_px = corners.calibration_factor(5.0).unwrap();
//!
//! let outline = [[0.0, 0.0], [40.0, 0.0], [40.0, 30.0], [0.0, 30.0]];
//! let area_px = polygon::area_pixels(&outline);
//! let area_cm2 = polygon::physical_area_from_linear_factor(area_px, cm_per_px);
//! assert!(area_cm2 > 0.0);
//! # Ok::<(), woundlens_geometry::GeometryError>(())
//! ```

/// Error types for the geometry module.
pub mod error;

/// Planar homography estimation from four point correspondences.
pub mod homography;

/// Closed-form 3x3 matrix helpers.
pub mod linalg;

/// Reference marker corners and the calibration factor derived from them.
pub mod marker;

/// Outline area, perimeter and pixel to physical unit conversions.
pub mod polygon;

/// Mapping between a letterboxed display canvas and image pixels.
pub mod viewport;

pub use crate::error::GeometryError;
pub use crate::homography::{solve_homography, solve_homography_from_slices, Homography};
pub use crate::linalg::invert3x3;
