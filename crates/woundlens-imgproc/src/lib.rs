#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for the image processing module.
pub mod error;

/// row-parallel iteration helpers.
pub mod parallel;

/// capture quality gate module.
pub mod quality;

/// perspective rectification module.
pub mod warp;

pub use crate::error::RectifyError;
