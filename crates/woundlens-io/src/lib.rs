#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Physical camera selection and baseline estimation.
pub mod calibration;

/// Stereo capture session lifecycle.
pub mod capture;

/// Error types for the io module.
pub mod error;

/// Raw camera frames and their pairing across the two physical cameras.
pub mod stereo;

pub use crate::error::{CalibrationError, CaptureError};
