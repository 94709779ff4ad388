#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for the image module.
pub mod error;

/// Owned raster representation used by the rectification path.
pub mod image;

/// Borrowed, strided single-plane views over camera buffers.
pub mod plane;

/// Packing of strided YUV 4:2:0 camera planes into contiguous buffers.
pub mod yuv;

pub use crate::error::ImageError;
pub use crate::image::{Image, ImageSize};
pub use crate::plane::{LumaPlane, Plane};
pub use crate::yuv::pack_yuv420;
