#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use woundlens_image as image;

#[doc(inline)]
pub use woundlens_geometry as geometry;

#[doc(inline)]
pub use woundlens_imgproc as imgproc;

#[doc(inline)]
pub use woundlens_io as io;
