use woundlens_geometry::GeometryError;
use woundlens_image::ImageError;

/// An error type for the rectification path.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum RectifyError {
    /// The homography could not be inverted.
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// The output raster could not be allocated with the requested shape.
    #[error(transparent)]
    Image(#[from] ImageError),
}
