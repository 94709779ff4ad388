/// An error type for the image module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ImageError {
    /// Error when channel and shape are not valid.
    #[error("Data length ({0}) does not match the image size ({1})")]
    InvalidChannelShape(usize, usize),

    /// Error when two images are expected to have the same size.
    #[error("Image size mismatch: {0}x{1} vs {2}x{3}")]
    InvalidImageSize(usize, usize, usize, usize),

    /// Error when a plane buffer cannot hold the declared layout.
    #[error("Plane buffer too short: {required} bytes required, got {actual}")]
    PlaneTooShort {
        /// Number of bytes the layout addresses.
        required: usize,
        /// Number of bytes available in the buffer.
        actual: usize,
    },

    /// Error when a stride is smaller than the data it has to step over.
    #[error("Invalid stride: row stride {row_stride} with pixel stride {pixel_stride} for width {width}")]
    InvalidStride {
        /// Bytes between the start of two consecutive rows.
        row_stride: usize,
        /// Bytes between two consecutive pixels of a row.
        pixel_stride: usize,
        /// Width of the plane in pixels.
        width: usize,
    },

    /// Error when a frame has odd dimensions and cannot be chroma subsampled.
    #[error("YUV 4:2:0 frames require even dimensions, got {0}x{1}")]
    OddFrameSize(usize, usize),
}
