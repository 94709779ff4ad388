use crate::{error::ImageError, plane::Plane};

/// Pack the three planes of a YUV 4:2:0 frame into a contiguous I420 buffer.
///
/// The output holds the full resolution Y plane followed by the U and V
/// planes at half resolution, without any row padding or interleaving.
///
/// # Arguments
///
/// * `y` - The luminance plane with the frame size.
/// * `u` - The chroma-blue plane with half the frame size.
/// * `v` - The chroma-red plane with half the frame size.
///
/// # Errors
///
/// Returns an error if the frame size is odd, if the chroma planes do not
/// have half the luma size, or if any plane layout exceeds its buffer.
///
/// # Example
///
/// ```
/// use woundlens_image::{pack_yuv420, Plane};
///
/// let y = [10u8, 11, 12, 13, 14, 15, 16, 17];
/// // semi-planar chroma: u and v share one interleaved buffer
/// let uv = [100u8, 200, 101, 201];
///
/// let packed = pack_yuv420(
///     &Plane::packed(&y, 4, 2),
///     &Plane::new(&uv, 2, 1, 4, 2),
///     &Plane::new(&uv[1..], 2, 1, 4, 2),
/// ).unwrap();
///
/// assert_eq!(packed, vec![10, 11, 12, 13, 14, 15, 16, 17, 100, 101, 200, 201]);
/// ```
pub fn pack_yuv420(y: &Plane, u: &Plane, v: &Plane) -> Result<Vec<u8>, ImageError> {
    let (width, height) = (y.width(), y.height());
    if width % 2 != 0 || height % 2 != 0 {
        return Err(ImageError::OddFrameSize(width, height));
    }

    for chroma in [u, v] {
        if chroma.width() != width / 2 || chroma.height() != height / 2 {
            return Err(ImageError::InvalidImageSize(
                width / 2,
                height / 2,
                chroma.width(),
                chroma.height(),
            ));
        }
    }

    y.validate()?;
    u.validate()?;
    v.validate()?;

    let luma_len = width * height;
    let mut out = Vec::with_capacity(luma_len + luma_len / 2);
    copy_plane(y, &mut out);
    copy_plane(u, &mut out);
    copy_plane(v, &mut out);

    Ok(out)
}

// PRECONDITION: the plane layout was validated against its buffer.
fn copy_plane(plane: &Plane, out: &mut Vec<u8>) {
    for row in 0..plane.height() {
        out.extend(plane.row(row));
    }
}
