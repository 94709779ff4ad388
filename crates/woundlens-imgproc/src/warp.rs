use woundlens_geometry::Homography;
use woundlens_image::{Image, ImageSize};

use crate::{error::RectifyError, parallel};

/// Source pixel sampled for the destination pixel `(x, y)`.
///
/// The destination position is mapped through the inverse homography and
/// floored. A point at infinity samples the origin.
#[inline]
fn source_pixel(inv_m: &Homography, x: usize, y: usize) -> Option<(usize, usize)> {
    let [u, v] = inv_m
        .transform_point([x as f64, y as f64])
        .unwrap_or([0.0, 0.0]);
    let (u, v) = (u.floor(), v.floor());
    if !(u.is_finite() && v.is_finite()) || u < 0.0 || v < 0.0 {
        return None;
    }
    Some((u as usize, v as usize))
}

/// Applies a perspective transformation given its inverse, writing into `dst`.
///
/// Every destination pixel copies all channels of the nearest source pixel
/// (no interpolation). Destination pixels whose source falls outside `src`
/// keep their current value. Rows are processed in parallel.
///
/// * `src` - The input image with shape (height, width, channels).
/// * `dst` - The output image with shape (new_height, new_width, channels).
/// * `inv_m` - The 3x3 perspective transformation matrix dst -> src.
pub fn warp_perspective_nearest<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    inv_m: &Homography,
) where
    T: Clone + Send + Sync,
{
    parallel::par_iter_rows_indexed(dst, |y, row| {
        for (x, dst_pixel) in row.chunks_exact_mut(C).enumerate() {
            let src_pixel = source_pixel(inv_m, x, y).and_then(|(u, v)| src.pixel(u, v));
            if let Some(src_pixel) = src_pixel {
                dst_pixel.clone_from_slice(src_pixel);
            }
        }
    });
}

/// Rectify an image onto a new raster given the forward homography.
///
/// * `src` - The photo to rectify.
/// * `m` - The 3x3 perspective transformation matrix src -> dst.
/// * `size` - The size of the rectified raster.
///
/// Pixels without a source are filled with `T::default()`.
///
/// # Errors
///
/// Returns [`RectifyError::Geometry`] if `m` is singular.
///
/// # Example
///
/// ```
/// use woundlens_geometry::Homography;
/// use woundlens_image::{Image, ImageSize};
/// use woundlens_imgproc::warp::rectify;
///
/// let src = Image::<u8, 1>::new([2, 3].into(), vec![0, 1, 2, 3, 4, 5]).unwrap();
///
/// // horizontal flip
/// let m = Homography::from_row_major([-1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
/// let dst = rectify(&src, &m, ImageSize { width: 2, height: 3 }).unwrap();
///
/// assert_eq!(dst.as_slice(), &[1, 0, 3, 2, 5, 4]);
/// ```
pub fn rectify<T, const C: usize>(
    src: &Image<T, C>,
    m: &Homography,
    size: ImageSize,
) -> Result<Image<T, C>, RectifyError>
where
    T: Clone + Default + Send + Sync,
{
    let inv_m = m.inverse()?;
    rectify_with_inverse(src, &inv_m, size)
}

/// Same as [`rectify`] with a precomputed inverse (dst -> src) homography.
pub fn rectify_with_inverse<T, const C: usize>(
    src: &Image<T, C>,
    inv_m: &Homography,
    size: ImageSize,
) -> Result<Image<T, C>, RectifyError>
where
    T: Clone + Default + Send + Sync,
{
    let mut dst = Image::from_size_val(size, T::default())?;
    warp_perspective_nearest(src, &mut dst, inv_m);
    Ok(dst)
}

#[cfg(test)]
mod tests {
    use woundlens_geometry::{GeometryError, Homography};
    use woundlens_image::{Image, ImageSize};

    use crate::RectifyError;

    #[test]
    fn rectify_identity() -> Result<(), RectifyError> {
        let image = Image::<u8, 3>::new(
            ImageSize {
                width: 4,
                height: 5,
            },
            (0..4 * 5 * 3).map(|v| v as u8).collect(),
        )?;

        let new_size = ImageSize {
            width: 2,
            height: 3,
        };

        let rectified = super::rectify(&image, &Homography::IDENTITY, new_size)?;

        assert_eq!(rectified.num_channels(), 3);
        assert_eq!(rectified.size(), new_size);
        assert_eq!(rectified.pixel(1, 2), image.pixel(1, 2));
        Ok(())
    }

    #[test]
    fn rectify_hflip() -> Result<(), RectifyError> {
        let image = Image::<_, 1>::new(
            ImageSize {
                width: 2,
                height: 3,
            },
            vec![0.0f32, 1.0, 2.0, 3.0, 4.0, 5.0],
        )?;

        let image_expected = vec![1.0, 0.0, 3.0, 2.0, 5.0, 4.0];

        // flip matrix
        let m = Homography::from_row_major([-1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);

        let flipped = super::rectify(&image, &m, image.size())?;
        assert_eq!(flipped.as_slice(), &image_expected[..]);
        Ok(())
    }

    #[test]
    fn out_of_bounds_keeps_default() -> Result<(), RectifyError> {
        let image = Image::<u8, 1>::from_size_val([4, 4].into(), 200)?;

        // shift the content right by two pixels
        let m = Homography::from_row_major([1.0, 0.0, 2.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
        let shifted = super::rectify(&image, &m, [4, 4].into())?;

        for y in 0..4 {
            assert_eq!(shifted.pixel(0, y), Some(&[0u8][..]));
            assert_eq!(shifted.pixel(1, y), Some(&[0u8][..]));
            assert_eq!(shifted.pixel(2, y), Some(&[200u8][..]));
            assert_eq!(shifted.pixel(3, y), Some(&[200u8][..]));
        }
        Ok(())
    }

    #[test]
    fn fractional_sources_are_floored() -> Result<(), RectifyError> {
        let image = Image::<u8, 1>::new([4, 1].into(), vec![10, 20, 30, 40])?;

        // dst -> src samples at x * 0.75 + 0.5
        let inv_m = Homography::from_row_major([0.75, 0.0, 0.5, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
        let dst = super::rectify_with_inverse(&image, &inv_m, [4, 1].into())?;

        // sources 0.5, 1.25, 2.0, 2.75
        assert_eq!(dst.as_slice(), &[10, 20, 30, 30]);
        Ok(())
    }

    #[test]
    fn point_at_infinity_samples_origin() -> Result<(), RectifyError> {
        let image = Image::<u8, 1>::new([2, 1].into(), vec![7, 9])?;

        // w = x, so the first column has no finite projection
        let inv_m = Homography::from_row_major([1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0]);
        let dst = super::rectify_with_inverse(&image, &inv_m, [2, 1].into())?;

        // column 1 maps to (1, 0) / 1 = (1, 0)
        assert_eq!(dst.as_slice(), &[7, 9]);
        Ok(())
    }

    #[test]
    fn singular_homography_fails() -> Result<(), RectifyError> {
        let image = Image::<u8, 1>::from_size_val([2, 2].into(), 0)?;
        let m = Homography::from_row_major([0.0; 9]);

        assert_eq!(
            super::rectify(&image, &m, [2, 2].into()),
            Err(RectifyError::Geometry(GeometryError::SingularMatrix(0.0)))
        );
        Ok(())
    }

    #[test]
    fn warp_into_existing_raster() -> Result<(), RectifyError> {
        let src = Image::<u8, 1>::from_size_val([2, 2].into(), 5)?;
        let mut dst = Image::<u8, 1>::from_size_val([3, 3].into(), 99)?;

        super::warp_perspective_nearest(&src, &mut dst, &Homography::IDENTITY);

        assert_eq!(dst.pixel(1, 1), Some(&[5u8][..]));
        assert_eq!(dst.pixel(2, 2), Some(&[99u8][..]));
        Ok(())
    }
}
