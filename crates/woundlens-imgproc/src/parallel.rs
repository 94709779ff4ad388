use rayon::prelude::*;

use woundlens_image::Image;

/// Apply a function to each row of the image in parallel.
///
/// The closure receives the row index and the interleaved samples of that
/// row (`cols * C` values). Images without pixels are left untouched.
pub fn par_iter_rows_indexed<T, const C: usize>(
    dst: &mut Image<T, C>,
    f: impl Fn(usize, &mut [T]) + Send + Sync,
) where
    T: Send + Sync,
{
    let row_len = C * dst.cols();
    if row_len == 0 || dst.rows() == 0 {
        return;
    }

    dst.as_slice_mut()
        .par_chunks_exact_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| f(y, row));
}
