use woundlens_image::LumaPlane;

/// Target width of the blur analysis grid.
pub const BLUR_TARGET_WIDTH: usize = 64;

/// Minimum width and height of the blur analysis grid.
pub const BLUR_MIN_DIMENSION: usize = 32;

/// A small luma raster used for the sharpness estimate.
#[derive(Clone, Debug, PartialEq)]
pub struct DownsampledGrid {
    /// Grid samples, row-major.
    pub data: Vec<u8>,
    /// Grid width.
    pub width: usize,
    /// Grid height.
    pub height: usize,
}

/// Grid dimensions for a plane of `width x height` pixels.
///
/// Both axes share the scale `max(1, width / 64)`, and each side is at
/// least 32 cells.
pub fn grid_size(width: usize, height: usize) -> (usize, usize) {
    let scale = (width / BLUR_TARGET_WIDTH).max(1);
    (
        (width / scale).max(BLUR_MIN_DIMENSION),
        (height / scale).max(BLUR_MIN_DIMENSION),
    )
}

/// Nearest-neighbor subsampling of the plane onto the analysis grid.
///
/// Grid cell `(gx, gy)` takes the sample at `(gx * width / grid_width,
/// gy * height / grid_height)`. Planes narrower than the minimum grid repeat
/// their samples.
pub fn downsample(plane: &LumaPlane) -> DownsampledGrid {
    let (width, height) = (plane.width(), plane.height());
    let (grid_width, grid_height) = grid_size(width, height);

    let mut data = Vec::with_capacity(grid_width * grid_height);
    for gy in 0..grid_height {
        let sy = gy * height / grid_height;
        for gx in 0..grid_width {
            let sx = gx * width / grid_width;
            data.push(plane.get(sx, sy).unwrap_or_default());
        }
    }

    DownsampledGrid {
        data,
        width: grid_width,
        height: grid_height,
    }
}

/// Population variance of the 4-neighbor Laplacian over the grid interior.
///
/// Grids smaller than 3x3 have no interior and score `0.0`.
pub fn laplacian_variance(grid: &DownsampledGrid) -> f64 {
    let (w, h) = (grid.width, grid.height);
    if w < 3 || h < 3 || grid.data.len() < w * h {
        return 0.0;
    }

    let at = |x: usize, y: usize| i32::from(grid.data[y * w + x]);

    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    let mut count = 0usize;

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let laplacian = at(x, y - 1) + at(x, y + 1) + at(x - 1, y) + at(x + 1, y) - 4 * at(x, y);
            let value = f64::from(laplacian);
            sum += value;
            sum_sq += value * value;
            count += 1;
        }
    }

    let n = count as f64;
    let mean = sum / n;
    (sum_sq / n - mean * mean).max(0.0)
}

/// Sharpness score of a luma plane, see [`laplacian_variance`].
pub fn blur_score(plane: &LumaPlane) -> f64 {
    laplacian_variance(&downsample(plane))
}
