use crate::error::ImageError;

/// A borrowed 8-bit image plane with an arbitrary memory layout.
///
/// Camera stacks hand out planes whose rows are padded (`row_stride`) and
/// whose samples may be interleaved with other channels (`pixel_stride`).
/// The sample at column `x` and row `y` lives at
/// `y * row_stride + x * pixel_stride`.
#[derive(Clone, Copy, Debug)]
pub struct Plane<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
    row_stride: usize,
    pixel_stride: usize,
}

/// A plane carrying the luminance (Y) samples of a camera frame.
pub type LumaPlane<'a> = Plane<'a>;

impl<'a> Plane<'a> {
    /// Describe a strided plane over `data`.
    ///
    /// The layout is not checked here; see [`Plane::validate`].
    pub fn new(
        data: &'a [u8],
        width: usize,
        height: usize,
        row_stride: usize,
        pixel_stride: usize,
    ) -> Self {
        Self {
            data,
            width,
            height,
            row_stride,
            pixel_stride,
        }
    }

    /// Describe a tightly packed plane (`row_stride == width`, `pixel_stride == 1`).
    ///
    /// # Example
    ///
    /// ```
    /// use woundlens_image::LumaPlane;
    ///
    /// let data = vec![128u8; 4 * 3];
    /// let plane = LumaPlane::packed(&data, 4, 3);
    ///
    /// assert!(plane.is_readable());
    /// assert_eq!(plane.get(3, 2), Some(128));
    /// ```
    pub fn packed(data: &'a [u8], width: usize, height: usize) -> Self {
        Self::new(data, width, height, width, 1)
    }

    /// Width of the plane in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height of the plane in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Bytes between the start of two consecutive rows.
    #[inline]
    pub fn row_stride(&self) -> usize {
        self.row_stride
    }

    /// Bytes between two consecutive samples of a row.
    #[inline]
    pub fn pixel_stride(&self) -> usize {
        self.pixel_stride
    }

    /// Number of bytes the declared layout addresses.
    ///
    /// Returns `None` if the layout does not fit in the address space.
    pub fn required_len(&self) -> Option<usize> {
        if self.width == 0 || self.height == 0 {
            return Some(0);
        }
        self.offset(self.width - 1, self.height - 1)?.checked_add(1)
    }

    /// Check that every sample of the declared layout is inside the buffer.
    pub fn validate(&self) -> Result<(), ImageError> {
        if self.width == 0 || self.height == 0 {
            return Ok(());
        }

        let invalid_stride = || ImageError::InvalidStride {
            row_stride: self.row_stride,
            pixel_stride: self.pixel_stride,
            width: self.width,
        };

        let row_len = (self.width - 1)
            .checked_mul(self.pixel_stride)
            .and_then(|n| n.checked_add(1))
            .ok_or_else(invalid_stride)?;
        if self.pixel_stride == 0 || (self.height > 1 && self.row_stride < row_len) {
            return Err(invalid_stride());
        }

        let required = self.required_len().ok_or_else(invalid_stride)?;
        if required > self.data.len() {
            return Err(ImageError::PlaneTooShort {
                required,
                actual: self.data.len(),
            });
        }

        Ok(())
    }

    /// Whether the plane is non-empty and its layout fits in the buffer.
    pub fn is_readable(&self) -> bool {
        self.width > 0 && self.height > 0 && self.validate().is_ok()
    }

    /// Sample at column `x` and row `y`, `None` when outside the plane.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(self.offset(x, y)?).copied()
    }

    /// Iterate over the samples of row `y` honoring the pixel stride.
    pub fn row(&self, y: usize) -> impl Iterator<Item = u8> + '_ {
        let width = if y < self.height { self.width } else { 0 };
        (0..width).map_while(move |x| self.get(x, y))
    }

    #[inline]
    fn offset(&self, x: usize, y: usize) -> Option<usize> {
        y.checked_mul(self.row_stride)?
            .checked_add(x.checked_mul(self.pixel_stride)?)
    }
}
