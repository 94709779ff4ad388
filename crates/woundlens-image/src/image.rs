use crate::error::ImageError;

/// Image size in pixels
///
/// A struct to represent the size of an image in pixels.
///
/// # Examples
///
/// ```
/// use woundlens_image::ImageSize;
///
/// let image_size = ImageSize {
///   width: 10,
///   height: 20,
/// };
///
/// assert_eq!(image_size.width, 10);
/// assert_eq!(image_size.height, 20);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ImageSize {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
}

impl ImageSize {
    /// Number of pixels covered by the size.
    #[inline]
    pub fn area(&self) -> usize {
        self.width * self.height
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl From<[usize; 2]> for ImageSize {
    fn from(size: [usize; 2]) -> Self {
        ImageSize {
            width: size[0],
            height: size[1],
        }
    }
}

/// Represents an image with interleaved pixel data.
///
/// The pixels are stored row-major with shape (H, W, C).
#[derive(Clone, Debug, PartialEq)]
pub struct Image<T, const CHANNELS: usize> {
    size: ImageSize,
    data: Vec<T>,
}

impl<T, const CHANNELS: usize> Image<T, CHANNELS> {
    /// Create a new image from pixel data.
    ///
    /// # Arguments
    ///
    /// * `size` - The size of the image in pixels.
    /// * `data` - The pixel data of the image.
    ///
    /// # Errors
    ///
    /// If the length of the pixel data does not match the image size, an error is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use woundlens_image::{Image, ImageSize};
    ///
    /// let image = Image::<u8, 3>::new(
    ///    ImageSize {
    ///       width: 10,
    ///       height: 20,
    ///    },
    ///    vec![0u8; 10 * 20 * 3],
    /// ).unwrap();
    ///
    /// assert_eq!(image.size().width, 10);
    /// assert_eq!(image.size().height, 20);
    /// assert_eq!(image.num_channels(), 3);
    /// ```
    pub fn new(size: ImageSize, data: Vec<T>) -> Result<Self, ImageError> {
        if data.len() != size.area() * CHANNELS {
            return Err(ImageError::InvalidChannelShape(
                data.len(),
                size.area() * CHANNELS,
            ));
        }

        Ok(Self { size, data })
    }

    /// Create a new image with the given size filled with `val`.
    pub fn from_size_val(size: ImageSize, val: T) -> Result<Self, ImageError>
    where
        T: Clone,
    {
        Self::new(size, vec![val; size.area() * CHANNELS])
    }

    /// Get the size of the image in pixels.
    #[inline]
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Get the width of the image in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.size.width
    }

    /// Get the height of the image in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        self.size.height
    }

    /// Get the number of columns of the image.
    #[inline]
    pub fn cols(&self) -> usize {
        self.size.width
    }

    /// Get the number of rows of the image.
    #[inline]
    pub fn rows(&self) -> usize {
        self.size.height
    }

    /// Get the number of channels in the image.
    #[inline]
    pub fn num_channels(&self) -> usize {
        CHANNELS
    }

    /// The interleaved pixel data.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// The interleaved pixel data, mutably.
    #[inline]
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consume the image and return its pixel buffer.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Get a single sample at `[y, x, channel]`.
    pub fn get(&self, index: [usize; 3]) -> Option<&T> {
        let [y, x, ch] = index;
        if x >= self.width() || y >= self.height() || ch >= CHANNELS {
            return None;
        }
        self.data.get((y * self.width() + x) * CHANNELS + ch)
    }

    /// Get all channels of the pixel at column `x` and row `y`.
    pub fn pixel(&self, x: usize, y: usize) -> Option<&[T]> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let base = (y * self.width() + x) * CHANNELS;
        self.data.get(base..base + CHANNELS)
    }
}
