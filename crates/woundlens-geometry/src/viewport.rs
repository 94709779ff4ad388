use serde::{Deserialize, Serialize};

/// Aspect-fit placement of an image inside a display canvas.
///
/// The image is scaled uniformly to the largest size that fits the canvas
/// and centered, leaving letterbox bars along one axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Canvas units per image pixel.
    pub scale: f64,
    /// Canvas position of the image origin.
    pub offset: [f64; 2],
    /// Image size in pixels, `[width, height]`.
    pub image_size: [f64; 2],
}

impl Viewport {
    /// Fit an image of `image` pixels into a canvas of `canvas` units.
    ///
    /// Both sizes are `[width, height]`. Returns `None` if either size is
    /// empty or not finite.
    ///
    /// # Example
    ///
    /// ```
    /// use woundlens_geometry::viewport::Viewport;
    ///
    /// // a 4:3 photo on a square canvas leaves bars above and below
    /// let vp = Viewport::fit([400.0, 400.0], [800.0, 600.0]).unwrap();
    /// assert_eq!(vp.scale, 0.5);
    /// assert_eq!(vp.offset, [0.0, 50.0]);
    /// assert_eq!(vp.canvas_to_image([200.0, 200.0]), Some([400.0, 300.0]));
    /// assert_eq!(vp.canvas_to_image([200.0, 10.0]), None);
    /// ```
    pub fn fit(canvas: [f64; 2], image: [f64; 2]) -> Option<Self> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !canvas.into_iter().chain(image).all(valid) {
            return None;
        }

        let scale = (canvas[0] / image[0]).min(canvas[1] / image[1]);
        let drawn = [image[0] * scale, image[1] * scale];

        Some(Self {
            scale,
            offset: [(canvas[0] - drawn[0]) / 2.0, (canvas[1] - drawn[1]) / 2.0],
            image_size: image,
        })
    }

    /// Map a canvas position (e.g. a tap) to image pixels.
    ///
    /// Returns `None` for positions on the letterbox bars or off the canvas.
    pub fn canvas_to_image(&self, tap: [f64; 2]) -> Option<[f64; 2]> {
        let p = [
            (tap[0] - self.offset[0]) / self.scale,
            (tap[1] - self.offset[1]) / self.scale,
        ];
        let inside = (0.0..=self.image_size[0]).contains(&p[0])
            && (0.0..=self.image_size[1]).contains(&p[1]);
        inside.then_some(p)
    }

    /// Map image pixels to a canvas position.
    pub fn image_to_canvas(&self, p: [f64; 2]) -> [f64; 2] {
        [
            p[0] * self.scale + self.offset[0],
            p[1] * self.scale + self.offset[1],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn pillarbox_on_wide_canvas() {
        let vp = Viewport::fit([1920.0, 1080.0], [1000.0, 1000.0]).expect("valid sizes");
        assert_relative_eq!(vp.scale, 1.08);
        assert_relative_eq!(vp.offset[0], 420.0, epsilon = 1e-9);
        assert_relative_eq!(vp.offset[1], 0.0, epsilon = 1e-9);

        assert_eq!(vp.canvas_to_image([100.0, 500.0]), None);
        let p = vp.canvas_to_image([960.0, 540.0]).expect("inside");
        assert_relative_eq!(p[0], 500.0, epsilon = 1e-9);
        assert_relative_eq!(p[1], 500.0, epsilon = 1e-9);
    }

    #[test]
    fn tap_roundtrip() {
        let vp = Viewport::fit([390.0, 844.0], [1280.0, 720.0]).expect("valid sizes");
        for p in [[0.0, 0.0], [1280.0, 720.0], [311.5, 97.25]] {
            let back = vp
                .canvas_to_image(vp.image_to_canvas(p))
                .expect("inside the image");
            assert_relative_eq!(back[0], p[0], epsilon = 1e-9);
            assert_relative_eq!(back[1], p[1], epsilon = 1e-9);
        }
    }

    #[test]
    fn rejects_empty_sizes() {
        assert_eq!(Viewport::fit([0.0, 100.0], [10.0, 10.0]), None);
        assert_eq!(Viewport::fit([100.0, 100.0], [10.0, f64::NAN]), None);
        assert_eq!(Viewport::fit([100.0, 100.0], [-10.0, 10.0]), None);
    }
}
