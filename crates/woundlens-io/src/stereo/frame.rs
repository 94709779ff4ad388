use woundlens_image::{pack_yuv420, ImageError, ImageSize, LumaPlane, Plane};

/// Which physical camera produced a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CameraRole {
    /// The main (longest focal length) camera.
    Primary,
    /// The wide (shortest focal length) camera.
    Secondary,
}

impl CameraRole {
    /// The other camera.
    pub fn opposite(self) -> Self {
        match self {
            CameraRole::Primary => CameraRole::Secondary,
            CameraRole::Secondary => CameraRole::Primary,
        }
    }
}

impl std::fmt::Display for CameraRole {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            CameraRole::Primary => write!(f, "primary"),
            CameraRole::Secondary => write!(f, "secondary"),
        }
    }
}

/// A camera frame packed as I420 (Y plane, then U, then V).
#[derive(Clone, Debug, PartialEq)]
pub struct RawFrame {
    /// Capture timestamp in nanoseconds on the camera's monotonic clock.
    pub timestamp_ns: i64,
    /// The camera that produced the frame.
    pub role: CameraRole,
    /// Frame size in pixels.
    pub size: ImageSize,
    /// Packed I420 bytes.
    pub data: Vec<u8>,
}

impl RawFrame {
    /// Wrap already packed I420 bytes.
    pub fn new(role: CameraRole, timestamp_ns: i64, size: ImageSize, data: Vec<u8>) -> Self {
        Self {
            timestamp_ns,
            role,
            size,
            data,
        }
    }

    /// Pack the three strided planes of a camera image into a frame.
    ///
    /// # Errors
    ///
    /// See [`pack_yuv420`].
    pub fn from_planes(
        role: CameraRole,
        timestamp_ns: i64,
        y: &Plane,
        u: &Plane,
        v: &Plane,
    ) -> Result<Self, ImageError> {
        let data = pack_yuv420(y, u, v)?;
        Ok(Self::new(
            role,
            timestamp_ns,
            ImageSize {
                width: y.width(),
                height: y.height(),
            },
            data,
        ))
    }

    /// The luma plane at the start of the packed buffer.
    pub fn luma(&self) -> LumaPlane<'_> {
        LumaPlane::packed(&self.data, self.size.width, self.size.height)
    }
}

/// Two frames captured at (nearly) the same instant by both cameras.
#[derive(Clone, Debug, PartialEq)]
pub struct FramePair {
    /// Frame of the main camera.
    pub primary: RawFrame,
    /// Frame of the wide camera.
    pub secondary: RawFrame,
    /// The later of the two capture timestamps.
    pub timestamp_ns: i64,
}

impl FramePair {
    /// Pair two frames, putting each in the slot of its role.
    ///
    /// Returns `None` if both frames come from the same camera.
    pub fn new(a: RawFrame, b: RawFrame) -> Option<Self> {
        let timestamp_ns = a.timestamp_ns.max(b.timestamp_ns);
        match (a.role, b.role) {
            (CameraRole::Primary, CameraRole::Secondary) => Some(Self {
                primary: a,
                secondary: b,
                timestamp_ns,
            }),
            (CameraRole::Secondary, CameraRole::Primary) => Some(Self {
                primary: b,
                secondary: a,
                timestamp_ns,
            }),
            _ => None,
        }
    }

    /// Absolute capture time difference between the two frames.
    pub fn skew_ns(&self) -> u64 {
        self.primary.timestamp_ns.abs_diff(self.secondary.timestamp_ns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(role: CameraRole, timestamp_ns: i64) -> RawFrame {
        RawFrame::new(role, timestamp_ns, [2, 2].into(), vec![0; 6])
    }

    #[test]
    fn pair_orders_roles() {
        let pair = FramePair::new(
            frame(CameraRole::Secondary, 30),
            frame(CameraRole::Primary, 12),
        )
        .expect("distinct roles");

        assert_eq!(pair.primary.timestamp_ns, 12);
        assert_eq!(pair.secondary.timestamp_ns, 30);
        assert_eq!(pair.timestamp_ns, 30);
        assert_eq!(pair.skew_ns(), 18);

        assert!(FramePair::new(frame(CameraRole::Primary, 0), frame(CameraRole::Primary, 1)).is_none());
    }

    #[test]
    fn frame_from_strided_planes() -> Result<(), ImageError> {
        // 4x2 luma with row padding, chroma interleaved as in semi-planar buffers
        let y = [
            1u8, 2, 3, 4, 0, 0, //
            5, 6, 7, 8,
        ];
        let uv = [10u8, 20, 11, 21];
        let y = Plane::new(&y, 4, 2, 6, 1);
        let u = Plane::new(&uv, 2, 1, 4, 2);
        let v = Plane::new(&uv[1..], 2, 1, 4, 2);

        let frame = RawFrame::from_planes(CameraRole::Primary, 7, &y, &u, &v)?;
        assert_eq!(frame.size, ImageSize { width: 4, height: 2 });
        assert_eq!(frame.data, vec![1, 2, 3, 4, 5, 6, 7, 8, 10, 11, 20, 21]);
        assert_eq!(frame.luma().get(3, 1), Some(8));
        Ok(())
    }

    #[test]
    fn opposite_role() {
        assert_eq!(CameraRole::Primary.opposite(), CameraRole::Secondary);
        assert_eq!(CameraRole::Secondary.opposite(), CameraRole::Primary);
        assert_eq!(CameraRole::Secondary.to_string(), "secondary");
    }
}
