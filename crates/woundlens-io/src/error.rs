use woundlens_image::ImageError;

/// An error type for the calibration module.
///
/// All variants describe a device that cannot be used for stereo capture;
/// retrying without a configuration change gives the same result.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    /// No camera advertises the logical multi-camera capability.
    #[error("No logical multi-camera found")]
    NoMultiCameraSupport,

    /// The logical camera is backed by fewer than two physical cameras.
    #[error("Not enough physical cameras for logical camera {logical_id} (found {found})")]
    InsufficientPhysicalCameras {
        /// The logical camera id.
        logical_id: String,
        /// Number of physical cameras listed.
        found: usize,
    },

    /// A camera id has no characteristics.
    #[error("Unknown camera {0}")]
    UnknownCamera(String),

    /// A physical camera lacks a required characteristic.
    #[error("Missing {field} for physical camera {camera_id}")]
    MissingIntrinsics {
        /// The physical camera id.
        camera_id: String,
        /// Name of the missing characteristic.
        field: &'static str,
    },

    /// The same physical camera was picked as main and wide.
    #[error("Cannot determine distinct main and wide physical cameras (both {0})")]
    AmbiguousCameraRoles(String),
}

/// An error type for the capture module.
#[derive(thiserror::Error, Debug)]
pub enum CaptureError {
    /// The device calibration could not be resolved.
    #[error("Unable to load stereo calibration")]
    Calibration(#[from] CalibrationError),

    /// The logical camera offers no YUV 4:2:0 output size.
    #[error("No suitable YUV 4:2:0 size for logical camera {0}")]
    NoSuitableCaptureSize(String),

    /// The camera backend failed to open the session.
    #[error("Unable to open stereo session: {0}")]
    SessionFailed(String),

    /// A camera buffer could not be turned into a frame.
    #[error(transparent)]
    InvalidFrame(#[from] ImageError),
}
