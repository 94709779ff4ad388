use serde::{Deserialize, Serialize};
use woundlens_image::ImageSize;

use crate::error::CalibrationError;

/// Capture size used whenever the logical camera offers it.
pub const PREFERRED_CAPTURE_SIZE: ImageSize = ImageSize {
    width: 1280,
    height: 720,
};

/// Largest capture size considered before falling back to the smallest one.
pub const MAX_CAPTURE_SIZE: ImageSize = ImageSize {
    width: 1920,
    height: 1080,
};

/// Baseline magnitudes up to this value are taken to be in meters.
pub const METERS_MAGNITUDE_LIMIT: f64 = 0.5;

/// Physical size of a camera sensor in millimeters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensorSize {
    /// Sensor width in millimeters.
    pub width: f64,
    /// Sensor height in millimeters.
    pub height: f64,
}

/// Pinhole intrinsics in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    /// Focal length along x.
    pub fx: f64,
    /// Focal length along y.
    pub fy: f64,
    /// Principal point x.
    pub cx: f64,
    /// Principal point y.
    pub cy: f64,
    /// Axis skew.
    pub skew: f64,
}

impl CameraIntrinsics {
    /// Read the `[fx, fy, cx, cy, s]` layout reported by camera stacks.
    ///
    /// Returns `None` for fewer than five values.
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        match values {
            [fx, fy, cx, cy, skew, ..] => Some(Self {
                fx: *fx,
                fy: *fy,
                cx: *cx,
                cy: *cy,
                skew: *skew,
            }),
            _ => None,
        }
    }
}

/// What a camera reports about itself.
///
/// Every characteristic is optional since devices differ in what they
/// expose.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraCharacteristics {
    /// The camera is a logical camera fusing several physical ones.
    pub logical_multi_camera: bool,
    /// Physical cameras behind a logical camera, in enumeration order.
    pub physical_camera_ids: Vec<String>,
    /// Available focal lengths in millimeters.
    pub focal_lengths_mm: Option<Vec<f64>>,
    /// Physical sensor size.
    pub sensor_physical_size_mm: Option<SensorSize>,
    /// Intrinsic calibration `[fx, fy, cx, cy, s]` in pixels.
    pub intrinsic_calibration: Option<Vec<f64>>,
    /// Lens distortion coefficients.
    pub distortion: Option<Vec<f64>>,
    /// Lens position relative to the device reference.
    pub pose_translation: Option<Vec<f64>>,
    /// YUV 4:2:0 output sizes as `[width, height]`.
    pub yuv_output_sizes: Vec<[usize; 2]>,
}

impl CameraCharacteristics {
    /// The YUV 4:2:0 output sizes.
    pub fn yuv_sizes(&self) -> Vec<ImageSize> {
        self.yuv_output_sizes.iter().map(|&s| s.into()).collect()
    }
}

/// Read access to the cameras of a device.
pub trait CameraCapabilitySource {
    /// All camera ids in enumeration order.
    fn camera_ids(&self) -> Vec<String>;

    /// Characteristics of a camera, `None` for an unknown id.
    fn characteristics(&self, camera_id: &str) -> Option<CameraCharacteristics>;
}

/// One entry of a [`CapabilityMap`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraDescription {
    /// Camera id.
    pub id: String,
    /// Its characteristics.
    #[serde(flatten)]
    pub characteristics: CameraCharacteristics,
}

/// An in-memory capability source, e.g. a device profile loaded from JSON.
///
/// ```
/// use woundlens_io::calibration::{resolve, CapabilityMap};
///
/// let device: CapabilityMap = serde_json::from_str(r#"{"cameras": [
///     {"id": "0", "logical_multi_camera": true, "physical_camera_ids": ["2", "3"]},
///     {"id": "2", "focal_lengths_mm": [5.4], "sensor_physical_size_mm": {"width": 6.4, "height": 4.8}},
///     {"id": "3", "focal_lengths_mm": [2.2], "sensor_physical_size_mm": {"width": 4.0, "height": 3.0}}
/// ]}"#).unwrap();
///
/// let record = resolve(&device).unwrap();
/// assert_eq!(record.main.id, "2");
/// assert_eq!(record.wide.id, "3");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CapabilityMap {
    /// Cameras in enumeration order.
    pub cameras: Vec<CameraDescription>,
}

impl CapabilityMap {
    /// Append a camera.
    pub fn with_camera(mut self, id: impl Into<String>, characteristics: CameraCharacteristics) -> Self {
        self.cameras.push(CameraDescription {
            id: id.into(),
            characteristics,
        });
        self
    }
}

impl CameraCapabilitySource for CapabilityMap {
    fn camera_ids(&self) -> Vec<String> {
        self.cameras.iter().map(|c| c.id.clone()).collect()
    }

    fn characteristics(&self, camera_id: &str) -> Option<CameraCharacteristics> {
        self.cameras
            .iter()
            .find(|c| c.id == camera_id)
            .map(|c| c.characteristics.clone())
    }
}

/// A physical camera with the characteristics needed for measurement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhysicalCamera {
    /// Physical camera id.
    pub id: String,
    /// Available focal lengths in millimeters, never empty.
    pub focal_lengths_mm: Vec<f64>,
    /// Physical sensor size.
    pub sensor_size_mm: SensorSize,
    /// Reported intrinsics, if any.
    pub intrinsics: Option<CameraIntrinsics>,
    /// Reported `[fx, fy]` in pixels, also kept when the intrinsic array is
    /// too short for [`CameraIntrinsics`].
    pub focal_lengths_px: Option<[f64; 2]>,
    /// Reported distortion coefficients, if any.
    pub distortion: Option<Vec<f64>>,
    /// Reported lens translation, if any.
    pub pose_translation: Option<Vec<f64>>,
}

impl PhysicalCamera {
    fn from_characteristics(
        id: &str,
        characteristics: CameraCharacteristics,
    ) -> Result<Self, CalibrationError> {
        let focal_lengths_mm = characteristics
            .focal_lengths_mm
            .filter(|f| !f.is_empty())
            .ok_or_else(|| CalibrationError::MissingIntrinsics {
                camera_id: id.to_string(),
                field: "focal lengths",
            })?;
        let sensor_size_mm =
            characteristics
                .sensor_physical_size_mm
                .ok_or_else(|| CalibrationError::MissingIntrinsics {
                    camera_id: id.to_string(),
                    field: "sensor physical size",
                })?;

        let reported = characteristics.intrinsic_calibration.as_deref();
        let intrinsics = reported.and_then(|v| {
            let parsed = CameraIntrinsics::from_slice(v);
            if parsed.is_none() {
                log::warn!("incomplete intrinsic calibration of camera {id}: {v:?}");
            }
            parsed
        });
        let focal_lengths_px = reported.and_then(|v| match v {
            [fx, fy, ..] => Some([*fx, *fy]),
            _ => None,
        });

        Ok(Self {
            id: id.to_string(),
            focal_lengths_mm,
            sensor_size_mm,
            intrinsics,
            focal_lengths_px,
            distortion: characteristics.distortion,
            pose_translation: characteristics.pose_translation,
        })
    }

    /// Longest available focal length.
    pub fn max_focal_length_mm(&self) -> f64 {
        self.focal_lengths_mm
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Shortest available focal length.
    pub fn min_focal_length_mm(&self) -> f64 {
        self.focal_lengths_mm
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min)
    }

    /// Pinhole intrinsics for an output of `image_size` pixels derived from
    /// the focal length and the sensor size, principal point at the center.
    pub fn approximate_intrinsics(&self, image_size: ImageSize) -> CameraIntrinsics {
        let focal = self.max_focal_length_mm();
        let (w, h) = (image_size.width as f64, image_size.height as f64);
        CameraIntrinsics {
            fx: focal * w / self.sensor_size_mm.width,
            fy: focal * h / self.sensor_size_mm.height,
            cx: w / 2.0,
            cy: h / 2.0,
            skew: 0.0,
        }
    }

    /// Reported intrinsics, or [`PhysicalCamera::approximate_intrinsics`]
    /// with the reported focal lengths in pixels when only those are known.
    pub fn intrinsics_or_approximate(&self, image_size: ImageSize) -> CameraIntrinsics {
        self.intrinsics.unwrap_or_else(|| {
            let approx = self.approximate_intrinsics(image_size);
            match self.focal_lengths_px {
                Some([fx, fy]) => CameraIntrinsics { fx, fy, ..approx },
                None => approx,
            }
        })
    }
}

/// Geometry of the stereo camera pair of a device.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRecord {
    /// The logical camera streaming both physical cameras.
    pub logical_camera_id: String,
    /// The camera with the longest focal length.
    pub main: PhysicalCamera,
    /// The camera with the shortest focal length.
    pub wide: PhysicalCamera,
    /// Translation between the two lenses, see [`compute_baseline_translation`].
    pub baseline_translation: Option<[f64; 3]>,
    /// Baseline length in millimeters.
    pub baseline_mm: Option<f64>,
}

/// Resolve the stereo geometry of a device.
///
/// The first logical multi-camera in enumeration order is used. Among its
/// physical cameras the one with the longest focal length becomes the main
/// camera and the one with the shortest the wide camera; ties keep the
/// camera enumerated first.
///
/// # Errors
///
/// See [`CalibrationError`].
pub fn resolve<S: CameraCapabilitySource + ?Sized>(
    source: &S,
) -> Result<CalibrationRecord, CalibrationError> {
    let (logical_camera_id, logical) = source
        .camera_ids()
        .into_iter()
        .find_map(|id| {
            source
                .characteristics(&id)
                .filter(|c| c.logical_multi_camera)
                .map(|c| (id, c))
        })
        .ok_or(CalibrationError::NoMultiCameraSupport)?;

    let physical_ids = logical.physical_camera_ids;
    if physical_ids.len() < 2 {
        return Err(CalibrationError::InsufficientPhysicalCameras {
            logical_id: logical_camera_id,
            found: physical_ids.len(),
        });
    }

    let cameras = physical_ids
        .iter()
        .map(|id| {
            let characteristics = source
                .characteristics(id)
                .ok_or_else(|| CalibrationError::UnknownCamera(id.clone()))?;
            PhysicalCamera::from_characteristics(id, characteristics)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let (main, wide) = select_roles(&cameras).ok_or_else(|| {
        CalibrationError::InsufficientPhysicalCameras {
            logical_id: logical_camera_id.clone(),
            found: cameras.len(),
        }
    })?;
    if main.id == wide.id {
        return Err(CalibrationError::AmbiguousCameraRoles(main.id.clone()));
    }

    let baseline_translation = compute_baseline_translation(
        main.pose_translation.as_deref(),
        wide.pose_translation.as_deref(),
    );
    let baseline_mm = baseline_translation.map(|t| {
        let magnitude = (t[0] * t[0] + t[1] * t[1] + t[2] * t[2]).sqrt();
        baseline_magnitude_to_millimeters(magnitude)
    });
    if baseline_mm.is_none() {
        log::warn!("no lens pose translation reported, stereo baseline unknown");
    }

    log::info!(
        "resolved stereo calibration: logical {logical_camera_id}, main {} ({} mm), wide {} ({} mm), baseline {baseline_mm:?} mm",
        main.id,
        main.max_focal_length_mm(),
        wide.id,
        wide.min_focal_length_mm(),
    );

    Ok(CalibrationRecord {
        logical_camera_id,
        main: main.clone(),
        wide: wide.clone(),
        baseline_translation,
        baseline_mm,
    })
}

// (main, wide); strict comparisons keep the first camera on ties
fn select_roles(cameras: &[PhysicalCamera]) -> Option<(&PhysicalCamera, &PhysicalCamera)> {
    let (first, rest) = cameras.split_first()?;
    let mut main = first;
    let mut wide = first;
    for camera in rest {
        if camera.max_focal_length_mm() > main.max_focal_length_mm() {
            main = camera;
        }
        if camera.min_focal_length_mm() < wide.min_focal_length_mm() {
            wide = camera;
        }
    }
    Some((main, wide))
}

/// Translation from the wide lens to the main lens.
///
/// With both translations (at least three components each) this is
/// `main - wide`; with only one, that translation itself. Otherwise `None`.
pub fn compute_baseline_translation(main: Option<&[f64]>, wide: Option<&[f64]>) -> Option<[f64; 3]> {
    let first3 = |t: Option<&[f64]>| match t {
        Some([x, y, z, ..]) => Some([*x, *y, *z]),
        _ => None,
    };

    match (first3(main), first3(wide)) {
        (Some(m), Some(w)) => Some([m[0] - w[0], m[1] - w[1], m[2] - w[2]]),
        (Some(t), None) | (None, Some(t)) => Some(t),
        (None, None) => None,
    }
}

/// Convert a baseline magnitude to millimeters.
///
/// Lens translations are nominally reported in meters, but some devices
/// report millimeters. Magnitudes in `[0, 0.5]` are taken as meters and
/// scaled by 1000, anything else is kept as is.
pub fn baseline_magnitude_to_millimeters(magnitude: f64) -> f64 {
    if (0.0..=METERS_MAGNITUDE_LIMIT).contains(&magnitude) {
        magnitude * 1000.0
    } else {
        magnitude
    }
}

/// Pick the capture size for the stereo streams.
///
/// 1280x720 if offered; otherwise the largest size (by area, then width)
/// within 1920x1080; otherwise the smallest size. `None` if no size is
/// offered.
pub fn select_capture_size(sizes: &[ImageSize]) -> Option<ImageSize> {
    if sizes.contains(&PREFERRED_CAPTURE_SIZE) {
        return Some(PREFERRED_CAPTURE_SIZE);
    }

    let bounded = sizes
        .iter()
        .filter(|s| s.width <= MAX_CAPTURE_SIZE.width && s.height <= MAX_CAPTURE_SIZE.height)
        .fold(None::<ImageSize>, |best, &s| match best {
            Some(b) if (b.area(), b.width) >= (s.area(), s.width) => Some(b),
            _ => Some(s),
        });

    bounded.or_else(|| sizes.iter().copied().min_by_key(|s| s.area()))
}
