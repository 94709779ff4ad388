use std::future::Future;
use std::sync::Arc;

use woundlens_image::ImageSize;

use crate::{
    calibration::{resolve, select_capture_size, CalibrationRecord, CameraCapabilitySource},
    error::CaptureError,
    stereo::{PairingConfig, StereoFramePairer},
};

/// What the backend needs to stream both physical cameras.
#[derive(Clone)]
pub struct SessionRequest {
    /// The logical camera to open.
    pub logical_camera_id: String,
    /// Physical camera routed to the primary stream.
    pub primary_camera_id: String,
    /// Physical camera routed to the secondary stream.
    pub secondary_camera_id: String,
    /// YUV 4:2:0 output size of both streams.
    pub size: ImageSize,
    /// Where the backend submits its frames.
    pub sink: Arc<StereoFramePairer>,
}

/// The platform camera stack driving a stereo session.
pub trait CameraBackend {
    /// Open the logical camera and start streaming both physical cameras
    /// into `request.sink`.
    fn open_session(
        &mut self,
        request: SessionRequest,
    ) -> impl Future<Output = Result<(), CaptureError>> + Send;

    /// Stop streaming and release all camera resources.
    ///
    /// Called after a failed open as well, so it must tolerate a partially
    /// opened or closed session.
    fn close_session(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SessionState {
    Stopped,
    // open requested, not yet confirmed by the backend
    Opening,
    Running,
}

/// A stereo capture session over the two physical cameras of a device.
///
/// ```no_run
/// # async fn run<S, B>(source: S, backend: B) -> Result<(), woundlens_io::CaptureError>
/// # where S: woundlens_io::calibration::CameraCapabilitySource, B: woundlens_io::capture::CameraBackend {
/// use woundlens_io::capture::StereoCaptureBuilder;
///
/// let mut capture = StereoCaptureBuilder::new(source, backend).build();
/// let mut pairs = capture.frame_sink().subscribe();
///
/// capture.start().await?;
/// while let Some(pair) = pairs.recv().await {
///     println!("pair at {} ns", pair.timestamp_ns);
/// }
/// capture.stop().await
/// # }
/// ```
pub struct StereoCapture<S, B: CameraBackend> {
    source: S,
    backend: B,
    pairer: Arc<StereoFramePairer>,
    calibration: Option<CalibrationRecord>,
    capture_size: Option<ImageSize>,
    state: SessionState,
}

impl<S, B> StereoCapture<S, B>
where
    S: CameraCapabilitySource,
    B: CameraBackend,
{
    /// Create a stopped session with the default pairing configuration.
    pub fn new(source: S, backend: B) -> Self {
        StereoCaptureBuilder::new(source, backend).build()
    }

    /// Start streaming; does nothing if already started.
    ///
    /// Resolves the device calibration, picks the capture size and opens the
    /// backend session. On failure everything opened so far is released.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Calibration`] for an unsupported device,
    /// [`CaptureError::NoSuitableCaptureSize`] if the logical camera has no
    /// YUV output, or the backend error.
    pub async fn start(&mut self) -> Result<(), CaptureError> {
        if self.state == SessionState::Running {
            return Ok(());
        }

        match self.open().await {
            Ok(size) => {
                self.state = SessionState::Running;
                log::info!("stereo capture started at {size}");
                Ok(())
            }
            Err(err) => {
                log::warn!("stereo capture failed to start: {err}");
                self.release();
                Err(err)
            }
        }
    }

    async fn open(&mut self) -> Result<ImageSize, CaptureError> {
        let calibration = resolve(&self.source)?;

        let sizes = self
            .source
            .characteristics(&calibration.logical_camera_id)
            .map(|c| c.yuv_sizes())
            .unwrap_or_default();
        let size = select_capture_size(&sizes).ok_or_else(|| {
            CaptureError::NoSuitableCaptureSize(calibration.logical_camera_id.clone())
        })?;

        let request = SessionRequest {
            logical_camera_id: calibration.logical_camera_id.clone(),
            primary_camera_id: calibration.main.id.clone(),
            secondary_camera_id: calibration.wide.id.clone(),
            size,
            sink: self.pairer.clone(),
        };
        self.state = SessionState::Opening;
        self.backend.open_session(request).await?;

        self.calibration = Some(calibration);
        self.capture_size = Some(size);
        Ok(size)
    }

    /// Stop streaming and discard buffered frames.
    ///
    /// Safe to call on a stopped session. Also releases a session whose
    /// [`StereoCapture::start`] was abandoned before it completed.
    pub async fn stop(&mut self) -> Result<(), CaptureError> {
        if self.state != SessionState::Stopped {
            self.release();
            log::info!("stereo capture stopped");
        }
        Ok(())
    }

    fn release(&mut self) {
        self.backend.close_session();
        self.pairer.clear();
        self.capture_size = None;
        self.state = SessionState::Stopped;
    }

    /// Whether the session is streaming.
    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    /// The pairer receiving the frames of both cameras.
    pub fn frame_sink(&self) -> Arc<StereoFramePairer> {
        self.pairer.clone()
    }

    /// Calibration resolved by the last successful [`StereoCapture::start`].
    pub fn calibration(&self) -> Option<&CalibrationRecord> {
        self.calibration.as_ref()
    }

    /// Capture size of the running session.
    pub fn capture_size(&self) -> Option<ImageSize> {
        self.capture_size
    }
}

impl<S, B: CameraBackend> Drop for StereoCapture<S, B> {
    fn drop(&mut self) {
        if self.state != SessionState::Stopped {
            self.backend.close_session();
            self.pairer.clear();
            self.state = SessionState::Stopped;
        }
    }
}

/// A builder for creating a [`StereoCapture`].
pub struct StereoCaptureBuilder<S, B> {
    source: S,
    backend: B,
    pairing: PairingConfig,
}

impl<S, B> StereoCaptureBuilder<S, B>
where
    S: CameraCapabilitySource,
    B: CameraBackend,
{
    /// Start from a capability source and a camera backend.
    pub fn new(source: S, backend: B) -> Self {
        Self {
            source,
            backend,
            pairing: PairingConfig::default(),
        }
    }

    /// Set the frame pairing parameters.
    pub fn pairing(mut self, config: PairingConfig) -> Self {
        self.pairing = config;
        self
    }

    /// Create the stopped session.
    pub fn build(self) -> StereoCapture<S, B> {
        StereoCapture {
            source: self.source,
            backend: self.backend,
            pairer: Arc::new(StereoFramePairer::new(self.pairing)),
            calibration: None,
            capture_size: None,
            state: SessionState::Stopped,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::calibration::{CameraCharacteristics, CapabilityMap, SensorSize};
    use crate::stereo::{CameraRole, RawFrame};
    use crate::CalibrationError;

    #[derive(Default)]
    struct BackendLog {
        opened: Vec<(String, String, String, ImageSize)>,
        closed: usize,
    }

    #[derive(Clone, Copy)]
    enum OpenOutcome {
        Succeed,
        Fail,
        Hang,
    }

    struct FakeBackend {
        log: Arc<Mutex<BackendLog>>,
        outcome: OpenOutcome,
    }

    impl CameraBackend for FakeBackend {
        async fn open_session(&mut self, request: SessionRequest) -> Result<(), CaptureError> {
            if let OpenOutcome::Fail = self.outcome {
                return Err(CaptureError::SessionFailed("configuration failed".to_string()));
            }
            self.log.lock().unwrap().opened.push((
                request.logical_camera_id,
                request.primary_camera_id,
                request.secondary_camera_id,
                request.size,
            ));
            if let OpenOutcome::Hang = self.outcome {
                std::future::pending::<()>().await;
            }
            Ok(())
        }

        fn close_session(&mut self) {
            self.log.lock().unwrap().closed += 1;
        }
    }

    fn physical(focal: f64) -> CameraCharacteristics {
        CameraCharacteristics {
            focal_lengths_mm: Some(vec![focal]),
            sensor_physical_size_mm: Some(SensorSize {
                width: 6.0,
                height: 4.5,
            }),
            ..Default::default()
        }
    }

    fn device(sizes: Vec<[usize; 2]>) -> CapabilityMap {
        CapabilityMap::default()
            .with_camera(
                "0",
                CameraCharacteristics {
                    logical_multi_camera: true,
                    physical_camera_ids: vec!["wide".into(), "main".into()],
                    yuv_output_sizes: sizes,
                    ..Default::default()
                },
            )
            .with_camera("wide", physical(2.0))
            .with_camera("main", physical(6.0))
    }

    fn capture(
        device: CapabilityMap,
        outcome: OpenOutcome,
    ) -> (StereoCapture<CapabilityMap, FakeBackend>, Arc<Mutex<BackendLog>>) {
        let log = Arc::new(Mutex::new(BackendLog::default()));
        let backend = FakeBackend {
            log: log.clone(),
            outcome,
        };
        (StereoCapture::new(device, backend), log)
    }

    #[tokio::test]
    async fn start_opens_session_once() -> Result<(), CaptureError> {
        let (mut capture, log) = capture(
            device(vec![[1920, 1080], [1280, 720]]),
            OpenOutcome::Succeed,
        );

        capture.start().await?;
        capture.start().await?;

        assert!(capture.is_running());
        assert_eq!(capture.capture_size(), Some([1280, 720].into()));
        assert_eq!(capture.calibration().map(|c| c.main.id.as_str()), Some("main"));

        let log = log.lock().unwrap();
        assert_eq!(
            log.opened,
            vec![(
                "0".to_string(),
                "main".to_string(),
                "wide".to_string(),
                ImageSize {
                    width: 1280,
                    height: 720
                }
            )]
        );
        assert_eq!(log.closed, 0);
        Ok(())
    }

    #[tokio::test]
    async fn stop_is_idempotent_and_clears_frames() -> Result<(), CaptureError> {
        let (mut capture, log) = capture(device(vec![[640, 480]]), OpenOutcome::Succeed);
        capture.stop().await?;
        assert_eq!(log.lock().unwrap().closed, 0);

        capture.start().await?;
        let sink = capture.frame_sink();
        sink.submit(RawFrame::new(CameraRole::Primary, 0, [2, 2].into(), vec![0; 6]));
        assert_eq!(sink.buffered(CameraRole::Primary), 1);

        capture.stop().await?;
        capture.stop().await?;
        assert!(!capture.is_running());
        assert_eq!(sink.buffered(CameraRole::Primary), 0);
        assert_eq!(log.lock().unwrap().closed, 1);
        Ok(())
    }

    #[tokio::test]
    async fn failed_open_releases_resources() {
        let (mut capture, log) = capture(device(vec![[1280, 720]]), OpenOutcome::Fail);

        let err = capture.start().await;
        assert!(matches!(err, Err(CaptureError::SessionFailed(_))));
        assert!(!capture.is_running());
        assert_eq!(log.lock().unwrap().closed, 1);
    }

    #[tokio::test]
    async fn no_yuv_sizes() {
        let (mut capture, log) = capture(device(vec![]), OpenOutcome::Succeed);

        let err = capture.start().await;
        assert!(matches!(err, Err(CaptureError::NoSuitableCaptureSize(id)) if id == "0"));
        assert!(log.lock().unwrap().opened.is_empty());
    }

    #[tokio::test]
    async fn unsupported_device() {
        let (mut capture, _) = capture(CapabilityMap::default(), OpenOutcome::Succeed);
        assert!(matches!(
            capture.start().await,
            Err(CaptureError::Calibration(CalibrationError::NoMultiCameraSupport))
        ));
        assert!(capture.calibration().is_none());
    }

    #[tokio::test]
    async fn drop_closes_running_session() -> Result<(), CaptureError> {
        let (mut capture, log) = capture(device(vec![[1280, 720]]), OpenOutcome::Succeed);
        capture.start().await?;
        drop(capture);
        assert_eq!(log.lock().unwrap().closed, 1);
        Ok(())
    }

    #[tokio::test]
    async fn abandoned_start_is_released_by_stop() -> Result<(), CaptureError> {
        let (mut capture, log) = capture(device(vec![[1280, 720]]), OpenOutcome::Hang);

        let started = tokio::time::timeout(Duration::from_millis(20), capture.start()).await;
        assert!(started.is_err());
        assert!(!capture.is_running());
        assert_eq!(log.lock().unwrap().opened.len(), 1);

        capture.stop().await?;
        assert_eq!(log.lock().unwrap().closed, 1);

        drop(capture);
        assert_eq!(log.lock().unwrap().closed, 1);
        Ok(())
    }

    #[tokio::test]
    async fn abandoned_start_is_released_on_drop() {
        let (mut capture, log) = capture(device(vec![[1280, 720]]), OpenOutcome::Hang);

        let started = tokio::time::timeout(Duration::from_millis(20), capture.start()).await;
        assert!(started.is_err());

        drop(capture);
        assert_eq!(log.lock().unwrap().closed, 1);
    }
}
