//! Run a stereo capture session against a simulated device.

use std::sync::Arc;
use std::time::Duration;

use woundlens::io::{
    calibration::{CameraCharacteristics, CapabilityMap, SensorSize},
    capture::{CameraBackend, SessionRequest, StereoCaptureBuilder},
    stereo::{CameraRole, PairingConfig, RawFrame, StereoFramePairer},
    CaptureError,
};

const FRAME_INTERVAL_NS: i64 = 33_333_333;

/// Streams synthetic frames from both cameras on a background task.
#[derive(Default)]
struct SimulatedBackend {
    task: Option<tokio::task::JoinHandle<()>>,
}

async fn stream(sink: Arc<StereoFramePairer>, width: usize, height: usize) {
    for k in 0..30 {
        let t = k * FRAME_INTERVAL_NS;
        for (role, jitter) in [(CameraRole::Primary, 0), (CameraRole::Secondary, 2_500_000)] {
            let data = vec![128u8; width * height * 3 / 2];
            sink.submit(RawFrame::new(role, t + jitter, [width, height].into(), data));
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

impl CameraBackend for SimulatedBackend {
    async fn open_session(&mut self, request: SessionRequest) -> Result<(), CaptureError> {
        log::info!(
            "opening {} with {} and {}",
            request.logical_camera_id,
            request.primary_camera_id,
            request.secondary_camera_id
        );
        let size = request.size;
        self.task = Some(tokio::spawn(stream(request.sink, size.width, size.height)));
        Ok(())
    }

    fn close_session(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

fn device() -> CapabilityMap {
    let physical = |focal: f64, pose_x: f64| CameraCharacteristics {
        focal_lengths_mm: Some(vec![focal]),
        sensor_physical_size_mm: Some(SensorSize {
            width: 6.4,
            height: 4.8,
        }),
        pose_translation: Some(vec![pose_x, 0.0, 0.0]),
        ..Default::default()
    };

    CapabilityMap::default()
        .with_camera(
            "0",
            CameraCharacteristics {
                logical_multi_camera: true,
                physical_camera_ids: vec!["2".into(), "3".into()],
                yuv_output_sizes: vec![[1920, 1080], [1280, 720], [640, 480]],
                ..Default::default()
            },
        )
        .with_camera("2", physical(5.6, 0.0))
        .with_camera("3", physical(2.2, -0.013))
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut capture = StereoCaptureBuilder::new(device(), SimulatedBackend::default())
        .pairing(PairingConfig {
            channel_capacity: 32,
            ..Default::default()
        })
        .build();
    let mut pairs = capture.frame_sink().subscribe();

    capture.start().await?;
    if let Some(calibration) = capture.calibration() {
        println!(
            "main {} / wide {}, baseline {:?} mm",
            calibration.main.id, calibration.wide.id, calibration.baseline_mm
        );
    }

    let mut received = 0;
    while let Ok(Some(pair)) = tokio::time::timeout(Duration::from_millis(200), pairs.recv()).await {
        received += 1;
        log::debug!("pair at {} ns, skew {} ns", pair.timestamp_ns, pair.skew_ns());
    }
    println!("received {received} frame pairs");

    capture.stop().await?;
    Ok(())
}
