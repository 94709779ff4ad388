//! Rectify a synthetic photo of a reference marker and measure a wound
//! outline on the rectified image.

use woundlens::geometry::{marker::MarkerCorners, polygon};
use woundlens::image::{Image, LumaPlane};
use woundlens::imgproc::{quality::QualityGate, warp::rectify};

const MARKER_CM: f64 = 5.0;
const RECTIFIED_SIDE: usize = 1000;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // a 1280x720 gray photo with some texture
    let (width, height) = (1280, 720);
    let data: Vec<u8> = (0..width * height)
        .map(|i| (90 + (i % width) % 7 * 12 + (i / width) % 5 * 9) as u8)
        .collect();

    let plane = LumaPlane::packed(&data, width, height);
    let qc = QualityGate::default().evaluate(1.2, -0.8, &plane);
    log::info!("quality gate: {qc:?}");

    let photo = Image::<u8, 1>::new([width, height].into(), data)?;

    // the four marker corners as tapped by the user
    let corners = MarkerCorners::from_taps(&[
        [512.0, 260.0],
        [742.0, 274.0],
        [736.0, 498.0],
        [506.0, 480.0],
    ])?;
    let homography = corners.rectification(RECTIFIED_SIDE)?;
    let rectified = rectify(&photo, &homography, [RECTIFIED_SIDE, RECTIFIED_SIDE].into())?;
    log::info!("rectified to {}", rectified.size());

    // the wound outline traced on the rectified image
    let outline = [
        [310.0, 402.0],
        [520.0, 380.0],
        [640.0, 470.0],
        [590.0, 640.0],
        [360.0, 610.0],
    ];
    let cm_per_px = MarkerCorners::square(RECTIFIED_SIDE)
        .calibration_factor(MARKER_CM)
        .ok_or("degenerate marker")?;
    let area_px = polygon::area_pixels(&outline);
    let area_cm2 = polygon::physical_area_from_linear_factor(area_px, cm_per_px);
    let perimeter_cm = polygon::physical_length(polygon::perimeter_pixels(&outline), cm_per_px);

    println!("wound area: {area_px:.0} px = {area_cm2:.3} cm2, perimeter {perimeter_cm:.2} cm");
    println!("guidance: {:?}", qc.guidance_metrics(0, qc.status()));

    Ok(())
}
