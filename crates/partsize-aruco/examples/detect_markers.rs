use std::{env, error::Error};

use partsize_aruco::{builtins, MarkerDetector, MarkerDetectorParams};

fn main() -> Result<(), Box<dyn Error>> {
    partsize_core::init_with_level(log::LevelFilter::Info)?;

    let mut args = env::args().skip(1);
    let image_path = args
        .next()
        .ok_or("usage: detect_markers <image> [dictionary]")?;
    let dict_name = args
        .next()
        .unwrap_or_else(|| builtins::PARTSIZE_5X5_50.to_string());

    let dictionary = builtins::require_builtin(&dict_name)?;
    let image = image::open(&image_path)?.to_luma8();
    let detector = MarkerDetector::new(dictionary, MarkerDetectorParams::default());

    let markers = detector.detect(&image);
    log::info!("{}: {} markers", image_path, markers.len());
    println!("{}", serde_json::to_string_pretty(&markers)?);
    Ok(())
}
