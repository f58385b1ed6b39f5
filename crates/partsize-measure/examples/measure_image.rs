use std::{env, error::Error};

use partsize_aruco::builtins;
use partsize_measure::{load_frame, save_frame, MeasureParams, Pipeline};

fn main() -> Result<(), Box<dyn Error>> {
    partsize_core::init_with_level(log::LevelFilter::Info)?;

    let mut args = env::args().skip(1);
    let input = args
        .next()
        .ok_or("usage: measure_image <image> [annotated.png]")?;
    let output = args.next().unwrap_or_else(|| "annotated.png".to_string());

    let frame = load_frame(&input)?;
    let pipeline = Pipeline::new(&MeasureParams::default(), builtins::default_dictionary());
    let processed = pipeline.process(&frame);

    for m in &processed.measurement.measurements {
        println!("#{}: {} x {}", m.contour_index, m.width_label(), m.height_label());
    }
    for issue in &processed.measurement.issues {
        log::warn!("{issue:?}");
    }
    save_frame(&processed.annotated, &output)?;
    log::info!("annotated frame written to {output}");
    Ok(())
}
