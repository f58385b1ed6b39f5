//! partsize CLI: measure objects next to a printed marker, print markers,
//! inspect dictionaries.

use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use partsize::aruco::{builtins, Dictionary};
use partsize::measure::FileFrameSource;
use partsize::print::{render_for_print, MarkerPrintSpec};
use partsize::process::process_source;
use partsize::{DictionarySource, FrameReport, MeasureConfig, MeasureReport};
use std::path::PathBuf;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "partsize")]
#[command(about = "Measure objects in photos using a printed square reference marker")]
#[command(version)]
struct Cli {
    /// Log level: off, error, warn, info, debug or trace.
    #[arg(long, global = true, default_value = "info")]
    log_level: LevelFilter,

    /// Emit JSON log lines instead of text.
    #[cfg(feature = "tracing")]
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure the objects in one or more images.
    Measure(MeasureArgs),

    /// Render a marker as a PNG sized for printing.
    PrintMarker(PrintMarkerArgs),

    /// Print dictionary statistics.
    DictionaryInfo(DictionaryArgs),

    /// Write a built-in dictionary to a JSON file.
    ExportDictionary {
        /// Built-in dictionary name.
        #[arg(long)]
        builtin: String,

        /// Output JSON path.
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Debug, Clone, Args)]
struct DictionaryArgs {
    /// Dictionary JSON file (native `codes` or an OpenCV `bits`/`bytes` export).
    #[arg(long, conflicts_with = "builtin")]
    dictionary: Option<PathBuf>,

    /// Built-in dictionary name.
    #[arg(long)]
    builtin: Option<String>,
}

impl DictionaryArgs {
    fn source(&self) -> Option<DictionarySource> {
        match (&self.dictionary, &self.builtin) {
            (Some(path), _) => Some(DictionarySource::File(path.clone())),
            (None, Some(name)) => Some(DictionarySource::Builtin(name.clone())),
            (None, None) => None,
        }
    }

    fn load(&self) -> CliResult<Dictionary> {
        Ok(self.source().unwrap_or_default().load()?)
    }
}

#[derive(Debug, Clone, Args)]
struct MeasureArgs {
    /// Input images; each one is measured independently.
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Measurement config (JSON). Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    dictionary: DictionaryArgs,

    /// Side of the printed marker's black square, in centimeters.
    #[arg(long)]
    marker_side_cm: Option<f64>,

    /// Minimum object area in pixels.
    #[arg(long)]
    min_area: Option<f64>,

    /// Skip contours whose centroid lies inside the marker.
    #[arg(long)]
    exclude_marker: bool,

    /// Directory for annotated images (`<stem>_measured.png`).
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Path to write the JSON report.
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct PrintMarkerArgs {
    /// Marker id within the dictionary.
    #[arg(long)]
    id: u32,

    /// Side of the black square on paper, in centimeters.
    #[arg(long, default_value = "5.0")]
    side_cm: f64,

    /// Printer resolution.
    #[arg(long, default_value = "300")]
    dpi: u32,

    /// White margin around the marker, in cells.
    #[arg(long, default_value = "1")]
    quiet_zone_bits: usize,

    #[command(flatten)]
    dictionary: DictionaryArgs,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    match cli.command {
        Commands::Measure(args) => run_measure(&args),
        Commands::PrintMarker(args) => run_print_marker(&args),
        Commands::DictionaryInfo(args) => run_dictionary_info(&args),
        Commands::ExportDictionary { builtin, out } => run_export_dictionary(&builtin, &out),
    }
}

#[cfg(not(feature = "tracing"))]
fn init_logging(cli: &Cli) -> CliResult<()> {
    partsize::core::init_with_level(cli.log_level)?;
    Ok(())
}

#[cfg(feature = "tracing")]
fn init_logging(cli: &Cli) -> CliResult<()> {
    // Ignore errors if a logger was already installed.
    let _ = tracing_log::LogTracer::init();
    log::set_max_level(cli.log_level);
    partsize::core::init_tracing(cli.log_json);
    Ok(())
}

// ── measure ───────────────────────────────────────────────────────────

fn run_measure(args: &MeasureArgs) -> CliResult<()> {
    let mut config = match &args.config {
        Some(path) => MeasureConfig::load_json(path)?,
        None => MeasureConfig::default(),
    };
    if let Some(source) = args.dictionary.source() {
        config.dictionary = source;
    }
    if let Some(side) = args.marker_side_cm {
        config.params.marker.side_cm = side;
    }
    if let Some(area) = args.min_area {
        config.params.segment.min_area_px = area;
    }
    if args.exclude_marker {
        config.params.exclude_marker = true;
    }

    let pipeline = config.build_pipeline()?;
    if let Some(dir) = &args.out_dir {
        std::fs::create_dir_all(dir)?;
    }

    let mut source = FileFrameSource::new(args.images.iter().cloned());
    let frames = process_source(&pipeline, &mut source, args.out_dir.as_deref());
    for frame in &frames {
        print_frame(frame);
    }

    let failed = frames.iter().filter(|f| f.error.is_some()).count();
    let total = frames.len();
    if let Some(path) = &args.report {
        let dictionary = match &config.dictionary {
            DictionarySource::Builtin(name) => name.clone(),
            DictionarySource::File(path) => path.display().to_string(),
        };
        let report = MeasureReport {
            dictionary,
            marker_side_cm: config.params.marker.side_cm,
            frames,
        };
        report.write_json(path)?;
        log::info!("report written to {}", path.display());
    }

    if failed > 0 {
        return Err(format!("{failed} of {total} image(s) could not be processed").into());
    }
    Ok(())
}

fn print_frame(frame: &FrameReport) {
    if let Some(err) = &frame.error {
        println!("{}: error: {err}", frame.source);
        if frame.size.is_none() {
            return;
        }
    }
    match (&frame.marker, frame.px_per_cm) {
        (Some(m), Some(ratio)) => println!(
            "{}: marker {} ({ratio:.2} px/cm), {} object(s)",
            frame.source,
            m.id,
            frame.measurements.len()
        ),
        _ => println!("{}: no dimensions: {:?}", frame.source, frame.issues),
    }
    for m in &frame.measurements {
        println!(
            "  #{} at ({:.0}, {:.0}): {}, {}",
            m.contour_index,
            m.center.x,
            m.center.y,
            m.width_label(),
            m.height_label()
        );
    }
}

// ── print-marker ──────────────────────────────────────────────────────

fn run_print_marker(args: &PrintMarkerArgs) -> CliResult<()> {
    let dict = args.dictionary.load()?;
    let spec = MarkerPrintSpec {
        id: args.id,
        side_cm: args.side_cm,
        dpi: args.dpi,
        quiet_zone_bits: args.quiet_zone_bits,
        ..MarkerPrintSpec::default()
    };
    let marker = render_for_print(&dict, &spec)?;
    marker.write_png(&args.out)?;
    println!(
        "wrote marker {} of {} ({:.2} cm at {} dpi) to {}",
        args.id,
        dict.name,
        marker.side_cm(),
        marker.dpi,
        args.out.display()
    );
    Ok(())
}

// ── dictionary-info ───────────────────────────────────────────────────

fn run_dictionary_info(args: &DictionaryArgs) -> CliResult<()> {
    let dict = args.load()?;

    println!("dictionary {}", dict.name);
    println!("  marker size:          {0}x{0} bits", dict.marker_size);
    println!("  markers:              {}", dict.len());
    println!("  correctable bits:     {}", dict.max_correction_bits);
    match dict.min_distance() {
        Some(d) => println!("  min rotational dist:  {d}"),
        None => println!("  min rotational dist:  n/a"),
    }
    if let (Some(first), Some(last)) = (dict.codes.first(), dict.codes.last()) {
        println!("  first code:           0x{first:X}");
        println!("  last code:            0x{last:X}");
    }
    if args.source().is_none() {
        let names: Vec<&str> = builtins::builtin_names().collect();
        println!("built-in dictionaries: {}", names.join(", "));
    }
    Ok(())
}

// ── export-dictionary ─────────────────────────────────────────────────

fn run_export_dictionary(name: &str, out: &std::path::Path) -> CliResult<()> {
    let dict = builtins::require_builtin(name)?;
    dict.write_json(out)?;
    println!(
        "wrote {} ({} markers) to {}",
        dict.name,
        dict.len(),
        out.display()
    );
    Ok(())
}
