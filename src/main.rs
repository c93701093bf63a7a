use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use dicom_roi_viewer::{Orientation, PipelineConfig, Session};

/// Render one slice of a DICOM series, optionally with NIfTI ROI overlays
#[derive(Parser, Debug)]
#[command(name = "dicom-roi-viewer")]
struct CliArgs {
    /// Directory holding the DICOM series
    #[arg(long = "dicom")]
    dicom_dir: PathBuf,

    /// NIfTI ROI label files, drawn in the given order
    #[arg(long = "roi")]
    rois: Vec<PathBuf>,

    /// Viewing plane: axial, coronal or sagittal
    #[arg(long, default_value = "axial")]
    view: String,

    /// Slice index along the viewing axis (defaults to the middle slice)
    #[arg(long)]
    index: Option<usize>,

    /// Window center
    #[arg(long, allow_negative_numbers = true)]
    center: Option<f32>,

    /// Window width
    #[arg(long)]
    width: Option<f32>,

    /// Overlay transparency
    #[arg(long, default_value_t = 0.5)]
    alpha: f32,

    /// Stamp legend colour swatches into the overlay
    #[arg(long)]
    legend: bool,

    /// Output PNG path
    #[arg(long = "out", default_value = "slice.png")]
    output: PathBuf,
}

fn main() -> Result<()> {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init();

    let args = CliArgs::parse();
    let config = PipelineConfig::default()
        .with_overlay_alpha(args.alpha)
        .with_legend_swatches(args.legend);

    let session = Session::load(&args.dicom_dir, args.rois.as_slice(), config)
        .with_context(|| format!("Failed to load {:?}", args.dicom_dir))?;

    let orientation = Orientation::from_view_name(&args.view);
    let index = args
        .index
        .unwrap_or_else(|| session.volume.len_of(orientation) / 2);

    let png = if session.rois.is_empty() {
        session.render_slice(orientation, index, args.center, args.width)?
    } else {
        let window = session.resolve_window(args.center, args.width)?;
        let (png, legend) = session.render_overlay(orientation, index, Some(window))?;
        for entry in &legend {
            let [r, g, b] = entry.color;
            println!("{}: rgb({r:.2}, {g:.2}, {b:.2})", entry.name);
        }
        png
    };

    std::fs::write(&args.output, png)
        .with_context(|| format!("Failed to write {:?}", args.output))?;
    println!(
        "Wrote {} slice {index} to {:?}",
        orientation.name(),
        args.output
    );
    Ok(())
}
