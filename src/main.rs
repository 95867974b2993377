//! cv-tensor-process CLI - Convert images into tensor payloads.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cv_tensor_process::{load_image, save_tensor, Options, Pipeline};

/// Convert color images into NHWC/NCHW tensor payloads.
#[derive(Parser, Debug)]
#[command(name = "cv-tensor-process")]
#[command(version, about, long_about = None)]
struct Args {
    /// Input image paths.
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,

    /// Directory receiving `<stem>.bin` payloads and `<stem>.json` descriptors.
    #[arg(short, long, default_value = ".", value_name = "DIR")]
    output_dir: PathBuf,

    /// YAML parameter file (resize_width, resize_height, normalize, tensor_fmt, data_type).
    #[arg(short, long, value_name = "FILE")]
    params: Option<PathBuf>,

    /// Target width in pixels.
    #[arg(long, value_name = "INT", allow_negative_numbers = true)]
    resize_width: Option<i64>,

    /// Target height in pixels.
    #[arg(long, value_name = "INT", allow_negative_numbers = true)]
    resize_height: Option<i64>,

    /// Tensor layout: nhwc or nchw.
    #[arg(long, value_name = "FMT")]
    tensor_fmt: Option<String>,

    /// Element type: uint8, float32 or float64.
    #[arg(long, value_name = "TYPE")]
    data_type: Option<String>,

    /// Keep raw pixel values instead of dividing by 255.
    #[arg(long)]
    no_normalize: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

/// Outcome of a run over all inputs.
struct Summary {
    processed: usize,
    skipped: usize,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("cv_tensor_process={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match run(&args) {
        Ok(summary) if summary.processed > 0 => ExitCode::SUCCESS,
        Ok(summary) => {
            tracing::error!("No image processed ({} skipped)", summary.skipped);
            ExitCode::FAILURE
        }
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Merge the parameter file (if any) with command-line overrides.
fn build_options(args: &Args) -> Result<Options> {
    let mut options = match &args.params {
        Some(path) => Options::from_yaml_file(path)?,
        None => Options::default(),
    };

    if let Some(width) = args.resize_width {
        options.resize_width = width;
    }
    if let Some(height) = args.resize_height {
        options.resize_height = height;
    }
    if let Some(fmt) = &args.tensor_fmt {
        options.tensor_fmt.clone_from(fmt);
    }
    if let Some(data_type) = &args.data_type {
        options.data_type.clone_from(data_type);
    }
    if args.no_normalize {
        options.normalize = false;
    }

    Ok(options)
}

fn run(args: &Args) -> Result<Summary> {
    let options = build_options(args)?;
    let pipeline = Pipeline::from_options(&options).context("Invalid configuration")?;

    fs::create_dir_all(&args.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            args.output_dir.display()
        )
    })?;

    let pb = if args.inputs.len() > 1 {
        let pb = ProgressBar::new(args.inputs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} Converting [{bar:40.cyan/blue}] {pos}/{len}")
                .expect("valid template")
                .progress_chars("#>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut summary = Summary {
        processed: 0,
        skipped: 0,
    };

    let mut stems = HashSet::new();
    for input in &args.inputs {
        let stem = output_stem(input, &mut stems);
        match convert_file(&pipeline, input, &args.output_dir, &stem) {
            Ok(path) => {
                tracing::debug!("{} -> {}", input.display(), path.display());
                summary.processed += 1;
            }
            Err(err) => {
                pb.suspend(|| tracing::error!("Skipping {}: {err}", input.display()));
                summary.skipped += 1;
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();

    tracing::info!(
        "Converted {} image(s) into {}, skipped {}",
        summary.processed,
        args.output_dir.display(),
        summary.skipped
    );

    Ok(summary)
}

/// Pick an output stem for `input` that no earlier input in this run has
/// taken. Repeated stems get `_1`, `_2`, ... appended.
fn output_stem(input: &Path, used: &mut HashSet<String>) -> String {
    let base = input
        .file_stem()
        .map_or_else(|| "image".to_string(), |s| s.to_string_lossy().into_owned());

    let mut stem = base.clone();
    let mut index = 1;
    while !used.insert(stem.clone()) {
        stem = format!("{base}_{index}");
        index += 1;
    }
    stem
}

fn convert_file(
    pipeline: &Pipeline,
    input: &Path,
    output_dir: &Path,
    stem: &str,
) -> cv_tensor_process::Result<PathBuf> {
    let image = load_image(input)?;
    let tensor = pipeline.process(&image.as_raw())?;

    save_tensor(&tensor, output_dir, stem)
}
