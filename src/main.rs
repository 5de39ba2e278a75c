use anyhow::Context;
use clap::Parser;
use image::ImageFormat;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use defectscan::{
    DetectionPipeline, DetectionResult, FileSystemStorage, PersistedImages, StageTrace, StorageKey,
    persist_result,
};

#[derive(Parser)]
#[command(name = "defectscan")]
#[command(about = "Detect and outline surface defects in photographs of parts")]
struct Cli {
    /// Paths to input image files
    #[arg(value_name = "IMAGE", required = true)]
    image_paths: Vec<PathBuf>,

    /// Declared media type (default: inferred from the file extension)
    #[arg(long, value_name = "MIME")]
    content_type: Option<String>,

    /// Persist resized and annotated images into this directory
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// URL prefix reported for persisted images
    #[arg(long, value_name = "URL", default_value = "/media/")]
    base_url: String,

    /// Save intermediate stage images to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Print results as JSON, one object per line
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    image: &'a Path,
    defects_detected: bool,
    #[serde(flatten)]
    result: &'a DetectionResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    stored: Option<&'a PersistedImages>,
}

struct Outcome {
    result: DetectionResult,
    trace: StageTrace,
    stored: Option<PersistedImages>,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_logging(args.verbose);

    if let Some(debug_dir) = &args.debug_out {
        prepare_debug_dir(debug_dir)?;
    }

    let pipeline = DetectionPipeline::new();
    let storage = args
        .out_dir
        .as_ref()
        .map(|dir| FileSystemStorage::new(dir, args.base_url.as_str()));

    // One scoped thread per image; the pipeline holds no mutable state.
    let outcomes: Vec<anyhow::Result<Outcome>> = std::thread::scope(|scope| {
        let handles: Vec<_> = args
            .image_paths
            .iter()
            .map(|path| {
                let pipeline = &pipeline;
                let storage = storage.as_ref();
                let content_type = args.content_type.as_deref();
                scope.spawn(move || process_image(pipeline, storage, path, content_type))
            })
            .collect();

        handles
            .into_iter()
            .map(|h| {
                h.join()
                    .unwrap_or_else(|_| Err(anyhow::anyhow!("worker thread panicked")))
            })
            .collect()
    });

    let mut failures = 0;
    for (idx, (path, outcome)) in args.image_paths.iter().zip(&outcomes).enumerate() {
        match outcome {
            Ok(outcome) => {
                print_outcome(path, outcome, args.json)?;
                if let Some(debug_dir) = &args.debug_out {
                    save_debug_images(debug_dir, idx, outcome)?;
                }
            }
            Err(e) => {
                failures += 1;
                let detail = format!("{:#}", e);
                tracing::warn!(image = %path.display(), error = %detail, "detection failed");
                let message = e
                    .downcast_ref::<defectscan::DetectError>()
                    .map(|d| d.user_message().to_string())
                    .unwrap_or_else(|| format!("{:#}", e));
                eprintln!("{}: {}", path.display(), message);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} images failed", failures, args.image_paths.len());
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn process_image(
    pipeline: &DetectionPipeline,
    storage: Option<&FileSystemStorage>,
    path: &Path,
    content_type: Option<&str>,
) -> anyhow::Result<Outcome> {
    let content_type = content_type
        .map(str::to_string)
        .unwrap_or_else(|| infer_content_type(path));

    tracing::debug!(image = %path.display(), %content_type, "loading image");
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;

    let (result, trace) = pipeline.detect_traced(&bytes, &content_type)?;

    let stored = match storage {
        Some(storage) => {
            let key = StorageKey::generate();
            Some(persist_result(storage, &key, &result).context("failed to store output images")?)
        }
        None => None,
    };

    Ok(Outcome {
        result,
        trace,
        stored,
    })
}

fn infer_content_type(path: &Path) -> String {
    ImageFormat::from_path(path)
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|_| "application/octet-stream".to_string())
}

fn print_outcome(path: &Path, outcome: &Outcome, json: bool) -> anyhow::Result<()> {
    let result = &outcome.result;

    if json {
        let report = Report {
            image: path,
            defects_detected: result.has_defects(),
            result,
            stored: outcome.stored.as_ref(),
        };
        println!("{}", serde_json::to_string(&report)?);
        return Ok(());
    }

    println!("\n=== {} ===", path.display());
    if result.has_defects() {
        println!("Defects detected:");
        for summary in &result.summaries {
            println!("  {}", summary);
        }
    } else {
        println!("No defects detected.");
    }

    if let Some(stored) = &outcome.stored {
        println!("Resized image:   {}", stored.resized.url);
        println!("Processed image: {}", stored.processed.url);
    }

    Ok(())
}

/// The directory must be empty or non-existent
fn prepare_debug_dir(output_dir: &Path) -> anyhow::Result<()> {
    if output_dir.exists() {
        let entries = std::fs::read_dir(output_dir)?;
        if entries.count() > 0 {
            anyhow::bail!("Debug directory is not empty: {}", output_dir.display());
        }
    } else {
        std::fs::create_dir_all(output_dir)?;
    }
    Ok(())
}

/// Stage directories are numbered in pipeline order; files inside them are
/// numbered by input position.
fn save_debug_images(output_dir: &Path, index: usize, outcome: &Outcome) -> anyhow::Result<()> {
    let filename = format!("{:02}.png", index + 1);
    let trace = &outcome.trace;

    let stages: [(&str, image::DynamicImage); 5] = [
        ("01_normalize", outcome.result.normalized.clone().into()),
        ("02_grayscale", trace.grayscale.clone().into()),
        ("03_threshold", trace.mask.as_gray().clone().into()),
        ("04_morphology", trace.refined.as_gray().clone().into()),
        ("05_annotate", outcome.result.annotated.clone().into()),
    ];

    for (stage, img) in stages {
        let stage_dir = output_dir.join(stage);
        std::fs::create_dir_all(&stage_dir)?;
        img.save(stage_dir.join(&filename))
            .map_err(|e| anyhow::anyhow!("Failed to save debug image: {}", e))?;
    }

    tracing::debug!(
        dir = %output_dir.display(),
        contours = trace.contour_count,
        "saved debug images"
    );
    Ok(())
}
