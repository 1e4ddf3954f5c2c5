//! edgefinder: detect edges in an image file, one plane per color channel.
//!
//! Decodes the image once, runs the edge detection pipeline for every
//! requested (color space, method) comparison, prints per-stage diagnostics,
//! and optionally writes the original, every channel edge plane, and the
//! aggregate to PNG files.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin edgefinder -- [OPTIONS] <IMAGE_PATH>
//! cargo run --release --bin edgefinder -- --compare lab:canny --compare hsv:sobel:binary <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use clap::{Parser, ValueEnum};
use edgefinder_pipeline::diagnostics::{self, PipelineDiagnostics, WebClock};
use edgefinder_pipeline::label::{EDGE_KEY, ORIGINAL_KEY};
use edgefinder_pipeline::{
    ColorSpace, DetectConfig, DisplayOptions, EdgeError, EdgeResult, GrayImage, LabelLookup,
    Language, Method, RgbImage, Threshold, Translations,
};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

/// Multi-color-space edge detection.
///
/// Splits the image into the channels of a color space, runs an edge
/// operator on each channel, and combines the results into one edge map.
#[derive(Parser)]
#[command(name = "edgefinder", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Color space to split the image into.
    #[arg(long, value_enum, default_value_t = CLI_DEFAULT_COLOR_SPACE)]
    color_space: Space,

    /// Edge operator applied to every channel.
    #[arg(long, value_enum, default_value_t = CLI_DEFAULT_METHOD)]
    method: Operator,

    /// Lower bound of the magnitude clip range (Canny hysteresis low).
    #[arg(long, default_value_t = Threshold::DEFAULT_LOW)]
    low: u8,

    /// Upper bound of the magnitude clip range (Canny hysteresis high).
    #[arg(long, default_value_t = Threshold::DEFAULT_HIGH)]
    high: u8,

    /// Language of labels and error messages.
    #[arg(long, value_enum, default_value_t = Lang::En)]
    lang: Lang,

    /// Draw saved edge planes as dark lines on white.
    #[arg(long, default_value_t = DisplayOptions::DEFAULT_INVERT, action = clap::ArgAction::Set)]
    invert: bool,

    /// Reduce saved edge planes to pure black and white.
    #[arg(long)]
    binarize: bool,

    /// Directory to write the original and edge planes to as PNG.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Add a comparison, as `SPACE:METHOD` or `SPACE:METHOD:binary`.
    ///
    /// Repeat to run several configurations on the same image. When
    /// given, `--color-space` and `--method` are ignored; `--low` and
    /// `--high` apply to every comparison.
    #[arg(long, value_name = "SPACE:METHOD[:binary]")]
    compare: Vec<CompareSpec>,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,

    /// Full detection config as a JSON string: one `DetectConfig` object or
    /// an array of them, one per comparison.
    ///
    /// When provided, `--color-space`, `--method`, `--low`, `--high` and
    /// `--compare` are ignored.
    #[arg(long)]
    config_json: Option<String>,
}

/// A `--compare` argument before thresholds are attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CompareSpec {
    color_space: ColorSpace,
    method: Method,
    binarize: bool,
}

impl FromStr for CompareSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let (Some(space), Some(method)) = (parts.next(), parts.next()) else {
            return Err(format!("expected SPACE:METHOD[:binary], got {s:?}"));
        };
        let binarize = match parts.next() {
            None => false,
            Some(flag) if flag.eq_ignore_ascii_case("binary") => true,
            Some(flag) => return Err(format!("unknown comparison flag {flag:?}")),
        };
        if parts.next().is_some() {
            return Err(format!("expected SPACE:METHOD[:binary], got {s:?}"));
        }
        Ok(Self {
            color_space: space.parse().map_err(|e: EdgeError| e.to_string())?,
            method: method.parse().map_err(|e: EdgeError| e.to_string())?,
            binarize,
        })
    }
}

/// One configuration to run on the shared image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Comparison {
    config: DetectConfig,
    display: DisplayOptions,
}

/// `--config-json` payload.
#[derive(Deserialize)]
#[serde(untagged)]
enum ConfigJson {
    One(DetectConfig),
    Many(Vec<DetectConfig>),
}

/// Color space selection.
#[derive(Clone, Copy, ValueEnum)]
enum Space {
    Rgb,
    Hsv,
    Lab,
    Cmyk,
}

/// Edge operator selection.
#[derive(Clone, Copy, ValueEnum)]
enum Operator {
    /// 3x3 Sobel gradient.
    Sobel,
    /// 3x3 Prewitt gradient.
    Prewitt,
    /// 3x3 Scharr gradient.
    Scharr,
    /// 2x2 Roberts cross.
    Roberts,
    /// 4-neighbor Laplacian.
    #[value(name = "laplacian-4")]
    Laplacian4,
    /// 8-neighbor Laplacian.
    #[value(name = "laplacian-8")]
    Laplacian8,
    /// 5x5 Laplacian of Gaussian.
    Log,
    /// Blur, Sobel and non-maximum suppression, without hysteresis.
    Canny,
    /// Full Canny with hysteresis.
    CannyBuiltin,
}

/// Label language selection.
#[derive(Clone, Copy, ValueEnum)]
enum Lang {
    En,
    Pl,
}

const fn space_from_pipeline(space: ColorSpace) -> Space {
    match space {
        ColorSpace::Rgb => Space::Rgb,
        ColorSpace::Hsv => Space::Hsv,
        ColorSpace::Lab => Space::Lab,
        ColorSpace::Cmyk => Space::Cmyk,
    }
}

const fn operator_from_pipeline(method: Method) -> Operator {
    match method {
        Method::Sobel => Operator::Sobel,
        Method::Prewitt => Operator::Prewitt,
        Method::Scharr => Operator::Scharr,
        Method::Roberts => Operator::Roberts,
        Method::Laplacian4 => Operator::Laplacian4,
        Method::Laplacian8 => Operator::Laplacian8,
        Method::LaplacianOfGaussian => Operator::Log,
        Method::Canny => Operator::Canny,
        Method::CannyBuiltin => Operator::CannyBuiltin,
    }
}

/// The CLI defaults, derived from [`DetectConfig`] so the two cannot
/// silently diverge.
const CLI_DEFAULT_COLOR_SPACE: Space = space_from_pipeline(DetectConfig::DEFAULT_COLOR_SPACE);
const CLI_DEFAULT_METHOD: Operator = operator_from_pipeline(DetectConfig::DEFAULT_METHOD);

/// Build the list of comparisons from CLI arguments.
///
/// `--config-json` wins over `--compare`, which wins over the single
/// `--color-space`/`--method` pair. `--binarize` turns binarization on for
/// every comparison; a `:binary` suffix turns it on for one.
fn comparisons_from_cli(cli: &Cli) -> Result<Vec<Comparison>, String> {
    let display = DisplayOptions {
        invert: cli.invert,
        binarize: cli.binarize,
    };
    let with_display = |config| Comparison { config, display };

    if let Some(ref json) = cli.config_json {
        let parsed: ConfigJson = serde_json::from_str(json)
            .map_err(|e| format!("Error parsing --config-json: {e}"))?;
        return match parsed {
            ConfigJson::One(config) => Ok(vec![with_display(config)]),
            ConfigJson::Many(configs) if configs.is_empty() => {
                Err("Error parsing --config-json: empty array".to_owned())
            }
            ConfigJson::Many(configs) => Ok(configs.into_iter().map(with_display).collect()),
        };
    }

    let threshold = Threshold::new(cli.low, cli.high);
    if !cli.compare.is_empty() {
        return Ok(cli
            .compare
            .iter()
            .map(|spec| Comparison {
                config: DetectConfig::new(spec.color_space, spec.method, threshold),
                display: DisplayOptions {
                    binarize: display.binarize || spec.binarize,
                    ..display
                },
            })
            .collect());
    }

    let color_space = match cli.color_space {
        Space::Rgb => ColorSpace::Rgb,
        Space::Hsv => ColorSpace::Hsv,
        Space::Lab => ColorSpace::Lab,
        Space::Cmyk => ColorSpace::Cmyk,
    };
    let method = match cli.method {
        Operator::Sobel => Method::Sobel,
        Operator::Prewitt => Method::Prewitt,
        Operator::Scharr => Method::Scharr,
        Operator::Roberts => Method::Roberts,
        Operator::Laplacian4 => Method::Laplacian4,
        Operator::Laplacian8 => Method::Laplacian8,
        Operator::Log => Method::LaplacianOfGaussian,
        Operator::Canny => Method::Canny,
        Operator::CannyBuiltin => Method::CannyBuiltin,
    };
    Ok(vec![with_display(DetectConfig::new(color_space, method, threshold))])
}

/// Output directory for comparison `index` (zero-based) of `count`.
///
/// A single comparison writes straight into `base`; several each get a
/// numbered subdirectory so their files cannot collide.
fn comparison_dir(base: &Path, index: usize, count: usize, config: &DetectConfig) -> PathBuf {
    if count == 1 {
        base.to_path_buf()
    } else {
        base.join(format!(
            "{:02}_{}_{}",
            index + 1,
            config.color_space.name(),
            config.method.name()
        ))
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let labels = Translations::new(match cli.lang {
        Lang::En => Language::English,
        Lang::Pl => Language::Polish,
    });

    let comparisons = match comparisons_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let image: RgbImage = match image::open(&cli.image_path) {
        Ok(decoded) => decoded.to_rgb8(),
        Err(e) => {
            tracing::error!(path = %cli.image_path.display(), error = %e, "failed to decode image");
            eprintln!("{}", labels.label(EdgeError::INVALID_IMAGE_KEY));
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(
        path = %cli.image_path.display(),
        width = image.width(),
        height = image.height(),
        comparisons = comparisons.len(),
        "loaded image"
    );

    let count = comparisons.len();
    let mut all_diagnostics = Vec::with_capacity(count);
    let mut failed = false;

    for (index, comparison) in comparisons.iter().enumerate() {
        let config = &comparison.config;
        if count > 1 {
            eprintln!(
                "--- Comparison {}/{count}: {} {} ---",
                index + 1,
                config.color_space,
                config.method
            );
        }
        tracing::info!(
            color_space = %config.color_space,
            method = %config.method,
            low = config.threshold.low(),
            high = config.threshold.high(),
            binarize = comparison.display.binarize,
            "detecting edges"
        );

        // A failing comparison does not stop the others.
        match diagnostics::detect_edges_with_diagnostics(&image, config, &labels, &WebClock) {
            Ok((result, diagnostics)) => {
                if !cli.json {
                    println!("{}", diagnostics.report());
                }
                if let Some(ref base) = cli.output_dir {
                    let dir = comparison_dir(base, index, count, config);
                    if let Err(msg) =
                        save_planes(&dir, &cli.image_path, &result, comparison.display, &labels)
                    {
                        eprintln!("{msg}");
                        failed = true;
                    }
                }
                all_diagnostics.push(diagnostics);
            }
            Err(e) => {
                tracing::error!(error = %e, "edge detection failed");
                eprintln!("{}", e.localized(&labels));
                failed = true;
            }
        }

        if count > 1 {
            eprintln!();
        }
    }

    if cli.json && let Err(e) = print_json(&all_diagnostics) {
        eprintln!("Error serializing diagnostics: {e}");
        return ExitCode::FAILURE;
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Print one diagnostics object, or an array when there are several.
fn print_json(all_diagnostics: &[PipelineDiagnostics]) -> serde_json::Result<()> {
    let json = match all_diagnostics {
        [single] => serde_json::to_string_pretty(single)?,
        many => serde_json::to_string_pretty(many)?,
    };
    println!("{json}");
    Ok(())
}

/// Lowercase `label` and replace spaces with underscores.
fn file_label(label: &str) -> String {
    label.to_lowercase().replace(' ', "_")
}

/// Write the original and every edge plane of `result` into `dir`.
///
/// Files are named `{stem}_{original}.png`, `{stem}_{edge}_{channel}.png`
/// and `{stem}_{sum}.png`, with the localized labels passed through
/// [`file_label`].
fn save_planes(
    dir: &Path,
    image_path: &Path,
    result: &EdgeResult,
    display: DisplayOptions,
    labels: &dyn LabelLookup,
) -> Result<(), String> {
    std::fs::create_dir_all(dir)
        .map_err(|e| format!("Error creating {}: {e}", dir.display()))?;

    let stem = image_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");

    let original = dir.join(format!(
        "{stem}_{}.png",
        file_label(&labels.label(ORIGINAL_KEY))
    ));
    result
        .preview
        .save(&original)
        .map_err(|e| format!("Error writing {}: {e}", original.display()))?;
    tracing::info!(path = %original.display(), "wrote original");

    let edge = labels.label(EDGE_KEY);
    let channel_count = result.channel_edges.len();
    for (index, (label, plane)) in result.labeled_planes().enumerate() {
        let caption = if index < channel_count {
            format!("{edge} {label}")
        } else {
            label.to_owned()
        };
        let path = dir.join(format!("{stem}_{}.png", file_label(&caption)));
        write_plane(&path, &display.apply(plane))?;
        tracing::info!(path = %path.display(), label = %caption, "wrote edge plane");
    }

    Ok(())
}

fn write_plane(path: &Path, plane: &GrayImage) -> Result<(), String> {
    plane
        .save(path)
        .map_err(|e| format!("Error writing {}: {e}", path.display()))
}
