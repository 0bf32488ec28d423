// ============================================================================
// paintcore CLI — headless canvas processing via command-line arguments
// ============================================================================
//
// Usage examples:
//   paintcore --new 800x600 --output blank.png
//   paintcore -i photo.jpg -o out.png                  (format inferred from output ext)
//   paintcore -i "*.jpg" --resize 1024x768 --output-dir processed/ --format png
//   paintcore -i scan.bmp -o scan.jpg --quality 85
//
// All processing runs synchronously on the current thread.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use crate::canvas::Document;
use crate::io::{load_image, save_image, SaveFormat};
use crate::log_info;

/// Canvas dimension ceiling enforced at the host boundary. The buffer itself
/// accepts any positive size; user-supplied sizes are bounded here.
pub const MAX_CANVAS_EDGE: u32 = 4000;

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// paintcore headless canvas processor.
///
/// Create blank canvases, convert between formats and resize images without
/// a GUI.
#[derive(Parser, Debug)]
#[command(
    name = "paintcore",
    about = "paintcore headless canvas processor",
    long_about = "Create blank canvases, resize images and convert between\n\
                  formats without opening a GUI. Supports PNG, JPEG and BMP.\n\n\
                  Example:\n  \
                  paintcore --new 800x600 --output blank.png\n  \
                  paintcore -i \"*.jpg\" --resize 1024x768 --output-dir out/ --format png"
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "*.png", "shots/*.jpg").
    #[arg(short, long, num_args = 1.., conflicts_with = "new")]
    pub input: Vec<String>,

    /// Create a blank white canvas instead of opening a file, e.g. "800x600".
    /// Each edge must be 1..=4000.
    #[arg(long, value_name = "WxH")]
    pub new: Option<String>,

    /// Resize the canvas to "WxH" before saving. Content is kept top-left
    /// aligned; grown area is white. Each edge must be 1..=4000.
    #[arg(short, long, value_name = "WxH")]
    pub resize: Option<String>,

    /// Output file path. Only valid for single-file input.
    /// For batch input use --output-dir instead.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing.
    /// Files are written here with the original stem and the target format's extension.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output format: png, jpeg, bmp.
    /// When omitted, the format is inferred from --output's extension, defaulting to png.
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// JPEG quality (1-100, default 90).
    #[arg(short, long, default_value_t = 90, value_name = "1-100")]
    pub quality: u8,

    /// Print per-file timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = everything succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs) -> ExitCode {
    let save_format = parse_format(args.format.as_deref(), args.output.as_deref());

    let resize_to = match args.resize.as_deref().map(parse_dimensions).transpose() {
        Ok(dims) => dims,
        Err(e) => {
            eprintln!("error: invalid --resize value: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // -- Blank canvas mode -----------------------------------------------
    if let Some(spec) = &args.new {
        return run_new(spec, resize_to, &args, save_format);
    }

    // -- File mode ---------------------------------------------------------
    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s), and no --new size given.");
        return ExitCode::FAILURE;
    }

    // Multiple inputs require --output-dir, not --output
    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch processing.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    // Create output directory if specified
    if let Some(dir) = &args.output_dir
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        eprintln!("error: could not create output directory '{}': {}", dir.display(), e);
        return ExitCode::FAILURE;
    }

    let total = inputs.len();
    let multi = total > 1;
    let mut any_failure = false;

    for (idx, input_path) in inputs.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }

        let file_start = Instant::now();

        let output_path = match build_output_path(
            input_path,
            args.output.as_deref(),
            args.output_dir.as_deref(),
            save_format,
        ) {
            Some(p) => p,
            None => {
                eprintln!("  error: cannot determine output path for '{}'.", input_path.display());
                any_failure = true;
                continue;
            }
        };

        match run_one(input_path, &output_path, resize_to, save_format, args.quality) {
            Ok(()) => {
                if args.verbose || multi {
                    println!(
                        "  → {} ({:.0}ms)",
                        output_path.display(),
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                eprintln!("  error: {}", e);
                crate::log_err!("{}: {}", input_path.display(), e);
                any_failure = true;
            }
        }
    }

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

// ============================================================================
// Processing pipelines
// ============================================================================

/// `--new WxH`: create a blank canvas and save it.
fn run_new(
    spec: &str,
    resize_to: Option<(u32, u32)>,
    args: &CliArgs,
    format: SaveFormat,
) -> ExitCode {
    let (w, h) = match parse_dimensions(spec) {
        Ok(dims) => dims,
        Err(e) => {
            eprintln!("error: invalid --new value: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let Some(output) = args.output.as_deref() else {
        eprintln!("error: --new requires --output.");
        return ExitCode::FAILURE;
    };

    let mut doc = match Document::new(w, h) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some((rw, rh)) = resize_to
        && let Err(e) = doc.resize(rw, rh)
    {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    if let Err(e) = save_image(&doc.buffer, output, format, args.quality) {
        eprintln!("error: save failed: {}", e);
        return ExitCode::FAILURE;
    }

    log_info!("created {}x{} canvas at {}", w, h, output.display());
    if args.verbose {
        println!("created {}x{} canvas → {}", w, h, output.display());
    }
    ExitCode::SUCCESS
}

/// Load → optional resize → save, for one input file.
fn run_one(
    input: &Path,
    output: &Path,
    resize_to: Option<(u32, u32)>,
    format: SaveFormat,
    quality: u8,
) -> Result<(), String> {
    let buffer = load_image(input).map_err(|e| format!("load failed: {}", e))?;
    let mut doc = Document::from_buffer(buffer, Some(input.to_path_buf()));

    if let Some((w, h)) = resize_to {
        doc.resize(w, h).map_err(|e| e.to_string())?;
    }

    save_image(&doc.buffer, output, format, quality).map_err(|e| format!("save failed: {}", e))?;
    log_info!("{} → {}", input.display(), output.display());
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Parse a "WxH" dimension spec and apply the host-side ceiling.
fn parse_dimensions(spec: &str) -> Result<(u32, u32), String> {
    let (w_str, h_str) = spec
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("'{}' is not of the form WxH", spec))?;
    let w: u32 = w_str.trim().parse().map_err(|_| format!("bad width '{}'", w_str))?;
    let h: u32 = h_str.trim().parse().map_err(|_| format!("bad height '{}'", h_str))?;
    if w == 0 || h == 0 || w > MAX_CANVAS_EDGE || h > MAX_CANVAS_EDGE {
        return Err(format!("dimensions must be 1..={} per edge, got {}x{}", MAX_CANVAS_EDGE, w, h));
    }
    Ok((w, h))
}

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            // Literal path — use directly
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        // Treat as glob pattern
        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    eprintln!("warning: pattern '{}' matched no files.", pattern);
                }
            }
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// Choose the [`SaveFormat`] from the `--format` string or infer it from the
/// output file extension. Defaults to PNG when neither is known.
fn parse_format(format_arg: Option<&str>, output: Option<&Path>) -> SaveFormat {
    if let Some(f) = format_arg {
        return SaveFormat::from_extension(f).unwrap_or(SaveFormat::Png);
    }

    if let Some(out) = output {
        let ext = out.extension().and_then(|e| e.to_str()).unwrap_or("");
        return SaveFormat::from_extension(ext).unwrap_or(SaveFormat::Png);
    }

    SaveFormat::Png
}

/// Compute the output path for a single input file.
///
/// Priority:
/// 1. `--output` (explicit path, used for single-file input)
/// 2. `--output-dir` (batch directory, derives filename from input stem)
/// 3. Fallback: same directory as input, same stem, new extension
///    (appends `_out` to stem if it would collide with the input path)
fn build_output_path(
    input: &Path,
    output: Option<&Path>,
    output_dir: Option<&Path>,
    format: SaveFormat,
) -> Option<PathBuf> {
    // Explicit output path
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    let ext = format.extension();
    let stem = input.file_stem()?.to_string_lossy().into_owned();

    if let Some(dir) = output_dir {
        return Some(dir.join(format!("{}.{}", stem, ext)));
    }

    // Write next to the input file
    let parent = input.parent().unwrap_or(Path::new("."));
    let candidate = parent.join(format!("{}.{}", stem, ext));

    // Avoid silent overwrite of the input
    if candidate == input {
        Some(parent.join(format!("{}_out.{}", stem, ext)))
    } else {
        Some(candidate)
    }
}
