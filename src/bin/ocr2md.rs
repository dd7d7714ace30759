//! CLI binary for ocr2md.
//!
//! A thin shim over the library crate that maps CLI flags to `OcrConfig`
//! and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use ocr2md::{
    assemble_with_links, convert, convert_source, export_images, write_atomic,
    ConversionProgressCallback, InputSource, OcrConfig, ProgressCallback,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: a single spinner that walks through the pipeline
/// stages, printing a tick line as each one completes.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_upload_start(&self, file_name: &str, size_bytes: usize) {
        self.bar.set_prefix("Uploading");
        self.bar
            .set_message(format!("{file_name} ({} KiB)", size_bytes / 1024));
    }

    fn on_upload_complete(&self, file_id: &str) {
        self.bar
            .println(format!("  {} uploaded as {}", green("✓"), dim(file_id)));
    }

    fn on_ocr_start(&self, model: &str) {
        self.bar.set_prefix("Converting");
        self.bar.set_message(format!("model {model}"));
    }

    fn on_ocr_complete(&self, page_count: usize) {
        self.bar.println(format!(
            "  {} OCR returned {} page{}",
            green("✓"),
            page_count,
            if page_count == 1 { "" } else { "s" }
        ));
        self.bar.set_prefix("Assembling");
        self.bar.set_message(String::new());
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic conversion (stdout)
  ocr2md scan.pdf

  # Convert to file
  ocr2md scan.pdf -o scan.md

  # Image input
  ocr2md receipt.jpg -o receipt.md

  # Camera snapshot with no usable file name (type from magic bytes)
  ocr2md --kind camera snapshot.tmp

  # Write figures as files next to the Markdown instead of inline base64
  ocr2md paper.pdf -o paper.md --image-dir images

  # Skip figures entirely (placeholders left in the text)
  ocr2md scan.pdf --no-images

  # Structured JSON output (pages, stats, source info)
  ocr2md scan.pdf --json > scan.json

ENVIRONMENT VARIABLES:
  MISTRAL_API_KEY     Mistral API key (required)
  OCR2MD_MODEL        Override the OCR model ID
  OCR2MD_BASE_URL     Override the API base URL

SETUP:
  1. Set API key:     export MISTRAL_API_KEY=...
  2. Convert:         ocr2md document.pdf -o output.md
"#;

/// Convert PDF and image files to Markdown using the Mistral OCR API.
#[derive(Parser, Debug)]
#[command(
    name = "ocr2md",
    version,
    about = "Convert PDF and image files to Markdown using the Mistral OCR API",
    long_about = "Convert PDF documents, images, and camera snapshots to clean Markdown via the \
Mistral OCR service. Figures come back inline as base64 data URIs, or as exported files with \
--image-dir.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF or image file.
    input: PathBuf,

    /// Write Markdown to this file instead of stdout.
    #[arg(short, long, env = "OCR2MD_OUTPUT")]
    output: Option<PathBuf>,

    /// OCR model ID.
    #[arg(long, env = "OCR2MD_MODEL", default_value = ocr2md::DEFAULT_MODEL)]
    model: String,

    /// Mistral API key.
    #[arg(long, env = ocr2md::API_KEY_ENV, hide_env_values = true)]
    api_key: Option<String>,

    /// API base URL.
    #[arg(long, env = "OCR2MD_BASE_URL", default_value = "https://api.mistral.ai")]
    base_url: String,

    /// Input kind: auto (detect), pdf, image, camera.
    #[arg(long, value_enum, default_value = "auto")]
    kind: KindArg,

    /// Do not request inline image payloads; placeholders stay in the text.
    #[arg(long, env = "OCR2MD_NO_IMAGES")]
    no_images: bool,

    /// Export images to this directory and link them instead of inlining.
    #[arg(long, env = "OCR2MD_IMAGE_DIR", conflicts_with = "no_images")]
    image_dir: Option<PathBuf>,

    /// Output structured JSON (pages, stats, source) instead of Markdown.
    #[arg(long, env = "OCR2MD_JSON")]
    json: bool,

    /// Signed-URL lifetime in hours for the uploaded file.
    #[arg(long, default_value_t = 1)]
    expiry: u32,

    /// Upload timeout in seconds.
    #[arg(long, env = "OCR2MD_UPLOAD_TIMEOUT", default_value_t = 120)]
    upload_timeout: u64,

    /// OCR call timeout in seconds.
    #[arg(long, env = "OCR2MD_API_TIMEOUT", default_value_t = 300)]
    api_timeout: u64,

    /// Disable the progress spinner.
    #[arg(long, env = "OCR2MD_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "OCR2MD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "OCR2MD_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum KindArg {
    /// Detect from the extension, then the leading bytes.
    Auto,
    /// Require a PDF.
    Pdf,
    /// Require a raster image.
    Image,
    /// Treat the file as a camera snapshot: ignore its name, detect the
    /// format from the bytes alone.
    Camera,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Library INFO logs duplicate what the spinner already shows, so they
    // stay off while the spinner is active.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb = if show_progress {
        Some(CliProgressCallback::new())
    } else {
        None
    };

    let mut builder = OcrConfig::builder()
        .api_key(cli.api_key.clone().unwrap_or_default())
        .base_url(cli.base_url.clone())
        .model(cli.model.clone())
        .include_images(!cli.no_images)
        .signed_url_expiry_hours(cli.expiry)
        .upload_timeout_secs(cli.upload_timeout)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref cb) = progress_cb {
        builder = builder.progress_callback(Arc::clone(cb) as ProgressCallback);
    }

    let config = builder.build().context("Invalid configuration")?;

    // ── Run conversion ───────────────────────────────────────────────────
    let result = run_conversion(&cli, &config).await;
    if let Some(ref cb) = progress_cb {
        cb.finish();
    }
    let output = result.context("Conversion failed")?;

    // ── Emit results ─────────────────────────────────────────────────────
    let markdown = if let Some(ref dir) = cli.image_dir {
        let n = export_images(&output.pages, dir)
            .await
            .context("Failed to export images")?;
        if !cli.quiet {
            eprintln!("  {} exported {} images to {}", green("✓"), n, dir.display());
        }
        assemble_with_links(&output.pages, &dir.to_string_lossy())
    } else {
        output.markdown.clone()
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if let Some(ref path) = cli.output {
        write_atomic(path, &markdown)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        if !cli.quiet {
            eprintln!(
                "{}  {} pages  {}ms  →  {}",
                green("✔"),
                output.stats.page_count,
                output.stats.total_ms,
                bold(&path.display().to_string()),
            );
        }
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(markdown.as_bytes())
            .context("Failed to write to stdout")?;
        if !markdown.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }

    if !cli.quiet && !cli.json && cli.output.is_none() {
        eprintln!(
            "   {}",
            dim(&format!(
                "{} pages, {} images, {}ms ({})",
                output.stats.page_count,
                output.stats.image_count,
                output.stats.total_ms,
                cyan(&output.source.kind.to_string()),
            ))
        );
    }

    Ok(())
}

/// Dispatch on `--kind`: auto-detect uses the path-based entry point, the
/// forced kinds go through the input-source enumeration.
async fn run_conversion(cli: &Cli, config: &OcrConfig) -> Result<ocr2md::ConversionOutput> {
    let output = match cli.kind {
        KindArg::Auto => convert(&cli.input, config).await?,
        forced => {
            let bytes = tokio::fs::read(&cli.input)
                .await
                .with_context(|| format!("Failed to read {}", cli.input.display()))?;
            let file_name = cli
                .input
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("upload")
                .to_string();
            let source = match forced {
                KindArg::Pdf => InputSource::UploadedPdf { bytes, file_name },
                KindArg::Image => InputSource::UploadedImage { bytes, file_name },
                KindArg::Camera => InputSource::CameraImage { bytes },
                KindArg::Auto => unreachable!(),
            };
            convert_source(source, config).await?
        }
    };
    Ok(output)
}
