//! CLI binary for heic2jpg.
//!
//! A thin shim over the library crate: gathers input files into a session,
//! runs one batch, writes the artifacts and prints a summary.

use anyhow::{Context, Result};
use clap::Parser;
use heic2jpg::{
    export_all, format_byte_size, has_source_suffix, ConversionConfig, ConversionProgressCallback,
    ConversionSession, ConversionStats, ProgressCallback, SourceItem, TargetFormat,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
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

/// Terminal progress callback: a live bar plus one log line per file.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Per-item wall-clock start times, keyed by roster index.
    start_times: Mutex<HashMap<usize, Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_batch_start

        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Converting");

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn elapsed_secs(&self, index: usize) -> f64 {
        self.start_times
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&index)
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.enable_steady_tick(Duration::from_millis(80));
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total} file(s)…"))
        ));
    }

    fn on_item_start(&self, index: usize, _total: usize, name: &str) {
        self.start_times
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(index, Instant::now());
        self.bar.set_message(name.to_string());
    }

    fn on_item_complete(&self, index: usize, total: usize, output_name: &str, size: u64) {
        let secs = self.elapsed_secs(index);
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {:<32}  {:>10}  {}",
            green("✓"),
            index + 1,
            total,
            output_name,
            dim(&format_byte_size(size)),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_item_error(&self, index: usize, total: usize, name: &str, error: &str) {
        let secs = self.elapsed_secs(index);

        // Keep long tool stderr on one line.
        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {:<32}  {}  {}",
            red("✗"),
            index + 1,
            total,
            name,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = total.saturating_sub(success_count);
        if failed == 0 {
            eprintln!(
                "{} {} file(s) converted successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} file(s) converted  ({} failed)",
                if failed == total { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert a few photos into the current directory
  heic2jpg IMG_0001.HEIC IMG_0002.heic

  # Convert a whole folder into ./jpg
  heic2jpg ~/Pictures/iphone -o jpg

  # See what would be converted
  heic2jpg --list-only ~/Pictures/iphone

  # Lower quality, two files at a time, JSON report
  heic2jpg --quality 0.8 --concurrency 2 --json photos/ > report.json

DECODER:
  HEIC decoding is delegated to libheif's `heif-convert`, looked up on PATH.
  Use --tool to point at a specific binary. Without it, a built-in decoder is
  used that only understands PNG/JPEG payloads.

    Debian/Ubuntu:  apt install libheif-examples
    macOS:          brew install libheif

ENVIRONMENT VARIABLES:
  HEIC2JPG_OUTPUT_DIR    Default for --output-dir
  HEIC2JPG_QUALITY       Default for --quality
  HEIC2JPG_CONCURRENCY   Default for --concurrency
  HEIC2JPG_FORMAT        Default for --format (jpeg, png)
  HEIC2JPG_TOOL          Default for --tool
  HEIC2JPG_JSON          Same as --json
  HEIC2JPG_NO_PROGRESS   Same as --no-progress
  HEIC2JPG_VERBOSE       Same as --verbose
  HEIC2JPG_QUIET         Same as --quiet
  RUST_LOG               Log filter (overrides --verbose/--quiet)
"#;

/// Convert HEIC images to JPEG.
#[derive(Parser, Debug)]
#[command(
    name = "heic2jpg",
    version,
    about = "Convert HEIC images to JPEG",
    long_about = "Convert HEIC images (files or whole directories) to JPEG. Each file is \
converted independently: a file that fails to decode is reported and skipped while the \
rest of the batch carries on.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// HEIC files, or directories containing them.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Directory to write converted files into.
    #[arg(short, long, env = "HEIC2JPG_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Encoder quality (0.0–1.0).
    #[arg(long, env = "HEIC2JPG_QUALITY", default_value_t = 0.9)]
    quality: f32,

    /// Output format.
    #[arg(long, env = "HEIC2JPG_FORMAT", value_enum, default_value = "jpeg")]
    format: FormatArg,

    /// Files converted at once. Output order never changes.
    #[arg(short, long, env = "HEIC2JPG_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// Path to a heif-convert compatible decoder.
    #[arg(long, env = "HEIC2JPG_TOOL")]
    tool: Option<PathBuf>,

    /// List the accepted input files and their sizes, convert nothing.
    #[arg(long)]
    list_only: bool,

    /// Print a JSON report instead of the human summary.
    #[arg(long, env = "HEIC2JPG_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "HEIC2JPG_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "HEIC2JPG_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "HEIC2JPG_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum FormatArg {
    Jpeg,
    Png,
}

impl From<FormatArg> for TargetFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Jpeg => TargetFormat::Jpeg,
            FormatArg::Png => TargetFormat::Png,
        }
    }
}

/// `--json` output.
#[derive(Serialize)]
struct Report {
    outputs: Vec<ReportEntry>,
    stats: ConversionStats,
    error: Option<String>,
}

#[derive(Serialize)]
struct ReportEntry {
    name: String,
    path: PathBuf,
    size: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.list_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build session ────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;
    let mut session = ConversionSession::new(config).context("Failed to set up the decoder")?;

    let (candidates, skipped) = collect_sources(&cli.inputs).await?;
    session.select(candidates);
    if skipped > 0 && !cli.quiet {
        eprintln!(
            "{}",
            dim(&format!("Ignored {skipped} file(s) without a .heic suffix"))
        );
    }

    // ── List-only mode ───────────────────────────────────────────────────
    if cli.list_only {
        print_roster(&session, cli.json)?;
        return Ok(());
    }

    if session.roster().is_empty() {
        anyhow::bail!("No .heic files found in the given inputs");
    }

    // ── Run conversion ───────────────────────────────────────────────────
    let report = session
        .run()
        .await
        .context("Roster unexpectedly empty")?;

    let outputs = session.outputs().to_vec();
    let paths = export_all(session.store(), &outputs, &cli.output_dir)
        .await
        .context("Failed to write converted files")?;

    let error = session.last_error().map(|e| e.to_string());

    if cli.json {
        let json = serde_json::to_string_pretty(&Report {
            outputs: outputs
                .iter()
                .zip(paths)
                .map(|(a, path)| ReportEntry {
                    name: a.name.clone(),
                    path,
                    size: a.size,
                })
                .collect(),
            stats: report.stats.clone(),
            error: error.clone(),
        })
        .context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet {
        if !show_progress {
            for (artifact, path) in outputs.iter().zip(&paths) {
                println!("{}  {}", path.display(), format_byte_size(artifact.size));
            }
        }
        let stats = &report.stats;
        eprintln!(
            "{}  {}/{} files  {} → {}  {}ms  →  {}",
            if stats.failed_items == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            stats.converted_items,
            stats.total_items,
            format_byte_size(stats.input_bytes),
            format_byte_size(stats.output_bytes),
            stats.total_duration_ms,
            bold(&cli.output_dir.display().to_string()),
        );
    }

    if let Some(message) = error {
        anyhow::bail!(
            "{} ({} of {} failed)",
            message,
            report.stats.failed_items,
            report.stats.total_items
        );
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .target(cli.format.clone().into())
        .quality(cli.quality)
        .concurrency(cli.concurrency);

    if let Some(ref tool) = cli.tool {
        builder = builder.tool_path(tool.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Expand the command-line inputs into source items.
///
/// Directories contribute their `.heic` files (non-recursive, sorted by name).
/// Explicit file arguments without the suffix are counted, not read.
/// Returns the items and the number of skipped file arguments.
async fn collect_sources(inputs: &[PathBuf]) -> Result<(Vec<SourceItem>, usize)> {
    let mut items = Vec::new();
    let mut skipped = 0;
    for input in inputs {
        if input.is_dir() {
            for path in heic_files_in(input).await? {
                items.push(SourceItem::from_path(&path).await?);
            }
        } else if is_heic_path(input) {
            items.push(SourceItem::from_path(input).await?);
        } else {
            skipped += 1;
        }
    }
    Ok((items, skipped))
}

fn is_heic_path(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(has_source_suffix)
}

async fn heic_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to read directory {:?}", dir))?;

    let mut paths = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .with_context(|| format!("Failed to read directory {:?}", dir))?
    {
        let path = entry.path();
        if is_heic_path(&path) && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// `--list-only`: print the roster like a "Selected Files" panel.
fn print_roster(session: &ConversionSession, json: bool) -> Result<()> {
    let roster = session.roster();

    if json {
        #[derive(Serialize)]
        struct Entry<'a> {
            name: &'a str,
            size: u64,
        }
        let entries: Vec<Entry<'_>> = roster
            .items()
            .iter()
            .map(|i| Entry {
                name: i.name(),
                size: i.size(),
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&entries).context("Failed to serialise file list")?
        );
        return Ok(());
    }

    println!("Selected Files ({})", roster.len());
    for (i, item) in roster.items().iter().enumerate() {
        println!(
            "  {:>3}. {:<40} {:>10}",
            i + 1,
            item.name(),
            format_byte_size(item.size())
        );
    }
    println!("  Total: {}", format_byte_size(roster.total_size()));
    println!("  Decoder: {}", session.codec_name());
    Ok(())
}
