//! CLI binary for edgequake-docconv.
//!
//! With no subcommand (or `serve`) it runs the MCP server on stdio. The
//! other subcommands run one operation locally and print its JSON result,
//! which is handy for scripting and for checking an installation.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use edgequake_docconv::{
    mcp, BatchProgress, BatchProgressCallback, DocumentService, Engines, FileOutcome, FileStatus,
    ServerConfig,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── Batch progress bar ───────────────────────────────────────────────────────

/// Terminal progress for `docconv batch`. Files may complete out of order
/// when converted concurrently, so lines are printed as they finish.
struct CliBatchProgress {
    bar: ProgressBar,
    failures: AtomicUsize,
}

impl CliBatchProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}/{len} files  ⏱ {elapsed_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self {
            bar,
            failures: AtomicUsize::new(0),
        })
    }
}

impl BatchProgressCallback for CliBatchProgress {
    fn on_batch_start(&self, total_files: usize) {
        self.bar.set_length(total_files as u64);
    }

    fn on_file_complete(&self, _index: usize, _total: usize, outcome: &FileOutcome) {
        let name = outcome
            .file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let line = match outcome.status {
            FileStatus::Succeeded => format!(
                "  {} {:<40} {}",
                green("✓"),
                name,
                dim(outcome.strategy.as_deref().unwrap_or_default())
            ),
            FileStatus::Skipped => {
                self.failures.fetch_add(1, Ordering::SeqCst);
                format!("  {} {:<40} {}", yellow("–"), name, dim("skipped (too large)"))
            }
            FileStatus::Failed => {
                self.failures.fetch_add(1, Ordering::SeqCst);
                let msg = if outcome.message.chars().count() > 80 {
                    let cut: String = outcome.message.chars().take(79).collect();
                    format!("{cut}\u{2026}")
                } else {
                    outcome.message.clone()
                };
                format!("  {} {:<40} {}", red("✗"), name, red(&msg))
            }
        };
        self.bar.println(line);
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = self.failures.load(Ordering::SeqCst);
        if failed == 0 {
            eprintln!(
                "{} {} files converted successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} files converted  ({} not converted)",
                if success_count == 0 { red("✘") } else { yellow("⚠") },
                bold(&success_count.to_string()),
                total_files,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the MCP server on stdio (default)
  docconv

  # Convert one file (output next to the input: report.md)
  docconv convert report.pdf markdown

  # Explicit output path
  docconv convert notes.md html -o site/notes.html

  # Convert every .md file in a directory to HTML
  docconv batch ./docs html --pattern '*.md' --output-dir ./site

  # Inspect a file / list routes / check engines
  docconv info report.pdf
  docconv formats
  docconv health

ENGINES:
  markitdown   rich documents (pdf, docx, pptx, xlsx, html) → markdown / txt
  pandoc       markdown, html, docx, txt ↔ markdown, html, docx, txt, pdf
  pdfium       pdf → txt (page text)
  built-in     txt → docx, markdown → html

ENVIRONMENT VARIABLES:
  MAX_FILE_SIZE           Largest accepted input in bytes (default 104857600)
  TEMP_DIR                Staging directory for conversion attempts
  LOG_LEVEL               Log filter when RUST_LOG is unset (default info)
  ENABLE_PANDOC           Use pandoc if installed (default true)
  STRATEGY_TIMEOUT_SECS   Bound on one conversion attempt (default 120)
  BATCH_CONCURRENCY       Files converted in parallel (default 4)
  MARKITDOWN_PATH         markitdown program (default markitdown)
  PANDOC_PATH             pandoc program (default pandoc)
  PDFIUM_LIB_PATH         Explicit libpdfium shared library
"#;

/// Document format conversion over MCP.
#[derive(Parser, Debug)]
#[command(
    name = "docconv",
    version,
    about = "Convert documents between PDF, Word, Markdown, HTML and plain text",
    long_about = "Convert documents between PDF, Word, Markdown, HTML and plain text. \
Runs as an MCP server on stdio by default; subcommands run single operations locally.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Largest accepted input file, in bytes.
    #[arg(long, global = true, env = "MAX_FILE_SIZE", default_value_t = edgequake_docconv::config::DEFAULT_MAX_FILE_SIZE)]
    max_file_size: u64,

    /// Directory for staging files.
    #[arg(long, global = true, env = "TEMP_DIR")]
    temp_dir: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, global = true, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Allow the pandoc engine (true/false).
    #[arg(long, global = true, env = "ENABLE_PANDOC", default_value_t = true,
          action = clap::ArgAction::Set,
          value_parser = clap::builder::BoolishValueParser::new())]
    enable_pandoc: bool,

    /// Timeout for one strategy attempt, in seconds.
    #[arg(long, global = true, env = "STRATEGY_TIMEOUT_SECS", default_value_t = 120)]
    strategy_timeout: u64,

    /// Files converted concurrently in a batch.
    #[arg(long, global = true, env = "BATCH_CONCURRENCY", default_value_t = 4)]
    batch_concurrency: usize,

    /// markitdown program name or path.
    #[arg(long, global = true, env = "MARKITDOWN_PATH", default_value = "markitdown")]
    markitdown_path: PathBuf,

    /// pandoc program name or path.
    #[arg(long, global = true, env = "PANDOC_PATH", default_value = "pandoc")]
    pandoc_path: PathBuf,

    /// Explicit libpdfium shared library.
    #[arg(long, global = true, env = "PDFIUM_LIB_PATH")]
    pdfium_lib_path: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all logs except errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable the batch progress bar.
    #[arg(long, global = true)]
    no_progress: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the MCP server on stdin/stdout (default).
    Serve,

    /// Convert one document.
    Convert {
        /// Input file.
        input: PathBuf,
        /// Target format: pdf, docx, markdown, html, txt.
        target: String,
        /// Output file (default: <input stem>.<ext> next to the input).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert every matching file in a directory.
    Batch {
        /// Input directory (not recursive).
        input_dir: PathBuf,
        /// Target format.
        target: String,
        /// Output directory (default: <input_dir>/converted_<format>).
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Glob matched against file names.
        #[arg(short, long)]
        pattern: Option<String>,
    },

    /// Show metadata for a file.
    Info {
        path: PathBuf,
    },

    /// List formats, engines and conversion routes.
    Formats,

    /// Report engine availability and configuration.
    Health,
}

fn build_config(cli: &Cli) -> Result<ServerConfig> {
    let mut builder = ServerConfig::builder()
        .max_file_size(cli.max_file_size)
        .log_level(cli.log_level.clone())
        .enable_pandoc(cli.enable_pandoc)
        .strategy_timeout_secs(cli.strategy_timeout)
        .batch_concurrency(cli.batch_concurrency)
        .markitdown_path(&cli.markitdown_path)
        .pandoc_path(&cli.pandoc_path);
    if let Some(dir) = &cli.temp_dir {
        builder = builder.temp_dir(dir);
    }
    if let Some(lib) = &cli.pdfium_lib_path {
        builder = builder.pdfium_lib_path(lib);
    }
    builder.build().context("Invalid configuration")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize result")?
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = build_config(&cli)?;

    // ── Logging setup ────────────────────────────────────────────────────
    // Always stderr: in server mode stdout carries JSON-RPC.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        config.log_level.as_str()
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let engines = Engines::from_config(&config);
    let service = DocumentService::start(config, engines)
        .await
        .context("Failed to initialise conversion engines")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            mcp::serve(&service, stdin, tokio::io::stdout())
                .await
                .context("MCP server I/O failed")?;
        }

        Command::Convert {
            input,
            target,
            output,
        } => {
            let result = service
                .convert_document(&input, &target, output.as_deref())
                .await;
            print_json(&result)?;
            if !result.is_success() {
                bail!("{}", result.message);
            }
        }

        Command::Batch {
            input_dir,
            target,
            output_dir,
            pattern,
        } => {
            let progress: Option<BatchProgress> = if cli.no_progress || cli.quiet {
                None
            } else {
                Some(CliBatchProgress::new() as Arc<dyn BatchProgressCallback>)
            };
            let result = service
                .batch_convert(
                    &input_dir,
                    output_dir.as_deref(),
                    &target,
                    pattern.as_deref(),
                    progress.as_ref(),
                )
                .await
                .context("Batch conversion failed")?;
            print_json(&result)?;
            if result.failure > 0 {
                bail!("{} of {} files were not converted", result.failure, result.total);
            }
        }

        Command::Info { path } => {
            let info = service
                .get_file_info(&path)
                .await
                .with_context(|| format!("Cannot inspect {}", path.display()))?;
            print_json(&info)?;
        }

        Command::Formats => print_json(&service.list_supported_formats())?,

        Command::Health => print_json(&service.health_check())?,
    }

    Ok(())
}
