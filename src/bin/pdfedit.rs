//! CLI binary for edgequake-pdfedit.
//!
//! A thin shim over the library crate that maps CLI flags to `ReflowConfig`,
//! moves text and layout files around and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_pdfedit::{
    extract_input, render_to_file, Document, EditBuffer, Extraction, InputKind, ProgressCallback,
    ReflowConfig, ReflowProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
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

/// Terminal progress callback: a spinner that turns into a page counter
/// once the page total is known, plus one log line per page.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
    errors: AtomicUsize,
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

impl CliProgressCallback {
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening document…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn elapsed_secs(&self, page_num: usize) -> f64 {
        self.start_times
            .lock()
            .map(|mut times| times.remove(&page_num))
            .ok()
            .flatten()
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ReflowProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, total_pages: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} pages  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total_pages as u64);
        self.bar.set_position(0);
        self.bar.set_style(style);
        self.bar.set_prefix("Extracting");
    }

    fn on_page_start(&self, page_num: usize, _total_pages: usize) {
        if let Ok(mut times) = self.start_times.lock() {
            times.insert(page_num, Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total_pages: usize, block_count: usize) {
        let secs = self.elapsed_secs(page_num);
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<10}  {}",
            green("✓"),
            page_num,
            total_pages,
            dim(&format!("{block_count:>4} blocks")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.set_position(page_num as u64);
    }

    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let secs = self.elapsed_secs(page_num);
        self.errors.fetch_add(1, Ordering::SeqCst);

        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page_num,
            total_pages,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.set_position(page_num as u64);
    }

    fn on_extraction_complete(&self, total_pages: usize, pages_with_text: usize) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);
        if failed == 0 {
            eprintln!(
                "{} text found on {}/{} pages",
                green("✔"),
                bold(&pages_with_text.to_string()),
                total_pages
            );
        } else {
            eprintln!(
                "{} text found on {}/{} pages  ({} failed)",
                cyan("⚠"),
                bold(&pages_with_text.to_string()),
                total_pages,
                red(&failed.to_string()),
            );
        }
    }

    fn on_render_complete(&self, total_pages: usize, byte_len: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} rendered {} pages  {}",
            green("✔"),
            bold(&total_pages.to_string()),
            dim(&format!("{byte_len} bytes")),
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract editable text and the layout it came from
  pdfedit extract invoice.pdf -o invoice
  #   → invoice.txt, invoice.layout.json

  # Edit invoice.txt, then render it back onto the layout
  pdfedit render invoice.layout.json --text invoice.txt -o invoice-edited.pdf

  # One shot: re-typeset a photo of a page (recognised with a vision model)
  pdfedit reflow receipt.jpg -o receipt.pdf

  # One shot with replacement text
  pdfedit reflow scan.pdf --text corrected.txt -o scan-corrected.pdf

REMAPPING:
  PDFs with a text layer are remapped line by line onto the original
  blocks: the N-th edited line takes the place and font of the N-th block.
  Extra lines are dropped; missing lines leave blocks empty.
  Scans and photos are re-typeset over the original page image, with the
  edited lines split evenly across pages.

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key (vision recognition)
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to an existing libpdfium
"#;

/// Edit the text of PDFs and scanned pages while keeping their layout.
#[derive(Parser, Debug)]
#[command(
    name = "pdfedit",
    version,
    about = "Edit the text of PDFs and scanned pages while keeping their layout",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract editable text (<STEM>.txt) and its layout (<STEM>.layout.json).
    Extract {
        /// Local PDF/image path or HTTP/HTTPS URL.
        input: String,

        /// Output stem; defaults to the input file name without extension.
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Render edited text onto a saved layout.
    Render {
        /// Layout file written by `pdfedit extract`.
        layout: PathBuf,

        /// Edited text; the layout's own text is used when omitted.
        #[arg(short, long)]
        text: Option<PathBuf>,

        /// Output PDF path.
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Extract and render in one step.
    Reflow {
        /// Local PDF/image path or HTTP/HTTPS URL.
        input: String,

        /// Replacement text; the extracted text is used when omitted.
        #[arg(short, long)]
        text: Option<PathBuf>,

        /// Output PDF path.
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Treat the input as this kind instead of detecting it.
    #[arg(long, value_enum)]
    kind: Option<KindArg>,

    /// Vision model ID used for scanned pages.
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// Vision provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Rasterisation DPI for scanned PDF pages (72–400).
    #[arg(long, env = "PDFEDIT_DPI", default_value_t = 150,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDFEDIT_PASSWORD")]
    password: Option<String>,

    /// Fallback font for unknown fonts and re-typeset pages.
    #[arg(long, env = "PDFEDIT_FONT", default_value = "Helvetica")]
    font: String,

    /// Smallest font size ever drawn.
    #[arg(long, env = "PDFEDIT_MIN_FONT_SIZE", default_value_t = 12.0)]
    min_font_size: f32,

    /// Retries per page on recognition failure.
    #[arg(long, env = "PDFEDIT_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDFEDIT_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Disable progress output.
    #[arg(long, env = "PDFEDIT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFEDIT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFEDIT_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum KindArg {
    Pdf,
    Image,
}

impl From<KindArg> for InputKind {
    fn from(v: KindArg) -> Self {
        match v {
            KindArg::Pdf => InputKind::Pdf,
            KindArg::Image => InputKind::Image,
        }
    }
}

impl Command {
    fn common(&self) -> &CommonArgs {
        match self {
            Command::Extract { common, .. }
            | Command::Render { common, .. }
            | Command::Reflow { common, .. } => common,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let common = cli.command.common();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress output replaces INFO logs unless --verbose is given.
    let show_progress = !common.quiet && !common.no_progress;
    let filter = if common.verbose {
        "debug"
    } else if common.quiet || show_progress {
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

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new_dynamic() as Arc<dyn ReflowProgressCallback>)
    } else {
        None
    };
    let config = build_config(common, progress_cb)?;

    match &cli.command {
        Command::Extract {
            input,
            output,
            common,
        } => {
            let extraction = extract_input(input, common.kind.map(Into::into), &config)
                .await
                .context("Extraction failed")?;
            let stem = output.clone().unwrap_or_else(|| default_stem(input));
            let (text_path, layout_path) = write_extraction(&extraction, &stem).await?;
            report_page_errors(&extraction, common.quiet);

            if !common.quiet {
                eprintln!(
                    "{}  {} lines  →  {}  {}",
                    green("✔"),
                    extraction.edit_buffer.len(),
                    bold(&text_path.display().to_string()),
                    dim(&layout_path.display().to_string()),
                );
            }
        }

        Command::Render {
            layout,
            text,
            output,
            common,
        } => {
            let json = tokio::fs::read_to_string(layout)
                .await
                .with_context(|| format!("Failed to read layout {}", layout.display()))?;
            let document = Document::from_json(&json).context("Failed to load layout")?;
            let edited = match text {
                Some(path) => read_edit_buffer(path).await?,
                None => document.edit_buffer(),
            };
            let written = render_to_file(&document, &edited, output, &config)
                .await
                .context("Render failed")?;
            print_written(output, written, common.quiet);
        }

        Command::Reflow {
            input,
            text,
            output,
            common,
        } => {
            let extraction = extract_input(input, common.kind.map(Into::into), &config)
                .await
                .context("Extraction failed")?;
            report_page_errors(&extraction, common.quiet);
            let edited = match text {
                Some(path) => read_edit_buffer(path).await?,
                None => extraction.edit_buffer.clone(),
            };
            let written = render_to_file(&extraction.document, &edited, output, &config)
                .await
                .context("Render failed")?;
            print_written(output, written, common.quiet);
        }
    }

    Ok(())
}

/// Map CLI args to `ReflowConfig`.
fn build_config(common: &CommonArgs, progress: Option<ProgressCallback>) -> Result<ReflowConfig> {
    let mut builder = ReflowConfig::builder()
        .dpi(common.dpi)
        .fallback_font(common.font.clone())
        .min_font_size(common.min_font_size)
        .max_retries(common.max_retries)
        .download_timeout_secs(common.download_timeout);

    if let Some(ref model) = common.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = common.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref password) = common.password {
        builder = builder.password(password.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// `docs/scan.pdf` → `scan`; URLs use their last path segment.
fn default_stem(input: &str) -> PathBuf {
    let name = input
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("document");
    let stem = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    PathBuf::from(stem)
}

fn sibling(stem: &Path, suffix: &str) -> PathBuf {
    let mut name = stem.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

async fn write_extraction(extraction: &Extraction, stem: &Path) -> Result<(PathBuf, PathBuf)> {
    let text_path = sibling(stem, ".txt");
    let layout_path = sibling(stem, ".layout.json");

    let mut text = extraction.text();
    text.push('\n');
    tokio::fs::write(&text_path, text)
        .await
        .with_context(|| format!("Failed to write {}", text_path.display()))?;

    let json = extraction
        .document
        .to_json()
        .context("Failed to serialise layout")?;
    tokio::fs::write(&layout_path, json)
        .await
        .with_context(|| format!("Failed to write {}", layout_path.display()))?;

    Ok((text_path, layout_path))
}

async fn read_edit_buffer(path: &Path) -> Result<EditBuffer> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read edited text {}", path.display()))?;
    Ok(EditBuffer::from_text(&text))
}

fn report_page_errors(extraction: &Extraction, quiet: bool) {
    if quiet {
        return;
    }
    for error in &extraction.page_errors {
        eprintln!("  {} {}", cyan("⚠"), error);
    }
}

fn print_written(path: &Path, bytes: usize, quiet: bool) {
    if !quiet {
        eprintln!(
            "{}  {}  →  {}",
            green("✔"),
            dim(&format!("{bytes} bytes")),
            bold(&path.display().to_string()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stems_from_paths_and_urls() {
        assert_eq!(default_stem("docs/scan.pdf"), PathBuf::from("scan"));
        assert_eq!(default_stem("https://example.com/a/receipt.jpg"), PathBuf::from("receipt"));
        assert_eq!(default_stem("photo"), PathBuf::from("photo"));
    }

    #[test]
    fn sibling_appends_suffix() {
        assert_eq!(
            sibling(Path::new("out/inv"), ".layout.json"),
            PathBuf::from("out/inv.layout.json")
        );
    }

    #[test]
    fn cli_parses_render() {
        let cli = Cli::try_parse_from([
            "pdfedit", "render", "a.layout.json", "--text", "a.txt", "-o", "a.pdf",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Render { .. }));
    }
}
