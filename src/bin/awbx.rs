//! CLI binary for awb-extract.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig`, runs one extraction, and prints the report.

use anyhow::{Context, Result};
use awb_extract::{
    export_record, extract, report, ExtractionConfig, ExtractionProgressCallback, ExtractionStage,
    ProgressCallback,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a single spinner whose message tracks the
/// pipeline stage. The rasterising stage fires from a blocking-pool thread,
/// so the spinner handle must be shareable.
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
        bar.set_prefix("Extracting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: ExtractionStage) {
        let msg = match stage {
            ExtractionStage::Rasterizing => "Rendering first page…",
            ExtractionStage::Inferring => "Waiting on the vision model… ⏳",
            ExtractionStage::Parsing => "Recovering JSON…",
        };
        self.bar.set_message(msg);
    }

    fn on_stage_complete(&self, stage: ExtractionStage, duration_ms: u64) {
        self.bar.println(format!(
            "  {} {:<12} {}",
            green("✓"),
            stage.to_string(),
            dim(&format!("{:.1}s", duration_ms as f64 / 1000.0)),
        ));
    }

    fn on_extraction_error(&self, stage: ExtractionStage, error: &str) {
        // Truncate very long error messages to keep output tidy.
        let msg = if error.len() > 100 {
            format!("{}\u{2026}", &error[..99])
        } else {
            error.to_string()
        };
        self.bar
            .println(format!("  {} {:<12} {}", red("✗"), stage.to_string(), red(&msg)));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract and print the report
  awbx waybill.pdf

  # Also write awb_data_<waybill number>.json next to you
  awbx waybill.pdf --export

  # Show the raw decoded record alongside the report
  awbx waybill.pdf --show-raw

  # Extract from a URL with a specific model
  awbx --provider openai --model gpt-4.1-mini https://example.com/awb.pdf

  # Machine-readable output (record + raw reply + stats)
  awbx --json waybill.pdf > out.json

SUPPORTED PROVIDERS:
  gemini (default when GEMINI_API_KEY is set; model gemini-2.5-flash),
  openai, anthropic, azure, ollama, or any OpenAI-compatible endpoint.

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (preferred)
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  AWBX_LLM_PROVIDER       Override provider (gemini, openai, anthropic, …)
  AWBX_MODEL              Override model ID
  PDFIUM_LIB_PATH         Path to an existing libpdfium

SETUP:
  1. Set API key:   export GEMINI_API_KEY=...
  2. Extract:       awbx waybill.pdf --export
"#;

/// Extract structured Air Waybill data from a PDF using Vision LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "awbx",
    version,
    about = "Extract structured Air Waybill data from PDF documents using Vision LLMs",
    long_about = "Extract the fields of an Air Waybill (parties, routing, charges, goods) from a \
PDF document — local file or URL — into a structured record, rendered as a readable report with \
an optional JSON export. Supports Gemini, OpenAI, Anthropic, Azure OpenAI, and any \
OpenAI-compatible endpoint.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local waybill PDF path or HTTP/HTTPS URL.
    input: String,

    /// Write the decoded record to awb_data_<waybill number>.json.
    #[arg(long, env = "AWBX_EXPORT")]
    export: bool,

    /// Directory for the exported JSON file.
    #[arg(long, env = "AWBX_EXPORT_DIR", default_value = ".")]
    export_dir: PathBuf,

    /// Print the raw decoded record after the report.
    #[arg(long, env = "AWBX_SHOW_RAW")]
    show_raw: bool,

    /// Output the whole extraction (record, raw reply, stats) as JSON.
    #[arg(long, env = "AWBX_JSON")]
    json: bool,

    /// Vision model ID (e.g. gemini-2.5-flash, gpt-4.1-mini).
    #[arg(long, env = "AWBX_MODEL")]
    model: Option<String>,

    /// LLM provider: gemini, openai, anthropic, azure, ollama.
    #[arg(
        long,
        env = "AWBX_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set, \
          preferring Gemini."
    )]
    provider: Option<String>,

    /// Maximum rendered image dimension in pixels.
    #[arg(long, env = "AWBX_MAX_PIXELS", default_value_t = 2000)]
    max_pixels: u32,

    /// Max model output tokens.
    #[arg(long, env = "AWBX_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// Model temperature (0.0–2.0).
    #[arg(long, env = "AWBX_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "AWBX_PASSWORD")]
    password: Option<String>,

    /// Path to a text file containing a custom extraction prompt.
    #[arg(long, env = "AWBX_PROMPT")]
    prompt: Option<PathBuf>,

    /// Model call deadline in seconds.
    #[arg(long, env = "AWBX_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "AWBX_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Disable the progress spinner.
    #[arg(long, env = "AWBX_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "AWBX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except the report and errors.
    #[arg(short, long, env = "AWBX_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs while the spinner is active; the
    // spinner provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
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

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb = if show_progress {
        Some(CliProgressCallback::new())
    } else {
        None
    };
    let config = build_config(&cli, progress_cb.clone().map(|cb| cb as ProgressCallback)).await?;

    // ── Run extraction ───────────────────────────────────────────────────
    let result = extract(&cli.input, &config).await;
    if let Some(ref cb) = progress_cb {
        cb.finish();
    }

    let output = match result {
        Ok(output) => output,
        Err(e) => {
            // A parse failure still carries the model's reply; show it so
            // the user can inspect what came back.
            if let Some(raw) = e.raw_text() {
                eprintln!("{} {}", red("✘"), e);
                eprintln!("\n{}", bold("Raw model response:"));
                eprintln!("{raw}");
                std::process::exit(1);
            }
            return Err(e).context("Extraction failed");
        }
    };

    // ── Present ──────────────────────────────────────────────────────────
    if cli.json {
        let json =
            serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(report::render_report(&output.record).as_bytes())
            .context("Failed to write to stdout")?;

        if cli.show_raw {
            writeln!(handle, "\n── Raw decoded record ──")
                .and_then(|_| handle.write_all(report::render_raw(&output.record).as_bytes()))
                .and_then(|_| writeln!(handle))
                .context("Failed to write to stdout")?;
        }
    }

    if cli.export {
        let path = export_record(&output.record, &cli.export_dir)
            .await
            .context("Failed to write export file")?;
        if !cli.quiet && !cli.json {
            eprintln!("{} exported {}", green("✔"), bold(&path.display().to_string()));
        }
    }

    if !cli.quiet && !cli.json {
        eprintln!(
            "{} extraction complete  {}  {}",
            green("✔"),
            dim(&format!("{:.1}s", output.stats.total_duration_ms as f64 / 1000.0)),
            dim(&format!(
                "{} tokens in / {} tokens out",
                output.stats.input_tokens, output.stats.output_tokens
            )),
        );
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let prompt = if let Some(ref path) = cli.prompt {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read extraction prompt from {:?}", path))?,
        )
    } else {
        None
    };

    let mut builder = ExtractionConfig::builder()
        .max_rendered_pixels(cli.max_pixels)
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    let mut config = builder.build().context("Invalid configuration")?;

    // Fields without dedicated builder setters that came straight from flags
    config.model = cli.model.clone();
    config.provider_name = cli.provider.clone();
    config.password = cli.password.clone();
    config.prompt = prompt;

    Ok(config)
}
