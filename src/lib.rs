//! # awb-extract
//!
//! Extract structured Air Waybill data from PDF documents using Vision
//! Language Models (VLMs).
//!
//! ## Why this crate?
//!
//! An Air Waybill is a dense one-page form: boxed fields, a routing strip, a
//! goods table, a charges grid. Text-extraction tools shred that layout into
//! word soup. Instead this crate rasterises the first page into a PNG and
//! lets a VLM read the form as a human would, asking it for a JSON object
//! keyed by the form's printed headers, then recovers that object from the
//! reply however the model chose to wrap it.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    resolve local file, URL, or in-memory bytes
//!  ├─ 2. Raster   first page to an image via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 3. Encode   PNG → base64 ImageData
//!  ├─ 4. Infer    one call to gemini-2.5-flash / gpt-4.1 / claude / …
//!  ├─ 5. Recover  balanced-brace scan for the JSON object, tolerant decode
//!  └─ 6. Present  sectioned report + optional JSON export
//! ```
//!
//! One request at a time, by design: each call owns its image bytes, reply
//! text, and record, and a failure is terminal for that request only — the
//! caller resubmits.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use awb_extract::{extract, report, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from GEMINI_API_KEY / OPENAI_API_KEY / …
//!     let config = ExtractionConfig::default();
//!     let output = extract("waybill.pdf", &config).await?;
//!     println!("{}", report::render_report(&output.record));
//!     eprintln!("tokens: {} in / {} out",
//!         output.stats.input_tokens,
//!         output.stats.output_tokens);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `awbx` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! awb-extract = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod record;
pub mod report;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use error::ExtractError;
pub use extract::{export_record, extract, extract_from_bytes, extract_sync};
pub use output::{ExtractionOutput, ExtractionStats};
pub use progress::{
    ExtractionProgressCallback, ExtractionStage, NoopProgressCallback, ProgressCallback,
};
pub use record::{
    AwbRecord, ChargeCodeRow, ChargePair, ChargesSummary, GoodsRow, PrepaidCollect, RoutingLeg,
};
