//! Extraction entry points.
//!
//! One user action maps to one call of [`extract`] (or a wrapper): resolve
//! the input, rasterise the first page, send it to the model, recover the
//! JSON record. Everything the request touches — image bytes, reply text,
//! record — is request-local; nothing is shared or cached across calls, and
//! a failed request leaves the process fully usable for the next attempt.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::output::{ExtractionOutput, ExtractionStats};
use crate::pipeline::{encode, infer, input, raster, recover};
use crate::progress::ExtractionStage;
use crate::record::AwbRecord;
use crate::report::export_file_name;
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Extract an Air Waybill record from a PDF file or URL.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input_str` — Local file path or HTTP/HTTPS URL to a PDF
/// * `config`    — Extraction configuration
///
/// # Errors
/// Every failure is terminal for this request; see [`ExtractError`] for the
/// taxonomy. The parse variants carry the raw model reply for display.
pub async fn extract(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let total_start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting extraction: {}", input_str);

    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_start();
    }

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let pdf_path = resolved.path().to_path_buf();

    // ── Step 2: Resolve provider ─────────────────────────────────────────
    // Before rasterising: a missing credential should fail fast, not after
    // seconds of pdfium work.
    let provider = resolve_provider(config)?;

    // ── Step 3: Rasterise the first page ─────────────────────────────────
    let raster_start = Instant::now();
    let image = run_stage(config, ExtractionStage::Rasterizing, async {
        raster::rasterize_first_page(&pdf_path, config).await
    })
    .await?;
    let (image_width, image_height) = (image.width(), image.height());

    // ── Step 4: Encode for the API body ──────────────────────────────────
    let image_data = encode::encode_page(&image).map_err(|e| ExtractError::RasterisationFailed {
        detail: format!("Image encoding failed: {}", e),
    })?;
    let raster_duration_ms = raster_start.elapsed().as_millis() as u64;
    debug!(
        "First page ready: {}x{} px in {}ms",
        image_width, image_height, raster_duration_ms
    );

    // ── Step 5: Model call ───────────────────────────────────────────────
    let reply = run_stage(config, ExtractionStage::Inferring, async {
        infer::run_inference(&provider, image_data, config).await
    })
    .await?;

    // ── Step 6: Recover the record ───────────────────────────────────────
    let record = run_stage(config, ExtractionStage::Parsing, async {
        recover::recover_record(&reply.text)
    })
    .await?;

    let stats = ExtractionStats {
        raster_duration_ms,
        llm_duration_ms: reply.duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        input_tokens: reply.input_tokens,
        output_tokens: reply.output_tokens,
        image_width,
        image_height,
    };

    info!(
        "Extraction complete: {} fields, {}ms total",
        record.as_map().len(),
        stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_complete(stats.total_duration_ms);
    }

    Ok(ExtractionOutput {
        record,
        raw_text: reply.text,
        stats,
    })
}

/// Extract from PDF bytes in memory.
///
/// Avoids the need for the caller to create a file: `bytes` are staged in a
/// managed [`tempfile`] (pdfium needs a filesystem path) and cleaned up
/// automatically on return or panic. Empty input fails with
/// [`ExtractError::MissingDocument`] before anything is written.
pub async fn extract_from_bytes(
    bytes: &[u8],
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    if bytes.is_empty() {
        return Err(ExtractError::MissingDocument);
    }

    let mut tmp = tempfile::NamedTempFile::new()
        .map_err(|e| ExtractError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| ExtractError::Internal(format!("tempfile write: {e}")))?;
    let path = tmp.path().to_string_lossy().to_string();
    // `tmp` is dropped (and the file deleted) when `extract` returns
    extract(&path, config).await
}

/// Synchronous wrapper around [`extract`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExtractError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract(input_str, config))
}

/// Write the pretty-printed record into `dir`, named after the extracted
/// waybill number (`awb_data_<number>.json`, or the `unknown` fallback).
///
/// Uses atomic write (temp file + rename) to prevent partial files. Returns
/// the path actually written.
pub async fn export_record(record: &AwbRecord, dir: impl AsRef<Path>) -> Result<PathBuf, ExtractError> {
    let dir = dir.as_ref();
    let path = dir.join(export_file_name(record));

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| ExtractError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, record.to_pretty_json())
        .await
        .map_err(|e| ExtractError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, &path)
        .await
        .map_err(|e| ExtractError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;

    info!("Exported record to {}", path.display());
    Ok(path)
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Run one pipeline stage with progress bookkeeping.
async fn run_stage<T>(
    config: &ExtractionConfig,
    stage: ExtractionStage,
    fut: impl std::future::Future<Output = Result<T, ExtractError>>,
) -> Result<T, ExtractError> {
    let start = Instant::now();
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(stage);
    }
    match fut.await {
        Ok(value) => {
            if let Some(ref cb) = config.progress_callback {
                cb.on_stage_complete(stage, start.elapsed().as_millis() as u64);
            }
            Ok(value)
        }
        Err(e) => {
            if let Some(ref cb) = config.progress_callback {
                cb.on_extraction_error(stage, &e.to_string());
            }
            Err(e)
        }
    }
}

/// Instantiate a named provider with the given model.
fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, ExtractError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ExtractError::MissingCredential {
            hint: format!("Provider '{provider_name}' could not be initialised: {e}"),
        }
    })
}

/// Resolve the vision provider, from most-specific to least-specific.
///
/// The fallback chain lets library users and CLI users each set exactly as
/// much or as little as they need:
///
/// 1. **Pre-built provider** (`config.provider`) — the caller constructed
///    and credentialed the provider entirely; we use it as-is. Useful in
///    tests or when the caller needs custom middleware.
///
/// 2. **Named provider + model** (`config.provider_name`) — the caller named
///    a provider (e.g. `"gemini"`) and optional model; the factory reads the
///    corresponding API key (`GEMINI_API_KEY`, etc.) from the environment.
///
/// 3. **Environment pair** (`AWBX_LLM_PROVIDER` + `AWBX_MODEL`) — both env
///    vars set means the execution environment chose; checked before full
///    auto-detection so the model choice is honoured even when multiple API
///    keys are present.
///
/// 4. **Gemini preference** — when `GEMINI_API_KEY` is present, use Gemini
///    with `gemini-2.5-flash`. That is the pairing this extractor has always
///    been tuned against, so it wins over whatever other keys happen to be
///    in the environment.
///
/// 5. **Full auto-detection** (`ProviderFactory::from_env`) — scan all known
///    API key variables and take the first available provider.
///
/// Exhausting the chain is [`ExtractError::MissingCredential`].
fn resolve_provider(config: &ExtractionConfig) -> Result<Arc<dyn LLMProvider>, ExtractError> {
    const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

    // 1) User-provided provider takes priority
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    // 2) Provider name + model
    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_GEMINI_MODEL);
        return create_vision_provider(name, model);
    }

    // 3) Environment pair
    if let (Ok(prov), Ok(model)) = (
        std::env::var("AWBX_LLM_PROVIDER"),
        std::env::var("AWBX_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_vision_provider(&prov, &model);
        }
    }

    // 4) Prefer Gemini when its key is present
    if let Ok(key) = std::env::var("GEMINI_API_KEY") {
        if !key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_GEMINI_MODEL);
            return create_vision_provider("gemini", model);
        }
    }

    // 5) Full auto-detection
    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ExtractError::MissingCredential {
            hint: format!(
                "No vision provider could be auto-detected from the environment.\n\
                Set GEMINI_API_KEY (preferred), OPENAI_API_KEY, or ANTHROPIC_API_KEY.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
