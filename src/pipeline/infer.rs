//! The model call: send the page image and extraction prompt, return raw text.
//!
//! This module is intentionally thin — all prompt content lives in
//! [`crate::prompts`] so it can be changed without touching the transport
//! logic here.
//!
//! ## No retry
//!
//! Failures are surfaced immediately as [`ExtractError::ServiceError`] and
//! the request is over; the user resubmits if they want another attempt.
//! Authentication, quota, transport, and malformed-request failures are not
//! distinguished — only the detail text differs. The per-call deadline is
//! best-effort: we stop waiting, but the upstream service is not assumed to
//! honour cancellation.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::prompts::DEFAULT_EXTRACTION_PROMPT;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::debug;

/// The raw reply from one model call, with token accounting.
#[derive(Debug, Clone)]
pub struct InferenceReply {
    /// The model's textual output, untouched.
    pub text: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub duration_ms: u64,
}

/// Send the rasterised waybill page to the model and return its reply.
///
/// ## Message Layout
///
/// 1. **System message** — the extraction prompt with the embedded schema
///    (or a caller-supplied override)
/// 2. **User message** — the page PNG as a base64 image attachment (empty
///    text)
///
/// The empty user text is intentional: vision APIs require at least one user
/// turn to respond to, but the image carries all the actual content.
pub async fn run_inference(
    provider: &Arc<dyn LLMProvider>,
    image_data: ImageData,
    config: &ExtractionConfig,
) -> Result<InferenceReply, ExtractError> {
    let start = Instant::now();
    let prompt = config
        .prompt
        .as_deref()
        .unwrap_or(DEFAULT_EXTRACTION_PROMPT);

    let messages = vec![
        ChatMessage::system(prompt),
        ChatMessage::user_with_images("", vec![image_data]),
    ];

    let options = build_options(config);
    let deadline = Duration::from_secs(config.api_timeout_secs);

    let response = match timeout(deadline, provider.chat(&messages, Some(&options))).await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            return Err(ExtractError::ServiceError {
                detail: format!("{}", e),
            });
        }
        Err(_) => {
            return Err(ExtractError::ServiceError {
                detail: format!(
                    "no reply within {}s (deadline exceeded)",
                    config.api_timeout_secs
                ),
            });
        }
    };

    let duration = start.elapsed();
    debug!(
        "Model replied: {} input tokens, {} output tokens, {:?}",
        response.prompt_tokens, response.completion_tokens, duration
    );

    Ok(InferenceReply {
        text: response.content,
        input_tokens: response.prompt_tokens,
        output_tokens: response.completion_tokens,
        duration_ms: duration.as_millis() as u64,
    })
}

/// Build `CompletionOptions` from the extraction config.
fn build_options(config: &ExtractionConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_options_defaults() {
        let config = ExtractionConfig::default();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.1));
        assert_eq!(opts.max_tokens, Some(4096));
    }
}
