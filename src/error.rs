//! Error types for the awb-extract library.
//!
//! Every failure in the pipeline is terminal for the request that produced
//! it: there is no automatic retry and no partial result. The variants fall
//! into the stages that can fail:
//!
//! * input resolution (missing/unreadable/non-PDF files, download failures)
//! * rasterisation (corrupt, encrypted, or empty documents)
//! * the remote model call ([`ExtractError::ServiceError`] — deliberately a
//!   single undifferentiated channel; callers cannot distinguish an auth
//!   failure from a quota failure, only read the detail text)
//! * recovery parsing ([`ExtractError::NoJsonFound`] and
//!   [`ExtractError::MalformedJson`], which carry the untouched model reply
//!   so it can be shown for manual inspection)
//!
//! Use [`ExtractError::raw_text`] to retrieve the preserved reply when
//! presenting a parse failure to a user.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the awb-extract library.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// No document bytes were supplied at all.
    #[error("No PDF document provided.\nSupply a file path, URL, or non-empty byte buffer.")]
    MissingDocument,

    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Rasterisation errors ──────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be decoded.
    #[error("PDF '{path}' could not be decoded: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The document decoded but contains no pages to rasterise.
    #[error("PDF '{path}' contains no pages")]
    EmptyDocument { path: PathBuf },

    /// pdfium returned an error while rendering the first page.
    #[error("Rasterisation failed: {detail}")]
    RasterisationFailed { detail: String },

    // ── Model errors ──────────────────────────────────────────────────────
    /// No usable credential / provider could be resolved.
    #[error("No vision model credential configured.\n{hint}")]
    MissingCredential { hint: String },

    /// The remote inference call failed.
    ///
    /// Authentication, quota, transport, and malformed-request failures all
    /// land here; the distinction only survives in the detail text.
    #[error("Vision model call failed: {detail}")]
    ServiceError { detail: String },

    // ── Recovery-parse errors ─────────────────────────────────────────────
    /// The model reply contains no JSON object span at all.
    ///
    /// `raw` is the untouched reply, preserved for manual inspection.
    #[error("The model reply contains no JSON object.\nInspect the raw reply to see what was returned instead.")]
    NoJsonFound { raw: String },

    /// A brace-delimited span was found but did not decode as JSON.
    #[error("The model reply contains a JSON-like span that failed to decode: {detail}")]
    MalformedJson { raw: String, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the export file.
    #[error("Failed to write export file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExtractError {
    /// The untouched model reply, when this error preserved one.
    ///
    /// Only the recovery-parse variants carry the reply; every earlier
    /// failure happened before any text was produced.
    pub fn raw_text(&self) -> Option<&str> {
        match self {
            ExtractError::NoJsonFound { raw } | ExtractError::MalformedJson { raw, .. } => {
                Some(raw)
            }
            _ => None,
        }
    }

    /// True when this failure happened during recovery parsing, i.e. the
    /// model did reply but the reply was unusable.
    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self,
            ExtractError::NoJsonFound { .. } | ExtractError::MalformedJson { .. }
        )
    }
}
