//! Rasterisation: render the waybill's first page to a `DynamicImage`.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async
//! contexts. `tokio::task::spawn_blocking` moves the work onto a thread
//! designed for blocking operations, so the Tokio worker threads never stall
//! during CPU-heavy rendering.
//!
//! ## Why only the first page?
//!
//! An Air Waybill is a one-page form; additional pages in an upload are
//! carbon copies or attachments. The pipeline therefore renders index 0 and
//! never inspects the rest — a deliberate scope restriction, not a skipped
//! case.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Rasterise the first page of a PDF into an image.
///
/// Runs inside `spawn_blocking` since pdfium operations are CPU-bound.
pub async fn rasterize_first_page(
    pdf_path: &Path,
    config: &ExtractionConfig,
) -> Result<DynamicImage, ExtractError> {
    let path = pdf_path.to_path_buf();
    let max_pixels = config.max_rendered_pixels;
    let password = config.password.clone();

    tokio::task::spawn_blocking(move || {
        rasterize_first_page_blocking(&path, max_pixels, password.as_deref())
    })
    .await
    .map_err(|e| ExtractError::Internal(format!("Raster task panicked: {}", e)))?
}

/// Blocking implementation of first-page rendering.
fn rasterize_first_page_blocking(
    pdf_path: &Path,
    max_pixels: u32,
    password: Option<&str>,
) -> Result<DynamicImage, ExtractError> {
    let pdfium = Pdfium::default();

    let document = pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                ExtractError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                ExtractError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            ExtractError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages, using the first", total_pages);

    if total_pages == 0 {
        return Err(ExtractError::EmptyDocument {
            path: pdf_path.to_path_buf(),
        });
    }

    let render_config = PdfRenderConfig::new()
        .set_target_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let page = pages.get(0).map_err(|e| ExtractError::RasterisationFailed {
        detail: format!("{:?}", e),
    })?;

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| ExtractError::RasterisationFailed {
            detail: format!("{:?}", e),
        })?;

    let image = bitmap.as_image();
    debug!("Rendered first page → {}x{} px", image.width(), image.height());

    Ok(image)
}
