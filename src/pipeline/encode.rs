//! Image encoding: `DynamicImage` → base64 PNG wrapped in `ImageData`.
//!
//! Vision APIs accept images as base64 data embedded in the JSON request
//! body. PNG is chosen over JPEG because it is lossless — the waybill's
//! small-print charge boxes and account numbers degrade badly under JPEG
//! artefacts. `detail: "high"` instructs GPT-4-class models to use the full
//! image tile budget; without it the fine print in the charges grid is lost.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode the rasterised page as a base64 PNG ready for the vision API.
pub fn encode_page(img: &DynamicImage) -> Result<ImageData, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded image → {} bytes base64", b64.len());

    Ok(ImageData::new(b64, "image/png").with_detail("high"))
}
