//! Output types returned by the extraction entry points.

use crate::record::AwbRecord;
use serde::{Deserialize, Serialize};

/// The result of a successful extraction.
///
/// `raw_text` is the untouched model reply the record was recovered from,
/// kept for audit display; the record itself is the only thing the renderer
/// consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// The decoded Air Waybill record.
    pub record: AwbRecord,
    /// The model reply exactly as received, including any surrounding prose.
    pub raw_text: String,
    /// Timing and token accounting for the request.
    pub stats: ExtractionStats,
}

/// Timing and token statistics for one extraction request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Wall-clock time spent rasterising and encoding the first page.
    pub raster_duration_ms: u64,
    /// Wall-clock time spent waiting on the model.
    pub llm_duration_ms: u64,
    /// Total request time, input resolution included.
    pub total_duration_ms: u64,
    /// Prompt tokens reported by the provider.
    pub input_tokens: usize,
    /// Completion tokens reported by the provider.
    pub output_tokens: usize,
    /// Dimensions of the image sent to the model.
    pub image_width: u32,
    /// See `image_width`.
    pub image_height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn output_round_trips_through_json() {
        let record: AwbRecord =
            serde_json::from_value(json!({"Air Waybill Number": "020-12345678"})).unwrap();
        let output = ExtractionOutput {
            record,
            raw_text: "{\"Air Waybill Number\": \"020-12345678\"}".into(),
            stats: ExtractionStats {
                raster_duration_ms: 120,
                llm_duration_ms: 2400,
                total_duration_ms: 2600,
                input_tokens: 1500,
                output_tokens: 700,
                image_width: 1414,
                image_height: 2000,
            },
        };

        let json = serde_json::to_string_pretty(&output).unwrap();
        let back: ExtractionOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(back.record, output.record);
        assert_eq!(back.stats.llm_duration_ms, 2400);
        assert_eq!(back.raw_text, output.raw_text);
    }
}
