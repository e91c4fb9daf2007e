//! The extraction prompt sent to the vision model.
//!
//! Centralising the prompt here serves two purposes:
//!
//! 1. **Single source of truth** — the schema the model is instructed
//!    against and the field names the renderer reads must stay in lockstep;
//!    both live in this crate and unit tests cross-check them.
//!
//! 2. **Testability** — unit tests can inspect the prompt directly without
//!    spinning up a real model, so constraint regressions are caught cheaply.
//!
//! Callers can override the default via
//! [`crate::config::ExtractionConfig::prompt`]; the constant here is used
//! only when no override is provided.
//!
//! Note the key `"Total Other Charges Due Carrie"` in the charges block: the
//! misspelling is part of the schema the model has always been instructed
//! against, and real replies use it. Correcting it here would silently break
//! matching — it must stay as written.

/// Default extraction prompt for a rasterised Air Waybill page.
///
/// Three constraints the model must honour: do not make up headers that are
/// not on the document, do not make up values, and emit JSON only with no
/// code-fence markup.
pub const DEFAULT_EXTRACTION_PROMPT: &str = r#"This is an Air Waybill, extract all information in it with the headers then export it in json format. Do not make up any header. Do not make up any information. Do not include ```json ... ``` in the output.
    {"Air Waybill Number": " ",
     "Shipper's Name and Address": " ",
     "Shipper's Account Number": " ",
     "Consignee's Name and Address": " ",
     "Issuing Carrier's Agent Name and City": "",
     "Issued by": " ",
     "Agent's IATA Code": "",
     "Account No": "",
     "Airport of Departure (Addr. of First Carrier) and Requested Routing": "",
     "Routing and Destination": [{"to": " ", "by": " "}],
     "Airport of Destination": " ",
     "Flight/Date": " ",
     "Handling Information": " ",
     "Accounting Information": " ",
     "Currency Code": " ",
     "CHGS": [{"CHGS Code":" ", "WT/VAL": [{"PPD": " ", "COLL":" "}], "Other": [{"PPD": " ", "COLL":" "}]}],
     "Declared Value for Carriage": " ",
     "Declared Value for Customs": " ",
     "Amount of Insurance": "",
     "Goods Description Table Rows": [
        {
        "No. of Pieces RCP": "",
        "Gross Weight": "",
        "kg/lb": "",
        "Rate Class / Commodity Item No.": "",
        "Chargeable Weight": "",
        "Rate": "",
        "Charge": "",
        "Total": "",
        "Nature and Quantity of Goods (incl. Dimensions or Volume)": ""
        }],
     "Charges Details": [
        {
        "Weight Charge": {"Prepaid": "", "Collect": ""},
        "Valuation Charge": {"Prepaid": "", "Collect": ""},
        "Tax": {"Prepaid": "", "Collect": ""},
        "Total Other Charges Due Agent": {"Prepaid": "", "Collect": ""},
        "Total Other Charges Due Carrie": {"Prepaid": "", "Collect": ""},
        "Total Prepaid": "",
        "Total Collect": "",
        "Currency Conversion Rates": "",
        "CC Charges at Dest Currency":""
        }],
     "Signature of Shipper of his Agent": "",
     "Executed on (date)": "",
     "at (place)": "",
     "Signature of Issuing Carrier or its Agent": ""
    }"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::fields;

    #[test]
    fn prompt_states_all_three_constraints() {
        assert!(DEFAULT_EXTRACTION_PROMPT.contains("Do not make up any header"));
        assert!(DEFAULT_EXTRACTION_PROMPT.contains("Do not make up any information"));
        assert!(DEFAULT_EXTRACTION_PROMPT.contains("Do not include ```json"));
    }

    #[test]
    fn prompt_schema_names_every_rendered_field() {
        for field in fields::ALL_TOP_LEVEL {
            assert!(
                DEFAULT_EXTRACTION_PROMPT.contains(&format!("\"{field}\"")),
                "prompt schema is missing field {field:?}"
            );
        }
    }

    #[test]
    fn prompt_keeps_the_misspelled_carrier_key() {
        // The historical schema key; replies match this exact spelling.
        assert!(DEFAULT_EXTRACTION_PROMPT.contains("\"Total Other Charges Due Carrie\""));
        assert!(!DEFAULT_EXTRACTION_PROMPT.contains("\"Total Other Charges Due Carrier\""));
    }
}
