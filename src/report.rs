//! Presentation: render an [`AwbRecord`] as a sectioned, human-readable
//! report.
//!
//! The one invariant that matters here: **a missing field never aborts the
//! view**. The upstream model output is not schema-guaranteed, so every
//! field access falls back to the `N/A` placeholder, absent lists render an
//! explicit "no data" line, and list elements that are not records are
//! skipped (that filtering lives in the [`crate::record`] views). Rendering
//! is a pure function of the record; it does no I/O and cannot fail.
//!
//! Section layout mirrors the paper AWB form: parties, routing, charge
//! codes, goods, charges, declarations, signatures.

use crate::record::{fields, AwbRecord, ChargePair, PrepaidCollect};
use once_cell::sync::Lazy;
use regex::Regex;

/// Placeholder shown for any absent, null, or blank field.
pub const PLACEHOLDER: &str = "N/A";

/// Fallback token used in the export filename when no waybill number was
/// extracted.
pub const UNKNOWN_WAYBILL: &str = "unknown";

/// Render the full report for a record.
///
/// Never fails: a record with no recognised field at all still produces the
/// complete layout, every value showing [`PLACEHOLDER`].
pub fn render_report(record: &AwbRecord) -> String {
    let mut out = String::with_capacity(2048);

    let field = |name: &str| record.text(name).unwrap_or_else(|| PLACEHOLDER.to_string());

    // ── Document details ─────────────────────────────────────────────────
    section(&mut out, "Document Details");
    line(&mut out, "Air Waybill Number", &field(fields::AIR_WAYBILL_NUMBER));
    line(&mut out, "Flight/Date", &field(fields::FLIGHT_DATE));
    line(&mut out, "Currency Code", &field(fields::CURRENCY_CODE));
    line(
        &mut out,
        "Airport of Departure",
        &field(fields::AIRPORT_OF_DEPARTURE),
    );
    line(
        &mut out,
        "Airport of Destination",
        &field(fields::AIRPORT_OF_DESTINATION),
    );
    line(&mut out, "Agent's IATA Code", &field(fields::AGENT_IATA_CODE));

    // ── Parties ──────────────────────────────────────────────────────────
    section(&mut out, "Shipper");
    block(&mut out, "Name and Address", &field(fields::SHIPPER_NAME_AND_ADDRESS));
    line(
        &mut out,
        "Account Number",
        &field(fields::SHIPPER_ACCOUNT_NUMBER),
    );

    section(&mut out, "Consignee");
    block(
        &mut out,
        "Name and Address",
        &field(fields::CONSIGNEE_NAME_AND_ADDRESS),
    );

    // ── Agent & routing ──────────────────────────────────────────────────
    section(&mut out, "Agent & Routing");
    line(
        &mut out,
        "Issuing Carrier's Agent",
        &field(fields::ISSUING_CARRIER_AGENT),
    );
    line(&mut out, "Issued by", &field(fields::ISSUED_BY));
    line(&mut out, "Account No", &field(fields::ACCOUNT_NO));

    let legs = record.routing();
    if legs.is_empty() {
        out.push_str("Routing: No routing data available\n");
    } else {
        out.push_str("Routing:\n");
        for leg in &legs {
            out.push_str(&format!(
                "  • To: {} | By: {}\n",
                opt(&leg.to),
                opt(&leg.by)
            ));
        }
    }

    // ── Charge codes ─────────────────────────────────────────────────────
    section(&mut out, "Charges Codes (CHGS)");
    let codes = record.charge_codes();
    if codes.is_empty() {
        out.push_str("No charge code data available\n");
    } else {
        for row in &codes {
            out.push_str(&format!("Code: {}\n", opt(&row.code)));
            out.push_str(&format!("  WT/VAL: {}\n", ppd_coll_list(&row.wt_val)));
            out.push_str(&format!("  Other:  {}\n", ppd_coll_list(&row.other)));
        }
    }

    // ── Goods ────────────────────────────────────────────────────────────
    section(&mut out, "Goods Description");
    let goods = record.goods_rows();
    if goods.is_empty() {
        out.push_str("No goods description data available\n");
    } else {
        for (i, item) in goods.iter().enumerate() {
            out.push_str(&format!("Item {}\n", i + 1));
            out.push_str(&format!(
                "  Pieces: {}  Gross Weight: {} {}\n",
                opt(&item.pieces),
                opt(&item.gross_weight),
                item.weight_unit.as_deref().unwrap_or(""),
            ));
            out.push_str(&format!(
                "  Chargeable Weight: {}  Rate: {}\n",
                opt(&item.chargeable_weight),
                opt(&item.rate),
            ));
            out.push_str(&format!(
                "  Charge: {}  Total: {}\n",
                opt(&item.charge),
                opt(&item.total),
            ));
            out.push_str(&format!(
                "  Rate Class/Commodity: {}\n",
                opt(&item.rate_class)
            ));
            block(
                &mut out,
                "  Nature and Quantity of Goods",
                opt(&item.nature_of_goods),
            );
        }
    }

    // ── Charges details ──────────────────────────────────────────────────
    section(&mut out, "Charges Details");
    let charges = record.charges_summary();
    if charges.is_empty() {
        out.push_str("No charges details available\n");
    } else {
        for summary in &charges {
            pair_line(&mut out, "Weight Charge", &summary.weight_charge);
            pair_line(&mut out, "Valuation Charge", &summary.valuation_charge);
            pair_line(&mut out, "Tax", &summary.tax);
            pair_line(
                &mut out,
                "Total Other Charges Due Agent",
                &summary.total_other_due_agent,
            );
            // Label kept as the schema spells it; see crate::prompts.
            pair_line(
                &mut out,
                "Total Other Charges Due Carrie",
                &summary.total_other_due_carrier,
            );
            line(&mut out, "Total Prepaid", opt(&summary.total_prepaid));
            line(&mut out, "Total Collect", opt(&summary.total_collect));
            line(
                &mut out,
                "Currency Conversion Rates",
                opt(&summary.currency_conversion_rates),
            );
            line(
                &mut out,
                "CC Charges at Dest Currency",
                opt(&summary.cc_charges_at_dest),
            );
        }
    }

    // ── Declarations & insurance ─────────────────────────────────────────
    section(&mut out, "Declarations & Insurance");
    line(
        &mut out,
        "Declared Value for Carriage",
        &field(fields::DECLARED_VALUE_FOR_CARRIAGE),
    );
    line(
        &mut out,
        "Declared Value for Customs",
        &field(fields::DECLARED_VALUE_FOR_CUSTOMS),
    );
    line(
        &mut out,
        "Amount of Insurance",
        &field(fields::AMOUNT_OF_INSURANCE),
    );

    // ── Additional information ───────────────────────────────────────────
    section(&mut out, "Additional Information");
    block(
        &mut out,
        "Handling Information",
        &field(fields::HANDLING_INFORMATION),
    );
    block(
        &mut out,
        "Accounting Information",
        &field(fields::ACCOUNTING_INFORMATION),
    );

    // ── Signatures & execution ───────────────────────────────────────────
    section(&mut out, "Signatures & Execution");
    line(&mut out, "Executed on", &field(fields::EXECUTED_ON));
    line(&mut out, "At (place)", &field(fields::AT_PLACE));
    line(
        &mut out,
        "Shipper/Agent Signature",
        &field(fields::SIGNATURE_OF_SHIPPER),
    );
    line(
        &mut out,
        "Carrier/Agent Signature",
        &field(fields::SIGNATURE_OF_CARRIER),
    );

    out
}

/// The untouched decoded record, pretty-printed, for audit display.
pub fn render_raw(record: &AwbRecord) -> String {
    record.to_pretty_json()
}

static RE_FILENAME_UNSAFE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]+").unwrap());

/// Export filename for a record: `awb_data_<waybill number>.json`, with the
/// number slugged for filesystem safety and [`UNKNOWN_WAYBILL`] when absent.
pub fn export_file_name(record: &AwbRecord) -> String {
    let number = record
        .waybill_number()
        .unwrap_or_else(|| UNKNOWN_WAYBILL.to_string());
    let slug = RE_FILENAME_UNSAFE.replace_all(&number, "_");
    let slug = slug.trim_matches('_');
    let slug = if slug.is_empty() { UNKNOWN_WAYBILL } else { slug };
    format!("awb_data_{slug}.json")
}

// ── Formatting helpers ───────────────────────────────────────────────────

fn section(out: &mut String, title: &str) {
    if !out.is_empty() {
        out.push('\n');
    }
    out.push_str(&format!("── {title} "));
    // Pad the rule out to a fixed width so sections line up.
    let used = title.chars().count() + 4;
    out.push_str(&"─".repeat(56usize.saturating_sub(used)));
    out.push('\n');
}

fn line(out: &mut String, label: &str, value: &str) {
    out.push_str(&format!("{label}: {value}\n"));
}

/// Multi-line values (addresses, handling notes) go on their own indented
/// block so line breaks inside the value survive.
fn block(out: &mut String, label: &str, value: &str) {
    if value.contains('\n') {
        out.push_str(&format!("{label}:\n"));
        for l in value.lines() {
            out.push_str(&format!("  {l}\n"));
        }
    } else {
        line(out, label, value);
    }
}

fn pair_line(out: &mut String, label: &str, pair: &Option<ChargePair>) {
    let (prepaid, collect) = match pair {
        Some(p) => (opt(&p.prepaid), opt(&p.collect)),
        None => (PLACEHOLDER, PLACEHOLDER),
    };
    out.push_str(&format!(
        "{label}: Prepaid {prepaid} | Collect {collect}\n"
    ));
}

fn ppd_coll_list(pairs: &[PrepaidCollect]) -> String {
    if pairs.is_empty() {
        return PLACEHOLDER.to_string();
    }
    pairs
        .iter()
        .map(|p| format!("PPD {} | COLL {}", opt(&p.ppd), opt(&p.coll)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn opt(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(PLACEHOLDER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> AwbRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn empty_record_renders_complete_layout_of_placeholders() {
        let report = render_report(&AwbRecord::default());

        // Every section is present
        for title in [
            "Document Details",
            "Shipper",
            "Consignee",
            "Agent & Routing",
            "Charges Codes (CHGS)",
            "Goods Description",
            "Charges Details",
            "Declarations & Insurance",
            "Additional Information",
            "Signatures & Execution",
        ] {
            assert!(report.contains(title), "missing section {title:?}");
        }

        // Scalar fields all show the placeholder
        assert!(report.contains("Air Waybill Number: N/A"));
        assert!(report.contains("Declared Value for Customs: N/A"));
        assert!(report.contains("Carrier/Agent Signature: N/A"));

        // Absent lists show their explicit no-data indicators
        assert!(report.contains("No routing data available"));
        assert!(report.contains("No charge code data available"));
        assert!(report.contains("No goods description data available"));
        assert!(report.contains("No charges details available"));
    }

    #[test]
    fn routing_leg_renders_the_to_by_line() {
        let r = record(json!({
            "Routing and Destination": [{"to": "JFK", "by": "AA"}]
        }));
        let report = render_report(&r);
        assert!(report.contains("To: JFK | By: AA"));
    }

    #[test]
    fn routing_skips_non_record_entries_without_failing() {
        let r = record(json!({
            "Routing and Destination": [{"to": "JFK", "by": "AA"}, "garbage", 17]
        }));
        let report = render_report(&r);
        assert!(report.contains("To: JFK | By: AA"));
        assert!(!report.contains("garbage"));
    }

    #[test]
    fn empty_goods_list_shows_no_data_indicator() {
        let r = record(json!({"Goods Description Table Rows": []}));
        let report = render_report(&r);
        assert!(report.contains("No goods description data available"));
    }

    #[test]
    fn goods_rows_render_all_nine_columns() {
        let r = record(json!({
            "Goods Description Table Rows": [{
                "No. of Pieces RCP": "3",
                "Gross Weight": "45.0",
                "kg/lb": "kg",
                "Rate Class / Commodity Item No.": "Q",
                "Chargeable Weight": "45.0",
                "Rate": "4.72",
                "Charge": "212.40",
                "Total": "212.40",
                "Nature and Quantity of Goods (incl. Dimensions or Volume)": "ELECTRONICS\n3 CTNS"
            }]
        }));
        let report = render_report(&r);
        assert!(report.contains("Item 1"));
        assert!(report.contains("Pieces: 3  Gross Weight: 45.0 kg"));
        assert!(report.contains("Rate: 4.72"));
        assert!(report.contains("Rate Class/Commodity: Q"));
        assert!(report.contains("ELECTRONICS"));
        assert!(report.contains("3 CTNS"));
    }

    #[test]
    fn charges_summary_renders_prepaid_and_collect_sides() {
        let r = record(json!({
            "Charges Details": [{
                "Weight Charge": {"Prepaid": "100.00", "Collect": ""},
                "Tax": {"Prepaid": "", "Collect": "8.00"},
                "Total Prepaid": "100.00",
                "Total Collect": "8.00"
            }]
        }));
        let report = render_report(&r);
        assert!(report.contains("Weight Charge: Prepaid 100.00 | Collect N/A"));
        assert!(report.contains("Tax: Prepaid N/A | Collect 8.00"));
        assert!(report.contains("Total Prepaid: 100.00"));
        assert!(report.contains("Total Collect: 8.00"));
    }

    #[test]
    fn multiline_address_is_indented_not_flattened() {
        let r = record(json!({
            "Shipper's Name and Address": "ACME CARGO\n1 AIRPORT WAY\nQUEENS NY"
        }));
        let report = render_report(&r);
        assert!(report.contains("Name and Address:\n  ACME CARGO\n  1 AIRPORT WAY\n  QUEENS NY"));
    }

    #[test]
    fn export_file_name_uses_waybill_number() {
        let r = record(json!({"Air Waybill Number": "020-12345678"}));
        assert_eq!(export_file_name(&r), "awb_data_020-12345678.json");
    }

    #[test]
    fn export_file_name_falls_back_to_unknown() {
        assert_eq!(export_file_name(&AwbRecord::default()), "awb_data_unknown.json");
        let blank = record(json!({"Air Waybill Number": "   "}));
        assert_eq!(export_file_name(&blank), "awb_data_unknown.json");
    }

    #[test]
    fn export_file_name_slugs_unsafe_characters() {
        let r = record(json!({"Air Waybill Number": "020/123 456\\78"}));
        assert_eq!(export_file_name(&r), "awb_data_020_123_456_78.json");
    }

    #[test]
    fn render_raw_is_the_exact_pretty_record() {
        let r = record(json!({"Air Waybill Number": "020-1", "X-Extra": [1, 2]}));
        let raw = render_raw(&r);
        assert!(raw.contains("\"X-Extra\""));
        assert_eq!(raw, r.to_pretty_json());
    }
}
