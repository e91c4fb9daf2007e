//! The structured Air Waybill record decoded from a model reply.
//!
//! ## Why a map, not a struct?
//!
//! The model's output is never schema-guaranteed: fields go missing, extra
//! fields appear, strings arrive as numbers. [`AwbRecord`] therefore wraps
//! the decoded JSON object as-is (`serde_json::Map`), so unexpected fields
//! survive verbatim into the export, and offers *lenient typed views* on top:
//! scalar access that tolerates numbers and booleans, and list views that
//! skip elements which are not objects instead of failing the whole record.
//!
//! The invariant the renderer relies on: an `AwbRecord` only ever exists as
//! the result of a successful JSON decode. There is no half-decoded state.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Canonical top-level field names, exactly as the model is instructed to
/// emit them. These are case-sensitive and must not be renamed or re-derived;
/// the prompt schema and the renderer both key off this list.
pub mod fields {
    pub const AIR_WAYBILL_NUMBER: &str = "Air Waybill Number";
    pub const SHIPPER_NAME_AND_ADDRESS: &str = "Shipper's Name and Address";
    pub const SHIPPER_ACCOUNT_NUMBER: &str = "Shipper's Account Number";
    pub const CONSIGNEE_NAME_AND_ADDRESS: &str = "Consignee's Name and Address";
    pub const ISSUING_CARRIER_AGENT: &str = "Issuing Carrier's Agent Name and City";
    pub const ISSUED_BY: &str = "Issued by";
    pub const AGENT_IATA_CODE: &str = "Agent's IATA Code";
    pub const ACCOUNT_NO: &str = "Account No";
    pub const AIRPORT_OF_DEPARTURE: &str =
        "Airport of Departure (Addr. of First Carrier) and Requested Routing";
    pub const ROUTING_AND_DESTINATION: &str = "Routing and Destination";
    pub const AIRPORT_OF_DESTINATION: &str = "Airport of Destination";
    pub const FLIGHT_DATE: &str = "Flight/Date";
    pub const HANDLING_INFORMATION: &str = "Handling Information";
    pub const ACCOUNTING_INFORMATION: &str = "Accounting Information";
    pub const CURRENCY_CODE: &str = "Currency Code";
    pub const CHGS: &str = "CHGS";
    pub const DECLARED_VALUE_FOR_CARRIAGE: &str = "Declared Value for Carriage";
    pub const DECLARED_VALUE_FOR_CUSTOMS: &str = "Declared Value for Customs";
    pub const AMOUNT_OF_INSURANCE: &str = "Amount of Insurance";
    pub const GOODS_ROWS: &str = "Goods Description Table Rows";
    pub const CHARGES_DETAILS: &str = "Charges Details";
    pub const SIGNATURE_OF_SHIPPER: &str = "Signature of Shipper of his Agent";
    pub const EXECUTED_ON: &str = "Executed on (date)";
    pub const AT_PLACE: &str = "at (place)";
    pub const SIGNATURE_OF_CARRIER: &str = "Signature of Issuing Carrier or its Agent";

    /// Every top-level field, in schema order.
    pub const ALL_TOP_LEVEL: &[&str] = &[
        AIR_WAYBILL_NUMBER,
        SHIPPER_NAME_AND_ADDRESS,
        SHIPPER_ACCOUNT_NUMBER,
        CONSIGNEE_NAME_AND_ADDRESS,
        ISSUING_CARRIER_AGENT,
        ISSUED_BY,
        AGENT_IATA_CODE,
        ACCOUNT_NO,
        AIRPORT_OF_DEPARTURE,
        ROUTING_AND_DESTINATION,
        AIRPORT_OF_DESTINATION,
        FLIGHT_DATE,
        HANDLING_INFORMATION,
        ACCOUNTING_INFORMATION,
        CURRENCY_CODE,
        CHGS,
        DECLARED_VALUE_FOR_CARRIAGE,
        DECLARED_VALUE_FOR_CUSTOMS,
        AMOUNT_OF_INSURANCE,
        GOODS_ROWS,
        CHARGES_DETAILS,
        SIGNATURE_OF_SHIPPER,
        EXECUTED_ON,
        AT_PLACE,
        SIGNATURE_OF_CARRIER,
    ];
}

/// A decoded Air Waybill record.
///
/// Wraps the raw JSON object so unexpected extra fields are preserved through
/// the export. All field access is optional and lenient; see the typed view
/// methods.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AwbRecord {
    map: Map<String, Value>,
}

impl AwbRecord {
    /// Wrap an already-decoded JSON object.
    pub fn new(map: Map<String, Value>) -> Self {
        Self { map }
    }

    /// The underlying JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.map
    }

    /// Consume the record, yielding the underlying JSON object.
    pub fn into_map(self) -> Map<String, Value> {
        self.map
    }

    /// True when the record has no fields at all.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Raw value of a field, if present.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.map.get(field)
    }

    /// Lenient scalar access: strings (trimmed), numbers, and booleans all
    /// yield text. Absent fields, JSON null, objects, arrays, and blank
    /// strings are all the same "unknown" state and yield `None`.
    pub fn text(&self, field: &str) -> Option<String> {
        self.map.get(field).and_then(lenient_text)
    }

    /// The extracted waybill number, when present and non-blank.
    pub fn waybill_number(&self) -> Option<String> {
        self.text(fields::AIR_WAYBILL_NUMBER)
    }

    /// Routing legs (`Routing and Destination`), skipping any list element
    /// that is not an object.
    pub fn routing(&self) -> Vec<RoutingLeg> {
        self.objects(fields::ROUTING_AND_DESTINATION)
    }

    /// Charge-code rows (`CHGS`), skipping non-object elements.
    pub fn charge_codes(&self) -> Vec<ChargeCodeRow> {
        self.objects(fields::CHGS)
    }

    /// Goods description rows, skipping non-object elements.
    pub fn goods_rows(&self) -> Vec<GoodsRow> {
        self.objects(fields::GOODS_ROWS)
    }

    /// Charges summary blocks (`Charges Details`), skipping non-object
    /// elements. The schema describes a single-element list but the view
    /// tolerates any number.
    pub fn charges_summary(&self) -> Vec<ChargesSummary> {
        self.objects(fields::CHARGES_DETAILS)
    }

    /// Pretty-printed JSON of the exact record, for the export and the raw
    /// audit display.
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.map).unwrap_or_else(|_| "{}".to_string())
    }

    fn objects<T: DeserializeOwned>(&self, field: &str) -> Vec<T> {
        self.map.get(field).map(collect_objects).unwrap_or_default()
    }
}

/// Normalise a JSON scalar to display text. Objects, arrays, null, and blank
/// strings yield `None`.
fn lenient_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Object(_) | Value::Array(_) => None,
    }
}

/// Collect the object-shaped elements of an array value into typed rows,
/// skipping everything else. A non-array value yields no rows.
fn collect_objects<T: DeserializeOwned>(value: &Value) -> Vec<T> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter(|item| item.is_object())
            .filter_map(|item| serde_json::from_value(item.clone()).ok())
            .collect(),
        _ => Vec::new(),
    }
}

// ── serde helpers for the typed views ────────────────────────────────────

/// Deserialize any JSON value into lenient display text. Never errors, so a
/// single odd value cannot sink its containing row.
fn de_lenient<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(lenient_text(&value))
}

/// Deserialize an object into a `ChargePair`; anything else becomes `None`.
fn de_pair<'de, D>(deserializer: D) -> Result<Option<ChargePair>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Object(_) => serde_json::from_value(value).ok(),
        _ => None,
    })
}

/// Deserialize an array into typed rows, skipping non-object elements;
/// anything that is not an array yields an empty list.
fn de_object_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(collect_objects(&value))
}

// ── Typed nested views ───────────────────────────────────────────────────

/// One leg of the requested routing: destination and carrier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutingLeg {
    #[serde(default, deserialize_with = "de_lenient")]
    pub to: Option<String>,
    #[serde(default, deserialize_with = "de_lenient")]
    pub by: Option<String>,
}

/// A prepaid/collect value pair as it appears in the CHGS columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrepaidCollect {
    #[serde(default, rename = "PPD", deserialize_with = "de_lenient")]
    pub ppd: Option<String>,
    #[serde(default, rename = "COLL", deserialize_with = "de_lenient")]
    pub coll: Option<String>,
}

/// One charge-code row: the code plus its WT/VAL and Other prepaid/collect
/// columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChargeCodeRow {
    #[serde(default, rename = "CHGS Code", deserialize_with = "de_lenient")]
    pub code: Option<String>,
    #[serde(default, rename = "WT/VAL", deserialize_with = "de_object_list")]
    pub wt_val: Vec<PrepaidCollect>,
    #[serde(default, rename = "Other", deserialize_with = "de_object_list")]
    pub other: Vec<PrepaidCollect>,
}

/// One row of the goods description table (9 named columns).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoodsRow {
    #[serde(default, rename = "No. of Pieces RCP", deserialize_with = "de_lenient")]
    pub pieces: Option<String>,
    #[serde(default, rename = "Gross Weight", deserialize_with = "de_lenient")]
    pub gross_weight: Option<String>,
    #[serde(default, rename = "kg/lb", deserialize_with = "de_lenient")]
    pub weight_unit: Option<String>,
    #[serde(
        default,
        rename = "Rate Class / Commodity Item No.",
        deserialize_with = "de_lenient"
    )]
    pub rate_class: Option<String>,
    #[serde(default, rename = "Chargeable Weight", deserialize_with = "de_lenient")]
    pub chargeable_weight: Option<String>,
    #[serde(default, rename = "Rate", deserialize_with = "de_lenient")]
    pub rate: Option<String>,
    #[serde(default, rename = "Charge", deserialize_with = "de_lenient")]
    pub charge: Option<String>,
    #[serde(default, rename = "Total", deserialize_with = "de_lenient")]
    pub total: Option<String>,
    #[serde(
        default,
        rename = "Nature and Quantity of Goods (incl. Dimensions or Volume)",
        deserialize_with = "de_lenient"
    )]
    pub nature_of_goods: Option<String>,
}

/// A named charge with separate prepaid and collect amounts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChargePair {
    #[serde(default, rename = "Prepaid", deserialize_with = "de_lenient")]
    pub prepaid: Option<String>,
    #[serde(default, rename = "Collect", deserialize_with = "de_lenient")]
    pub collect: Option<String>,
}

/// The charges summary block: per-charge prepaid/collect pairs plus totals
/// and conversion-rate fields.
///
/// The serde rename `"Total Other Charges Due Carrie"` is intentional: it is
/// the literal key of the historical schema (see [`crate::prompts`]) and the
/// key real replies carry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChargesSummary {
    #[serde(default, rename = "Weight Charge", deserialize_with = "de_pair")]
    pub weight_charge: Option<ChargePair>,
    #[serde(default, rename = "Valuation Charge", deserialize_with = "de_pair")]
    pub valuation_charge: Option<ChargePair>,
    #[serde(default, rename = "Tax", deserialize_with = "de_pair")]
    pub tax: Option<ChargePair>,
    #[serde(
        default,
        rename = "Total Other Charges Due Agent",
        deserialize_with = "de_pair"
    )]
    pub total_other_due_agent: Option<ChargePair>,
    #[serde(
        default,
        rename = "Total Other Charges Due Carrie",
        deserialize_with = "de_pair"
    )]
    pub total_other_due_carrier: Option<ChargePair>,
    #[serde(default, rename = "Total Prepaid", deserialize_with = "de_lenient")]
    pub total_prepaid: Option<String>,
    #[serde(default, rename = "Total Collect", deserialize_with = "de_lenient")]
    pub total_collect: Option<String>,
    #[serde(
        default,
        rename = "Currency Conversion Rates",
        deserialize_with = "de_lenient"
    )]
    pub currency_conversion_rates: Option<String>,
    #[serde(
        default,
        rename = "CC Charges at Dest Currency",
        deserialize_with = "de_lenient"
    )]
    pub cc_charges_at_dest: Option<String>,
}
