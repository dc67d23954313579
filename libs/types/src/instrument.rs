//! Instrument definitions and tick tables (TXT `J`/`JF`/`JB`/`JS` and `TT`
//! records, §4.4.2).

use crate::ids::InstrumentDesc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductType {
    Outright,
    Spread,
    OptionStrategies,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegSide {
    Bid,
    Ask,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leg {
    pub indesc: InstrumentDesc,
    pub ratio: i32,
    pub side: LegSide,
}

/// One monotonically-bounded tick-size row, stored as an *upper* price
/// bound after reversing the exchange's lower-bound publication order
/// (§4.4.2 tick-table handling).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickRow {
    pub upper_bound: i64, // i64::MAX represents "infinity" for the last row
    pub tick_size_numerator: i64,
    pub decimals: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickTable {
    pub name: String,
    pub rows: Vec<TickRow>,
}

impl TickTable {
    /// Resolve the applicable tick increment for `price`, scanning from the
    /// smallest upper bound to the largest (rows are stored in ascending
    /// order after the exchange's lower-bound list is reversed).
    pub fn increment_for(&self, price: i64) -> Option<&TickRow> {
        self.rows.iter().find(|row| price <= row.upper_bound)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentDefinition {
    pub indesc: InstrumentDesc,
    pub identifier: String,
    pub product_type: ProductType,
    pub decimals: u8,
    pub tick_value_numerator: i64,
    pub currency_code: &'static str,
    pub depth: u8,
    pub implied_depth: u8,
    pub legs: Vec<Leg>,
}

impl InstrumentDefinition {
    pub const DEFAULT_DEPTH: u8 = 5;
    pub const DEFAULT_IMPLIED_DEPTH: u8 = 1;
}

/// 16-entry currency lookup referenced by §4.4.2 ("Fill `currencyCode` via
/// a fixed 16-entry lookup"). Codes are the ISO numeric codes used on the
/// HSVF wire; unknown codes fall back to `"UNK"`.
pub const CURRENCY_TABLE: [(u16, &str); 16] = [
    (36, "AUD"),
    (124, "CAD"),
    (156, "CNY"),
    (208, "DKK"),
    (978, "EUR"),
    (826, "GBP"),
    (344, "HKD"),
    (356, "INR"),
    (392, "JPY"),
    (484, "MXN"),
    (578, "NOK"),
    (752, "SEK"),
    (702, "SGD"),
    (756, "CHF"),
    (840, "USD"),
    (710, "ZAR"),
];

pub fn lookup_currency(code: u16) -> &'static str {
    CURRENCY_TABLE
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, s)| *s)
        .unwrap_or("UNK")
}
