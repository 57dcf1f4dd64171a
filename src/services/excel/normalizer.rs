//! Maps a decoded sheet row onto the fixed release-report record.
//!
//! Absent or blank fields fall back to per-field defaults; nothing here fails.

use std::collections::HashMap;

use super::utils::{format_number, parse_float_prefix, parse_int_prefix, round_to_two};
use crate::models::{CellValue, NormalizedRecord, RawRow};

mod columns {
    pub const RELEASE: &str = "Release";
    pub const WC_BUILD: &str = "WC - Build Number";
    pub const PASS_RATE: &str = "Pass Rate";
    pub const TEST_CASE_COUNT: &str = "Test Case Count";
    pub const PASS_COUNT: &str = "Test Case Pass Count";
    pub const FAIL_COUNT: &str = "Test Case Fail Count";
    pub const SKIPPED_COUNT: &str = "Test Case Skipped Count";
    pub const RUN_STATUS: &str = "Run Status";
    pub const RUNTIME: &str = "Runtime";
    pub const SERVER_URL: &str = "Server URL";
    pub const RESULT_LINK: &str = "Result Link";
}

const MISSING_BUILD: &str = "N/A";
const MISSING_LINK: &str = "#";

/// A row with trimmed keys and trimmed text values. Later duplicates win.
struct TrimmedRow<'a> {
    fields: HashMap<&'a str, CellValue>,
}

impl<'a> TrimmedRow<'a> {
    fn new(row: &'a RawRow) -> Self {
        let fields = row
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    CellValue::Text(s) => CellValue::text(s.trim()),
                    other => other.clone(),
                };
                (key.trim(), value)
            })
            .collect();
        Self { fields }
    }

    fn get(&self, key: &str) -> Option<&CellValue> {
        self.fields.get(key)
    }

    fn present(&self, key: &str) -> Option<&CellValue> {
        self.get(key).filter(|v| !v.is_blank())
    }

    fn string_or(&self, key: &str, default: &str) -> String {
        self.present(key)
            .map(cell_to_string)
            .unwrap_or_else(|| default.to_string())
    }

    fn count(&self, key: &str) -> i64 {
        self.present(key).and_then(cell_to_int).unwrap_or(0)
    }
}

fn cell_to_string(value: &CellValue) -> String {
    match value {
        CellValue::Text(s) => s.clone(),
        CellValue::Number(n) => format_number(*n),
        CellValue::Bool(b) => b.to_string(),
    }
}

fn cell_to_int(value: &CellValue) -> Option<i64> {
    match value {
        CellValue::Text(s) => parse_int_prefix(s),
        CellValue::Number(n) => {
            let n = n.trunc();
            // `as` saturates; out-of-range counts are treated as unparseable
            (i64::MIN as f64..i64::MAX as f64)
                .contains(&n)
                .then_some(n as i64)
        }
        CellValue::Bool(_) => None,
    }
}

/// Fractions below 1 are scaled to a percentage; anything else already is one.
/// Unparseable values give `None` rather than a bogus number.
pub fn pass_rate(value: &CellValue) -> Option<f64> {
    let v = match value {
        CellValue::Number(n) => *n,
        CellValue::Text(s) => parse_float_prefix(s)?,
        CellValue::Bool(_) => return None,
    };
    if !v.is_finite() {
        return None;
    }

    let percent = if v < 1.0 { v * 100.0 } else { v };
    if !percent.is_finite() {
        return None;
    }
    Some(round_to_two(percent))
}

pub fn normalize_row(row: &RawRow) -> NormalizedRecord {
    let row = TrimmedRow::new(row);

    NormalizedRecord {
        release: row.string_or(columns::RELEASE, ""),
        wc_build: row.string_or(columns::WC_BUILD, MISSING_BUILD),
        pass_rate: row.get(columns::PASS_RATE).and_then(pass_rate),
        total_count: row.count(columns::TEST_CASE_COUNT),
        passed: row.count(columns::PASS_COUNT),
        failed: row.count(columns::FAIL_COUNT),
        skipped: row.count(columns::SKIPPED_COUNT),
        run_status: row.string_or(columns::RUN_STATUS, ""),
        runtime: row.string_or(columns::RUNTIME, ""),
        server_url: row.string_or(columns::SERVER_URL, MISSING_LINK),
        result_link: row.string_or(columns::RESULT_LINK, MISSING_LINK),
    }
}
