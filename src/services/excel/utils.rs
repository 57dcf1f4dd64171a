use std::collections::HashSet;
use once_cell::sync::Lazy;
use regex::Regex;

/// Placeholder for a header cell with no text.
pub const EMPTY_HEADER: &str = "__EMPTY";

static INT_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?\d+").expect("valid integer prefix pattern")
});

static FLOAT_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("valid float prefix pattern")
});

/// Names a header cell, suffixing `_1`, `_2`, ... when the name was already taken.
pub fn header_name(raw: &str, existing_names: &mut HashSet<String>) -> String {
    let base_name = if raw.is_empty() { EMPTY_HEADER } else { raw };

    let mut name = base_name.to_string();
    let mut counter = 1;
    while !existing_names.insert(name.clone()) {
        name = format!("{}_{}", base_name, counter);
        counter += 1;
    }

    name
}

/// Parses the leading integer of `s`, ignoring whatever follows it.
pub fn parse_int_prefix(s: &str) -> Option<i64> {
    let s = s.trim_start();
    INT_PREFIX
        .find(s)
        .and_then(|m| m.as_str().trim_start_matches('+').parse::<i64>().ok())
}

/// Parses the leading decimal number of `s` (`"85.5%"` gives `85.5`).
pub fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    FLOAT_PREFIX
        .find(s)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Rounds half away from zero to two decimal places.
pub fn round_to_two(value: f64) -> f64 {
    let scaled = value * 100.0;
    if !scaled.is_finite() {
        // too large to carry a fractional part
        return value;
    }
    scaled.round() / 100.0
}

/// Shortest decimal rendering; integral values print without a fraction.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        // avoid "-0"
        return "0".to_string();
    }
    value.to_string()
}
