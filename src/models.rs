use serde::Serialize;

/// A decoded cell. Empty cells never make it into a [`RawRow`].
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    /// Values the report treats as "no data": empty text, zero, NaN and `false`.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Text(s) => s.is_empty(),
            CellValue::Number(n) => *n == 0.0 || n.is_nan(),
            CellValue::Bool(b) => !b,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

/// One sheet row keyed by its (untrimmed) column header, in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: Vec<(String, CellValue)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, header: impl Into<String>, value: CellValue) {
        self.cells.push((header.into(), value));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, CellValue)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, CellValue)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRecord {
    pub release: String,
    pub wc_build: String,
    pub pass_rate: Option<f64>,
    pub total_count: i64,
    pub passed: i64,
    pub failed: i64,
    pub skipped: i64,
    pub run_status: String,
    pub runtime: String,
    pub server_url: String,
    pub result_link: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetResult {
    #[serde(rename = "sheet")]
    pub sheet_name: String,
    pub rows: Vec<NormalizedRecord>,
}
