use crate::address::format_cell_address;
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scalar stored in a cell. Serializes as a bare JSON number or string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            CellValue::Number(_) => None,
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Number(f64::from(value))
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

/// One cell as reported to callers. `formula` is present iff the cell holds
/// a formula, stored without the leading `=`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CellData {
    pub address: String,
    pub value: Option<CellValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
}

impl CellData {
    pub fn empty(address: String) -> Self {
        Self {
            address,
            value: None,
            formula: None,
        }
    }
}

/// Inclusive rectangle in zero-based coordinates.
///
/// Used both for a sheet's used extent and for a normalized range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Extent {
    pub start_row: u32,
    pub start_col: u32,
    pub end_row: u32,
    pub end_col: u32,
}

impl Extent {
    pub fn cell(row0: u32, col0: u32) -> Self {
        Self {
            start_row: row0,
            start_col: col0,
            end_row: row0,
            end_col: col0,
        }
    }

    /// Smallest rectangle covering both corners, whatever their order.
    pub fn spanning(a: (u32, u32), b: (u32, u32)) -> Self {
        Self {
            start_row: a.0.min(b.0),
            start_col: a.1.min(b.1),
            end_row: a.0.max(b.0),
            end_col: a.1.max(b.1),
        }
    }

    /// Join with a single cell. Each bound moves independently and only
    /// outward.
    pub fn include(&mut self, row0: u32, col0: u32) {
        self.start_row = self.start_row.min(row0);
        self.start_col = self.start_col.min(col0);
        self.end_row = self.end_row.max(row0);
        self.end_col = self.end_col.max(col0);
    }

    pub fn contains(&self, row0: u32, col0: u32) -> bool {
        (self.start_row..=self.end_row).contains(&row0)
            && (self.start_col..=self.end_col).contains(&col0)
    }

    pub fn row_count(&self) -> u64 {
        u64::from(self.end_row - self.start_row) + 1
    }

    pub fn col_count(&self) -> u64 {
        u64::from(self.end_col - self.start_col) + 1
    }

    /// Every `(row0, col0)` inside the rectangle, row-major.
    pub fn positions(&self) -> impl Iterator<Item = (u32, u32)> + use<> {
        let Extent {
            start_row,
            start_col,
            end_row,
            end_col,
        } = *self;
        (start_row..=end_row).flat_map(move |row| (start_col..=end_col).map(move |col| (row, col)))
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            format_cell_address(self.start_row, self.start_col),
            format_cell_address(self.end_row, self.end_col)
        )
    }
}

/// Dense view of a whole sheet over its extent. `cells` holds only stored
/// cells, keyed by address in row-major order.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SheetSnapshot {
    pub sheet_name: String,
    pub cells: IndexMap<String, CellData>,
    pub row_count: u64,
    pub col_count: u64,
    pub extent: Option<Extent>,
}

/// A parsed `@Sheet!A1[:B2]` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Mention {
    pub sheet: String,
    pub start_cell: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_cell: Option<String>,
    pub is_range: bool,
}

impl Mention {
    /// Range text for the accessor: `A1` or `A1:B3`.
    pub fn range_text(&self) -> String {
        match &self.end_cell {
            Some(end) => format!("{}:{}", self.start_cell, end),
            None => self.start_cell.clone(),
        }
    }
}
