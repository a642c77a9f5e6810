//! Range text (`A1`, `B2:D10`) parsing and expansion.

use crate::address::{CellAddress, format_cell_address, parse_cell_address};
use crate::error::{EngineError, Result};
use crate::model::Extent;

/// Raw ends of a range, uppercased, in the order they were written. Neither
/// end is validated as an address yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSpec {
    pub start: String,
    pub end: String,
}

impl RangeSpec {
    pub fn is_single_cell(&self) -> bool {
        self.start == self.end
    }
}

/// Splits on a single `:`. A bare cell yields `start == end`.
pub fn parse_range(text: &str) -> Result<RangeSpec> {
    let mut parts = text.split(':');
    let start = parts.next().unwrap_or_default();
    let end = parts.next();
    if parts.next().is_some() {
        return Err(EngineError::invalid_range(text, "expected at most one ':'"));
    }
    let start = start.to_ascii_uppercase();
    let end = match end {
        Some(end) => end.to_ascii_uppercase(),
        None => start.clone(),
    };
    Ok(RangeSpec { start, end })
}

/// A range whose ends are both valid addresses. Order is preserved;
/// [`CellRange::bounds`] normalizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellRange {
    pub start: CellAddress,
    pub end: CellAddress,
}

impl CellRange {
    pub fn parse(text: &str) -> Result<Self> {
        let ends = parse_range(text)?;
        let start = parse_end(text, &ends.start)?;
        let end = parse_end(text, &ends.end)?;
        Ok(Self { start, end })
    }

    pub fn bounds(&self) -> Extent {
        Extent::spanning(
            (self.start.row0(), self.start.col0()),
            (self.end.row0(), self.end.col0()),
        )
    }
}

fn parse_end(range: &str, end: &str) -> Result<CellAddress> {
    parse_cell_address(end).map_err(|err| EngineError::invalid_range(range, err.to_string()))
}

/// Every address in the normalized range, row-major, both ends inclusive.
pub fn cells_in_range(text: &str) -> Result<Vec<String>> {
    let bounds = CellRange::parse(text)?.bounds();
    Ok(bounds
        .positions()
        .map(|(row, col)| format_cell_address(row, col))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn single_cell_range() {
        let ends = parse_range("b7").unwrap();
        assert_eq!(ends.start, "B7");
        assert_eq!(ends.end, "B7");
        assert!(ends.is_single_cell());
    }

    #[test]
    fn preserves_written_order() {
        let ends = parse_range("d10:a1").unwrap();
        assert_eq!(ends.start, "D10");
        assert_eq!(ends.end, "A1");
    }

    #[test]
    fn rejects_more_than_one_colon() {
        assert_matches!(parse_range("A1:B2:C3"), Err(EngineError::InvalidRange { .. }));
        assert_matches!(parse_range("A1::B2"), Err(EngineError::InvalidRange { .. }));
    }

    #[test]
    fn parse_range_does_not_validate_ends() {
        let ends = parse_range("foo:bar").unwrap();
        assert_eq!(ends.start, "FOO");
        assert_matches!(CellRange::parse("foo:bar"), Err(EngineError::InvalidRange { .. }));
        assert_matches!(CellRange::parse("A1:"), Err(EngineError::InvalidRange { .. }));
    }

    #[test]
    fn expands_row_major() {
        assert_eq!(
            cells_in_range("A1:B2").unwrap(),
            vec!["A1", "B1", "A2", "B2"]
        );
        assert_eq!(cells_in_range("C3").unwrap(), vec!["C3"]);
    }

    #[test]
    fn reversed_and_mixed_corners_normalize() {
        let forward = cells_in_range("A1:B10").unwrap();
        assert_eq!(cells_in_range("B10:A1").unwrap(), forward);
        assert_eq!(cells_in_range("B1:A10").unwrap(), forward);
        assert_eq!(forward.len(), 20);
    }

    #[test]
    fn crosses_column_letter_boundaries() {
        assert_eq!(
            cells_in_range("Y1:AB1").unwrap(),
            vec!["Y1", "Z1", "AA1", "AB1"]
        );
    }
}
