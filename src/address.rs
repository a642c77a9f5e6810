//! A1-style cell addresses.
//!
//! Columns are bijective base-26 numerals (`A` = 1 .. `Z` = 26, `AA` = 27)
//! shifted down by one so the working representation is zero-based. Rows are
//! 1-based in text and zero-based everywhere else; the shift happens only in
//! [`parse_cell_address`], [`format_cell_address`] and [`CellAddress`].

use crate::error::{EngineError, Result};
use std::fmt;
use std::str::FromStr;

/// Converts column letters to a zero-based column index (`A` -> 0, `AA` -> 26).
pub fn column_to_index(letters: &str) -> Result<u32> {
    if letters.is_empty() {
        return Err(EngineError::invalid_address(letters, "empty column"));
    }
    let mut value: u64 = 0;
    for byte in letters.bytes() {
        if !byte.is_ascii_alphabetic() {
            return Err(EngineError::invalid_address(
                letters,
                "column must contain only letters",
            ));
        }
        let digit = u64::from(byte.to_ascii_uppercase() - b'A' + 1);
        value = value * 26 + digit;
        if value > u64::from(u32::MAX) + 1 {
            return Err(EngineError::invalid_address(letters, "column out of range"));
        }
    }
    Ok((value - 1) as u32)
}

/// Converts a zero-based column index back to uppercase letters.
pub fn index_to_column(index: u32) -> String {
    let mut n = u64::from(index) + 1;
    let mut letters = Vec::with_capacity(4);
    while n > 0 {
        n -= 1;
        letters.push(b'A' + (n % 26) as u8);
        n /= 26;
    }
    letters.reverse();
    letters.into_iter().map(char::from).collect()
}

/// Renders zero-based coordinates as text, e.g. `(0, 0)` -> `A1`.
pub fn format_cell_address(row0: u32, col0: u32) -> String {
    format!("{}{}", index_to_column(col0), u64::from(row0) + 1)
}

/// Parses `^[A-Za-z]+[0-9]+$` with a row of at least 1.
pub fn parse_cell_address(text: &str) -> Result<CellAddress> {
    let split = text
        .bytes()
        .position(|b| !b.is_ascii_alphabetic())
        .ok_or_else(|| EngineError::invalid_address(text, "missing row number"))?;
    let (letters, digits) = text.split_at(split);
    if letters.is_empty() {
        return Err(EngineError::invalid_address(
            text,
            "address must start with column letters",
        ));
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(EngineError::invalid_address(
            text,
            "row must contain only digits",
        ));
    }
    let row: u32 = digits
        .parse()
        .map_err(|_| EngineError::invalid_address(text, "row out of range"))?;
    if row == 0 {
        return Err(EngineError::invalid_address(text, "rows start at 1"));
    }
    let col = column_to_index(letters)?;
    Ok(CellAddress {
        column: letters.to_ascii_uppercase(),
        row,
        col,
    })
}

/// A parsed cell reference. `column` is uppercase, `row` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellAddress {
    pub column: String,
    pub row: u32,
    col: u32,
}

impl CellAddress {
    /// Builds an address from zero-based coordinates.
    ///
    /// Returns `None` only for `row0 == u32::MAX`, whose 1-based row does not
    /// fit the text form.
    pub fn from_coords(row0: u32, col0: u32) -> Option<Self> {
        Some(Self {
            column: index_to_column(col0),
            row: row0.checked_add(1)?,
            col: col0,
        })
    }

    pub fn row0(&self) -> u32 {
        self.row - 1
    }

    pub fn col0(&self) -> u32 {
        self.col
    }
}

impl FromStr for CellAddress {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        parse_cell_address(s)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.column, self.row)
    }
}
