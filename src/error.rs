//! Error taxonomy for the addressing engine and the workbook accessor.
//!
//! Every failure is local and typed. Parsing errors carry the text that
//! failed, lookup errors carry the name that was not found, and file errors
//! carry the path involved. Nothing in this crate retries.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid cell address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("invalid range '{range}': {reason}")]
    InvalidRange { range: String, reason: String },

    #[error("invalid mention '{text}'")]
    InvalidMention { text: String },

    #[error("sheet not found: {sheet}")]
    SheetNotFound { sheet: String },

    #[error("workbook file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("failed to parse workbook {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("failed to write workbook {}: {message}", path.display())]
    Io { path: PathBuf, message: String },
}

impl EngineError {
    pub(crate) fn invalid_address(address: &str, reason: impl Into<String>) -> Self {
        EngineError::InvalidAddress {
            address: address.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_range(range: &str, reason: impl Into<String>) -> Self {
        EngineError::InvalidRange {
            range: range.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn sheet_not_found(sheet: &str) -> Self {
        EngineError::SheetNotFound {
            sheet: sheet.to_string(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::InvalidAddress { .. } => ErrorCode::InvalidAddress,
            EngineError::InvalidRange { .. } => ErrorCode::InvalidRange,
            EngineError::InvalidMention { .. } => ErrorCode::InvalidMention,
            EngineError::SheetNotFound { .. } => ErrorCode::SheetNotFound,
            EngineError::FileNotFound { .. } => ErrorCode::FileNotFound,
            EngineError::Parse { .. } => ErrorCode::ParseError,
            EngineError::Io { .. } => ErrorCode::IoError,
        }
    }
}

/// Stable codes for the HTTP layer, in the custom application range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum ErrorCode {
    /// Cell text is not `<letters><digits>` with a row of at least 1
    InvalidAddress = -32021,
    /// Range text has more than one `:` or an end fails address parsing
    InvalidRange = -32007,
    /// Text does not follow `@Sheet!A1[:B2]`
    InvalidMention = -32022,
    /// Sheet absent from the loaded workbook
    SheetNotFound = -32006,
    /// Backing workbook file does not exist
    FileNotFound = -32001,
    /// Backing workbook could not be decoded
    ParseError = -32700,
    /// Workbook could not be written
    IoError = -32012,
}

impl ErrorCode {
    pub fn code(&self) -> i32 {
        *self as i32
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCode::IoError)
    }

    pub fn category(&self) -> &'static str {
        match self {
            ErrorCode::InvalidAddress | ErrorCode::InvalidRange | ErrorCode::InvalidMention => {
                "validation_error"
            }
            ErrorCode::SheetNotFound | ErrorCode::FileNotFound => "resource_not_found",
            ErrorCode::ParseError | ErrorCode::IoError => "io_error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(ErrorCode::InvalidRange.code(), -32007);
        assert_eq!(ErrorCode::SheetNotFound.code(), -32006);
        assert_eq!(ErrorCode::FileNotFound.code(), -32001);
        assert_eq!(ErrorCode::ParseError.code(), -32700);
    }

    #[test]
    fn validation_errors_are_never_retryable() {
        let err = EngineError::invalid_address("1A", "column letters must come first");
        assert_eq!(err.code(), ErrorCode::InvalidAddress);
        assert_eq!(err.code().category(), "validation_error");
        assert!(!err.code().is_retryable());
        assert!(!ErrorCode::SheetNotFound.is_retryable());
        assert!(ErrorCode::IoError.is_retryable());
    }

    #[test]
    fn display_names_the_offending_input() {
        let err = EngineError::sheet_not_found("Sales");
        assert_eq!(err.to_string(), "sheet not found: Sales");

        let err = EngineError::invalid_range("A1:B2:C3", "expected at most one ':'");
        assert!(err.to_string().contains("A1:B2:C3"));
        assert_eq!(format!("{}", err.code()), "InvalidRange(-32007)");
    }
}
