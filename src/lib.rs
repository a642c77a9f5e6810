pub mod address;
pub mod config;
pub mod error;
pub mod logging;
pub mod mention;
pub mod model;
pub mod range;
pub mod state;
pub mod tools;
pub mod workbook;
pub mod xlsx;

pub use address::{
    CellAddress, column_to_index, format_cell_address, index_to_column, parse_cell_address,
};
pub use config::{CliArgs, Command, EngineConfig};
pub use error::{EngineError, ErrorCode};
pub use logging::{LoggingConfig, init_logging};
pub use mention::{extract_mentions, format_mention, has_mentions, parse_mention};
pub use model::{CellData, CellValue, Extent, Mention, SheetSnapshot};
pub use range::{CellRange, RangeSpec, cells_in_range, parse_range};
pub use workbook::{AccessorStatus, Workbook, WorkbookAccessor};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use state::AppState;
use std::sync::Arc;

fn to_json<T: Serialize>(value: T) -> Result<Value> {
    serde_json::to_value(value).context("failed to serialize response")
}

/// Runs one CLI command against a fresh [`AppState`] and returns its JSON
/// response.
pub fn run_command(config: EngineConfig, command: Command) -> Result<Value> {
    let state = AppState::new(Arc::new(config));
    tracing::debug!(?command, "dispatching command");

    match command {
        Command::Sheets => to_json(tools::list_sheets(&state)?),
        Command::Read { sheet, range } => {
            to_json(tools::read_range(&state, tools::ReadRangeParams { sheet, range })?)
        }
        Command::Snapshot { sheet } => {
            to_json(tools::read_sheet(&state, tools::ReadSheetParams { sheet })?)
        }
        Command::Write {
            sheet,
            cell,
            value,
        } => {
            let params = tools::UpdateCellParams {
                sheet,
                cell,
                value: tools::parse_cli_value(&value),
            };
            to_json(tools::update_cell(&state, params)?)
        }
        Command::Formula { sheet, cell } => {
            to_json(tools::read_formula(&state, tools::ReadFormulaParams { sheet, cell })?)
        }
        Command::Save { path } => to_json(tools::save(&state, tools::SaveParams { path })?),
        Command::Mention { text } => {
            to_json(tools::parse_mention(tools::ParseMentionParams { text }))
        }
        Command::Mentions { text } => {
            to_json(tools::extract_mentions(tools::ExtractMentionsParams { text }))
        }
        Command::Resolve { text } => to_json(tools::resolve_mention(
            &state,
            tools::ResolveMentionParams { text },
        )?),
        Command::FormatMention {
            sheet,
            start_cell,
            end_cell,
        } => to_json(tools::format_mention(tools::FormatMentionParams {
            sheet,
            start_cell,
            end_cell,
        })),
        Command::InitExample => {
            let path = state.config().workbook_path.clone();
            xlsx::create_example_workbook(&path)
                .with_context(|| format!("failed to create example workbook {:?}", path))?;
            tracing::info!(path = %path.display(), "example workbook created");
            to_json(tools::SaveResponse { path })
        }
    }
}
