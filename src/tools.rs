//! Typed request/response handlers over the shared [`AppState`].
//!
//! Each handler takes the lock once, so a write and its autosave happen as
//! one unit.

use crate::error::Result;
use crate::logging::workbook_span;
use crate::mention;
use crate::model::{CellData, CellValue, Extent, Mention, SheetSnapshot};
use crate::range::CellRange;
use crate::state::AppState;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SheetListResponse {
    pub sheets: Vec<String>,
}

pub fn list_sheets(state: &AppState) -> Result<SheetListResponse> {
    let _span = workbook_span("list_sheets", None).entered();
    let sheets = state.with_workbook(|wb| wb.list_sheets())?;
    Ok(SheetListResponse { sheets })
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReadRangeParams {
    pub sheet: String,
    /// `A1` or `A1:C10`; corners may be given in any order
    pub range: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RangeResponse {
    pub sheet: String,
    /// Normalized range text, top-left first
    pub range: String,
    pub rows: Vec<Vec<CellData>>,
}

pub fn read_range(state: &AppState, params: ReadRangeParams) -> Result<RangeResponse> {
    let _span = workbook_span("read_range", Some(&params.sheet)).entered();
    let rows = state.with_workbook(|wb| wb.read_range(&params.sheet, &params.range))?;
    let range = CellRange::parse(&params.range)?.bounds().to_string();
    Ok(RangeResponse {
        sheet: params.sheet,
        range,
        rows,
    })
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReadSheetParams {
    pub sheet: String,
}

pub fn read_sheet(state: &AppState, params: ReadSheetParams) -> Result<SheetSnapshot> {
    let _span = workbook_span("read_sheet", Some(&params.sheet)).entered();
    state.with_workbook(|wb| wb.read_sheet_snapshot(&params.sheet))
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateCellParams {
    pub sheet: String,
    pub cell: String,
    pub value: CellValue,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct UpdateCellResponse {
    pub sheet: String,
    pub cell: String,
    pub value: CellValue,
    /// Sheet extent after the write
    pub extent: Extent,
    /// Whether the workbook was written to disk as part of this update
    pub saved: bool,
}

pub fn update_cell(state: &AppState, params: UpdateCellParams) -> Result<UpdateCellResponse> {
    let _span = workbook_span("update_cell", Some(&params.sheet)).entered();
    let autosave = state.config().autosave;
    let UpdateCellParams { sheet, cell, value } = params;

    let extent = state.with_workbook(|wb| {
        let extent = wb.write_cell(&sheet, &cell, value.clone())?;
        if autosave {
            wb.save(None)?;
        }
        Ok::<_, crate::error::EngineError>(extent)
    })?;

    info!(cell = %cell, saved = autosave, "update applied");
    Ok(UpdateCellResponse {
        sheet,
        cell: cell.to_ascii_uppercase(),
        value,
        extent,
        saved: autosave,
    })
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReadFormulaParams {
    pub sheet: String,
    pub cell: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct FormulaResponse {
    pub sheet: String,
    pub cell: String,
    /// Formula without the leading `=`; null for literals and empty cells
    pub formula: Option<String>,
}

pub fn read_formula(state: &AppState, params: ReadFormulaParams) -> Result<FormulaResponse> {
    let _span = workbook_span("read_formula", Some(&params.sheet)).entered();
    let formula = state.with_workbook(|wb| wb.read_formula(&params.sheet, &params.cell))?;
    Ok(FormulaResponse {
        sheet: params.sheet,
        cell: params.cell.to_ascii_uppercase(),
        formula,
    })
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct SaveParams {
    /// Export target; the backing file when absent
    pub path: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SaveResponse {
    pub path: PathBuf,
}

pub fn save(state: &AppState, params: SaveParams) -> Result<SaveResponse> {
    let _span = workbook_span("save", None).entered();
    let path = state.with_workbook(|wb| wb.save(params.path.as_deref()))?;
    Ok(SaveResponse { path })
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ParseMentionParams {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ParseMentionResponse {
    /// Null when the text is not exactly one mention
    pub mention: Option<Mention>,
}

pub fn parse_mention(params: ParseMentionParams) -> ParseMentionResponse {
    let mention = mention::parse_mention(&params.text)
        .inspect_err(|error| debug!(%error, "not a mention"))
        .ok();
    ParseMentionResponse { mention }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExtractMentionsParams {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct MentionListResponse {
    pub mentions: Vec<Mention>,
}

pub fn extract_mentions(params: ExtractMentionsParams) -> MentionListResponse {
    MentionListResponse {
        mentions: mention::extract_mentions(&params.text),
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FormatMentionParams {
    pub sheet: String,
    pub start_cell: String,
    pub end_cell: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct FormatMentionResponse {
    pub mention: String,
}

pub fn format_mention(params: FormatMentionParams) -> FormatMentionResponse {
    FormatMentionResponse {
        mention: mention::format_mention(
            &params.sheet,
            &params.start_cell,
            params.end_cell.as_deref(),
        ),
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ResolveMentionParams {
    pub text: String,
}

/// Reads the cells a single mention points at.
pub fn resolve_mention(state: &AppState, params: ResolveMentionParams) -> Result<RangeResponse> {
    let mention = mention::parse_mention(&params.text)?;
    read_range(
        state,
        ReadRangeParams {
            range: mention.range_text(),
            sheet: mention.sheet,
        },
    )
}

/// CLI value text: a JSON number or string when it parses as one, otherwise
/// the raw text.
pub fn parse_cli_value(raw: &str) -> CellValue {
    serde_json::from_str::<CellValue>(raw).unwrap_or_else(|_| CellValue::Text(raw.to_string()))
}
