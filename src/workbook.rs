use crate::address::{format_cell_address, parse_cell_address};
use crate::error::{EngineError, Result};
use crate::model::{CellData, CellValue, Extent, SheetSnapshot};
use crate::range::CellRange;
use crate::xlsx;
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use umya_spreadsheet::Spreadsheet;

#[derive(Debug, Clone, PartialEq)]
struct StoredCell {
    value: Option<CellValue>,
    formula: Option<String>,
}

/// Sparse cell store for one sheet plus its used extent.
///
/// Cells are keyed by `(row0, col0)` so iteration is row-major. The extent
/// only ever grows; clearing content does not shrink it.
#[derive(Debug, Clone)]
pub struct Sheet {
    name: String,
    cells: BTreeMap<(u32, u32), StoredCell>,
    extent: Option<Extent>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
            extent: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extent(&self) -> Option<Extent> {
        self.extent
    }

    /// Widens the used extent without storing a cell.
    pub(crate) fn grow(&mut self, row0: u32, col0: u32) {
        match self.extent.as_mut() {
            Some(extent) => extent.include(row0, col0),
            None => self.extent = Some(Extent::cell(row0, col0)),
        }
    }

    /// Stores a cell as read from the backing file.
    pub(crate) fn insert_loaded(
        &mut self,
        row0: u32,
        col0: u32,
        value: Option<CellValue>,
        formula: Option<String>,
    ) {
        self.cells.insert((row0, col0), StoredCell { value, formula });
        self.grow(row0, col0);
    }

    /// A literal write: replaces the value, drops any formula, grows the
    /// extent.
    pub(crate) fn set_literal(&mut self, row0: u32, col0: u32, value: CellValue) {
        self.cells.insert(
            (row0, col0),
            StoredCell {
                value: Some(value),
                formula: None,
            },
        );
        self.grow(row0, col0);
    }

    pub fn cell(&self, row0: u32, col0: u32) -> CellData {
        let address = format_cell_address(row0, col0);
        match self.cells.get(&(row0, col0)) {
            Some(stored) => CellData {
                address,
                value: stored.value.clone(),
                formula: stored.formula.clone(),
            },
            None => CellData::empty(address),
        }
    }

    pub fn formula(&self, row0: u32, col0: u32) -> Option<&str> {
        self.cells
            .get(&(row0, col0))
            .and_then(|stored| stored.formula.as_deref())
    }

    /// Dense rectangular view over sparse storage: one row per grid row,
    /// absent cells reported with a null value.
    pub fn view(&self, bounds: Extent) -> Vec<Vec<CellData>> {
        (bounds.start_row..=bounds.end_row)
            .map(|row| {
                (bounds.start_col..=bounds.end_col)
                    .map(|col| self.cell(row, col))
                    .collect()
            })
            .collect()
    }

    pub fn snapshot(&self) -> SheetSnapshot {
        let cells: IndexMap<String, CellData> = self
            .cells
            .keys()
            .map(|&(row, col)| {
                let data = self.cell(row, col);
                (data.address.clone(), data)
            })
            .collect();
        SheetSnapshot {
            sheet_name: self.name.clone(),
            cells,
            row_count: self.extent.map_or(0, |e| e.row_count()),
            col_count: self.extent.map_or(0, |e| e.col_count()),
            extent: self.extent,
        }
    }
}

/// In-memory workbook: the sparse model plus the spreadsheet document it
/// was read from, which is what gets written back on save.
pub struct Workbook {
    sheets: Vec<Sheet>,
    document: Spreadsheet,
}

impl Workbook {
    pub fn from_document(document: Spreadsheet) -> Self {
        let sheets = xlsx::project_sheets(&document);
        Self { sheets, document }
    }

    /// Empty workbook with the given sheets, in order.
    pub fn with_sheets<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let document = xlsx::new_document(names)?;
        Ok(Self::from_document(document))
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    pub fn sheet(&self, name: &str) -> Result<&Sheet> {
        self.sheets
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| EngineError::sheet_not_found(name))
    }

    pub fn write_cell(&mut self, sheet: &str, address: &str, value: CellValue) -> Result<Extent> {
        let target = self
            .sheets
            .iter_mut()
            .find(|s| s.name == sheet)
            .ok_or_else(|| EngineError::sheet_not_found(sheet))?;
        let addr = parse_cell_address(address)?;
        let (row0, col0) = (addr.row0(), addr.col0());
        xlsx::write_literal(&mut self.document, sheet, row0, col0, &value)?;
        target.set_literal(row0, col0, value);
        Ok(target.extent.unwrap_or(Extent::cell(row0, col0)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorStatus {
    Unloaded,
    Loaded,
    Dirty,
}

/// Upper bound on the cells one dense range read may materialize.
pub const MAX_RANGE_CELLS: u64 = 1 << 20;

enum WorkbookState {
    Unloaded,
    Loaded { workbook: Workbook, dirty: bool },
}

/// Owns one lazily loaded workbook backed by a file.
///
/// The first operation that needs data loads the file. Writes mark the
/// workbook dirty; [`WorkbookAccessor::save`] writes it back and clears the
/// flag. There is no locking here: callers that share an accessor wrap it
/// (see [`crate::state::AppState`]).
pub struct WorkbookAccessor {
    path: PathBuf,
    state: WorkbookState,
}

impl WorkbookAccessor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: WorkbookState::Unloaded,
        }
    }

    /// Accessor over an already built workbook, marked dirty so the first
    /// save creates the backing file.
    pub fn with_workbook(path: impl Into<PathBuf>, workbook: Workbook) -> Self {
        Self {
            path: path.into(),
            state: WorkbookState::Loaded {
                workbook,
                dirty: true,
            },
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn status(&self) -> AccessorStatus {
        match &self.state {
            WorkbookState::Unloaded => AccessorStatus::Unloaded,
            WorkbookState::Loaded { dirty: false, .. } => AccessorStatus::Loaded,
            WorkbookState::Loaded { dirty: true, .. } => AccessorStatus::Dirty,
        }
    }

    /// Reads the backing file, replacing any in-memory state including
    /// unsaved writes.
    pub fn load(&mut self) -> Result<&Workbook> {
        let _span = tracing::info_span!("workbook_load", path = %self.path.display()).entered();
        let document = xlsx::read_document(&self.path).inspect_err(|error| {
            warn!(%error, "failed to load workbook");
        })?;
        let workbook = Workbook::from_document(document);
        info!(sheets = workbook.sheets.len(), "workbook loaded");
        self.state = WorkbookState::Loaded {
            workbook,
            dirty: false,
        };
        self.workbook()
    }

    fn workbook(&mut self) -> Result<&Workbook> {
        Ok(self.loaded()?.0)
    }

    fn loaded(&mut self) -> Result<(&mut Workbook, &mut bool)> {
        if matches!(self.state, WorkbookState::Unloaded) {
            self.load()?;
        }
        match &mut self.state {
            WorkbookState::Loaded { workbook, dirty } => Ok((workbook, dirty)),
            WorkbookState::Unloaded => Err(EngineError::FileNotFound {
                path: self.path.clone(),
            }),
        }
    }

    pub fn list_sheets(&mut self) -> Result<Vec<String>> {
        Ok(self.workbook()?.sheet_names())
    }

    pub fn sheet_extent(&mut self, sheet: &str) -> Result<Option<Extent>> {
        Ok(self.workbook()?.sheet(sheet)?.extent())
    }

    /// Row-major grid covering the normalized range, every cell present.
    ///
    /// Ranges spanning more than [`MAX_RANGE_CELLS`] cells are rejected
    /// before any grid is allocated.
    pub fn read_range(&mut self, sheet: &str, range: &str) -> Result<Vec<Vec<CellData>>> {
        let sheet = self.workbook()?.sheet(sheet)?;
        let bounds = CellRange::parse(range)?.bounds();
        let cells = bounds.row_count() * bounds.col_count();
        if cells > MAX_RANGE_CELLS {
            return Err(EngineError::invalid_range(
                range,
                format!("range covers {cells} cells; the limit is {MAX_RANGE_CELLS}"),
            ));
        }
        debug!(sheet = sheet.name(), %bounds, "reading range");
        Ok(sheet.view(bounds))
    }

    pub fn read_sheet_snapshot(&mut self, sheet: &str) -> Result<SheetSnapshot> {
        Ok(self.workbook()?.sheet(sheet)?.snapshot())
    }

    /// Stores a literal, clearing any formula on the cell, and returns the
    /// sheet extent after growth.
    pub fn write_cell(
        &mut self,
        sheet: &str,
        address: &str,
        value: impl Into<CellValue>,
    ) -> Result<Extent> {
        let value = value.into();
        let (workbook, dirty) = self.loaded()?;
        let extent = workbook.write_cell(sheet, address, value)?;
        *dirty = true;
        info!(sheet, address, %extent, "cell updated");
        Ok(extent)
    }

    /// Formula text without `=`, or `None` for literals and absent cells.
    pub fn read_formula(&mut self, sheet: &str, address: &str) -> Result<Option<String>> {
        let sheet = self.workbook()?.sheet(sheet)?;
        let addr = parse_cell_address(address)?;
        Ok(sheet.formula(addr.row0(), addr.col0()).map(str::to_string))
    }

    /// Writes the workbook to `path`, or to the backing file when `None`.
    ///
    /// Only a save to the backing file clears the dirty flag; saving
    /// elsewhere is an export.
    pub fn save(&mut self, path: Option<&Path>) -> Result<PathBuf> {
        let backing = self.path.clone();
        let target = path.map_or_else(|| backing.clone(), Path::to_path_buf);
        let (workbook, dirty) = self.loaded()?;
        if !*dirty && target == backing {
            debug!(path = %target.display(), "workbook clean, skipping save");
            return Ok(target);
        }
        xlsx::write_document(&workbook.document, &target)?;
        if target == backing {
            *dirty = false;
        }
        info!(path = %target.display(), "workbook saved");
        Ok(target)
    }
}
