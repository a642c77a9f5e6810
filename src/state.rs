use crate::config::EngineConfig;
use crate::error::Result;
use crate::model::{CellData, CellValue, Extent, SheetSnapshot};
use crate::workbook::{AccessorStatus, WorkbookAccessor};
use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// The process-wide engine instance: configuration plus the one workbook
/// accessor every request goes through.
///
/// All access to the workbook is serialized by a single reentrant lock, so a
/// read-modify-save sequence inside [`AppState::with_workbook`] cannot
/// interleave with another thread's write, while nested calls on the same
/// thread simply re-enter.
pub struct AppState {
    config: Arc<EngineConfig>,
    workbook: ReentrantMutex<RefCell<WorkbookAccessor>>,
    /// Number of `with_workbook` calls, for diagnostics
    operations: AtomicU64,
}

impl AppState {
    pub fn new(config: Arc<EngineConfig>) -> Self {
        let accessor = WorkbookAccessor::new(config.workbook_path.clone());
        Self::with_accessor(config, accessor)
    }

    /// State over a caller-built accessor, e.g. one holding an in-memory
    /// workbook.
    pub fn with_accessor(config: Arc<EngineConfig>, accessor: WorkbookAccessor) -> Self {
        Self {
            config,
            workbook: ReentrantMutex::new(RefCell::new(accessor)),
            operations: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> Arc<EngineConfig> {
        self.config.clone()
    }

    /// Runs `f` while holding the workbook lock for the whole closure.
    ///
    /// The closure may call back into `with_workbook` or
    /// [`AppState::workbook_status`] on the same thread.
    pub fn with_workbook<T>(&self, f: impl FnOnce(&WorkbookSession<'_>) -> T) -> T {
        let op = self.operations.fetch_add(1, Ordering::Relaxed) + 1;
        let guard = self.workbook.lock();
        let session = WorkbookSession { accessor: &guard };
        debug!(op, status = ?session.status(), "workbook lock acquired");
        f(&session)
    }

    pub fn workbook_status(&self) -> AccessorStatus {
        self.workbook.lock().borrow().status()
    }

    pub fn operation_count(&self) -> u64 {
        self.operations.load(Ordering::Relaxed)
    }
}

/// Accessor handle lent out under the lock. Each call borrows the accessor
/// only for its own duration, so sessions nested on one thread never hold
/// overlapping borrows.
pub struct WorkbookSession<'a> {
    accessor: &'a RefCell<WorkbookAccessor>,
}

impl WorkbookSession<'_> {
    pub fn status(&self) -> AccessorStatus {
        self.accessor.borrow().status()
    }

    pub fn path(&self) -> PathBuf {
        self.accessor.borrow().path().to_path_buf()
    }

    /// Rereads the backing file, dropping unsaved writes.
    pub fn load(&self) -> Result<()> {
        self.accessor.borrow_mut().load().map(|_| ())
    }

    pub fn list_sheets(&self) -> Result<Vec<String>> {
        self.accessor.borrow_mut().list_sheets()
    }

    pub fn sheet_extent(&self, sheet: &str) -> Result<Option<Extent>> {
        self.accessor.borrow_mut().sheet_extent(sheet)
    }

    pub fn read_range(&self, sheet: &str, range: &str) -> Result<Vec<Vec<CellData>>> {
        self.accessor.borrow_mut().read_range(sheet, range)
    }

    pub fn read_sheet_snapshot(&self, sheet: &str) -> Result<SheetSnapshot> {
        self.accessor.borrow_mut().read_sheet_snapshot(sheet)
    }

    pub fn write_cell(
        &self,
        sheet: &str,
        address: &str,
        value: impl Into<CellValue>,
    ) -> Result<Extent> {
        self.accessor.borrow_mut().write_cell(sheet, address, value)
    }

    pub fn read_formula(&self, sheet: &str, address: &str) -> Result<Option<String>> {
        self.accessor.borrow_mut().read_formula(sheet, address)
    }

    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        self.accessor.borrow_mut().save(path)
    }
}
