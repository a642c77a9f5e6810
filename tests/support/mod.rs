#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use sheetlink::EngineConfig;
use sheetlink::state::AppState;
use tempfile::{TempDir, tempdir};
use umya_spreadsheet::{self, Spreadsheet};

pub fn write_workbook_to_path<F>(path: &Path, f: F)
where
    F: FnOnce(&mut Spreadsheet),
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create dir");
    }
    let mut book = umya_spreadsheet::new_file();
    f(&mut book);
    umya_spreadsheet::writer::xlsx::write(&book, path).expect("write workbook");
}

pub struct TestWorkspace {
    _tempdir: TempDir,
    root: PathBuf,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let tempdir = tempdir().expect("tempdir");
        let root = tempdir.path().to_path_buf();
        Self {
            _tempdir: tempdir,
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// `new_file()` starts with one sheet named `Sheet1`.
    pub fn create_workbook<F>(&self, name: &str, f: F) -> PathBuf
    where
        F: FnOnce(&mut Spreadsheet),
    {
        let path = self.path(name);
        write_workbook_to_path(&path, f);
        path
    }

    pub fn config_for(&self, name: &str) -> EngineConfig {
        EngineConfig {
            workbook_path: self.path(name),
            autosave: true,
        }
    }

    pub fn app_state(&self, name: &str) -> Arc<AppState> {
        app_state_with_config(self.config_for(name))
    }
}

pub fn app_state_with_config(config: EngineConfig) -> Arc<AppState> {
    Arc::new(AppState::new(Arc::new(config)))
}

/// Sheet1 holds a 2x2 block of numbers at A1:B2 with a formula in C1; a
/// second, empty sheet named `Sales` follows.
pub fn grid_fixture(book: &mut Spreadsheet) {
    let sheet = book.get_sheet_by_name_mut("Sheet1").expect("Sheet1");
    sheet.get_cell_mut("A1").set_value_number(1);
    sheet.get_cell_mut("B1").set_value_number(2);
    sheet.get_cell_mut("A2").set_value_number(3);
    sheet.get_cell_mut("B2").set_value_number(4);
    sheet.get_cell_mut("C1").set_formula("SUM(A1:B2)");
    book.new_sheet("Sales").expect("add Sales");
}

pub fn touch_file(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create dir");
    }
    std::fs::write(path, b"test").expect("write file");
}
