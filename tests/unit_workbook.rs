use assert_matches::assert_matches;
use sheetlink::model::{CellValue, Extent};
use sheetlink::workbook::{AccessorStatus, Workbook, WorkbookAccessor};
use sheetlink::{EngineError, xlsx};

mod support;

fn number(value: f64) -> Option<CellValue> {
    Some(CellValue::Number(value))
}

#[test]
fn lazy_load_reads_sheets_values_and_formulas() {
    let workspace = support::TestWorkspace::new();
    let path = workspace.create_workbook("grid.xlsx", support::grid_fixture);

    let mut accessor = WorkbookAccessor::new(&path);
    assert_eq!(accessor.status(), AccessorStatus::Unloaded);

    assert_eq!(accessor.list_sheets().expect("sheets"), vec!["Sheet1", "Sales"]);
    assert_eq!(accessor.status(), AccessorStatus::Loaded);

    let grid = accessor.read_range("Sheet1", "A1:B2").expect("range");
    let values: Vec<_> = grid.iter().flatten().map(|c| c.value.clone()).collect();
    assert_eq!(values, vec![number(1.0), number(2.0), number(3.0), number(4.0)]);

    assert_eq!(
        accessor.read_formula("Sheet1", "C1").expect("formula").as_deref(),
        Some("SUM(A1:B2)")
    );
    assert_eq!(accessor.read_formula("Sheet1", "A1").expect("literal"), None);
    assert_eq!(
        accessor.sheet_extent("Sheet1").expect("extent"),
        Some(Extent::spanning((0, 0), (1, 2)))
    );
    assert_eq!(accessor.sheet_extent("Sales").expect("extent"), None);
}

#[test]
fn write_then_save_round_trips_through_file() {
    let workspace = support::TestWorkspace::new();
    let path = workspace.create_workbook("grid.xlsx", support::grid_fixture);

    let mut accessor = WorkbookAccessor::new(&path);
    let extent = accessor.write_cell("Sheet1", "D10", 99).expect("write");
    assert_eq!(extent.to_string(), "A1:D10");
    accessor.write_cell("Sheet1", "C1", "overwritten").expect("write");
    assert_eq!(accessor.status(), AccessorStatus::Dirty);

    accessor.save(None).expect("save");
    assert_eq!(accessor.status(), AccessorStatus::Loaded);

    let mut reopened = WorkbookAccessor::new(&path);
    let snapshot = reopened.read_sheet_snapshot("Sheet1").expect("snapshot");
    assert_eq!(snapshot.row_count, 10);
    assert_eq!(snapshot.col_count, 4);
    assert_eq!(snapshot.cells["D10"].value, number(99.0));
    assert_eq!(
        snapshot.cells["C1"].value,
        Some(CellValue::Text("overwritten".to_string()))
    );
    assert_eq!(reopened.read_formula("Sheet1", "C1").expect("formula"), None);
}

#[test]
fn unsaved_writes_are_dropped_by_reload() {
    let workspace = support::TestWorkspace::new();
    let path = workspace.create_workbook("grid.xlsx", support::grid_fixture);

    let mut accessor = WorkbookAccessor::new(&path);
    accessor.write_cell("Sheet1", "A1", 42).expect("write");
    accessor.load().expect("reload");

    let grid = accessor.read_range("Sheet1", "A1").expect("range");
    assert_eq!(grid[0][0].value, number(1.0));
    assert_eq!(accessor.status(), AccessorStatus::Loaded);
}

#[test]
fn save_elsewhere_is_an_export() {
    let workspace = support::TestWorkspace::new();
    let path = workspace.create_workbook("grid.xlsx", support::grid_fixture);
    let export = workspace.path("exports/copy.xlsx");

    let mut accessor = WorkbookAccessor::new(&path);
    accessor.write_cell("Sales", "B3", "north").expect("write");
    let written = accessor.save(Some(export.as_path())).expect("export");
    assert_eq!(written, export);
    assert!(export.is_file());
    assert_eq!(accessor.status(), AccessorStatus::Dirty);
    assert_eq!(accessor.path(), path.as_path());

    let mut copy = WorkbookAccessor::new(&export);
    let grid = copy.read_range("Sales", "B3").expect("range");
    assert_eq!(grid[0][0].value, Some(CellValue::Text("north".to_string())));
}

#[test]
fn clean_save_is_idempotent() {
    let workspace = support::TestWorkspace::new();
    let path = workspace.create_workbook("grid.xlsx", support::grid_fixture);

    let mut accessor = WorkbookAccessor::new(&path);
    accessor.save(None).expect("first save");
    accessor.save(None).expect("second save");
    assert_eq!(accessor.status(), AccessorStatus::Loaded);
    assert_eq!(
        accessor.read_formula("Sheet1", "C1").expect("formula").as_deref(),
        Some("SUM(A1:B2)")
    );
}

#[test]
fn failed_save_keeps_unsaved_writes() {
    let workspace = support::TestWorkspace::new();
    let path = workspace.create_workbook("grid.xlsx", support::grid_fixture);
    let blocker = workspace.path("blocker");
    support::touch_file(&blocker);

    let mut accessor = WorkbookAccessor::new(&path);
    accessor.write_cell("Sheet1", "A1", 10).expect("write");
    let export = blocker.join("copy.xlsx");
    assert_matches!(
        accessor.save(Some(export.as_path())),
        Err(EngineError::Io { path, .. }) if path == export
    );
    assert_eq!(accessor.status(), AccessorStatus::Dirty);
    assert!(!export.exists());

    let backing = blocker.join("book.xlsx");
    let workbook = Workbook::with_sheets(["Sheet1"]).expect("workbook");
    let mut unsaved = WorkbookAccessor::with_workbook(&backing, workbook);
    unsaved.write_cell("Sheet1", "B2", "kept").expect("write");
    assert_matches!(unsaved.save(None), Err(EngineError::Io { .. }));
    assert_eq!(unsaved.status(), AccessorStatus::Dirty);
    let grid = unsaved.read_range("Sheet1", "B2").expect("range");
    assert_eq!(grid[0][0].value, Some(CellValue::Text("kept".to_string())));
}

#[test]
fn style_only_cells_widen_the_extent() {
    let workspace = support::TestWorkspace::new();
    let path = workspace.create_workbook("styled.xlsx", |book| {
        support::grid_fixture(book);
        let sheet = book.get_sheet_by_name_mut("Sheet1").expect("Sheet1");
        sheet.get_style_mut("Z100").get_font_mut().set_bold(true);
    });

    let mut accessor = WorkbookAccessor::new(&path);
    assert_eq!(
        accessor.sheet_extent("Sheet1").expect("extent"),
        Some(Extent::spanning((0, 0), (99, 25)))
    );
    let snapshot = accessor.read_sheet_snapshot("Sheet1").expect("snapshot");
    assert_eq!((snapshot.row_count, snapshot.col_count), (100, 26));
    assert!(!snapshot.cells.contains_key("Z100"));
    let corner = accessor.read_range("Sheet1", "Z100").expect("range");
    assert_eq!(corner[0][0].value, None);
}

#[test]
fn missing_and_corrupt_files_fail_to_load() {
    let workspace = support::TestWorkspace::new();

    let mut missing = WorkbookAccessor::new(workspace.path("absent.xlsx"));
    assert_matches!(missing.list_sheets(), Err(EngineError::FileNotFound { .. }));

    let garbage = workspace.path("garbage.xlsx");
    support::touch_file(&garbage);
    let mut corrupt = WorkbookAccessor::new(&garbage);
    assert_matches!(corrupt.list_sheets(), Err(EngineError::Parse { .. }));
    assert_eq!(corrupt.status(), AccessorStatus::Unloaded);
}

#[test]
fn lookups_fail_with_typed_errors() {
    let workspace = support::TestWorkspace::new();
    let path = workspace.create_workbook("grid.xlsx", support::grid_fixture);
    let mut accessor = WorkbookAccessor::new(&path);

    assert_matches!(
        accessor.read_sheet_snapshot("Missing"),
        Err(EngineError::SheetNotFound { sheet }) if sheet == "Missing"
    );
    assert_matches!(
        accessor.read_range("Sheet1", "A0:B2"),
        Err(EngineError::InvalidRange { .. })
    );
    assert_matches!(
        accessor.read_formula("Sheet1", "$A$1"),
        Err(EngineError::InvalidAddress { .. })
    );
}

#[test]
fn example_workbook_has_demo_sheets_and_formulas() {
    let workspace = support::TestWorkspace::new();
    let path = workspace.path("data/example.xlsx");
    xlsx::create_example_workbook(&path).expect("create example");

    let mut accessor = WorkbookAccessor::new(&path);
    assert_eq!(accessor.list_sheets().expect("sheets"), vec!["Sheet1", "Products"]);

    let header = accessor.read_range("Sheet1", "A1:E1").expect("header");
    let titles: Vec<_> = header[0]
        .iter()
        .map(|c| c.value.as_ref().and_then(|v| v.as_text()).unwrap_or_default().to_string())
        .collect();
    assert_eq!(titles, vec!["Name", "Email", "Amount", "Tax", "Total"]);

    assert_eq!(
        accessor.read_formula("Sheet1", "D2").expect("formula").as_deref(),
        Some("C2*0.1")
    );
    assert_eq!(
        accessor.read_formula("Sheet1", "E13").expect("formula").as_deref(),
        Some("SUM(E2:E11)")
    );
    assert_eq!(
        accessor.read_formula("Products", "E8").expect("formula").as_deref(),
        Some("SUM(E2:E6)")
    );
    assert_eq!(
        accessor.sheet_extent("Products").expect("extent"),
        Some(Extent::spanning((0, 0), (7, 4)))
    );
}
