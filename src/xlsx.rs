//! Bridge between the sparse sheet model and xlsx documents.

use crate::address::format_cell_address;
use crate::error::{EngineError, Result};
use crate::model::CellValue;
use crate::workbook::Sheet;
use std::fs;
use std::path::Path;
use umya_spreadsheet::{Cell, Spreadsheet, Worksheet};

pub fn read_document(path: &Path) -> Result<Spreadsheet> {
    if !path.is_file() {
        return Err(EngineError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    umya_spreadsheet::reader::xlsx::read(path).map_err(|err| EngineError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}

pub fn write_document(document: &Spreadsheet, path: &Path) -> Result<()> {
    let io_error = |message: String| EngineError::Io {
        path: path.to_path_buf(),
        message,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| io_error(err.to_string()))?;
    }
    umya_spreadsheet::writer::xlsx::write(document, path).map_err(|err| io_error(err.to_string()))
}

/// Document with exactly the named sheets.
pub fn new_document<I, S>(names: I) -> Result<Spreadsheet>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut document = umya_spreadsheet::new_file_empty_worksheet();
    for name in names {
        let name = name.as_ref();
        document
            .new_sheet(name)
            .map_err(|reason| EngineError::Parse {
                path: Default::default(),
                message: format!("cannot add sheet '{name}': {reason}"),
            })?;
    }
    Ok(document)
}

pub fn project_sheets(document: &Spreadsheet) -> Vec<Sheet> {
    document
        .get_sheet_collection()
        .iter()
        .map(project_sheet)
        .collect()
}

/// Cells with neither a value nor a formula (style-only cells) are not
/// stored, but still count toward the used extent the file declares.
fn project_sheet(worksheet: &Worksheet) -> Sheet {
    let mut sheet = Sheet::new(worksheet.get_name());
    for cell in worksheet.get_cell_collection() {
        let coord = cell.get_coordinate();
        let (col, row) = (*coord.get_col_num(), *coord.get_row_num());
        if col == 0 || row == 0 {
            continue;
        }
        let formula = stored_formula(cell);
        let value = stored_value(cell);
        if value.is_none() && formula.is_none() {
            sheet.grow(row - 1, col - 1);
            continue;
        }
        sheet.insert_loaded(row - 1, col - 1, value, formula);
    }
    sheet
}

fn stored_formula(cell: &Cell) -> Option<String> {
    if !cell.is_formula() {
        return None;
    }
    let text = cell.get_formula();
    let text = text.strip_prefix('=').unwrap_or(text);
    Some(text.to_string())
}

fn stored_value(cell: &Cell) -> Option<CellValue> {
    let raw = cell.get_value();
    if raw.is_empty() {
        return None;
    }
    match cell.get_value_number() {
        Some(number) => Some(CellValue::Number(number)),
        None => Some(CellValue::Text(raw.into_owned())),
    }
}

/// Mirrors a literal write into the document so the next save persists it.
pub fn write_literal(
    document: &mut Spreadsheet,
    sheet: &str,
    row0: u32,
    col0: u32,
    value: &CellValue,
) -> Result<()> {
    let address = format_cell_address(row0, col0);
    let (Some(col), Some(row)) = (col0.checked_add(1), row0.checked_add(1)) else {
        return Err(EngineError::invalid_address(&address, "coordinate out of range"));
    };
    let worksheet = document
        .get_sheet_by_name_mut(sheet)
        .ok_or_else(|| EngineError::sheet_not_found(sheet))?;
    let cell = worksheet.get_cell_mut((col, row));
    cell.get_cell_value_mut().remove_formula();
    match value {
        CellValue::Number(number) => {
            cell.set_value_number(*number);
        }
        CellValue::Text(text) => {
            cell.set_value_string(text.clone());
        }
    }
    Ok(())
}

/// Demo workbook: a staff sheet with per-row tax/total formulas and a
/// product sheet with revenue formulas, each closed by a `SUM` row.
pub fn create_example_workbook(path: &Path) -> Result<()> {
    let mut document = new_document(["Sheet1", "Products"])?;

    if let Some(sheet) = document.get_sheet_by_name_mut("Sheet1") {
        let people = [
            ("Alice Johnson", "alice@example.com", 1500.0),
            ("Bob Smith", "bob@example.com", 2300.0),
            ("Carol White", "carol@example.com", 1800.0),
            ("David Brown", "david@example.com", 3200.0),
            ("Eve Davis", "eve@example.com", 950.0),
            ("Frank Miller", "frank@example.com", 2750.0),
            ("Grace Wilson", "grace@example.com", 1100.0),
            ("Henry Taylor", "henry@example.com", 4500.0),
            ("Ivy Anderson", "ivy@example.com", 2100.0),
            ("Jack Thomas", "jack@example.com", 1650.0),
        ];
        write_header(sheet, &["Name", "Email", "Amount", "Tax", "Total"]);
        for (offset, (name, email, amount)) in people.iter().enumerate() {
            let row = offset as u32 + 2;
            sheet.get_cell_mut((1, row)).set_value_string(*name);
            sheet.get_cell_mut((2, row)).set_value_string(*email);
            sheet.get_cell_mut((3, row)).set_value_number(*amount);
            sheet
                .get_cell_mut((4, row))
                .set_formula(format!("C{row}*0.1"));
            sheet
                .get_cell_mut((5, row))
                .set_formula(format!("C{row}+D{row}"));
        }
        sheet.get_cell_mut("A13").set_value_string("TOTAL");
        sheet.get_cell_mut("C13").set_formula("SUM(C2:C11)");
        sheet.get_cell_mut("D13").set_formula("SUM(D2:D11)");
        sheet.get_cell_mut("E13").set_formula("SUM(E2:E11)");
    }

    if let Some(sheet) = document.get_sheet_by_name_mut("Products") {
        let products = [
            ("Widget A", "Electronics", 29.99, 150.0),
            ("Widget B", "Electronics", 49.99, 85.0),
            ("Gadget X", "Accessories", 15.99, 320.0),
            ("Gadget Y", "Accessories", 24.99, 210.0),
            ("Tool Z", "Hardware", 89.99, 45.0),
        ];
        write_header(sheet, &["Product", "Category", "Price", "Quantity", "Revenue"]);
        for (offset, (product, category, price, quantity)) in products.iter().enumerate() {
            let row = offset as u32 + 2;
            sheet.get_cell_mut((1, row)).set_value_string(*product);
            sheet.get_cell_mut((2, row)).set_value_string(*category);
            sheet.get_cell_mut((3, row)).set_value_number(*price);
            sheet.get_cell_mut((4, row)).set_value_number(*quantity);
            sheet
                .get_cell_mut((5, row))
                .set_formula(format!("C{row}*D{row}"));
        }
        sheet.get_cell_mut("A8").set_value_string("TOTAL REVENUE");
        sheet.get_cell_mut("E8").set_formula("SUM(E2:E6)");
    }

    write_document(&document, path)
}

fn write_header(sheet: &mut Worksheet, titles: &[&str]) {
    for (offset, title) in titles.iter().enumerate() {
        sheet
            .get_cell_mut((offset as u32 + 1, 1))
            .set_value_string(*title);
    }
}
