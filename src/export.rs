use crate::data::{Cells, Table};
use crate::error::ExportError;
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook};
use tracing::info;

pub const SHEET_NAME: &str = "Sheet1";
pub const DEFAULT_FILE_NAME: &str = "data.xlsx";

const MAX_ROWS: usize = 1_048_576;
const MAX_COLUMNS: usize = 16_384;

#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Prepend an unnamed column holding the 0-based row index.
    pub include_index: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self { include_index: true }
    }
}

/// Encode the table as an xlsx workbook with a single sheet.
///
/// The first row holds column names. Numeric cells are written as numbers,
/// categorical cells as strings and missing cells are left blank. Infinite or
/// NaN numbers have no spreadsheet representation and are written as text.
pub fn encode(table: &Table, options: &ExportOptions) -> Result<Vec<u8>, ExportError> {
    let offset = usize::from(options.include_index);
    if table.row_count() + 1 > MAX_ROWS {
        return Err(ExportError::TooManyRows(table.row_count()));
    }
    if table.column_count() + offset > MAX_COLUMNS {
        return Err(ExportError::TooManyColumns(table.column_count()));
    }

    let header = Format::new()
        .set_bold()
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center);

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME)?;

        if options.include_index {
            for row in 0..table.row_count() {
                sheet.write_number_with_format(row as u32 + 1, 0, row as f64, &header)?;
            }
        }

        for (idx, column) in table.columns().iter().enumerate() {
            let col = (idx + offset) as u16;
            sheet.write_string_with_format(0, col, column.name.as_str(), &header)?;

            match &column.cells {
                Cells::Numeric(cells) => {
                    for (row, cell) in cells.iter().enumerate() {
                        let row = row as u32 + 1;
                        match cell {
                            Some(v) if v.is_finite() => {
                                sheet.write_number(row, col, *v)?;
                            }
                            Some(v) => {
                                sheet.write_string(row, col, v.to_string())?;
                            }
                            None => {}
                        }
                    }
                }
                Cells::Categorical(cells) => {
                    for (row, cell) in cells.iter().enumerate() {
                        if let Some(s) = cell {
                            sheet.write_string(row as u32 + 1, col, s.as_str())?;
                        }
                    }
                }
            }
        }
    }

    let bytes = workbook.save_to_buffer()?;
    info!(
        rows = table.row_count(),
        columns = table.column_count(),
        bytes = bytes.len(),
        "Encoded spreadsheet"
    );
    Ok(bytes)
}
