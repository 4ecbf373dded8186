use calamine::{Data, Reader, Xlsx};
use skimlit::data::{Cells, Column, Table};
use skimlit::export::{encode, ExportOptions, SHEET_NAME};
use skimlit::pipeline::run_csv;
use std::fs;
use std::io::Cursor;

/// Read an exported workbook back into a table, dropping the index column when present.
fn decode(bytes: Vec<u8>, has_index: bool) -> Table {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).expect("not an xlsx workbook");
    assert_eq!(workbook.sheet_names(), vec![SHEET_NAME.to_string()]);
    let range = workbook.worksheet_range(SHEET_NAME).expect("missing sheet");

    let rows: Vec<&[Data]> = range.rows().collect();
    let (header, body) = rows.split_first().expect("missing header row");
    let skip = usize::from(has_index);

    let columns = header
        .iter()
        .enumerate()
        .skip(skip)
        .map(|(idx, name)| {
            let cells: Vec<&Data> = body.iter().map(|row| &row[idx]).collect();
            let numeric = cells
                .iter()
                .all(|c| matches!(c, Data::Float(_) | Data::Int(_) | Data::Empty));
            if numeric {
                Column::numeric(
                    name.to_string(),
                    cells
                        .iter()
                        .map(|c| match c {
                            Data::Float(v) => Some(*v),
                            Data::Int(v) => Some(*v as f64),
                            _ => None,
                        })
                        .collect(),
                )
            } else {
                Column::categorical(
                    name.to_string(),
                    cells
                        .iter()
                        .map(|c| match c {
                            Data::Empty => None,
                            other => Some(other.to_string()),
                        })
                        .collect::<Vec<_>>(),
                )
            }
        })
        .collect();

    Table::new(columns).expect("decoded table is not rectangular")
}

fn assert_tables_match(expected: &Table, actual: &Table) {
    assert_eq!(actual.row_count(), expected.row_count());
    assert_eq!(actual.column_count(), expected.column_count());

    for (want, got) in expected.columns().iter().zip(actual.columns()) {
        assert_eq!(want.name, got.name);
        match (&want.cells, &got.cells) {
            (Cells::Numeric(a), Cells::Numeric(b)) => {
                for (x, y) in a.iter().zip(b) {
                    match (x, y) {
                        (Some(x), Some(y)) => assert!((x - y).abs() <= 1e-9 * x.abs().max(1.0), "{x} != {y}"),
                        (None, None) => {}
                        _ => panic!("missing cell mismatch in '{}'", want.name),
                    }
                }
            }
            (Cells::Categorical(a), Cells::Categorical(b)) => assert_eq!(a, b),
            _ => panic!("column '{}' changed kind", want.name),
        }
    }
}

#[test]
fn test_roundtrip_cleaned_sales_table() {
    let csv = fs::read_to_string("test/sales.csv").expect("Failed to read test CSV");
    let report = run_csv(csv.as_bytes()).unwrap();

    let bytes = encode(&report.table, &ExportOptions::default()).unwrap();
    let decoded = decode(bytes, true);
    assert_tables_match(&report.table, &decoded);
}

#[test]
fn test_roundtrip_without_index() {
    let table = Table::new(vec![
        Column::numeric("a", vec![Some(1.0), Some(2.0), Some(3.0)]),
        Column::categorical("b", vec![Some("x"), Some("y"), Some("x")]),
        Column::numeric("c", vec![Some(0.1), Some(-2.5), Some(1e6)]),
    ])
    .unwrap();

    let bytes = encode(&table, &ExportOptions { include_index: false }).unwrap();
    let decoded = decode(bytes, false);
    assert_tables_match(&table, &decoded);
}

#[test]
fn test_index_column_holds_row_numbers() {
    let table = Table::new(vec![Column::categorical("b", vec![Some("x"), Some("y")])]).unwrap();
    let bytes = encode(&table, &ExportOptions::default()).unwrap();

    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).unwrap();
    let range = workbook.worksheet_range(SHEET_NAME).unwrap();
    let first_column: Vec<&Data> = range.rows().map(|row| &row[0]).collect();
    assert_eq!(
        first_column,
        vec![&Data::Empty, &Data::Float(0.0), &Data::Float(1.0)]
    );
}

#[test]
fn test_missing_cells_stay_blank() {
    let table = Table::new(vec![
        Column::numeric("empty", vec![None, None]),
        Column::categorical("b", vec![Some("x"), None]),
    ])
    .unwrap();
    let bytes = encode(&table, &ExportOptions::default()).unwrap();
    let decoded = decode(bytes, true);
    assert_tables_match(&table, &decoded);
}
