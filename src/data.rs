use crate::csv_reader::CsvData;
use crate::error::{ParseError, TableError};
use serde::Serialize;
use std::collections::HashSet;

/// Cell texts treated as missing when parsing CSV input.
pub const MISSING_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_missing_token(s: &str) -> bool {
    MISSING_TOKENS.contains(&s)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

/// Column storage. `None` marks a missing cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cells {
    Numeric(Vec<Option<f64>>),
    Categorical(Vec<Option<String>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub cells: Cells,
}

impl Column {
    pub fn numeric(name: impl Into<String>, cells: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            cells: Cells::Numeric(cells),
        }
    }

    pub fn categorical<S: Into<String>>(name: impl Into<String>, cells: Vec<Option<S>>) -> Self {
        Self {
            name: name.into(),
            cells: Cells::Categorical(cells.into_iter().map(|c| c.map(Into::into)).collect()),
        }
    }

    pub fn kind(&self) -> ColumnKind {
        match self.cells {
            Cells::Numeric(_) => ColumnKind::Numeric,
            Cells::Categorical(_) => ColumnKind::Categorical,
        }
    }

    pub fn len(&self) -> usize {
        match &self.cells {
            Cells::Numeric(v) => v.len(),
            Cells::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn missing_count(&self) -> usize {
        match &self.cells {
            Cells::Numeric(v) => v.iter().filter(|c| c.is_none()).count(),
            Cells::Categorical(v) => v.iter().filter(|c| c.is_none()).count(),
        }
    }

    pub fn present_count(&self) -> usize {
        self.len() - self.missing_count()
    }

    /// Present values of a numeric column, in row order.
    pub fn numeric_values(&self) -> Option<Vec<f64>> {
        match &self.cells {
            Cells::Numeric(v) => Some(v.iter().flatten().copied().collect()),
            Cells::Categorical(_) => None,
        }
    }

    /// Present values of a categorical column, in row order.
    pub fn text_values(&self) -> Option<Vec<&str>> {
        match &self.cells {
            Cells::Categorical(v) => Some(v.iter().flatten().map(String::as_str).collect()),
            Cells::Numeric(_) => None,
        }
    }
}

/// An ordered, rectangular set of uniquely named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Result<Self, TableError> {
        let mut names = HashSet::new();
        let expected = columns.first().map(Column::len).unwrap_or(0);

        for column in &columns {
            if !names.insert(column.name.as_str()) {
                return Err(TableError::DuplicateName(column.name.clone()));
            }
            if column.len() != expected {
                return Err(TableError::LengthMismatch {
                    column: column.name.clone(),
                    expected,
                    found: column.len(),
                });
            }
        }

        Ok(Self { columns })
    }

    /// Build a table from parsed CSV, inferring each column's kind.
    ///
    /// A column is numeric when every present cell parses as a number other than
    /// NaN; a column with no present cells at all is numeric as well. NaN spellings
    /// that are not missing tokens (`NAN`, `+nan`) make the column categorical.
    pub fn from_csv(csv: CsvData) -> Result<Self, ParseError> {
        if csv.rows.is_empty() || csv.headers.is_empty() {
            return Err(ParseError::Empty);
        }

        let mut columns = Vec::with_capacity(csv.headers.len());
        for (idx, name) in csv.headers.iter().enumerate() {
            let raw: Vec<Option<&str>> = csv
                .rows
                .iter()
                .map(|row| row.get(idx).map(String::as_str).filter(|s| !is_missing_token(s)))
                .collect();

            let parsed: Option<Vec<Option<f64>>> = raw
                .iter()
                .map(|cell| match cell {
                    Some(s) => s.parse::<f64>().ok().filter(|v| !v.is_nan()).map(Some),
                    None => Some(None),
                })
                .collect();

            let column = match parsed {
                Some(values) => Column::numeric(name.clone(), values),
                None => Column::categorical(name.clone(), raw),
            };
            columns.push(column);
        }

        Ok(Table::new(columns)?)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn numeric_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns
            .iter()
            .filter(|c| c.kind() == ColumnKind::Numeric)
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}
