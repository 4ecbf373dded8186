use thiserror::Error;

use crate::chart::ChartKind;

/// The input could not be turned into a table. Fatal: the run stops before imputation.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read CSV input: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: expected {expected} fields, found {found}")]
    TooManyFields {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("CSV input has no header row")]
    MissingHeader,

    #[error("CSV input contains no data rows")]
    Empty,

    #[error(transparent)]
    Table(#[from] TableError),
}

/// A set of columns that does not form a rectangular table with unique names.
#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    #[error("duplicate column name '{0}'")]
    DuplicateName(String),

    #[error("column '{column}' has {found} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },
}

/// No usable statistic exists to fill a column. Non-fatal: the column is left as is.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ImputationError {
    #[error("column '{column}' has no present values to impute from")]
    NoPresentValues { column: String },

    #[error("column '{column}' has a non-finite mean ({mean})")]
    NonFiniteMean { column: String, mean: f64 },
}

/// A single chart could not be produced. Non-fatal: only that chart is skipped.
#[derive(Debug, Error)]
pub enum ChartRenderError {
    #[error("cannot chart column '{column}': {reason}")]
    Unplottable { column: String, reason: String },

    #[error("failed to render {kind} for '{column}'")]
    Backend {
        column: String,
        kind: ChartKind,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ImputationError {
    pub fn column(&self) -> &str {
        match self {
            ImputationError::NoPresentValues { column } => column,
            ImputationError::NonFiniteMean { column, .. } => column,
        }
    }
}

impl ChartRenderError {
    pub fn column(&self) -> &str {
        match self {
            ChartRenderError::Unplottable { column, .. } => column,
            ChartRenderError::Backend { column, .. } => column,
        }
    }
}

/// The cleaned table could not be written as a spreadsheet.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("table has {0} rows, more than a worksheet can hold")]
    TooManyRows(usize),

    #[error("table has {0} columns, more than a worksheet can hold")]
    TooManyColumns(usize),

    #[error("spreadsheet writer failed: {0}")]
    Writer(#[from] rust_xlsxwriter::XlsxError),
}
