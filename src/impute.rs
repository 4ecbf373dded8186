use crate::data::{Cells, Column, Table};
use crate::error::ImputationError;
use crate::stats;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Statistic used to fill a column's missing cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputationStat {
    Mean(f64),
    Mode(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Imputation {
    pub column: String,
    pub stat: ImputationStat,
    pub filled: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImputationReport {
    pub imputed: Vec<Imputation>,
    pub errors: Vec<ImputationError>,
}

fn column_mean(cells: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = cells.iter().flatten().copied().collect();
    stats::mean(&present)
}

fn column_mode(cells: &[Option<String>]) -> Option<String> {
    stats::mode(cells.iter().flatten().map(String::as_str)).map(str::to_string)
}

fn fill<T: Clone>(cells: &mut [Option<T>], value: &T) {
    cells
        .iter_mut()
        .filter(|c| c.is_none())
        .for_each(|c| *c = Some(value.clone()));
}

/// Mean of present values for numeric columns, mode (first-encountered on ties) for categorical.
pub fn imputation_stat(column: &Column) -> Result<ImputationStat, ImputationError> {
    let no_values = || ImputationError::NoPresentValues {
        column: column.name.clone(),
    };
    match &column.cells {
        Cells::Numeric(cells) => {
            let mean = column_mean(cells).ok_or_else(no_values)?;
            finite_mean(&column.name, mean).map(ImputationStat::Mean)
        }
        Cells::Categorical(cells) => column_mode(cells).map(ImputationStat::Mode).ok_or_else(no_values),
    }
}

fn finite_mean(column: &str, mean: f64) -> Result<f64, ImputationError> {
    if mean.is_finite() {
        Ok(mean)
    } else {
        Err(ImputationError::NonFiniteMean {
            column: column.to_string(),
            mean,
        })
    }
}

/// Fill a single column in place. Columns with nothing missing are not touched.
pub fn impute_column(column: &mut Column) -> Result<Option<Imputation>, ImputationError> {
    let missing = column.missing_count();
    if missing == 0 {
        return Ok(None);
    }

    let no_values = || ImputationError::NoPresentValues {
        column: column.name.clone(),
    };
    let stat = match &mut column.cells {
        Cells::Numeric(cells) => {
            let mean = column_mean(cells).ok_or_else(no_values)?;
            let mean = finite_mean(&column.name, mean)?;
            fill(cells, &mean);
            ImputationStat::Mean(mean)
        }
        Cells::Categorical(cells) => {
            let mode = column_mode(cells).ok_or_else(no_values)?;
            fill(cells, &mode);
            ImputationStat::Mode(mode)
        }
    };

    Ok(Some(Imputation {
        column: column.name.clone(),
        stat,
        filled: missing,
    }))
}

/// Fill every missing cell in the table.
///
/// A column with no present values is left untouched and reported in `errors`;
/// the remaining columns are still imputed.
pub fn impute(table: &mut Table) -> ImputationReport {
    let mut report = ImputationReport::default();

    for column in table.columns_mut() {
        match impute_column(column) {
            Ok(Some(imputation)) => {
                debug!(
                    column = %imputation.column,
                    filled = imputation.filled,
                    stat = ?imputation.stat,
                    "Imputed missing values"
                );
                report.imputed.push(imputation);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(column = %column.name, "{}", e);
                report.errors.push(e);
            }
        }
    }

    info!(
        imputed = report.imputed.len(),
        skipped = report.errors.len(),
        "Imputation finished"
    );
    report
}
