use crate::chart::{ChartKind, ChartParams, ChartRequest};
use crate::data::{Cells, Table};
use crate::stats;
use serde::Serialize;

/// Pairwise Pearson correlations between the numeric columns of a table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// `values[i][j]`; `None` where the coefficient is undefined (zero variance).
    pub values: Vec<Vec<Option<f64>>>,
    /// Cell labels, two decimals, `nan` for undefined cells.
    pub annotations: Vec<Vec<String>>,
}

impl CorrelationMatrix {
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get(row)?.get(col).copied().flatten()
    }
}

fn annotate(value: Option<f64>) -> String {
    match value {
        // + 0.0 folds -0.0 so it prints as 0.00
        Some(v) => format!("{:.2}", stats::round_to(v, 2) + 0.0),
        None => "nan".to_string(),
    }
}

/// Correlation matrix over all numeric columns, in table order.
pub fn correlation_matrix(table: &Table) -> CorrelationMatrix {
    let numeric: Vec<(&str, &[Option<f64>])> = table
        .numeric_columns()
        .filter_map(|c| match &c.cells {
            Cells::Numeric(v) => Some((c.name.as_str(), v.as_slice())),
            Cells::Categorical(_) => None,
        })
        .collect();
    let n = numeric.len();

    let mut values = vec![vec![None; n]; n];
    for i in 0..n {
        values[i][i] = Some(1.0);
        for j in (i + 1)..n {
            let r = stats::pearson(numeric[i].1, numeric[j].1);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    let annotations = values
        .iter()
        .map(|row| row.iter().map(|v| annotate(*v)).collect())
        .collect();

    CorrelationMatrix {
        columns: numeric.iter().map(|(name, _)| name.to_string()).collect(),
        values,
        annotations,
    }
}

/// The correlation heatmap request, or `None` when fewer than two numeric columns exist.
pub fn heatmap_request(table: &Table) -> Option<ChartRequest> {
    let matrix = correlation_matrix(table);
    if matrix.len() < 2 {
        return None;
    }
    Some(ChartRequest::for_table(
        ChartKind::CorrelationHeatmap,
        ChartParams::Heatmap(matrix),
    ))
}
