use crate::data::{Cells, Column};
use serde::Serialize;
use std::collections::HashSet;

/// Categorical columns with at most this many distinct values are low-cardinality.
pub const CARDINALITY_THRESHOLD: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardinalityClass {
    Low,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnClass {
    Numeric,
    Categorical(CardinalityClass),
}

/// Number of distinct present values in a column
pub fn cardinality(column: &Column) -> usize {
    match &column.cells {
        Cells::Numeric(v) => v
            .iter()
            .flatten()
            .map(|x| x.to_bits())
            .collect::<HashSet<_>>()
            .len(),
        Cells::Categorical(v) => v.iter().flatten().collect::<HashSet<_>>().len(),
    }
}

/// Classify a column by its declared kind; categorical columns also get a cardinality class.
pub fn classify(column: &Column) -> ColumnClass {
    match column.cells {
        Cells::Numeric(_) => ColumnClass::Numeric,
        Cells::Categorical(_) => {
            if cardinality(column) <= CARDINALITY_THRESHOLD {
                ColumnClass::Categorical(CardinalityClass::Low)
            } else {
                ColumnClass::Categorical(CardinalityClass::High)
            }
        }
    }
}
