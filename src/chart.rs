use crate::classify::{CardinalityClass, ColumnClass};
use crate::data::{Cells, Column};
use crate::error::ChartRenderError;
use crate::report::CorrelationMatrix;
use crate::stats::{self, BoxSummary, HistogramBin};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Histogram,
    BoxPlot,
    PieChart,
    BarChart,
    CorrelationHeatmap,
}

impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Histogram => "histogram",
            ChartKind::BoxPlot => "box_plot",
            ChartKind::PieChart => "pie_chart",
            ChartKind::BarChart => "bar_chart",
            ChartKind::CorrelationHeatmap => "correlation_heatmap",
        }
    }

    fn title_for(&self, column: &str) -> String {
        match self {
            ChartKind::Histogram => format!("Histogram for {}", column),
            ChartKind::BoxPlot => format!("Box Plot for {}", column),
            ChartKind::PieChart => format!("Pie Chart for {}", column),
            ChartKind::BarChart => format!("Bar Chart for {}", column),
            ChartKind::CorrelationHeatmap => "Correlation Heatmap".to_string(),
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub label: String,
    pub count: usize,
    /// Share of present values, rounded to one decimal place.
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub label: String,
    pub count: usize,
}

/// Everything the plotting backend needs to draw one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartParams {
    Histogram { bins: Vec<HistogramBin> },
    BoxPlot(BoxSummary),
    Pie { slices: Vec<PieSlice> },
    Bar { bars: Vec<Bar> },
    Heatmap(CorrelationMatrix),
}

/// An instruction to render one chart, decoupled from the rendering itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRequest {
    /// Column the chart describes; `None` for whole-table charts.
    pub column: Option<String>,
    pub kind: ChartKind,
    pub title: String,
    pub params: ChartParams,
}

impl ChartRequest {
    pub fn for_column(column: &str, kind: ChartKind, params: ChartParams) -> Self {
        Self {
            column: Some(column.to_string()),
            kind,
            title: kind.title_for(column),
            params,
        }
    }

    pub fn for_table(kind: ChartKind, params: ChartParams) -> Self {
        Self {
            column: None,
            kind,
            title: kind.title_for(""),
            params,
        }
    }

    /// Name used in diagnostics and file names
    pub fn subject(&self) -> &str {
        self.column.as_deref().unwrap_or("numeric columns")
    }
}

/// Chart requests for one classified column, in render order.
///
/// Numeric columns get a histogram then a box plot, low-cardinality categorical
/// columns a pie chart, high-cardinality ones a bar chart. Slices and bars are
/// ordered by descending frequency, ties in first-encountered order.
pub fn select_charts(
    column: &Column,
    class: ColumnClass,
) -> Result<Vec<ChartRequest>, ChartRenderError> {
    let unplottable = |reason: &str| ChartRenderError::Unplottable {
        column: column.name.clone(),
        reason: reason.to_string(),
    };

    match (&column.cells, class) {
        (Cells::Numeric(_), ColumnClass::Numeric) => {
            let values = column.numeric_values().unwrap_or_default();
            if values.is_empty() {
                return Err(unplottable("no present values"));
            }
            if values.iter().any(|v| !v.is_finite()) {
                return Err(unplottable("contains non-finite values"));
            }
            let (min, max) = values
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
            if !(max - min).is_finite() {
                return Err(unplottable("value range overflows"));
            }

            let bins = stats::histogram(&values);
            let summary = stats::box_summary(&values)
                .ok_or_else(|| unplottable("no present values"))?;

            Ok(vec![
                ChartRequest::for_column(&column.name, ChartKind::Histogram, ChartParams::Histogram { bins }),
                ChartRequest::for_column(&column.name, ChartKind::BoxPlot, ChartParams::BoxPlot(summary)),
            ])
        }
        (Cells::Categorical(_), ColumnClass::Categorical(cardinality)) => {
            let values = column.text_values().unwrap_or_default();
            if values.is_empty() {
                return Err(unplottable("no present values"));
            }
            let total = values.len();
            let counts = stats::value_counts(values);

            let request = match cardinality {
                CardinalityClass::Low => {
                    let slices = counts
                        .into_iter()
                        .map(|(label, count)| PieSlice {
                            label: label.to_string(),
                            count,
                            percent: stats::round_to(100.0 * count as f64 / total as f64, 1),
                        })
                        .collect();
                    ChartRequest::for_column(&column.name, ChartKind::PieChart, ChartParams::Pie { slices })
                }
                CardinalityClass::High => {
                    let bars = counts
                        .into_iter()
                        .map(|(label, count)| Bar {
                            label: label.to_string(),
                            count,
                        })
                        .collect();
                    ChartRequest::for_column(&column.name, ChartKind::BarChart, ChartParams::Bar { bars })
                }
            };
            Ok(vec![request])
        }
        _ => Err(unplottable("classification does not match the column's kind")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;

    fn kinds(requests: &[ChartRequest]) -> Vec<ChartKind> {
        requests.iter().map(|r| r.kind).collect()
    }

    #[test]
    fn test_numeric_gets_histogram_then_box_plot() {
        let col = Column::numeric("a", vec![Some(1.0), Some(2.0), Some(3.0)]);
        let requests = select_charts(&col, classify(&col)).unwrap();
        assert_eq!(kinds(&requests), vec![ChartKind::Histogram, ChartKind::BoxPlot]);
        assert_eq!(requests[0].title, "Histogram for a");
        assert_eq!(requests[1].title, "Box Plot for a");
        assert_eq!(requests[0].column.as_deref(), Some("a"));
    }

    #[test]
    fn test_low_cardinality_pie_percentages() {
        let col = Column::categorical("b", vec![Some("x"), Some("y"), Some("x")]);
        let requests = select_charts(&col, classify(&col)).unwrap();
        assert_eq!(kinds(&requests), vec![ChartKind::PieChart]);

        let ChartParams::Pie { slices } = &requests[0].params else { panic!("pie params expected") };
        assert_eq!(
            slices,
            &vec![
                PieSlice { label: "x".to_string(), count: 2, percent: 66.7 },
                PieSlice { label: "y".to_string(), count: 1, percent: 33.3 },
            ]
        );
    }

    #[test]
    fn test_pie_ignores_missing_values() {
        let col = Column::categorical("b", vec![Some("x"), None, Some("y"), Some("y")]);
        let requests = select_charts(&col, classify(&col)).unwrap();
        let ChartParams::Pie { slices } = &requests[0].params else { panic!("pie params expected") };
        assert_eq!(slices[0].label, "y");
        assert_eq!(slices[0].percent, 66.7);
        assert_eq!(slices[1].percent, 33.3);
    }

    #[test]
    fn test_high_cardinality_bar_order() {
        let mut cells: Vec<Option<String>> = (0..12).map(|i| Some(format!("v{i}"))).collect();
        cells.push(Some("v5".to_string()));
        cells.push(Some("v3".to_string()));
        cells.push(Some("v5".to_string()));
        let col = Column::categorical("c", cells);

        let requests = select_charts(&col, classify(&col)).unwrap();
        assert_eq!(kinds(&requests), vec![ChartKind::BarChart]);
        let ChartParams::Bar { bars } = &requests[0].params else { panic!("bar params expected") };
        assert_eq!(bars.len(), 12);
        assert_eq!(bars[0], Bar { label: "v5".to_string(), count: 3 });
        assert_eq!(bars[1], Bar { label: "v3".to_string(), count: 2 });
        // remaining ties keep first-encountered order
        assert_eq!(bars[2].label, "v0");
        assert_eq!(bars[3].label, "v1");
        assert_eq!(bars[4].label, "v2");
        assert_eq!(bars[5].label, "v4");
    }

    #[test]
    fn test_selection_is_deterministic() {
        let col = Column::categorical(
            "c",
            vec![Some("b"), Some("a"), Some("c"), Some("a"), Some("b")],
        );
        let first = select_charts(&col, classify(&col)).unwrap();
        let second = select_charts(&col, classify(&col)).unwrap();
        assert_eq!(first, second);

        let num = Column::numeric("n", vec![Some(4.0), Some(1.0), Some(9.0), Some(2.0)]);
        assert_eq!(
            select_charts(&num, classify(&num)).unwrap(),
            select_charts(&num, classify(&num)).unwrap()
        );
    }

    #[test]
    fn test_all_missing_column_is_unplottable() {
        let col = Column::numeric("empty", vec![None, None]);
        let err = select_charts(&col, classify(&col)).unwrap_err();
        assert!(matches!(err, ChartRenderError::Unplottable { .. }));
        assert_eq!(err.column(), "empty");
    }

    #[test]
    fn test_infinite_values_are_unplottable() {
        let col = Column::numeric("n", vec![Some(1.0), Some(f64::INFINITY)]);
        let err = select_charts(&col, classify(&col)).unwrap_err();
        assert!(err.to_string().contains("non-finite"));
    }

    #[test]
    fn test_overflowing_range_is_unplottable() {
        let col = Column::numeric("n", vec![Some(-1e308), Some(1e308), Some(0.0)]);
        let err = select_charts(&col, classify(&col)).unwrap_err();
        assert!(matches!(err, ChartRenderError::Unplottable { .. }));
        assert!(err.to_string().contains("overflows"));
    }

    #[test]
    fn test_mismatched_class_is_unplottable() {
        let col = Column::numeric("n", vec![Some(1.0)]);
        let result = select_charts(&col, ColumnClass::Categorical(CardinalityClass::Low));
        assert!(result.is_err());
    }
}
