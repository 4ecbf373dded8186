// Pipeline executor: impute -> classify -> select charts -> aggregate

use crate::chart::{select_charts, ChartKind, ChartRequest};
use crate::classify::{classify, ColumnClass};
use crate::csv_reader;
use crate::data::Table;
use crate::error::{ChartRenderError, ImputationError, ParseError};
use crate::graph;
use crate::impute::{impute, ImputationReport};
use crate::report::heatmap_request;
use crate::RenderOptions;
use serde::Serialize;
use std::io::Read;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Imputation,
    Charting,
    Rendering,
}

/// A non-fatal, per-column problem recorded while the run continues.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub column: Option<String>,
    pub stage: Stage,
    pub message: String,
}

impl From<&ImputationError> for Diagnostic {
    fn from(err: &ImputationError) -> Self {
        Diagnostic {
            column: Some(err.column().to_string()),
            stage: Stage::Imputation,
            message: err.to_string(),
        }
    }
}

impl Diagnostic {
    fn from_chart_error(err: &ChartRenderError, stage: Stage) -> Self {
        // include the underlying cause, which Display leaves to source()
        let message = match std::error::Error::source(err) {
            Some(cause) => format!("{}: {}", err, cause),
            None => err.to_string(),
        };
        Diagnostic {
            column: Some(err.column().to_string()),
            stage,
            message,
        }
    }
}

/// Everything the pipeline produces for one input table.
#[derive(Debug, Clone)]
pub struct Report {
    /// The cleaned table
    pub table: Table,
    pub imputation: ImputationReport,
    pub classes: Vec<(String, ColumnClass)>,
    /// Per-column charts in column order, the correlation heatmap last
    pub charts: Vec<ChartRequest>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Run the cleaning and chart selection pipeline over a parsed table.
pub fn run(mut table: Table) -> Report {
    info!(
        rows = table.row_count(),
        columns = table.column_count(),
        "Starting pipeline"
    );

    let imputation = impute(&mut table);
    let mut diagnostics: Vec<Diagnostic> = imputation.errors.iter().map(Diagnostic::from).collect();

    let mut classes = Vec::with_capacity(table.column_count());
    let mut charts = Vec::new();
    for column in table.columns() {
        let class = classify(column);
        debug!(column = %column.name, class = ?class, "Classified column");
        classes.push((column.name.clone(), class));

        match select_charts(column, class) {
            Ok(requests) => charts.extend(requests),
            Err(e) => {
                warn!(column = %column.name, "Skipping charts: {}", e);
                diagnostics.push(Diagnostic::from_chart_error(&e, Stage::Charting));
            }
        }
    }

    match heatmap_request(&table) {
        Some(request) => charts.push(request),
        None => debug!("Fewer than two numeric columns, no correlation heatmap"),
    }

    info!(
        charts = charts.len(),
        diagnostics = diagnostics.len(),
        "Pipeline finished"
    );

    Report {
        table,
        imputation,
        classes,
        charts,
        diagnostics,
    }
}

/// Parse CSV input and run the pipeline. Parse failures abort before imputation.
pub fn run_csv<R: Read>(reader: R) -> Result<Report, ParseError> {
    let csv_data = csv_reader::read_csv(reader)?;
    let table = Table::from_csv(csv_data)?;
    Ok(run(table))
}

#[derive(Debug, Clone)]
pub struct RenderedChart {
    /// Position in the report's chart order
    pub index: usize,
    pub column: Option<String>,
    pub kind: ChartKind,
    pub bytes: Vec<u8>,
}

impl RenderedChart {
    /// File name for the chart, e.g. `01_age_histogram.png`
    pub fn file_name(&self, options: &RenderOptions) -> String {
        let stem = match &self.column {
            Some(name) => format!("{}_{}", sanitize(name), self.kind),
            None => self.kind.to_string(),
        };
        format!("{:02}_{}.{}", self.index + 1, stem, options.format.extension())
    }
}

fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "column".to_string()
    } else {
        cleaned
    }
}

/// Render every chart request. A chart that fails to render is skipped and
/// reported as a diagnostic; the others still render.
pub fn render_charts(
    charts: &[ChartRequest],
    options: &RenderOptions,
) -> (Vec<RenderedChart>, Vec<Diagnostic>) {
    let mut rendered = Vec::with_capacity(charts.len());
    let mut diagnostics = Vec::new();

    for (index, request) in charts.iter().enumerate() {
        match graph::render(request, options) {
            Ok(bytes) => {
                debug!(chart = %request.title, bytes = bytes.len(), "Rendered chart");
                rendered.push(RenderedChart {
                    index,
                    column: request.column.clone(),
                    kind: request.kind,
                    bytes,
                });
            }
            Err(e) => {
                let err = ChartRenderError::Backend {
                    column: request.subject().to_string(),
                    kind: request.kind,
                    source: e.into(),
                };
                warn!(chart = %request.title, "{}", err);
                diagnostics.push(Diagnostic::from_chart_error(&err, Stage::Rendering));
            }
        }
    }

    (rendered, diagnostics)
}

#[derive(Debug, Serialize)]
pub struct ChartSummary<'a> {
    pub column: Option<&'a str>,
    pub kind: ChartKind,
    pub title: &'a str,
}

/// Compact, serializable view of a report (no table data, no chart parameters).
#[derive(Debug, Serialize)]
pub struct Summary<'a> {
    pub rows: usize,
    pub columns: usize,
    pub imputed: &'a [crate::impute::Imputation],
    pub classes: &'a [(String, ColumnClass)],
    pub charts: Vec<ChartSummary<'a>>,
    pub diagnostics: Vec<&'a Diagnostic>,
}

impl Report {
    pub fn summary<'a>(&'a self, extra: &'a [Diagnostic]) -> Summary<'a> {
        Summary {
            rows: self.table.row_count(),
            columns: self.table.column_count(),
            imputed: &self.imputation.imputed,
            classes: &self.classes,
            charts: self
                .charts
                .iter()
                .map(|c| ChartSummary {
                    column: c.column.as_deref(),
                    kind: c.kind,
                    title: &c.title,
                })
                .collect(),
            diagnostics: self.diagnostics.iter().chain(extra).collect(),
        }
    }
}
