use anyhow::{Context, Result};
use clap::Parser;
use skimlit::export::{self, ExportOptions};
use skimlit::pipeline::{self, Report};
use skimlit::{OutputFormat, RenderOptions};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "skimlit")]
#[command(about = "Clean a CSV file, chart every column and export the result as xlsx", long_about = None)]
struct Args {
    /// CSV file to process (reads stdin when omitted or '-')
    input: Option<PathBuf>,

    /// Directory the chart images are written to
    #[arg(short, long, default_value = "charts")]
    out_dir: PathBuf,

    /// Path of the cleaned spreadsheet
    #[arg(short, long, default_value = export::DEFAULT_FILE_NAME)]
    export: PathBuf,

    /// Leave the row index column out of the spreadsheet
    #[arg(long)]
    no_index: bool,

    /// JSON file with render options (width, height, type)
    #[arg(long)]
    options: Option<PathBuf>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Print a JSON summary of the run to stdout
    #[arg(long)]
    summary: bool,
}

fn main() -> Result<()> {
    // Logs go to stderr; set RUST_LOG=debug for per-column detail
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let options = load_render_options(&args)?;

    // Parse and clean the input
    let parsed = match args.input.as_deref() {
        None => pipeline::run_csv(io::stdin().lock()),
        Some(path) if path == Path::new("-") => pipeline::run_csv(io::stdin().lock()),
        Some(path) => {
            let file = fs::File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            pipeline::run_csv(io::BufReader::new(file))
        }
    };
    let report = match parsed {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Parse error: {}", e);
            std::process::exit(1);
        }
    };

    // Render charts to the output directory
    let render_diagnostics = write_charts(&report, &args.out_dir, &options)?;

    // Export the cleaned table
    let export_options = ExportOptions {
        include_index: !args.no_index,
    };
    let bytes = export::encode(&report.table, &export_options)
        .context("Failed to export cleaned data")?;
    fs::write(&args.export, bytes)
        .with_context(|| format!("Failed to write {}", args.export.display()))?;
    info!(path = %args.export.display(), "Wrote cleaned data");

    let skipped = report.diagnostics.len() + render_diagnostics.len();
    if skipped > 0 {
        warn!(count = skipped, "Some columns could not be fully processed");
    }

    if args.summary {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        serde_json::to_writer_pretty(&mut handle, &report.summary(&render_diagnostics))
            .context("Failed to write summary")?;
        writeln!(handle).context("Failed to write summary")?;
        handle.flush().context("Failed to flush stdout")?;
    }

    Ok(())
}

fn load_render_options(args: &Args) -> Result<RenderOptions> {
    let mut options = match &args.options {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Invalid render options in {}", path.display()))?
        }
        None => RenderOptions::default(),
    };

    if let Some(width) = args.width {
        options.width = width;
    }
    if let Some(height) = args.height {
        options.height = height;
    }
    if let Some(format) = args.format {
        options.format = format;
    }
    Ok(options)
}

fn write_charts(
    report: &Report,
    out_dir: &Path,
    options: &RenderOptions,
) -> Result<Vec<pipeline::Diagnostic>> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let (rendered, diagnostics) = pipeline::render_charts(&report.charts, options);
    for chart in &rendered {
        let path = out_dir.join(chart.file_name(options));
        fs::write(&path, &chart.bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    info!(
        charts = rendered.len(),
        dir = %out_dir.display(),
        "Wrote charts"
    );

    Ok(diagnostics)
}
