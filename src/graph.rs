use crate::chart::{Bar, ChartParams, ChartRequest, PieSlice};
use crate::report::CorrelationMatrix;
use crate::stats::{BoxSummary, HistogramBin};
use crate::{OutputFormat, RenderOptions};
use anyhow::{Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::ops::Range;

const FILL: RGBColor = RGBColor(76, 114, 176);

/// Largest bitmap, in pixels, a PNG chart may allocate.
pub const MAX_PIXELS: usize = 100_000_000;

/// Render a chart request to image bytes (PNG or SVG, per `options.format`).
pub fn render(request: &ChartRequest, options: &RenderOptions) -> Result<Vec<u8>> {
    if options.width == 0 || options.height == 0 {
        anyhow::bail!("Image size must be non-zero (got {}x{})", options.width, options.height);
    }
    match options.format {
        OutputFormat::Png => {
            let mut canvas = Canvas::new(options.width, options.height)?;
            canvas.draw(request)?;
            canvas.render()
        }
        OutputFormat::Svg => {
            let mut svg = String::new();
            {
                let root = SVGBackend::with_string(&mut svg, (options.width, options.height))
                    .into_drawing_area();
                draw_request(&root, request)?;
                root.present().context("Failed to present drawing")?;
            }
            Ok(svg.into_bytes())
        }
    }
}

/// RGB bitmap canvas, encoded as PNG once drawn
pub struct Canvas {
    buffer: Vec<u8>,
    width: u32,
    height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let pixels = (width as usize)
            .checked_mul(height as usize)
            .filter(|&p| p <= MAX_PIXELS)
            .with_context(|| format!("Image size {}x{} is too large", width, height))?;
        Ok(Canvas {
            buffer: vec![0u8; pixels * 3],
            width,
            height,
        })
    }

    pub fn draw(&mut self, request: &ChartRequest) -> Result<()> {
        let root = BitMapBackend::with_buffer(&mut self.buffer, (self.width, self.height))
            .into_drawing_area();
        draw_request(&root, request)?;
        root.present().context("Failed to present drawing")?;
        Ok(())
    }

    /// Finalize and encode the canvas as PNG
    pub fn render(self) -> Result<Vec<u8>> {
        let mut png_bytes = Vec::new();
        {
            let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
            encoder
                .write_image(
                    &self.buffer,
                    self.width,
                    self.height,
                    image::ColorType::Rgb8,
                )
                .context("Failed to encode PNG")?;
        }

        Ok(png_bytes)
    }
}

fn draw_request<DB>(root: &DrawingArea<DB, Shift>, request: &ChartRequest) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).context("Failed to fill background")?;
    let subject = request.subject();

    match &request.params {
        ChartParams::Histogram { bins } => draw_histogram(root, &request.title, subject, bins),
        ChartParams::BoxPlot(summary) => draw_box_plot(root, &request.title, subject, summary),
        ChartParams::Pie { slices } => draw_pie(root, &request.title, slices),
        ChartParams::Bar { bars } => draw_bars(root, &request.title, subject, bars),
        ChartParams::Heatmap(matrix) => draw_heatmap(root, &request.title, matrix),
    }
}

/// Pad a data range by 5% on each side, or by 1 when it is degenerate
fn padded(min: f64, max: f64) -> Result<Range<f64>> {
    let range = if min == max {
        (min - 1.0)..(max + 1.0)
    } else {
        let padding = (max - min) * 0.05;
        (min - padding)..(max + padding)
    };
    drawable(range)
}

/// Plotters loops forever on non-finite or empty axis ranges.
fn drawable(range: Range<f64>) -> Result<Range<f64>> {
    if !(range.start.is_finite() && range.end.is_finite() && range.start < range.end) {
        anyhow::bail!("Axis range {}..{} cannot be drawn", range.start, range.end);
    }
    Ok(range)
}

fn draw_histogram<DB>(
    root: &DrawingArea<DB, Shift>,
    title: &str,
    x_desc: &str,
    bins: &[HistogramBin],
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (first, last) = match (bins.first(), bins.last()) {
        (Some(f), Some(l)) => (f, l),
        _ => anyhow::bail!("Cannot create histogram with no bins"),
    };
    let max_count = bins.iter().map(|b| b.count).max().unwrap_or(0).max(1) as f64;

    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .caption(title, ("sans-serif", 20))
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(drawable(first.start..last.end)?, 0.0..max_count * 1.05)
        .context("Failed to build chart")?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(x_desc)
        .y_desc("Count")
        .draw()
        .context("Failed to draw mesh")?;

    chart
        .draw_series(bins.iter().map(|b| {
            Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], FILL.mix(0.75).filled())
        }))
        .context("Failed to draw bins")?;
    chart
        .draw_series(bins.iter().map(|b| {
            Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], BLACK.stroke_width(1))
        }))
        .context("Failed to draw bin outlines")?;

    Ok(())
}

fn draw_box_plot<DB>(
    root: &DrawingArea<DB, Shift>,
    title: &str,
    y_desc: &str,
    summary: &BoxSummary,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let low = summary
        .outliers
        .iter()
        .copied()
        .fold(summary.lower_whisker, f64::min);
    let high = summary
        .outliers
        .iter()
        .copied()
        .fold(summary.upper_whisker, f64::max);

    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .caption(title, ("sans-serif", 20))
        .x_label_area_size(20)
        .y_label_area_size(50)
        .build_cartesian_2d(-1.0..1.0, padded(low, high)?)
        .context("Failed to build chart")?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_x_axis()
        .y_desc(y_desc)
        .draw()
        .context("Failed to draw mesh")?;

    let half = 0.4;
    let cap = 0.16;
    let line = BLACK.stroke_width(1);

    chart
        .draw_series(std::iter::once(Rectangle::new(
            [(-half, summary.q3), (half, summary.q1)],
            FILL.mix(0.75).filled(),
        )))
        .context("Failed to draw box")?;
    chart
        .draw_series(std::iter::once(Rectangle::new(
            [(-half, summary.q3), (half, summary.q1)],
            line,
        )))
        .context("Failed to draw box outline")?;

    let segments = vec![
        vec![(0.0, summary.lower_whisker), (0.0, summary.q1)],
        vec![(0.0, summary.q3), (0.0, summary.upper_whisker)],
        vec![(-cap, summary.lower_whisker), (cap, summary.lower_whisker)],
        vec![(-cap, summary.upper_whisker), (cap, summary.upper_whisker)],
        vec![(-half, summary.median), (half, summary.median)],
    ];
    chart
        .draw_series(segments.into_iter().map(|points| PathElement::new(points, line)))
        .context("Failed to draw whiskers")?;

    chart
        .draw_series(
            summary
                .outliers
                .iter()
                .map(|&v| Circle::new((0.0, v), 3, BLACK.stroke_width(1))),
        )
        .context("Failed to draw outliers")?;

    Ok(())
}

fn draw_pie<DB>(root: &DrawingArea<DB, Shift>, title: &str, slices: &[PieSlice]) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let total: usize = slices.iter().map(|s| s.count).sum();
    if total == 0 {
        anyhow::bail!("Cannot create pie chart with no data");
    }

    let area = root
        .titled(title, ("sans-serif", 20))
        .context("Failed to draw title")?;
    let (w, h) = area.dim_in_pixel();
    let (plot, legend) = area.split_horizontally((w as f64 * 0.75) as u32);

    let (pw, _) = plot.dim_in_pixel();
    let center = (pw as i32 / 2, h as i32 / 2);
    let radius = (pw.min(h) as f64) * 0.4;

    // Start at 12 o'clock and go counter-clockwise
    let mut angle = std::f64::consts::FRAC_PI_2;
    for (idx, slice) in slices.iter().enumerate() {
        let sweep = std::f64::consts::TAU * slice.count as f64 / total as f64;
        let color = Palette99::pick(idx).to_rgba();

        let steps = ((sweep / std::f64::consts::TAU) * 180.0).ceil().max(2.0) as usize;
        let mut points = Vec::with_capacity(steps + 2);
        points.push(center);
        for step in 0..=steps {
            let a = angle + sweep * step as f64 / steps as f64;
            points.push(polar(center, radius, a));
        }
        plot.draw(&Polygon::new(points, color.filled()))
            .context("Failed to draw wedge")?;

        let label_pos = polar(center, radius * 0.6, angle + sweep / 2.0);
        let style = TextStyle::from(("sans-serif", 14).into_font())
            .pos(Pos::new(HPos::Center, VPos::Center));
        plot.draw(&Text::new(format!("{:.1}%", slice.percent), label_pos, style))
            .context("Failed to draw wedge label")?;

        angle += sweep;
    }

    for (idx, slice) in slices.iter().enumerate() {
        let y = 20 + idx as i32 * 22;
        let color = Palette99::pick(idx).to_rgba();
        legend
            .draw(&Rectangle::new([(10, y), (24, y + 14)], color.filled()))
            .context("Failed to draw legend")?;
        legend
            .draw(&Text::new(slice.label.clone(), (30, y), ("sans-serif", 14).into_font()))
            .context("Failed to draw legend")?;
    }

    Ok(())
}

fn polar(center: (i32, i32), radius: f64, angle: f64) -> (i32, i32) {
    (
        center.0 + (radius * angle.cos()).round() as i32,
        center.1 - (radius * angle.sin()).round() as i32,
    )
}

fn draw_bars<DB>(
    root: &DrawingArea<DB, Shift>,
    title: &str,
    x_desc: &str,
    bars: &[Bar],
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    if bars.is_empty() {
        anyhow::bail!("Cannot create bar chart with no data");
    }

    let num_categories = bars.len();
    let max_count = bars.iter().map(|b| b.count).max().unwrap_or(0).max(1) as f64;

    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .caption(title, ("sans-serif", 20))
        .x_label_area_size(60)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.5..(num_categories as f64 - 0.5), 0.0..max_count * 1.05)
        .context("Failed to build chart")?;

    // Configure mesh with category names at integer ticks
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(num_categories)
        .x_label_formatter(&|x| category_label(*x, bars.iter().map(|b| b.label.as_str())))
        .x_desc(x_desc)
        .y_desc("Count")
        .draw()
        .context("Failed to draw mesh")?;

    let bar_width = 0.8;
    chart
        .draw_series(bars.iter().enumerate().map(|(idx, bar)| {
            let x_center = idx as f64;
            Rectangle::new(
                [
                    (x_center - bar_width / 2.0, 0.0),
                    (x_center + bar_width / 2.0, bar.count as f64),
                ],
                FILL.filled(),
            )
        }))
        .context("Failed to draw bars")?;

    Ok(())
}

/// Label for a tick sitting on an integer category index; blank otherwise.
fn category_label<'a>(x: f64, mut labels: impl Iterator<Item = &'a str>) -> String {
    if x < -1e-6 || (x - x.round()).abs() > 1e-6 {
        return String::new();
    }
    labels
        .nth(x.round() as usize)
        .map(str::to_string)
        .unwrap_or_default()
}

/// Diverging blue-white-red scale for values in [-1, 1].
fn coolwarm(value: f64) -> RGBColor {
    const COLD: (f64, f64, f64) = (59.0, 76.0, 192.0);
    const MID: (f64, f64, f64) = (221.0, 221.0, 221.0);
    const WARM: (f64, f64, f64) = (180.0, 4.0, 38.0);

    let t = value.clamp(-1.0, 1.0);
    let (from, to, w) = if t < 0.0 {
        (MID, COLD, -t)
    } else {
        (MID, WARM, t)
    };
    let lerp = |a: f64, b: f64| (a + (b - a) * w).round() as u8;
    RGBColor(lerp(from.0, to.0), lerp(from.1, to.1), lerp(from.2, to.2))
}

fn draw_heatmap<DB>(
    root: &DrawingArea<DB, Shift>,
    title: &str,
    matrix: &CorrelationMatrix,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let n = matrix.len();
    if n == 0 {
        anyhow::bail!("Cannot create heatmap with no columns");
    }
    let extent = -0.5..(n as f64 - 0.5);

    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .caption(title, ("sans-serif", 20))
        .x_label_area_size(60)
        .y_label_area_size(80)
        .build_cartesian_2d(extent.clone(), extent)
        .context("Failed to build chart")?;

    // Row 0 is drawn at the top, so y labels count down
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n)
        .y_labels(n)
        .x_label_formatter(&|x| category_label(*x, matrix.columns.iter().map(String::as_str)))
        .y_label_formatter(&|y| {
            category_label(n as f64 - 1.0 - *y, matrix.columns.iter().map(String::as_str))
        })
        .draw()
        .context("Failed to draw mesh")?;

    let mut cells = Vec::with_capacity(n * n);
    for row in 0..n {
        for col in 0..n {
            let x = col as f64;
            let y = (n - 1 - row) as f64;
            let color = match matrix.get(row, col) {
                Some(v) => coolwarm(v),
                None => RGBColor(200, 200, 200),
            };
            cells.push(Rectangle::new([(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)], color.filled()));
        }
    }
    chart.draw_series(cells).context("Failed to draw cells")?;

    let style = TextStyle::from(("sans-serif", 14).into_font())
        .pos(Pos::new(HPos::Center, VPos::Center));
    let mut labels = Vec::with_capacity(n * n);
    for (row, annotations) in matrix.annotations.iter().enumerate() {
        for (col, text) in annotations.iter().enumerate() {
            let y = (n - 1 - row) as f64;
            labels.push(Text::new(text.clone(), (col as f64, y), style.clone()));
        }
    }
    chart.draw_series(labels).context("Failed to draw annotations")?;

    Ok(())
}
