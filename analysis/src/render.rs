use crate::{
    config::{Facet, FigureConfig},
    results::{ResultFrame, Sample},
};
use itertools::Itertools;
use plotters::{
    coord::{types::RangedCoordf64, Shift},
    prelude::*,
};
use std::{
    fmt::Display,
    ops::Range,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::debug;

const FONT: &str = "sans-serif";
const TITLE_FONT_SIZE: i32 = 22;
const CAPTION_FONT_SIZE: i32 = 15;
const LEGEND_FONT_SIZE: i32 = 14;
const LEGEND_WIDTH: u32 = 180;
const LEGEND_LINE: i32 = 22;
const PANEL_MARGIN: u32 = 10;
const MARKER_SIZE: i32 = 4;
// share of the x range added on both sides so points don't sit on the frame
const X_PADDING: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Svg,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "svg" => Some(Self::Svg),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Unsupported image format for {0:?}, use .png or .svg")]
    UnsupportedFormat(PathBuf),
    #[error("Nothing to draw")]
    EmptyFrame,
    #[error("Sample ({x}, {y}) of series {series} can not be drawn")]
    NonFinite { series: String, x: f64, y: f64 },
    #[error("Failed to draw figure: {0}")]
    Drawing(String),
}

fn drawing_error<E: Display>(error: E) -> RenderError {
    RenderError::Drawing(error.to_string())
}

/// y axis shared by all panels, starts at zero and leaves `headroom` above the largest value
pub fn y_range(frame: &ResultFrame, headroom: f64) -> Range<f64> {
    match frame.max_y() {
        Some(max) if max > 0.0 && max.is_finite() => {
            let end = max * (1.0 + headroom);

            // headroom on top of a huge maximum overflows
            if end.is_finite() {
                0.0..end
            } else {
                0.0..max
            }
        }
        _ => 0.0..1.0,
    }
}

/// x axis shared by all panels, padded on both sides
pub fn x_range(frame: &ResultFrame) -> Range<f64> {
    match frame.x_bounds() {
        Some((min, max)) if max > min => {
            let padding = (max - min) * X_PADDING;

            (min - padding)..(max + padding)
        }
        Some((min, max)) => (min - 1.0)..(max + 1.0),
        None => 0.0..1.0,
    }
}

/// Panels of the figure, `None` stands for a panel showing every sample
pub fn panels<'a>(frame: &'a ResultFrame, facet: Facet) -> Vec<Option<&'a str>> {
    let facets = frame.facets();

    if facet == Facet::Single || facets.is_empty() {
        vec![None]
    } else {
        facets.into_iter().map(Some).collect_vec()
    }
}

fn in_panel(sample: &Sample, panel: Option<&str>) -> bool {
    panel.map_or(true, |name| sample.facet.as_deref() == Some(name))
}

/// Draw `frame` as described by `figure` into `path`
pub fn render_figure(
    frame: &ResultFrame,
    figure: &FigureConfig,
    path: &Path,
) -> Result<(), RenderError> {
    if frame.is_empty() {
        return Err(RenderError::EmptyFrame);
    }
    if let Some(sample) = frame
        .iter()
        .find(|sample| !(sample.x.is_finite() && sample.y.is_finite()))
    {
        return Err(RenderError::NonFinite {
            series: sample.series.clone(),
            x: sample.x,
            y: sample.y,
        });
    }

    let size = (figure.width, figure.height);

    match OutputFormat::from_path(path) {
        Some(OutputFormat::Png) => {
            let root = BitMapBackend::new(path, size).into_drawing_area();
            draw(&root, frame, figure)?;
            root.present().map_err(drawing_error)
        }
        Some(OutputFormat::Svg) => {
            let root = SVGBackend::new(path, size).into_drawing_area();
            draw(&root, frame, figure)?;
            root.present().map_err(drawing_error)
        }
        None => Err(RenderError::UnsupportedFormat(path.to_path_buf())),
    }
}

fn draw<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    frame: &ResultFrame,
    figure: &FigureConfig,
) -> Result<(), RenderError>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).map_err(drawing_error)?;

    let root = match &figure.title {
        Some(title) => root
            .titled(title, (FONT, TITLE_FONT_SIZE))
            .map_err(drawing_error)?,
        None => root.clone(),
    };

    let (width, _) = root.dim_in_pixel();
    let legend_width = LEGEND_WIDTH.min(width / 3);
    let (plot_area, legend_area) = root.split_horizontally(width - legend_width);

    let panels = panels(frame, figure.facet);
    let areas = match figure.facet {
        Facet::Row => plot_area.split_evenly((panels.len(), 1)),
        Facet::Column => plot_area.split_evenly((1, panels.len())),
        Facet::Single => vec![plot_area],
    };

    let series = frame.series();
    let markers = frame.markers();
    let x_range = x_range(frame);
    let y_range = y_range(frame, figure.headroom);
    let y_label = figure.y_label();
    let x_formatter = |x: &f64| format!("{x:.0}");

    debug!(
        figure = %figure.name,
        panels = panels.len(),
        series = series.len(),
        "Drawing figure"
    );

    for (index, (area, panel)) in areas.iter().zip(panels.iter()).enumerate() {
        // axis titles only where they are not repeated by the neighbouring panel
        let show_x = figure.facet != Facet::Row || index + 1 == panels.len();
        let show_y = figure.facet != Facet::Column || index == 0;

        let mut builder = ChartBuilder::on(area);
        builder
            .margin(PANEL_MARGIN)
            .x_label_area_size(if show_x { 45 } else { 25 })
            .y_label_area_size(if show_y { 65 } else { 45 });

        if let Some(panel) = panel {
            builder.caption(*panel, (FONT, CAPTION_FONT_SIZE));
        }

        let mut chart = builder
            .build_cartesian_2d(x_range.clone(), y_range.clone())
            .map_err(drawing_error)?;

        let mut mesh = chart.configure_mesh();
        mesh.light_line_style(WHITE);
        if show_x {
            mesh.x_desc(figure.x_label.as_str());
        }
        if show_y {
            mesh.y_desc(y_label.as_str());
        }
        mesh.x_label_formatter(&x_formatter)
            .draw()
            .map_err(drawing_error)?;

        for (series_index, name) in series.iter().enumerate() {
            let color = Palette99::pick(series_index).to_rgba();

            if markers.is_empty() {
                let points = frame
                    .iter()
                    .filter(|sample| in_panel(sample, *panel) && sample.series == *name)
                    .map(|sample| (sample.x, sample.y))
                    .collect_vec();

                draw_points(&mut chart, points, 0, color)?;
            } else {
                for (marker_index, marker) in markers.iter().enumerate() {
                    let points = frame
                        .iter()
                        .filter(|sample| {
                            in_panel(sample, *panel)
                                && sample.series == *name
                                && sample.marker.as_deref() == Some(*marker)
                        })
                        .map(|sample| (sample.x, sample.y))
                        .collect_vec();

                    draw_points(&mut chart, points, marker_index, color)?;
                }
            }
        }
    }

    draw_legend(&legend_area, &series, &markers)
}

fn draw_points<DB: DrawingBackend>(
    chart: &mut ChartContext<'_, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    points: Vec<(f64, f64)>,
    shape: usize,
    color: RGBAColor,
) -> Result<(), RenderError>
where
    DB::ErrorType: 'static,
{
    if points.is_empty() {
        return Ok(());
    }

    let style = color.filled();
    let points = points.into_iter();

    let result = match shape % 4 {
        0 => chart
            .draw_series(points.map(|point| Circle::new(point, MARKER_SIZE, style)))
            .map(|_| ()),
        1 => chart
            .draw_series(points.map(|point| TriangleMarker::new(point, MARKER_SIZE, style)))
            .map(|_| ()),
        2 => chart
            .draw_series(points.map(|point| Cross::new(point, MARKER_SIZE, style)))
            .map(|_| ()),
        _ => chart
            .draw_series(points.map(|point| {
                EmptyElement::at(point)
                    + Rectangle::new(
                        [(-MARKER_SIZE, -MARKER_SIZE), (MARKER_SIZE, MARKER_SIZE)],
                        style,
                    )
            }))
            .map(|_| ()),
    };

    result.map_err(drawing_error)
}

/// series colours first, then the marker shapes
fn draw_legend<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    series: &[&str],
    markers: &[&str],
) -> Result<(), RenderError>
where
    DB::ErrorType: 'static,
{
    let font = (FONT, LEGEND_FONT_SIZE).into_font();
    let mark_x = 15;
    let text_x = 28;
    let mut y = 40;

    for (index, name) in series.iter().enumerate() {
        let style = Palette99::pick(index).to_rgba().filled();

        area.draw(&Circle::new((mark_x, y), MARKER_SIZE, style))
            .map_err(drawing_error)?;
        area.draw(&Text::new(
            name.to_string(),
            (text_x, y - LEGEND_FONT_SIZE / 2),
            font.clone(),
        ))
        .map_err(drawing_error)?;

        y += LEGEND_LINE;
    }

    if !markers.is_empty() {
        y += LEGEND_LINE / 2;
    }

    for (index, name) in markers.iter().enumerate() {
        let style = BLACK.filled();
        let at = (mark_x, y);

        let result = match index % 4 {
            0 => area.draw(&Circle::new(at, MARKER_SIZE, style)),
            1 => area.draw(&TriangleMarker::new(at, MARKER_SIZE, style)),
            2 => area.draw(&Cross::new(at, MARKER_SIZE, style)),
            _ => area.draw(&Rectangle::new(
                [
                    (mark_x - MARKER_SIZE, y - MARKER_SIZE),
                    (mark_x + MARKER_SIZE, y + MARKER_SIZE),
                ],
                style,
            )),
        };
        result.map_err(drawing_error)?;
        area.draw(&Text::new(
            name.to_string(),
            (text_x, y - LEGEND_FONT_SIZE / 2),
            font.clone(),
        ))
        .map_err(drawing_error)?;

        y += LEGEND_LINE;
    }

    Ok(())
}
