use crate::colormap::{to_hex, ColorScale, MISSING_COLOR};
use crate::config::MapConfig;
use crate::processing::{min_max, Histogram};
use crate::report::escape_html;
use crate::types::{format_optional, Column, Dataset, Record};
use anyhow::{Result, anyhow};
use geo::{Centroid, MultiPoint, Point};
use plotters::prelude::*;
use serde::Serialize;
use tracing::debug;

const BAR_COLOR: RGBColor = RGBColor(76, 114, 176);
const DENSITY_COLOR: RGBColor = RGBColor(31, 58, 104);

/// Draws a histogram and its density curve as an SVG document.
pub fn histogram_svg(hist: &Histogram, title: &str, size: (u32, u32)) -> Result<String> {
    let first = hist.edges[0];
    let last = hist.edges[hist.edges.len() - 1];

    let density_peak = hist
        .density
        .iter()
        .flatten()
        .map(|&(_, y)| y)
        .fold(0.0, f64::max);
    let y_max = (hist.max_count() as f64).max(density_peak).max(1.0) * 1.1;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 24))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(first..last, 0.0..y_max)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc(hist.column.label())
            .y_desc("Frequency")
            .draw()?;

        chart.draw_series(hist.counts.iter().enumerate().map(|(i, &count)| {
            let mut bar = Rectangle::new(
                [(hist.edges[i], 0.0), (hist.edges[i + 1], count as f64)],
                BAR_COLOR.mix(0.75).filled(),
            );
            bar.set_margin(0, 0, 1, 1);
            bar
        }))?;

        if let Some(curve) = &hist.density {
            chart.draw_series(LineSeries::new(
                curve.iter().copied(),
                DENSITY_COLOR.stroke_width(2),
            ))?;
        }

        root.present()?;
    }
    Ok(svg)
}

/// Mean latitude and longitude of all records, as a (lon, lat) point.
pub fn map_center(records: &[Record]) -> Result<Point<f64>> {
    let points: MultiPoint<f64> = records
        .iter()
        .map(|r| Point::new(r.longitude, r.latitude))
        .collect();
    points
        .centroid()
        .ok_or_else(|| anyhow!("Cannot compute the map center of an empty dataset"))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    /// [lat, lon], the order Leaflet expects.
    pub location: [f64; 2],
    pub color: String,
    pub radius: f64,
    pub fill_opacity: f64,
    pub popup: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendSwatch {
    pub label: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapLegend {
    pub caption: String,
    pub min: f64,
    pub max: f64,
    /// Palette stops for the gradient strip.
    pub strip: Vec<String>,
    /// Min, mid and max swatches.
    pub swatches: [LegendSwatch; 3],
}

/// Everything needed to draw one colored marker map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    pub column: Column,
    pub center: Point<f64>,
    pub zoom: u8,
    pub width: u32,
    pub height: u32,
    pub tile_url: String,
    pub scale: Option<ColorScale>,
    pub markers: Vec<MapMarker>,
    /// `None` when the column has no values at all.
    pub legend: Option<MapLegend>,
}

pub fn build_map_view(dataset: &Dataset, column: Column, config: &MapConfig) -> Result<MapView> {
    let center = map_center(dataset.records())?;

    let scale = match min_max(&dataset.values(column)) {
        Some((min, max)) => Some(ColorScale::yl_or_rd(min, max)?),
        None => None,
    };
    debug!(
        "Map for {}: {} markers, range {:?}",
        column,
        dataset.len(),
        scale.as_ref().map(|s| (s.min(), s.max()))
    );

    let markers = dataset
        .records()
        .iter()
        .map(|record| {
            let color = match &scale {
                Some(scale) => scale.color_for(column.value(record)),
                None => MISSING_COLOR,
            };
            MapMarker {
                location: [record.latitude, record.longitude],
                color: to_hex(color),
                radius: config.marker_radius,
                fill_opacity: config.fill_opacity,
                popup: popup_html(record),
            }
        })
        .collect();

    let legend = scale.as_ref().map(|scale| legend_for(column, scale));

    Ok(MapView {
        column,
        center,
        zoom: config.zoom_start,
        width: config.width,
        height: config.height,
        tile_url: config.tile_url.clone(),
        scale,
        markers,
        legend,
    })
}

fn legend_for(column: Column, scale: &ColorScale) -> MapLegend {
    let swatch = |name: &str, value: f64| LegendSwatch {
        label: format!("{} ({})", name, format_optional(Some(value))),
        color: to_hex(scale.color_at(value)),
    };
    MapLegend {
        caption: column.label().to_string(),
        min: scale.min(),
        max: scale.max(),
        strip: scale.stops().iter().map(|&c| to_hex(c)).collect(),
        swatches: [
            swatch("Min", scale.min()),
            swatch("Mid", scale.mid()),
            swatch("Max", scale.max()),
        ],
    }
}

// Shows both covariates regardless of which one colors the map.
fn popup_html(record: &Record) -> String {
    format!(
        "Vehicle Number: {}<br>GDP (PPP): {}<br>Population Density: {}",
        escape_html(&record.vehicle_number),
        format_optional(record.gdp_ppp),
        format_optional(record.population_density),
    )
}
