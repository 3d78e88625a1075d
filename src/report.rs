use crate::config::AppConfig;
use crate::data::load_data;
use crate::processing::{describe, preview, ColumnSummary, Histogram};
use crate::render::{build_map_view, histogram_svg, MapLegend, MapView};
use crate::types::{format_optional, Column, Dataset, Record};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write;
use tracing::{debug, info};

const HISTOGRAM_SIZE: (u32, u32) = (1000, 600);
const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";

struct Insights {
    intro: Option<&'static str>,
    points: &'static [&'static str],
    outro: Option<&'static str>,
}

static GDP_INSIGHTS: Insights = Insights {
    intro: None,
    points: &[
        "Skewed distribution to the right. The majority of bike locations are concentrated in areas with lower GDP (PPP) values, as indicated by the high frequency in the lower bins.",
        "Significant number of bikes in economically underdeveloped areas - huge potential for marketing!",
        "Long tail towards the right - potential outliers with significant growth potential.",
    ],
    outro: None,
};

static DENSITY_INSIGHTS: Insights = Insights {
    intro: Some("Two main clusters:"),
    points: &["Low population density", "High population density"],
    outro: Some("This is a huge insight for marketing analytics. Most of our focus has been on densely populated areas!"),
};

fn insights_for(column: Column) -> Option<&'static Insights> {
    match column {
        Column::GdpPpp => Some(&GDP_INSIGHTS),
        Column::PopulationDensity => Some(&DENSITY_INSIGHTS),
        Column::Latitude | Column::Longitude => None,
    }
}

/// Loads the configured dataset (memoized) and renders the full dashboard page.
pub fn render_dashboard(config: &AppConfig) -> Result<String> {
    let dataset = load_data(&config.input.data_csv)?;
    render_page(&dataset, config)
}

/// Renders every section in order; the first failing section aborts the page.
pub fn render_page(dataset: &Dataset, config: &AppConfig) -> Result<String> {
    info!("Rendering dashboard for {} bike locations", dataset.len());
    let mut body = String::new();

    debug!("Rendering data preview");
    body.push_str("<h3>Data Preview</h3>\n");
    body.push_str(&preview_table(preview(dataset, config.summary.preview_rows)));

    debug!("Rendering data summary");
    body.push_str("<h3>Data Summary</h3>\n");
    body.push_str(&summary_table(&describe(dataset)));

    for column in [Column::GdpPpp, Column::PopulationDensity] {
        debug!("Rendering histogram of {}", column);
        body.push_str(&histogram_section(dataset, column, config)?);
    }

    for column in [Column::GdpPpp, Column::PopulationDensity] {
        debug!("Rendering map of {}", column);
        let view = build_map_view(dataset, column, &config.map)
            .with_context(|| format!("Failed to build the {} map", column.label()))?;
        body.push_str(&map_section(&view)?);
    }

    Ok(page(&body))
}

fn page(body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Bike Locations Dashboard</title>
<link rel="stylesheet" href="{css}">
<script src="{js}"></script>
<style>
body {{ font-family: sans-serif; margin: 2rem auto; max-width: 1040px; color: #262730; }}
table.dataframe {{ border-collapse: collapse; font-size: 14px; margin-bottom: 1.5rem; }}
table.dataframe th, table.dataframe td {{ border: 1px solid #e6e9ef; padding: 4px 10px; text-align: right; }}
table.dataframe thead th {{ background: #f0f2f6; }}
.map-frame {{ position: relative; margin-bottom: 2rem; }}
.map-legend {{ position: absolute; bottom: 50px; left: 50px; width: 200px; border: 2px solid grey;
  z-index: 9999; font-size: 14px; background-color: white; opacity: 0.85; padding: 4px 6px; }}
.swatch {{ display: inline-block; width: 12px; height: 12px; border-radius: 50%; margin-right: 6px; }}
.colormap {{ background: white; padding: 4px 8px; font-size: 12px; }}
.colormap .strip {{ width: 240px; height: 10px; }}
.colormap .ticks {{ display: flex; justify-content: space-between; }}
</style>
</head>
<body>
{body}</body>
</html>
"#,
        css = LEAFLET_CSS,
        js = LEAFLET_JS,
        body = body,
    )
}

fn preview_table(records: &[Record]) -> String {
    let mut html = String::from(
        "<table class=\"dataframe\">\n<thead><tr><th></th><th>Vehicle Number</th>",
    );
    for column in Column::ALL {
        let _ = write!(html, "<th>{}</th>", column.header());
    }
    html.push_str("</tr></thead>\n<tbody>\n");

    for (index, record) in records.iter().enumerate() {
        let _ = write!(
            html,
            "<tr><th>{}</th><td>{}</td>",
            index,
            escape_html(&record.vehicle_number)
        );
        for column in Column::ALL {
            let _ = write!(html, "<td>{}</td>", format_optional(column.value(record)));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n");
    html
}

fn summary_table(summaries: &[ColumnSummary]) -> String {
    let mut html = String::from("<table class=\"dataframe\">\n<thead><tr><th></th>");
    for summary in summaries {
        let _ = write!(html, "<th>{}</th>", summary.column.header());
    }
    html.push_str("</tr></thead>\n<tbody>\n");

    let rows: Vec<_> = summaries.iter().map(ColumnSummary::rows).collect();
    for (i, &(name, _)) in rows.first().into_iter().flatten().enumerate() {
        let _ = write!(html, "<tr><th>{}</th>", name);
        for row in &rows {
            let _ = write!(html, "<td>{:.6}</td>", row[i].1);
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n");
    html
}

fn histogram_section(dataset: &Dataset, column: Column, config: &AppConfig) -> Result<String> {
    let hist = Histogram::for_column(
        dataset,
        column,
        config.summary.histogram_bins,
        config.summary.density_points,
    );
    let title = format!("Histogram of {} at Bike Locations", column.label());
    let svg = histogram_svg(&hist, &title, HISTOGRAM_SIZE)
        .with_context(|| format!("Failed to draw the {} histogram", column.label()))?;

    let mut html = format!("<h3>{}</h3>\n<div class=\"chart\">{}</div>\n", escape_html(&title), svg);
    if let Some(insights) = insights_for(column) {
        html.push_str(&insights_html(insights));
    }
    Ok(html)
}

fn insights_html(insights: &Insights) -> String {
    let mut html = String::from("<h5>Insights</h5>\n");
    if let Some(intro) = insights.intro {
        let _ = writeln!(html, "<p>{}</p>", escape_html(intro));
    }
    html.push_str("<ol>\n");
    for point in insights.points {
        let _ = writeln!(html, "<li>{}</li>", escape_html(point));
    }
    html.push_str("</ol>\n");
    if let Some(outro) = insights.outro {
        let _ = writeln!(html, "<p>{}</p>", escape_html(outro));
    }
    html
}

fn map_section(view: &MapView) -> Result<String> {
    let map_id = format!("map_{}", view.column.slug());
    let mut html = format!(
        "<h3>Map of Bike Locations Colored by {}</h3>\n\
         <div class=\"map-frame\" style=\"width: {w}px; height: {h}px;\">\n\
         <div id=\"{id}\" style=\"width: {w}px; height: {h}px;\"></div>\n",
        escape_html(view.column.label()),
        w = view.width,
        h = view.height,
        id = map_id,
    );

    let strip = match &view.legend {
        Some(legend) => {
            html.push_str(&legend_box(legend));
            color_strip(legend)
        }
        None => format!("<b>{}</b><br>no data", escape_html(view.column.label())),
    };
    html.push_str("</div>\n");

    let _ = write!(
        html,
        r#"<script>
(function () {{
  var map = L.map({id}).setView([{lat}, {lon}], {zoom});
  L.tileLayer({tiles}, {{ attribution: "&copy; OpenStreetMap contributors" }}).addTo(map);
  {markers}.forEach(function (m) {{
    L.circleMarker(m.location, {{
      radius: m.radius, color: m.color, fill: true, fillColor: m.color, fillOpacity: m.fill_opacity
    }}).bindPopup(m.popup).addTo(map);
  }});
  var strip = L.control({{ position: "topright" }});
  strip.onAdd = function () {{
    var div = L.DomUtil.create("div", "colormap");
    div.innerHTML = {strip};
    return div;
  }};
  strip.addTo(map);
}})();
</script>
"#,
        id = script_json(&map_id)?,
        lat = view.center.y(),
        lon = view.center.x(),
        zoom = view.zoom,
        tiles = script_json(&view.tile_url)?,
        markers = script_json(&view.markers)?,
        strip = script_json(&strip)?,
    );
    Ok(html)
}

// Overlay with the min, mid and max swatches.
fn legend_box(legend: &MapLegend) -> String {
    let mut html = format!(
        "<div class=\"map-legend\">\n<b>Legend</b><br>\n{} Colors:<br>\n",
        escape_html(&legend.caption)
    );
    for swatch in &legend.swatches {
        let _ = writeln!(
            html,
            "<span class=\"swatch\" style=\"background-color: {}\"></span>{}<br>",
            swatch.color,
            escape_html(&swatch.label)
        );
    }
    html.push_str("</div>\n");
    html
}

fn color_strip(legend: &MapLegend) -> String {
    let last = legend.strip.len().saturating_sub(1).max(1) as f64;
    let stops: Vec<String> = legend
        .strip
        .iter()
        .enumerate()
        .map(|(i, color)| format!("{} {:.2}%", color, i as f64 / last * 100.0))
        .collect();
    format!(
        "<b>{}</b><div class=\"strip\" style=\"background: linear-gradient(to right, {});\"></div>\
         <div class=\"ticks\"><span>{}</span><span>{}</span></div>",
        escape_html(&legend.caption),
        stops.join(", "),
        format_optional(Some(legend.min)),
        format_optional(Some(legend.max)),
    )
}

/// JSON for embedding inside a `<script>` element.
fn script_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value).context("Failed to serialize map data")?;
    Ok(json.replace("</", "<\\/"))
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
