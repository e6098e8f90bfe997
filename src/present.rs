use std::f64::consts::{FRAC_PI_2, TAU};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use eframe::egui::Color32;

use crate::color::{ColorMap, blues};
use crate::data::aggregate::AggregateSnapshot;
use crate::data::model::SalesTable;

/// Placeholder for undefined values (no rows, no top product).
pub const NONE_MARKER: &str = "—";
pub const EMPTY_CHART_MESSAGE: &str = "No data available for selected filters.";
pub const EMPTY_PRODUCT_CHART_MESSAGE: &str = "No chart to display (filtered dataset is empty).";
pub const EXPORT_FILE_NAME: &str = "filtered_data.csv";

// ---------------------------------------------------------------------------
// Number formatting
// ---------------------------------------------------------------------------

/// Zero decimals with thousands separators: `1234567.4` → `1,234,567`.
pub fn format_thousands(value: f64) -> String {
    let digits = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0.0 && digits != "0" {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Dollar amount, zero decimals: `-1234.0` → `$-1,234`.
pub fn format_currency(value: f64) -> String {
    format!("${}", format_thousands(value))
}

const SI_PREFIXES: [&str; 7] = ["m", "", "k", "M", "G", "T", "P"];

/// Decimal exponent of `value`, read off its `{:e}` rendering.
fn magnitude(value: f64) -> i32 {
    let sci = format!("{:e}", value.abs());
    sci.split_once('e')
        .and_then(|(_, exp)| exp.parse().ok())
        .unwrap_or(0)
}

/// Two significant digits with an SI suffix: `1234` → `1.2k`, `12345` → `12k`.
pub fn format_si(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return "0.0".to_string();
    }
    let step = 10f64.powi(magnitude(value) - 1);
    let rounded = (value / step).round() * step;
    let exp = magnitude(rounded);

    // Index 1 is the empty prefix.
    let group = exp.div_euclid(3).clamp(-1, SI_PREFIXES.len() as i32 - 2);
    let scaled = rounded / 10f64.powi(group * 3);
    let decimals = (1 - (exp - group * 3)).max(0) as usize;
    format!(
        "{scaled:.decimals$}{}",
        SI_PREFIXES[(group + 1) as usize]
    )
}

// ---------------------------------------------------------------------------
// KPI tiles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct KpiTile {
    pub label: &'static str,
    pub value: String,
    pub delta: Option<String>,
}

/// The four executive tiles, left to right.
pub fn kpi_tiles(snapshot: &AggregateSnapshot) -> Vec<KpiTile> {
    let (top_name, top_revenue) = snapshot
        .top_product
        .as_ref()
        .map_or((NONE_MARKER.to_string(), 0.0), |t| (t.name.clone(), t.revenue));

    vec![
        KpiTile {
            label: "Total Revenue",
            value: format_currency(snapshot.total_revenue),
            delta: None,
        },
        KpiTile {
            label: "Total Units Sold",
            value: format_thousands(snapshot.total_units),
            delta: None,
        },
        KpiTile {
            label: "Average Unit Price",
            value: snapshot
                .avg_unit_price
                .map_or_else(|| NONE_MARKER.to_string(), format_currency),
            delta: None,
        },
        KpiTile {
            label: "Top Performing Product",
            value: top_name,
            delta: Some(format_currency(top_revenue)),
        },
    ]
}

// ---------------------------------------------------------------------------
// Chart payloads
// ---------------------------------------------------------------------------

/// Either something to draw or the message to show in its place.
#[derive(Debug, Clone, PartialEq)]
pub enum Chart<T> {
    Ready(T),
    Placeholder(&'static str),
}

/// One horizontal bar. `position` is the slot on the category axis.
#[derive(Debug, Clone, PartialEq)]
pub struct BarItem {
    pub position: f64,
    pub label: String,
    pub value: f64,
    pub text: String,
    pub color: Color32,
}

/// Revenue by product as horizontal bars, smallest first so the largest
/// sits at the top of the chart.
pub fn product_bars(snapshot: &AggregateSnapshot) -> Chart<Vec<BarItem>> {
    let series = &snapshot.revenue_by_product;
    if series.is_empty() {
        return Chart::Placeholder(EMPTY_PRODUCT_CHART_MESSAGE);
    }
    let min = series.iter().map(|(_, v)| *v).fold(f64::INFINITY, f64::min);
    let max = series.iter().map(|(_, v)| *v).fold(f64::NEG_INFINITY, f64::max);

    Chart::Ready(
        series
            .iter()
            .enumerate()
            .map(|(i, (product, revenue))| BarItem {
                position: i as f64,
                label: product.clone(),
                value: *revenue,
                text: format_si(*revenue),
                color: blues(*revenue, min, max),
            })
            .collect(),
    )
}

/// One pie slice; angles are radians measured counter-clockwise from +x.
#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: String,
    pub value: f64,
    pub fraction: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    pub text: String,
    pub color: Color32,
}

/// Revenue by region as pie slices, largest first, starting at twelve
/// o'clock and running clockwise. Non-positive shares cannot be drawn.
pub fn region_pie(snapshot: &AggregateSnapshot) -> Chart<Vec<PieSlice>> {
    let shares: Vec<&(String, f64)> = snapshot
        .revenue_by_region
        .iter()
        .filter(|(_, v)| *v > 0.0)
        .collect();
    let total: f64 = shares.iter().map(|(_, v)| *v).sum();
    if shares.is_empty() || total <= 0.0 {
        return Chart::Placeholder(EMPTY_CHART_MESSAGE);
    }

    let colors = ColorMap::new(shares.iter().map(|(region, _)| region.as_str()));
    let mut angle = FRAC_PI_2;
    Chart::Ready(
        shares
            .into_iter()
            .map(|(region, revenue)| {
                let fraction = revenue / total;
                let start_angle = angle;
                angle -= fraction * TAU;
                PieSlice {
                    label: region.clone(),
                    value: *revenue,
                    fraction,
                    start_angle,
                    end_angle: angle,
                    text: format!("{region} {:.1}%", fraction * 100.0),
                    color: colors.color_for(region),
                }
            })
            .collect(),
    )
}

/// Plot x coordinate for a calendar day.
pub fn day_to_x(day: NaiveDate) -> f64 {
    day.num_days_from_ce() as f64
}

/// Inverse of [`day_to_x`], for axis labels.
pub fn x_to_day(x: f64) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
}

/// Daily revenue as `[x, revenue]` points in date order.
pub fn daily_trend(snapshot: &AggregateSnapshot) -> Chart<Vec<[f64; 2]>> {
    if snapshot.revenue_by_day.is_empty() {
        return Chart::Placeholder(EMPTY_CHART_MESSAGE);
    }
    Chart::Ready(
        snapshot
            .revenue_by_day
            .iter()
            .map(|(day, revenue)| [day_to_x(*day), *revenue])
            .collect(),
    )
}

// ---------------------------------------------------------------------------
// Table preview and CSV export
// ---------------------------------------------------------------------------

/// Display strings for every cell, row-major, in column order.
pub fn preview_rows(table: &SalesTable) -> Vec<Vec<String>> {
    table
        .records
        .iter()
        .map(|rec| {
            table
                .columns
                .iter()
                .map(|col| rec.cell(col).to_string())
                .collect()
        })
        .collect()
}

/// Write `table` as UTF-8 CSV: header row, then one line per record.
pub fn write_csv<W: Write>(table: &SalesTable, writer: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(&table.columns)
        .context("writing CSV header")?;
    for row in preview_rows(table) {
        out.write_record(&row).context("writing CSV row")?;
    }
    out.flush().context("flushing CSV output")?;
    Ok(())
}

/// Export `table` to `path`.
pub fn export_csv(table: &SalesTable, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("writing CSV export to {}", path.display()))?;
    write_csv(table, file).with_context(|| format!("writing CSV export to {}", path.display()))?;
    log::info!("Exported {} rows to {}", table.len(), path.display());
    Ok(())
}
