use std::f64::consts::FRAC_PI_4;

use eframe::egui::{Align2, Color32, RichText, Stroke, Ui};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoint, PlotPoints, Points, Polygon, Text};

use crate::present::{BarItem, Chart, PieSlice, format_currency, x_to_day};

const CHART_HEIGHT: f32 = 280.0;
const MIN_LABELED_FRACTION: f64 = 0.03;

/// Informational message drawn in place of a chart.
fn placeholder(ui: &mut Ui, message: &str) {
    ui.label(RichText::new(message).color(Color32::LIGHT_BLUE));
}

// ---------------------------------------------------------------------------
// Revenue by product – horizontal bars
// ---------------------------------------------------------------------------

pub fn product_chart(ui: &mut Ui, chart: &Chart<Vec<BarItem>>) {
    let items = match chart {
        Chart::Ready(items) => items,
        Chart::Placeholder(msg) => return placeholder(ui, msg),
    };

    let labels: Vec<String> = items.iter().map(|b| b.label.clone()).collect();

    Plot::new("revenue_by_product")
        .height(CHART_HEIGHT)
        .x_axis_label("Revenue")
        .y_axis_formatter(move |mark, _range| {
            let slot = mark.value.round();
            if (mark.value - slot).abs() > 1e-6 || slot < 0.0 {
                return String::new();
            }
            labels.get(slot as usize).cloned().unwrap_or_default()
        })
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            let bars: Vec<Bar> = items
                .iter()
                .map(|b| {
                    Bar::new(b.position, b.value)
                        .name(&b.label)
                        .fill(b.color)
                        .width(0.7)
                })
                .collect();
            plot_ui.bar_chart(BarChart::new(bars).horizontal());

            for b in items {
                plot_ui.text(
                    Text::new(PlotPoint::new(b.value, b.position), format!("  {}", b.text))
                        .anchor(Align2::LEFT_CENTER),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Revenue by region – pie
// ---------------------------------------------------------------------------

/// Outline of a wedge between two angles, split into pieces no wider than
/// 45° so each polygon stays convex.
fn wedges(start: f64, end: f64) -> Vec<Vec<[f64; 2]>> {
    let sweep = start - end;
    let pieces = (sweep / FRAC_PI_4).ceil().max(1.0) as usize;
    let step = sweep / pieces as f64;
    (0..pieces)
        .map(|p| {
            let from = start - step * p as f64;
            let mut outline = vec![[0.0, 0.0]];
            for i in 0..=8 {
                let a = from - step * i as f64 / 8.0;
                outline.push([a.cos(), a.sin()]);
            }
            outline
        })
        .collect()
}

pub fn region_chart(ui: &mut Ui, chart: &Chart<Vec<PieSlice>>) {
    let slices = match chart {
        Chart::Ready(slices) => slices,
        Chart::Placeholder(msg) => return placeholder(ui, msg),
    };

    Plot::new("revenue_by_region")
        .height(CHART_HEIGHT)
        .data_aspect(1.0)
        .show_axes(false)
        .show_grid(false)
        .show_x(false)
        .show_y(false)
        .legend(Legend::default())
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .show(ui, |plot_ui| {
            for slice in slices {
                for outline in wedges(slice.start_angle, slice.end_angle) {
                    plot_ui.polygon(
                        Polygon::new(PlotPoints::from(outline))
                            .name(format!("{} ({})", slice.label, format_currency(slice.value)))
                            .fill_color(slice.color)
                            .stroke(Stroke::new(1.0, slice.color)),
                    );
                }
            }
            // Slivers are left unlabeled; the legend still lists them.
            for slice in slices.iter().filter(|s| s.fraction >= MIN_LABELED_FRACTION) {
                let mid = (slice.start_angle + slice.end_angle) / 2.0;
                plot_ui.text(
                    Text::new(
                        PlotPoint::new(0.6 * mid.cos(), 0.6 * mid.sin()),
                        RichText::new(&slice.text).color(Color32::WHITE).strong(),
                    )
                    .anchor(Align2::CENTER_CENTER),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Daily revenue trend – line with markers
// ---------------------------------------------------------------------------

pub fn trend_chart(ui: &mut Ui, chart: &Chart<Vec<[f64; 2]>>) {
    let points = match chart {
        Chart::Ready(points) => points,
        Chart::Placeholder(msg) => return placeholder(ui, msg),
    };

    let day_label = |x: f64| x_to_day(x).map(|d| d.to_string()).unwrap_or_default();

    Plot::new("daily_revenue")
        .height(CHART_HEIGHT)
        .x_axis_label("Date")
        .y_axis_label("Revenue")
        .x_axis_formatter(move |mark, _range| {
            if (mark.value - mark.value.round()).abs() > 1e-6 {
                String::new()
            } else {
                day_label(mark.value)
            }
        })
        .label_formatter(move |_name, value| {
            format!("{}\n{}", day_label(value.x), format_currency(value.y))
        })
        .show(ui, |plot_ui| {
            let color = Color32::from_rgb(31, 119, 180);
            plot_ui.line(
                Line::new(PlotPoints::from(points.clone()))
                    .name("Revenue")
                    .color(color)
                    .width(3.0),
            );
            plot_ui.points(
                Points::new(PlotPoints::from(points.clone()))
                    .color(color)
                    .radius(4.0),
            );
        });
}
