use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::pipeline::Dashboard;
use crate::present::{EXPORT_FILE_NAME, KpiTile, export_csv};
use crate::state::{AppState, View};
use crate::ui::charts;

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render the central panel: either the load error or the full dashboard.
pub fn central_panel(ui: &mut Ui, state: &mut AppState, view: &View) {
    let dash = match view {
        View::Ready(dash) => dash,
        View::Failed(msg) => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.label(RichText::new(msg).color(Color32::RED).size(16.0));
            });
            return;
        }
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Executive KPIs");
            kpi_row(ui, &dash.kpis);
            ui.add_space(12.0);

            ui.heading("Revenue by Product");
            charts::product_chart(ui, &dash.product_chart);
            ui.add_space(12.0);

            ui.heading("Revenue by Region");
            charts::region_chart(ui, &dash.region_chart);
            ui.add_space(12.0);

            ui.heading("Daily Revenue Trend");
            charts::trend_chart(ui, &dash.trend_chart);
            ui.add_space(12.0);

            ui.heading("Data Preview");
            data_preview(ui, state, dash);
        });
}

// ---------------------------------------------------------------------------
// KPI tiles
// ---------------------------------------------------------------------------

fn tile(ui: &mut Ui, label: &str, value: &str, delta: Option<&str>) {
    egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
        ui.set_min_width(ui.available_width());
        ui.label(RichText::new(label).weak());
        ui.label(RichText::new(value).size(26.0).strong());
        if let Some(delta) = delta {
            ui.label(RichText::new(delta).color(Color32::from_rgb(22, 163, 74)));
        }
    });
}

fn kpi_row(ui: &mut Ui, tiles: &[KpiTile]) {
    ui.columns(tiles.len().max(1), |cols: &mut [Ui]| {
        for (col, t) in cols.iter_mut().zip(tiles) {
            tile(col, t.label, &t.value, t.delta.as_deref());
        }
    });
}

// ---------------------------------------------------------------------------
// Data preview + CSV export
// ---------------------------------------------------------------------------

const PREVIEW_HEIGHT: f32 = 260.0;

fn data_preview(ui: &mut Ui, state: &mut AppState, dash: &Dashboard) {
    ui.columns(3, |cols: &mut [Ui]| {
        tile(&mut cols[0], "Rows (filtered)", &dash.filtered.len().to_string(), None);
        tile(&mut cols[1], "Columns", &dash.column_count().to_string(), None);
        cols[2].vertical_centered_justified(|ui: &mut Ui| {
            if ui.button("Download filtered data (CSV)").clicked() {
                save_export_dialog(state, dash);
            }
        });
    });
    ui.add_space(6.0);

    let columns = &dash.filtered.columns;
    let rows = &dash.preview;

    ui.push_id("data_preview", |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .max_scroll_height(PREVIEW_HEIGHT)
            .columns(Column::auto().at_least(80.0), columns.len())
            .header(20.0, |mut header| {
                for name in columns {
                    header.col(|ui: &mut Ui| {
                        ui.strong(name);
                    });
                }
            })
            .body(|body| {
                body.rows(18.0, rows.len(), |mut row| {
                    let cells = &rows[row.index()];
                    for cell in cells {
                        row.col(|ui: &mut Ui| {
                            ui.label(cell);
                        });
                    }
                });
            });
    });
}

fn save_export_dialog(state: &mut AppState, dash: &Dashboard) {
    let Some(path) = rfd::FileDialog::new()
        .set_title("Download filtered data")
        .set_file_name(EXPORT_FILE_NAME)
        .add_filter("CSV", &["csv"])
        .save_file()
    else {
        return;
    };

    match export_csv(&dash.filtered, &path) {
        Ok(()) => {
            state.status_message = None;
        }
        Err(e) => {
            log::error!("Failed to export CSV: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
