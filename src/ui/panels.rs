use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::data::filter::FilterWarning;
use crate::state::{AppState, FilterColumn, View};

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar. Returns `true` when the state changed.
pub fn top_bar(ui: &mut Ui, state: &mut AppState, view: &View) -> bool {
    let mut changed = false;

    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                changed |= open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if ui.button("Reload Data").clicked() {
            state.reload();
            changed = true;
        }

        ui.separator();

        ui.label(state.config.data_path.display().to_string());
        if let View::Ready(dash) = view {
            ui.label(format!(
                "{} of {} rows valid, {} visible",
                dash.stats.kept_rows,
                dash.stats.raw_rows,
                dash.filtered.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });

    ui.add_space(4.0);
    ui.heading("Sales Performance Dashboard");
    ui.label(RichText::new("Executive Revenue Overview | Interactive Reporting").weak());
    ui.add_space(4.0);

    changed
}

/// Render the footer hint.
pub fn footer(ui: &mut Ui, state: &AppState) {
    let file = state
        .config
        .data_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    ui.vertical_centered(|ui: &mut Ui| {
        ui.label(RichText::new(format!("Update {file} and click Reload Data to refresh")).weak());
    });
}

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel. Returns `true` when the selection changed.
pub fn side_panel(ui: &mut Ui, state: &mut AppState, view: &View) -> bool {
    ui.heading("Filters");
    ui.separator();

    if matches!(view, View::Failed(_)) {
        ui.label("No dataset loaded.");
        return false;
    }

    let mut changed = false;
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            changed |= multi_select(ui, state, FilterColumn::Region, "Region");
            changed |= multi_select(ui, state, FilterColumn::Product, "Product");
            ui.separator();
            changed |= date_range(ui, state, date_warning(view));
        });
    changed
}

/// Collapsible checkbox list with All / None shortcuts.
fn multi_select(ui: &mut Ui, state: &mut AppState, column: FilterColumn, title: &str) -> bool {
    let (all_values, selected) = match column {
        FilterColumn::Region => (&state.options.regions, &state.selection.regions),
        FilterColumn::Product => (&state.options.products, &state.selection.products),
    };
    let header_text = format!("{title}  ({}/{})", selected.len(), all_values.len());
    let all_values = all_values.clone();
    let selected = selected.clone();

    let mut changed = false;
    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(title)
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    state.select_all(column);
                    changed = true;
                }
                if ui.small_button("None").clicked() {
                    state.select_none(column);
                    changed = true;
                }
            });

            for val in &all_values {
                let mut checked = selected.contains(val);
                if ui.checkbox(&mut checked, val.as_str()).changed() {
                    state.toggle_filter_value(column, val);
                    changed = true;
                }
            }
        });
    changed
}

/// Warning raised by the filter engine for the current view, if any.
fn date_warning(view: &View) -> Option<FilterWarning> {
    match view {
        View::Ready(dash) => dash.warning,
        View::Failed(_) => None,
    }
}

/// Two date pickers bounded by the data, or the filter engine's warning.
fn date_range(ui: &mut Ui, state: &mut AppState, warning: Option<FilterWarning>) -> bool {
    ui.strong("Date Range");

    if let Some(warning) = warning {
        ui.label(RichText::new(warning.message()).color(Color32::YELLOW));
        return false;
    }
    let Some((mut start, mut end)) = state.selection.date_range else {
        return false;
    };

    let mut changed = false;
    ui.horizontal(|ui: &mut Ui| {
        ui.label("From");
        changed |= ui
            .add(DatePickerButton::new(&mut start).id_salt("date_start"))
            .changed();
    });
    ui.horizontal(|ui: &mut Ui| {
        ui.label("To");
        changed |= ui
            .add(DatePickerButton::new(&mut end).id_salt("date_end"))
            .changed();
    });
    if let Some((min, max)) = state.options.date_bounds {
        if ui.small_button("Full range").clicked() {
            start = min;
            end = max;
            changed = true;
        }
    }

    if changed {
        state.set_date_range(start, end);
    }
    changed
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

/// Ask for a data file; returns `true` when one was picked.
pub fn open_file_dialog(state: &mut AppState) -> bool {
    let file = rfd::FileDialog::new()
        .set_title("Open sales data")
        .add_filter("Supported files", &["xlsx", "xlsm", "xlsb", "xls", "ods", "csv", "json", "parquet", "pq"])
        .add_filter("Spreadsheets", &["xlsx", "xlsm", "xlsb", "xls", "ods"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    match file {
        Some(path) => {
            state.open(path);
            true
        }
        None => false,
    }
}
