use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::config::Config;
use crate::data::cache::LoadCache;
use crate::data::filter::FilterSelection;
use crate::data::model::{RawTable, SalesTable};
use crate::data::normalize::normalize;
use crate::pipeline::{Dashboard, render};

// ---------------------------------------------------------------------------
// Filter options offered by the controls
// ---------------------------------------------------------------------------

/// Which multi-select a toggle applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterColumn {
    Region,
    Product,
}

/// Values present in the cleaned data, used to populate the controls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOptions {
    pub regions: BTreeSet<String>,
    pub products: BTreeSet<String>,
    pub date_bounds: Option<(NaiveDate, NaiveDate)>,
}

impl FilterOptions {
    pub fn from_table(table: &SalesTable) -> Self {
        FilterOptions {
            regions: table.regions(),
            products: table.products(),
            date_bounds: table.date_bounds(),
        }
    }
}

/// What the central panel shows this frame.
#[derive(Debug, Clone)]
pub enum View {
    /// Load failed; only the message is shown.
    Failed(String),
    Ready(Arc<Dashboard>),
}

/// Inputs a rendered [`View`] depends on.
type RenderKey = (PathBuf, u64, FilterSelection);

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: Config,

    /// Memoized raw load.
    cache: LoadCache,

    /// (path, generation) the filter options were built from.
    loaded: Option<(PathBuf, u64)>,

    /// Choices offered by the filter widgets.
    pub options: FilterOptions,

    /// Current filter selection.
    pub selection: FilterSelection,

    /// Status / error message shown in the top bar.
    pub status_message: Option<String>,

    /// Last view and the inputs it was rendered from.
    rendered: Option<(RenderKey, View)>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            cache: LoadCache::new(),
            loaded: None,
            options: FilterOptions::default(),
            selection: FilterSelection::default(),
            status_message: None,
            rendered: None,
        }
    }

    /// Run the whole pipeline for the current file and selection.
    ///
    /// A fresh load (new path or reload) resets the filters to "everything".
    /// The previous view is reused until one of its inputs changes.
    pub fn run(&mut self) -> View {
        let generation = self.cache.generation();
        if let Some(((path, seen, selection), view)) = &self.rendered {
            if *path == self.config.data_path
                && *seen == generation
                && *selection == self.selection
            {
                return view.clone();
            }
        }

        let view = self.render_view();
        self.rendered = Some((
            (self.config.data_path.clone(), generation, self.selection.clone()),
            view.clone(),
        ));
        view
    }

    fn render_view(&mut self) -> View {
        let raw = match self.cache.get_or_load(&self.config.data_path) {
            Ok(raw) => raw,
            Err(e) => {
                self.loaded = None;
                self.options = FilterOptions::default();
                return View::Failed(e.to_string());
            }
        };

        let key = (self.config.data_path.clone(), self.cache.generation());
        if self.loaded.as_ref() != Some(&key) {
            self.reset_filters(&raw);
            self.loaded = Some(key);
        }

        View::Ready(Arc::new(render(&raw, &self.selection)))
    }

    fn reset_filters(&mut self, raw: &RawTable) {
        let (clean, _) = normalize(raw);
        self.options = FilterOptions::from_table(&clean);
        self.selection = FilterSelection::defaults(&clean);
    }

    /// "Reload Data": drop the cached load so the next run re-reads the file.
    pub fn reload(&mut self) {
        self.cache.reload();
        self.status_message = None;
    }

    /// Point the dashboard at another file.
    pub fn open(&mut self, path: PathBuf) {
        log::info!("Switching data file to {}", path.display());
        self.config.data_path = path;
        self.status_message = None;
    }

    fn selected_mut(&mut self, column: FilterColumn) -> &mut BTreeSet<String> {
        match column {
            FilterColumn::Region => &mut self.selection.regions,
            FilterColumn::Product => &mut self.selection.products,
        }
    }

    /// Toggle a single value in a multi-select.
    pub fn toggle_filter_value(&mut self, column: FilterColumn, value: &str) {
        let selected = self.selected_mut(column);
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
    }

    /// Select every available value.
    pub fn select_all(&mut self, column: FilterColumn) {
        let all = match column {
            FilterColumn::Region => self.options.regions.clone(),
            FilterColumn::Product => self.options.products.clone(),
        };
        *self.selected_mut(column) = all;
    }

    /// Deselect everything (which empties the filtered table).
    pub fn select_none(&mut self, column: FilterColumn) {
        self.selected_mut(column).clear();
    }

    /// Set the inclusive date range, keeping start <= end.
    pub fn set_date_range(&mut self, start: NaiveDate, end: NaiveDate) {
        self.selection.date_range = Some((start.min(end), start.max(end)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
Date,Product,Region,Units,Unit Price
2024-01-01,A,East,2,10
2024-01-02,B,West,1,30
2024-01-03,A,West,4,10
";

    fn state_for(dir: &tempfile::TempDir, body: &str) -> AppState {
        let path = dir.path().join("data.csv");
        std::fs::write(&path, body).unwrap();
        AppState::new(Config { data_path: path })
    }

    fn dashboard(view: View) -> Arc<Dashboard> {
        match view {
            View::Ready(dash) => dash,
            View::Failed(msg) => panic!("unexpected failure: {msg}"),
        }
    }

    #[test]
    fn first_run_selects_everything() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_for(&dir, CSV);
        let dash = dashboard(state.run());
        assert_eq!(dash.filtered.len(), 3);
        assert_eq!(state.options.regions.len(), 2);
        assert_eq!(
            state.selection.date_range,
            Some((
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()
            ))
        );
    }

    #[test]
    fn toggles_narrow_the_next_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_for(&dir, CSV);
        state.run();

        state.toggle_filter_value(FilterColumn::Region, "East");
        assert_eq!(dashboard(state.run()).filtered.len(), 2);

        state.select_none(FilterColumn::Product);
        assert!(dashboard(state.run()).filtered.is_empty());

        state.select_all(FilterColumn::Product);
        state.toggle_filter_value(FilterColumn::Region, "East");
        assert_eq!(dashboard(state.run()).filtered.len(), 3);
    }

    #[test]
    fn unchanged_inputs_reuse_the_previous_view() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_for(&dir, CSV);
        let first = dashboard(state.run());
        let second = dashboard(state.run());
        assert!(Arc::ptr_eq(&first, &second));

        state.toggle_filter_value(FilterColumn::Product, "B");
        let third = dashboard(state.run());
        assert!(!Arc::ptr_eq(&second, &third));
        assert_eq!(third.filtered.len(), 2);
    }

    #[test]
    fn date_range_is_ordered() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_for(&dir, CSV);
        state.run();
        let d2 = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let d3 = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        state.set_date_range(d3, d2);
        assert_eq!(state.selection.date_range, Some((d2, d3)));
        assert_eq!(dashboard(state.run()).filtered.len(), 2);
    }

    #[test]
    fn reload_picks_up_file_changes_and_resets_filters() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_for(&dir, CSV);
        state.run();
        state.select_none(FilterColumn::Region);

        let extra = format!("{CSV}2024-01-04,C,North,1,1\n");
        std::fs::write(&state.config.data_path, extra).unwrap();

        // Cached until the user reloads.
        assert!(dashboard(state.run()).filtered.is_empty());

        state.reload();
        let dash = dashboard(state.run());
        assert_eq!(dash.filtered.len(), 4);
        assert!(state.options.regions.contains("North"));
    }

    #[test]
    fn missing_file_fails_the_whole_view() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = AppState::new(Config {
            data_path: dir.path().join("data.xlsx"),
        });
        match state.run() {
            View::Failed(msg) => assert_eq!(
                msg,
                "Error: data.xlsx not found. Please ensure the file exists in the project folder."
            ),
            View::Ready(_) => panic!("expected a failure"),
        }
    }
}
