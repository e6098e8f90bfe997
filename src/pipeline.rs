use crate::data::aggregate::aggregate;
use crate::data::filter::{FilterSelection, FilterWarning, apply_filters};
use crate::data::model::{RawTable, SalesTable};
use crate::data::normalize::{NormalizeStats, normalize};
use crate::present::{
    BarItem, Chart, KpiTile, PieSlice, daily_trend, kpi_tiles, preview_rows, product_bars,
    region_pie,
};

/// Output of one pipeline run.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub stats: NormalizeStats,
    /// Filtered, revenue-complete rows with the cleaned column set.
    pub filtered: SalesTable,
    pub warning: Option<FilterWarning>,
    /// Display strings of `filtered`, row-major.
    pub preview: Vec<Vec<String>>,
    pub kpis: Vec<KpiTile>,
    pub product_chart: Chart<Vec<BarItem>>,
    pub region_chart: Chart<Vec<PieSlice>>,
    pub trend_chart: Chart<Vec<[f64; 2]>>,
}

impl Dashboard {
    /// Number of columns in the cleaned table.
    pub fn column_count(&self) -> usize {
        self.filtered.columns.len()
    }
}

/// Normalize → filter → aggregate → shape for display.
pub fn render(raw: &RawTable, selection: &FilterSelection) -> Dashboard {
    let (clean, stats) = normalize(raw);
    let outcome = apply_filters(&clean, selection);
    let snapshot = aggregate(&outcome.table);

    if log::log_enabled!(log::Level::Trace) {
        if let Ok(json) = serde_json::to_string(&snapshot) {
            log::trace!("Snapshot: {json}");
        }
    }

    Dashboard {
        stats,
        kpis: kpi_tiles(&snapshot),
        product_chart: product_bars(&snapshot),
        region_chart: region_pie(&snapshot),
        trend_chart: daily_trend(&snapshot),
        preview: preview_rows(&outcome.table),
        filtered: outcome.table,
        warning: outcome.warning,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::data::model::CellValue;
    use crate::present::EMPTY_CHART_MESSAGE;

    fn s(v: &str) -> CellValue {
        CellValue::String(v.to_string())
    }

    fn raw() -> RawTable {
        RawTable::new(
            ["Date ", "product", "REGION", "Units", "Unit Price", "Revenue"]
                .map(String::from)
                .to_vec(),
            vec![
                vec![s("2024-01-01"), s("A"), s("East"), CellValue::Integer(2), CellValue::Float(50.0), CellValue::Integer(1)],
                vec![s("2024-01-02"), s("B"), s("West"), CellValue::Integer(5), CellValue::Float(50.0), CellValue::Null],
                vec![s("2024-01-02"), s("A"), s("East"), CellValue::Integer(1), CellValue::Float(50.0), CellValue::Null],
                vec![s("bad"), s("A"), s("East"), CellValue::Integer(1), CellValue::Float(50.0), CellValue::Null],
            ],
        )
    }

    fn defaults(raw: &RawTable) -> FilterSelection {
        FilterSelection::defaults(&normalize(raw).0)
    }

    #[test]
    fn full_run_with_default_selection() {
        let raw = raw();
        let dash = render(&raw, &defaults(&raw));

        assert_eq!(dash.stats.dropped_rows, 1);
        assert_eq!(dash.filtered.len(), 3);
        assert_eq!(dash.column_count(), 6);
        assert_eq!(dash.preview.len(), 3);
        assert_eq!(dash.preview[0][0], "2024-01-01 00:00:00");
        assert_eq!(dash.preview[0][5], "100");
        assert_eq!(dash.kpis[0].value, "$400");
        assert_eq!(dash.kpis[3].value, "B");
        assert!(matches!(dash.product_chart, Chart::Ready(ref bars) if bars.len() == 2));
        assert!(matches!(dash.trend_chart, Chart::Ready(ref pts) if pts.len() == 2));
        assert_eq!(dash.warning, None);
    }

    #[test]
    fn empty_region_selection_renders_placeholders() {
        let raw = raw();
        let mut selection = defaults(&raw);
        selection.regions = BTreeSet::new();
        let dash = render(&raw, &selection);

        assert!(dash.filtered.is_empty());
        assert_eq!(dash.kpis[0].value, "$0");
        assert_eq!(dash.region_chart, Chart::Placeholder(EMPTY_CHART_MESSAGE));
        assert_eq!(dash.trend_chart, Chart::Placeholder(EMPTY_CHART_MESSAGE));
    }

    #[test]
    fn raw_without_dates_warns() {
        let raw = RawTable::new(
            ["Product", "Region", "Units", "UnitPrice"].map(String::from).to_vec(),
            vec![vec![s("A"), s("East"), CellValue::Integer(1), CellValue::Integer(1)]],
        );
        let dash = render(&raw, &defaults(&raw));
        assert_eq!(dash.warning, Some(FilterWarning::NoValidDates));
        assert!(dash.filtered.is_empty());
    }
}
