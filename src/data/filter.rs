use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use super::model::{SalesRecord, SalesTable};

// ---------------------------------------------------------------------------
// Filter predicate: what the user has selected
// ---------------------------------------------------------------------------

/// Region / product selections and an optional inclusive date interval.
///
/// An empty region or product set selects nothing (the filtered table is
/// empty); it does not mean "no filter".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterSelection {
    pub regions: BTreeSet<String>,
    pub products: BTreeSet<String>,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
}

impl FilterSelection {
    /// Everything selected: all regions, all products, the full date span.
    pub fn defaults(table: &SalesTable) -> Self {
        FilterSelection {
            regions: table.regions(),
            products: table.products(),
            date_range: table.date_bounds(),
        }
    }
}

/// Non-fatal conditions the UI should surface next to the filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterWarning {
    /// The table has no parseable dates, so the date filter was skipped.
    NoValidDates,
}

impl FilterWarning {
    pub fn message(&self) -> &'static str {
        match self {
            FilterWarning::NoValidDates => "No valid dates found in the dataset.",
        }
    }
}

/// Result of applying a [`FilterSelection`].
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    /// Filtered rows; every record has a non-null revenue.
    pub table: SalesTable,
    pub warning: Option<FilterWarning>,
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Last instant (second resolution) that still belongs to `end`.
fn end_of_day(end: NaiveDate) -> NaiveDateTime {
    end.and_time(NaiveTime::MIN) + Duration::days(1) - Duration::seconds(1)
}

/// Apply region, product and date filters (ANDed), then drop null revenues.
///
/// A record passes when:
/// * its region is in `selection.regions` (empty set → nothing passes)
/// * its product is in `selection.products` (empty set → nothing passes)
/// * its date lies in `[start 00:00:00, end 23:59:59]`, if a range is given
///   and the table has dates at all
pub fn apply_filters(table: &SalesTable, selection: &FilterSelection) -> FilterOutcome {
    let warning = table
        .date_bounds()
        .is_none()
        .then_some(FilterWarning::NoValidDates);

    if let Some(w) = warning {
        log::warn!("{} Date filter skipped.", w.message());
    }

    let window = match (warning, selection.date_range) {
        (None, Some((start, end))) => Some((start.and_time(NaiveTime::MIN), end_of_day(end))),
        _ => None,
    };

    let records: Vec<SalesRecord> = table
        .records
        .iter()
        .filter(|rec| selection.regions.contains(&rec.region))
        .filter(|rec| selection.products.contains(&rec.product))
        .filter(|rec| match window {
            Some((from, to)) => rec.date >= from && rec.date <= to,
            None => true,
        })
        .filter(|rec| rec.revenue.is_some())
        .cloned()
        .collect();

    log::debug!(
        "Filter kept {} of {} rows ({} regions, {} products, range {:?})",
        records.len(),
        table.len(),
        selection.regions.len(),
        selection.products.len(),
        selection.date_range
    );

    FilterOutcome {
        table: table.with_records(records),
        warning,
    }
}
