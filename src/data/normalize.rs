use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::model::{
    COL_DATE, COL_PRODUCT, COL_REGION, COL_REVENUE, COL_UNIT_PRICE, COL_UNITS, CellValue,
    RawTable, SalesRecord, SalesTable,
};

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

/// Trim a header and map it onto its canonical spelling when it is one of the
/// recognized sales columns. Anything else comes back trimmed but unchanged.
pub fn canonical_column(name: &str) -> String {
    let trimmed = name.trim();
    let canonical = match trimmed.to_lowercase().as_str() {
        "date" => COL_DATE,
        "units" => COL_UNITS,
        "unitprice" | "unit price" => COL_UNIT_PRICE,
        "product" => COL_PRODUCT,
        "region" => COL_REGION,
        _ => trimmed,
    };
    canonical.to_string()
}

/// Where each column of the raw table ends up.
#[derive(Debug, Default)]
struct ColumnPlan {
    columns: Vec<String>,
    date: Option<usize>,
    product: Option<usize>,
    region: Option<usize>,
    units: Option<usize>,
    unit_price: Option<usize>,
    extras: Vec<(usize, String)>,
}

impl ColumnPlan {
    fn new(raw_columns: &[String]) -> Self {
        let mut plan = ColumnPlan::default();
        for (idx, raw) in raw_columns.iter().enumerate() {
            let name = canonical_column(raw);
            // First occurrence of a name wins; later duplicates are dropped.
            if plan.columns.contains(&name) {
                continue;
            }
            let slot = match name.as_str() {
                COL_DATE => Some(&mut plan.date),
                COL_PRODUCT => Some(&mut plan.product),
                COL_REGION => Some(&mut plan.region),
                COL_UNITS => Some(&mut plan.units),
                COL_UNIT_PRICE => Some(&mut plan.unit_price),
                // Recomputed below, whatever the file says.
                COL_REVENUE => None,
                _ => {
                    plan.extras.push((idx, name.clone()));
                    None
                }
            };
            if let Some(slot) = slot {
                *slot = Some(idx);
            }
            plan.columns.push(name);
        }
        if !plan.columns.iter().any(|c| c == COL_REVENUE) {
            plan.columns.push(COL_REVENUE.to_string());
        }
        plan
    }
}

// ---------------------------------------------------------------------------
// Value coercion
// ---------------------------------------------------------------------------

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Parse a textual date or date-time. Returns `None` for anything unrecognized.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.naive_local())
}

fn coerce_date(cell: &CellValue) -> Option<NaiveDateTime> {
    match cell {
        CellValue::DateTime(dt) => Some(*dt),
        CellValue::String(s) => parse_datetime(s),
        _ => None,
    }
}

fn cell_at(row: &[CellValue], idx: Option<usize>) -> &CellValue {
    idx.and_then(|i| row.get(i)).unwrap_or(&CellValue::Null)
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Row counts before and after cleaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NormalizeStats {
    pub raw_rows: usize,
    pub kept_rows: usize,
    pub dropped_rows: usize,
}

/// Clean a raw table:
/// * headers are trimmed and the sales columns get their canonical names
/// * `Date` is parsed, `Units` / `UnitPrice` coerced to numbers (failures become null)
/// * `Revenue` is recomputed as `Units * UnitPrice`
/// * rows missing any of Date, Product, Region, Units or UnitPrice are dropped
pub fn normalize(raw: &RawTable) -> (SalesTable, NormalizeStats) {
    let plan = ColumnPlan::new(&raw.columns);

    let records: Vec<SalesRecord> = raw
        .rows
        .iter()
        .filter_map(|row| clean_row(row, &plan))
        .collect();

    let stats = NormalizeStats {
        raw_rows: raw.len(),
        kept_rows: records.len(),
        dropped_rows: raw.len() - records.len(),
    };
    if stats.dropped_rows > 0 {
        log::warn!(
            "Dropped {} of {} rows with a missing or invalid Date/Product/Region/Units/UnitPrice",
            stats.dropped_rows,
            stats.raw_rows
        );
    }
    log::debug!("Normalized table: {stats:?}, columns {:?}", plan.columns);

    (SalesTable::new(plan.columns, records), stats)
}

fn clean_row(row: &[CellValue], plan: &ColumnPlan) -> Option<SalesRecord> {
    let mut record = SalesRecord::new(
        coerce_date(cell_at(row, plan.date))?,
        cell_at(row, plan.product).as_text()?,
        cell_at(row, plan.region).as_text()?,
        cell_at(row, plan.units).as_f64()?,
        cell_at(row, plan.unit_price).as_f64()?,
    );
    record.extras = plan
        .extras
        .iter()
        .map(|(idx, name)| (name.clone(), cell_at(row, Some(*idx)).clone()))
        .collect();
    Some(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> CellValue {
        CellValue::String(v.to_string())
    }

    fn raw(columns: &[&str], rows: Vec<Vec<CellValue>>) -> RawTable {
        RawTable::new(columns.iter().map(|c| c.to_string()).collect(), rows)
    }

    fn at(y: i32, m: u32, d: u32, h: u32, mi: u32, sec: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, sec)
            .unwrap()
    }

    #[test]
    fn header_matching_ignores_case_and_whitespace() {
        assert_eq!(canonical_column(" date "), "Date");
        assert_eq!(canonical_column("DATE"), "Date");
        assert_eq!(canonical_column("Date"), "Date");
        assert_eq!(canonical_column("unit price"), "UnitPrice");
        assert_eq!(canonical_column("UNITPRICE"), "UnitPrice");
        assert_eq!(canonical_column(" Region"), "Region");
        assert_eq!(canonical_column("  Channel "), "Channel");
    }

    #[test]
    fn renames_columns_and_appends_revenue() {
        let table = raw(
            &[" date", "PRODUCT", "region ", "Units", "Unit Price", "Channel"],
            vec![vec![
                s("2024-01-05"),
                s("Widget"),
                s("East"),
                CellValue::Integer(3),
                CellValue::Float(2.5),
                s("Online"),
            ]],
        );
        let (clean, stats) = normalize(&table);
        assert_eq!(
            clean.columns,
            vec!["Date", "Product", "Region", "Units", "UnitPrice", "Channel", "Revenue"]
        );
        assert_eq!(stats.kept_rows, 1);
        let rec = &clean.records[0];
        assert_eq!(rec.date, at(2024, 1, 5, 0, 0, 0));
        assert_eq!(rec.revenue, Some(7.5));
        assert_eq!(rec.extras.get("Channel"), Some(&s("Online")));
    }

    #[test]
    fn revenue_from_the_source_is_ignored() {
        let table = raw(
            &["Revenue", "Date", "Product", "Region", "Units", "UnitPrice"],
            vec![vec![
                CellValue::Float(999.0),
                s("2024-01-05"),
                s("Widget"),
                s("East"),
                CellValue::Integer(4),
                CellValue::Float(2.0),
            ]],
        );
        let (clean, _) = normalize(&table);
        // Existing Revenue keeps its position.
        assert_eq!(clean.columns[0], "Revenue");
        assert_eq!(clean.records[0].revenue, Some(8.0));
        assert_eq!(clean.records[0].cell("Revenue"), CellValue::Float(8.0));
    }

    #[test]
    fn incomplete_rows_are_dropped() {
        let cols = ["Date", "Product", "Region", "Units", "UnitPrice"];
        let table = raw(
            &cols,
            vec![
                vec![s("2024-01-05"), s("A"), s("East"), CellValue::Integer(1), CellValue::Integer(2)],
                vec![s("not a date"), s("A"), s("East"), CellValue::Integer(1), CellValue::Integer(2)],
                vec![s("2024-01-05"), CellValue::Null, s("East"), CellValue::Integer(1), CellValue::Integer(2)],
                vec![s("2024-01-05"), s("A"), s("  "), CellValue::Integer(1), CellValue::Integer(2)],
                vec![s("2024-01-05"), s("A"), s("East"), s("many"), CellValue::Integer(2)],
                vec![s("2024-01-05"), s("A"), s("East"), CellValue::Integer(1), CellValue::Null],
                vec![s("2024-01-06"), s("B"), s("West"), s(" 2 "), s("3.5")],
            ],
        );
        let (clean, stats) = normalize(&table);
        assert_eq!(
            stats,
            NormalizeStats {
                raw_rows: 7,
                kept_rows: 2,
                dropped_rows: 5
            }
        );
        assert_eq!(clean.records[1].product, "B");
        assert_eq!(clean.records[1].revenue, Some(7.0));
    }

    #[test]
    fn missing_region_column_drops_every_row() {
        let table = raw(
            &["Date", "Product", "Units", "UnitPrice"],
            vec![
                vec![s("2024-01-05"), s("A"), CellValue::Integer(1), CellValue::Integer(2)],
                vec![s("2024-01-06"), s("B"), CellValue::Integer(3), CellValue::Integer(4)],
            ],
        );
        let (clean, stats) = normalize(&table);
        assert!(clean.is_empty());
        assert_eq!(stats.dropped_rows, 2);
        assert!(clean.columns.contains(&"Revenue".to_string()));
    }

    #[test]
    fn revenue_always_equals_units_times_price() {
        let table = raw(
            &["Date", "Product", "Region", "Units", "UnitPrice"],
            (1..=20)
                .map(|i| {
                    vec![
                        CellValue::DateTime(at(2024, 1, i, 0, 0, 0)),
                        s("A"),
                        s("East"),
                        CellValue::Float(i as f64 * 0.7),
                        CellValue::Float(1.0 / i as f64 + 3.3),
                    ]
                })
                .collect(),
        );
        let (clean, _) = normalize(&table);
        assert_eq!(clean.len(), 20);
        for rec in &clean.records {
            assert_eq!(rec.revenue, Some(rec.units * rec.unit_price));
        }
    }

    #[test]
    fn duplicate_canonical_headers_keep_the_first() {
        let table = raw(
            &["Date", "date", "Product", "Region", "Units", "UnitPrice"],
            vec![vec![
                s("2024-01-05"),
                s("garbage"),
                s("A"),
                s("East"),
                CellValue::Integer(1),
                CellValue::Integer(1),
            ]],
        );
        let (clean, _) = normalize(&table);
        assert_eq!(
            clean.columns,
            vec!["Date", "Product", "Region", "Units", "UnitPrice", "Revenue"]
        );
        assert_eq!(clean.len(), 1);
    }

    #[test]
    fn parses_common_date_layouts() {
        assert_eq!(parse_datetime("2024-02-03"), Some(at(2024, 2, 3, 0, 0, 0)));
        assert_eq!(
            parse_datetime("2024-02-03 13:14:15"),
            Some(at(2024, 2, 3, 13, 14, 15))
        );
        assert_eq!(
            parse_datetime("2024-02-03T13:14:15"),
            Some(at(2024, 2, 3, 13, 14, 15))
        );
        assert_eq!(parse_datetime("02/03/2024"), Some(at(2024, 2, 3, 0, 0, 0)));
        assert_eq!(parse_datetime("2024/02/03"), Some(at(2024, 2, 3, 0, 0, 0)));
        assert_eq!(
            parse_datetime("2024-02-03T13:14:15+02:00"),
            Some(at(2024, 2, 3, 13, 14, 15))
        );
        assert_eq!(parse_datetime("yesterday"), None);
        assert_eq!(parse_datetime(""), None);
    }

    #[test]
    fn numeric_dates_are_not_guessed() {
        let table = raw(
            &["Date", "Product", "Region", "Units", "UnitPrice"],
            vec![vec![
                CellValue::Integer(45296),
                s("A"),
                s("East"),
                CellValue::Integer(1),
                CellValue::Integer(1),
            ]],
        );
        assert!(normalize(&table).0.is_empty());
    }
}
