use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

// ---------------------------------------------------------------------------
// CellValue – a single cell as read from the source file
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring what spreadsheet decoders hand back.
/// Must be `Ord` so distinct values can live in `BTreeSet`s.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    Null,
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
                DateTime(_) => 5,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            (DateTime(a), DateTime(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::DateTime(d) => write!(f, "{}", d.format(DATETIME_FORMAT)),
            CellValue::Null => Ok(()),
        }
    }
}

impl CellValue {
    /// Numeric view of the cell. Text is trimmed and parsed; anything that
    /// does not yield a finite number is `None`.
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            CellValue::Float(v) => *v,
            CellValue::Integer(i) => *i as f64,
            CellValue::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        v.is_finite().then_some(v)
    }

    /// Text view of the cell. `Null` and blank text are `None`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::String(s) if s.trim().is_empty() => None,
            other => Some(other.to_string()),
        }
    }
}

/// Format used for date-time cells in previews and CSV export.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ---------------------------------------------------------------------------
// RawTable – rows exactly as present in the file
// ---------------------------------------------------------------------------

/// Header names and rows as decoded, before any cleaning.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    /// Every row has exactly `columns.len()` cells.
    pub rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    /// Build a table, padding short rows with `Null` and cutting long ones.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Null);
                row
            })
            .collect();
        RawTable { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

// ---------------------------------------------------------------------------
// SalesRecord – one cleaned row
// ---------------------------------------------------------------------------

/// Canonical column names after normalization.
pub const COL_DATE: &str = "Date";
pub const COL_PRODUCT: &str = "Product";
pub const COL_REGION: &str = "Region";
pub const COL_UNITS: &str = "Units";
pub const COL_UNIT_PRICE: &str = "UnitPrice";
pub const COL_REVENUE: &str = "Revenue";

/// A single sales transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    pub date: NaiveDateTime,
    pub product: String,
    pub region: String,
    pub units: f64,
    pub unit_price: f64,
    /// Always `units * unit_price`; `None` when that product is not finite.
    pub revenue: Option<f64>,
    /// Columns outside the canonical set, keyed by their trimmed header.
    pub extras: BTreeMap<String, CellValue>,
}

impl SalesRecord {
    pub fn new(
        date: NaiveDateTime,
        product: impl Into<String>,
        region: impl Into<String>,
        units: f64,
        unit_price: f64,
    ) -> Self {
        SalesRecord {
            date,
            product: product.into(),
            region: region.into(),
            units,
            unit_price,
            revenue: compute_revenue(Some(units), Some(unit_price)),
            extras: BTreeMap::new(),
        }
    }

    /// Value of `column` for this record, as a cell.
    pub fn cell(&self, column: &str) -> CellValue {
        match column {
            COL_DATE => CellValue::DateTime(self.date),
            COL_PRODUCT => CellValue::String(self.product.clone()),
            COL_REGION => CellValue::String(self.region.clone()),
            COL_UNITS => CellValue::Float(self.units),
            COL_UNIT_PRICE => CellValue::Float(self.unit_price),
            COL_REVENUE => self.revenue.map_or(CellValue::Null, CellValue::Float),
            other => self.extras.get(other).cloned().unwrap_or(CellValue::Null),
        }
    }

    pub fn day(&self) -> NaiveDate {
        self.date.date()
    }
}

/// `Units * UnitPrice`, null when either side is null or the result overflows.
pub fn compute_revenue(units: Option<f64>, unit_price: Option<f64>) -> Option<f64> {
    let revenue = units? * unit_price?;
    revenue.is_finite().then_some(revenue)
}

// ---------------------------------------------------------------------------
// SalesTable – the cleaned, immutable table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesTable {
    /// Column names in display/export order.
    pub columns: Vec<String>,
    pub records: Vec<SalesRecord>,
}

impl SalesTable {
    pub fn new(columns: Vec<String>, records: Vec<SalesRecord>) -> Self {
        SalesTable { columns, records }
    }

    /// Same column set, different rows.
    pub fn with_records(&self, records: Vec<SalesRecord>) -> Self {
        SalesTable {
            columns: self.columns.clone(),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sorted distinct regions.
    pub fn regions(&self) -> BTreeSet<String> {
        self.records.iter().map(|r| r.region.clone()).collect()
    }

    /// Sorted distinct products.
    pub fn products(&self) -> BTreeSet<String> {
        self.records.iter().map(|r| r.product.clone()).collect()
    }

    /// Earliest and latest calendar date, or `None` when there are no rows.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.records.iter().map(SalesRecord::day).min()?;
        let max = self.records.iter().map(SalesRecord::day).max()?;
        Some((min, max))
    }
}
