use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{
    DataType, Date32Type, Date64Type, Float32Type, Float64Type, Int32Type, Int64Type, TimeUnit,
    TimestampMicrosecondType, TimestampMillisecondType, TimestampNanosecondType,
    TimestampSecondType,
};
use calamine::{Data, Reader, open_workbook_auto};
use chrono::NaiveDateTime;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, RawTable};
use super::normalize::parse_datetime;

// ---------------------------------------------------------------------------
// Errors surfaced to the user
// ---------------------------------------------------------------------------

/// Fatal load failures. Either one stops the pipeline for this run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error(
        "Error: {} not found. Please ensure the file exists in the project folder.",
        file_label(.0)
    )]
    FileMissing(PathBuf),
    #[error("Error loading file: {0}")]
    Parse(String),
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a raw table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` `.xlsm` `.xlsb` `.xls` `.ods` – first sheet, first row as headers
/// * `.csv`     – header row + records
/// * `.json`    – `[{ "Date": ..., "Product": ..., ... }, ...]`
/// * `.parquet` – flat scalar columns
pub fn load_file(path: &Path) -> Result<RawTable, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileMissing(path.to_path_buf()));
    }
    load_by_extension(path).map_err(|e| LoadError::Parse(format!("{e:#}")))
}

fn load_by_extension(path: &Path) -> Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => load_workbook(path),
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

/// Header label for an empty header cell, matching what DataFrame readers emit.
fn unnamed(idx: usize) -> String {
    format!("Unnamed: {idx}")
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

fn load_workbook(path: &Path) -> Result<RawTable> {
    let mut workbook = open_workbook_auto(path).context("opening workbook")?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .context("workbook contains no sheets")?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("reading sheet '{sheet_name}'"))?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(RawTable::default());
    };

    let columns: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(i, cell)| match cell {
            Data::Empty => unnamed(i),
            Data::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();

    let body = rows
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect();

    Ok(RawTable::new(columns, body))
}

fn cell_from_data(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Null,
        Data::String(s) => CellValue::String(s.clone()),
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map_or(CellValue::Null, CellValue::DateTime),
        Data::DateTimeIso(s) => {
            parse_datetime(s).map_or_else(|| CellValue::String(s.clone()), CellValue::DateTime)
        }
        Data::DurationIso(s) => CellValue::String(s.clone()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one record per line.
/// Every field is type-guessed; dates stay text until normalization.
fn load_csv(path: &Path) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .context("opening CSV")?;
    let columns: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .enumerate()
        .map(|(i, h)| if h.is_empty() { unnamed(i) } else { h.to_string() })
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        rows.push(record.iter().map(guess_cell_type).collect());
    }

    Ok(RawTable::new(columns, rows))
}

/// Type a CSV field. Numbers are only recognized when they print back to the
/// exact same text, so labels such as `007` or `Infinity` stay strings.
fn guess_cell_type(s: &str) -> CellValue {
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        if i.to_string() == s {
            return CellValue::Integer(i);
        }
    }
    if let Ok(f) = s.parse::<f64>() {
        if f.is_finite() && f.to_string() == s {
            return CellValue::Float(f);
        }
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Date": "2024-01-05", "Product": "Widget", "Region": "East", "Units": 3, "UnitPrice": 9.5 },
///   ...
/// ]
/// ```
///
/// Columns appear in first-seen key order; keys missing from a record are null.
fn load_json(path: &Path) -> Result<RawTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(JsonValue::as_object)
        .map(|obj| {
            columns
                .iter()
                .map(|col| obj.get(col).map_or(CellValue::Null, json_to_cell))
                .collect()
        })
        .collect();

    Ok(RawTable::new(columns, rows))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one scalar column per field.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            rows.push(
                batch
                    .columns()
                    .iter()
                    .map(|col| extract_cell(col, row))
                    .collect(),
            );
        }
    }

    Ok(RawTable::new(columns, rows))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => CellValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => CellValue::Float(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        DataType::Date32 => temporal(col.as_primitive::<Date32Type>().value_as_datetime(row)),
        DataType::Date64 => temporal(col.as_primitive::<Date64Type>().value_as_datetime(row)),
        DataType::Timestamp(unit, _) => temporal(match unit {
            TimeUnit::Second => col
                .as_primitive::<TimestampSecondType>()
                .value_as_datetime(row),
            TimeUnit::Millisecond => col
                .as_primitive::<TimestampMillisecondType>()
                .value_as_datetime(row),
            TimeUnit::Microsecond => col
                .as_primitive::<TimestampMicrosecondType>()
                .value_as_datetime(row),
            TimeUnit::Nanosecond => col
                .as_primitive::<TimestampNanosecondType>()
                .value_as_datetime(row),
        }),
        other => CellValue::String(format!("{other:?}")),
    }
}

fn temporal(value: Option<NaiveDateTime>) -> CellValue {
    value.map_or(CellValue::Null, CellValue::DateTime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

    fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn missing_file_is_reported_as_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.xlsx");
        let err = load_file(&path).unwrap_err();
        assert_eq!(err, LoadError::FileMissing(path));
        assert_eq!(
            err.to_string(),
            "Error: data.xlsx not found. Please ensure the file exists in the project folder."
        );
    }

    #[test]
    fn corrupt_workbook_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.xlsx");
        std::fs::write(&path, b"definitely not a zip archive").unwrap();
        let err = load_file(&path).unwrap_err();
        assert!(matches!(err, LoadError::Parse(_)));
        assert!(err.to_string().starts_with("Error loading file: opening workbook"));
    }

    #[test]
    fn unsupported_extension_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.txt");
        std::fs::write(&path, "hello").unwrap();
        let err = load_file(&path).unwrap_err();
        assert_eq!(
            err,
            LoadError::Parse("Unsupported file extension: .txt".to_string())
        );
    }

    #[test]
    fn loads_first_sheet_of_xlsx() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.xlsx");

        let mut workbook = Workbook::new();
        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, " Date ").unwrap();
        sheet.write_string(0, 1, "Product").unwrap();
        sheet.write_string(0, 2, "Units").unwrap();
        let date = ExcelDateTime::from_ymd(2024, 1, 5).unwrap();
        sheet
            .write_datetime_with_format(1, 0, &date, &date_format)
            .unwrap();
        sheet.write_string(1, 1, "Widget").unwrap();
        sheet.write_number(1, 2, 3.0).unwrap();
        sheet.write_string(2, 1, "Gadget").unwrap();
        workbook.save(&path).unwrap();

        let table = load_file(&path).unwrap();
        assert_eq!(table.columns, vec![" Date ", "Product", "Units"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0][0], CellValue::DateTime(day(2024, 1, 5)));
        assert_eq!(table.rows[0][1], CellValue::String("Widget".into()));
        assert_eq!(table.rows[0][2].as_f64(), Some(3.0));
        assert_eq!(table.rows[1][0], CellValue::Null);
        assert_eq!(table.rows[1][2], CellValue::Null);
    }

    #[test]
    fn loads_csv_with_type_guessing_and_short_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.csv");
        std::fs::write(
            &path,
            "Date,Product,Units,,Flag\n2024-01-05,Widget,3,x,true\n2024-01-06,Gadget,2.5\n",
        )
        .unwrap();

        let table = load_file(&path).unwrap();
        assert_eq!(table.columns, vec!["Date", "Product", "Units", "Unnamed: 3", "Flag"]);
        assert_eq!(
            table.rows[0],
            vec![
                CellValue::String("2024-01-05".into()),
                CellValue::String("Widget".into()),
                CellValue::Integer(3),
                CellValue::String("x".into()),
                CellValue::Bool(true),
            ]
        );
        assert_eq!(table.rows[1][2], CellValue::Float(2.5));
        assert_eq!(table.rows[1][4], CellValue::Null);
    }

    #[test]
    fn csv_numbers_must_print_back_to_the_same_text() {
        assert_eq!(guess_cell_type("42"), CellValue::Integer(42));
        assert_eq!(guess_cell_type("-3"), CellValue::Integer(-3));
        assert_eq!(guess_cell_type("2.5"), CellValue::Float(2.5));
        for text in ["007", "+5", "2.50", "1e3", "Infinity", "NaN", "inf"] {
            assert_eq!(guess_cell_type(text), CellValue::String(text.to_string()), "{text}");
        }
        // Still usable as numbers downstream.
        assert_eq!(guess_cell_type("2.50").as_f64(), Some(2.5));
        assert_eq!(guess_cell_type("007").as_f64(), Some(7.0));
    }

    #[test]
    fn loads_json_records_in_first_seen_key_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.json");
        std::fs::write(
            &path,
            r#"[{"Region": "East", "Units": 2}, {"Units": 1.5, "Product": "A"}]"#,
        )
        .unwrap();

        let table = load_file(&path).unwrap();
        assert_eq!(table.columns, vec!["Region", "Units", "Product"]);
        assert_eq!(table.rows[0][2], CellValue::Null);
        assert_eq!(table.rows[1][1], CellValue::Float(1.5));
    }

    #[test]
    fn json_that_is_not_an_array_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.json");
        std::fs::write(&path, r#"{"Region": "East"}"#).unwrap();
        let err = load_file(&path).unwrap_err();
        assert_eq!(
            err,
            LoadError::Parse("Expected top-level JSON array".to_string())
        );
    }

    #[test]
    fn loads_parquet_scalar_columns() {
        use std::sync::Arc;

        use arrow::array::{Date32Array, Float64Array, StringArray};
        use arrow::datatypes::{Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new("Date", DataType::Date32, true),
            Field::new("Product", DataType::Utf8, true),
            Field::new("Units", DataType::Float64, true),
        ]));
        // 19727 days after the epoch is 2024-01-05.
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Date32Array::from(vec![Some(19727), None])),
                Arc::new(StringArray::from(vec![Some("Widget"), Some("Gadget")])),
                Arc::new(Float64Array::from(vec![Some(3.0), None])),
            ],
        )
        .unwrap();
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_file(&path).unwrap();
        assert_eq!(table.columns, vec!["Date", "Product", "Units"]);
        assert_eq!(table.rows[0][0], CellValue::DateTime(day(2024, 1, 5)));
        assert_eq!(table.rows[0][2], CellValue::Float(3.0));
        assert_eq!(table.rows[1][0], CellValue::Null);
        assert_eq!(table.rows[1][2], CellValue::Null);
    }
}
