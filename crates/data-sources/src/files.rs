//! Uploaded file ingestion: CSV, JSON and Excel workbooks

use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use serde_json::Value;
use shared_types::{Cell, Dataset};
use tracing::{debug, info};

use crate::error::DataSourceError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// File formats accepted for upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Json,
    Excel,
}

impl FileKind {
    /// Detect the format from the file extension, ignoring case
    pub fn from_name(file_name: &str) -> Result<Self, DataSourceError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "xlsx" | "xls" => Ok(Self::Excel),
            _ => Err(DataSourceError::UnsupportedFileType(file_name.to_string())),
        }
    }
}

/// Label under which an uploaded file is kept in the session
pub fn file_label(file_name: &str) -> String {
    format!("File: {}", file_name)
}

/// Parse an uploaded file into a dataset labelled `File: <name>`
pub fn load_file(file_name: &str, bytes: &[u8]) -> Result<Dataset, DataSourceError> {
    let kind = FileKind::from_name(file_name)?;
    let label = file_label(file_name);
    debug!(file = file_name, ?kind, size = bytes.len(), "parsing upload");

    let dataset = match kind {
        FileKind::Csv => parse_csv(&label, file_name, bytes)?,
        FileKind::Json => parse_json(&label, file_name, bytes)?,
        FileKind::Excel => parse_excel(&label, file_name, bytes)?,
    };

    info!(
        file = file_name,
        rows = dataset.row_count(),
        columns = dataset.column_count(),
        "file loaded"
    );
    Ok(dataset)
}

/// Natural type of a CSV field: empty is null, then booleans, then numbers
pub fn parse_field(field: &str) -> Cell {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Cell::Null;
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return Cell::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Cell::Bool(false);
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => Cell::Number(n),
        _ => Cell::Text(field.to_string()),
    }
}

fn parse_csv(label: &str, file_name: &str, bytes: &[u8]) -> Result<Dataset, DataSourceError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let columns = reader
        .headers()
        .map_err(|e| DataSourceError::parse(file_name, e))?
        .iter()
        .enumerate()
        .map(|(i, h)| column_name(h.trim(), i))
        .collect();
    let mut dataset = Dataset::new(label, columns);

    for record in reader.records() {
        let record = record.map_err(|e| DataSourceError::parse(file_name, e))?;
        dataset.push_row(record.iter().map(parse_field).collect());
    }
    Ok(dataset)
}

/// Blank headers get a positional name
fn column_name(header: &str, index: usize) -> String {
    if header.is_empty() {
        format!("Unnamed: {}", index)
    } else {
        header.to_string()
    }
}

fn json_cell(value: &Value) -> Cell {
    match value {
        Value::Null => Cell::Null,
        Value::Bool(b) => Cell::Bool(*b),
        Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Null),
        Value::String(s) => Cell::Text(s.clone()),
        nested => Cell::Text(nested.to_string()),
    }
}

fn push_column(columns: &mut Vec<String>, key: &str) {
    if !columns.iter().any(|c| c == key) {
        columns.push(key.to_string());
    }
}

/// Accepts an array of records, or an object of columns where each column is
/// an array or an index-keyed object
fn parse_json(label: &str, file_name: &str, bytes: &[u8]) -> Result<Dataset, DataSourceError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| DataSourceError::parse(file_name, e))?;

    match value {
        Value::Array(records) => {
            let mut columns = Vec::new();
            for record in &records {
                match record {
                    Value::Object(map) => map.keys().for_each(|k| push_column(&mut columns, k)),
                    _ => {
                        return Err(DataSourceError::parse(
                            file_name,
                            "expected an array of objects",
                        ))
                    }
                }
            }
            let mut dataset = Dataset::new(label, columns.clone());
            for record in &records {
                let row = columns
                    .iter()
                    .map(|c| record.get(c).map(json_cell).unwrap_or(Cell::Null))
                    .collect();
                dataset.push_row(row);
            }
            Ok(dataset)
        }
        Value::Object(map) => {
            let columns: Vec<String> = map.keys().cloned().collect();
            let values: Vec<Vec<&Value>> = map
                .values()
                .map(|column| match column {
                    Value::Array(items) => Ok(items.iter().collect()),
                    Value::Object(by_index) => {
                        let mut entries: Vec<(&String, &Value)> = by_index.iter().collect();
                        entries.sort_by_key(|(k, _)| k.parse::<u64>().unwrap_or(u64::MAX));
                        Ok(entries.into_iter().map(|(_, v)| v).collect())
                    }
                    _ => Err(DataSourceError::parse(
                        file_name,
                        "expected every column to be an array or an object",
                    )),
                })
                .collect::<Result<_, _>>()?;
            let rows = values.iter().map(Vec::len).max().unwrap_or(0);

            let mut dataset = Dataset::new(label, columns);
            for r in 0..rows {
                dataset.push_row(
                    values
                        .iter()
                        .map(|column| column.get(r).map(|v| json_cell(v)).unwrap_or(Cell::Null))
                        .collect(),
                );
            }
            Ok(dataset)
        }
        _ => Err(DataSourceError::parse(
            file_name,
            "expected a JSON array or object",
        )),
    }
}

fn excel_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Null,
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::String(s) => Cell::Text(s.clone()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| Cell::Text(d.format("%Y-%m-%d %H:%M:%S").to_string()))
            .unwrap_or(Cell::Number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => Cell::Text(format!("#{:?}", e)),
    }
}

/// First worksheet, first row as header
fn parse_excel(label: &str, file_name: &str, bytes: &[u8]) -> Result<Dataset, DataSourceError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| DataSourceError::parse(file_name, e))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DataSourceError::parse(file_name, "workbook has no worksheets"))?
        .map_err(|e| DataSourceError::parse(file_name, e))?;

    let mut rows = range.rows();
    let columns = match rows.next() {
        Some(header) => header
            .iter()
            .enumerate()
            .map(|(i, h)| column_name(h.to_string().trim(), i))
            .collect(),
        None => Vec::new(),
    };

    let mut dataset = Dataset::new(label, columns);
    for row in rows {
        dataset.push_row(row.iter().map(excel_cell).collect());
    }
    Ok(dataset)
}
