use csv::ReaderBuilder;
use std::io::Cursor;
use tracing::{debug, error, info, warn};
use crate::domain::{
    error::TransferError,
    models::{Column, ColumnKind, Dataset},
};

/// Name CARTO gives the geometry column in its CSV exports (hex-encoded EWKB).
pub const GEOMETRY_COLUMN: &str = "the_geom";

/// Rows sampled for column type inference.
const TYPE_SAMPLE_ROWS: usize = 10;

pub fn parse_csv(bytes: &[u8], table: &str) -> Result<Dataset, TransferError> {
    debug!("Creating CSV reader with headers enabled");
    let cursor = Cursor::new(bytes);
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(cursor);

    let headers = reader.headers()
        .map_err(|e| {
            error!("Failed to read CSV headers for {}: {}", table, e);
            TransferError::Parse(e.to_string())
        })?.clone();

    if headers.is_empty() {
        return Err(TransferError::Parse(format!("Dataset {} has no columns", table)));
    }

    debug!("CSV headers: {:?}", headers);
    info!("Found {} columns in dataset {}", headers.len(), table);

    let mut rows: Vec<Vec<Option<String>>> = Vec::new();
    let mut row_count = 0;

    for record in reader.records() {
        let record = record.map_err(|e| {
            error!("Failed to read CSV record at row {}: {}", row_count + 1, e);
            TransferError::Parse(e.to_string())
        })?;

        row_count += 1;
        let row: Vec<Option<String>> = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    None
                } else {
                    Some(field.to_string())
                }
            })
            .collect();

        rows.push(row);

        if row_count % 1000 == 0 {
            debug!("Processed {} CSV rows", row_count);
        }
    }

    let columns = infer_columns(&headers, &rows);
    if rows.is_empty() {
        warn!("Dataset {} is empty, column types default to text", table);
    }

    info!("Parsed {} rows from dataset {}", row_count, table);
    Ok(Dataset {
        table: table.to_string(),
        columns,
        rows,
    })
}

/// Infers a column kind per header from the first [`TYPE_SAMPLE_ROWS`] rows.
/// `the_geom` is always a geometry column; a column whose sampled cells
/// disagree falls back to text.
fn infer_columns(headers: &csv::StringRecord, rows: &[Vec<Option<String>>]) -> Vec<Column> {
    headers
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let kind = if name == GEOMETRY_COLUMN {
                ColumnKind::Geometry
            } else {
                infer_kind(
                    rows.iter()
                        .take(TYPE_SAMPLE_ROWS)
                        .filter_map(|row| row.get(i).and_then(|cell| cell.as_deref())),
                )
            };
            Column { name: name.to_string(), kind }
        })
        .collect()
}

fn infer_kind<'a>(values: impl Iterator<Item = &'a str>) -> ColumnKind {
    let mut inferred: Option<ColumnKind> = None;
    for value in values {
        let kind = classify(value);
        inferred = Some(match inferred {
            None => kind,
            Some(previous) if previous == kind => previous,
            Some(ColumnKind::Integer) if kind == ColumnKind::Float => ColumnKind::Float,
            Some(ColumnKind::Float) if kind == ColumnKind::Integer => ColumnKind::Float,
            Some(_) => ColumnKind::Text,
        });
    }
    inferred.unwrap_or(ColumnKind::Text)
}

fn classify(value: &str) -> ColumnKind {
    if value.parse::<i64>().is_ok() {
        ColumnKind::Integer
    } else if value.parse::<f64>().is_ok() {
        ColumnKind::Float
    } else if matches!(value, "t" | "f" | "true" | "false") {
        // PostgreSQL CSV output spells booleans t/f
        ColumnKind::Boolean
    } else {
        ColumnKind::Text
    }
}
