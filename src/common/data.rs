use std::{fs::File, io::Cursor, path::Path, sync::Arc};

use anyhow::{Context, Result, bail};
use polars::{frame::DataFrame, io::{SerReader, SerWriter}, prelude::{CsvReadOptions, CsvReader, CsvWriter, DataType, Field, Schema, SchemaRef}};
use shapefile::{Reader, Shape, dbase::{FieldValue, Record}};

/// Write DataFrame to CSV bytes.
pub(crate) fn write_to_csv_bytes(df: &DataFrame) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    CsvWriter::new(&mut out).finish(&mut df.clone())?;
    Ok(out)
}

/// Read DataFrame from CSV bytes, forcing the listed columns to the given dtypes.
pub(crate) fn read_from_csv_bytes(bytes: &[u8], dtypes: &[(&str, DataType)]) -> Result<DataFrame> {
    let options = CsvReadOptions::default()
        .with_has_header(true)
        .with_schema_overwrite(Some(csv_schema(dtypes)));

    Ok(CsvReader::new(Cursor::new(bytes))
        .with_options(options)
        .finish()?)
}

/// Reads a CSV file from `path` into a Polars DataFrame, forcing the listed columns to the given dtypes.
pub(crate) fn read_from_csv_file(path: &Path, dtypes: &[(&str, DataType)]) -> Result<DataFrame> {
    let file = File::open(path)
        .with_context(|| format!("Failed to read CSV file: {}", path.display()))?;

    let options = CsvReadOptions::default()
        .with_has_header(true)
        .with_schema_overwrite(Some(csv_schema(dtypes)));

    CsvReader::new(file)
        .with_options(options)
        .finish()
        .with_context(|| format!("Failed to parse CSV file: {}", path.display()))
}

/// Schema overwrite so identifier columns stay strings (e.g. ISO codes like "NA").
fn csv_schema(dtypes: &[(&str, DataType)]) -> SchemaRef {
    Arc::new(Schema::from_iter(
        dtypes.iter().map(|(name, dtype)| Field::new((*name).into(), dtype.clone())),
    ))
}

/// Collect a string column, failing on nulls.
pub(crate) fn string_column(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    df.column(name)
        .with_context(|| format!("missing column {name:?}"))?
        .str().with_context(|| format!("column {name:?} must be of type String"))?
        .into_iter()
        .enumerate()
        .map(|(row, value)| value
            .map(|s| s.trim().to_string())
            .with_context(|| format!("null value in column {name:?} at row {row}")))
        .collect()
}

/// Collect a numeric column as `f64`, casting integer columns.
pub(crate) fn f64_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df.column(name)
        .with_context(|| format!("missing column {name:?}"))?
        .cast(&DataType::Float64)
        .with_context(|| format!("column {name:?} must be numeric"))?;
    Ok(column.f64()?.into_iter().collect())
}

/// Collect a numeric column as `i64`, casting float columns.
pub(crate) fn i64_column(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>> {
    let column = df.column(name)
        .with_context(|| format!("missing column {name:?}"))?
        .cast(&DataType::Int64)
        .with_context(|| format!("column {name:?} must be numeric"))?;
    Ok(column.i64()?.into_iter().collect())
}

/// Iterate over all shapes + attribute records of a `.shp` file, calling `keep`
/// to decide which ones are retained.
pub(crate) fn read_shapefile_filtered<F>(path: &Path, mut keep: F) -> Result<Vec<(Shape, Record)>>
where
    F: FnMut(&Record) -> bool,
{
    let mut reader = Reader::from_path(path)
        .with_context(|| format!("Failed to open shapefile: {}", path.display()))?;

    let mut items = Vec::new();
    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result.context("Error reading shape+record")?;
        if keep(&record) {
            items.push((shape, record));
        }
    }
    Ok(items)
}

/// Get the value of a character field from a Record.
pub(crate) fn character_field(record: &Record, field: &str) -> Option<String> {
    match record.get(field) {
        Some(FieldValue::Character(Some(s))) => Some(s.trim().to_string()),
        _ => None,
    }
}

/// Like [`character_field`], but the field must be present.
pub(crate) fn require_character_field(record: &Record, field: &str) -> Result<String> {
    match character_field(record, field) {
        Some(s) => Ok(s),
        None => bail!("missing or invalid character field: {}", field),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn csv_bytes_keep_string_ids() {
        let df = DataFrame::new(vec![
            Column::new("code".into(), vec!["001", "NA"]),
            Column::new("value".into(), vec![1.5f64, 2.0]),
        ]).unwrap();

        let bytes = write_to_csv_bytes(&df).unwrap();
        let back = read_from_csv_bytes(&bytes, &[("code", DataType::String)]).unwrap();

        assert_eq!(string_column(&back, "code").unwrap(), vec!["001", "NA"]);
        assert_eq!(f64_column(&back, "value").unwrap(), vec![Some(1.5), Some(2.0)]);
    }

    #[test]
    fn missing_column_is_an_error() {
        let df = DataFrame::new(vec![Column::new("a".into(), vec![1i64])]).unwrap();
        assert!(string_column(&df, "b").is_err());
        assert_eq!(i64_column(&df, "a").unwrap(), vec![Some(1)]);
    }
}
