use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, AsArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Dataset, Observation};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a labelled table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – numeric columns plus one string label column
/// * `.json`    – `[{ "Sepal.Length": 5.1, ..., "Species": "setosa" }, ...]`
/// * `.csv`     – header row; numeric columns plus one text label column
///
/// `label_column` names the outcome; when `None` the table must contain
/// exactly one non-numeric column, which becomes the label.
pub fn load_file(path: &Path, label_column: Option<&str>) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path, label_column),
        "json" => load_json(path, label_column),
        "csv" => load_csv(path, label_column),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!("loaded {} from {}", dataset, path.display());
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Column-oriented intermediate shared by the three readers
// ---------------------------------------------------------------------------

enum RawColumn {
    Numeric(Vec<f64>),
    Text(Vec<String>),
}

struct RawTable {
    names: Vec<String>,
    columns: Vec<RawColumn>,
}

impl RawTable {
    /// Pick the label column and assemble a `Dataset`.
    fn into_dataset(self, label_column: Option<&str>) -> Result<Dataset> {
        let label_idx = match label_column {
            Some(name) => self
                .names
                .iter()
                .position(|n| n == name)
                .with_context(|| format!("label column '{name}' not found"))?,
            None => {
                let text: Vec<usize> = self
                    .columns
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| matches!(c, RawColumn::Text(_)))
                    .map(|(i, _)| i)
                    .collect();
                match text.as_slice() {
                    [single] => *single,
                    [] => bail!("no text column to use as the label"),
                    _ => bail!(
                        "several text columns ({}); name the label column",
                        text.iter()
                            .map(|&i| self.names[i].as_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    ),
                }
            }
        };

        let labels: Vec<String> = match &self.columns[label_idx] {
            RawColumn::Text(v) => v.clone(),
            RawColumn::Numeric(v) => v.iter().map(|x| x.to_string()).collect(),
        };
        let classes: Vec<String> = labels
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut feature_names = Vec::new();
        let mut features: Vec<&Vec<f64>> = Vec::new();
        for (i, (name, col)) in self.names.iter().zip(&self.columns).enumerate() {
            if i == label_idx {
                continue;
            }
            match col {
                RawColumn::Numeric(v) => {
                    feature_names.push(name.clone());
                    features.push(v);
                }
                RawColumn::Text(_) => bail!("column '{name}' is not numeric"),
            }
        }

        let rows = labels
            .iter()
            .enumerate()
            .map(|(id, label)| Observation {
                id,
                features: features.iter().map(|c| c[id]).collect(),
                label: classes.iter().position(|c| c == label).unwrap_or(0),
            })
            .collect();

        Ok(Dataset::new(feature_names, self.names[label_idx].clone(), classes, rows)?)
    }
}

/// Numeric when every non-empty cell parses as f64.
fn classify_cells(cells: Vec<String>) -> RawColumn {
    let parsed: Option<Vec<f64>> = cells.iter().map(|s| s.trim().parse::<f64>().ok()).collect();
    match parsed {
        Some(values) if !cells.is_empty() => RawColumn::Numeric(values),
        _ => RawColumn::Text(cells),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, like `jsonlite::toJSON(iris)`):
///
/// ```json
/// [
///   { "Sepal.Length": 5.1, "Sepal.Width": 3.5, "Petal.Length": 1.4,
///     "Petal.Width": 0.2, "Species": "setosa" },
///   ...
/// ]
/// ```
fn load_json(path: &Path, label_column: Option<&str>) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;
    let first = records
        .first()
        .and_then(|r| r.as_object())
        .context("Expected at least one JSON object")?;
    let names: Vec<String> = first.keys().cloned().collect();

    let mut cells: Vec<Vec<String>> = vec![Vec::with_capacity(records.len()); names.len()];
    let mut numeric = vec![true; names.len()];
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for (j, name) in names.iter().enumerate() {
            let val = obj
                .get(name)
                .with_context(|| format!("Row {i}: missing '{name}'"))?;
            match val {
                JsonValue::Number(n) => cells[j].push(n.to_string()),
                JsonValue::String(s) => {
                    numeric[j] = false;
                    cells[j].push(s.clone());
                }
                other => bail!("Row {i}, '{name}': unsupported value {other}"),
            }
        }
    }

    let columns = cells
        .into_iter()
        .zip(numeric)
        .map(|(c, is_num)| if is_num { classify_cells(c) } else { RawColumn::Text(c) })
        .collect();
    RawTable { names, columns }.into_dataset(label_column)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names; every column whose cells all
/// parse as numbers is a predictor.
fn load_csv(path: &Path, label_column: Option<&str>) -> Result<Dataset> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let names: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); names.len()];
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        if record.len() != names.len() {
            bail!(
                "CSV row {row_no}: {} fields but {} headers",
                record.len(),
                names.len()
            );
        }
        for (j, value) in record.iter().enumerate() {
            cells[j].push(value.to_string());
        }
    }

    let columns = cells.into_iter().map(classify_cells).collect();
    RawTable { names, columns }.into_dataset(label_column)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file: Float64/Float32/Int32/Int64 columns are predictors,
/// Utf8/LargeUtf8 columns are candidate labels.
fn load_parquet(path: &Path, label_column: Option<&str>) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut columns: Vec<Option<RawColumn>> = (0..names.len()).map(|_| None).collect();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for (j, name) in names.iter().enumerate() {
            let chunk = extract_column(batch.column(j))
                .with_context(|| format!("column '{name}'"))?;
            let merged = match (columns[j].take(), chunk) {
                (None, chunk) => chunk,
                (Some(RawColumn::Numeric(mut acc)), RawColumn::Numeric(v)) => {
                    acc.extend(v);
                    RawColumn::Numeric(acc)
                }
                (Some(RawColumn::Text(mut acc)), RawColumn::Text(v)) => {
                    acc.extend(v);
                    RawColumn::Text(acc)
                }
                _ => bail!("column '{name}' changes type between record batches"),
            };
            columns[j] = Some(merged);
        }
    }

    let columns = columns
        .into_iter()
        .map(|c| c.unwrap_or(RawColumn::Numeric(Vec::new())))
        .collect();
    RawTable { names, columns }.into_dataset(label_column)
}

// -- Arrow helpers --

fn extract_column(col: &Arc<dyn Array>) -> Result<RawColumn> {
    if col.null_count() > 0 {
        bail!("{} null values; missing data is not supported", col.null_count());
    }
    let column = match col.data_type() {
        DataType::Float64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float64Array>()
                .context("expected Float64Array")?;
            RawColumn::Numeric(arr.values().to_vec())
        }
        DataType::Float32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float32Array>()
                .context("expected Float32Array")?;
            RawColumn::Numeric(arr.values().iter().map(|&v| v as f64).collect())
        }
        DataType::Int32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int32Array>()
                .context("expected Int32Array")?;
            RawColumn::Numeric(arr.values().iter().map(|&v| v as f64).collect())
        }
        DataType::Int64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int64Array>()
                .context("expected Int64Array")?;
            RawColumn::Numeric(arr.values().iter().map(|&v| v as f64).collect())
        }
        DataType::Utf8 => {
            let arr = col
                .as_any()
                .downcast_ref::<StringArray>()
                .context("expected StringArray")?;
            RawColumn::Text(arr.iter().map(|v| v.unwrap_or("").to_string()).collect())
        }
        DataType::LargeUtf8 => {
            let arr = col.as_string::<i64>();
            RawColumn::Text(arr.iter().map(|v| v.unwrap_or("").to_string()).collect())
        }
        other => bail!("unsupported column type {other:?}"),
    };
    Ok(column)
}
