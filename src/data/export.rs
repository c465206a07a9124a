use std::path::Path;

use anyhow::{Context, Result};
use parquet::arrow::ArrowWriter;

use super::model::Dataset;
use crate::report::dataset_batch;

// ---------------------------------------------------------------------------
// Writers producing files `loader::load_file` reads back
// ---------------------------------------------------------------------------

/// Header row, one numeric column per predictor, label last.
pub fn write_csv(dataset: &Dataset, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;

    let mut header: Vec<&str> = dataset.feature_names.iter().map(String::as_str).collect();
    header.push(&dataset.label_name);
    writer.write_record(&header).context("writing CSV header")?;

    for row in &dataset.rows {
        let mut record: Vec<String> = row.features.iter().map(|v| v.to_string()).collect();
        record.push(dataset.class_name(row.label).to_string());
        writer
            .write_record(&record)
            .with_context(|| format!("writing CSV row {}", row.id))?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

/// Float64 predictor columns plus a Utf8 label column, one row group.
pub fn write_parquet(dataset: &Dataset, path: &Path) -> Result<()> {
    let batch = dataset_batch(dataset, false)?;
    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer =
        ArrowWriter::try_new(file, batch.schema(), None).context("creating parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{iris, loader};

    #[test]
    fn csv_round_trips_through_the_loader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("iris.csv");
        let ds = iris::dataset();
        write_csv(&ds, &path).unwrap();
        let back = loader::load_file(&path, None).unwrap();
        assert_eq!(back, ds);
    }

    #[test]
    fn parquet_round_trips_through_the_loader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("iris.parquet");
        let ds = iris::dataset();
        write_parquet(&ds, &path).unwrap();
        let back = loader::load_file(&path, Some("Species")).unwrap();
        assert_eq!(back, ds);
    }
}
