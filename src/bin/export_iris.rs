use std::path::PathBuf;

use anyhow::Result;

use rusty_forest::data::{export, iris};

/// Write the built-in iris table as CSV and Parquet so the viewer's
/// "Open dataset…" path has something to load.
fn main() -> Result<()> {
    env_logger::init();

    let out_dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&out_dir)?;

    let dataset = iris::dataset();

    let csv_path = out_dir.join("iris.csv");
    export::write_csv(&dataset, &csv_path)?;
    log::info!("Wrote {}", csv_path.display());

    let parquet_path = out_dir.join("iris.parquet");
    export::write_parquet(&dataset, &parquet_path)?;
    log::info!("Wrote {}", parquet_path.display());

    println!(
        "Wrote {} rows ({} predictors, {} classes) to {} and {}",
        dataset.len(),
        dataset.n_features(),
        dataset.classes.len(),
        csv_path.display(),
        parquet_path.display()
    );
    Ok(())
}
