//! Console tables for a workflow run, rendered through Arrow's pretty printer.

use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;

use crate::data::model::Dataset;
use crate::metrics::ConfusionMatrix;
use crate::stats::CorrelationMatrix;
use crate::workflow::{ModelReport, WorkflowReport};

// ---------------------------------------------------------------------------
// RecordBatch builders
// ---------------------------------------------------------------------------

/// Predictors as Float64 columns plus the label as Utf8, optionally led by `.row`.
pub fn dataset_batch(dataset: &Dataset, with_ids: bool) -> Result<RecordBatch> {
    let mut fields = Vec::new();
    let mut columns: Vec<ArrayRef> = Vec::new();

    if with_ids {
        fields.push(Field::new(".row", DataType::Int64, false));
        let ids: Vec<i64> = dataset.rows.iter().map(|r| r.id as i64 + 1).collect();
        columns.push(Arc::new(Int64Array::from(ids)));
    }
    for (name, values) in dataset.feature_names.iter().zip(dataset.columns()) {
        fields.push(Field::new(name, DataType::Float64, false));
        columns.push(Arc::new(Float64Array::from(values)));
    }
    fields.push(Field::new(&dataset.label_name, DataType::Utf8, false));
    let labels: Vec<&str> = dataset.rows.iter().map(|r| dataset.class_name(r.label)).collect();
    columns.push(Arc::new(StringArray::from(labels)));

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).context("building dataset table")
}

pub fn correlation_batch(cm: &CorrelationMatrix) -> Result<RecordBatch> {
    let mut fields = vec![Field::new("term", DataType::Utf8, false)];
    let mut columns: Vec<ArrayRef> = vec![Arc::new(StringArray::from(cm.names.clone()))];
    for (j, name) in cm.names.iter().enumerate() {
        fields.push(Field::new(name, DataType::Float64, true));
        let col: Vec<Option<f64>> = (0..cm.len())
            .map(|i| Some(cm.get(i, j)).filter(|v| !v.is_nan()))
            .map(|v| v.map(|r| (r * 1000.0).round() / 1000.0))
            .collect();
        columns.push(Arc::new(Float64Array::from(col)));
    }
    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).context("building correlation table")
}

/// One row per metric, one column per engine.
pub fn metrics_batch(models: &[ModelReport]) -> Result<RecordBatch> {
    let names: Vec<&str> = models
        .first()
        .map(|m| m.evaluation.metric_rows().iter().map(|(n, _)| *n).collect())
        .unwrap_or_default();

    let mut fields = vec![Field::new(".metric", DataType::Utf8, false)];
    let mut columns: Vec<ArrayRef> = vec![Arc::new(StringArray::from(names))];
    for model in models {
        fields.push(Field::new(model.engine.to_string(), DataType::Float64, true));
        let values: Vec<Option<f64>> = model
            .evaluation
            .metric_rows()
            .iter()
            .map(|(_, v)| Some((v * 10_000.0).round() / 10_000.0).filter(|v| !v.is_nan()))
            .collect();
        columns.push(Arc::new(Float64Array::from(values)));
    }
    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).context("building metrics table")
}

/// Truth in rows, prediction in columns.
pub fn confusion_batch(classes: &[String], cm: &ConfusionMatrix) -> Result<RecordBatch> {
    let mut fields = vec![Field::new("Truth \\ Prediction", DataType::Utf8, false)];
    let mut columns: Vec<ArrayRef> = vec![Arc::new(StringArray::from(classes.to_vec()))];
    for (p, class) in classes.iter().enumerate() {
        fields.push(Field::new(class, DataType::UInt64, false));
        let counts: Vec<u64> = cm.counts.iter().map(|row| row[p] as u64).collect();
        columns.push(Arc::new(UInt64Array::from(counts)));
    }
    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).context("building confusion table")
}

pub fn importance_batch(importance: &[(String, f64)]) -> Result<RecordBatch> {
    let schema = Schema::new(vec![
        Field::new("variable", DataType::Utf8, false),
        Field::new("importance", DataType::Float64, false),
    ]);
    let names: Vec<&str> = importance.iter().map(|(n, _)| n.as_str()).collect();
    let values: Vec<f64> = importance
        .iter()
        .map(|(_, v)| (v * 10_000.0).round() / 10_000.0)
        .collect();
    RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(StringArray::from(names)),
            Arc::new(Float64Array::from(values)),
        ],
    )
    .context("building importance table")
}

/// First `n` augmented predictions: truth, class and per-class probabilities.
pub fn predictions_batch(classes: &[String], model: &ModelReport, n: usize) -> Result<RecordBatch> {
    let rows = &model.predictions[..n.min(model.predictions.len())];
    let mut fields = vec![
        Field::new(".row", DataType::Int64, false),
        Field::new("truth", DataType::Utf8, false),
        Field::new(".pred_class", DataType::Utf8, false),
    ];
    let class_name = |k: usize| classes.get(k).map(String::as_str).unwrap_or("?");
    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(
            rows.iter().map(|p| p.id as i64 + 1).collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            rows.iter().map(|p| class_name(p.truth)).collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            rows.iter().map(|p| class_name(p.predicted)).collect::<Vec<_>>(),
        )),
    ];
    for (k, class) in classes.iter().enumerate() {
        fields.push(Field::new(format!(".pred_{class}"), DataType::Float64, false));
        let probs: Vec<f64> = rows
            .iter()
            .map(|p| p.probabilities.get(k).copied().unwrap_or(0.0))
            .collect();
        columns.push(Arc::new(Float64Array::from(probs)));
    }
    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).context("building predictions table")
}

// ---------------------------------------------------------------------------
// Full console report
// ---------------------------------------------------------------------------

fn table(out: &mut String, title: &str, batch: RecordBatch) -> Result<()> {
    let pretty = pretty_format_batches(&[batch]).context("formatting table")?;
    writeln!(out, "\n== {title}\n{pretty}")?;
    Ok(())
}

/// Render every table of a run as text.
pub fn render(report: &WorkflowReport) -> Result<String> {
    let n = report.config.preview_rows;
    let mut out = String::new();
    writeln!(out, "{}", report.dataset)?;
    writeln!(out, "seed: {}", report.seed)?;

    table(&mut out, "Data preview", dataset_batch(&report.dataset.head(n), false)?)?;
    table(&mut out, "Correlation matrix", correlation_batch(&report.correlation)?)?;

    writeln!(
        out,
        "\n== Split\n<Training/Testing/Total>\n<{}/{}/{}>",
        report.split.train_ids.len(),
        report.split.test_ids.len(),
        report.dataset.len()
    )?;

    writeln!(out, "\n== Recipe\n{}", report.recipe)?;
    table(&mut out, "Baked training data", dataset_batch(&report.baked_train().head(n), true)?)?;
    table(&mut out, "Baked testing data", dataset_batch(&report.baked_test.head(n), true)?)?;

    let classes = &report.dataset.classes;
    for model in &report.models {
        table(
            &mut out,
            &format!("Predictions ({})", model.engine),
            predictions_batch(classes, model, n)?,
        )?;
        table(
            &mut out,
            &format!("Confusion matrix ({})", model.engine),
            confusion_batch(classes, &model.evaluation.confusion)?,
        )?;
        if let Some(importance) = &model.importance {
            table(
                &mut out,
                &format!("Variable importance ({})", model.engine),
                importance_batch(importance)?,
            )?;
        }
    }
    table(&mut out, "Metrics", metrics_batch(&report.models)?)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkflowConfig;
    use crate::data::iris;
    use crate::workflow;

    #[test]
    fn dataset_batch_has_one_column_per_field() {
        let ds = iris::dataset().head(3);
        let batch = dataset_batch(&ds, true).unwrap();
        assert_eq!(batch.num_rows(), 3);
        assert_eq!(batch.num_columns(), 6);
        assert_eq!(batch.schema().field(5).name(), "Species");
    }

    #[test]
    fn rendered_report_names_every_section() {
        let config = WorkflowConfig {
            seed: Some(1),
            trees: 10,
            ..Default::default()
        };
        let report = workflow::run(&config, iris::dataset()).unwrap();
        let text = render(&report).unwrap();
        for section in [
            "Data preview",
            "Correlation matrix",
            "<90/60/150>",
            "Correlation filter",
            "Confusion matrix (native)",
            "Confusion matrix (linfa)",
            "Variable importance (native)",
            "roc_auc (hand_till)",
        ] {
            assert!(text.contains(section), "missing {section}");
        }
    }
}
