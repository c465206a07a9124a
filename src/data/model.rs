use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum DataError {
    #[error("dataset has no feature columns")]
    EmptyFeatures,
    #[error("feature column '{0}' appears more than once")]
    DuplicateFeature(String),
    #[error("feature name at position {0} is empty")]
    BlankFeature(usize),
    #[error("row {id}: expected {expected} feature values, found {found}")]
    RowWidth {
        id: usize,
        expected: usize,
        found: usize,
    },
    #[error("row {id}: label index {label} out of range for {classes} classes")]
    LabelOutOfRange {
        id: usize,
        label: usize,
        classes: usize,
    },
    #[error("row id {0} is not part of the dataset")]
    UnknownRow(usize),
}

// ---------------------------------------------------------------------------
// Observation – one row of the table
// ---------------------------------------------------------------------------

/// A single labelled row.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Position of the row in the source table; survives splits and bakes.
    pub id: usize,
    /// Numeric predictors, aligned with `Dataset::feature_names`.
    pub features: Vec<f64>,
    /// Index into `Dataset::classes`.
    pub label: usize,
}

// ---------------------------------------------------------------------------
// Dataset – numeric predictors plus one categorical outcome
// ---------------------------------------------------------------------------

/// An immutable table of numeric predictors and a class label.
///
/// Every transformation (split, bake, subset) produces a new `Dataset`;
/// nothing mutates rows in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub feature_names: Vec<String>,
    pub label_name: String,
    /// Ordered class levels; `Observation::label` indexes into this.
    pub classes: Vec<String>,
    pub rows: Vec<Observation>,
}

impl Dataset {
    /// Build a dataset, checking row widths, label ranges and column names.
    pub fn new(
        feature_names: Vec<String>,
        label_name: impl Into<String>,
        classes: Vec<String>,
        rows: Vec<Observation>,
    ) -> Result<Self, DataError> {
        if feature_names.is_empty() {
            return Err(DataError::EmptyFeatures);
        }
        let mut seen = BTreeSet::new();
        for (i, name) in feature_names.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(DataError::BlankFeature(i));
            }
            if !seen.insert(name.as_str()) {
                return Err(DataError::DuplicateFeature(name.clone()));
            }
        }
        for row in &rows {
            if row.features.len() != feature_names.len() {
                return Err(DataError::RowWidth {
                    id: row.id,
                    expected: feature_names.len(),
                    found: row.features.len(),
                });
            }
            if row.label >= classes.len() {
                return Err(DataError::LabelOutOfRange {
                    id: row.id,
                    label: row.label,
                    classes: classes.len(),
                });
            }
        }
        Ok(Dataset {
            feature_names,
            label_name: label_name.into(),
            classes,
            rows,
        })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    pub fn feature_index(&self, name: &str) -> Option<usize> {
        self.feature_names.iter().position(|n| n == name)
    }

    /// Copy out one predictor column by name.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.feature_index(name)?;
        Some(self.rows.iter().map(|r| r.features[idx]).collect())
    }

    /// Column-major copy of all predictors.
    pub fn columns(&self) -> Vec<Vec<f64>> {
        (0..self.n_features())
            .map(|j| self.rows.iter().map(|r| r.features[j]).collect())
            .collect()
    }

    pub fn labels(&self) -> Vec<usize> {
        self.rows.iter().map(|r| r.label).collect()
    }

    pub fn ids(&self) -> Vec<usize> {
        self.rows.iter().map(|r| r.id).collect()
    }

    /// Rows per class, indexed like `classes`.
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.classes.len()];
        for row in &self.rows {
            counts[row.label] += 1;
        }
        counts
    }

    /// Keep the rows with the given ids, in the order given.
    pub fn subset(&self, ids: &[usize]) -> Result<Self, DataError> {
        let by_id: BTreeMap<usize, &Observation> =
            self.rows.iter().map(|r| (r.id, r)).collect();
        let rows = ids
            .iter()
            .map(|id| {
                by_id
                    .get(id)
                    .map(|r| (*r).clone())
                    .ok_or(DataError::UnknownRow(*id))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.with_rows(rows))
    }

    /// First `n` rows, for previews.
    pub fn head(&self, n: usize) -> Self {
        self.with_rows(self.rows.iter().take(n).cloned().collect())
    }

    /// Same schema, different rows.
    pub fn with_rows(&self, rows: Vec<Observation>) -> Self {
        Dataset {
            feature_names: self.feature_names.clone(),
            label_name: self.label_name.clone(),
            classes: self.classes.clone(),
            rows,
        }
    }

    pub fn class_name(&self, label: usize) -> &str {
        self.classes.get(label).map(String::as_str).unwrap_or("?")
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows x {} predictors [{}], outcome '{}' with classes [{}]",
            self.len(),
            self.n_features(),
            self.feature_names.join(", "),
            self.label_name,
            self.classes.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> Dataset {
        Dataset::new(
            vec!["a".into(), "b".into()],
            "y",
            vec!["no".into(), "yes".into()],
            vec![
                Observation { id: 0, features: vec![1.0, 2.0], label: 0 },
                Observation { id: 1, features: vec![3.0, 4.0], label: 1 },
                Observation { id: 2, features: vec![5.0, 6.0], label: 1 },
            ],
        )
        .unwrap()
    }

    #[test]
    fn columns_are_column_major() {
        let ds = tiny();
        assert_eq!(ds.column("b"), Some(vec![2.0, 4.0, 6.0]));
        assert_eq!(ds.columns()[0], vec![1.0, 3.0, 5.0]);
        assert_eq!(ds.class_counts(), vec![1, 2]);
    }

    #[test]
    fn subset_keeps_requested_order() {
        let ds = tiny();
        let sub = ds.subset(&[2, 0]).unwrap();
        assert_eq!(sub.ids(), vec![2, 0]);
        assert_eq!(ds.subset(&[7]), Err(DataError::UnknownRow(7)));
    }

    #[test]
    fn rejects_ragged_rows_and_bad_labels() {
        let names = vec!["a".to_string()];
        let classes = vec!["x".to_string()];
        let ragged = vec![Observation { id: 4, features: vec![], label: 0 }];
        assert!(matches!(
            Dataset::new(names.clone(), "y", classes.clone(), ragged),
            Err(DataError::RowWidth { id: 4, .. })
        ));
        let bad = vec![Observation { id: 1, features: vec![0.0], label: 3 }];
        assert!(matches!(
            Dataset::new(names, "y", classes, bad),
            Err(DataError::LabelOutOfRange { label: 3, .. })
        ));
        assert_eq!(
            Dataset::new(vec!["a".into(), "a".into()], "y", vec![], vec![]),
            Err(DataError::DuplicateFeature("a".into()))
        );
    }
}
