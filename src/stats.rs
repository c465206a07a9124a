use std::fmt;

use linfa::DatasetBase;
use ndarray::Array2;

use crate::data::model::Dataset;

// ---------------------------------------------------------------------------
// Descriptive statistics
// ---------------------------------------------------------------------------

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

// ---------------------------------------------------------------------------
// Correlation matrix
// ---------------------------------------------------------------------------

/// Symmetric Pearson matrix over the predictor columns of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub names: Vec<String>,
    /// Row-major `names.len() x names.len()`.
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    /// Correlate the given equal-length columns pairwise.
    ///
    /// Zero-variance columns give `NaN` off the diagonal; the diagonal is 1.
    pub fn from_columns(names: Vec<String>, columns: &[Vec<f64>]) -> Self {
        let p = columns.len();
        let n = columns.first().map_or(0, Vec::len);
        let mut values = vec![vec![f64::NAN; p]; p];
        for (i, row) in values.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        if p < 2 || n < 2 || columns.iter().any(|c| c.len() != n) {
            return CorrelationMatrix { names, values };
        }

        let records = Array2::from_shape_fn((n, p), |(row, col)| columns[col][row]);
        let pearson = DatasetBase::new(records, ()).pearson_correlation();
        // Upper triangle, row-major.
        let mut coeffs = pearson.get_coeffs().iter();
        for i in 0..p {
            for j in (i + 1)..p {
                let r = coeffs.next().copied().unwrap_or(f64::NAN);
                let r = if r.is_nan() { r } else { r.clamp(-1.0, 1.0) };
                values[i][j] = r;
                values[j][i] = r;
            }
        }
        CorrelationMatrix { names, values }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i][j]
    }

    /// Off-diagonal pairs `(i, j, r)` with `i < j`, strongest |r| first.
    /// Undefined correlations sort last.
    pub fn strongest_pairs(&self) -> Vec<(usize, usize, f64)> {
        let mut pairs: Vec<(usize, usize, f64)> = (0..self.len())
            .flat_map(|i| ((i + 1)..self.len()).map(move |j| (i, j)))
            .map(|(i, j)| (i, j, self.values[i][j]))
            .collect();
        pairs.sort_by(|a, b| {
            let ka = if a.2.is_nan() { -1.0 } else { a.2.abs() };
            let kb = if b.2.is_nan() { -1.0 } else { b.2.abs() };
            kb.total_cmp(&ka)
        });
        pairs
    }
}

impl fmt::Display for CorrelationMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.names.iter().map(|n| n.len()).max().unwrap_or(0).max(7);
        write!(f, "{:width$}", "")?;
        for name in &self.names {
            write!(f, " {name:>width$}")?;
        }
        writeln!(f)?;
        for (name, row) in self.names.iter().zip(&self.values) {
            write!(f, "{name:width$}")?;
            for v in row {
                write!(f, " {v:>width$.3}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Pearson correlations between every pair of predictors.
pub fn correlation_matrix(dataset: &Dataset) -> CorrelationMatrix {
    CorrelationMatrix::from_columns(dataset.feature_names.clone(), &dataset.columns())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::iris;

    #[test]
    fn sample_sd_uses_n_minus_one() {
        let sd = std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((sd - 2.138089935).abs() < 1e-9);
        assert!(std_dev(&[1.0]).is_nan());
    }

    #[test]
    fn perfect_and_undefined_correlations() {
        let names = ["a", "up", "down", "flat"].map(String::from).to_vec();
        let columns = vec![
            vec![1.0, 2.0, 3.0, 4.0],
            vec![2.0, 4.0, 6.0, 8.0],
            vec![8.0, 6.0, 4.0, 2.0],
            vec![3.0, 3.0, 3.0, 3.0],
        ];
        let cm = CorrelationMatrix::from_columns(names, &columns);
        assert!((cm.get(0, 1) - 1.0).abs() < 1e-12);
        assert!((cm.get(0, 2) + 1.0).abs() < 1e-12);
        assert!(cm.get(0, 3).is_nan());
        assert!(cm.get(3, 0).is_nan());
        assert_eq!(cm.get(3, 3), 1.0);
        // undefined pairs sort after every defined one
        assert!(cm.strongest_pairs().last().unwrap().2.is_nan());
    }

    #[test]
    fn too_few_rows_leave_pairs_undefined() {
        let cm = CorrelationMatrix::from_columns(
            vec!["a".into(), "b".into()],
            &[vec![1.0], vec![2.0]],
        );
        assert_eq!(cm.get(0, 0), 1.0);
        assert!(cm.get(0, 1).is_nan());
        assert!(CorrelationMatrix::from_columns(Vec::new(), &[]).is_empty());
    }

    #[test]
    fn display_lists_every_predictor() {
        let text = correlation_matrix(&iris::dataset()).to_string();
        assert_eq!(text.lines().count(), 5);
        assert!(text.contains("Petal.Width"));
        assert!(text.contains("0.963"));
    }

    #[test]
    fn iris_matrix_is_symmetric_with_unit_diagonal() {
        let cm = correlation_matrix(&iris::dataset());
        assert_eq!(cm.len(), 4);
        for i in 0..4 {
            assert_eq!(cm.get(i, i), 1.0);
            for j in 0..4 {
                assert_eq!(cm.get(i, j), cm.get(j, i));
            }
        }
        // Petal.Length vs Petal.Width
        assert!((cm.get(2, 3) - 0.9628654).abs() < 1e-6);
        let (i, j, _) = cm.strongest_pairs()[0];
        assert_eq!((i, j), (2, 3));
    }
}
