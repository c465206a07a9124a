use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

use crate::data::model::{DataError, Dataset};

#[derive(Debug, Error, PartialEq)]
pub enum SplitError {
    #[error("split proportion must lie strictly between 0 and 1, got {0}")]
    InvalidProportion(f64),
    #[error("{rows} rows cannot be split with proportion {prop}: one side would be empty")]
    TooFewRows { rows: usize, prop: f64 },
    #[error(transparent)]
    Data(#[from] DataError),
}

// ---------------------------------------------------------------------------
// Train / test partition
// ---------------------------------------------------------------------------

/// Row ids assigned to each side of an initial split.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    /// Sorted ascending.
    pub train_ids: Vec<usize>,
    /// Sorted ascending.
    pub test_ids: Vec<usize>,
}

impl Split {
    pub fn training(&self, dataset: &Dataset) -> Result<Dataset, DataError> {
        dataset.subset(&self.train_ids)
    }

    pub fn testing(&self, dataset: &Dataset) -> Result<Dataset, DataError> {
        dataset.subset(&self.test_ids)
    }

    pub fn proportion(&self) -> f64 {
        let total = self.train_ids.len() + self.test_ids.len();
        if total == 0 {
            return 0.0;
        }
        self.train_ids.len() as f64 / total as f64
    }
}

/// Randomly assign `floor(n * prop)` rows to training and the rest to testing.
///
/// With `strata` the rule is applied within each class, which keeps the class
/// balance of both sides close to the source.
pub fn initial_split<R: Rng + ?Sized>(
    dataset: &Dataset,
    prop: f64,
    strata: bool,
    rng: &mut R,
) -> Result<Split, SplitError> {
    if !(prop > 0.0 && prop < 1.0) {
        return Err(SplitError::InvalidProportion(prop));
    }

    let groups: Vec<Vec<usize>> = if strata {
        let mut by_class = vec![Vec::new(); dataset.classes.len()];
        for row in &dataset.rows {
            by_class[row.label].push(row.id);
        }
        by_class.retain(|g| !g.is_empty());
        by_class
    } else {
        vec![dataset.ids()]
    };

    let mut train_ids = Vec::new();
    let mut test_ids = Vec::new();
    for mut group in groups {
        let n_train = (group.len() as f64 * prop).floor() as usize;
        group.shuffle(rng);
        let test = group.split_off(n_train);
        train_ids.extend(group);
        test_ids.extend(test);
    }

    if train_ids.is_empty() || test_ids.is_empty() {
        return Err(SplitError::TooFewRows {
            rows: dataset.len(),
            prop,
        });
    }

    train_ids.sort_unstable();
    test_ids.sort_unstable();
    log::debug!(
        "split {} rows into {} train / {} test (strata: {strata})",
        dataset.len(),
        train_ids.len(),
        test_ids.len()
    );
    Ok(Split {
        train_ids,
        test_ids,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::data::iris;

    #[test]
    fn sixty_forty_on_iris_is_disjoint_and_complete() {
        let ds = iris::dataset();
        let mut rng = StdRng::seed_from_u64(7);
        let split = initial_split(&ds, 0.6, false, &mut rng).unwrap();
        assert_eq!(split.train_ids.len(), 90);
        assert_eq!(split.test_ids.len(), 60);

        let train: BTreeSet<_> = split.train_ids.iter().copied().collect();
        let test: BTreeSet<_> = split.test_ids.iter().copied().collect();
        assert!(train.is_disjoint(&test));
        let all: BTreeSet<_> = train.union(&test).copied().collect();
        assert_eq!(all, ds.ids().into_iter().collect());
        assert!((split.proportion() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn stratified_split_keeps_class_balance() {
        let ds = iris::dataset();
        let mut rng = StdRng::seed_from_u64(11);
        let split = initial_split(&ds, 0.6, true, &mut rng).unwrap();
        assert_eq!(split.training(&ds).unwrap().class_counts(), vec![30, 30, 30]);
        assert_eq!(split.testing(&ds).unwrap().class_counts(), vec![20, 20, 20]);
    }

    #[test]
    fn same_seed_same_split() {
        let ds = iris::dataset();
        let a = initial_split(&ds, 0.6, false, &mut StdRng::seed_from_u64(3)).unwrap();
        let b = initial_split(&ds, 0.6, false, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_bad_proportions_and_tiny_tables() {
        let ds = iris::dataset();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            initial_split(&ds, 1.0, false, &mut rng),
            Err(SplitError::InvalidProportion(1.0))
        );
        assert!(initial_split(&ds, f64::NAN, false, &mut rng).is_err());
        let one = ds.head(1);
        assert!(matches!(
            initial_split(&one, 0.6, false, &mut rng),
            Err(SplitError::TooFewRows { rows: 1, .. })
        ));
    }
}
