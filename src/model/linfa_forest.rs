use linfa::traits::{Fit, Predict};
use linfa::DatasetBase;
use linfa_trees::{DecisionTree, SplitQuality};
use ndarray::{Array1, Array2};
use rand::seq::SliceRandom;
use rand::Rng;

use super::{aligned_features, bootstrap, single_class, Classifier, Engine, ForestSpec, ModelError};
use crate::data::model::Dataset;

// ---------------------------------------------------------------------------
// Linfa engine: bagged linfa-trees CART, one feature subspace per tree
// ---------------------------------------------------------------------------

struct Member {
    /// Indices into the forest's feature list this tree was trained on.
    features: Vec<usize>,
    tree: DecisionTree<f64, usize>,
}

/// Majority-vote forest of `linfa_trees::DecisionTree`s.
pub struct LinfaForest {
    members: Vec<Member>,
    classes: Vec<String>,
    feature_names: Vec<String>,
}

fn to_records(rows: &[Vec<f64>], features: &[usize]) -> Result<Array2<f64>, ModelError> {
    let flat: Vec<f64> = rows
        .iter()
        .flat_map(|r| features.iter().map(move |&j| r[j]))
        .collect();
    Array2::from_shape_vec((rows.len(), features.len()), flat)
        .map_err(|e| ModelError::Backend(e.to_string()))
}

impl LinfaForest {
    pub(crate) fn fit<R: Rng + ?Sized>(
        spec: &ForestSpec,
        mtry: usize,
        training: &Dataset,
        rng: &mut R,
    ) -> Result<Self, ModelError> {
        let x: Vec<Vec<f64>> = training.rows.iter().map(|r| r.features.clone()).collect();
        let y = training.labels();
        let p = training.n_features();
        // Whole trees see one subspace, so keep at least half the predictors.
        let subspace = mtry.max(p.div_ceil(2));

        let mut members = Vec::with_capacity(spec.trees);
        for t in 0..spec.trees {
            let sample = bootstrap(x.len(), rng);
            if single_class(&sample, &y) {
                log::warn!("linfa tree {t}: bootstrap sample holds a single class");
            }
            let mut features: Vec<usize> = (0..p).collect();
            features.shuffle(&mut *rng);
            features.truncate(subspace);
            features.sort_unstable();

            let rows: Vec<Vec<f64>> = sample.iter().map(|&i| x[i].clone()).collect();
            let targets: Array1<usize> = sample.iter().map(|&i| y[i]).collect();
            let records = to_records(&rows, &features)?;
            let bag = DatasetBase::new(records, targets);

            // A node splits only when it holds more than `min_node_size` rows.
            let min_split = (spec.min_node_size + 1).max(2) as f32;
            let tree = DecisionTree::<f64, usize>::params()
                .split_quality(SplitQuality::Gini)
                .max_depth(spec.max_depth)
                .min_weight_split(min_split)
                .fit(&bag)
                .map_err(|e| ModelError::Backend(e.to_string()))?;
            log::debug!("linfa tree {t}: features {features:?}");
            members.push(Member { features, tree });
        }

        Ok(LinfaForest {
            members,
            classes: training.classes.clone(),
            feature_names: training.feature_names.clone(),
        })
    }
}

impl Classifier for LinfaForest {
    fn engine(&self) -> Engine {
        Engine::Linfa
    }

    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Share of trees voting for each class.
    fn predict_proba(&self, data: &Dataset) -> Result<Vec<Vec<f64>>, ModelError> {
        let rows = aligned_features(&self.feature_names, data)?;
        let mut votes = vec![vec![0.0; self.classes.len()]; rows.len()];
        for member in &self.members {
            let records = to_records(&rows, &member.features)?;
            let predicted: Array1<usize> = member.tree.predict(&records);
            for (row_votes, &class) in votes.iter_mut().zip(predicted.iter()) {
                if let Some(v) = row_votes.get_mut(class) {
                    *v += 1.0;
                }
            }
        }
        let n = self.members.len() as f64;
        for row in votes.iter_mut() {
            row.iter_mut().for_each(|v| *v /= n);
        }
        Ok(votes)
    }
}
