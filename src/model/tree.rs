use rand::seq::SliceRandom;
use rand::Rng;

// ---------------------------------------------------------------------------
// CART classification tree (Gini), grown on a row sample
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Leaf {
        /// Class frequencies of the training rows in this leaf; sums to 1.
        distribution: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct GrowParams {
    pub n_classes: usize,
    pub mtry: usize,
    pub min_node_size: usize,
    pub max_depth: Option<usize>,
}

/// A grown tree stored as a flat arena; node 0 is the root.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
}

struct Grower<'a, R: Rng + ?Sized> {
    x: &'a [Vec<f64>],
    y: &'a [usize],
    params: GrowParams,
    rng: &'a mut R,
    nodes: Vec<Node>,
    /// Accumulated Gini decrease per feature.
    importance: Vec<f64>,
}

impl Tree {
    /// Grow a tree on rows `sample` (may repeat) of `x` / `y`.
    ///
    /// Returns the tree and its per-feature impurity decrease.
    pub fn grow<R: Rng + ?Sized>(
        x: &[Vec<f64>],
        y: &[usize],
        sample: &[usize],
        params: GrowParams,
        rng: &mut R,
    ) -> (Tree, Vec<f64>) {
        let n_features = x.first().map(Vec::len).unwrap_or(0);
        let mut grower = Grower {
            x,
            y,
            params,
            rng,
            nodes: Vec::new(),
            importance: vec![0.0; n_features],
        };
        let mut rows = sample.to_vec();
        grower.build(&mut rows, 0);
        (
            Tree {
                nodes: grower.nodes,
            },
            grower.importance,
        )
    }

    /// Leaf distribution reached by `row`.
    pub fn distribution(&self, row: &[f64]) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { distribution } => return distribution,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    decrease: f64,
}

/// `n * gini` expressed on raw counts: n - sum(c^2) / n.
fn weighted_gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let sq: f64 = counts.iter().map(|&c| (c * c) as f64).sum();
    n as f64 - sq / n as f64
}

impl<R: Rng + ?Sized> Grower<'_, R> {
    fn counts(&self, rows: &[usize]) -> Vec<usize> {
        let mut counts = vec![0; self.params.n_classes];
        for &r in rows {
            counts[self.y[r]] += 1;
        }
        counts
    }

    fn leaf(&mut self, counts: &[usize], n: usize) -> usize {
        let distribution = counts.iter().map(|&c| c as f64 / n as f64).collect();
        self.nodes.push(Node::Leaf { distribution });
        self.nodes.len() - 1
    }

    fn build(&mut self, rows: &mut [usize], depth: usize) -> usize {
        let n = rows.len();
        let counts = self.counts(rows);
        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let depth_reached = self.params.max_depth.is_some_and(|d| depth >= d);
        if pure || n <= self.params.min_node_size || depth_reached {
            return self.leaf(&counts, n);
        }

        let Some(best) = self.best_split(rows, &counts) else {
            return self.leaf(&counts, n);
        };
        self.importance[best.feature] += best.decrease;

        // Reserve the slot so children get higher indices.
        let idx = self.nodes.len();
        self.nodes.push(Node::Leaf {
            distribution: Vec::new(),
        });

        let (feature, threshold) = (best.feature, best.threshold);
        let x = self.x;
        rows.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));
        let cut = rows.partition_point(|&r| x[r][feature] <= threshold);
        let (left_rows, right_rows) = rows.split_at_mut(cut);
        let left = self.build(left_rows, depth + 1);
        let right = self.build(right_rows, depth + 1);

        self.nodes[idx] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        idx
    }

    fn best_split(&mut self, rows: &[usize], parent: &[usize]) -> Option<BestSplit> {
        let n = rows.len();
        let parent_impurity = weighted_gini(parent, n);

        let mut candidates: Vec<usize> = (0..self.importance.len()).collect();
        candidates.shuffle(&mut *self.rng);
        candidates.truncate(self.params.mtry);

        let mut best: Option<BestSplit> = None;
        let mut sorted = rows.to_vec();
        for feature in candidates {
            let x = self.x;
            sorted.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

            let mut left = vec![0usize; self.params.n_classes];
            let mut right = parent.to_vec();
            for i in 0..n - 1 {
                let class = self.y[sorted[i]];
                left[class] += 1;
                right[class] -= 1;

                let here = x[sorted[i]][feature];
                let next = x[sorted[i + 1]][feature];
                if here == next {
                    continue;
                }
                let decrease = parent_impurity
                    - weighted_gini(&left, i + 1)
                    - weighted_gini(&right, n - i - 1);
                if decrease > best.as_ref().map_or(1e-12, |b| b.decrease) {
                    best = Some(BestSplit {
                        feature,
                        threshold: (here + next) / 2.0,
                        decrease,
                    });
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn params(mtry: usize) -> GrowParams {
        GrowParams {
            n_classes: 2,
            mtry,
            min_node_size: 1,
            max_depth: None,
        }
    }

    #[test]
    fn separable_data_gets_one_split() {
        let x = vec![vec![1.0], vec![2.0], vec![8.0], vec![9.0]];
        let y = vec![0, 0, 1, 1];
        let mut rng = StdRng::seed_from_u64(1);
        let (tree, importance) = Tree::grow(&x, &y, &[0, 1, 2, 3], params(1), &mut rng);
        assert_eq!(tree.n_nodes(), 3);
        assert_eq!(tree.distribution(&[0.0]), &[1.0, 0.0]);
        assert_eq!(tree.distribution(&[5.1]), &[0.0, 1.0]);
        // parent gini * n = 4 - (4 + 4) / 4 = 2, children pure
        assert!((importance[0] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn constant_feature_yields_a_leaf() {
        let x = vec![vec![3.0], vec![3.0], vec![3.0]];
        let y = vec![0, 1, 1];
        let mut rng = StdRng::seed_from_u64(1);
        let (tree, _) = Tree::grow(&x, &y, &[0, 1, 2], params(1), &mut rng);
        assert_eq!(tree.n_leaves(), 1);
        let d = tree.distribution(&[3.0]);
        assert!((d[0] - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn depth_limit_is_respected() {
        let x: Vec<Vec<f64>> = (0..8).map(|i| vec![i as f64]).collect();
        let y = vec![0, 1, 0, 1, 0, 1, 0, 1];
        let sample: Vec<usize> = (0..8).collect();
        let mut rng = StdRng::seed_from_u64(2);
        let limited = GrowParams {
            max_depth: Some(1),
            ..params(1)
        };
        let (tree, _) = Tree::grow(&x, &y, &sample, limited, &mut rng);
        assert!(tree.n_leaves() <= 2);
    }
}
