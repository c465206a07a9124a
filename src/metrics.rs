use std::fmt;

use linfa::dataset::Pr;
use linfa::metrics::{BinaryClassification, ReceiverOperatingCharacteristic, ToConfusionMatrix};
use ndarray::Array1;
use thiserror::Error;

use crate::data::model::Dataset;

#[derive(Debug, Error, PartialEq)]
pub enum MetricsError {
    #[error("no rows to evaluate")]
    Empty,
    #[error("{truth} true labels but {other} predictions")]
    LengthMismatch { truth: usize, other: usize },
    #[error("class index {class} out of range for {classes} classes")]
    ClassOutOfRange { class: usize, classes: usize },
    #[error("row {row}: expected {expected} class probabilities, found {found}")]
    ProbabilityWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("metric backend: {0}")]
    Backend(String),
}

const LOG_LOSS_EPS: f64 = 1e-15;

/// linfa opens its threshold sweep at 0.0, so scores are lifted clear of it.
const SCORE_OFFSET: f32 = 1.0;

fn backend(e: linfa::Error) -> MetricsError {
    MetricsError::Backend(e.to_string())
}

// ---------------------------------------------------------------------------
// Predictions joined back onto test rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub id: usize,
    pub truth: usize,
    pub predicted: usize,
    pub probabilities: Vec<f64>,
}

/// Join class and probability predictions positionally with `test` rows.
pub fn augment(
    test: &Dataset,
    predicted: &[usize],
    probabilities: &[Vec<f64>],
) -> Result<Vec<Prediction>, MetricsError> {
    check_len(test.len(), predicted.len())?;
    check_len(test.len(), probabilities.len())?;
    Ok(test
        .rows
        .iter()
        .zip(predicted)
        .zip(probabilities)
        .map(|((row, &predicted), probs)| Prediction {
            id: row.id,
            truth: row.label,
            predicted,
            probabilities: probs.clone(),
        })
        .collect())
}

fn check_len(truth: usize, other: usize) -> Result<(), MetricsError> {
    if truth != other {
        return Err(MetricsError::LengthMismatch { truth, other });
    }
    Ok(())
}

fn check_classes(labels: &[usize], n_classes: usize) -> Result<(), MetricsError> {
    match labels.iter().find(|&&c| c >= n_classes) {
        Some(&class) => Err(MetricsError::ClassOutOfRange {
            class,
            classes: n_classes,
        }),
        None => Ok(()),
    }
}

fn check_probs(probs: &[Vec<f64>], n_classes: usize) -> Result<(), MetricsError> {
    for (row, p) in probs.iter().enumerate() {
        if p.len() != n_classes {
            return Err(MetricsError::ProbabilityWidth {
                row,
                expected: n_classes,
                found: p.len(),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Hard-class metrics
// ---------------------------------------------------------------------------

/// `counts[truth][predicted]`, over every declared class.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionMatrix {
    pub counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    pub fn new(n_classes: usize, truth: &[usize], predicted: &[usize]) -> Result<Self, MetricsError> {
        check_len(truth.len(), predicted.len())?;
        check_classes(truth, n_classes)?;
        check_classes(predicted, n_classes)?;
        let mut counts = vec![vec![0; n_classes]; n_classes];
        for (&t, &p) in truth.iter().zip(predicted) {
            counts[t][p] += 1;
        }
        Ok(ConfusionMatrix { counts })
    }

    pub fn n_classes(&self) -> usize {
        self.counts.len()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn correct(&self) -> usize {
        (0..self.n_classes()).map(|k| self.counts[k][k]).sum()
    }

    pub fn truth_total(&self, class: usize) -> usize {
        self.counts[class].iter().sum()
    }

    pub fn predicted_total(&self, class: usize) -> usize {
        self.counts.iter().map(|row| row[class]).sum()
    }

    /// Cohen's kappa. When chance agreement is already perfect the statistic
    /// is undefined; report 1 for perfect observed agreement, else 0.
    pub fn kappa(&self) -> f64 {
        let n = self.total() as f64;
        if n == 0.0 {
            return f64::NAN;
        }
        let observed = self.correct() as f64 / n;
        let expected: f64 = (0..self.n_classes())
            .map(|k| (self.truth_total(k) as f64 / n) * (self.predicted_total(k) as f64 / n))
            .sum();
        if (1.0 - expected).abs() < f64::EPSILON {
            return if observed == 1.0 { 1.0 } else { 0.0 };
        }
        (observed - expected) / (1.0 - expected)
    }
}

/// Share of rows whose predicted class matches the truth.
pub fn accuracy(truth: &[usize], predicted: &[usize]) -> Result<f64, MetricsError> {
    if truth.is_empty() {
        return Err(MetricsError::Empty);
    }
    check_len(truth.len(), predicted.len())?;
    let truth = Array1::from(truth.to_vec());
    let cm = truth
        .confusion_matrix(&Array1::from(predicted.to_vec()))
        .map_err(backend)?;
    Ok(f64::from(cm.accuracy()))
}

pub fn kappa(n_classes: usize, truth: &[usize], predicted: &[usize]) -> Result<f64, MetricsError> {
    if truth.is_empty() {
        return Err(MetricsError::Empty);
    }
    Ok(ConfusionMatrix::new(n_classes, truth, predicted)?.kappa())
}

/// One-vs-all scores for a single class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassScore {
    /// `None` when the class was never predicted.
    pub precision: Option<f64>,
    /// `None` when the class never occurs in the truth.
    pub recall: Option<f64>,
    /// `None` with `recall`; 0 when the class occurs but is never predicted.
    pub f1: Option<f64>,
}

/// Precision, recall and F1 of every class against the rest.
pub fn class_scores(
    n_classes: usize,
    truth: &[usize],
    predicted: &[usize],
) -> Result<Vec<ClassScore>, MetricsError> {
    check_len(truth.len(), predicted.len())?;
    check_classes(truth, n_classes)?;
    check_classes(predicted, n_classes)?;

    (0..n_classes)
        .map(|k| {
            let truth_k: Array1<bool> = truth.iter().map(|&t| t == k).collect();
            let predicted_k: Array1<bool> = predicted.iter().map(|&p| p == k).collect();
            let occurs = truth_k.iter().any(|&b| b);
            let was_predicted = predicted_k.iter().any(|&b| b);
            if !occurs && !was_predicted {
                return Ok(ClassScore {
                    precision: None,
                    recall: None,
                    f1: None,
                });
            }

            // rows are truth, columns are predictions
            let cm = truth_k.confusion_matrix(&predicted_k).map_err(backend)?;
            let precision = was_predicted.then(|| f64::from(cm.precision()));
            let recall = occurs.then(|| f64::from(cm.recall()));
            let f1 = match (precision, recall) {
                (_, None) => None,
                (None, Some(_)) => Some(0.0),
                (Some(p), Some(r)) if p + r == 0.0 => Some(0.0),
                (Some(_), Some(_)) => Some(f64::from(cm.f1_score())),
            };
            Ok(ClassScore {
                precision,
                recall,
                f1,
            })
        })
        .collect()
}

/// Mean over the defined values only.
fn macro_average(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        f64::NAN
    } else {
        sum / n as f64
    }
}

// ---------------------------------------------------------------------------
// Probability metrics
// ---------------------------------------------------------------------------

/// Mean negative log-likelihood of the true class.
pub fn mn_log_loss(truth: &[usize], probs: &[Vec<f64>]) -> Result<f64, MetricsError> {
    if truth.is_empty() {
        return Err(MetricsError::Empty);
    }
    check_len(truth.len(), probs.len())?;
    let mut total = 0.0;
    for (&t, p) in truth.iter().zip(probs) {
        let pt = p.get(t).copied().ok_or(MetricsError::ClassOutOfRange {
            class: t,
            classes: p.len(),
        })?;
        total -= pt.clamp(LOG_LOSS_EPS, 1.0 - LOG_LOSS_EPS).ln();
    }
    Ok(total / truth.len() as f64)
}

/// Probability that a random `positive` score outranks a random `negative`
/// score, counting ties as half.
fn rank_auc(positive: &[f64], negative: &[f64]) -> f64 {
    if positive.is_empty() || negative.is_empty() {
        return f64::NAN;
    }
    let mut wins = 0.0;
    for &p in positive {
        for &n in negative {
            if p > n {
                wins += 1.0;
            } else if p == n {
                wins += 0.5;
            }
        }
    }
    wins / (positive.len() * negative.len()) as f64
}

/// Hand & Till (2001) multiclass AUC: mean pairwise separability over every
/// pair of classes that occur in `truth`.
pub fn roc_auc_hand_till(
    n_classes: usize,
    truth: &[usize],
    probs: &[Vec<f64>],
) -> Result<f64, MetricsError> {
    if truth.is_empty() {
        return Err(MetricsError::Empty);
    }
    check_len(truth.len(), probs.len())?;
    check_classes(truth, n_classes)?;
    check_probs(probs, n_classes)?;

    let present: Vec<usize> = (0..n_classes).filter(|k| truth.contains(k)).collect();
    let scores_for = |class: usize, score_col: usize| -> Vec<f64> {
        truth
            .iter()
            .zip(probs)
            .filter(|(t, _)| **t == class)
            .map(|(_, p)| p[score_col])
            .collect()
    };

    let mut sum = 0.0;
    let mut pairs = 0;
    for (a_pos, &i) in present.iter().enumerate() {
        for &j in &present[a_pos + 1..] {
            let a_ij = rank_auc(&scores_for(i, i), &scores_for(j, i));
            let a_ji = rank_auc(&scores_for(j, j), &scores_for(i, j));
            sum += (a_ij + a_ji) / 2.0;
            pairs += 1;
        }
    }
    if pairs == 0 {
        return Ok(f64::NAN);
    }
    Ok(sum / pairs as f64)
}

// ---------------------------------------------------------------------------
// Curves
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RocPoint {
    pub threshold: f64,
    pub specificity: f64,
    pub sensitivity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainPoint {
    pub n: usize,
    pub n_events: usize,
    pub percent_tested: f64,
    pub percent_found: f64,
}

/// Distinct scores for `class`, descending, with the positive/total counts
/// of each tie group.
fn score_groups(truth: &[usize], probs: &[Vec<f64>], class: usize) -> Vec<(f64, usize, usize)> {
    let mut scored: Vec<(f64, bool)> = truth
        .iter()
        .zip(probs)
        .map(|(&t, p)| (p[class], t == class))
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut groups: Vec<(f64, usize, usize)> = Vec::new();
    for (score, positive) in scored {
        match groups.last_mut() {
            Some(last) if last.0 == score => {
                last.1 += positive as usize;
                last.2 += 1;
            }
            _ => groups.push((score, positive as usize, 1)),
        }
    }
    groups
}

/// One-vs-all ROC for `class`; `None` when the class has no positives or
/// no negatives in `truth`.
fn one_vs_all_roc(
    truth: &[usize],
    probs: &[Vec<f64>],
    class: usize,
) -> Option<ReceiverOperatingCharacteristic> {
    let positives = truth.iter().filter(|&&t| t == class).count();
    let negatives = truth.len() - positives;
    if positives == 0 || negatives == 0 || probs.iter().any(|p| p.len() <= class) {
        return None;
    }
    let labels: Vec<bool> = truth.iter().map(|&t| t == class).collect();
    let scores: Array1<Pr> = probs
        .iter()
        .map(|p| Pr::new_unchecked(SCORE_OFFSET + p[class] as f32))
        .collect();
    scores.roc(labels.as_slice()).ok()
}

/// linfa sweeps thresholds upward and point `i` counts the rows scored below
/// `thresholds[i]`; flip that into descending (sensitivity, specificity).
fn roc_points(roc: &ReceiverOperatingCharacteristic) -> Vec<RocPoint> {
    let thresholds = roc.get_thresholds();
    roc.get_curve()
        .iter()
        .enumerate()
        .rev()
        .map(|(i, &(tp_below, fp_below))| RocPoint {
            threshold: thresholds
                .get(i)
                .map_or(f64::INFINITY, |&t| f64::from(t - SCORE_OFFSET)),
            specificity: f64::from(fp_below),
            sensitivity: 1.0 - f64::from(tp_below),
        })
        .collect()
}

/// One-vs-all ROC curve for `class`, from (sens 0, spec 1) to (sens 1, spec 0).
///
/// Empty when `truth` has no positives or no negatives for the class.
pub fn roc_curve(truth: &[usize], probs: &[Vec<f64>], class: usize) -> Vec<RocPoint> {
    one_vs_all_roc(truth, probs, class)
        .map(|roc| roc_points(&roc))
        .unwrap_or_default()
}

/// Area under the one-vs-all ROC curve of `class`; `NaN` when undefined.
pub fn class_auc(truth: &[usize], probs: &[Vec<f64>], class: usize) -> f64 {
    one_vs_all_roc(truth, probs, class)
        .map_or(f64::NAN, |roc| f64::from(roc.area_under_curve()))
}

/// Cumulative gain for `class`: share of events captured vs. share of rows
/// examined, highest scores first. Starts at (0, 0), ends at (100, 100).
pub fn gain_curve(truth: &[usize], probs: &[Vec<f64>], class: usize) -> Vec<GainPoint> {
    let events = truth.iter().filter(|&&t| t == class).count();
    if events == 0 || probs.iter().any(|p| p.len() <= class) {
        return Vec::new();
    }
    let total = truth.len();

    let mut curve = vec![GainPoint {
        n: 0,
        n_events: 0,
        percent_tested: 0.0,
        percent_found: 0.0,
    }];
    let (mut n, mut n_events) = (0, 0);
    for (_, pos, count) in score_groups(truth, probs, class) {
        n += count;
        n_events += pos;
        curve.push(GainPoint {
            n,
            n_events,
            percent_tested: 100.0 * n as f64 / total as f64,
            percent_found: 100.0 * n_events as f64 / events as f64,
        });
    }
    curve
}

// ---------------------------------------------------------------------------
// Evaluation bundle
// ---------------------------------------------------------------------------

/// Everything the console report and the viewer show for one model.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub classes: Vec<String>,
    pub confusion: ConfusionMatrix,
    pub accuracy: f64,
    pub kappa: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub mn_log_loss: f64,
    pub roc_auc: f64,
    /// One-vs-all AUC per class (NaN when the class is absent).
    pub class_auc: Vec<f64>,
    pub roc_curves: Vec<Vec<RocPoint>>,
    pub gain_curves: Vec<Vec<GainPoint>>,
}

impl Evaluation {
    /// `(name, value)` pairs in display order.
    pub fn metric_rows(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("accuracy", self.accuracy),
            ("kap", self.kappa),
            ("precision (macro)", self.precision),
            ("recall (macro)", self.recall),
            ("f1 (macro)", self.f1),
            ("mn_log_loss", self.mn_log_loss),
            ("roc_auc (hand_till)", self.roc_auc),
        ]
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in self.metric_rows() {
            writeln!(f, "{name:<20} {value:.4}")?;
        }
        Ok(())
    }
}

/// Compute every metric and curve for one model's test-set predictions.
pub fn evaluate(classes: &[String], predictions: &[Prediction]) -> Result<Evaluation, MetricsError> {
    if predictions.is_empty() {
        return Err(MetricsError::Empty);
    }
    let n_classes = classes.len();
    let truth: Vec<usize> = predictions.iter().map(|p| p.truth).collect();
    let predicted: Vec<usize> = predictions.iter().map(|p| p.predicted).collect();
    let probs: Vec<Vec<f64>> = predictions.iter().map(|p| p.probabilities.clone()).collect();
    check_probs(&probs, n_classes)?;

    let confusion = ConfusionMatrix::new(n_classes, &truth, &predicted)?;
    let scores = class_scores(n_classes, &truth, &predicted)?;
    let rocs: Vec<Option<ReceiverOperatingCharacteristic>> = (0..n_classes)
        .map(|k| one_vs_all_roc(&truth, &probs, k))
        .collect();

    Ok(Evaluation {
        classes: classes.to_vec(),
        accuracy: accuracy(&truth, &predicted)?,
        kappa: confusion.kappa(),
        precision: macro_average(scores.iter().filter_map(|s| s.precision)),
        recall: macro_average(scores.iter().filter_map(|s| s.recall)),
        f1: macro_average(scores.iter().filter_map(|s| s.f1)),
        mn_log_loss: mn_log_loss(&truth, &probs)?,
        roc_auc: roc_auc_hand_till(n_classes, &truth, &probs)?,
        class_auc: rocs
            .iter()
            .map(|r| r.as_ref().map_or(f64::NAN, |r| f64::from(r.area_under_curve())))
            .collect(),
        roc_curves: rocs
            .iter()
            .map(|r| r.as_ref().map(roc_points).unwrap_or_default())
            .collect(),
        gain_curves: (0..n_classes).map(|k| gain_curve(&truth, &probs, k)).collect(),
        confusion,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    /// linfa scores in f32.
    fn close32(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn confusion_accuracy_and_kappa() {
        let truth = [0, 0, 1, 1, 2, 2];
        let pred = [0, 1, 1, 1, 2, 0];
        let cm = ConfusionMatrix::new(3, &truth, &pred).unwrap();
        assert_eq!(cm.counts, vec![vec![1, 1, 0], vec![0, 2, 0], vec![1, 0, 1]]);
        assert_eq!(cm.correct(), 4);
        // pe = (2*2 + 2*3 + 2*1) / 36 = 1/3
        assert!(close(cm.kappa(), (4.0 / 6.0 - 1.0 / 3.0) / (2.0 / 3.0)));
        assert!(close32(accuracy(&truth, &pred).unwrap(), 4.0 / 6.0));
    }

    #[test]
    fn kappa_degenerate_cases() {
        let all_same = ConfusionMatrix::new(2, &[1, 1, 1], &[1, 1, 1]).unwrap();
        assert_eq!(all_same.kappa(), 1.0);
        let perfect = ConfusionMatrix::new(2, &[0, 1, 0, 1], &[0, 1, 0, 1]).unwrap();
        assert!(close(perfect.kappa(), 1.0));
        // predicting one class on a balanced set is chance-level
        let constant = ConfusionMatrix::new(2, &[0, 1, 0, 1], &[0, 0, 0, 0]).unwrap();
        assert!(close(constant.kappa(), 0.0));
    }

    #[test]
    fn per_class_scores_follow_one_vs_all_counts() {
        let scores = class_scores(3, &[0, 0, 1, 1], &[0, 0, 0, 1]).unwrap();
        assert!(close32(scores[0].precision.unwrap(), 2.0 / 3.0));
        assert!(close32(scores[0].recall.unwrap(), 1.0));
        assert!(close32(scores[0].f1.unwrap(), 0.8));
        assert!(close32(scores[1].precision.unwrap(), 1.0));
        assert!(close32(scores[1].recall.unwrap(), 0.5));
        assert!(close32(scores[1].f1.unwrap(), 2.0 / 3.0));
        // class 2 neither occurs nor is predicted
        assert_eq!(
            scores[2],
            ClassScore {
                precision: None,
                recall: None,
                f1: None
            }
        );
    }

    #[test]
    fn never_predicted_class_scores_zero_f1() {
        let scores = class_scores(2, &[0, 1, 1], &[0, 0, 0]).unwrap();
        assert_eq!(scores[1].precision, None);
        assert!(close32(scores[1].recall.unwrap(), 0.0));
        assert_eq!(scores[1].f1, Some(0.0));
        // every row true and predicted for the same class
        let single = class_scores(2, &[1, 1], &[1, 1]).unwrap();
        assert!(close32(single[1].precision.unwrap(), 1.0));
        assert!(close32(single[1].f1.unwrap(), 1.0));
    }

    #[test]
    fn macro_averages_skip_undefined_classes() {
        let predictions: Vec<Prediction> = [(0, 0), (0, 0), (1, 0), (1, 1)]
            .iter()
            .enumerate()
            .map(|(id, &(truth, predicted))| Prediction {
                id,
                truth,
                predicted,
                probabilities: {
                    let mut p = vec![0.0; 3];
                    p[predicted] = 1.0;
                    p
                },
            })
            .collect();
        let classes = ["a", "b", "c"].map(String::from).to_vec();
        let eval = evaluate(&classes, &predictions).unwrap();
        assert!(close32(eval.accuracy, 0.75));
        assert!(close32(eval.precision, (2.0 / 3.0 + 1.0) / 2.0));
        assert!(close32(eval.recall, (1.0 + 0.5) / 2.0));
        assert!(close32(eval.f1, (0.8 + 2.0 / 3.0) / 2.0));
        assert!(eval.class_auc[2].is_nan());
        assert!(eval.roc_curves[2].is_empty());
    }

    #[test]
    fn log_loss_clamps_zero_probabilities() {
        let loss = mn_log_loss(&[0, 1], &[vec![1.0, 0.0], vec![1.0, 0.0]]).unwrap();
        assert!(close(loss, -(LOG_LOSS_EPS.ln()) / 2.0));
        let perfect = mn_log_loss(&[0], &[vec![1.0, 0.0]]).unwrap();
        assert!(perfect < 1e-12);
    }

    #[test]
    fn roc_endpoints_and_perfect_auc() {
        let truth = [0, 0, 1, 1];
        let probs = vec![
            vec![0.9, 0.1],
            vec![0.8, 0.2],
            vec![0.3, 0.7],
            vec![0.1, 0.9],
        ];
        let curve = roc_curve(&truth, &probs, 1);
        let first = curve.first().unwrap();
        let last = curve.last().unwrap();
        assert_eq!((first.sensitivity, first.specificity), (0.0, 1.0));
        assert_eq!((last.sensitivity, last.specificity), (1.0, 0.0));
        assert_eq!(first.threshold, f64::INFINITY);
        assert!(close32(curve[1].threshold, 0.9));
        assert!(close32(class_auc(&truth, &probs, 1), 1.0));
        assert!(close(roc_auc_hand_till(2, &truth, &probs).unwrap(), 1.0));
    }

    #[test]
    fn tied_scores_form_one_roc_step() {
        let truth = [0, 1];
        let probs = vec![vec![0.5, 0.5], vec![0.5, 0.5]];
        let curve = roc_curve(&truth, &probs, 1);
        assert_eq!(curve.len(), 2);
        assert!(close32(class_auc(&truth, &probs, 1), 0.5));
        assert!(close(roc_auc_hand_till(2, &truth, &probs).unwrap(), 0.5));
    }

    #[test]
    fn zero_scored_positives_still_count() {
        // one positive scored 0.0 below a negative at 0.2
        let truth = [1, 0, 1];
        let probs = vec![vec![1.0, 0.0], vec![0.8, 0.2], vec![0.1, 0.9]];
        let curve = roc_curve(&truth, &probs, 1);
        assert_eq!(curve.len(), 4);
        let last = curve.last().unwrap();
        assert_eq!((last.sensitivity, last.specificity), (1.0, 0.0));
        // pairs (0.9 > 0.2) and (0.0 < 0.2): half the pairs are ordered
        assert!(close32(class_auc(&truth, &probs, 1), 0.5));
    }

    #[test]
    fn hand_till_averages_class_pairs() {
        // class 2 is perfectly separated, classes 0/1 are swapped
        let truth = [0, 1, 2];
        let probs = vec![
            vec![0.2, 0.7, 0.1],
            vec![0.7, 0.2, 0.1],
            vec![0.1, 0.1, 0.8],
        ];
        let auc = roc_auc_hand_till(3, &truth, &probs).unwrap();
        assert!(close(auc, (0.0 + 1.0 + 1.0) / 3.0));
    }

    #[test]
    fn gain_curve_runs_corner_to_corner() {
        let truth = [1, 0, 1, 0];
        let probs = vec![
            vec![0.1, 0.9],
            vec![0.4, 0.6],
            vec![0.5, 0.5],
            vec![0.8, 0.2],
        ];
        let curve = gain_curve(&truth, &probs, 1);
        assert_eq!(curve.len(), 5);
        assert_eq!(curve[0].percent_found, 0.0);
        assert!(close(curve[1].percent_tested, 25.0));
        assert!(close(curve[1].percent_found, 50.0));
        let last = curve.last().unwrap();
        assert!(close(last.percent_tested, 100.0) && close(last.percent_found, 100.0));
        assert!(gain_curve(&[0, 0], &[vec![1.0, 0.0], vec![1.0, 0.0]], 1).is_empty());
    }

    #[test]
    fn evaluate_rejects_bad_input() {
        let classes = vec!["a".to_string(), "b".to_string()];
        assert_eq!(evaluate(&classes, &[]), Err(MetricsError::Empty));
        let wrong_width = vec![Prediction {
            id: 0,
            truth: 0,
            predicted: 0,
            probabilities: vec![1.0],
        }];
        assert!(matches!(
            evaluate(&classes, &wrong_width),
            Err(MetricsError::ProbabilityWidth { row: 0, .. })
        ));
        assert!(matches!(
            accuracy(&[0, 1], &[0]),
            Err(MetricsError::LengthMismatch { truth: 2, other: 1 })
        ));
    }
}
