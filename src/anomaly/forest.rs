//! Isolation forest outlier model.
//!
//! Each tree isolates points by recursive random splits on a random
//! subsample; outliers end up on short paths. Scores follow the usual
//! convention of `score_samples`: the negated anomaly score, so lower means
//! more anomalous. A point is labelled an outlier when its score falls
//! below the `contamination` quantile of the training scores.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Euler-Mascheroni constant.
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Forest hyperparameters.
#[derive(Debug, Clone)]
pub struct ForestParams {
    pub n_trees: usize,
    /// Upper bound on the per-tree subsample
    pub max_samples: usize,
    /// Expected share of outliers in the training data
    pub contamination: f64,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_samples: 256,
            contamination: 0.1,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
    Leaf {
        size: usize,
    },
}

#[derive(Debug, Clone)]
struct Tree {
    root: Node,
}

impl Tree {
    fn build(rows: &[&[f64]], max_depth: usize, rng: &mut StdRng) -> Self {
        Self {
            root: build_node(rows, 0, max_depth, rng),
        }
    }

    fn path_length(&self, x: &[f64]) -> f64 {
        let mut node = &self.root;
        let mut depth = 0.0;
        loop {
            match node {
                Node::Leaf { size } => return depth + average_path_length(*size),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if x[*feature] <= *threshold { left } else { right };
                    depth += 1.0;
                }
            }
        }
    }
}

fn build_node(rows: &[&[f64]], depth: usize, max_depth: usize, rng: &mut StdRng) -> Node {
    if rows.len() <= 1 || depth >= max_depth {
        return Node::Leaf { size: rows.len() };
    }

    let width = rows[0].len();
    let mut features: Vec<usize> = (0..width).collect();
    features.shuffle(rng);

    // First feature, in random order, that still varies inside this node
    let split = features.into_iter().find_map(|feature| {
        let (min, max) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), r| {
            (lo.min(r[feature]), hi.max(r[feature]))
        });
        (max > min).then_some((feature, min, max))
    });

    let Some((feature, min, max)) = split else {
        return Node::Leaf { size: rows.len() };
    };

    // Threshold in [min, max): both sides keep at least one row
    let threshold = rng.gen_range(min..max);
    let (left, right): (Vec<&[f64]>, Vec<&[f64]>) =
        rows.iter().partition(|r| r[feature] <= threshold);

    Node::Split {
        feature,
        threshold,
        left: Box::new(build_node(&left, depth + 1, max_depth, rng)),
        right: Box::new(build_node(&right, depth + 1, max_depth, rng)),
    }
}

/// Average path length of an unsuccessful BST search over `n` points.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        n => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Linear-interpolated percentile (`q` in 0-100) of unsorted values.
fn percentile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (q / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

/// A fitted isolation forest.
#[derive(Debug, Clone)]
pub struct IsolationForest {
    trees: Vec<Tree>,
    /// Normalizer for path lengths, from the subsample size
    c_n: f64,
    /// Decision threshold on `score`
    offset: f64,
    width: usize,
}

impl IsolationForest {
    /// Fit on `rows`. Returns `None` when there are fewer than two rows or
    /// the rows are ragged.
    pub fn fit(rows: &[Vec<f64>], params: &ForestParams) -> Option<Self> {
        let width = rows.first()?.len();
        if rows.len() < 2 || rows.iter().any(|r| r.len() != width) {
            return None;
        }

        let mut rng = StdRng::seed_from_u64(params.seed);
        let sample_size = params.max_samples.max(2).min(rows.len());
        let max_depth = (sample_size as f64).log2().ceil() as usize;
        let all: Vec<&[f64]> = rows.iter().map(|r| r.as_slice()).collect();

        let trees = (0..params.n_trees.max(1))
            .map(|_| {
                let subsample: Vec<&[f64]> =
                    all.choose_multiple(&mut rng, sample_size).copied().collect();
                Tree::build(&subsample, max_depth, &mut rng)
            })
            .collect();

        let mut forest = Self {
            trees,
            c_n: average_path_length(sample_size),
            offset: 0.0,
            width,
        };

        let training_scores: Vec<f64> = rows.iter().map(|r| forest.score(r)).collect();
        forest.offset = percentile(&training_scores, params.contamination * 100.0);
        Some(forest)
    }

    /// Negated anomaly score in [-1, 0); lower is more anomalous.
    pub fn score(&self, x: &[f64]) -> f64 {
        let mean_path =
            self.trees.iter().map(|t| t.path_length(x)).sum::<f64>() / self.trees.len() as f64;
        let c_n = if self.c_n > 0.0 { self.c_n } else { 1.0 };
        -(2f64.powf(-mean_path / c_n))
    }

    /// Whether `x` scores below the training contamination threshold.
    pub fn is_outlier(&self, x: &[f64]) -> bool {
        self.score(x) < self.offset
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn width(&self) -> usize {
        self.width
    }
}
