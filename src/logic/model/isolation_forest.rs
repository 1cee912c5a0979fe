//! Isolation Forest - unsupervised outlier scoring
//!
//! Fitted from scratch on each snapshot and dropped afterwards. Points that
//! random axis-aligned splits isolate in few steps score close to 1.

use ndarray::{Array2, ArrayView1};
use rand::seq::index;
use rand::Rng;

use crate::logic::error::DetectionError;

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        value: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

#[derive(Debug, Clone)]
struct IsolationTree {
    root: Node,
}

impl IsolationTree {
    fn grow<R: Rng>(data: &Array2<f64>, rows: &[usize], height_limit: usize, rng: &mut R) -> Self {
        Self {
            root: grow_node(data, rows, 0, height_limit, rng),
        }
    }

    fn path_length(&self, point: ArrayView1<f64>) -> f64 {
        let mut node = &self.root;
        let mut depth = 0.0;

        loop {
            match node {
                Node::Leaf { size } => return depth + average_path_length(*size),
                Node::Split { feature, value, left, right } => {
                    node = if point[*feature] < *value { left } else { right };
                    depth += 1.0;
                }
            }
        }
    }
}

/// Ensemble of isolation trees
#[derive(Debug, Clone)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    sample_size: usize,
}

impl IsolationForest {
    /// Fit `n_trees` trees, each on `min(sample_size, rows)` rows drawn
    /// without replacement. Needs at least two rows.
    pub fn fit<R: Rng>(
        data: &Array2<f64>,
        n_trees: usize,
        sample_size: usize,
        rng: &mut R,
    ) -> Result<Self, DetectionError> {
        let rows = data.nrows();
        if rows < 2 {
            return Err(DetectionError::Model(format!(
                "cannot fit on {} row(s), need at least 2",
                rows
            )));
        }
        if n_trees == 0 {
            return Err(DetectionError::Model("forest needs at least one tree".to_string()));
        }

        let sample_size = sample_size.clamp(2, rows);
        let height_limit = (sample_size as f64).log2().ceil() as usize;

        let trees = (0..n_trees)
            .map(|_| {
                let sample = index::sample(rng, rows, sample_size).into_vec();
                IsolationTree::grow(data, &sample, height_limit, rng)
            })
            .collect();

        Ok(Self { trees, sample_size })
    }

    /// Anomaly score in (0, 1]: `2^(-E[h(x)] / c(sample_size))`
    pub fn score(&self, point: ArrayView1<f64>) -> f64 {
        let mean_path = self.trees.iter().map(|t| t.path_length(point)).sum::<f64>()
            / self.trees.len() as f64;

        2f64.powf(-mean_path / average_path_length(self.sample_size))
    }

    /// Score every row of `data`
    pub fn score_samples(&self, data: &Array2<f64>) -> Vec<f64> {
        data.rows().into_iter().map(|row| self.score(row)).collect()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

fn grow_node<R: Rng>(
    data: &Array2<f64>,
    rows: &[usize],
    depth: usize,
    height_limit: usize,
    rng: &mut R,
) -> Node {
    if depth >= height_limit || rows.len() <= 1 {
        return Node::Leaf { size: rows.len() };
    }

    // Only features that still vary inside this node can split it, and only
    // over a span that fits in an f64
    let candidates: Vec<(usize, f64, f64)> = (0..data.ncols())
        .filter_map(|feature| {
            let (lo, hi) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
                let v = data[[r, feature]];
                (lo.min(v), hi.max(v))
            });
            (hi > lo && (hi - lo).is_finite()).then_some((feature, lo, hi))
        })
        .collect();

    if candidates.is_empty() {
        return Node::Leaf { size: rows.len() };
    }

    let (feature, lo, hi) = candidates[rng.gen_range(0..candidates.len())];
    let value = rng.gen_range(lo..hi);

    let (left, right): (Vec<usize>, Vec<usize>) =
        rows.iter().copied().partition(|&r| data[[r, feature]] < value);

    Node::Split {
        feature,
        value,
        left: Box::new(grow_node(data, &left, depth + 1, height_limit, rng)),
        right: Box::new(grow_node(data, &right, depth + 1, height_limit, rng)),
    }
}

/// Average path length of an unsuccessful BST search over `n` points
pub(crate) fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}
