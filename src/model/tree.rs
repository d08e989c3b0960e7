//! Isolation Tree - one estimator of the ensemble
//!
//! Recursively partitions the feature space with uniformly random splits;
//! samples isolated in fewer splits are more anomalous. Depth is capped by
//! the forest, and partitions left unresolved at the cap are credited with
//! the expected path length of their residual population.

use rand::rngs::StdRng;
use rand::Rng;

use crate::features::{FeatureVector, FEATURE_COUNT};

/// Euler-Mascheroni constant for the expected-path-length formula.
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

// ============================================================================
// TREE
// ============================================================================

enum Node {
    Split {
        feature: usize,
        value: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
    Leaf {
        size: usize,
    },
}

pub struct IsolationTree {
    root: Node,
}

impl IsolationTree {
    /// Grow a tree over the samples selected by `indices`.
    pub fn fit(
        samples: &[FeatureVector],
        indices: Vec<usize>,
        max_depth: usize,
        rng: &mut StdRng,
    ) -> Self {
        Self {
            root: grow(samples, indices, 0, max_depth, rng),
        }
    }

    /// Number of splits crossed to reach the sample's partition, plus the
    /// expected remainder for partitions that never fully resolved.
    pub fn path_length(&self, sample: &FeatureVector) -> f64 {
        let mut node = &self.root;
        let mut depth = 0.0;
        loop {
            match node {
                Node::Leaf { size } => return depth + average_path_length(*size),
                Node::Split {
                    feature,
                    value,
                    left,
                    right,
                } => {
                    depth += 1.0;
                    node = if sample.values[*feature] < *value {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

fn grow(
    samples: &[FeatureVector],
    indices: Vec<usize>,
    depth: usize,
    max_depth: usize,
    rng: &mut StdRng,
) -> Node {
    if indices.len() <= 1 || depth >= max_depth {
        return Node::Leaf {
            size: indices.len(),
        };
    }

    // Features that still have spread within this partition
    let mut splittable: Vec<(usize, f64, f64)> = Vec::new();
    for feature in 0..FEATURE_COUNT {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &i in &indices {
            let v = samples[i].values[feature];
            min = min.min(v);
            max = max.max(v);
        }
        if max > min {
            splittable.push((feature, min, max));
        }
    }

    // Identical samples cannot be separated any further
    if splittable.is_empty() {
        return Node::Leaf {
            size: indices.len(),
        };
    }

    let (feature, min, max) = splittable[rng.gen_range(0..splittable.len())];
    let value = rng.gen_range(min..max);

    let (left, right): (Vec<usize>, Vec<usize>) = indices
        .into_iter()
        .partition(|&i| samples[i].values[feature] < value);

    Node::Split {
        feature,
        value,
        left: Box::new(grow(samples, left, depth + 1, max_depth, rng)),
        right: Box::new(grow(samples, right, depth + 1, max_depth, rng)),
    }
}

/// Expected path length c(n) of an unsuccessful search in a binary search
/// tree over n samples; 0 for n ≤ 1, 1 for n = 2.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
