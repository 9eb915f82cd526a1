//! Gradient-boosted regression trees on squared loss
//!
//! Trees are grown best-first on second-order gain. A depth cap with no
//! leaf cap grows trees level by level in effect; a leaf cap with no depth
//! cap grows them leaf by leaf.

#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeParams {
    pub max_depth: Option<usize>,
    pub max_leaves: Option<usize>,
    pub min_samples_leaf: usize,
    /// L2 penalty on leaf weights
    pub lambda: f64,
    pub min_split_gain: f64,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct BoostingParams {
    pub rounds: usize,
    pub learning_rate: f64,
    pub tree: TreeParams,
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct RegressionTree {
    nodes: Vec<Node>,
}

struct SplitChoice {
    feature: usize,
    threshold: f64,
    gain: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

struct OpenLeaf {
    node: usize,
    depth: usize,
    split: Option<SplitChoice>,
}

fn leaf_weight(indices: &[usize], gradients: &[f64], hessians: &[f64], lambda: f64) -> f64 {
    let g: f64 = indices.iter().map(|&i| gradients[i]).sum();
    let h: f64 = indices.iter().map(|&i| hessians[i]).sum();
    if h + lambda <= 0.0 {
        0.0
    } else {
        -g / (h + lambda)
    }
}

fn score(g: f64, h: f64, lambda: f64) -> f64 {
    if h + lambda <= 0.0 {
        0.0
    } else {
        g * g / (h + lambda)
    }
}

fn best_split(
    rows: &[Vec<f64>],
    indices: &[usize],
    gradients: &[f64],
    hessians: &[f64],
    params: &TreeParams,
) -> Option<SplitChoice> {
    let min_leaf = params.min_samples_leaf.max(1);
    if indices.len() < 2 * min_leaf {
        return None;
    }

    let g_total: f64 = indices.iter().map(|&i| gradients[i]).sum();
    let h_total: f64 = indices.iter().map(|&i| hessians[i]).sum();
    let parent = score(g_total, h_total, params.lambda);
    let features = rows.get(indices[0]).map_or(0, |r| r.len());

    let mut best: Option<(usize, f64, f64)> = None;
    let mut sorted = indices.to_vec();

    for feature in 0..features {
        sorted.sort_by(|&a, &b| rows[a][feature].total_cmp(&rows[b][feature]));

        let mut g_left = 0.0;
        let mut h_left = 0.0;
        for pos in 0..sorted.len() - 1 {
            let i = sorted[pos];
            g_left += gradients[i];
            h_left += hessians[i];

            let left_count = pos + 1;
            let right_count = sorted.len() - left_count;
            if left_count < min_leaf || right_count < min_leaf {
                continue;
            }

            let here = rows[i][feature];
            let next = rows[sorted[pos + 1]][feature];
            if next <= here {
                continue;
            }

            let gain = 0.5
                * (score(g_left, h_left, params.lambda)
                    + score(g_total - g_left, h_total - h_left, params.lambda)
                    - parent);

            if gain > params.min_split_gain && best.map_or(true, |(_, _, g)| gain > g) {
                best = Some((feature, (here + next) / 2.0, gain));
            }
        }
    }

    best.map(|(feature, threshold, gain)| {
        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| rows[i][feature] <= threshold);
        SplitChoice {
            feature,
            threshold,
            gain,
            left,
            right,
        }
    })
}

impl RegressionTree {
    pub(crate) fn fit(
        rows: &[Vec<f64>],
        gradients: &[f64],
        hessians: &[f64],
        params: &TreeParams,
    ) -> Self {
        let all: Vec<usize> = (0..rows.len()).collect();
        let mut nodes = vec![Node::Leaf {
            value: leaf_weight(&all, gradients, hessians, params.lambda),
        }];

        let open_leaf = |node: usize, indices: Vec<usize>, depth: usize| {
            let depth_left = params.max_depth.map_or(true, |max| depth < max);
            let split = if depth_left {
                best_split(rows, &indices, gradients, hessians, params)
            } else {
                None
            };
            OpenLeaf { node, depth, split }
        };

        let mut open = vec![open_leaf(0, all, 0)];
        let mut leaves = 1;

        loop {
            if params.max_leaves.map_or(false, |max| leaves >= max) {
                break;
            }

            let best = open
                .iter()
                .enumerate()
                .filter_map(|(pos, leaf)| leaf.split.as_ref().map(|s| (pos, s.gain)))
                .max_by(|a, b| a.1.total_cmp(&b.1));

            let Some((pos, _)) = best else {
                break;
            };

            let leaf = open.swap_remove(pos);
            let Some(split) = leaf.split else {
                continue;
            };

            let left = nodes.len();
            nodes.push(Node::Leaf {
                value: leaf_weight(&split.left, gradients, hessians, params.lambda),
            });
            let right = nodes.len();
            nodes.push(Node::Leaf {
                value: leaf_weight(&split.right, gradients, hessians, params.lambda),
            });
            nodes[leaf.node] = Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
            };
            leaves += 1;

            open.push(open_leaf(left, split.left, leaf.depth + 1));
            open.push(open_leaf(right, split.right, leaf.depth + 1));
        }

        Self { nodes }
    }

    pub(crate) fn predict(&self, row: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let x = row.get(*feature).copied().unwrap_or(0.0);
                    index = if x <= *threshold { *left } else { *right };
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }
}

/// Additive ensemble of shrunken trees starting from the target mean
#[derive(Debug, Clone)]
pub(crate) struct BoostedEnsemble {
    base: f64,
    learning_rate: f64,
    trees: Vec<RegressionTree>,
}

impl BoostedEnsemble {
    pub(crate) fn fit(rows: &[Vec<f64>], targets: &[f64], params: &BoostingParams) -> Self {
        let base = if targets.is_empty() {
            0.0
        } else {
            targets.iter().sum::<f64>() / targets.len() as f64
        };

        let mut predictions = vec![base; targets.len()];
        let hessians = vec![1.0; targets.len()];
        let mut trees = Vec::with_capacity(params.rounds);

        for _ in 0..params.rounds {
            let gradients: Vec<f64> = predictions
                .iter()
                .zip(targets)
                .map(|(p, y)| p - y)
                .collect();

            let tree = RegressionTree::fit(rows, &gradients, &hessians, &params.tree);
            for (prediction, row) in predictions.iter_mut().zip(rows) {
                *prediction += params.learning_rate * tree.predict(row);
            }
            trees.push(tree);
        }

        Self {
            base,
            learning_rate: params.learning_rate,
            trees,
        }
    }

    pub(crate) fn predict(&self, row: &[f64]) -> f64 {
        self.base
            + self.learning_rate * self.trees.iter().map(|t| t.predict(row)).sum::<f64>()
    }

    #[cfg(test)]
    pub(crate) fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }
}
