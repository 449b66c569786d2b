//! 決定木アンサンブル（ランダムフォレスト）分類器
//!
//! - 分割基準: ジニ不純度
//! - 各木はブートストラップ標本で学習し、各ノードで `max_features` 個以上の
//!   特徴量を無作為に調べて最良の分割を選ぶ
//! - 予測は各木の葉のクラス確率を平均し、最大のクラスを返す（同率は小さいコード）
//!
//! 木はノード配列で表現し、子はノード添字で参照します。

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::types::PredictionError;

/// 学習パラメータ
#[derive(Debug, Clone)]
pub struct ForestParams {
    /// 決定木の本数
    pub num_trees: usize,
    /// 最大深さ（None で無制限）
    pub max_depth: Option<usize>,
    /// 分割に必要な最小サンプル数
    pub min_samples_split: usize,
    /// 各分割で調べる特徴量数（None で floor(sqrt(特徴量数))）
    pub max_features: Option<usize>,
    /// ブートストラップ標本を使うか
    pub bootstrap: bool,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            num_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            max_features: None,
            bootstrap: true,
        }
    }
}

/// 木のノード
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    /// `features[feature] <= threshold` なら左、それ以外は右
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// クラスごとの確率
    Leaf { distribution: Vec<f64> },
}

/// 決定木1本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// 葉に到達するまでたどり、そのクラス分布を返す
    fn leaf_distribution(&self, features: &[f64]) -> &[f64] {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                Node::Leaf { distribution } => return distribution,
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        fn depth_of(nodes: &[Node], index: usize) -> usize {
            match &nodes[index] {
                Node::Split { left, right, .. } => {
                    1 + depth_of(nodes, *left).max(depth_of(nodes, *right))
                }
                Node::Leaf { .. } => 0,
            }
        }
        depth_of(&self.nodes, 0)
    }
}

/// ランダムフォレスト分類器
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    num_features: usize,
    num_classes: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// 学習
    ///
    /// `x` は各サンプルの特徴量、`y` はクラスコード（0..num_classes）
    pub fn fit(
        x: &[Vec<f64>],
        y: &[usize],
        num_classes: usize,
        params: &ForestParams,
        seed: u64,
    ) -> anyhow::Result<Self> {
        if x.is_empty() {
            anyhow::bail!("学習サンプルがありません");
        }
        if x.len() != y.len() {
            anyhow::bail!("特徴量とラベルの件数が一致しません: {} != {}", x.len(), y.len());
        }
        if params.num_trees == 0 {
            anyhow::bail!("決定木の本数は1以上が必要です");
        }

        let num_features = x[0].len();
        if num_features == 0 {
            anyhow::bail!("特徴量が空です");
        }
        if let Some(row) = x.iter().position(|row| row.len() != num_features) {
            anyhow::bail!("サンプル {} の特徴量数が不正です", row);
        }
        if let Some(&label) = y.iter().find(|&&label| label >= num_classes) {
            anyhow::bail!("クラスコード {} が範囲外です (クラス数 {})", label, num_classes);
        }

        let max_features = params
            .max_features
            .unwrap_or_else(|| (num_features as f64).sqrt().floor() as usize)
            .clamp(1, num_features);

        let mut master_rng = StdRng::seed_from_u64(seed);
        let mut trees = Vec::with_capacity(params.num_trees);

        for _ in 0..params.num_trees {
            let mut rng = StdRng::seed_from_u64(master_rng.gen());

            let samples: Vec<usize> = if params.bootstrap {
                (0..x.len()).map(|_| rng.gen_range(0..x.len())).collect()
            } else {
                (0..x.len()).collect()
            };

            let mut builder = TreeBuilder {
                x,
                y,
                num_classes,
                max_features,
                params,
                rng: &mut rng,
                nodes: Vec::new(),
            };
            builder.build(samples, 0);
            trees.push(DecisionTree {
                nodes: builder.nodes,
            });
        }

        Ok(Self {
            num_features,
            num_classes,
            trees,
        })
    }

    pub fn num_features(&self) -> usize {
        self.num_features
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// クラスごとの平均確率
    pub fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, PredictionError> {
        if features.len() != self.num_features {
            return Err(PredictionError::FeatureCount {
                expected: self.num_features,
                actual: features.len(),
            });
        }

        let mut proba = vec![0.0; self.num_classes];
        for tree in &self.trees {
            for (p, q) in proba.iter_mut().zip(tree.leaf_distribution(features)) {
                *p += q;
            }
        }
        let n = self.trees.len() as f64;
        for p in proba.iter_mut() {
            *p /= n;
        }

        Ok(proba)
    }

    /// 最も確率の高いクラスコード
    pub fn predict(&self, features: &[f64]) -> Result<usize, PredictionError> {
        let proba = self.predict_proba(features)?;
        let mut best = 0;
        for (code, p) in proba.iter().enumerate() {
            if *p > proba[best] {
                best = code;
            }
        }
        Ok(best)
    }

    /// 正解率
    pub fn accuracy(&self, x: &[Vec<f64>], y: &[usize]) -> Result<f64, PredictionError> {
        if x.is_empty() {
            return Ok(0.0);
        }
        let mut correct = 0;
        for (features, &label) in x.iter().zip(y) {
            if self.predict(features)? == label {
                correct += 1;
            }
        }
        Ok(correct as f64 / x.len() as f64)
    }

    pub fn to_json_bytes(&self) -> anyhow::Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// JSONから復元し、構造を検証する
    pub fn from_json_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let forest: Self = serde_json::from_slice(bytes)?;
        forest.validate()?;
        Ok(forest)
    }

    /// 添字や分布の長さが壊れていないか確認（推論時のパニック防止）
    fn validate(&self) -> anyhow::Result<()> {
        if self.trees.is_empty() {
            anyhow::bail!("決定木が1本もありません");
        }
        for (t, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                anyhow::bail!("決定木 {} にノードがありません", t);
            }
            for (i, node) in tree.nodes.iter().enumerate() {
                match node {
                    Node::Split {
                        feature,
                        left,
                        right,
                        ..
                    } => {
                        // 子は常に親より後ろに置かれるので、後方参照なら循環しない
                        if *feature >= self.num_features
                            || *left <= i
                            || *right <= i
                            || *left >= tree.nodes.len()
                            || *right >= tree.nodes.len()
                        {
                            anyhow::bail!("決定木 {} のノード {} が不正です", t, i);
                        }
                    }
                    Node::Leaf { distribution } => {
                        if distribution.len() != self.num_classes {
                            anyhow::bail!("決定木 {} の葉 {} のクラス数が不正です", t, i);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// 1本の木を再帰的に構築する
struct TreeBuilder<'a> {
    x: &'a [Vec<f64>],
    y: &'a [usize],
    num_classes: usize,
    max_features: usize,
    params: &'a ForestParams,
    rng: &'a mut StdRng,
    nodes: Vec<Node>,
}

/// 分割候補
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

impl TreeBuilder<'_> {
    /// `samples` からノードを作り、その添字を返す
    fn build(&mut self, samples: Vec<usize>, depth: usize) -> usize {
        let counts = self.class_counts(&samples);
        let is_pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let depth_reached = self.params.max_depth.map_or(false, |max| depth >= max);

        let split = if is_pure || depth_reached || samples.len() < self.params.min_samples_split {
            None
        } else {
            self.best_split(&samples, &counts)
        };

        let Some(split) = split else {
            return self.push_leaf(&counts, samples.len());
        };

        // 子より先に親の位置を確保する
        let index = self.nodes.len();
        self.nodes.push(Node::Leaf {
            distribution: Vec::new(),
        });

        let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&s| self.x[s][split.feature] <= split.threshold);

        let left = self.build(left_samples, depth + 1);
        let right = self.build(right_samples, depth + 1);

        self.nodes[index] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        index
    }

    fn push_leaf(&mut self, counts: &[usize], total: usize) -> usize {
        let distribution = counts
            .iter()
            .map(|&c| c as f64 / total as f64)
            .collect();
        self.nodes.push(Node::Leaf { distribution });
        self.nodes.len() - 1
    }

    fn class_counts(&self, samples: &[usize]) -> Vec<usize> {
        let mut counts = vec![0; self.num_classes];
        for &s in samples {
            counts[self.y[s]] += 1;
        }
        counts
    }

    /// 特徴量を無作為な順に調べ、`max_features` 個以上調べて
    /// 有効な分割が見つかった時点で打ち切る
    fn best_split(&mut self, samples: &[usize], parent_counts: &[usize]) -> Option<SplitCandidate> {
        let num_features = self.x[0].len();
        let mut features: Vec<usize> = (0..num_features).collect();
        features.shuffle(&mut *self.rng);

        let parent_impurity = gini(parent_counts, samples.len());
        let mut best: Option<SplitCandidate> = None;

        for (visited, &feature) in features.iter().enumerate() {
            if visited >= self.max_features && best.is_some() {
                break;
            }
            if let Some(candidate) = self.best_split_on(samples, feature) {
                let improves = candidate.impurity < parent_impurity;
                let better = best
                    .as_ref()
                    .map_or(true, |b| candidate.impurity < b.impurity);
                if improves && better {
                    best = Some(candidate);
                }
            }
        }

        best
    }

    /// 1つの特徴量での最良閾値（隣接する異なる値の中点）
    fn best_split_on(&self, samples: &[usize], feature: usize) -> Option<SplitCandidate> {
        let mut sorted: Vec<(f64, usize)> = samples
            .iter()
            .map(|&s| (self.x[s][feature], self.y[s]))
            .collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        let total = sorted.len();
        if total < 2 {
            return None;
        }
        let mut left_counts = vec![0usize; self.num_classes];
        let mut right_counts = vec![0usize; self.num_classes];
        for &(_, label) in &sorted {
            right_counts[label] += 1;
        }

        let mut best: Option<SplitCandidate> = None;
        for i in 0..total - 1 {
            let (value, label) = sorted[i];
            left_counts[label] += 1;
            right_counts[label] -= 1;

            let next_value = sorted[i + 1].0;
            if value == next_value {
                continue;
            }

            let n_left = i + 1;
            let n_right = total - n_left;
            let impurity = (n_left as f64 * gini(&left_counts, n_left)
                + n_right as f64 * gini(&right_counts, n_right))
                / total as f64;

            if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                best = Some(SplitCandidate {
                    feature,
                    threshold: (value + next_value) / 2.0,
                    impurity,
                });
            }
        }

        best
    }
}

/// ジニ不純度
fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}
