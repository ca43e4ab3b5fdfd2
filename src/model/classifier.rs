use crate::domain::ports::Classifier;
use crate::utils::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn logit(p: f64) -> f64 {
    let p = p.clamp(1e-12, 1.0 - 1e-12);
    (p / (1.0 - p)).ln()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        /// NaN 特徵值的走向
        #[serde(default = "default_true")]
        default_left: bool,
    },
    Leaf {
        leaf: f64,
    },
}

fn default_true() -> bool {
    true
}

/// 迴歸樹，節點 0 為根
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    fn check(&self, n_features: Option<usize>) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(AnalysisError::model("Tree has no nodes"));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                // 子節點必須在後面，保證沒有環
                if *left <= i || *right <= i || *left >= self.nodes.len() || *right >= self.nodes.len() {
                    return Err(AnalysisError::model(format!(
                        "Node {} has invalid children {} / {}",
                        i, left, right
                    )));
                }
                if let Some(n) = n_features {
                    if *feature >= n {
                        return Err(AnalysisError::model(format!(
                            "Node {} uses feature {} but the model has {} features",
                            i, feature, n
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn max_feature(&self) -> Option<usize> {
        self.nodes
            .iter()
            .filter_map(|node| match node {
                TreeNode::Split { feature, .. } => Some(*feature),
                TreeNode::Leaf { .. } => None,
            })
            .max()
    }

    pub fn predict(&self, features: &[f64]) -> Result<f64> {
        let mut index = 0;
        loop {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { leaf }) => return Ok(*leaf),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    default_left,
                }) => {
                    let value = *features.get(*feature).ok_or(AnalysisError::FeatureMismatch {
                        expected: feature + 1,
                        found: features.len(),
                    })?;
                    let go_left = if value.is_nan() {
                        *default_left
                    } else {
                        value < *threshold
                    };
                    index = if go_left { *left } else { *right };
                }
                None => {
                    return Err(AnalysisError::model(format!(
                        "Tree references missing node {}",
                        index
                    )))
                }
            }
        }
    }
}

/// 可序列化的分類器參數
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClassifierModel {
    Logistic {
        weights: Vec<f64>,
        intercept: f64,
    },
    TreeEnsemble {
        /// 初始機率（以 logit 加到邊際值）
        #[serde(default = "default_base_score")]
        base_score: f64,
        #[serde(default)]
        n_features: Option<usize>,
        trees: Vec<RegressionTree>,
    },
}

fn default_base_score() -> f64 {
    0.5
}

impl ClassifierModel {
    pub fn check(&self) -> Result<()> {
        match self {
            Self::Logistic { weights, .. } => {
                if weights.is_empty() {
                    return Err(AnalysisError::model("Logistic model has no weights"));
                }
            }
            Self::TreeEnsemble {
                base_score,
                n_features,
                trees,
            } => {
                if !(0.0..=1.0).contains(base_score) {
                    return Err(AnalysisError::model(format!(
                        "base_score must be a probability, got {}",
                        base_score
                    )));
                }
                for tree in trees {
                    tree.check(*n_features)?;
                }
            }
        }
        Ok(())
    }

    fn margin(&self, features: &[f64]) -> Result<f64> {
        match self {
            Self::Logistic { weights, intercept } => {
                if features.len() != weights.len() {
                    return Err(AnalysisError::FeatureMismatch {
                        expected: weights.len(),
                        found: features.len(),
                    });
                }
                Ok(weights.iter().zip(features).map(|(w, x)| w * x).sum::<f64>() + intercept)
            }
            Self::TreeEnsemble {
                base_score,
                n_features,
                trees,
            } => {
                if let Some(n) = n_features {
                    if features.len() != *n {
                        return Err(AnalysisError::FeatureMismatch {
                            expected: *n,
                            found: features.len(),
                        });
                    }
                }
                let mut margin = logit(*base_score);
                for tree in trees {
                    margin += tree.predict(features)?;
                }
                Ok(margin)
            }
        }
    }

    /// 樹模型未宣告特徵數時，以用到的最大索引推得下限
    pub fn min_features(&self) -> usize {
        match self {
            Self::Logistic { weights, .. } => weights.len(),
            Self::TreeEnsemble {
                n_features, trees, ..
            } => n_features.unwrap_or_else(|| {
                trees
                    .iter()
                    .filter_map(RegressionTree::max_feature)
                    .max()
                    .map_or(0, |f| f + 1)
            }),
        }
    }
}

impl Classifier for ClassifierModel {
    fn predict_proba(&self, features: &[f64]) -> Result<f64> {
        Ok(sigmoid(self.margin(features)?))
    }

    fn n_features(&self) -> Option<usize> {
        match self {
            Self::Logistic { weights, .. } => Some(weights.len()),
            Self::TreeEnsemble { n_features, .. } => *n_features,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump() -> ClassifierModel {
        serde_json::from_str(
            r#"{
                "type": "tree_ensemble",
                "base_score": 0.5,
                "n_features": 2,
                "trees": [
                    {"nodes": [
                        {"feature": 0, "threshold": 0.5, "left": 1, "right": 2},
                        {"leaf": -1.0},
                        {"leaf": 2.0}
                    ]},
                    {"nodes": [
                        {"feature": 1, "threshold": 0.0, "left": 1, "right": 2, "default_left": false},
                        {"leaf": 0.0},
                        {"leaf": 0.5}
                    ]}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_logistic_probability() {
        let model = ClassifierModel::Logistic {
            weights: vec![1.0, -1.0],
            intercept: 0.0,
        };
        assert!((model.predict_proba(&[2.0, 2.0]).unwrap() - 0.5).abs() < 1e-12);
        assert!(model.predict_proba(&[3.0, 0.0]).unwrap() > 0.95);
        assert!(model.predict_proba(&[1.0]).is_err());
    }

    #[test]
    fn test_tree_ensemble_sums_leaves() {
        let model = stump();
        model.check().unwrap();

        // 左葉 -1.0 + 左葉 0.0
        let p = model.predict_proba(&[0.0, -1.0]).unwrap();
        assert!((p - sigmoid(-1.0)).abs() < 1e-12);

        // 右葉 2.0 + 右葉 0.5
        let p = model.predict_proba(&[1.0, 1.0]).unwrap();
        assert!((p - sigmoid(2.5)).abs() < 1e-12);
    }

    #[test]
    fn test_tree_missing_value_direction() {
        let model = stump();
        let p = model.predict_proba(&[f64::NAN, f64::NAN]).unwrap();
        assert!((p - sigmoid(-1.0 + 0.5)).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_tree_is_rejected() {
        let model: ClassifierModel = serde_json::from_str(
            r#"{"type": "tree_ensemble", "trees": [{"nodes": [
                {"feature": 0, "threshold": 0.5, "left": 0, "right": 1},
                {"leaf": 1.0}
            ]}]}"#,
        )
        .unwrap();
        assert!(model.check().is_err());
    }

    #[test]
    fn test_min_features_from_trees() {
        let mut model = stump();
        if let ClassifierModel::TreeEnsemble { n_features, .. } = &mut model {
            *n_features = None;
        }
        assert_eq!(model.min_features(), 2);
        assert_eq!(model.n_features(), None);
    }
}
