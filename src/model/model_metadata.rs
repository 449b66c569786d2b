//! モデルメタデータの定義
//!
//! 分類器の tar.gz に `metadata.json` として同梱され、推論時に
//! ラベルエンコーダとの整合性確認に使われます。

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// モデルメタデータ
///
/// tar.gz形式で保存される情報：
/// - metadata.json: このメタデータ（JSON形式）
/// - model.json: 決定木アンサンブル（JSON形式）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// 全クラスラベル（コード順）
    /// 例: ["Andy Dwyer", "Batman", ...]
    pub class_labels: Vec<String>,

    /// 特徴量数（設問数）
    pub num_features: usize,

    /// 決定木の本数
    pub num_trees: usize,

    /// 学習サンプル数
    pub num_samples: usize,

    /// 学習時のランダムシード
    pub seed: u64,

    /// 学習データに対する正解率
    #[serde(default)]
    pub training_accuracy: f64,

    /// モデルの学習時刻（ISO8601形式）
    pub trained_at: String,
}

impl ModelMetadata {
    /// 新しいメタデータを作成
    pub fn new(
        class_labels: Vec<String>,
        num_features: usize,
        num_trees: usize,
        num_samples: usize,
        seed: u64,
        training_accuracy: f64,
    ) -> Self {
        let trained_at = chrono::Local::now().to_rfc3339();

        Self {
            class_labels,
            num_features,
            num_trees,
            num_samples,
            seed,
            training_accuracy,
            trained_at,
        }
    }

    /// メタデータをJSON文字列に変換
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize metadata to JSON")
    }

    /// JSON文字列からメタデータを生成
    pub fn from_json_string(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to deserialize metadata from JSON")
    }
}
