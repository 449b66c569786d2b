//! ラベルエンコーダ
//!
//! キャラクター名と整数コードの全単射。クラスは学習ラベルを重複除去して
//! 辞書順に並べたもので、コードはその添字です。

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// ラベル列からエンコーダを作成
    pub fn fit<S: AsRef<str>>(labels: &[S]) -> Result<Self> {
        let mut classes: Vec<String> = labels.iter().map(|l| l.as_ref().to_string()).collect();
        classes.sort();
        classes.dedup();

        if classes.is_empty() {
            anyhow::bail!("ラベルが1件もありません");
        }

        Ok(Self { classes })
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// ラベル -> コード
    pub fn encode(&self, label: &str) -> Option<usize> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .ok()
    }

    /// コード -> ラベル
    pub fn decode(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(|s| s.as_str())
    }

    /// ラベル列をまとめてコードに変換
    pub fn transform<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<usize>> {
        labels
            .iter()
            .map(|l| {
                self.encode(l.as_ref())
                    .ok_or_else(|| anyhow::anyhow!("未知のラベル: {}", l.as_ref()))
            })
            .collect()
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize label encoder to JSON")
    }

    pub fn from_json_string(json: &str) -> Result<Self> {
        let encoder: Self = serde_json::from_str(json)
            .context("Failed to deserialize label encoder from JSON")?;

        // 保存済みのクラス列が整列・一意であることを確認（encodeの二分探索の前提）
        if encoder.classes.is_empty() {
            anyhow::bail!("ラベルエンコーダのクラスが空です");
        }
        if encoder.classes.windows(2).any(|w| w[0] >= w[1]) {
            anyhow::bail!("ラベルエンコーダのクラスが整列されていません");
        }

        Ok(encoder)
    }
}
