//! 学習用データセット（合成データ生成とCSV入出力）
//!
//! CSV形式: ヘッダー `Q1,...,Q15,Character`、各行に回答15個とキャラクター名

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Writer};
use rand::Rng;
use std::path::Path;

use crate::types::{AnswerVector, OPTION_COUNT, QUESTION_COUNT};

const LABEL_COLUMN: &str = "Character";

/// 1サンプル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub answers: AnswerVector,
    pub label: String,
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    samples: Vec<Sample>,
}

impl Dataset {
    /// ラベルごとに一様乱数の回答を生成する（ラベルと回答に相関はない）
    pub fn generate_synthetic<R: Rng, S: AsRef<str>>(
        labels: &[S],
        samples_per_label: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let mut samples = Vec::with_capacity(labels.len() * samples_per_label);

        for label in labels {
            for _ in 0..samples_per_label {
                let values: Vec<i64> = (0..QUESTION_COUNT)
                    .map(|_| rng.gen_range(1..=OPTION_COUNT) as i64)
                    .collect();
                let answers = AnswerVector::new(&values)?;
                samples.push(Sample {
                    answers,
                    label: label.as_ref().to_string(),
                });
            }
        }

        Ok(Self { samples })
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.samples.iter().map(|s| s.label.as_str()).collect()
    }

    /// 分類器の入力行列
    pub fn features(&self) -> Vec<Vec<f64>> {
        self.samples.iter().map(|s| s.answers.to_features()).collect()
    }

    /// CSVに保存
    pub fn save_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .context(format!("Failed to create directory: {:?}", parent))?;
            }
        }

        let mut writer = Writer::from_path(path)
            .context(format!("CSV作成エラー: {:?}", path))?;

        let mut header: Vec<String> = (1..=QUESTION_COUNT).map(|i| format!("Q{}", i)).collect();
        header.push(LABEL_COLUMN.to_string());
        writer.write_record(&header)?;

        for sample in &self.samples {
            let mut record: Vec<String> =
                sample.answers.values().iter().map(|v| v.to_string()).collect();
            record.push(sample.label.clone());
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// CSVから読み込む
    pub fn load_csv(path: &Path) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .context(format!("CSV読み込みエラー: {:?}", path))?;

        let headers = reader.headers()?.clone();
        if headers.len() != QUESTION_COUNT + 1 {
            anyhow::bail!(
                "CSVの列数が不正です: 期待 {}, 実際 {}",
                QUESTION_COUNT + 1,
                headers.len()
            );
        }

        let mut samples = Vec::new();
        for (row, result) in reader.records().enumerate() {
            let record = result?;
            // ヘッダー行の次が1行目
            let line = row + 2;

            let mut values = Vec::with_capacity(QUESTION_COUNT);
            for i in 0..QUESTION_COUNT {
                let value: i64 = record
                    .get(i)
                    .ok_or_else(|| anyhow::anyhow!("{}行目: Q{} がありません", line, i + 1))?
                    .trim()
                    .parse()
                    .with_context(|| format!("{}行目: Q{} が整数ではありません", line, i + 1))?;
                values.push(value);
            }

            let answers = AnswerVector::new(&values)
                .map_err(|e| anyhow::anyhow!("{}行目: {}", line, e))?;

            let label = record
                .get(QUESTION_COUNT)
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .ok_or_else(|| anyhow::anyhow!("{}行目: キャラクター名がありません", line))?;

            samples.push(Sample {
                answers,
                label: label.to_string(),
            });
        }

        if samples.is_empty() {
            anyhow::bail!("CSVにサンプルがありません: {:?}", path);
        }

        Ok(Self { samples })
    }
}
