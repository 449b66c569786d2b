//! モデル推論機能

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use crate::display::{display_hint_for, DisplayHint};
use crate::ml::forest::RandomForest;
use crate::model::config::ModelSettings;
use crate::model::{load_label_encoder, load_model_with_metadata, LabelEncoder, ModelMetadata};
use crate::types::{AnswerVector, PredictionError, QUESTION_COUNT};

/// 予測結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// キャラクター名
    pub character: String,
    /// ラベルコード
    pub code: usize,
    /// 表示色
    pub hint: DisplayHint,
}

/// 推論エンジン
///
/// 起動時に1度だけ読み込み、以降は読み取り専用で使う
pub struct Predictor {
    forest: RandomForest,
    encoder: LabelEncoder,
    metadata: ModelMetadata,
}

impl Predictor {
    /// 成果物を読み込んで推論エンジンを初期化
    ///
    /// どちらかが欠けている、壊れている、または互いに整合しない場合はエラー
    pub fn load(settings: &ModelSettings) -> Result<Self> {
        Self::load_from(Path::new(&settings.model_path), Path::new(&settings.encoder_path))
    }

    pub fn load_from(model_path: &Path, encoder_path: &Path) -> Result<Self> {
        let (metadata, model_binary) = load_model_with_metadata(model_path)
            .context(format!("分類器を読み込めません: {}", model_path.display()))?;
        let forest = RandomForest::from_json_bytes(&model_binary)
            .context(format!("分類器の内容が不正です: {}", model_path.display()))?;
        let encoder = load_label_encoder(encoder_path)
            .context(format!("ラベルエンコーダを読み込めません: {}", encoder_path.display()))?;

        Self::new(forest, encoder, metadata)
    }

    /// 読み込み済みの成果物から作成し、整合性を確認する
    pub fn new(forest: RandomForest, encoder: LabelEncoder, metadata: ModelMetadata) -> Result<Self> {
        if forest.num_features() != QUESTION_COUNT {
            anyhow::bail!(
                "分類器の特徴量数が設問数と一致しません: {} != {}",
                forest.num_features(),
                QUESTION_COUNT
            );
        }
        if forest.num_classes() != encoder.len() {
            anyhow::bail!(
                "分類器のクラス数とエンコーダのクラス数が一致しません: {} != {}",
                forest.num_classes(),
                encoder.len()
            );
        }
        if metadata.class_labels.as_slice() != encoder.classes() {
            anyhow::bail!("メタデータのクラスラベルとエンコーダが一致しません");
        }
        if metadata.num_features != forest.num_features() {
            anyhow::bail!(
                "メタデータの特徴量数が分類器と一致しません: {} != {}",
                metadata.num_features,
                forest.num_features()
            );
        }
        if metadata.num_trees != forest.trees().len() {
            anyhow::bail!(
                "メタデータの決定木の本数が分類器と一致しません: {} != {}",
                metadata.num_trees,
                forest.trees().len()
            );
        }

        Ok(Self {
            forest,
            encoder,
            metadata,
        })
    }

    /// 回答（整数列）からキャラクターを予測
    pub fn predict(&self, answers: &[i64]) -> Result<Prediction, PredictionError> {
        let answers = AnswerVector::new(answers)?;
        self.predict_vector(&answers)
    }

    /// 検証済みの回答ベクトルからキャラクターを予測
    pub fn predict_vector(&self, answers: &AnswerVector) -> Result<Prediction, PredictionError> {
        let code = self.forest.predict(&answers.to_features())?;
        let character = self
            .encoder
            .decode(code)
            .ok_or(PredictionError::UnknownCode(code))?
            .to_string();
        let hint = display_hint_for(&character);

        Ok(Prediction {
            character,
            code,
            hint,
        })
    }

    pub fn classes(&self) -> &[String] {
        self.encoder.classes()
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::forest::ForestParams;
    use crate::ml::training::{fit, prepare_dataset};
    use crate::model::config::TrainingSettings;

    fn trained_predictor() -> Predictor {
        let settings = TrainingSettings {
            num_trees: 20,
            dataset_csv: None,
            ..TrainingSettings::default()
        };
        let dataset = prepare_dataset(&settings, None).unwrap();
        let (forest, encoder, accuracy) = fit(&dataset, &settings).unwrap();
        let metadata = ModelMetadata::new(
            encoder.classes().to_vec(),
            QUESTION_COUNT,
            forest.trees().len(),
            dataset.len(),
            settings.seed,
            accuracy,
        );
        Predictor::new(forest, encoder, metadata).unwrap()
    }

    #[test]
    fn test_predicts_known_character() {
        let predictor = trained_predictor();
        let prediction = predictor.predict(&[1; 15]).unwrap();
        assert!(predictor.classes().contains(&prediction.character));
        assert_eq!(prediction.hint, display_hint_for(&prediction.character));

        // 同じ入力なら同じ結果
        assert_eq!(predictor.predict(&[1; 15]).unwrap(), prediction);
    }

    #[test]
    fn test_every_answer_pattern_is_closed_world() {
        let predictor = trained_predictor();
        for seed in 0..50i64 {
            let answers: Vec<i64> = (0..15).map(|i| (seed * 7 + i * 3) % 3 + 1).collect();
            let prediction = predictor.predict(&answers).unwrap();
            assert!(predictor.classes().contains(&prediction.character));
            assert!(prediction.code < 16);
        }
    }

    #[test]
    fn test_malformed_input_is_rejected() {
        let predictor = trained_predictor();
        assert!(matches!(
            predictor.predict(&[1; 14]),
            Err(PredictionError::WrongLength { .. })
        ));
        let mut answers = [2i64; 15];
        answers[14] = 0;
        assert!(matches!(
            predictor.predict(&answers),
            Err(PredictionError::OutOfRange { question: 15, value: 0 })
        ));
    }

    #[test]
    fn test_rejects_mismatched_artifacts() {
        let x = vec![vec![1.0; QUESTION_COUNT], vec![2.0; QUESTION_COUNT]];
        let params = ForestParams {
            num_trees: 4,
            ..ForestParams::default()
        };
        let forest = RandomForest::fit(&x, &[0, 1], 2, &params, 0).unwrap();
        let metadata_for = |labels: &[&str], num_features: usize, num_trees: usize| {
            let labels = labels.iter().map(|l| l.to_string()).collect();
            ModelMetadata::new(labels, num_features, num_trees, 2, 0, 1.0)
        };

        // 整合している組み合わせは読み込める
        let encoder = LabelEncoder::fit(&["A", "B"]).unwrap();
        assert!(Predictor::new(forest.clone(), encoder, metadata_for(&["A", "B"], 15, 4)).is_ok());

        // エンコーダのクラス数が違う
        let encoder = LabelEncoder::fit(&["A", "B", "C"]).unwrap();
        let metadata = metadata_for(&["A", "B", "C"], QUESTION_COUNT, 4);
        assert!(Predictor::new(forest.clone(), encoder, metadata).is_err());

        // メタデータのラベルが違う
        let encoder = LabelEncoder::fit(&["A", "B"]).unwrap();
        let metadata = metadata_for(&["X", "Y"], QUESTION_COUNT, 4);
        assert!(Predictor::new(forest.clone(), encoder, metadata).is_err());

        // メタデータの特徴量数が違う
        let encoder = LabelEncoder::fit(&["A", "B"]).unwrap();
        let metadata = metadata_for(&["A", "B"], 14, 4);
        assert!(Predictor::new(forest.clone(), encoder, metadata).is_err());

        // メタデータの決定木の本数が違う
        let encoder = LabelEncoder::fit(&["A", "B"]).unwrap();
        let metadata = metadata_for(&["A", "B"], QUESTION_COUNT, 100);
        assert!(Predictor::new(forest, encoder, metadata).is_err());
    }

    #[test]
    fn test_load_fails_without_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let result = Predictor::load_from(
            &dir.path().join("character_predictor.tar.gz"),
            &dir.path().join("label_encoder.json"),
        );
        assert!(result.is_err());
    }
}
