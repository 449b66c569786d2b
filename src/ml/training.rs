//! モデル学習
//!
//! 合成データ生成 → ラベルエンコード → ランダムフォレスト学習 → 保存

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;

use crate::dataset::Dataset;
use crate::display::Character;
use crate::ml::forest::{ForestParams, RandomForest};
use crate::model::config::{ModelSettings, TrainingSettings};
use crate::model::{save_label_encoder, save_model_with_metadata, LabelEncoder, ModelMetadata};
use crate::types::QUESTION_COUNT;

/// 学習結果の概要
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub num_samples: usize,
    pub num_classes: usize,
    pub training_accuracy: f64,
    pub metadata: ModelMetadata,
}

/// 学習用データセットを用意する
///
/// `source_csv` が指定されていればCSVから読み込み、なければ合成データを生成する
pub fn prepare_dataset(settings: &TrainingSettings, source_csv: Option<&Path>) -> Result<Dataset> {
    match source_csv {
        Some(path) => {
            log::info!("[train] CSVから学習データを読み込みます: {}", path.display());
            Dataset::load_csv(path)
        }
        None => {
            let labels: Vec<&str> = Character::ALL.iter().map(|c| c.name()).collect();
            let mut rng = StdRng::seed_from_u64(settings.seed);
            let dataset = Dataset::generate_synthetic(&labels, settings.samples_per_label, &mut rng)?;
            log::info!(
                "[train] 合成データを生成しました: {}キャラクター × {}件",
                labels.len(),
                settings.samples_per_label
            );

            if let Some(csv_path) = &settings.dataset_csv {
                dataset
                    .save_csv(Path::new(csv_path))
                    .context("学習データのCSV保存に失敗しました")?;
                log::info!("[train] 学習データを保存しました: {}", csv_path);
            }

            Ok(dataset)
        }
    }
}

/// データセットから分類器とエンコーダを学習する
pub fn fit(dataset: &Dataset, settings: &TrainingSettings) -> Result<(RandomForest, LabelEncoder, f64)> {
    if dataset.is_empty() {
        anyhow::bail!("学習データが見つかりません");
    }

    let labels = dataset.labels();
    let encoder = LabelEncoder::fit(&labels)?;
    let y = encoder.transform(&labels)?;
    let x = dataset.features();

    log::info!(
        "[train] 学習開始: {}サンプル, {}クラス, 決定木{}本",
        x.len(),
        encoder.len(),
        settings.num_trees
    );

    let params = ForestParams {
        num_trees: settings.num_trees,
        max_depth: settings.max_depth,
        min_samples_split: settings.min_samples_split,
        ..ForestParams::default()
    };
    let forest = RandomForest::fit(&x, &y, encoder.len(), &params, settings.seed)?;
    let accuracy = forest.accuracy(&x, &y)?;

    log::info!("[train] 学習完了: 学習データ正解率 {:.1}%", accuracy * 100.0);

    Ok((forest, encoder, accuracy))
}

/// 学習して2つの成果物（分類器、エンコーダ）を保存する
pub fn train_model(
    settings: &TrainingSettings,
    model: &ModelSettings,
    source_csv: Option<&Path>,
) -> Result<TrainingReport> {
    let dataset = prepare_dataset(settings, source_csv)?;
    let (forest, encoder, training_accuracy) = fit(&dataset, settings)?;

    let metadata = ModelMetadata::new(
        encoder.classes().to_vec(),
        QUESTION_COUNT,
        forest.trees().len(),
        dataset.len(),
        settings.seed,
        training_accuracy,
    );

    let model_binary = forest.to_json_bytes()?;
    save_model_with_metadata(Path::new(&model.model_path), &metadata, &model_binary)
        .context("分類器の保存に失敗しました")?;
    log::info!("[train] 分類器を保存しました: {}", model.model_path);

    save_label_encoder(Path::new(&model.encoder_path), &encoder)
        .context("ラベルエンコーダの保存に失敗しました")?;
    log::info!("[train] ラベルエンコーダを保存しました: {}", model.encoder_path);

    Ok(TrainingReport {
        num_samples: dataset.len(),
        num_classes: encoder.len(),
        training_accuracy,
        metadata,
    })
}
