//! 学習 → 保存 → 読み込み → 予測 → 表示情報 の一連の流れ

use anyhow::Result;
use character_quiz_lib::image_cache::render_placeholder_png;
use character_quiz_lib::ml::train_model;
use character_quiz_lib::model::{ImageMode, ImageSettings, ModelSettings, TrainingSettings};
use character_quiz_lib::{
    display_hint_for, AnswerSheet, Character, ImageFetcher, ImageResolver, PredictionError,
    Predictor, ResolvedImage,
};
use std::path::Path;
use url::Url;

fn settings_in(dir: &Path) -> (TrainingSettings, ModelSettings) {
    let training = TrainingSettings {
        num_trees: 25,
        dataset_csv: None,
        ..TrainingSettings::default()
    };
    let model = ModelSettings {
        model_path: dir.join("character_predictor.tar.gz").to_string_lossy().to_string(),
        encoder_path: dir.join("label_encoder.json").to_string_lossy().to_string(),
    };
    (training, model)
}

fn known_names() -> Vec<&'static str> {
    Character::ALL.iter().map(|c| c.name()).collect()
}

#[test]
fn all_ones_maps_to_a_fixed_known_character() {
    let dir = tempfile::tempdir().unwrap();
    let (training, model) = settings_in(dir.path());
    train_model(&training, &model, None).unwrap();

    let predictor = Predictor::load(&model).unwrap();
    let first = predictor.predict(&[1; 15]).unwrap();
    assert!(known_names().contains(&first.character.as_str()));

    for _ in 0..5 {
        assert_eq!(predictor.predict(&[1; 15]).unwrap().character, first.character);
    }

    // 同じシードで学習し直しても結果は変わらない
    let other_dir = tempfile::tempdir().unwrap();
    let (training, model) = settings_in(other_dir.path());
    train_model(&training, &model, None).unwrap();
    let reloaded = Predictor::load(&model).unwrap();
    assert_eq!(reloaded.predict(&[1; 15]).unwrap().character, first.character);
}

#[test]
fn predictions_carry_the_configured_colors() {
    let dir = tempfile::tempdir().unwrap();
    let (training, model) = settings_in(dir.path());
    train_model(&training, &model, None).unwrap();
    let predictor = Predictor::load(&model).unwrap();

    let sheet = AnswerSheet::new(vec![Some(3); 15]);
    let prediction = predictor.predict_vector(&sheet.resolve(false).unwrap()).unwrap();
    let character = Character::from_name(&prediction.character).unwrap();
    assert_eq!(prediction.hint, character.display_hint());
    assert_eq!(prediction.hint, display_hint_for(&prediction.character));
}

#[test]
fn malformed_answers_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let (training, model) = settings_in(dir.path());
    train_model(&training, &model, None).unwrap();
    let predictor = Predictor::load(&model).unwrap();

    assert!(matches!(
        predictor.predict(&[1, 2, 3]),
        Err(PredictionError::WrongLength { expected: 15, actual: 3 })
    ));
    assert!(matches!(
        predictor.predict(&[1, 2, 3, 1, 2, 3, 1, 2, 3, 1, 2, 3, 1, 2, 7]),
        Err(PredictionError::OutOfRange { question: 15, value: 7 })
    ));
    assert!(matches!(
        predictor.predict(&[-1; 15]),
        Err(PredictionError::OutOfRange { question: 1, value: -1 })
    ));
}

#[test]
fn missing_or_corrupt_artifacts_refuse_to_load() {
    let dir = tempfile::tempdir().unwrap();
    let (training, model) = settings_in(dir.path());

    assert!(Predictor::load(&model).is_err());

    train_model(&training, &model, None).unwrap();
    std::fs::write(&model.encoder_path, "{ broken").unwrap();
    assert!(Predictor::load(&model).is_err());

    train_model(&training, &model, None).unwrap();
    std::fs::remove_file(&model.model_path).unwrap();
    assert!(Predictor::load(&model).is_err());
}

struct FixedFetcher(Option<Vec<u8>>);

impl ImageFetcher for FixedFetcher {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>> {
        self.0
            .clone()
            .ok_or_else(|| anyhow::anyhow!("not found: {}", url))
    }
}

#[test]
fn image_resolution_serves_cache_or_placeholder() {
    let dir = tempfile::tempdir().unwrap();
    let settings = ImageSettings {
        mode: ImageMode::Cached,
        base_url: "https://example.com/images/".to_string(),
        extension: "png".to_string(),
        cache_dir: dir.path().join("cache").to_string_lossy().to_string(),
        timeout_ms: 1000,
    };

    let png = render_placeholder_png().unwrap();
    let mut reachable = ImageResolver::new(&settings, FixedFetcher(Some(png))).unwrap();
    assert_eq!(
        reachable.resolve("Michael Scott"),
        ResolvedImage::Cached(dir.path().join("cache").join("michael_scott.png"))
    );

    let mut unreachable = ImageResolver::new(&settings, FixedFetcher(None)).unwrap();
    let resolved = unreachable.resolve("Moira Rose");
    assert!(resolved.is_placeholder());
    assert!(resolved.describe().starts_with("https://placehold.co/"));
}
