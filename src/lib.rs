pub mod types;
pub mod questions;
pub mod display;
pub mod dataset;
pub mod image_cache;
pub mod model;
pub mod ml;

#[cfg(feature = "gui")]
mod quiz_commands;

pub use display::{display_hint_for, Character, DisplayHint};
pub use image_cache::{ImageFetcher, ImagePayload, ImageResolver, ResolvedImage};
pub use ml::{Prediction, Predictor};
pub use types::{AnswerSheet, AnswerVector, PredictionError};

use std::sync::Mutex;

use model::AppConfig;

/// 起動時に一度だけ作られ、コマンドから参照される状態
pub struct AppState {
    predictor: Predictor,
    images: Mutex<ImageResolver>,
    config: AppConfig,
}

impl AppState {
    /// 設定に従って成果物を読み込む（失敗時は起動しない）
    pub fn initialize(config: AppConfig) -> anyhow::Result<Self> {
        let predictor = Predictor::load(&config.model)?;
        log::info!(
            "[startup] モデルを読み込みました: {}クラス (学習日時 {})",
            predictor.classes().len(),
            predictor.metadata().trained_at
        );
        let images = ImageResolver::from_settings(&config.image)?;
        log::info!("[startup] 画像の解決方式: {}", images.mode());

        Ok(Self {
            predictor,
            images: Mutex::new(images),
            config,
        })
    }

    /// フォームの回答からキャラクターを予測する
    ///
    /// 未回答（None）の扱いは設定 `quiz.require_all_answered` に従う
    pub fn reveal(&self, answers: Vec<Option<u8>>) -> Result<Prediction, PredictionError> {
        let vector = AnswerSheet::new(answers).resolve(self.config.quiz.require_all_answered)?;
        let prediction = self.predictor.predict_vector(&vector)?;
        log::info!("[reveal] {:?} -> {}", vector.values(), prediction.character);
        Ok(prediction)
    }

    /// キャラクター画像を解決する（失敗時はプレースホルダー）
    pub fn character_image(&self, name: &str) -> ImagePayload {
        let resolved = match self.images.lock() {
            Ok(mut images) => images.resolve(name),
            Err(poisoned) => poisoned.into_inner().resolve(name),
        };
        resolved.to_payload()
    }
}

#[cfg(feature = "gui")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();

    let config = AppConfig::load_or_default();
    let app_state = match AppState::initialize(config) {
        Ok(state) => state,
        Err(e) => {
            log::error!("[startup] 初期化エラー: {:#}", e);
            eprintln!("必要なモデルファイルが見つからないか壊れています。");
            eprintln!("先に `cargo run --bin train_model` で学習してください。");
            std::process::exit(1);
        }
    };

    tauri::Builder::default()
        .manage(app_state)
        .invoke_handler(tauri::generate_handler![
            quiz_commands::get_questions,
            quiz_commands::reveal_character,
            quiz_commands::resolve_character_image,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ImageMode;
    use std::path::Path;

    fn config_in(dir: &Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.model.model_path = dir.join("character_predictor.tar.gz").to_string_lossy().to_string();
        config.model.encoder_path = dir.join("label_encoder.json").to_string_lossy().to_string();
        config.training.num_trees = 10;
        config.training.dataset_csv = None;
        config.image.mode = ImageMode::Remote;
        config.image.base_url = "https://example.com/images/".to_string();
        config.image.cache_dir = dir.join("cache").to_string_lossy().to_string();
        config
    }

    fn trained_config(dir: &Path) -> AppConfig {
        let config = config_in(dir);
        ml::train_model(&config.training, &config.model, None).unwrap();
        config
    }

    #[test]
    fn test_initialize_requires_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppState::initialize(config_in(dir.path())).is_err());
    }

    #[test]
    fn test_reveal_defaults_unanswered_to_first_option() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::initialize(trained_config(dir.path())).unwrap();

        let mut answers = vec![Some(1); 15];
        answers[3] = None;
        let with_gap = state.reveal(answers).unwrap();
        let all_ones = state.reveal(vec![Some(1); 15]).unwrap();
        assert_eq!(with_gap, all_ones);
    }

    #[test]
    fn test_reveal_rejects_unanswered_when_required() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = trained_config(dir.path());
        config.quiz.require_all_answered = true;
        let state = AppState::initialize(config).unwrap();

        let mut answers = vec![Some(2); 15];
        answers[9] = None;
        assert_eq!(
            state.reveal(answers).unwrap_err(),
            PredictionError::Unanswered { question: 10 }
        );
        assert_eq!(
            state.reveal(vec![Some(2); 14]).unwrap_err(),
            PredictionError::WrongLength { expected: 15, actual: 14 }
        );
        assert!(matches!(
            state.reveal(vec![Some(4); 15]),
            Err(PredictionError::OutOfRange { question: 1, value: 4 })
        ));
    }

    #[test]
    fn test_character_image_payload() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::initialize(trained_config(dir.path())).unwrap();

        let payload = state.character_image("Walter White");
        assert_eq!(payload.src, "https://example.com/images/walter_white.png");
        assert!(!payload.placeholder);
        assert!(payload.fallback.starts_with("data:image/png;base64,"));

        let payload = state.character_image("../escaped");
        assert!(payload.placeholder);
        assert_eq!(payload.src, payload.fallback);
    }
}
