//! アプリケーション設定管理モジュール
//!
//! モデルの保存先、学習パラメータ、画像取得設定をJSON形式で保存・読み込みします。

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 画像の解決方式
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImageMode {
    /// リモートURLをそのまま表示側に渡す
    Remote,
    /// 初回に取得してローカルにキャッシュし、以降はキャッシュを使う
    Cached,
}

impl Default for ImageMode {
    fn default() -> Self {
        ImageMode::Cached
    }
}

impl std::fmt::Display for ImageMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageMode::Remote => write!(f, "remote"),
            ImageMode::Cached => write!(f, "cached"),
        }
    }
}

/// モデル設定
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// 分類器ファイル（tar.gz）のパス
    pub model_path: String,
    /// ラベルエンコーダ（JSON）のパス
    pub encoder_path: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model_path: "models/character_predictor.tar.gz".to_string(),
            encoder_path: "models/label_encoder.json".to_string(),
        }
    }
}

/// トレーニング設定
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingSettings {
    /// キャラクターごとの合成サンプル数
    pub samples_per_label: usize,
    /// ランダムシード
    pub seed: u64,
    /// 決定木の本数
    pub num_trees: usize,
    /// 木の最大深さ（None で無制限）
    pub max_depth: Option<usize>,
    /// 分割に必要な最小サンプル数
    pub min_samples_split: usize,
    /// 合成データセットのCSV出力先（None で出力しない）
    pub dataset_csv: Option<String>,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            samples_per_label: 10,
            seed: 42,
            num_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            dataset_csv: Some("models/training_data.csv".to_string()),
        }
    }
}

/// 画像取得設定
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSettings {
    pub mode: ImageMode,
    /// 画像配信元のベースURL（末尾は `/`）
    pub base_url: String,
    /// 画像の拡張子
    pub extension: String,
    /// キャッシュディレクトリ
    pub cache_dir: String,
    /// 取得タイムアウト（ミリ秒）
    pub timeout_ms: u64,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            mode: ImageMode::default(),
            base_url: "https://anni3607.github.io/Personality-Traits/images/".to_string(),
            extension: "png".to_string(),
            cache_dir: "image_cache".to_string(),
            timeout_ms: 5000,
        }
    }
}

/// 診断フォームの設定
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizSettings {
    /// true の場合、未回答の設問があると診断しない
    /// false の場合、未回答は選択肢1として扱う
    pub require_all_answered: bool,
}

/// アプリケーション設定
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// モデル設定
    pub model: ModelSettings,
    /// トレーニング設定
    pub training: TrainingSettings,
    /// 画像設定
    pub image: ImageSettings,
    /// 診断フォーム設定
    pub quiz: QuizSettings,
}

impl AppConfig {
    /// 設定ファイルのデフォルトパス
    pub fn default_path() -> PathBuf {
        PathBuf::from("config.json")
    }

    /// 設定を読み込む
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// デフォルトパスから設定を読み込む、存在しない場合はデフォルト設定を返す
    pub fn load_or_default() -> Self {
        Self::load_from_or_default(Self::default_path())
    }

    /// 指定パスから設定を読み込む、存在しないか壊れている場合はデフォルト設定を返す
    pub fn load_from_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if path.exists() {
            match Self::load(path) {
                Ok(config) => {
                    log::info!("設定ファイルを読み込みました: {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!(
                        "設定ファイルの読み込みに失敗しました ({}): {}",
                        path.display(),
                        e
                    );
                    log::warn!("デフォルト設定を使用します");
                    Self::default()
                }
            }
        } else {
            log::info!("設定ファイルが存在しません。デフォルト設定を使用します");
            Self::default()
        }
    }

    /// 設定を保存する
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// 設定情報を表示
    pub fn display(&self) {
        println!("=== アプリケーション設定 ===");
        println!("分類器: {}", self.model.model_path);
        println!("エンコーダ: {}", self.model.encoder_path);
        println!("\n--- トレーニング設定 ---");
        println!("サンプル数/キャラクター: {}", self.training.samples_per_label);
        println!("シード: {}", self.training.seed);
        println!("決定木の本数: {}", self.training.num_trees);
        match self.training.max_depth {
            Some(depth) => println!("最大深さ: {}", depth),
            None => println!("最大深さ: 無制限"),
        }
        println!("\n--- 画像設定 ---");
        println!("方式: {}", self.image.mode);
        println!("ベースURL: {}", self.image.base_url);
        println!("キャッシュ: {}", self.image.cache_dir);
        println!("タイムアウト: {}ms", self.image.timeout_ms);
        println!("\n未回答を拒否: {}", self.quiz.require_all_answered);
        println!("========================\n");
    }
}
