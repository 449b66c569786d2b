//! 分類器とラベルエンコーダを学習して保存する
//!
//! Usage:
//!   cargo run --bin train_model -- [--config config.json] [--csv training_data.csv]
//!
//! `--csv` を指定しない場合は合成データを生成して学習します。

use anyhow::{Context, Result};
use character_quiz_lib::ml::train_model;
use character_quiz_lib::model::{print_metadata_info, AppConfig};
use std::path::PathBuf;

fn main() -> Result<()> {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();

    let mut config_path = AppConfig::default_path();
    let mut source_csv: Option<PathBuf> = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                config_path = PathBuf::from(args.next().context("--config にはパスが必要です")?);
            }
            "--csv" => {
                source_csv = Some(PathBuf::from(args.next().context("--csv にはパスが必要です")?));
            }
            other => anyhow::bail!("不明な引数: {}", other),
        }
    }

    let config = AppConfig::load_from_or_default(&config_path);
    config.display();

    let report = train_model(&config.training, &config.model, source_csv.as_deref())?;
    print_metadata_info(&report.metadata);

    println!("✅ モデルとエンコーダを保存しました");
    println!("  分類器: {}", config.model.model_path);
    println!("  エンコーダ: {}", config.model.encoder_path);
    Ok(())
}
