//! 保存済みモデルの情報表示

use anyhow::Result;
use character_quiz_lib::model::{load_label_encoder, load_metadata, print_metadata_info, AppConfig};
use std::path::PathBuf;

fn main() -> Result<()> {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();

    let config = AppConfig::load_or_default();
    let args: Vec<String> = std::env::args().collect();
    let model_path = args
        .get(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&config.model.model_path));
    let encoder_path = args
        .get(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&config.model.encoder_path));

    println!("Test 1: モデルメタデータ読み込み");
    match load_metadata(&model_path) {
        Ok(metadata) => {
            println!("✓ モデルメタデータ読み込み成功: {}", model_path.display());
            print_metadata_info(&metadata);
        }
        Err(e) => {
            eprintln!("✗ エラー: {:#}", e);
        }
    }

    println!("\n{}\n", "=".repeat(50));

    println!("Test 2: ラベルエンコーダ読み込み");
    match load_label_encoder(&encoder_path) {
        Ok(encoder) => {
            println!("✓ ラベルエンコーダ読み込み成功: {}", encoder_path.display());
            for (code, name) in encoder.classes().iter().enumerate() {
                println!("  {:>2}: {}", code, name);
            }
        }
        Err(e) => {
            eprintln!("✗ エラー: {:#}", e);
        }
    }

    Ok(())
}
