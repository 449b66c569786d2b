//! モデルとラベルエンコーダの永続化
//!
//! 分類器はTar.gz形式でモデルとメタデータを1ファイルに統合して保存します。
//!
//! ファイル構成（tar.gz内部）:
//! - metadata.json   - メタデータ（クラスラベル、特徴量数など）
//! - model.json      - 決定木アンサンブル
//!
//! ラベルエンコーダは独立したJSONファイルとして保存します。

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tar::{Archive, Builder};

use crate::model::label_encoder::LabelEncoder;
use crate::model::model_metadata::ModelMetadata;

const METADATA_ENTRY: &str = "metadata.json";
const MODEL_ENTRY: &str = "model.json";

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .context(format!("Failed to create parent directory: {:?}", parent))?;
        }
    }
    Ok(())
}

fn append_entry<W: std::io::Write>(builder: &mut Builder<W>, name: &str, bytes: &[u8]) -> Result<()> {
    let mut header = tar::Header::new_gnu();
    header.set_path(name)?;
    header.set_size(bytes.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder
        .append(&header, bytes)
        .context(format!("{} をアーカイブに追加できません", name))
}

/// メタデータと共にモデルをTar.gz形式で保存
pub fn save_model_with_metadata(
    output_path: &Path,
    metadata: &ModelMetadata,
    model_binary: &[u8],
) -> Result<()> {
    ensure_parent_dir(output_path)?;

    let tar_gz_file = File::create(output_path)
        .context(format!("Failed to create tar.gz file: {:?}", output_path))?;

    let encoder = GzEncoder::new(tar_gz_file, Compression::default());
    let mut tar_builder = Builder::new(encoder);

    let metadata_json = metadata.to_json_string()?;
    append_entry(&mut tar_builder, METADATA_ENTRY, metadata_json.as_bytes())?;
    append_entry(&mut tar_builder, MODEL_ENTRY, model_binary)?;

    // tarとgzipの終端まで書き切る
    let encoder = tar_builder
        .into_inner()
        .context("Failed to finalize tar archive")?;
    encoder
        .finish()
        .context("Failed to finalize tar.gz archive")?;

    Ok(())
}

fn open_archive(tar_gz_path: &Path) -> Result<Archive<GzDecoder<File>>> {
    let file = File::open(tar_gz_path)
        .context(format!("モデルファイルを開けません: {:?}", tar_gz_path))?;
    Ok(Archive::new(GzDecoder::new(file)))
}

/// Tar.gzからモデルメタデータを読み込む
pub fn load_metadata(tar_gz_path: &Path) -> Result<ModelMetadata> {
    let mut archive = open_archive(tar_gz_path)?;

    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.into_owned();

        if path.to_str() == Some(METADATA_ENTRY) {
            let mut json_str = String::new();
            entry.read_to_string(&mut json_str)?;
            return ModelMetadata::from_json_string(&json_str);
        }
    }

    Err(anyhow::anyhow!("metadata.json not found in tar.gz archive"))
}

/// メタデータとモデルバイナリを共に読み込む
pub fn load_model_with_metadata(tar_gz_path: &Path) -> Result<(ModelMetadata, Vec<u8>)> {
    let mut archive = open_archive(tar_gz_path)?;

    let mut metadata_opt: Option<ModelMetadata> = None;
    let mut model_binary_opt: Option<Vec<u8>> = None;

    for entry in archive
        .entries()
        .context(format!("Failed to read tar.gz archive: {:?}", tar_gz_path))?
    {
        let mut entry = entry?;
        let path = entry.path()?.into_owned();

        match path.to_str() {
            Some(METADATA_ENTRY) => {
                let mut json_str = String::new();
                entry.read_to_string(&mut json_str)?;
                metadata_opt = Some(ModelMetadata::from_json_string(&json_str)?);
            }
            Some(MODEL_ENTRY) => {
                let mut buffer = Vec::new();
                entry.read_to_end(&mut buffer)?;
                model_binary_opt = Some(buffer);
            }
            _ => {}
        }
    }

    match (metadata_opt, model_binary_opt) {
        (Some(metadata), Some(binary)) => Ok((metadata, binary)),
        (None, _) => Err(anyhow::anyhow!("metadata.json not found in tar.gz archive")),
        (_, None) => Err(anyhow::anyhow!("model.json not found in tar.gz archive")),
    }
}

/// ラベルエンコーダをJSONで保存
pub fn save_label_encoder(output_path: &Path, encoder: &LabelEncoder) -> Result<()> {
    ensure_parent_dir(output_path)?;
    let json = encoder.to_json_string()?;
    std::fs::write(output_path, json)
        .context(format!("Failed to write label encoder: {:?}", output_path))?;
    Ok(())
}

/// ラベルエンコーダをJSONから読み込む
pub fn load_label_encoder(path: &Path) -> Result<LabelEncoder> {
    let json = std::fs::read_to_string(path)
        .context(format!("Failed to read label encoder: {:?}", path))?;
    LabelEncoder::from_json_string(&json)
}

/// メタデータをコンソールに表示
pub fn print_metadata_info(metadata: &ModelMetadata) {
    println!("\n=== モデルメタデータ ===");
    println!("クラス数: {}", metadata.class_labels.len());
    println!("クラスラベル: {}", metadata.class_labels.join(", "));
    println!("特徴量数: {}", metadata.num_features);
    println!("決定木の本数: {}", metadata.num_trees);
    println!("学習サンプル数: {}", metadata.num_samples);
    println!("シード: {}", metadata.seed);
    println!("学習データ正解率: {:.1}%", metadata.training_accuracy * 100.0);
    println!("学習日時: {}", metadata.trained_at);
    println!("========================");
}
