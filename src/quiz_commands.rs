//! 診断フォームのTauriコマンド

use serde::Serialize;
use tauri::State;

use crate::display::DisplayHint;
use crate::image_cache::ImagePayload;
use crate::questions::{Question, QUESTIONS};
use crate::AppState;

/// 診断結果のペイロード
#[derive(Clone, Serialize)]
pub struct RevealResult {
    pub character: String,
    pub hint: DisplayHint,
}

#[tauri::command]
pub fn get_questions() -> Vec<Question> {
    QUESTIONS.to_vec()
}

/// 回答からキャラクターを予測する
#[tauri::command]
pub fn reveal_character(
    answers: Vec<Option<u8>>,
    state: State<AppState>,
) -> Result<RevealResult, String> {
    let prediction = state.reveal(answers).map_err(|e| e.to_string())?;
    Ok(RevealResult {
        character: prediction.character,
        hint: prediction.hint,
    })
}

/// キャラクター画像を解決する
///
/// 画像の取得は最大 `timeout_ms` ブロックするため、UIスレッド外で実行する
/// 失敗時もプレースホルダーを返すので `Err` にはならない
#[tauri::command(async)]
pub fn resolve_character_image(
    name: String,
    state: State<'_, AppState>,
) -> Result<ImagePayload, String> {
    Ok(state.character_image(&name))
}
