fn main() {
    // デスクトップUIを含める場合のみTauriのビルド処理を実行
    #[cfg(feature = "gui")]
    tauri_build::build();
}
