//! キャラクター画像の解決
//!
//! 画像ファイル名はキャラクター名から決まる（`display::image_file_name`）。
//! - `remote` 方式: ベースURLに連結したURLをそのまま返す
//! - `cached` 方式: 初回だけ取得してキャッシュディレクトリに保存し、以降はキャッシュを返す
//!
//! 取得や保存に失敗した場合は警告を出してプレースホルダーを返す。

use anyhow::{Context, Result};
use base64::Engine as _;
use image::{ImageBuffer, ImageFormat, Rgb};
use serde::Serialize;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::display::{image_file_name, Character};
use crate::model::config::{ImageMode, ImageSettings};

/// 外部画像の取得元が使えないときの代替URL
pub const PLACEHOLDER_URL: &str = "https://placehold.co/300x300/cccccc/ffffff?text=Image+Missing";

const PLACEHOLDER_SIZE: u32 = 300;

/// 画像の取得処理
pub trait ImageFetcher {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>>;
}

/// HTTP(S)で画像を取得する（タイムアウト付き）
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("HTTPクライアントの作成に失敗しました")?;
        Ok(Self { client })
    }
}

impl ImageFetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .context(format!("画像の取得に失敗しました: {}", url))?
            .error_for_status()
            .context(format!("画像の取得に失敗しました: {}", url))?;
        let bytes = response.bytes().context("画像データの読み込みに失敗しました")?;
        Ok(bytes.to_vec())
    }
}

/// 解決された画像
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedImage {
    /// 表示側が直接読み込むURL
    Remote(Url),
    /// ローカルにキャッシュされたファイル
    Cached(PathBuf),
    /// 取得できなかった
    Placeholder,
}

impl ResolvedImage {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, ResolvedImage::Placeholder)
    }

    /// 表示用の参照（URL、ファイルパス、またはプレースホルダーURL）
    pub fn describe(&self) -> String {
        match self {
            ResolvedImage::Remote(url) => url.to_string(),
            ResolvedImage::Cached(path) => path.display().to_string(),
            ResolvedImage::Placeholder => PLACEHOLDER_URL.to_string(),
        }
    }

    /// Webview の `<img src>` に渡せる文字列
    ///
    /// キャッシュとプレースホルダーは data URL に変換する
    pub fn to_display_src(&self) -> String {
        match self {
            ResolvedImage::Remote(url) => url.to_string(),
            ResolvedImage::Cached(path) => match std::fs::read(path) {
                Ok(bytes) => to_data_url(&bytes),
                Err(e) => {
                    log::warn!("キャッシュ画像を読み込めません {}: {}", path.display(), e);
                    placeholder_src()
                }
            },
            ResolvedImage::Placeholder => placeholder_src(),
        }
    }
}

/// 表示側へ渡す画像情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImagePayload {
    /// `<img src>` に渡す値（URL または data URL）
    pub src: String,
    pub placeholder: bool,
    /// `src` を表示できなかったときに使う値
    pub fallback: String,
}

impl ResolvedImage {
    pub fn to_payload(&self) -> ImagePayload {
        ImagePayload {
            src: self.to_display_src(),
            placeholder: self.is_placeholder(),
            fallback: placeholder_src(),
        }
    }
}

/// 画像バイト列を data URL に変換
pub fn to_data_url(bytes: &[u8]) -> String {
    let mime = image::guess_format(bytes)
        .map(|f| f.to_mime_type())
        .unwrap_or("application/octet-stream");
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{};base64,{}", mime, encoded)
}

/// プレースホルダー画像（灰色の正方形に枠線）をPNGで生成
pub fn render_placeholder_png() -> Result<Vec<u8>> {
    let size = PLACEHOLDER_SIZE;
    let img = ImageBuffer::from_fn(size, size, |x, y| {
        let border = x < 4 || y < 4 || x >= size - 4 || y >= size - 4;
        let diagonal = x == y || x + y == size - 1;
        if border || diagonal {
            Rgb([0xaa, 0xaa, 0xaa])
        } else {
            Rgb([0xcc, 0xcc, 0xcc])
        }
    });

    let mut png = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .context("プレースホルダー画像の生成に失敗しました")?;
    Ok(png)
}

fn placeholder_src() -> String {
    match render_placeholder_png() {
        Ok(png) => to_data_url(&png),
        Err(e) => {
            log::warn!("{}", e);
            PLACEHOLDER_URL.to_string()
        }
    }
}

/// キャラクター名から画像を解決する（ファイル名ごとにメモ化）
pub struct ImageResolver<F: ImageFetcher = HttpFetcher> {
    mode: ImageMode,
    base_url: Url,
    extension: String,
    cache_dir: PathBuf,
    fetcher: F,
    memo: HashMap<String, PathBuf>,
}

impl ImageResolver<HttpFetcher> {
    /// 設定からHTTP取得を使う解決器を作成
    pub fn from_settings(settings: &ImageSettings) -> Result<Self> {
        let fetcher = HttpFetcher::new(Duration::from_millis(settings.timeout_ms))?;
        Self::new(settings, fetcher)
    }
}

impl<F: ImageFetcher> ImageResolver<F> {
    pub fn new(settings: &ImageSettings, fetcher: F) -> Result<Self> {
        let mut base = settings.base_url.trim().to_string();
        // join で最後のセグメントが置き換わらないように末尾を `/` にそろえる
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .context(format!("画像のベースURLが不正です: {}", settings.base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("画像のベースURLが不正です: {}", settings.base_url);
        }

        Ok(Self {
            mode: settings.mode,
            base_url,
            extension: settings.extension.trim_start_matches('.').to_string(),
            cache_dir: PathBuf::from(&settings.cache_dir),
            fetcher,
            memo: HashMap::new(),
        })
    }

    pub fn mode(&self) -> ImageMode {
        self.mode
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// キャラクター名に対応するリモートURL
    ///
    /// 既知のキャラクター以外はエラー
    pub fn image_url(&self, name: &str) -> Result<Url> {
        let character = Character::from_name(name)
            .ok_or_else(|| anyhow::anyhow!("未知のキャラクター名です: {:?}", name))?;
        let file_name = image_file_name(character.name(), &self.extension);
        self.base_url
            .join(&file_name)
            .context(format!("画像URLを組み立てられません: {}", file_name))
    }

    /// 画像を解決する（失敗してもパニックせずプレースホルダーを返す）
    pub fn resolve(&mut self, name: &str) -> ResolvedImage {
        let url = match self.image_url(name) {
            Ok(url) => url,
            Err(e) => {
                log::warn!("[image] {:#}", e);
                return ResolvedImage::Placeholder;
            }
        };

        match self.mode {
            ImageMode::Remote => ResolvedImage::Remote(url),
            ImageMode::Cached => {
                let file_name = image_file_name(name, &self.extension);
                if let Some(path) = self.memo.get(&file_name) {
                    return ResolvedImage::Cached(path.clone());
                }

                match self.fetch_into_cache(&file_name, &url) {
                    Ok(path) => {
                        self.memo.insert(file_name, path.clone());
                        ResolvedImage::Cached(path)
                    }
                    Err(e) => {
                        log::warn!("[image] {} の画像を取得できません: {:#}", name, e);
                        ResolvedImage::Placeholder
                    }
                }
            }
        }
    }

    /// キャッシュに無ければ取得して保存し、キャッシュファイルのパスを返す
    fn fetch_into_cache(&self, file_name: &str, url: &Url) -> Result<PathBuf> {
        let path = self.cache_dir.join(file_name);
        if path.is_file() {
            log::info!("[image] キャッシュを使用: {}", path.display());
            return Ok(path);
        }

        log::info!("[image] 取得中: {}", url);
        let bytes = self.fetcher.fetch(url)?;

        // HTMLのエラーページなどを画像として保存しない
        image::load_from_memory(&bytes).context(format!("画像として解釈できません: {}", url))?;

        std::fs::create_dir_all(&self.cache_dir)
            .context(format!("キャッシュディレクトリを作成できません: {:?}", self.cache_dir))?;

        // 書き込み途中のファイルが正式な名前で残らないよう一時名から置き換える
        let part_path = self.cache_dir.join(format!("{}.part", file_name));
        std::fs::write(&part_path, &bytes)
            .context(format!("キャッシュを書き込めません: {:?}", part_path))?;
        if let Err(e) = std::fs::rename(&part_path, &path) {
            let _ = std::fs::remove_file(&part_path);
            return Err(e).context(format!("キャッシュを保存できません: {:?}", path));
        }

        log::info!("[image] キャッシュに保存: {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct StubFetcher {
        body: Option<Vec<u8>>,
        calls: Cell<usize>,
    }

    impl StubFetcher {
        fn serving(body: Vec<u8>) -> Self {
            Self { body: Some(body), calls: Cell::new(0) }
        }

        fn failing() -> Self {
            Self { body: None, calls: Cell::new(0) }
        }
    }

    impl ImageFetcher for StubFetcher {
        fn fetch(&self, url: &Url) -> Result<Vec<u8>> {
            self.calls.set(self.calls.get() + 1);
            self.body
                .clone()
                .ok_or_else(|| anyhow::anyhow!("unreachable: {}", url))
        }
    }

    fn settings(dir: &Path, mode: ImageMode) -> ImageSettings {
        ImageSettings {
            mode,
            base_url: "https://example.com/images".to_string(),
            extension: "png".to_string(),
            cache_dir: dir.join("cache").to_string_lossy().to_string(),
            timeout_ms: 500,
        }
    }

    fn resolver_in(dir: &Path, mode: ImageMode, fetcher: StubFetcher) -> ImageResolver<StubFetcher> {
        ImageResolver::new(&settings(dir, mode), fetcher).unwrap()
    }

    #[test]
    fn test_image_url() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = resolver_in(dir.path(), ImageMode::Remote, StubFetcher::failing());
        assert_eq!(
            resolver.image_url("Walter White").unwrap().as_str(),
            "https://example.com/images/walter_white.png"
        );
    }

    #[test]
    fn test_remote_mode_does_not_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let mut resolver = resolver_in(dir.path(), ImageMode::Remote, StubFetcher::failing());
        let resolved = resolver.resolve("Sherlock Holmes");
        assert_eq!(
            resolved.describe(),
            "https://example.com/images/sherlock_holmes.png"
        );
        assert_eq!(resolver.fetcher.calls.get(), 0);
    }

    #[test]
    fn test_cached_mode_fetches_once() {
        let dir = tempfile::tempdir().unwrap();
        let png = render_placeholder_png().unwrap();
        let mut resolver = resolver_in(dir.path(), ImageMode::Cached, StubFetcher::serving(png.clone()));

        let first = resolver.resolve("Walter White");
        let expected = dir.path().join("cache").join("walter_white.png");
        assert_eq!(first, ResolvedImage::Cached(expected.clone()));
        assert_eq!(std::fs::read(&expected).unwrap(), png);
        assert!(!dir.path().join("cache").join("walter_white.png.part").exists());

        let second = resolver.resolve("Walter White");
        assert_eq!(second, first);
        assert_eq!(resolver.fetcher.calls.get(), 1);
    }

    #[test]
    fn test_existing_cache_file_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("cache");
        std::fs::create_dir_all(&cache).unwrap();
        std::fs::write(cache.join("nezuko.png"), render_placeholder_png().unwrap()).unwrap();

        let mut resolver = resolver_in(dir.path(), ImageMode::Cached, StubFetcher::failing());
        assert_eq!(resolver.resolve("Nezuko"), ResolvedImage::Cached(cache.join("nezuko.png")));
        assert_eq!(resolver.fetcher.calls.get(), 0);
    }

    #[test]
    fn test_unreachable_image_degrades_to_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let mut resolver = resolver_in(dir.path(), ImageMode::Cached, StubFetcher::failing());

        assert_eq!(resolver.resolve("Batman"), ResolvedImage::Placeholder);
        // 失敗はメモ化しない
        assert_eq!(resolver.resolve("Batman"), ResolvedImage::Placeholder);
        assert_eq!(resolver.fetcher.calls.get(), 2);
    }

    #[test]
    fn test_unknown_name_is_never_fetched_or_written() {
        let dir = tempfile::tempdir().unwrap();
        let png = render_placeholder_png().unwrap();
        let mut resolver = resolver_in(dir.path(), ImageMode::Cached, StubFetcher::serving(png));

        for name in ["../escaped", "..\\escaped", "a/b", "Homer Simpson", ""] {
            assert_eq!(resolver.resolve(name), ResolvedImage::Placeholder, "{:?}", name);
        }
        assert_eq!(resolver.fetcher.calls.get(), 0);
        assert!(!dir.path().join("escaped.png").exists());
        assert!(!dir.path().join("cache").exists());

        let mut remote = resolver_in(dir.path(), ImageMode::Remote, StubFetcher::failing());
        assert_eq!(remote.resolve("../escaped"), ResolvedImage::Placeholder);
        assert!(remote.image_url("../escaped").is_err());
    }

    #[test]
    fn test_non_image_body_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = StubFetcher::serving(b"<html>404</html>".to_vec());
        let mut resolver = resolver_in(dir.path(), ImageMode::Cached, fetcher);

        assert!(resolver.resolve("Ron Swanson").is_placeholder());
        assert!(!dir.path().join("cache").join("ron_swanson.png").exists());
    }

    #[test]
    fn test_http_fetcher_unreachable_host() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings(dir.path(), ImageMode::Cached);
        // discard ポートへの接続は拒否される
        settings.base_url = "http://127.0.0.1:9/images/".to_string();
        let mut resolver = ImageResolver::from_settings(&settings).unwrap();
        assert_eq!(resolver.resolve("Daenerys"), ResolvedImage::Placeholder);
    }

    #[test]
    fn test_invalid_base_url() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings(dir.path(), ImageMode::Cached);
        settings.base_url = "not a url".to_string();
        assert!(ImageResolver::new(&settings, StubFetcher::failing()).is_err());
    }

    #[test]
    fn test_display_src() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("andy_dwyer.png");
        std::fs::write(&path, render_placeholder_png().unwrap()).unwrap();

        assert!(ResolvedImage::Cached(path).to_display_src().starts_with("data:image/png;base64,"));
        assert!(ResolvedImage::Placeholder.to_display_src().starts_with("data:image/png;base64,"));
        assert!(ResolvedImage::Cached(dir.path().join("missing.png"))
            .to_display_src()
            .starts_with("data:image/png;base64,"));

        let url = Url::parse("https://example.com/a.png").unwrap();
        assert_eq!(ResolvedImage::Remote(url).to_display_src(), "https://example.com/a.png");
    }
}
