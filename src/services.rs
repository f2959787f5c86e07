//! 外部サービスの境界
//!
//! オブジェクトストレージ・テーブル・画像取得・マルチモーダルモデルの4つ。
//! 各コンポーネントは `Services` を明示的に受け取り、グローバルなクライアントは持たない。

use crate::analyzer::fetch::HttpImageSource;
use crate::analyzer::gemini::GeminiClient;
use crate::config::Config;
use crate::error::{CropDoctorError, Result};
use crate::supabase::{PostgrestTable, SupabaseEndpoint, SupabaseStorage};
use async_trait::async_trait;
use crop_doctor_common::{CropImageRecord, NewRecord, RecordId, RecordPatch};
use std::sync::Arc;
use std::time::Duration;

/// ストレージへの書き込みオプション
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    pub content_type: String,
    pub cache_control_secs: u32,
    pub upsert: bool,
}

impl UploadOptions {
    pub fn for_image(content_type: &str) -> Self {
        Self {
            content_type: content_type.to_string(),
            cache_control_secs: 3600,
            upsert: false,
        }
    }
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(&self, key: &str, bytes: Vec<u8>, options: &UploadOptions) -> Result<()>;

    fn public_url(&self, key: &str) -> Result<String>;
}

#[async_trait]
pub trait RecordTable: Send + Sync {
    /// 1行挿入し、採番済みの行を返す
    async fn insert(&self, row: &NewRecord) -> Result<CropImageRecord>;

    async fn update(&self, id: &RecordId, patch: &RecordPatch) -> Result<()>;

    /// created_at 降順で最大 `limit` 件
    async fn recent(&self, limit: usize) -> Result<Vec<CropImageRecord>>;

    async fn get(&self, id: &RecordId) -> Result<Option<CropImageRecord>>;
}

/// ネットワーク越しに取得した画像
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedImage>;
}

/// Base64エンコード済みのインライン画像
#[derive(Debug, Clone)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

#[async_trait]
pub trait VisionModel: Send + Sync {
    /// プロンプトと画像を送り、モデルの生テキストを返す
    async fn generate(&self, prompt: &str, image: &InlineImage) -> Result<String>;

    /// APIキー未設定ならfalse（ネットワークには出ない）
    fn is_configured(&self) -> bool {
        true
    }
}

#[derive(Clone)]
pub struct Services {
    pub storage: Arc<dyn ObjectStore>,
    pub table: Arc<dyn RecordTable>,
    pub images: Arc<dyn ImageSource>,
    pub model: Arc<dyn VisionModel>,
}

impl Services {
    /// 設定から本番用クライアントを組み立てる
    ///
    /// 必須設定が欠けていても構築は成功し、呼び出し時に個別にエラーとなる。
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| CropDoctorError::Config(format!("failed to build HTTP client: {}", e)))?;

        let endpoint = SupabaseEndpoint::from_config(config);

        Ok(Self {
            storage: Arc::new(SupabaseStorage::new(
                http.clone(),
                endpoint.clone(),
                &config.bucket,
            )),
            table: Arc::new(PostgrestTable::new(http.clone(), endpoint, &config.table)),
            images: Arc::new(HttpImageSource::new(http.clone())),
            model: Arc::new(GeminiClient::new(
                http,
                config.gemini_api_key.clone(),
                &config.model,
            )),
        })
    }
}
