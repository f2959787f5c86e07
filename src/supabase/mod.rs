//! Supabase（Storage + PostgREST）クライアント

mod storage;
mod table;

pub use storage::SupabaseStorage;
pub use table::PostgrestTable;

use crate::config::Config;
use crate::error::{CropDoctorError, Result};
use reqwest::{RequestBuilder, Response, Url};

/// プロジェクトURLと匿名キー（どちらも未設定のまま構築できる）
#[derive(Debug, Clone, Default)]
pub struct SupabaseEndpoint {
    url: Option<String>,
    anon_key: Option<String>,
}

impl SupabaseEndpoint {
    pub fn new(url: Option<String>, anon_key: Option<String>) -> Self {
        Self { url, anon_key }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.supabase_url.clone(), config.supabase_anon_key.clone())
    }

    /// ベースURLにパスセグメントを連結（セグメントはパーセントエンコードされる）
    pub fn url(&self, segments: &[&str]) -> Result<Url> {
        let base = self
            .url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or(CropDoctorError::MissingSetting("SUPABASE_URL"))?;

        let mut url = Url::parse(base.trim())
            .map_err(|e| CropDoctorError::Config(format!("invalid SUPABASE_URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| CropDoctorError::Config("invalid SUPABASE_URL: not a base URL".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `apikey` と `Authorization: Bearer` を付与
    pub fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let key = self
            .anon_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(CropDoctorError::MissingSetting("SUPABASE_ANON_KEY"))?;

        Ok(request.header("apikey", key).bearer_auth(key))
    }
}

/// エラーレスポンスを1行の説明に
pub(crate) async fn read_error(response: Response) -> String {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    describe_error(status, &body)
}

/// Storage は `{"message"}` / `{"error"}`、PostgREST は `{"message","details","hint"}` を返す
pub(crate) fn describe_error(status: u16, body: &str) -> String {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["message", "error_description", "error", "msg"]
                .iter()
                .find_map(|k| v.get(*k).and_then(|m| m.as_str()).map(str::to_string))
        });

    match detail {
        Some(d) => format!("{} (HTTP {})", d, status),
        None if body.trim().is_empty() => format!("HTTP {}", status),
        None => format!("{} (HTTP {})", body.trim(), status),
    }
}
