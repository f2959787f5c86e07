//! アップロード済み画像の再取得

use crate::error::{CropDoctorError, Result};
use crate::scanner::mime_for_extension;
use crate::services::{FetchedImage, ImageSource};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

const DEFAULT_MIME_TYPE: &str = "image/jpeg";

pub struct HttpImageSource {
    http: reqwest::Client,
}

impl HttpImageSource {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch(&self, url: &str) -> Result<FetchedImage> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| CropDoctorError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CropDoctorError::FetchStatus(status.as_u16()));
        }

        let header_mime = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CropDoctorError::Fetch(e.to_string()))?;

        Ok(FetchedImage {
            mime_type: resolve_mime_type(header_mime.as_deref(), url),
            bytes: bytes.to_vec(),
        })
    }
}

/// Content-Type → URLの拡張子 → image/jpeg の順で決める
pub fn resolve_mime_type(content_type: Option<&str>, url: &str) -> String {
    if let Some(mime) = content_type
        .and_then(|ct| ct.split(';').next())
        .map(str::trim)
        .filter(|m| m.starts_with("image/"))
    {
        return mime.to_string();
    }

    let path = url.split(|c| c == '?' || c == '#').next().unwrap_or(url);
    let last_segment = path.rsplit('/').next().unwrap_or(path);
    last_segment
        .rsplit_once('.')
        .and_then(|(_, ext)| mime_for_extension(ext))
        .unwrap_or(DEFAULT_MIME_TYPE)
        .to_string()
}
