use super::{read_error, SupabaseEndpoint};
use crate::error::{CropDoctorError, Result};
use crate::services::{ObjectStore, UploadOptions};
use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use reqwest::{RequestBuilder, Url};

/// Supabase Storage（公開バケット）
pub struct SupabaseStorage {
    http: reqwest::Client,
    endpoint: SupabaseEndpoint,
    bucket: String,
}

impl SupabaseStorage {
    pub fn new(http: reqwest::Client, endpoint: SupabaseEndpoint, bucket: &str) -> Self {
        Self {
            http,
            endpoint,
            bucket: bucket.to_string(),
        }
    }

    fn object_url(&self, key: &str) -> Result<Url> {
        self.endpoint
            .url(&["storage", "v1", "object", &self.bucket, key])
    }

    fn upload_request(
        &self,
        key: &str,
        bytes: Vec<u8>,
        options: &UploadOptions,
    ) -> Result<RequestBuilder> {
        let url = self.object_url(key)?;
        tracing::debug!(%url, size = bytes.len(), "uploading object");

        Ok(self
            .endpoint
            .authorize(self.http.post(url))?
            .header(CONTENT_TYPE, &options.content_type)
            .header(CACHE_CONTROL, format!("max-age={}", options.cache_control_secs))
            .header("x-upsert", options.upsert.to_string())
            .body(bytes))
    }
}

#[async_trait]
impl ObjectStore for SupabaseStorage {
    async fn upload(&self, key: &str, bytes: Vec<u8>, options: &UploadOptions) -> Result<()> {
        let response = self
            .upload_request(key, bytes, options)?
            .send()
            .await
            .map_err(|e| CropDoctorError::Storage(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CropDoctorError::Storage(read_error(response).await));
        }

        Ok(())
    }

    fn public_url(&self, key: &str) -> Result<String> {
        self.endpoint
            .url(&["storage", "v1", "object", "public", &self.bucket, key])
            .map(|u| u.to_string())
            .map_err(|e| {
                tracing::debug!(error = %e, "public URL unavailable");
                CropDoctorError::PublicUrl
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> SupabaseStorage {
        SupabaseStorage::new(
            reqwest::Client::new(),
            SupabaseEndpoint::new(Some("https://abc.supabase.co".into()), Some("anon".into())),
            "crop-pictures",
        )
    }

    #[test]
    fn test_object_url() {
        let url = storage().object_url("1700000000000_leaf.jpg").unwrap();
        assert_eq!(
            url.as_str(),
            "https://abc.supabase.co/storage/v1/object/crop-pictures/1700000000000_leaf.jpg"
        );
    }

    #[test]
    fn test_upload_request() {
        let request = storage()
            .upload_request("1_leaf.jpg", vec![0xFF, 0xD8], &UploadOptions::for_image("image/jpeg"))
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.method(), &reqwest::Method::POST);
        assert_eq!(
            request.url().as_str(),
            "https://abc.supabase.co/storage/v1/object/crop-pictures/1_leaf.jpg"
        );
        assert_eq!(request.headers()["content-type"], "image/jpeg");
        assert_eq!(request.headers()["cache-control"], "max-age=3600");
        assert_eq!(request.headers()["x-upsert"], "false");
        assert_eq!(request.headers()["apikey"], "anon");
        assert_eq!(request.body().and_then(|b| b.as_bytes()), Some(&[0xFF, 0xD8][..]));
    }

    #[test]
    fn test_public_url() {
        let url = storage().public_url("1700000000000_leaf.jpg").unwrap();
        assert_eq!(
            url,
            "https://abc.supabase.co/storage/v1/object/public/crop-pictures/1700000000000_leaf.jpg"
        );
    }

    #[test]
    fn test_public_url_without_endpoint() {
        let storage = SupabaseStorage::new(
            reqwest::Client::new(),
            SupabaseEndpoint::default(),
            "crop-pictures",
        );
        assert!(matches!(storage.public_url("k"), Err(CropDoctorError::PublicUrl)));
    }

    #[tokio::test]
    async fn test_upload_without_endpoint_fails_before_network() {
        let storage = SupabaseStorage::new(
            reqwest::Client::new(),
            SupabaseEndpoint::default(),
            "crop-pictures",
        );
        let result = storage
            .upload("k.jpg", vec![1, 2, 3], &UploadOptions::for_image("image/jpeg"))
            .await;
        assert!(matches!(result, Err(CropDoctorError::MissingSetting("SUPABASE_URL"))));
    }
}
