//! アップロードステップ
//!
//! ストレージへの保存 → 公開URL取得 → 解析待ちレコードの挿入。
//! ストレージ保存と挿入はトランザクションではないため、
//! 挿入に失敗したオブジェクトは残る（警告ログのみ）。

use crate::error::Result;
use crate::scanner::LocalImage;
use crate::services::{ObjectStore, RecordTable, UploadOptions};
use crop_doctor_common::{CropImageRecord, NewRecord};

/// `<unixミリ秒>_<空白を_に置換したファイル名>`
pub fn storage_key(file_name: &str, timestamp_millis: i64) -> String {
    let sanitized: String = file_name
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    format!("{}_{}", timestamp_millis, sanitized)
}

pub async fn upload_image(
    storage: &dyn ObjectStore,
    table: &dyn RecordTable,
    image: &LocalImage,
) -> Result<CropImageRecord> {
    let key = storage_key(&image.file_name, chrono::Utc::now().timestamp_millis());

    storage
        .upload(&key, image.bytes.clone(), &UploadOptions::for_image(image.mime_type))
        .await?;
    tracing::info!(%key, "file uploaded to storage");

    let public_url = storage.public_url(&key)?;
    tracing::debug!(%public_url, "resolved public URL");

    let record = table
        .insert(&NewRecord::pending(public_url, image.file_name.as_str()))
        .await
        .map_err(|e| {
            tracing::warn!(%key, "database insert failed; stored object is orphaned");
            e
        })?;
    tracing::info!(id = %record.id, "inserted pending record");

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_key() {
        assert_eq!(storage_key("leaf.jpg", 1700000000000), "1700000000000_leaf.jpg");
    }

    #[test]
    fn test_storage_key_replaces_each_whitespace() {
        assert_eq!(storage_key("my  leaf\tphoto.png", 1), "1_my__leaf_photo.png");
    }
}
