//! テスト用のインメモリ実装

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crop_doctor::error::{CropDoctorError, Result};
use crop_doctor::services::{
    FetchedImage, ImageSource, InlineImage, ObjectStore, RecordTable, Services, UploadOptions,
    VisionModel,
};
use crop_doctor_common::{CropImageRecord, NewRecord, RecordId, RecordPatch};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const PUBLIC_BASE: &str = "https://test.supabase.co/storage/v1/object/public/crop-pictures";

// =============================================
// ストレージ
// =============================================

#[derive(Default)]
pub struct FakeStorage {
    pub objects: Mutex<Vec<(String, UploadOptions, Vec<u8>)>>,
    pub fail_with: Option<String>,
}

impl FakeStorage {
    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().iter().map(|(k, _, _)| k.clone()).collect()
    }
}

#[async_trait]
impl ObjectStore for FakeStorage {
    async fn upload(&self, key: &str, bytes: Vec<u8>, options: &UploadOptions) -> Result<()> {
        if let Some(msg) = &self.fail_with {
            return Err(CropDoctorError::Storage(msg.clone()));
        }
        self.objects
            .lock()
            .unwrap()
            .push((key.to_string(), options.clone(), bytes));
        Ok(())
    }

    fn public_url(&self, key: &str) -> Result<String> {
        Ok(format!("{}/{}", PUBLIC_BASE, key))
    }
}

// =============================================
// テーブル
// =============================================

#[derive(Default)]
pub struct FakeTable {
    pub rows: Mutex<Vec<CropImageRecord>>,
    pub inserted: Mutex<Vec<CropImageRecord>>,
    pub patches: Mutex<Vec<(RecordId, RecordPatch)>>,
    pub fail_insert: Option<String>,
    pub fail_update: bool,
    pub recent_calls: AtomicUsize,
    next_id: AtomicI64,
}

impl FakeTable {
    pub fn failing_insert(message: &str) -> Self {
        Self {
            fail_insert: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn failing_update() -> Self {
        Self {
            fail_update: true,
            ..Default::default()
        }
    }

    /// created_at が id 秒ずつ進む行を直接追加
    pub fn seed(&self, image_url: &str) -> CropImageRecord {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let record = CropImageRecord {
            id: RecordId::Int(id),
            image_url: image_url.to_string(),
            file_name: image_url.rsplit('/').next().map(str::to_string),
            created_at: timestamp(id),
            ai_analysis_completed: Some(false),
            disease_name: None,
            cure_instructions: None,
            next_steps_if_not_curable: None,
            ai_error_message: None,
        };
        self.rows.lock().unwrap().push(record.clone());
        record
    }

    pub fn row(&self, id: &RecordId) -> Option<CropImageRecord> {
        self.rows.lock().unwrap().iter().find(|r| &r.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

pub fn timestamp(offset_secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000 + offset_secs, 0).unwrap()
}

#[async_trait]
impl RecordTable for FakeTable {
    async fn insert(&self, row: &NewRecord) -> Result<CropImageRecord> {
        if let Some(msg) = &self.fail_insert {
            return Err(CropDoctorError::DatabaseInsert(msg.clone()));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let record = CropImageRecord {
            id: RecordId::Int(id),
            image_url: row.image_url.clone(),
            file_name: row.file_name.clone(),
            created_at: timestamp(id),
            ai_analysis_completed: Some(row.ai_analysis_completed),
            disease_name: None,
            cure_instructions: None,
            next_steps_if_not_curable: None,
            ai_error_message: None,
        };
        self.rows.lock().unwrap().push(record.clone());
        self.inserted.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: &RecordId, patch: &RecordPatch) -> Result<()> {
        if self.fail_update {
            return Err(CropDoctorError::Database("update rejected".into()));
        }
        self.patches.lock().unwrap().push((id.clone(), patch.clone()));
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|r| &r.id == id) {
            row.apply(patch);
        }
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<CropImageRecord>> {
        self.recent_calls.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock().unwrap().clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn get(&self, id: &RecordId) -> Result<Option<CropImageRecord>> {
        Ok(self.row(id))
    }
}

// =============================================
// 画像取得
// =============================================

/// ストレージに保存されたバイト列をそのまま返す（`status` 指定時はそのステータスで失敗）
pub struct FakeImages {
    pub storage: Arc<FakeStorage>,
    pub status: Option<u16>,
    pub fetched: Mutex<Vec<String>>,
}

#[async_trait]
impl ImageSource for FakeImages {
    async fn fetch(&self, url: &str) -> Result<FetchedImage> {
        self.fetched.lock().unwrap().push(url.to_string());
        if let Some(status) = self.status {
            return Err(CropDoctorError::FetchStatus(status));
        }
        let key = url.rsplit('/').next().unwrap_or_default();
        let objects = self.storage.objects.lock().unwrap();
        let (_, options, bytes) = objects
            .iter()
            .find(|(k, _, _)| k == key)
            .ok_or(CropDoctorError::FetchStatus(404))?;
        Ok(FetchedImage {
            bytes: bytes.clone(),
            mime_type: options.content_type.clone(),
        })
    }
}

// =============================================
// モデル
// =============================================

#[derive(Default)]
pub struct FakeModel {
    pub replies: Mutex<VecDeque<String>>,
    pub requests: Mutex<Vec<(String, InlineImage)>>,
    pub unconfigured: bool,
}

impl FakeModel {
    pub fn replying(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            ..Default::default()
        }
    }

    pub fn push_reply(&self, reply: &str) {
        self.replies.lock().unwrap().push_back(reply.to_string());
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl VisionModel for FakeModel {
    async fn generate(&self, prompt: &str, image: &InlineImage) -> Result<String> {
        self.requests
            .lock()
            .unwrap()
            .push((prompt.to_string(), image.clone()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| CropDoctorError::ApiCall("no reply queued".into()))
    }

    fn is_configured(&self) -> bool {
        !self.unconfigured
    }
}

// =============================================
// 組み立て
// =============================================

pub struct Harness {
    pub storage: Arc<FakeStorage>,
    pub table: Arc<FakeTable>,
    pub images: Arc<FakeImages>,
    pub model: Arc<FakeModel>,
}

impl Harness {
    pub fn new(storage: FakeStorage, table: FakeTable, fetch_status: Option<u16>, model: FakeModel) -> Self {
        let storage = Arc::new(storage);
        Self {
            images: Arc::new(FakeImages {
                storage: storage.clone(),
                status: fetch_status,
                fetched: Mutex::new(Vec::new()),
            }),
            storage,
            table: Arc::new(table),
            model: Arc::new(model),
        }
    }

    pub fn with_replies(replies: &[&str]) -> Self {
        Self::new(FakeStorage::default(), FakeTable::default(), None, FakeModel::replying(replies))
    }

    pub fn services(&self) -> Services {
        Services {
            storage: self.storage.clone(),
            table: self.table.clone(),
            images: self.images.clone(),
            model: self.model.clone(),
        }
    }
}
