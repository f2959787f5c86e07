use super::{read_error, SupabaseEndpoint};
use crate::error::{CropDoctorError, Result};
use crate::services::RecordTable;
use async_trait::async_trait;
use crop_doctor_common::{CropImageRecord, NewRecord, RecordId, RecordPatch};
use reqwest::{RequestBuilder, Url};

/// PostgREST 経由のテーブルアクセス
pub struct PostgrestTable {
    http: reqwest::Client,
    endpoint: SupabaseEndpoint,
    table: String,
}

impl PostgrestTable {
    pub fn new(http: reqwest::Client, endpoint: SupabaseEndpoint, table: &str) -> Self {
        Self {
            http,
            endpoint,
            table: table.to_string(),
        }
    }

    fn table_url(&self) -> Result<Url> {
        self.endpoint.url(&["rest", "v1", &self.table])
    }

    fn select_request(&self, query: &[(&str, String)]) -> Result<RequestBuilder> {
        Ok(self
            .endpoint
            .authorize(self.http.get(self.table_url()?))?
            .query(query))
    }

    fn insert_request(&self, row: &NewRecord) -> Result<RequestBuilder> {
        Ok(self
            .endpoint
            .authorize(self.http.post(self.table_url()?))?
            .header("Prefer", "return=representation")
            .json(&[row]))
    }

    fn update_request(&self, id: &RecordId, patch: &RecordPatch) -> Result<RequestBuilder> {
        Ok(self
            .endpoint
            .authorize(self.http.patch(self.table_url()?))?
            .header("Prefer", "return=minimal")
            .query(&[("id", id_filter(id))])
            .json(patch))
    }

    async fn select(&self, query: &[(&str, String)]) -> Result<Vec<CropImageRecord>> {
        let response = self
            .select_request(query)?
            .send()
            .await
            .map_err(|e| CropDoctorError::Database(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CropDoctorError::Database(read_error(response).await));
        }

        response
            .json::<Vec<CropImageRecord>>()
            .await
            .map_err(|e| CropDoctorError::Database(format!("unexpected rows: {}", e)))
    }
}

fn id_filter(id: &RecordId) -> String {
    format!("eq.{}", id)
}

fn recent_query(limit: usize) -> [(&'static str, String); 3] {
    [
        ("select", "*".to_string()),
        ("order", "created_at.desc".to_string()),
        ("limit", limit.to_string()),
    ]
}

fn get_query(id: &RecordId) -> [(&'static str, String); 3] {
    [
        ("select", "*".to_string()),
        ("id", id_filter(id)),
        ("limit", "1".to_string()),
    ]
}

#[async_trait]
impl RecordTable for PostgrestTable {
    async fn insert(&self, row: &NewRecord) -> Result<CropImageRecord> {
        let response = self
            .insert_request(row)?
            .send()
            .await
            .map_err(|e| CropDoctorError::DatabaseInsert(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CropDoctorError::DatabaseInsert(read_error(response).await));
        }

        let rows: Vec<CropImageRecord> = response
            .json()
            .await
            .map_err(|e| CropDoctorError::DatabaseInsert(format!("unexpected row: {}", e)))?;

        rows.into_iter()
            .next()
            .ok_or_else(|| CropDoctorError::DatabaseInsert("no row returned".into()))
    }

    async fn update(&self, id: &RecordId, patch: &RecordPatch) -> Result<()> {
        let response = self
            .update_request(id, patch)?
            .send()
            .await
            .map_err(|e| CropDoctorError::Database(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CropDoctorError::Database(read_error(response).await));
        }

        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<CropImageRecord>> {
        self.select(&recent_query(limit)).await
    }

    async fn get(&self, id: &RecordId) -> Result<Option<CropImageRecord>> {
        let rows = self.select(&get_query(id)).await?;
        Ok(rows.into_iter().next())
    }
}
