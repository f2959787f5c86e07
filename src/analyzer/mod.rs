//! 推論ステップ
//!
//! 画像の再取得 → Base64化 → Gemini呼び出し → JSONパース → レコード更新。
//! 途中のどこで失敗してもレコードは失敗状態（500文字まで）で上書きされる。
//! リトライ・キャッシュ・同一レコードへの同時実行の排他はしない。

pub mod fetch;
pub mod gemini;

use crate::error::{CropDoctorError, Result};
use crate::services::{InlineImage, Services};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use crop_doctor_common::{
    build_diagnosis_prompt, parse_diagnosis_response, CropImageRecord, Diagnosis, RecordId,
    RecordPatch,
};

/// 1回の推論の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutcome {
    Completed(Diagnosis),
    /// 失敗メッセージ（切り詰め前）
    Failed(String),
}

/// レコードを解析し、結果をテーブルに書き戻す
///
/// `Err` になるのは `image_url` が空のレコードのみ（書き込みはしない）。
/// それ以外の失敗は `AnalysisOutcome::Failed` として返る。
pub async fn analyze_record(
    services: &Services,
    record: &CropImageRecord,
) -> Result<AnalysisOutcome> {
    if record.image_url.trim().is_empty() {
        return Err(CropDoctorError::InvalidRecord);
    }

    if !services.model.is_configured() {
        let message = CropDoctorError::InferenceNotConfigured.to_string();
        record_failure(services, &record.id, &message).await;
        return Ok(AnalysisOutcome::Failed(message));
    }

    let saved = match diagnose(services, &record.image_url).await {
        Ok(diagnosis) => services
            .table
            .update(&record.id, &RecordPatch::success(&diagnosis))
            .await
            .map(|_| diagnosis),
        Err(e) => Err(e),
    };

    match saved {
        Ok(diagnosis) => {
            tracing::info!(id = %record.id, disease = %diagnosis.disease_name, "analysis saved");
            Ok(AnalysisOutcome::Completed(diagnosis))
        }
        Err(e) => {
            let message = e.to_string();
            tracing::warn!(id = %record.id, error = %message, "analysis failed");
            record_failure(services, &record.id, &message).await;
            Ok(AnalysisOutcome::Failed(message))
        }
    }
}

async fn diagnose(services: &Services, image_url: &str) -> Result<Diagnosis> {
    let fetched = services.images.fetch(image_url).await?;
    tracing::debug!(size = fetched.bytes.len(), mime_type = %fetched.mime_type, "fetched image");

    let image = InlineImage {
        mime_type: fetched.mime_type,
        data: STANDARD.encode(&fetched.bytes),
    };

    let prompt = build_diagnosis_prompt();
    let raw = services.model.generate(&prompt, &image).await?;

    Ok(parse_diagnosis_response(&raw)?)
}

/// 失敗状態の書き込み。これ自体の失敗はログのみ
async fn record_failure(services: &Services, id: &RecordId, message: &str) {
    if let Err(e) = services.table.update(id, &RecordPatch::failure(message)).await {
        tracing::error!(%id, error = %e, "failed to record analysis error");
    }
}
