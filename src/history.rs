//! 履歴ビュー
//!
//! 直近N件（既定20件）を created_at 降順で読み込む読み取り専用ビュー。
//! リフレッシュトリガーの値が変わるたびに再クエリする。

use crate::error::Result;
use crate::services::RecordTable;
use crop_doctor_common::{AnalysisState, CropImageRecord};
use std::fmt::Write as _;
use std::sync::Arc;
use tokio::sync::watch;

/// 1回の読み込み結果
#[derive(Debug, Clone)]
pub enum HistoryState {
    Loaded(Vec<CropImageRecord>),
    Failed(String),
}

/// 直近 `limit` 件を取得（件数と順序はここでも保証する）
pub async fn fetch_history(table: &dyn RecordTable, limit: usize) -> Result<Vec<CropImageRecord>> {
    let mut records = table.recent(limit).await?;
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    records.truncate(limit);
    Ok(records)
}

pub struct HistoryView {
    table: Arc<dyn RecordTable>,
    limit: usize,
}

impl HistoryView {
    pub fn new(table: Arc<dyn RecordTable>, limit: usize) -> Self {
        Self { table, limit }
    }

    pub async fn load(&self) -> HistoryState {
        match fetch_history(self.table.as_ref(), self.limit).await {
            Ok(records) => HistoryState::Loaded(records),
            Err(e) => {
                tracing::error!(error = %e, "error fetching history");
                HistoryState::Failed(e.to_string())
            }
        }
    }

    /// トリガーが変わるたびに再読み込み。送信側が閉じたら終了
    ///
    /// 短時間に複数回変わった場合はまとめて1回だけ読み込む。
    pub async fn follow(
        self,
        mut trigger: watch::Receiver<u64>,
        mut on_update: impl FnMut(HistoryState) + Send,
    ) {
        while trigger.changed().await.is_ok() {
            let value = *trigger.borrow_and_update();
            tracing::debug!(trigger = value, "refreshing history");
            on_update(self.load().await);
        }
    }
}

pub fn render_history(state: &HistoryState) -> String {
    match state {
        HistoryState::Failed(message) => format!("Error loading history: {}", message),
        HistoryState::Loaded(records) if records.is_empty() => {
            "No images uploaded yet. Upload an image to see its analysis here.".to_string()
        }
        HistoryState::Loaded(records) => {
            let mut out = String::from("Upload History & Analysis\n");
            for record in records {
                out.push('\n');
                out.push_str(&render_record(record));
            }
            out
        }
    }
}

pub fn render_record(record: &CropImageRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "#{} {}", record.id, record.image_url);
    let _ = writeln!(
        out,
        "  Uploaded: {}",
        record.created_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S")
    );
    let _ = writeln!(out, "  File: {}", record.display_name());

    match record.state() {
        AnalysisState::Pending if record.ai_analysis_completed == Some(false) => {
            let _ = writeln!(out, "  Status: Analysis initiated...");
        }
        AnalysisState::Pending => {
            let _ = writeln!(out, "  Status: Analysis pending or in progress...");
        }
        AnalysisState::Succeeded(diagnosis) => {
            let or = |s: &str, fallback: &'static str| {
                if s.trim().is_empty() { fallback.to_string() } else { s.to_string() }
            };
            let _ = writeln!(out, "  AI Analysis:");
            let _ = writeln!(out, "    Disease: {}", or(&diagnosis.disease_name, "Not identified"));
            let _ = writeln!(
                out,
                "    Cure/Management: {}",
                or(&diagnosis.cure_instructions, "No specific instructions provided.")
            );
            let _ = writeln!(
                out,
                "    Next Steps: {}",
                or(
                    diagnosis.next_steps_if_not_curable.as_deref().unwrap_or_default(),
                    "No specific next steps provided."
                )
            );
        }
        AnalysisState::Failed(message) => {
            let _ = writeln!(out, "  Analysis Error: {}", message);
        }
    }

    out
}
