//! ルートのオーケストレーター
//!
//! アップロード成功時にレコードを推論へ渡し、状態を `Status` で通知する。
//! 推論を試みるたびに履歴のリフレッシュトリガーを進める。

use crate::analyzer::{analyze_record, AnalysisOutcome};
use crate::error::CropDoctorError;
use crate::scanner::LocalImage;
use crate::services::Services;
use crate::upload::upload_image;
use crop_doctor_common::{CropImageRecord, RecordId, Status};
use tokio::sync::watch;

pub struct App {
    services: Services,
    refresh: watch::Sender<u64>,
}

impl App {
    pub fn new(services: Services) -> Self {
        let (refresh, _) = watch::channel(0);
        Self { services, refresh }
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// 履歴ビュー用のトリガー購読
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.refresh.subscribe()
    }

    /// 現在のトリガー値
    pub fn refresh_count(&self) -> u64 {
        *self.refresh.borrow()
    }

    /// アップロードから解析まで
    pub async fn submit(
        &self,
        image: &LocalImage,
        on_status: &mut (dyn FnMut(&Status) + Send),
    ) -> Status {
        on_status(&Status::Neutral("Upload in progress...".into()));

        let record = match upload_image(
            self.services.storage.as_ref(),
            self.services.table.as_ref(),
            image,
        )
        .await
        {
            Ok(record) => record,
            Err(e) => return Status::Failure(format!("Upload Error: {}", e)),
        };

        self.analyze(&record, on_status).await
    }

    /// 既存レコードの再解析（前回の結果は上書き）
    pub async fn reanalyze(
        &self,
        id: &RecordId,
        on_status: &mut (dyn FnMut(&Status) + Send),
    ) -> Status {
        let record = match self.services.table.get(id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                return Status::Failure(CropDoctorError::RecordNotFound(id.to_string()).to_string())
            }
            Err(e) => return Status::Failure(e.to_string()),
        };

        self.analyze(&record, on_status).await
    }

    async fn analyze(
        &self,
        record: &CropImageRecord,
        on_status: &mut (dyn FnMut(&Status) + Send),
    ) -> Status {
        on_status(&Status::Neutral(format!(
            "Analyzing image: {}...",
            record.display_name()
        )));

        let status = match analyze_record(&self.services, record).await {
            Ok(AnalysisOutcome::Completed(_)) => Status::Success(format!(
                "Analysis complete for {}! Results saved.",
                record.display_name()
            )),
            Ok(AnalysisOutcome::Failed(message)) => {
                Status::Failure(format!("AI Analysis Error: {}", message))
            }
            Err(e) => return Status::Failure(e.to_string()),
        };

        self.refresh.send_modify(|n| *n += 1);
        status
    }
}
