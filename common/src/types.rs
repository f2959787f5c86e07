//! 診断レコードの型定義
//!
//! CLIとライブラリで共有される型:
//! - CropImageRecord: `crop_images` テーブルの1行
//! - NewRecord: アップロード直後に挿入する行
//! - RecordPatch: 解析結果の書き戻し（成功/失敗どちらも全列を上書き）
//! - Diagnosis: AIレスポンスから取り出した診断内容

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// エラーメッセージの最大文字数
pub const MAX_ERROR_MESSAGE_CHARS: usize = 500;

/// データベースが採番するレコードID（bigint / uuid どちらのテーブルにも対応）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(n) => write!(f, "{}", n),
            RecordId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl std::str::FromStr for RecordId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("record id must not be empty".to_string());
        }
        Ok(s.parse::<i64>()
            .map(RecordId::Int)
            .unwrap_or_else(|_| RecordId::Text(s.to_string())))
    }
}

/// AI診断結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub disease_name: String,
    pub cure_instructions: String,
    #[serde(default)]
    pub next_steps_if_not_curable: Option<String>,
}

/// `crop_images` テーブルの1行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropImageRecord {
    pub id: RecordId,
    pub image_url: String,
    /// 旧スキーマの `image_name` 列も読み取る
    #[serde(default, alias = "image_name")]
    pub file_name: Option<String>,
    pub created_at: DateTime<Utc>,
    /// None = 未解析, Some(false) = 解析待ち/失敗, Some(true) = 成功
    #[serde(default)]
    pub ai_analysis_completed: Option<bool>,
    #[serde(default)]
    pub disease_name: Option<String>,
    #[serde(default)]
    pub cure_instructions: Option<String>,
    #[serde(default)]
    pub next_steps_if_not_curable: Option<String>,
    #[serde(default)]
    pub ai_error_message: Option<String>,
}

/// レコードの解析状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisState {
    Pending,
    Succeeded(Diagnosis),
    Failed(String),
}

impl CropImageRecord {
    /// 列の値から解析状態を導出
    ///
    /// `ai_analysis_completed = false` でもエラーメッセージが無ければ
    /// 挿入直後（解析開始前）とみなす。
    pub fn state(&self) -> AnalysisState {
        if self.ai_analysis_completed == Some(true) {
            return AnalysisState::Succeeded(Diagnosis {
                disease_name: self.disease_name.clone().unwrap_or_default(),
                cure_instructions: self.cure_instructions.clone().unwrap_or_default(),
                next_steps_if_not_curable: self.next_steps_if_not_curable.clone(),
            });
        }

        match self.ai_error_message.as_deref() {
            Some(msg) if !msg.is_empty() => AnalysisState::Failed(msg.to_string()),
            _ => AnalysisState::Pending,
        }
    }

    /// 表示用のファイル名
    pub fn display_name(&self) -> &str {
        self.file_name.as_deref().unwrap_or("N/A")
    }

    /// パッチを適用（テスト用フェイクやローカル表示の更新に使う）
    pub fn apply(&mut self, patch: &RecordPatch) {
        self.ai_analysis_completed = Some(patch.ai_analysis_completed);
        self.disease_name = patch.disease_name.clone();
        self.cure_instructions = patch.cure_instructions.clone();
        self.next_steps_if_not_curable = patch.next_steps_if_not_curable.clone();
        self.ai_error_message = patch.ai_error_message.clone();
    }
}

/// アップロード直後に挿入する行
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRecord {
    pub image_url: String,
    pub file_name: Option<String>,
    pub ai_analysis_completed: bool,
}

impl NewRecord {
    pub fn pending(image_url: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            image_url: image_url.into(),
            file_name: Some(file_name.into()),
            ai_analysis_completed: false,
        }
    }
}

/// 解析結果の書き戻し
///
/// None も null として送信するため、前回の結果は必ず上書きされる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordPatch {
    pub ai_analysis_completed: bool,
    pub disease_name: Option<String>,
    pub cure_instructions: Option<String>,
    pub next_steps_if_not_curable: Option<String>,
    pub ai_error_message: Option<String>,
}

impl RecordPatch {
    pub fn success(diagnosis: &Diagnosis) -> Self {
        Self {
            ai_analysis_completed: true,
            disease_name: Some(diagnosis.disease_name.clone()),
            cure_instructions: Some(diagnosis.cure_instructions.clone()),
            next_steps_if_not_curable: diagnosis.next_steps_if_not_curable.clone(),
            ai_error_message: None,
        }
    }

    pub fn failure(message: &str) -> Self {
        Self {
            ai_analysis_completed: false,
            disease_name: None,
            cure_instructions: None,
            next_steps_if_not_curable: None,
            ai_error_message: Some(truncate_message(message, MAX_ERROR_MESSAGE_CHARS)),
        }
    }
}

/// 文字数で切り詰め（UTF-8境界を壊さない）
pub fn truncate_message(message: &str, max_chars: usize) -> String {
    message.chars().take(max_chars).collect()
}
