//! 操作結果のステータス表示
//!
//! メッセージ文字列の中身で成功/失敗を判定せず、
//! 種別をタグとして持たせる。

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// 処理中
    Neutral(String),
    Success(String),
    Failure(String),
}

impl Status {
    pub fn message(&self) -> &str {
        match self {
            Status::Neutral(m) | Status::Success(m) | Status::Failure(m) => m,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Status::Failure(_))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Status::Success(_))
    }

    /// 表示用の記号
    pub fn marker(&self) -> &'static str {
        match self {
            Status::Neutral(_) => "…",
            Status::Success(_) => "✔",
            Status::Failure(_) => "✘",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.marker(), self.message())
    }
}
