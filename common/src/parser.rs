//! AIレスポンスパーサー
//!
//! モデルの自由文レスポンスからJSONオブジェクトを取り出し、
//! `Diagnosis` にパースする

use crate::error::{Error, Result};
use crate::types::Diagnosis;

/// レスポンスからJSON部分を抽出
///
/// 抽出優先順位:
/// 1. ``` ... ``` ブロック（開始行の言語タグ `json` / `JSON` / `javascript` 等は読み飛ばす）
/// 2. 最初の `{` から最後の `}` まで
/// 3. レスポンス全体
///
/// ブロックの中身が `{` で始まらない場合は 2. に進む。
/// 戻り値はtrim済み。空文字列になり得る。
///
/// # Examples
/// ```
/// use crop_doctor_common::extract_json;
///
/// let response = "```json\n{\"disease_name\": \"Leaf Rust\"}\n```";
/// assert_eq!(extract_json(response), "{\"disease_name\": \"Leaf Rust\"}");
/// ```
pub fn extract_json(response: &str) -> &str {
    if let Some(body) = fenced_body(response) {
        if body.is_empty() || body.starts_with('{') {
            return body;
        }
    }

    if let (Some(start), Some(end)) = (response.find('{'), response.rfind('}')) {
        if end > start {
            return response[start..=end].trim();
        }
    }

    response.trim()
}

/// 最初のコードフェンスの中身
fn fenced_body(response: &str) -> Option<&str> {
    let start = response.find("```")? + 3;
    let end = start + response[start..].find("```")?;
    let inner = &response[start..end];

    let body = match inner.split_once('\n') {
        Some((tag, rest)) if !tag.trim_start().starts_with('{') => rest,
        _ => inner,
    };
    Some(body.trim())
}

/// 診断レスポンスをパース
///
/// # Returns
/// * `Ok(Diagnosis)` - パース成功
/// * `Err(Error::Parse)` - 空レスポンス、またはJSONとして不正（生レスポンスを含む）
pub fn parse_diagnosis_response(response: &str) -> Result<Diagnosis> {
    let json_str = extract_json(response);
    if json_str.is_empty() {
        return Err(Error::Parse("AI response was empty.".into()));
    }

    serde_json::from_str::<Diagnosis>(json_str).map_err(|e| {
        Error::Parse(format!(
            "AI response was not valid JSON ({}). Raw response: {}",
            e, response
        ))
    })
}
