//! プロンプト生成モジュール
//!
//! 病害診断用の固定プロンプト。レスポンスのJSONキーは
//! `Diagnosis` のフィールド名と一致させること。

/// 診断結果のJSONキー
pub const DIAGNOSIS_FIELDS: &[&str] = &[
    "disease_name",
    "cure_instructions",
    "next_steps_if_not_curable",
];

/// 診断プロンプト生成
pub fn build_diagnosis_prompt() -> String {
    let keys = DIAGNOSIS_FIELDS
        .iter()
        .map(|k| format!("\"{}\"", k))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"You are an agricultural expert. Analyze the following image of a crop.
Your response MUST be a JSON object with the following keys: {keys}.
- "disease_name": Identify the likely disease. If healthy or unclear, state that.
- "cure_instructions": Provide concise, actionable steps to treat the identified disease. Mention organic and chemical options if applicable.
- "next_steps_if_not_curable": If the disease is severe or untreatable, suggest what the farmer should do next (e.g., remove plants, soil treatment, future prevention).

Example JSON response:
{{
  "disease_name": "Powdery Mildew",
  "cure_instructions": "Increase air circulation. Apply neem oil or a sulfur-based fungicide. Remove severely affected leaves.",
  "next_steps_if_not_curable": "If widespread and severe, remove and destroy infected plants to prevent spread. Rotate crops next season."
}}"#
    )
}
