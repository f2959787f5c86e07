//! Crop Doctor Common Library
//!
//! CLIとライブラリ本体で共有される型とユーティリティ（I/Oなし）

pub mod error;
pub mod parser;
pub mod prompts;
pub mod status;
pub mod types;

pub use error::{Error, Result};
pub use parser::{extract_json, parse_diagnosis_response};
pub use prompts::{build_diagnosis_prompt, DIAGNOSIS_FIELDS};
pub use status::Status;
pub use types::{
    truncate_message, AnalysisState, CropImageRecord, Diagnosis, NewRecord, RecordId,
    RecordPatch, MAX_ERROR_MESSAGE_CHARS,
};
