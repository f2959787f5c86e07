use thiserror::Error;

/// Display文字列はそのままステータス表示・`ai_error_message` に使われる
#[derive(Error, Debug)]
pub enum CropDoctorError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("{0} is not configured. Set it in the environment, .env, or `crop-doctor config`")]
    MissingSetting(&'static str),

    #[error("Google AI SDK not initialized. Check API Key.")]
    InferenceNotConfigured,

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    #[error("No images found: {0}")]
    NoImagesFound(String),

    #[error("Unsupported image (PNG or JPEG only): {0}")]
    UnsupportedImage(String),

    #[error("Storage upload failed: {0}")]
    Storage(String),

    #[error("Failed to get public URL.")]
    PublicUrl,

    #[error("Database insert failed: {0}")]
    DatabaseInsert(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Invalid image record received for analysis.")]
    InvalidRecord,

    #[error("Failed to fetch image for analysis (status: {0})")]
    FetchStatus(u16),

    #[error("Failed to fetch image for analysis: {0}")]
    Fetch(String),

    #[error("Gemini API error: {0}")]
    ApiCall(String),

    #[error("JSON error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Selection cancelled: {0}")]
    Dialog(String),

    #[error(transparent)]
    Common(#[from] crop_doctor_common::Error),
}

pub type Result<T> = std::result::Result<T, CropDoctorError>;
