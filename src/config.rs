use crate::error::{CropDoctorError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 必須設定と対応する環境変数（Vite時代の `VITE_` 付きも受け付ける）
const SUPABASE_URL_VARS: &[&str] = &["SUPABASE_URL", "VITE_SUPABASE_URL"];
const SUPABASE_ANON_KEY_VARS: &[&str] = &["SUPABASE_ANON_KEY", "VITE_SUPABASE_ANON_KEY"];
const GEMINI_API_KEY_VARS: &[&str] = &["GEMINI_API_KEY", "VITE_GEMINI_API_KEY"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub model: String,
    pub bucket: String,
    pub table: String,
    pub history_limit: usize,
    pub timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            supabase_url: None,
            supabase_anon_key: None,
            gemini_api_key: None,
            model: "gemini-1.5-flash".into(),
            bucket: "crop-pictures".into(),
            table: "crop_images".into(),
            history_limit: 20,
            timeout_seconds: 120,
        }
    }
}

impl Config {
    /// 設定ファイル → 環境変数 の順に重ねて読み込む
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// 環境変数で上書き（空文字列は未設定扱い）
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let first = |names: &[&str]| {
            names
                .iter()
                .filter_map(|n| lookup(*n))
                .map(|v| v.trim().to_string())
                .find(|v| !v.is_empty())
        };

        if let Some(v) = first(SUPABASE_URL_VARS) {
            self.supabase_url = Some(v);
        }
        if let Some(v) = first(SUPABASE_ANON_KEY_VARS) {
            self.supabase_anon_key = Some(v);
        }
        if let Some(v) = first(GEMINI_API_KEY_VARS) {
            self.gemini_api_key = Some(v);
        }
        if let Some(v) = first(&["CROP_DOCTOR_MODEL"][..]) {
            self.model = v;
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CropDoctorError::Config("home directory not found".into()))?;
        Ok(home.join(".config").join("crop-doctor").join("config.json"))
    }

    /// 未設定の必須項目
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(&self.supabase_url) {
            missing.push(SUPABASE_URL_VARS[0]);
        }
        if is_blank(&self.supabase_anon_key) {
            missing.push(SUPABASE_ANON_KEY_VARS[0]);
        }
        if is_blank(&self.gemini_api_key) {
            missing.push(GEMINI_API_KEY_VARS[0]);
        }
        missing
    }

    /// 起動時に一度だけ呼ぶ。欠けていても停止はしない
    pub fn report_missing(&self) {
        for name in self.missing() {
            tracing::error!(setting = name, "{} is missing; calls that need it will fail", name);
        }
    }

    pub fn masked(value: &Option<String>) -> String {
        match value.as_deref() {
            Some(v) if !v.is_empty() => {
                let count = v.chars().count();
                let tail: String = v.chars().skip(count.saturating_sub(4)).collect();
                format!("****{}", tail)
            }
            _ => "(not set)".into(),
        }
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}
