//! Crop Doctor
//!
//! 作物写真をアップロードし、Geminiで病害を診断して Supabase に保存する。

pub mod analyzer;
pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod scanner;
pub mod services;
pub mod supabase;
pub mod upload;

pub use crop_doctor_common as common;
