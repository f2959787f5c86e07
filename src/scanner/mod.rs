//! ローカル画像の検出と読み込み
//!
//! アップロード対象は PNG / JPEG のみ。

use crate::error::{CropDoctorError, Result};
use image::ImageFormat;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub path: PathBuf,
    pub file_name: String,
}

/// アップロード用に読み込んだ画像
#[derive(Debug, Clone)]
pub struct LocalImage {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

pub fn scan_folder(folder: &Path) -> Result<Vec<ImageInfo>> {
    if !folder.is_dir() {
        return Err(CropDoctorError::FolderNotFound(folder.display().to_string()));
    }

    let mut images = Vec::new();

    for entry in WalkDir::new(folder)
        .max_depth(1) // 直下のみ
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() || mime_for_path(path).is_none() {
            continue;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        images.push(ImageInfo {
            path: path.to_path_buf(),
            file_name,
        });
    }

    images.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    Ok(images)
}

/// 画像を読み込みMIMEタイプを判定
///
/// マジックバイトを優先し、判定できなければ拡張子で決める。
pub fn load_image(path: &Path) -> Result<LocalImage> {
    if !path.is_file() {
        return Err(CropDoctorError::FileNotFound(path.display().to_string()));
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| CropDoctorError::FileNotFound(path.display().to_string()))?;

    let bytes = std::fs::read(path)?;

    let mime_type = match image::guess_format(&bytes) {
        Ok(ImageFormat::Png) => "image/png",
        Ok(ImageFormat::Jpeg) => "image/jpeg",
        Ok(other) => {
            return Err(CropDoctorError::UnsupportedImage(format!(
                "{} ({:?})",
                file_name, other
            )))
        }
        Err(_) => mime_for_path(path)
            .ok_or_else(|| CropDoctorError::UnsupportedImage(file_name.clone()))?,
    };

    tracing::debug!(file = %file_name, mime_type, size = bytes.len(), "loaded image");

    Ok(LocalImage {
        file_name,
        mime_type,
        bytes,
    })
}

/// 拡張子からMIMEタイプ（PNG/JPEG以外はNone）
pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        _ => None,
    }
}

fn mime_for_path(path: &Path) -> Option<&'static str> {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(mime_for_extension)
}

#[cfg(test)]
fn is_image_extension(ext: &str) -> bool {
    mime_for_extension(ext).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const GIF_MAGIC: &[u8] = b"GIF89a\x01\x00\x01\x00";

    #[test]
    fn test_is_image_extension() {
        assert!(is_image_extension("jpg"));
        assert!(is_image_extension("JPG"));
        assert!(is_image_extension("jpeg"));
        assert!(is_image_extension("png"));
        assert!(!is_image_extension("txt"));
        assert!(!is_image_extension("gif"));
    }

    #[test]
    fn test_mime_for_extension() {
        assert_eq!(mime_for_extension("JPEG"), Some("image/jpeg"));
        assert_eq!(mime_for_extension("png"), Some("image/png"));
        assert_eq!(mime_for_extension("webp"), None);
    }

    #[test]
    fn test_scan_folder_not_found() {
        let result = scan_folder(Path::new("/nonexistent/folder"));
        assert!(matches!(result, Err(CropDoctorError::FolderNotFound(_))));
    }

    #[test]
    fn test_scan_folder_with_images() {
        let dir = tempfile::tempdir().unwrap();

        File::create(dir.path().join("b leaf.jpg")).unwrap().write_all(b"dummy").unwrap();
        File::create(dir.path().join("a.PNG")).unwrap().write_all(b"dummy").unwrap();
        File::create(dir.path().join("notes.txt")).unwrap().write_all(b"text").unwrap();
        fs::create_dir(dir.path().join("sub.jpg")).unwrap();

        let result = scan_folder(dir.path()).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].file_name, "a.PNG");
        assert_eq!(result[1].file_name, "b leaf.jpg");
    }

    #[test]
    fn test_load_image_by_magic_bytes() {
        let dir = tempfile::tempdir().unwrap();
        // 拡張子と中身が食い違う場合は中身を優先
        let path = dir.path().join("leaf.jpg");
        fs::write(&path, PNG_MAGIC).unwrap();

        let image = load_image(&path).unwrap();
        assert_eq!(image.file_name, "leaf.jpg");
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.bytes, PNG_MAGIC);
    }

    #[test]
    fn test_load_image_falls_back_to_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leaf.jpeg");
        fs::write(&path, b"not really an image").unwrap();

        let image = load_image(&path).unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
    }

    #[test]
    fn test_load_image_rejects_other_formats() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leaf.png");
        fs::write(&path, GIF_MAGIC).unwrap();

        assert!(matches!(load_image(&path), Err(CropDoctorError::UnsupportedImage(_))));

        let txt = dir.path().join("leaf.txt");
        fs::write(&txt, b"hello").unwrap();
        assert!(matches!(load_image(&txt), Err(CropDoctorError::UnsupportedImage(_))));
    }

    #[test]
    fn test_load_image_missing_file() {
        let result = load_image(Path::new("/nonexistent/leaf.jpg"));
        assert!(matches!(result, Err(CropDoctorError::FileNotFound(_))));
    }
}
