use std::fs;
use std::path::Path;

use crate::error::{Result, VidscribeError};

pub const MAX_VIDEO_MB: u64 = 200;
pub const MAX_VIDEO_BYTES: u64 = MAX_VIDEO_MB * 1024 * 1024;

/// A loaded and validated video upload.
#[derive(Debug)]
pub struct VideoSource {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

impl VideoSource {
    pub fn size_mb(&self) -> f64 {
        self.bytes.len() as f64 / (1024.0 * 1024.0)
    }
}

fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "mp4" => Some("video/mp4"),
        "mov" => Some("video/quicktime"),
        "webm" => Some("video/webm"),
        "mkv" => Some("video/x-matroska"),
        _ => None,
    }
}

/// Size gate, checked against file metadata before the bytes are read.
pub fn validate_size(len: u64) -> Result<()> {
    if len > MAX_VIDEO_BYTES {
        return Err(VidscribeError::VideoTooLarge {
            actual_mb: len as f64 / (1024.0 * 1024.0),
            limit_mb: MAX_VIDEO_MB,
        });
    }
    Ok(())
}

pub fn load(path: &Path) -> Result<VideoSource> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    let mime_type = mime_for_extension(ext)
        .ok_or_else(|| VidscribeError::UnsupportedFormat(ext.to_string()))?;

    validate_size(fs::metadata(path)?.len())?;
    let bytes = fs::read(path)?;
    tracing::debug!(bytes = bytes.len(), mime = mime_type, "video loaded");

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("video")
        .to_string();

    Ok(VideoSource {
        file_name,
        mime_type,
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn size_at_limit_is_accepted() {
        assert!(validate_size(MAX_VIDEO_BYTES).is_ok());
        assert!(validate_size(0).is_ok());
    }

    #[test]
    fn size_over_limit_is_rejected() {
        let err = validate_size(MAX_VIDEO_BYTES + 1).expect_err("should reject oversized file");
        assert!(err.to_string().contains("200 MB"), "unexpected: {err}");
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = load(Path::new("notes.txt")).expect_err("txt is not a video");
        assert!(matches!(err, VidscribeError::UnsupportedFormat(ref ext) if ext == "txt"));
    }

    #[test]
    fn missing_extension_is_rejected() {
        assert!(load(Path::new("noext")).is_err());
    }

    #[test]
    fn loads_supported_file() {
        let mut file = tempfile::Builder::new()
            .prefix("clip")
            .suffix(".mp4")
            .tempfile()
            .unwrap();
        file.write_all(b"not really mpeg4").unwrap();

        let video = load(file.path()).unwrap();
        assert_eq!(video.mime_type, "video/mp4");
        assert_eq!(video.bytes, b"not really mpeg4");
        assert!(video.file_name.ends_with(".mp4"));
    }

    #[test]
    fn extension_case_is_ignored() {
        assert_eq!(mime_for_extension("MKV"), Some("video/x-matroska"));
        assert_eq!(mime_for_extension("MoV"), Some("video/quicktime"));
        assert_eq!(mime_for_extension("avi"), None);
    }
}
