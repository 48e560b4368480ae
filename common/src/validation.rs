use std::path::{Path, PathBuf};
use thiserror::Error;

/// 16 MiB, the backend's `MAX_FILE_SIZE`.
pub const MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Please select a video file ('{name}' is {mime})")]
    NotAVideo { name: String, mime: String },

    #[error("File size must be less than {}MB ('{name}' is {size} bytes)", .limit / (1024 * 1024))]
    TooLarge { name: String, size: u64, limit: u64 },

    #[error("Cannot read '{path}': {reason}")]
    Unreadable { path: PathBuf, reason: String },
}

/// A local file picked for one of the profile's video inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFile {
    pub path: PathBuf,
    pub name: String,
    /// Declared media type; guessed from the extension unless overridden.
    pub mime: String,
    pub size: u64,
}

impl VideoFile {
    pub fn new(path: impl Into<PathBuf>, mime: impl Into<String>, size: u64) -> Self {
        let path = path.into();
        let name = file_name(&path);
        Self {
            path,
            name,
            mime: mime.into(),
            size,
        }
    }

    /// Stats `path` and guesses its media type from the extension.
    pub fn from_path(path: &Path, mime_override: Option<&str>) -> Result<Self, SelectionError> {
        let meta = std::fs::metadata(path).map_err(|e| SelectionError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if !meta.is_file() {
            return Err(SelectionError::Unreadable {
                path: path.to_path_buf(),
                reason: "not a regular file".to_string(),
            });
        }
        let mime = match mime_override {
            Some(m) => m.to_string(),
            None => detect_mime_type(path),
        };
        Ok(Self::new(path, mime, meta.len()))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Unknown extensions map to `application/octet-stream`, which fails validation.
pub fn detect_mime_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first()
        .map(|m| m.to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

/// Client-side advisory check: the type must start with `video/` and the
/// size must not exceed `limit`.
pub fn validate_video(file: &VideoFile, limit: u64) -> Result<(), SelectionError> {
    if !file.mime.starts_with("video/") {
        return Err(SelectionError::NotAVideo {
            name: file.name.clone(),
            mime: file.mime.clone(),
        });
    }
    if file.size > limit {
        return Err(SelectionError::TooLarge {
            name: file.name.clone(),
            size: file.size,
            limit,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_video_at_limit() {
        let f = VideoFile::new("clip.mp4", "video/mp4", MAX_FILE_SIZE);
        assert!(validate_video(&f, MAX_FILE_SIZE).is_ok());
    }

    #[test]
    fn rejects_non_video_types() {
        for mime in ["image/png", "audio/mpeg", "application/octet-stream", "text/video", ""] {
            let f = VideoFile::new("x", mime, 10);
            assert!(
                matches!(validate_video(&f, MAX_FILE_SIZE), Err(SelectionError::NotAVideo { .. })),
                "{} should be rejected",
                mime
            );
        }
    }

    #[test]
    fn rejects_oversize_regardless_of_type() {
        let video = VideoFile::new("big.mov", "video/quicktime", MAX_FILE_SIZE + 1);
        assert!(matches!(
            validate_video(&video, MAX_FILE_SIZE),
            Err(SelectionError::TooLarge { .. })
        ));

        let image = VideoFile::new("big.png", "image/png", MAX_FILE_SIZE + 1);
        assert!(validate_video(&image, MAX_FILE_SIZE).is_err());
    }

    #[test]
    fn error_messages_match_form_alerts() {
        let err = validate_video(&VideoFile::new("a.mp4", "video/mp4", MAX_FILE_SIZE + 1), MAX_FILE_SIZE)
            .unwrap_err();
        assert!(err.to_string().starts_with("File size must be less than 16MB"));

        let err = validate_video(&VideoFile::new("a.png", "image/png", 1), MAX_FILE_SIZE).unwrap_err();
        assert!(err.to_string().starts_with("Please select a video file"));
    }

    #[test]
    fn guesses_type_from_extension() {
        assert_eq!(detect_mime_type(Path::new("a.mp4")), "video/mp4");
        assert_eq!(detect_mime_type(Path::new("a.webm")), "video/webm");
        assert_eq!(detect_mime_type(Path::new("a.unknownext")), "application/octet-stream");
    }

    #[test]
    fn from_path_reports_missing_file() {
        let err = VideoFile::from_path(Path::new("/definitely/not/here.mp4"), None).unwrap_err();
        assert!(matches!(err, SelectionError::Unreadable { .. }));
    }
}
