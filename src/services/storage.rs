//! Flat-directory image storage
//!
//! Two directories under one root: `generated/` for uploads and raw
//! generations, `edits/` for composited outputs. Filenames are
//! `UUID.ext`; there is no sidecar metadata, the file mtime is the
//! logical timestamp.

use crate::error::{EditError, Result};
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use uuid::Uuid;

static FILE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-f0-9-]+\.(png|jpg|jpeg|webp)$").expect("literal pattern compiles")
});

/// Which flat directory a file lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreDir {
    /// Uploads and raw model generations
    Generated,
    /// Composited edit outputs
    Edits,
}

impl StoreDir {
    /// Directory name on disk
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Generated => "generated",
            Self::Edits => "edits",
        }
    }
}

/// Record of a persisted file, returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedFile {
    /// UUID-based filename
    pub filename: String,
    /// Serving URL under the store's public prefix
    pub url: String,
    /// MIME type derived from the extension
    pub mime: String,
}

/// Flat-directory store for originals and composited results
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    /// Open a store rooted at `root`; directories are created lazily on
    /// first save
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Absolute path of a directory within the store
    pub fn dir_path(&self, dir: StoreDir) -> PathBuf {
        self.root.join(dir.as_str())
    }

    /// Read a stored image by name, searching `generated/` then
    /// `edits/`.
    ///
    /// # Errors
    /// - `EditError::BadFileName` for names outside the UUID pattern
    /// - `EditError::FileNotFound` when neither directory has the file
    pub async fn read_by_name(&self, name: &str) -> Result<(Vec<u8>, &'static str, StoreDir)> {
        validate_file_name(name)?;
        let mime = mime_for(name);

        for dir in [StoreDir::Generated, StoreDir::Edits] {
            let path = self.dir_path(dir).join(name);
            match tokio::fs::read(&path).await {
                Ok(bytes) => {
                    debug!("read {} ({} bytes) from {}", name, bytes.len(), dir.as_str());
                    return Ok((bytes, mime, dir));
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(EditError::Io(e)),
            }
        }
        Err(EditError::FileNotFound(name.to_string()))
    }

    /// Persist bytes under a fresh UUID filename in the given directory
    ///
    /// # Errors
    /// - `EditError::BadFileName` for unsupported extensions
    /// - IO failures creating the directory or writing the file
    pub async fn save_to(&self, dir: StoreDir, bytes: &[u8], ext: &str) -> Result<SavedFile> {
        let mime = match ext {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "webp" => "image/webp",
            other => {
                return Err(EditError::BadFileName(format!(
                    "unsupported extension: {}",
                    other
                )))
            }
        };

        let filename = format!("{}.{}", Uuid::new_v4(), ext);
        let dir_path = self.dir_path(dir);
        tokio::fs::create_dir_all(&dir_path).await?;
        let path = dir_path.join(&filename);
        tokio::fs::write(&path, bytes).await?;

        debug!("saved {} bytes to {}", bytes.len(), path.display());
        Ok(SavedFile {
            url: format!("/files/{}/{}", dir.as_str(), filename),
            filename,
            mime: mime.to_string(),
        })
    }
}

/// Reject names outside the flat UUID.ext convention; also blocks any
/// path traversal since separators never match
fn validate_file_name(name: &str) -> Result<()> {
    if FILE_NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(EditError::BadFileName(name.to_string()))
    }
}

fn mime_for(name: &str) -> &'static str {
    match Path::new(name).extension().and_then(|e| e.to_str()) {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "image/png",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_name_validation() {
        assert!(validate_file_name("3f2a-b1c0-d9e8.png").is_ok());
        assert!(validate_file_name("abcdef0123.jpeg").is_ok());
        assert!(validate_file_name("a.webp").is_ok());

        assert!(validate_file_name("../etc/passwd").is_err());
        assert!(validate_file_name("UPPER.png").is_err());
        assert!(validate_file_name("space name.png").is_err());
        assert!(validate_file_name("noext").is_err());
        assert!(validate_file_name("a.gif").is_err());
        assert!(validate_file_name("dir/a.png").is_err());
    }

    #[tokio::test]
    async fn test_save_and_read_round_trip() {
        let tmp = tempdir().unwrap();
        let store = ImageStore::new(tmp.path());

        let saved = store
            .save_to(StoreDir::Generated, &[1, 2, 3], "png")
            .await
            .unwrap();
        assert!(saved.filename.ends_with(".png"));
        assert_eq!(saved.mime, "image/png");
        assert_eq!(saved.url, format!("/files/generated/{}", saved.filename));

        let (bytes, mime, dir) = store.read_by_name(&saved.filename).await.unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
        assert_eq!(mime, "image/png");
        assert_eq!(dir, StoreDir::Generated);
    }

    #[tokio::test]
    async fn test_read_searches_edits_directory() {
        let tmp = tempdir().unwrap();
        let store = ImageStore::new(tmp.path());

        let saved = store
            .save_to(StoreDir::Edits, &[7, 7], "jpg")
            .await
            .unwrap();
        let (bytes, mime, dir) = store.read_by_name(&saved.filename).await.unwrap();
        assert_eq!(bytes, vec![7, 7]);
        assert_eq!(mime, "image/jpeg");
        assert_eq!(dir, StoreDir::Edits);
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let tmp = tempdir().unwrap();
        let store = ImageStore::new(tmp.path());

        let err = store.read_by_name("0a1b2c.png").await.unwrap_err();
        assert!(matches!(err, EditError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_read_rejects_bad_name_before_touching_disk() {
        let store = ImageStore::new("/definitely/not/a/real/root");
        let err = store.read_by_name("../../secrets.png").await.unwrap_err();
        assert!(matches!(err, EditError::BadFileName(_)));
    }

    #[tokio::test]
    async fn test_save_rejects_unknown_extension() {
        let tmp = tempdir().unwrap();
        let store = ImageStore::new(tmp.path());
        let err = store
            .save_to(StoreDir::Edits, &[0], "exe")
            .await
            .unwrap_err();
        assert!(matches!(err, EditError::BadFileName(_)));
    }
}
