//! Request and response bodies of the backend API, plus upload inputs.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::api::error::ClientError;
use crate::chat::turn::ContextMessage;

/// A local file chosen for upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectedFile {
    /// File name sent to the backend and shown in the selection list.
    pub name: String,
    /// File contents.
    pub bytes: Bytes,
}

impl SelectedFile {
    /// Wrap in-memory contents.
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, naming it after its last path component.
    ///
    /// # Errors
    /// Returns an error if the path has no file name or cannot be read.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ClientError::Validation(format!("not a file: {}", path.display())))?;
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::new(name, bytes))
    }

    /// Size in bytes.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Whether the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Byte-level progress of an upload request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UploadProgress {
    /// Bytes handed to the connection so far.
    pub loaded: u64,
    /// Total bytes of all file parts.
    pub total: u64,
}

impl UploadProgress {
    /// Rounded percentage, or `None` when the total is unknown.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn percent(&self) -> Option<u8> {
        if self.total == 0 {
            return None;
        }
        let loaded = if self.loaded > self.total {
            self.total
        } else {
            self.loaded
        };
        let pct = (loaded * 100 + self.total / 2) / self.total;
        Some(pct as u8)
    }
}

/// Callback receiving upload progress events.
pub type ProgressFn = Arc<dyn Fn(UploadProgress) + Send + Sync>;

/// Response of `POST /admin/upload_pdf/`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Human-readable outcome.
    pub message: String,
}

/// Response of `GET /admin/list_pdfs/`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DocumentList {
    /// Stored document names.
    #[serde(default)]
    pub pdfs: Vec<String>,
}

/// Response of `POST /admin/generate_vector_db/`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IndexReport {
    /// Human-readable outcome.
    pub message: String,
    /// Documents the index was built from, when the backend reports them.
    #[serde(default)]
    pub pdfs_used: Option<Vec<String>>,
}

/// Response of `GET /api/vector_db_status`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct KnowledgeBaseStatus {
    /// Whether a search index has been built.
    pub exists: bool,
}

/// Body of `POST /api/chat`.
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    /// Context window, oldest first.
    pub history: &'a [ContextMessage],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_rounding() {
        assert_eq!(UploadProgress { loaded: 0, total: 200 }.percent(), Some(0));
        assert_eq!(UploadProgress { loaded: 1, total: 200 }.percent(), Some(1));
        assert_eq!(UploadProgress { loaded: 2, total: 3 }.percent(), Some(67));
        assert_eq!(UploadProgress { loaded: 200, total: 200 }.percent(), Some(100));
        assert_eq!(UploadProgress { loaded: 5, total: 0 }.percent(), None);
    }

    #[test]
    fn test_index_report_without_used_list() {
        let report: IndexReport = serde_json::from_str(r#"{"message":"done"}"#).unwrap();
        assert_eq!(report.message, "done");
        assert!(report.pdfs_used.is_none());
    }

    #[test]
    fn test_missing_pdfs_field_is_empty() {
        let list: DocumentList = serde_json::from_str("{}").unwrap();
        assert!(list.pdfs.is_empty());
    }

    #[tokio::test]
    async fn test_from_path_reads_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.pdf");
        tokio::fs::write(&path, b"%PDF-1.4").await.unwrap();

        let file = SelectedFile::from_path(&path).await.unwrap();
        assert_eq!(file.name, "notes.pdf");
        assert_eq!(file.len(), 8);
    }
}
