use serde::{Deserialize, Serialize};
use std::path::Path;

/// One uploaded file as reported by `GET /api/stats/files/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    #[serde(default)]
    pub uuid: Option<String>,
    pub file_name: String,
    pub created_at: String,
    #[serde(default)]
    pub download_count: u64,
    #[serde(default)]
    pub last_download_at: Option<String>,
    pub download_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStats {
    #[serde(default)]
    pub total_files: Option<u64>,
    #[serde(default)]
    pub files: Vec<FileRecord>,
}

impl FileStats {
    pub fn total(&self) -> u64 {
        self.total_files.unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub uuid: String,
    pub download_url: String,
    #[serde(default)]
    pub original_name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A file picked for upload, already read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload.bin".to_string());

        Ok(Self { name, bytes })
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stats_tolerates_missing_fields() {
        let stats: FileStats = serde_json::from_value(json!({})).unwrap();
        assert_eq!(stats.total(), 0);
        assert!(stats.files.is_empty());
    }

    #[test]
    fn test_record_without_last_download() {
        let record: FileRecord = serde_json::from_value(json!({
            "fileName": "report.pdf",
            "createdAt": "2024-03-01T10:15:00",
            "downloadCount": 0,
            "downloadUrl": "/api/files/download/abc"
        }))
        .unwrap();

        assert_eq!(record.file_name, "report.pdf");
        assert!(record.last_download_at.is_none());
        assert!(record.uuid.is_none());
    }

    #[test]
    fn test_upload_file_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();

        let file = tokio_test::assert_ok!(tokio_test::block_on(UploadFile::from_path(&path)));
        assert_eq!(file.name, "notes.txt");
        assert_eq!(file.size(), 5);

        tokio_test::assert_err!(tokio_test::block_on(UploadFile::from_path(
            &dir.path().join("missing.txt")
        )));
    }
}
