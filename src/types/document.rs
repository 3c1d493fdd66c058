//! Document and document-type types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prefix the backend writes into `extracted_text` when extraction failed.
pub const EXTRACTION_FAILED_PREFIX: &str = "Text extraction failed:";

/// Uploads within this many days count as recent.
const RECENT_UPLOAD_DAYS: i64 = 7;

/// Document category (e.g. lecture notes, slides)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentType {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// An uploaded document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: u64,
    pub title: String,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub extracted_text: Option<String>,
    #[serde(default)]
    pub document_type: Option<DocumentType>,
}

impl Document {
    /// Whether the backend failed to extract text, which disables AI features.
    pub fn extraction_failed(&self) -> bool {
        self.extracted_text
            .as_deref()
            .is_some_and(|t| t.starts_with(EXTRACTION_FAILED_PREFIX))
    }
}

/// A file to upload.
#[derive(Debug, Clone)]
pub struct Upload {
    pub title: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// `None` lets the backend auto-detect the type from the file extension.
    pub document_type_id: Option<u64>,
}

impl Upload {
    pub fn new(title: impl Into<String>, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            title: title.into(),
            file_name: file_name.into(),
            bytes,
            document_type_id: None,
        }
    }

    pub fn document_type(mut self, id: u64) -> Self {
        self.document_type_id = Some(id);
        self
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadReport {
    pub document: Document,
    /// Uploaded, but AI features will not work until extraction is retried.
    pub extraction_failed: bool,
}

impl From<Document> for UploadReport {
    fn from(document: Document) -> Self {
        Self {
            extraction_failed: document.extraction_failed(),
            document,
        }
    }
}

/// Dashboard summary over a document listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentStats {
    pub total: usize,
    /// Documents uploaded within the last seven days.
    pub recent_uploads: usize,
    /// Sum of known file sizes in bytes.
    pub total_size: u64,
}

impl DocumentStats {
    pub fn compute(documents: &[Document], now: DateTime<Utc>) -> Self {
        let recent_uploads = documents
            .iter()
            .filter(|d| {
                let age = now.signed_duration_since(d.uploaded_at);
                let window = chrono::Duration::days(RECENT_UPLOAD_DAYS);
                age <= window && age >= -window
            })
            .count();
        Self {
            total: documents.len(),
            recent_uploads,
            total_size: documents.iter().filter_map(|d| d.file_size).sum(),
        }
    }
}

/// Render a byte count as `"1.5 KB"`, `"2 MB"`, etc.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: u64, days_ago: i64, size: Option<u64>, now: DateTime<Utc>) -> Document {
        Document {
            id,
            title: format!("doc {id}"),
            uploaded_at: now - chrono::Duration::days(days_ago),
            file_size: size,
            extracted_text: None,
            document_type: None,
        }
    }

    #[test]
    fn stats_count_recent_and_size() {
        let now = Utc::now();
        let docs = vec![
            doc(1, 0, Some(100), now),
            doc(2, 7, Some(50), now),
            doc(3, 30, None, now),
        ];
        let stats = DocumentStats::compute(&docs, now);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.recent_uploads, 2);
        assert_eq!(stats.total_size, 150);
    }

    #[test]
    fn file_size_formatting() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5 MB");
    }

    #[test]
    fn extraction_failure_detected_by_prefix() {
        let now = Utc::now();
        let mut d = doc(1, 0, None, now);
        assert!(!d.extraction_failed());
        d.extracted_text = Some("Text extraction failed: unsupported PDF".into());
        assert!(d.extraction_failed());
        d.extracted_text = Some("Photosynthesis converts light".into());
        assert!(!d.extraction_failed());
    }
}
