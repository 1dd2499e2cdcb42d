//! File intake: validate a selected report and wrap it as base64.
//!
//! The declared media type is checked first, before any byte is read, so a
//! `.png` never costs a disk read let alone a network call. Accepted files
//! are read whole in one `tokio::fs::read` and encoded in memory; reports
//! are single documents, not unbounded streams. The `%PDF` magic check
//! catches renamed files early with a readable error instead of a confusing
//! provider failure later.

use crate::error::ValidationError;
use crate::model::UploadedDocument;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;
use tracing::{debug, info};

/// The only media type intake accepts.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Declared media type of a path, from its extension.
///
/// Mirrors what a browser reports for a picked file: the extension decides,
/// content is not sniffed.
pub fn media_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("pdf") => PDF_MEDIA_TYPE,
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("txt") => "text/plain",
        Some("csv") => "text/csv",
        Some("html") | Some("htm") => "text/html",
        Some("json") => "application/json",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("xls") => "application/vnd.ms-excel",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => "application/octet-stream",
    }
}

/// Reject anything whose declared type is not exactly `application/pdf`.
pub fn check_media_type(name: &str, declared: &str) -> Result<(), ValidationError> {
    if declared == PDF_MEDIA_TYPE {
        Ok(())
    } else {
        Err(ValidationError::UnsupportedMediaType {
            name: name.to_string(),
            media_type: declared.to_string(),
        })
    }
}

/// Validate in-memory bytes with a caller-declared media type.
///
/// This is the entry point for hosts that already hold the file (an upload
/// handler, a test); [`intake_file`] is the path-based variant.
pub fn intake_bytes(
    name: &str,
    declared: &str,
    bytes: &[u8],
) -> Result<UploadedDocument, ValidationError> {
    check_media_type(name, declared)?;
    encode_pdf(name, bytes)
}

/// Validate and read a report from disk.
pub async fn intake_file(path: impl AsRef<Path>) -> Result<UploadedDocument, ValidationError> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    check_media_type(&name, media_type_for_path(path))?;

    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ValidationError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => ValidationError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => ValidationError::ReadFailed {
            path: path.to_path_buf(),
            detail: e.to_string(),
        },
    })?;

    let doc = encode_pdf(&name, &bytes)?;
    info!("Accepted report '{}' ({} bytes)", doc.name, bytes.len());
    Ok(doc)
}

fn encode_pdf(name: &str, bytes: &[u8]) -> Result<UploadedDocument, ValidationError> {
    if bytes.is_empty() {
        return Err(ValidationError::EmptyFile {
            name: name.to_string(),
        });
    }
    if !bytes.starts_with(PDF_MAGIC) {
        return Err(ValidationError::NotAPdf {
            name: name.to_string(),
            magic: bytes.iter().take(4).copied().collect(),
        });
    }

    let content = STANDARD.encode(bytes);
    debug!("Encoded '{}' → {} bytes base64", name, content.len());

    Ok(UploadedDocument {
        content,
        mime_type: PDF_MEDIA_TYPE.to_string(),
        name: name.to_string(),
    })
}
