/// Reference image uploads
///
/// Both the GUI "Upload" button and the relay's upload endpoint go through
/// [`accept`], so the same type and size rules apply everywhere.
use serde::Serialize;
use std::path::Path;
use tracing::info;

use crate::error::UploadError;
use crate::raster::DataUrl;

/// Largest accepted upload (10 MiB)
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// An accepted upload, inlined as a data URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub file_url: String,
    pub file_name: String,
    pub file_size: usize,
}

/// Validate an uploaded file and inline it as a data URL
pub fn accept(
    file_name: &str,
    content_type: Option<&str>,
    bytes: &[u8],
) -> Result<UploadedFile, UploadError> {
    let content_type = content_type
        .map(str::trim)
        .filter(|ct| ct.starts_with("image/"))
        .ok_or(UploadError::NotAnImage)?;

    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge);
    }

    info!("file uploaded: {} ({} bytes)", file_name, bytes.len());

    Ok(UploadedFile {
        file_url: DataUrl::encode(content_type, bytes),
        file_name: file_name.to_string(),
        file_size: bytes.len(),
    })
}

/// Read an image from disk and run it through [`accept`]
///
/// The content type is guessed from the file extension.
pub async fn load_from_path(path: &Path) -> Result<UploadedFile, UploadError> {
    let file_name = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();

    // Check the size before reading the whole file into memory
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| UploadError::Read(e.to_string()))?;
    if metadata.len() > MAX_UPLOAD_BYTES as u64 {
        return Err(UploadError::TooLarge);
    }

    let content_type = image::ImageFormat::from_path(path)
        .ok()
        .map(|format| format.to_mime_type());

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| UploadError::Read(e.to_string()))?;

    accept(&file_name, content_type, &bytes)
}
