use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::imaging::DataUrl;

use super::ApiError;

const UPLOADS_DIR: &str = "uploads";
const EDITS_DIR: &str = "edits";

/// Writes user files below the web root and hands back their public URLs
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store an uploaded file as `<stem>_<uuid><ext>` under `uploads/`
    pub async fn save_upload(&self, file_name: &str, bytes: &[u8]) -> Result<String, ApiError> {
        if bytes.is_empty() {
            return Err(ApiError::BadRequest("No file uploaded.".to_owned()));
        }
        // Only the final component is kept so clients cannot escape the directory
        let safe = Path::new(file_name);
        let stem = safe.file_stem().and_then(|s| s.to_str()).unwrap_or("upload");
        let ext = safe
            .extension()
            .and_then(|s| s.to_str())
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();
        let name = format!("{stem}_{}{ext}", Uuid::new_v4().simple());
        self.write(UPLOADS_DIR, &name, bytes).await
    }

    /// Decode a `data:` URL and store it as `edit_<uuid>.png` or `.jpg` under `edits/`
    pub async fn save_data_url(&self, data_url: &str) -> Result<String, ApiError> {
        if data_url.trim().is_empty() {
            return Err(ApiError::BadRequest("No image data.".to_owned()));
        }
        let parsed = DataUrl::parse(data_url)?;
        let name = format!("edit_{}{}", Uuid::new_v4().simple(), parsed.extension());
        self.write(EDITS_DIR, &name, &parsed.bytes).await
    }

    async fn write(&self, dir: &str, name: &str, bytes: &[u8]) -> Result<String, ApiError> {
        let folder = self.root.join(dir);
        tokio::fs::create_dir_all(&folder).await?;
        tokio::fs::write(folder.join(name), bytes).await?;
        log::info!("Stored {} bytes as {}/{}", bytes.len(), dir, name);
        Ok(format!("/{dir}/{name}"))
    }

    /// Read back a stored file by public directory and name
    pub async fn read(&self, dir: &str, name: &str) -> Option<Vec<u8>> {
        if ![UPLOADS_DIR, EDITS_DIR].contains(&dir) || Path::new(name).file_name() != Some(std::ffi::OsStr::new(name)) {
            return None;
        }
        tokio::fs::read(self.root.join(dir).join(name)).await.ok()
    }
}
