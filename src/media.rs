//! Upload directory for blog and service images.
//!
//! Files live under `<root>/<category>/<uuid>.<ext>` and are exposed both as
//! `/uploads/<category>/<file>` (static) and through the image endpoints.

use std::{
    fmt,
    path::{Component, Path, PathBuf},
};

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

pub const MAX_FILE_SIZE: usize = 5 * 1024 * 1024; // 5MB
pub const ALLOWED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

pub const PLACEHOLDER_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="800" height="450" viewBox="0 0 800 450"><rect width="800" height="450" fill="#0f172a"/><path d="M400 150l60 25v45c0 40-27 70-60 85-33-15-60-45-60-85v-45z" fill="none" stroke="#38bdf8" stroke-width="8"/></svg>"##;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Invalid file path")]
    InvalidPath,

    #[error("Unknown upload folder '{0}'. Allowed: blog, services.")]
    UnknownCategory(String),

    #[error("File too large. Maximum size is {}MB.", MAX_FILE_SIZE / (1024 * 1024))]
    TooLarge,

    #[error("Unsupported file type. Allowed: JPEG, PNG, WebP, GIF.")]
    UnsupportedType,

    #[error("file not found")]
    Missing,

    #[error("Empty file")]
    EmptyUpload,

    #[error("stored file is empty")]
    Empty,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaCategory {
    Blog,
    Services,
}

impl MediaCategory {
    pub fn parse(raw: &str) -> Result<Self, MediaError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "blog" => Ok(MediaCategory::Blog),
            "services" => Ok(MediaCategory::Services),
            _ => Err(MediaError::UnknownCategory(raw.to_string())),
        }
    }

    pub fn dir(self) -> &'static str {
        match self {
            MediaCategory::Blog => "blog",
            MediaCategory::Services => "services",
        }
    }
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub url: String,
    pub filename: String,
    pub size: usize,
    pub mime_type: String,
}

#[derive(Debug)]
pub struct ServedFile {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

fn sniff_image_type(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        // PNG: 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        // GIF: 47 49 46 38
        [0x47, 0x49, 0x46, 0x38, ..] => Some("image/gif"),
        // WebP: RIFF .... WEBP
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        _ => None,
    }
}

fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "bin",
    }
}

pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Checks size, declared type and content of an upload. Returns the sniffed
/// MIME type.
pub fn check_upload(declared: Option<&str>, bytes: &[u8]) -> Result<&'static str, MediaError> {
    if bytes.len() > MAX_FILE_SIZE {
        return Err(MediaError::TooLarge);
    }
    if bytes.is_empty() {
        return Err(MediaError::EmptyUpload);
    }
    if let Some(declared) = declared {
        if !ALLOWED_MIME_TYPES.contains(&declared.to_ascii_lowercase().as_str()) {
            return Err(MediaError::UnsupportedType);
        }
    }
    sniff_image_type(bytes).ok_or(MediaError::UnsupportedType)
}

/// Rejects anything but plain relative segments.
fn safe_relative(raw: &str) -> Result<PathBuf, MediaError> {
    if raw.is_empty() || raw.contains('\\') || raw.contains('\0') {
        return Err(MediaError::InvalidPath);
    }
    let path = Path::new(raw);
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            _ => return Err(MediaError::InvalidPath),
        }
    }
    if clean.as_os_str().is_empty() {
        return Err(MediaError::InvalidPath);
    }
    Ok(clean)
}

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validates and writes an upload. Nothing touches the disk unless every
    /// check passes.
    pub async fn save(
        &self,
        category: MediaCategory,
        declared: Option<&str>,
        bytes: &[u8],
    ) -> Result<StoredFile, MediaError> {
        let mime_type = check_upload(declared, bytes)?;

        let dir = self.root.join(category.dir());
        tokio::fs::create_dir_all(&dir).await?;

        let filename = format!("{}.{}", Uuid::new_v4(), extension_for(mime_type));
        tokio::fs::write(dir.join(&filename), bytes).await?;

        tracing::info!(folder = %category, file = %filename, size = bytes.len(), "Image uploaded");

        Ok(StoredFile {
            url: format!("/uploads/{}/{}", category.dir(), filename),
            filename,
            size: bytes.len(),
            mime_type: mime_type.to_string(),
        })
    }

    /// Resolves `<category>/<file>`, tolerating a leading `uploads/`.
    pub async fn open(&self, raw: &str) -> Result<ServedFile, MediaError> {
        let raw = raw.trim_start_matches('/');
        let raw = raw.strip_prefix("uploads/").unwrap_or(raw);
        let relative = safe_relative(raw)?;

        let mut parts = relative.components();
        let category = match parts.next() {
            Some(Component::Normal(first)) => {
                MediaCategory::parse(first.to_str().ok_or(MediaError::InvalidPath)?)?
            }
            _ => return Err(MediaError::InvalidPath),
        };
        let rest = parts.as_path();
        if rest.as_os_str().is_empty() {
            return Err(MediaError::InvalidPath);
        }
        self.read(category, rest).await
    }

    pub async fn open_in(&self, category: MediaCategory, raw: &str) -> Result<ServedFile, MediaError> {
        let relative = safe_relative(raw.trim_start_matches('/'))?;
        self.read(category, &relative).await
    }

    async fn read(&self, category: MediaCategory, relative: &Path) -> Result<ServedFile, MediaError> {
        let path = self.root.join(category.dir()).join(relative);
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) if m.is_file() => m,
            Ok(_) => return Err(MediaError::Missing),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(MediaError::Missing),
            Err(e) => return Err(e.into()),
        };
        if metadata.len() == 0 {
            tracing::error!(path = %path.display(), "Stored image is zero bytes");
            return Err(MediaError::Empty);
        }

        let bytes = tokio::fs::read(&path).await?;
        Ok(ServedFile {
            bytes,
            content_type: content_type_for(&path),
        })
    }
}
