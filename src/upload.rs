use crate::errors::ApiError;
use crate::notice::Notice;
use sanitize_filename::sanitize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const ALLOWED_EXTENSIONS: [&str; 2] = ["jpg", "png"];

/// A file part pulled out of a multipart form, not yet on disk.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub filename: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stored {
    Saved { filename: String, path: PathBuf },
    Rejected { original: String },
}

impl Stored {
    pub fn filename(&self) -> Option<&str> {
        match self {
            Stored::Saved { filename, .. } => Some(filename),
            Stored::Rejected { .. } => None,
        }
    }

    pub fn notice(&self) -> Notice {
        match self {
            Stored::Saved { path, .. } => Notice::info(format!("File saved to {}", path.display())),
            Stored::Rejected { .. } => {
                Notice::error("Invalid image format! Only jpg and png are allowed.")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    Removed(PathBuf),
    Missing(PathBuf),
}

impl Removal {
    pub fn notice(&self) -> Notice {
        match self {
            Removal::Removed(path) => Notice::info(format!("File removed from {}", path.display())),
            Removal::Missing(_) => Notice::warning("File not found for removal."),
        }
    }
}

/// Reduces an uploaded name to something safe to join onto the upload dir:
/// only the last path component survives, and only `[A-Za-z0-9._-]` is kept.
pub fn secure_filename(raw: &str) -> String {
    let base = raw.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or("");
    let cleaned = sanitize(base);
    let joined = cleaned.split_whitespace().collect::<Vec<_>>().join("_");
    let safe: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(*c, '.' | '_' | '-'))
        .collect();
    safe.trim_matches(|c: char| c == '.' || c == '_').to_string()
}

/// Returns the sanitized name if it carries an allowed image extension.
/// A name without an extension is treated like a disallowed one.
pub fn allowed_image_name(raw: &str) -> Option<String> {
    let safe = secure_filename(raw);
    let (stem, ext) = safe.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    let ext = ext.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(safe)
}

#[derive(Debug, Clone)]
pub struct UploadDir {
    root: PathBuf,
}

impl UploadDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ensure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)
    }

    /// Joins only the final component of `name`, never anything above the root.
    pub fn path_for(&self, name: &str) -> PathBuf {
        let file = Path::new(name).file_name().unwrap_or_default();
        self.root.join(file)
    }

    /// Writes the image under its sanitized name, replacing any file already there.
    pub fn store(&self, image: &UploadedImage) -> Result<Stored, ApiError> {
        let Some(filename) = allowed_image_name(&image.filename) else {
            log::info!("rejected upload {:?}", image.filename);
            return Ok(Stored::Rejected { original: image.filename.clone() });
        };
        let path = self.path_for(&filename);
        std::fs::write(&path, &image.data)?;
        log::info!("stored upload {} ({} bytes)", path.display(), image.data.len());
        Ok(Stored::Saved { filename, path })
    }

    pub fn remove(&self, name: &str) -> Result<Removal, ApiError> {
        let path = self.path_for(name);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(Removal::Removed(path)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::warn!("upload {} already gone", path.display());
                Ok(Removal::Missing(path))
            }
            Err(e) => Err(e.into()),
        }
    }
}
