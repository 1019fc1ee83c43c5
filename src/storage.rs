//! Upload storage on the local filesystem.
//!
//! Files live in one subdirectory per document category beneath a single
//! upload root. Records only ever hold paths relative to that root, and every
//! path coming back from a record or a request is resolved through
//! [`UploadStore::resolve`] so nothing outside the root can be read or removed.
//!
//! File types are classified by extension only. Content is not sniffed.

use std::{
    io,
    path::{Component, Path, PathBuf},
};

use chrono::Utc;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::models::submission::FormVariant;

pub const LOGO_DIR: &str = "logos";
pub const BANK_DETAILS_DIR: &str = "bank-details";
pub const COMMERCIAL_REGISTER_DIR: &str = "commercial-registers";

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "svg", "webp"];
const MAX_EXTENSION_LEN: usize = 10;

/// What happened to a file during cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRemoval {
    Removed,
    /// The file did not exist; not an error.
    AlreadyGone,
}

/// Handle on the upload root.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
    variant: FormVariant,
}

impl UploadStore {
    /// Create the root if needed and pin it to its canonical absolute path.
    pub fn open(root: impl AsRef<Path>, variant: FormVariant) -> io::Result<Self> {
        std::fs::create_dir_all(root.as_ref())?;
        let root = std::fs::canonicalize(root.as_ref())?;
        Ok(Self { root, variant })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn variant(&self) -> FormVariant {
        self.variant
    }

    /// Category subdirectories for the configured form variant.
    pub fn categories(&self) -> [&'static str; 4] {
        [
            LOGO_DIR,
            BANK_DETAILS_DIR,
            COMMERCIAL_REGISTER_DIR,
            self.variant.supplementary_dir(),
        ]
    }

    /// Create every category directory. Safe to call on every request.
    pub async fn ensure_dirs(&self) -> io::Result<()> {
        for dir in self.categories() {
            tokio::fs::create_dir_all(self.root.join(dir)).await?;
        }
        Ok(())
    }

    /// Write `bytes` under `dir` with a generated name and return the relative path.
    ///
    /// The file is opened with `create_new`, so a name collision fails loudly
    /// instead of overwriting another vendor's document.
    pub async fn save(&self, dir: &str, original_name: &str, bytes: &[u8]) -> io::Result<String> {
        let name = generate_file_name(original_name);
        let path = self.root.join(dir).join(&name);

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        file.write_all(bytes).await?;
        file.flush().await?;

        Ok(format!("{dir}/{name}"))
    }

    /// Delete the file behind a stored relative path.
    ///
    /// A missing file is reported as [`FileRemoval::AlreadyGone`]. A path that
    /// escapes the root is refused without touching the filesystem.
    pub async fn remove(&self, relative: &str) -> io::Result<FileRemoval> {
        let path = self.resolve(relative).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("path `{relative}` escapes the upload root"),
            )
        })?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(FileRemoval::Removed),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(FileRemoval::AlreadyGone),
            Err(e) => Err(e),
        }
    }

    /// Resolve a relative path against the root without touching the filesystem.
    ///
    /// Returns `None` when the normalized path would leave the root: a `..`
    /// climbing above it, an absolute path, or a drive prefix.
    pub fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let mut resolved = self.root.clone();
        let mut depth = 0usize;

        for component in Path::new(relative).components() {
            match component {
                Component::Normal(segment) => {
                    resolved.push(segment);
                    depth += 1;
                }
                Component::CurDir => {}
                Component::ParentDir => {
                    if depth == 0 {
                        return None;
                    }
                    resolved.pop();
                    depth -= 1;
                }
                Component::RootDir | Component::Prefix(_) => return None,
            }
        }

        Some(resolved)
    }
}

/// Build a collision-resistant file name that keeps the original's extension.
///
/// Only the sanitized extension of `original` survives; directory segments and
/// the base name are discarded.
pub fn generate_file_name(original: &str) -> String {
    let stamp = Utc::now().timestamp_millis();
    let nonce = Uuid::new_v4().simple();

    match extension(original) {
        Some(ext) => format!("{stamp}-{nonce}.{ext}"),
        None => format!("{stamp}-{nonce}"),
    }
}

pub fn is_valid_image_type(name: &str) -> bool {
    extension(name).is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

pub fn is_valid_pdf_type(name: &str) -> bool {
    extension(name).is_some_and(|ext| ext == "pdf")
}

/// Content type served for a stored file.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Lowercased ASCII-alphanumeric extension of the last path segment.
fn extension(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let (stem, ext) = base.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }

    let ext: String = ext
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(MAX_EXTENSION_LEN)
        .collect::<String>()
        .to_ascii_lowercase();

    (!ext.is_empty()).then_some(ext)
}
