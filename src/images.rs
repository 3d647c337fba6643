//! Image upload validation and file storage for category and product
//! pictures.

use std::fs;
use std::io;
use std::path::PathBuf;

use uuid::Uuid;

/// MIME types accepted for category images.
pub const ALLOWED_IMAGE_MIME_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/png",
    "image/jpg",
    "image/gif",
    "image/svg+xml",
];

/// 2 MiB upload cap.
pub const MAX_IMAGE_SIZE: usize = 2048 * 1024;

/// An uploaded image as received from the (out-of-scope) HTTP layer.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub data: Vec<u8>,
    pub mime_type: String,
    pub extension: String,
}

impl ImageUpload {
    /// MIME allow-list plus the size cap.
    pub fn is_allowed(&self) -> bool {
        ALLOWED_IMAGE_MIME_TYPES.contains(&self.mime_type.as_str())
            && self.data.len() <= MAX_IMAGE_SIZE
    }
}

/// File storage collaborator for stored images.
pub trait ImageStore: Send + Sync {
    fn save(&self, path: &str, data: &[u8]) -> io::Result<()>;

    /// Deleting a file that does not exist is not an error.
    fn delete(&self, path: &str) -> io::Result<()>;

    fn exists(&self, path: &str) -> bool;
}

/// Stores images under a root directory on the local filesystem.
pub struct DiskImageStore {
    root: PathBuf,
}

impl DiskImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ImageStore for DiskImageStore {
    fn save(&self, path: &str, data: &[u8]) -> io::Result<()> {
        let full = self.root.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(full, data)
    }

    fn delete(&self, path: &str) -> io::Result<()> {
        match fs::remove_file(self.root.join(path)) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    fn exists(&self, path: &str) -> bool {
        self.root.join(path).exists()
    }
}

/// A collision-free stored path: `<dir>/<random uuid>.<extension>`.
pub fn unique_image_name(dir: &str, extension: &str) -> String {
    format!("{}/{}.{}", dir, Uuid::new_v4(), extension)
}
