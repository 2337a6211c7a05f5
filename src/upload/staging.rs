//! Staged temp files
//!
//! Plays the part of the transport layer's multipart temp file: content is
//! written to a uniquely named file in the temp directory and handed to the
//! upload handler as an [`UploadEntry`]. If the handler never moves it away,
//! the file is removed on drop.
//!
//! # Example
//!
//! ```no_run
//! use bytes::Bytes;
//! use file_uploadr::upload::staging::StagedFile;
//!
//! # fn main() -> std::io::Result<()> {
//! let staged = StagedFile::from_bytes(Bytes::from("Hello, World!"))?;
//! let entry = staged.entry("hello.txt", "text/plain");
//!
//! println!("Temp: {:?}", entry.temp_path);
//! println!("Size: {:?}", entry.size);
//! # Ok(())
//! # }
//! ```

use super::UploadEntry;
use bytes::Bytes;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Temp file awaiting upload processing
///
/// Cleaned up when dropped unless it has been moved into place.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    size: u64,
}

impl StagedFile {
    /// Stage `data` in the system temp directory
    pub fn from_bytes(data: Bytes) -> io::Result<Self> {
        Self::from_bytes_in(&std::env::temp_dir(), data)
    }

    /// Stage `data` in `dir`
    pub fn from_bytes_in(dir: &Path, data: Bytes) -> io::Result<Self> {
        let file_name = format!("uploadr-{}.tmp", uuid::Uuid::new_v4());
        let path = dir.join(file_name);

        let mut file = File::create(&path)?;
        file.write_all(&data)?;
        file.flush()?;

        Ok(Self {
            path,
            size: data.len() as u64,
        })
    }

    /// Get the path to the temp file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the number of bytes staged
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Describe the staged file as a multipart entry
    pub fn entry(&self, name: impl Into<String>, mime_type: impl Into<String>) -> UploadEntry {
        UploadEntry::multipart(self.path.clone(), name, self.size, mime_type)
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to clean up staged file"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_bytes() {
        let staged = StagedFile::from_bytes(Bytes::from("test data")).unwrap();

        assert!(staged.path().exists());
        assert_eq!(staged.size(), 9);
    }

    #[test]
    fn test_entry_describes_staged_file() {
        let dir = tempfile::tempdir().unwrap();
        let staged = StagedFile::from_bytes_in(dir.path(), Bytes::from("abc")).unwrap();

        let entry = staged.entry("a.txt", "text/plain");

        assert_eq!(entry.temp_path.as_deref(), Some(staged.path()));
        assert_eq!(entry.name, "a.txt");
        assert_eq!(entry.size, Some(3));
        assert_eq!(entry.mime_type.as_deref(), Some("text/plain"));
        assert_eq!(entry.error, None);
    }

    #[test]
    fn test_cleanup_on_drop() {
        let path;
        {
            let staged = StagedFile::from_bytes(Bytes::from("temp data")).unwrap();
            path = staged.path().to_path_buf();
            assert!(path.exists());
        }
        // Dropped
        assert!(!path.exists());
    }

    #[test]
    fn test_drop_after_move_is_quiet() {
        let dir = tempfile::tempdir().unwrap();
        let staged = StagedFile::from_bytes_in(dir.path(), Bytes::from("x")).unwrap();
        let dest = dir.path().join("moved");
        std::fs::rename(staged.path(), &dest).unwrap();

        drop(staged);

        assert!(dest.exists());
    }
}
