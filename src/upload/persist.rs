//! Filesystem side of an upload: placing the file and measuring it

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;

/// Move a temp file to `dest`
///
/// Uses `rename(2)`; when the temp file lives on another filesystem the
/// content is copied and the source removed.
pub fn move_into_place(temp_path: &Path, dest: &Path) -> io::Result<()> {
    match fs::rename(temp_path, dest) {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device(&e) => {
            tracing::debug!(
                from = %temp_path.display(),
                to = %dest.display(),
                "Rename crosses filesystems, copying instead"
            );
            copy_into_place(temp_path, dest)
        }
        Err(e) => Err(e),
    }
}

/// Copy `temp_path` to `dest`, then remove the source
///
/// A failed copy leaves no `dest` behind. Once the copy is complete the file
/// counts as stored: failing to remove the source is only logged.
pub fn copy_into_place(temp_path: &Path, dest: &Path) -> io::Result<()> {
    if let Err(e) = fs::copy(temp_path, dest) {
        discard(dest);
        return Err(e);
    }

    if let Err(e) = fs::remove_file(temp_path) {
        tracing::warn!(
            path = %temp_path.display(),
            error = %e,
            "Failed to remove temp file after copy"
        );
    }
    Ok(())
}

/// Stream `body` into a newly created `dest`, returning bytes written
///
/// A partially written `dest` is removed on failure.
pub fn write_stream<R: Read + ?Sized>(body: &mut R, dest: &Path) -> io::Result<u64> {
    let mut file = File::create(dest)?;
    let written = io::copy(body, &mut file).and_then(|n| file.flush().map(|_| n));
    if written.is_err() {
        drop(file);
        discard(dest);
    }
    written
}

/// On-disk size of `path`
pub fn measure(path: &Path) -> io::Result<u64> {
    fs::metadata(path).map(|m| m.len())
}

/// Remove `path`, logging instead of failing
pub fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to remove rejected upload"
            );
        }
    }
}

#[cfg(unix)]
fn is_cross_device(e: &io::Error) -> bool {
    e.raw_os_error() == Some(libc::EXDEV)
}

#[cfg(not(unix))]
fn is_cross_device(_e: &io::Error) -> bool {
    false
}
