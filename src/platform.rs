//! Platform-specific helpers.
//! Only the log file needs them: it is opened owner-only on Unix and never
//! through a symlink in its final component.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

/// Open `path` for appending, creating it owner-only (0600) when absent.
/// An existing file keeps its mode. Fails with ELOOP if `path` is a symlink.
#[cfg(unix)]
pub fn open_log_file_secure_append(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    OpenOptions::new()
        .create(true)
        .append(true)
        .mode(0o600)
        .custom_flags(libc::O_NOFOLLOW)
        .open(path)
}

#[cfg(not(unix))]
pub fn open_log_file_secure_append(path: &Path) -> io::Result<File> {
    if let Ok(meta) = std::fs::symlink_metadata(path)
        && meta.file_type().is_symlink()
    {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("refusing to open symlinked log file {}", path.display()),
        ));
    }
    OpenOptions::new().create(true).append(true).open(path)
}
