//! I/O error enrichment.
//!
//! Turns a bare `io::Error` into a one-line message carrying the operation,
//! the path and a platform-aware hint, so a failure entry in the report can be
//! logged as-is.
//!
//! Usage:
//!   // typed errors (thiserror display attributes)
//!   #[error("{}", describe_io_error("open source", .src, .source))]
//!
//!   // anyhow::Result code paths
//!   fs::create_dir_all(dir).map_err(io_error_with_help("create dir", dir))?;

use anyhow::anyhow;
use std::io;
use std::path::Path;

/// Hint for a raw OS error code, if we know one.
fn hint_for_code(code: i32) -> Option<&'static str> {
    #[cfg(unix)]
    {
        match code {
            libc::EACCES | libc::EPERM => {
                Some("permission denied; check ownership and write permissions")
            }
            libc::ENOENT => Some("path not found; it may have been removed mid-run"),
            libc::EEXIST => Some("already exists"),
            libc::ENOTDIR => Some("a path component is not a directory"),
            libc::EISDIR => Some("is a directory"),
            libc::ENOSPC => Some("insufficient space on device"),
            libc::EROFS => Some("read-only filesystem; cannot write here"),
            libc::ELOOP => Some("too many symbolic link levels; possible symlink cycle"),
            libc::ENAMETOOLONG => Some("filename or path too long"),
            libc::EMFILE => {
                Some("process file descriptor limit reached; lower --max-concurrent")
            }
            libc::ENFILE => Some("system-wide file table overflow; lower --max-concurrent"),
            libc::EBUSY => Some("resource busy"),
            _ => None,
        }
    }
    #[cfg(windows)]
    {
        match code {
            5 => Some("access denied; check permissions"),
            2 | 3 => Some("path not found; it may have been removed mid-run"),
            4 => Some("too many open files; lower --max-concurrent"),
            32 => Some("sharing violation; file is in use"),
            80 | 183 => Some("already exists"),
            112 => Some("insufficient disk space"),
            206 => Some("filename or path too long"),
            _ => None,
        }
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = code;
        None
    }
}

fn hint_for_kind(kind: io::ErrorKind) -> Option<&'static str> {
    match kind {
        io::ErrorKind::PermissionDenied => {
            Some("permission denied; check ownership and write permissions")
        }
        io::ErrorKind::NotFound => Some("path not found; it may have been removed mid-run"),
        io::ErrorKind::AlreadyExists => Some("already exists"),
        io::ErrorKind::TimedOut => Some("timed out"),
        _ => None,
    }
}

/// Format "<op> '<path>': <error>[; hint][ [os code: N]]".
pub fn describe_io_error(op: &str, path: &Path, e: &io::Error) -> String {
    let mut msg = format!("{} '{}': {}", op, path.display(), e);
    match e.raw_os_error() {
        Some(code) => {
            if let Some(h) = hint_for_code(code) {
                msg.push_str("; ");
                msg.push_str(h);
            }
            msg.push_str(&format!(" [os code: {code}]"));
        }
        None => {
            if let Some(h) = hint_for_kind(e.kind()) {
                msg.push_str("; ");
                msg.push_str(h);
            }
        }
    }
    msg
}

/// Adapter for anyhow::Result code.
/// Returns a closure suitable for `.map_err(...)` that converts io::Error -> anyhow::Error.
pub fn io_error_with_help<'a>(
    op: &'a str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> anyhow::Error + 'a {
    move |e: io::Error| anyhow!(describe_io_error(op, path, &e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn includes_op_path_and_kind_hint() {
        let e = io::Error::new(io::ErrorKind::NotFound, "gone");
        let msg = describe_io_error("open source", &PathBuf::from("/x/a.txt"), &e);
        assert!(msg.starts_with("open source '/x/a.txt': gone"));
        assert!(msg.contains("path not found"));
    }

    #[cfg(unix)]
    #[test]
    fn raw_os_codes_are_reported() {
        let e = io::Error::from_raw_os_error(libc::EACCES);
        let msg = describe_io_error("write", &PathBuf::from("/out"), &e);
        assert!(msg.contains("permission denied"));
        assert!(msg.contains(&format!("[os code: {}]", libc::EACCES)));
    }

    #[test]
    fn anyhow_adapter_keeps_message() {
        let p = PathBuf::from("/tmp/zzz");
        let err = io_error_with_help("create dir", &p)(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "nope",
        ));
        assert!(err.to_string().contains("create dir '/tmp/zzz'"));
    }
}
