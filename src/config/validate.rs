//! Config validation logic.
//! Verifies the source tree is a readable directory, the destination is not a
//! file, tunables are in range, and the two trees are disjoint.

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use super::types::Config;

impl Config {
    /// Validate paths and tunables. Does not create anything.
    pub fn validate(&self) -> Result<()> {
        let src = &self.source_dir;
        let dst = &self.dest_dir;

        if src.as_os_str().is_empty() {
            bail!("source_dir is not set");
        }
        if dst.as_os_str().is_empty() {
            bail!("dest_dir is not set");
        }

        // 1) Source: must exist, be a directory, and be readable.
        ensure_dir_exists_and_is_dir(src, "source_dir")?;
        fs::read_dir(src).with_context(|| {
            format!("Cannot read source_dir '{}'; check permissions", src.display())
        })?;
        debug!("source_dir readable: {}", src.display());

        // 2) Destination: may be missing (created by the batch), but never a file.
        if dst.exists() && !dst.is_dir() {
            error!("dest_dir exists but isn't a directory: {}", dst.display());
            bail!("dest_dir exists but isn't a directory: {}", dst.display());
        }

        // 3) Tunables.
        if self.chunk_size == 0 {
            bail!("chunk_size must be at least 1 byte");
        }
        if self.max_concurrent_transfers == Some(0) {
            bail!("max_concurrent_transfers must be at least 1 (omit it for unbounded)");
        }

        // 4) Disjoint trees: sorting into the source would re-read our own output.
        let src_real = fs::canonicalize(src).unwrap_or_else(|_| src.clone());
        let dst_real = resolve_lenient(dst);
        if src_real == dst_real {
            bail!(
                "source_dir and dest_dir resolve to the same path: '{}'",
                src_real.display()
            );
        }
        if dst_real.starts_with(&src_real) {
            bail!(
                "dest_dir '{}' must not be inside source_dir '{}'",
                dst_real.display(),
                src_real.display()
            );
        }
        if src_real.starts_with(&dst_real) {
            bail!(
                "source_dir '{}' must not be inside dest_dir '{}'",
                src_real.display(),
                dst_real.display()
            );
        }

        info!(
            "Config validated: source='{}' dest='{}' chunk={} max_concurrent={} timeout_ms={}",
            src.display(),
            dst.display(),
            self.chunk_size,
            self.max_concurrent_transfers
                .map(|n| n.to_string())
                .unwrap_or_else(|| "unbounded".into()),
            self.transfer_timeout
                .map(|t| t.as_millis().to_string())
                .unwrap_or_else(|| "none".into())
        );
        Ok(())
    }
}

/// Ensure path exists and is a directory; emit clear errors with path context.
fn ensure_dir_exists_and_is_dir(path: &Path, name: &str) -> Result<()> {
    if !path.exists() {
        error!("{name} does not exist: {}", path.display());
        bail!("{name} does not exist: {}", path.display());
    }
    if !path.is_dir() {
        error!("{name} is not a directory: {}", path.display());
        bail!("{name} is not a directory: {}", path.display());
    }
    Ok(())
}

/// Canonicalize the longest existing prefix of `path` and re-append the rest.
fn resolve_lenient(path: &Path) -> PathBuf {
    let mut tail = Vec::new();
    let mut cur = path;
    loop {
        if let Ok(real) = fs::canonicalize(cur) {
            let mut out = real;
            for part in tail.iter().rev() {
                out.push(part);
            }
            return out;
        }
        match (cur.parent(), cur.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name.to_os_string());
                cur = parent;
            }
            _ => return path.to_path_buf(),
        }
    }
}
