use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Prefix shared by every staging file, so leftovers are recognisable.
pub const STAGING_PREFIX: &str = ".ext_sorter.";

static STAGING_SEQ: AtomicU64 = AtomicU64::new(0);

/// Hidden, process-unique sibling path used to stage a copy before rename.
/// Format: ".ext_sorter.<pid>.<nanos>.<seq>.tmp"
pub(crate) fn unique_temp_path(dst_dir: &Path) -> PathBuf {
    let pid = std::process::id();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let seq = STAGING_SEQ.fetch_add(1, Ordering::Relaxed);
    dst_dir.join(format!("{STAGING_PREFIX}{pid}.{nanos}.{seq}.tmp"))
}

/// True for names produced by [`unique_temp_path`].
pub fn is_staging_name(name: &str) -> bool {
    name.starts_with(STAGING_PREFIX) && name.ends_with(".tmp")
}
