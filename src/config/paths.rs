//! Default path helpers and symlink checks.
//! Determines OS-appropriate config/log paths and detects symlinked ancestors for safety.

use anyhow::{Result, anyhow};
use dirs::{config_dir, data_dir};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "EXT_SORTER_CONFIG";

/// Config path: `$EXT_SORTER_CONFIG` if set, else `<config_dir>/ext_sorter/config.xml`.
pub fn default_config_path() -> Result<PathBuf> {
    if let Some(p) = env::var_os(CONFIG_ENV_VAR) {
        let p = PathBuf::from(p);
        if p.as_os_str().is_empty() {
            return Err(anyhow!("{CONFIG_ENV_VAR} is set but empty"));
        }
        return Ok(p);
    }
    if let Some(base) = config_dir() {
        return Ok(base.join("ext_sorter").join("config.xml"));
    }
    env::var_os("HOME")
        .map(|h| {
            PathBuf::from(h)
                .join(".config")
                .join("ext_sorter")
                .join("config.xml")
        })
        .ok_or_else(|| anyhow!("cannot determine a config directory (no config dir or HOME)"))
}

/// OS-appropriate default log file path (data dir). Does not create anything.
pub fn default_log_path() -> Result<PathBuf> {
    if let Some(base) = data_dir() {
        return Ok(base.join("ext_sorter").join("ext_sorter.log"));
    }
    env::var_os("HOME")
        .map(|h| {
            PathBuf::from(h)
                .join(".local")
                .join("share")
                .join("ext_sorter")
                .join("ext_sorter.log")
        })
        .ok_or_else(|| anyhow!("cannot determine a data directory (no data dir or HOME)"))
}

/// Return true if any existing ancestor of `path` is a symlink.
pub fn path_has_symlink_ancestor(path: &Path) -> io::Result<bool> {
    let mut p = path.parent();
    while let Some(anc) = p {
        if anc.exists() {
            let meta = fs::symlink_metadata(anc)?;
            if meta.file_type().is_symlink() {
                return Ok(true);
            }
        }
        p = anc.parent();
    }
    Ok(false)
}
