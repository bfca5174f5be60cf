//! XML configuration support.
//! - Loads settings from config.xml (quick_xml + serde).
//! - A missing file at the default location means "use defaults".
//! - Unknown fields and malformed values are hard errors so misconfigurations
//!   surface before any file is touched.

use anyhow::{Context, Result};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use super::paths::{CONFIG_ENV_VAR, default_config_path};
use super::types::{Config, LogLevel};

/// Struct mirroring the XML config for deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    source_dir: Option<String>,
    dest_dir: Option<String>,
    #[serde(default, deserialize_with = "de_u64_trimmed_opt")]
    chunk_size: Option<u64>,
    #[serde(default, deserialize_with = "de_u64_trimmed_opt")]
    max_concurrent_transfers: Option<u64>,
    #[serde(default, deserialize_with = "de_u64_trimmed_opt")]
    timeout_millis: Option<u64>,
    #[serde(default, deserialize_with = "de_bool_trimmed_opt")]
    follow_symlinks: Option<bool>,
    log_level: Option<String>,
    log_file: Option<String>,
}

// Optional u64 with surrounding whitespace tolerated; garbage is an error.
fn de_u64_trimmed_opt<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse::<u64>()
            .map(Some)
            .map_err(|e| D::Error::custom(format!("invalid number '{s}': {e}"))),
    }
}

fn de_bool_trimmed_opt<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt.as_deref().map(|s| s.trim().to_ascii_lowercase()) {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) if s == "true" || s == "1" || s == "yes" => Ok(Some(true)),
        Some(s) if s == "false" || s == "0" || s == "no" => Ok(Some(false)),
        Some(s) => Err(D::Error::custom(format!("invalid boolean '{s}'"))),
    }
}

fn non_empty_path(s: Option<&str>) -> Option<PathBuf> {
    s.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(PathBuf::from)
}

// Map XmlConfig -> Config
fn xml_to_config(parsed: XmlConfig) -> Result<Config> {
    let mut cfg = Config::default();

    if let Some(p) = non_empty_path(parsed.source_dir.as_deref()) {
        cfg.source_dir = p;
    }
    if let Some(p) = non_empty_path(parsed.dest_dir.as_deref()) {
        cfg.dest_dir = p;
    }
    cfg.log_file = non_empty_path(parsed.log_file.as_deref());

    if let Some(s) = parsed.log_level.as_deref() {
        cfg.log_level = s
            .trim()
            .parse::<LogLevel>()
            .map_err(anyhow::Error::msg)?;
    }

    if let Some(n) = parsed.chunk_size {
        cfg.chunk_size = usize::try_from(n).context("chunk_size does not fit in usize")?;
    }
    if let Some(n) = parsed.max_concurrent_transfers {
        cfg.max_concurrent_transfers =
            Some(usize::try_from(n).context("max_concurrent_transfers does not fit in usize")?);
    }
    cfg.transfer_timeout = parsed.timeout_millis.map(Duration::from_millis);
    cfg.follow_symlinks = parsed.follow_symlinks.unwrap_or(false);

    Ok(cfg)
}

/// Load a Config from a specific XML file path.
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read config xml '{}'", path.display()))?;
    let parsed: XmlConfig = from_xml_str(&contents)
        .with_context(|| format!("parse config xml '{}'", path.display()))?;
    xml_to_config(parsed).with_context(|| format!("invalid value in '{}'", path.display()))
}

/// Resolve and load the config file.
///
/// Precedence: `explicit` path, then `$EXT_SORTER_CONFIG`, then the platform
/// default. An explicitly named file must exist; a missing default file yields
/// `Ok(None)`.
pub fn load_config(explicit: Option<&Path>) -> Result<Option<Config>> {
    if let Some(p) = explicit {
        return load_config_from_xml_path(p).map(Some);
    }
    let named_by_env = env::var_os(CONFIG_ENV_VAR).is_some();
    let path = default_config_path()?;
    if !named_by_env && !path.exists() {
        debug!(path = %path.display(), "no config file; using defaults");
        return Ok(None);
    }
    debug!(path = %path.display(), "loading config file");
    load_config_from_xml_path(&path).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn whitespace_is_trimmed() {
        let td = tempdir().unwrap();
        let p = td.path().join("config.xml");
        fs::write(
            &p,
            "<config>\n  <source_dir>  /in  </source_dir>\n  <chunk_size> 4096 </chunk_size>\n  <follow_symlinks> TRUE </follow_symlinks>\n</config>",
        )
        .unwrap();
        let cfg = load_config_from_xml_path(&p).unwrap();
        assert_eq!(cfg.source_dir, PathBuf::from("/in"));
        assert_eq!(cfg.chunk_size, 4096);
        assert!(cfg.follow_symlinks);
    }

    #[test]
    fn bad_number_is_an_error() {
        let td = tempdir().unwrap();
        let p = td.path().join("config.xml");
        fs::write(&p, "<config><chunk_size>lots</chunk_size></config>").unwrap();
        assert!(load_config_from_xml_path(&p).is_err());
    }

    #[test]
    fn unknown_field_is_an_error() {
        let td = tempdir().unwrap();
        let p = td.path().join("config.xml");
        fs::write(&p, "<config><colour>blue</colour></config>").unwrap();
        let err = load_config_from_xml_path(&p).unwrap_err();
        assert!(format!("{err:#}").contains("unknown field"));
    }
}
