use ext_sorter::{CONFIG_ENV_VAR, LogLevel, default_config_path, load_config, load_config_from_xml_path};
use serial_test::serial;
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn full_xml_is_read() {
    let td = tempdir().unwrap();
    let cfg_path = td.path().join("config.xml");
    fs::write(
        &cfg_path,
        r#"<config>
  <source_dir>/data/in</source_dir>
  <dest_dir> /data/out </dest_dir>
  <chunk_size>4096</chunk_size>
  <max_concurrent_transfers>8</max_concurrent_transfers>
  <timeout_millis>1500</timeout_millis>
  <follow_symlinks>yes</follow_symlinks>
  <log_level>debug</log_level>
  <log_file>/var/log/ext_sorter.log</log_file>
</config>"#,
    )
    .unwrap();

    let cfg = load_config_from_xml_path(&cfg_path).unwrap();
    assert_eq!(cfg.source_dir, std::path::PathBuf::from("/data/in"));
    assert_eq!(cfg.dest_dir, std::path::PathBuf::from("/data/out"));
    assert_eq!(cfg.chunk_size, 4096);
    assert_eq!(cfg.max_concurrent_transfers, Some(8));
    assert_eq!(cfg.transfer_timeout, Some(Duration::from_millis(1500)));
    assert!(cfg.follow_symlinks);
    assert_eq!(cfg.log_level, LogLevel::Debug);
    assert!(cfg.log_file.is_some());
}

#[test]
fn sparse_xml_keeps_defaults() {
    let td = tempdir().unwrap();
    let cfg_path = td.path().join("config.xml");
    fs::write(&cfg_path, "<config><dest_dir>/out</dest_dir></config>").unwrap();

    let cfg = load_config_from_xml_path(&cfg_path).unwrap();
    assert_eq!(cfg.chunk_size, 1024);
    assert!(cfg.max_concurrent_transfers.is_none());
    assert!(cfg.transfer_timeout.is_none());
    assert!(!cfg.follow_symlinks);
    assert_eq!(cfg.log_level, LogLevel::Normal);
}

#[test]
fn malformed_xml_is_an_error() {
    let td = tempdir().unwrap();
    let cfg_path = td.path().join("config.xml");
    fs::write(&cfg_path, "<config><chunk_size>lots</chunk_size></config>").unwrap();
    let err = load_config_from_xml_path(&cfg_path).unwrap_err();
    assert!(format!("{err:#}").contains("lots"));
}

#[test]
#[serial]
fn env_var_names_the_config_file() {
    let td = tempdir().unwrap();
    let cfg_path = td.path().join("custom.xml");
    fs::write(&cfg_path, "<config><chunk_size>77</chunk_size></config>").unwrap();

    unsafe {
        std::env::set_var(CONFIG_ENV_VAR, &cfg_path);
    }
    let resolved = default_config_path().unwrap();
    let loaded = load_config(None);
    unsafe {
        std::env::remove_var(CONFIG_ENV_VAR);
    }

    assert_eq!(resolved, cfg_path);
    assert_eq!(loaded.unwrap().unwrap().chunk_size, 77);
}

#[test]
#[serial]
fn env_var_pointing_at_missing_file_is_an_error() {
    let td = tempdir().unwrap();
    unsafe {
        std::env::set_var(CONFIG_ENV_VAR, td.path().join("absent.xml"));
    }
    let loaded = load_config(None);
    unsafe {
        std::env::remove_var(CONFIG_ENV_VAR);
    }
    assert!(loaded.is_err());
}

#[test]
#[serial]
fn explicit_path_beats_env_var() {
    let td = tempdir().unwrap();
    let env_cfg = td.path().join("env.xml");
    let explicit = td.path().join("explicit.xml");
    fs::write(&env_cfg, "<config><chunk_size>1</chunk_size></config>").unwrap();
    fs::write(&explicit, "<config><chunk_size>2</chunk_size></config>").unwrap();

    unsafe {
        std::env::set_var(CONFIG_ENV_VAR, &env_cfg);
    }
    let loaded = load_config(Some(&explicit));
    unsafe {
        std::env::remove_var(CONFIG_ENV_VAR);
    }
    assert_eq!(loaded.unwrap().unwrap().chunk_size, 2);
}
