//! Configuration: types, default paths, XML loading and validation.
//! CLI flags are applied on top by `cli::Args::apply_overrides`.

pub mod paths;
pub mod types;
mod validate;
pub mod xml;

pub use paths::{CONFIG_ENV_VAR, default_config_path, default_log_path, path_has_symlink_ancestor};
pub use types::{Config, LogLevel};
pub use xml::{load_config, load_config_from_xml_path};
