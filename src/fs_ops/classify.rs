//! Extension-based classification.
//! Maps a file name to the category directory it is sorted into.

use std::ffi::OsStr;
use std::fmt;

/// Category used for names without a usable extension.
pub const NO_EXTENSION: &str = "noext";

/// Normalized grouping key: a lowercased extension or [`NO_EXTENSION`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Category(String);

impl Category {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_fallback(&self) -> bool {
        self.0 == NO_EXTENSION
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Category {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Classify a bare file name.
///
/// Rules:
/// - the extension is whatever follows the last `.`;
/// - a leading dot does not start an extension (`.bashrc` -> `noext`);
/// - an empty extension (`notes.`) falls back to `noext`;
/// - the result is lowercased.
///
/// Total over all strings; never fails.
pub fn classify(file_name: &str) -> Category {
    let ext = match file_name.rfind('.') {
        Some(0) | None => None,
        Some(i) => Some(&file_name[i + 1..]),
    };
    match ext {
        Some(e) if !e.is_empty() => Category(e.to_lowercase()),
        _ => Category(NO_EXTENSION.to_string()),
    }
}

/// Classify an OS file name; non-UTF-8 bytes are replaced lossily.
pub fn classify_os(file_name: &OsStr) -> Category {
    classify(&file_name.to_string_lossy())
}
