//! Config file and database discovery.
//!
//! The config file is looked up in this order:
//!
//! 1. `$XDG_CONFIG_HOME/keepass-ssh/config.toml`
//! 2. `~/.config/keepass-ssh/config.toml`
//! 3. Platform default (e.g., `~/Library/Application Support` on macOS)
//!
//! When no database path is configured anywhere, the current directory and
//! then the home directory are scanned for `*.kdbx` files.

use crate::config::FileConfig;
use crate::error::{KeepassSshError, Result};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "keepass-ssh";
const CONFIG_FILE: &str = "config.toml";
const KEY_EXTENSIONS: [&str; 2] = ["keyx", "key"];

/// Determine the config file path.
///
/// Returns the first existing candidate, or `~/.config/keepass-ssh/config.toml`
/// if none exists yet.
///
/// # Errors
///
/// Returns [`KeepassSshError::NoConfigDir`] if the home directory cannot be determined.
pub fn default_config_path() -> Result<PathBuf> {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg).join(APP_DIR).join(CONFIG_FILE);
        if path.exists() {
            return Ok(path);
        }
    }

    let home = dirs::home_dir().ok_or(KeepassSshError::NoConfigDir)?;
    let dot_config = home.join(".config").join(APP_DIR).join(CONFIG_FILE);
    if dot_config.exists() {
        return Ok(dot_config);
    }

    if let Some(config_dir) = dirs::config_dir() {
        let path = config_dir.join(APP_DIR).join(CONFIG_FILE);
        if path.exists() {
            return Ok(path);
        }
    }

    Ok(dot_config)
}

/// Load and parse a config file from the given path.
///
/// # Errors
///
/// - [`KeepassSshError::ConfigNotFound`] if the file doesn't exist
/// - [`KeepassSshError::IoError`] if reading fails
/// - [`KeepassSshError::ParseError`] if TOML parsing fails
pub fn load_config(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        return Err(KeepassSshError::ConfigNotFound(path.to_path_buf()));
    }
    let contents = std::fs::read_to_string(path)?;
    let config = FileConfig::from_str(&contents)?;
    tracing::debug!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Load the config file named on the command line, or the default one.
///
/// An explicit path must exist; a missing default file yields an empty config.
pub fn load_config_or_default(explicit: Option<&Path>) -> Result<FileConfig> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    let path = default_config_path()?;
    if path.exists() {
        load_config(&path)
    } else {
        Ok(FileConfig::default())
    }
}

/// Expand a leading `~/` to the home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// A database found on disk, with the key file that sits next to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFiles {
    pub database: PathBuf,
    pub key_file: Option<PathBuf>,
}

/// Scan the current directory, then the home directory, for a database.
pub fn discover_database() -> Option<DiscoveredFiles> {
    let mut dirs_to_scan = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        dirs_to_scan.push(cwd);
    }
    if let Some(home) = dirs::home_dir() {
        dirs_to_scan.push(home);
    }
    dirs_to_scan.iter().find_map(|dir| discover_in(dir))
}

/// Look for a `*.kdbx` file directly inside `dir`.
///
/// The alphabetically first database wins. Its key file is the sibling with
/// the same stem and a `keyx`/`key` extension, else the first key file in
/// the directory.
pub fn discover_in(dir: &Path) -> Option<DiscoveredFiles> {
    let database = matching_files(dir, "kdbx").into_iter().next()?;

    let same_stem = KEY_EXTENSIONS
        .iter()
        .map(|ext| database.with_extension(ext))
        .find(|candidate| candidate.is_file());
    let key_file = same_stem.or_else(|| {
        KEY_EXTENSIONS
            .iter()
            .find_map(|ext| matching_files(dir, ext).into_iter().next())
    });

    Some(DiscoveredFiles { database, key_file })
}

fn matching_files(dir: &Path, extension: &str) -> Vec<PathBuf> {
    let pattern = format!(
        "{}/*.{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        extension
    );
    let Ok(paths) = glob::glob(&pattern) else {
        return Vec::new();
    };
    let mut found: Vec<PathBuf> = paths.filter_map(|p| p.ok()).filter(|p| p.is_file()).collect();
    found.sort();
    found
}
