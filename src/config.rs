//! Configuration types for keepass-ssh.
//!
//! Settings come from three layers, highest priority first:
//!
//! 1. Command-line flags and their environment fallbacks ([`Cli`])
//! 2. The TOML config file ([`FileConfig`])
//! 3. Built-in defaults, plus database auto-discovery
//!
//! # Config Format
//!
//! ```toml
//! database = "~/Passwords.kdbx"
//! key_file = "~/Passwords.keyx"
//! group = "Servers/Production"
//! color = true
//!
//! # Legacy: put the entry password on the sshpass / plink command line.
//! embed_password = false
//!
//! # Replace the remote-shell binary (`ssh` on Unix, `plink` on Windows).
//! client = "ssh"
//! ```

use crate::cli::Cli;
use crate::error::{KeepassSshError, Result};
use crate::loader::{expand_tilde, DiscoveredFiles};
use serde::Deserialize;
use std::path::PathBuf;

/// Group value that selects only the entries at the top level.
pub const ROOT_TOKEN: &str = "root";

/// Environment variable holding the database master password.
pub const PASSWORD_ENV: &str = "DB_PASSWORD";

/// Contents of the optional config file. Every key may be omitted.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Path to the KeePass database; `~/` is expanded.
    #[serde(default)]
    pub database: Option<String>,
    /// Path to the key file; `~/` is expanded.
    #[serde(default)]
    pub key_file: Option<String>,
    /// Default group path (or `root`).
    #[serde(default)]
    pub group: Option<String>,
    /// Colourize listings.
    #[serde(default)]
    pub color: Option<bool>,
    /// Embed the entry password in the client invocation.
    #[serde(default)]
    pub embed_password: bool,
    /// Override for the remote-shell binary name.
    #[serde(default)]
    pub client: Option<String>,
}

impl FileConfig {
    /// Parse config from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `toml::de::Error` if the TOML is malformed or has unknown keys.
    pub fn from_str(toml_str: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}

/// Which entries are offered for connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionCriterion {
    /// Every entry with a non-empty URL, from any group.
    All,
    /// Only entries held directly by the root group.
    RootOnly,
    /// Entries held directly by the group at this `/`-separated path.
    GroupPath(String),
    /// Entries whose title contains this text, ignoring case.
    TitleContains(String),
}

impl SelectionCriterion {
    /// Interpret a group value: `root` or `/` means root-level only.
    pub fn from_group(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case(ROOT_TOKEN) || trimmed.trim_matches('/').is_empty() {
            SelectionCriterion::RootOnly
        } else {
            SelectionCriterion::GroupPath(trimmed.to_string())
        }
    }
}

impl std::fmt::Display for SelectionCriterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionCriterion::All => write!(f, "all groups"),
            SelectionCriterion::RootOnly => write!(f, "root group"),
            SelectionCriterion::GroupPath(path) => write!(f, "group '{}'", path),
            SelectionCriterion::TitleContains(text) => write!(f, "titles matching '{}'", text),
        }
    }
}

/// Fully resolved settings for one invocation.
pub struct Settings {
    pub database: PathBuf,
    pub key_file: Option<PathBuf>,
    /// Master password from the environment, if any.
    pub password: Option<String>,
    /// Ask for the master password on the terminal.
    pub prompt_password: bool,
    pub criterion: SelectionCriterion,
    pub list_only: bool,
    pub color: bool,
    pub embed_password: bool,
    pub client: Option<String>,
}

impl Settings {
    /// Merge CLI, config file and defaults.
    ///
    /// `env_password` is the value of [`PASSWORD_ENV`], read by the caller.
    /// `discover` is only called when no layer names a database. A discovered
    /// key file is used only if no key file was configured.
    ///
    /// # Errors
    ///
    /// Returns [`KeepassSshError::MissingDatabase`] if no database path is
    /// found anywhere.
    pub fn resolve<F>(
        cli: &Cli,
        file: &FileConfig,
        env_password: Option<String>,
        discover: F,
    ) -> Result<Self>
    where
        F: FnOnce() -> Option<DiscoveredFiles>,
    {
        let mut database = cli
            .database
            .clone()
            .or_else(|| file.database.as_deref().map(expand_tilde));
        let mut key_file = cli
            .key_file
            .clone()
            .or_else(|| file.key_file.as_deref().map(expand_tilde));

        if database.is_none() {
            if let Some(found) = discover() {
                tracing::debug!(path = %found.database.display(), "discovered database");
                database = Some(found.database);
                if key_file.is_none() {
                    key_file = found.key_file;
                }
            }
        }
        let database = database.ok_or(KeepassSshError::MissingDatabase)?;

        // Precedence: --server > --all > group (flag/env) > config > root
        let criterion = if let Some(ref text) = cli.server {
            SelectionCriterion::TitleContains(text.clone())
        } else if cli.all {
            SelectionCriterion::All
        } else {
            let group = cli
                .group
                .as_deref()
                .or(file.group.as_deref())
                .unwrap_or(ROOT_TOKEN);
            SelectionCriterion::from_group(group)
        };

        let password = env_password.filter(|p| !p.is_empty());
        let prompt_password = password.is_none() && (cli.ask_password || key_file.is_none());

        Ok(Self {
            database,
            key_file,
            password,
            prompt_password,
            criterion,
            list_only: cli.list,
            color: !cli.no_color && file.color.unwrap_or(true),
            embed_password: cli.embed_password || file.embed_password,
            client: file.client.clone(),
        })
    }
}
