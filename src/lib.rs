//! # keepass-ssh
//!
//! Open an SSH session to a server whose credentials live in a KeePass database.
//!
//! Entries are read from a `.kdbx` file, filtered by group or title, listed
//! with a number each, and the chosen one is handed to the system `ssh` client
//! (or `plink` on Windows). The entry's URL field holds `host` or `host:port`.
//!
//! ## Quick Example
//!
//! ```toml
//! # ~/.config/keepass-ssh/config.toml
//! database = "~/Passwords.kdbx"
//! key_file = "~/Passwords.keyx"
//! group = "Servers/Production"
//! ```
//!
//! ```bash
//! keepass-ssh            # pick from Servers/Production
//! keepass-ssh -s db      # connect to the entry titled like "db"
//! ```
//!
//! ## Architecture
//!
//! - [`cli`]: Command-line argument parsing with clap
//! - [`config`]: Config file format and settings precedence
//! - [`loader`]: Config file and database discovery
//! - [`store`]: Read-only snapshot of the password database
//! - [`server`]: Server records and URL parsing
//! - [`resolver`]: Entry selection by group, root or title
//! - [`selector`]: Numbered listing and interactive choice
//! - [`ssh`]: Client command construction and launch
//! - [`error`]: Error types

pub mod cli;
pub mod config;
pub mod error;
pub mod loader;
pub mod resolver;
pub mod selector;
pub mod server;
pub mod ssh;
pub mod store;

pub use config::{FileConfig, SelectionCriterion, Settings};
pub use error::{KeepassSshError, Result};
pub use resolver::Resolution;
pub use server::ServerRecord;
pub use store::{RawEntry, Store};
