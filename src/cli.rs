//! Command-line interface for keepass-ssh.
//!
//! Parses arguments using clap and provides the [`Cli`] struct containing
//! all user-specified options. Database, key file and group fall back to the
//! `DB_PATH`, `KEY_PATH` and `GROUP_PATH` environment variables. The master
//! password has no flag; it is read from `DB_PASSWORD` or prompted for.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for keepass-ssh.
///
/// # Examples
///
/// ```bash
/// # Pick interactively from the root group of a database
/// keepass-ssh -D ~/Passwords.kdbx -K ~/Passwords.keyx
///
/// # Connect straight to the only entry whose title contains "prod-db"
/// keepass-ssh -s prod-db
///
/// # List the servers in a group and exit
/// keepass-ssh -g Servers/Staging --list
/// ```
#[derive(Parser, Debug)]
#[command(name = "keepass-ssh")]
#[command(version)]
#[command(about = "Open an SSH session to a server stored in a KeePass database")]
#[command(long_about = "keepass-ssh reads server entries from a KeePass database, lets you pick one\n\
    and hands the terminal over to ssh with the entry's user, host and port.\n\n\
    Entry URLs are read as `host` or `host:port` (port defaults to 22).")]
pub struct Cli {
    /// Path to the KeePass database (.kdbx).
    #[arg(short = 'D', long, value_name = "PATH", env = "DB_PATH")]
    pub database: Option<PathBuf>,

    /// Path to the database key file.
    #[arg(short = 'K', long, value_name = "PATH", env = "KEY_PATH")]
    pub key_file: Option<PathBuf>,

    /// Group path to list entries from (e.g. `Servers/Web`).
    ///
    /// The value `root` (the default) selects entries at the top level only.
    #[arg(short, long, value_name = "PATH", env = "GROUP_PATH")]
    pub group: Option<String>,

    /// List entries from every group (overrides `--group`).
    #[arg(short, long)]
    pub all: bool,

    /// Connect to the server whose title contains this text (case-insensitive).
    ///
    /// Searches every group. When several titles match, you are asked to
    /// pick one of them.
    #[arg(short, long, value_name = "TEXT", conflicts_with = "all")]
    pub server: Option<String>,

    /// List matching servers and exit.
    #[arg(short, long)]
    pub list: bool,

    /// Enable debug logging on stderr.
    #[arg(short, long)]
    pub verbose: bool,

    /// Read settings from this config file instead of the default location.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Prompt for the database master password.
    #[arg(short = 'p', long)]
    pub ask_password: bool,

    /// Disable coloured output.
    #[arg(long)]
    pub no_color: bool,

    /// Pass the entry password on the client command line (sshpass / plink -pw).
    ///
    /// The password becomes visible to other local users in process listings.
    #[arg(long)]
    pub embed_password: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "keepass-ssh",
            "-D",
            "/path/to/database.kdbx",
            "-K",
            "/path/to/keyfile.key",
            "-g",
            "Servers/Web",
            "-l",
        ])
        .unwrap();
        assert_eq!(cli.database, Some(PathBuf::from("/path/to/database.kdbx")));
        assert_eq!(cli.key_file, Some(PathBuf::from("/path/to/keyfile.key")));
        assert_eq!(cli.group.as_deref(), Some("Servers/Web"));
        assert!(cli.list);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_lowercase_database_flag_is_rejected() {
        assert!(Cli::try_parse_from(["keepass-ssh", "-d", "/path/to/database.kdbx"]).is_err());
    }

    #[test]
    fn test_master_password_flag_is_rejected() {
        assert!(Cli::try_parse_from(["keepass-ssh", "--password", "hunter2"]).is_err());
    }

    #[test]
    fn test_server_conflicts_with_all() {
        assert!(Cli::try_parse_from(["keepass-ssh", "-s", "web", "-a"]).is_err());
    }
}
