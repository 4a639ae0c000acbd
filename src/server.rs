//! Server records derived from database entries.
//!
//! An entry's URL field holds `host` or `host:port`. The port defaults to
//! [`DEFAULT_PORT`] when absent and must otherwise be a decimal number in
//! `1..=65535`.
//!
//! # Example
//!
//! ```
//! use keepass_ssh::server::parse_server_url;
//!
//! assert_eq!(
//!     parse_server_url("10.0.0.1:2222"),
//!     Some(("10.0.0.1".to_string(), 2222))
//! );
//! assert_eq!(parse_server_url("db.internal"), Some(("db.internal".to_string(), 22)));
//! ```

use crate::error::{KeepassSshError, Result};
use crate::store::RawEntry;

/// Port used when the URL field does not name one.
pub const DEFAULT_PORT: u16 = 22;

/// Split a URL field into `(hostname, port)`.
///
/// The string is split on the first `:`. Returns `None` if the part after the
/// colon is not a valid, non-zero port number.
///
/// # Examples
///
/// ```
/// use keepass_ssh::server::parse_server_url;
///
/// assert_eq!(parse_server_url("host:abc"), None);
/// assert_eq!(parse_server_url("host:0"), None);
/// ```
pub fn parse_server_url(url: &str) -> Option<(String, u16)> {
    match url.split_once(':') {
        Some((host, port)) => {
            let port: u16 = port.parse().ok()?;
            if port == 0 {
                return None;
            }
            Some((host.to_string(), port))
        }
        None => Some((url.to_string(), DEFAULT_PORT)),
    }
}

/// A connectable server, normalized from one [`RawEntry`].
#[derive(Clone, PartialEq, Eq)]
pub struct ServerRecord {
    pub title: String,
    pub username: String,
    pub password: String,
    /// The URL field exactly as stored.
    pub url: String,
    pub hostname: String,
    pub port: u16,
    /// The entry's notes; may be empty.
    pub description: String,
}

impl ServerRecord {
    /// Build a record from a database entry.
    ///
    /// # Errors
    ///
    /// - [`KeepassSshError::InvalidUrl`] if the URL carries a bad port
    /// - [`KeepassSshError::OptionLikeField`] if the username or hostname
    ///   starts with `-`
    pub fn from_entry(entry: &RawEntry) -> Result<Self> {
        let (hostname, port) =
            parse_server_url(entry.url()).ok_or_else(|| KeepassSshError::InvalidUrl {
                title: entry.title().to_string(),
                url: entry.url().to_string(),
            })?;

        for (field, value) in [("username", entry.username()), ("hostname", hostname.as_str())] {
            if value.starts_with('-') {
                return Err(KeepassSshError::OptionLikeField {
                    title: entry.title().to_string(),
                    field,
                });
            }
        }

        Ok(Self {
            title: entry.title().to_string(),
            username: entry.username().to_string(),
            password: entry.password().to_string(),
            url: entry.url().to_string(),
            hostname,
            port,
            description: entry.notes().to_string(),
        })
    }

    /// `user@host`, the destination argument for the remote-shell client.
    pub fn destination(&self) -> String {
        format!("{}@{}", self.username, self.hostname)
    }

    /// `user@host:port`, as shown in listings.
    pub fn connection_string(&self) -> String {
        format!("{}:{}", self.destination(), self.port)
    }
}

impl std::fmt::Debug for ServerRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerRecord")
            .field("title", &self.title)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("url", &self.url)
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("description", &self.description)
            .finish()
    }
}
