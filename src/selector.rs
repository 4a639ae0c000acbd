//! Server listing and interactive selection.
//!
//! Listings are numbered from 1. A single line of input picks a server;
//! anything that is not a number in range ends the run, there is no retry.

use crate::error::{KeepassSshError, Result};
use crate::server::ServerRecord;
use colored::Colorize;
use std::io::{BufRead, Write};

/// Presentation options for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListStyle {
    pub color: bool,
}

impl Default for ListStyle {
    fn default() -> Self {
        Self { color: true }
    }
}

impl ListStyle {
    fn paint(&self, text: &str, apply: fn(&str) -> colored::ColoredString) -> String {
        if self.color {
            apply(text).to_string()
        } else {
            text.to_string()
        }
    }
}

/// Write the numbered server list.
pub fn list_servers<W: Write>(out: &mut W, servers: &[ServerRecord], style: ListStyle) -> Result<()> {
    for (i, server) in servers.iter().enumerate() {
        writeln!(out, "{}. {}", i + 1, style.paint(&server.title, |s| s.green()))?;
        writeln!(
            out,
            "   URL: {}",
            style.paint(&server.connection_string(), |s| s.blue())
        )?;
        if !server.description.is_empty() {
            writeln!(
                out,
                "   Description: {}",
                style.paint(&server.description, |s| s.yellow())
            )?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Pick a server by its 1-based position in `servers`.
///
/// # Errors
///
/// Returns [`KeepassSshError::InvalidSelection`] for non-numeric or
/// out-of-range input.
pub fn select_server<'a>(servers: &'a [ServerRecord], selection: &str) -> Result<&'a ServerRecord> {
    let trimmed = selection.trim();
    let index: usize = trimmed
        .parse()
        .map_err(|_| KeepassSshError::InvalidSelection(format!("'{}' is not a number", trimmed)))?;

    index
        .checked_sub(1)
        .and_then(|i| servers.get(i))
        .ok_or_else(|| {
            KeepassSshError::InvalidSelection(format!(
                "{} is not between 1 and {}",
                index,
                servers.len()
            ))
        })
}

/// List `servers`, prompt once, and return the chosen record.
///
/// # Errors
///
/// - [`KeepassSshError::Cancelled`] on end of input or an interrupted read
/// - [`KeepassSshError::InvalidSelection`] for a bad choice
pub fn prompt_selection<R, W>(
    input: &mut R,
    out: &mut W,
    servers: &[ServerRecord],
    style: ListStyle,
) -> Result<ServerRecord>
where
    R: BufRead,
    W: Write,
{
    list_servers(out, servers, style)?;
    write!(out, "Select server (enter number): ")?;
    out.flush()?;

    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) => return Err(KeepassSshError::Cancelled),
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {
            return Err(KeepassSshError::Cancelled);
        }
        Err(e) => return Err(e.into()),
    }

    select_server(servers, &line).cloned()
}
