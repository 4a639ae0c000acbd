//! SSH session launching.
//!
//! The session is a blocking hand-off to an external client that inherits the
//! terminal. The client depends on the host platform:
//!
//! - Unix: `ssh -p <port> -- <user>@<host>`, which prompts for the password itself
//! - Windows: `plink -ssh -P <port> <user>@<host>`
//!
//! With `embed_password` set, the entry password goes on the command line
//! (`sshpass -p` on Unix, `plink -pw` on Windows). Any local user can read it
//! from the process list, so this is opt-in only.

use crate::error::{KeepassSshError, Result};
use crate::server::ServerRecord;
use std::io::ErrorKind;
use std::process::Command;

/// Host platform family, which decides the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Unix,
    Windows,
}

impl Platform {
    /// The platform this binary runs on.
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }

    fn default_client(&self) -> &'static str {
        match self {
            Platform::Unix => "ssh",
            Platform::Windows => "plink",
        }
    }
}

/// How to invoke the remote-shell client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    pub platform: Platform,
    /// Put the password on the command line when the entry has one.
    pub embed_password: bool,
    /// Replaces `ssh` / `plink`.
    pub client: Option<String>,
}

/// A fully built client invocation.
#[derive(Clone, PartialEq, Eq)]
pub struct SshCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Index into `args` holding the password, if embedded.
    secret_arg: Option<usize>,
}

impl SshCommand {
    /// The command line with any embedded password masked.
    pub fn display_redacted(&self) -> String {
        let mut parts = vec![self.program.clone()];
        for (i, arg) in self.args.iter().enumerate() {
            if Some(i) == self.secret_arg {
                parts.push("********".to_string());
            } else {
                parts.push(arg.clone());
            }
        }
        parts.join(" ")
    }

    /// Whether the password is part of the argument list.
    pub fn embeds_secret(&self) -> bool {
        self.secret_arg.is_some()
    }
}

impl std::fmt::Debug for SshCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display_redacted())
    }
}

/// Build the client invocation for `server`.
pub fn build_command(server: &ServerRecord, options: &LaunchOptions) -> SshCommand {
    let client = options
        .client
        .clone()
        .unwrap_or_else(|| options.platform.default_client().to_string());
    let embed = options.embed_password && !server.password.is_empty();
    let port = server.port.to_string();
    let destination = server.destination();

    match options.platform {
        Platform::Unix if embed => SshCommand {
            program: "sshpass".to_string(),
            args: vec![
                "-p".to_string(),
                server.password.clone(),
                client,
                "-p".to_string(),
                port,
                "--".to_string(),
                destination,
            ],
            secret_arg: Some(1),
        },
        Platform::Unix => SshCommand {
            program: client,
            args: vec!["-p".to_string(), port, "--".to_string(), destination],
            secret_arg: None,
        },
        Platform::Windows => {
            let mut args = vec!["-ssh".to_string(), "-P".to_string(), port, destination];
            let mut secret_arg = None;
            if embed {
                args.push("-pw".to_string());
                secret_arg = Some(args.len());
                args.push(server.password.clone());
            }
            SshCommand {
                program: client,
                args,
                secret_arg,
            }
        }
    }
}

/// Connect to `server`, blocking until the client exits.
///
/// # Errors
///
/// Returns [`KeepassSshError::Launch`] if the client binary is missing, fails
/// to start, or exits with a non-zero status.
pub fn connect(server: &ServerRecord, options: &LaunchOptions) -> Result<()> {
    let cmd = build_command(server, options);
    if cmd.embeds_secret() {
        tracing::warn!("password is passed on the command line and visible in process listings");
    }
    tracing::info!(command = %cmd.display_redacted(), "starting session");

    let status = Command::new(&cmd.program)
        .args(&cmd.args)
        .status()
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => KeepassSshError::Launch(not_found_message(&cmd)),
            _ => KeepassSshError::Launch(format!("failed to start {}: {}", cmd.program, e)),
        })?;

    tracing::debug!(%status, "session ended");
    if !status.success() {
        return Err(KeepassSshError::Launch(format!(
            "Failed to connect to {}: {} {}",
            server.hostname, cmd.program, status
        )));
    }

    Ok(())
}

fn not_found_message(cmd: &SshCommand) -> String {
    if cmd.embeds_secret() && cmd.program == "sshpass" {
        "sshpass not found. Please install it or turn off `embed_password`".to_string()
    } else {
        format!(
            "{} not found. Please install it or set `client` in the config file",
            cmd.program
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(password: &str) -> ServerRecord {
        ServerRecord {
            title: "Test Server".into(),
            username: "test_user".into(),
            password: password.into(),
            url: "test.server.com:2222".into(),
            hostname: "test.server.com".into(),
            port: 2222,
            description: String::new(),
        }
    }

    fn options(platform: Platform, embed_password: bool) -> LaunchOptions {
        LaunchOptions {
            platform,
            embed_password,
            client: None,
        }
    }

    #[test]
    fn test_unix_default_has_no_secret() {
        let cmd = build_command(&server("test_pass"), &options(Platform::Unix, false));
        assert_eq!(cmd.program, "ssh");
        assert_eq!(cmd.args, ["-p", "2222", "--", "test_user@test.server.com"]);
        assert!(!cmd.embeds_secret());
    }

    #[test]
    fn test_unix_embedded_uses_sshpass() {
        let cmd = build_command(&server("test_pass"), &options(Platform::Unix, true));
        assert_eq!(cmd.program, "sshpass");
        assert_eq!(
            cmd.args,
            ["-p", "test_pass", "ssh", "-p", "2222", "--", "test_user@test.server.com"]
        );
        assert_eq!(
            cmd.display_redacted(),
            "sshpass -p ******** ssh -p 2222 -- test_user@test.server.com"
        );
        assert!(!format!("{:?}", cmd).contains("test_pass"));
    }

    #[test]
    fn test_embed_skipped_without_password() {
        let cmd = build_command(&server(""), &options(Platform::Unix, true));
        assert_eq!(cmd.program, "ssh");
        let cmd = build_command(&server(""), &options(Platform::Windows, true));
        assert_eq!(cmd.args, ["-ssh", "-P", "2222", "test_user@test.server.com"]);
    }

    #[test]
    fn test_destination_cannot_be_read_as_option() {
        let hostile = ServerRecord {
            username: "-oProxyCommand=touch /tmp/owned".into(),
            hostname: "host".into(),
            port: 22,
            ..server("pw")
        };
        for embed in [false, true] {
            let cmd = build_command(&hostile, &options(Platform::Unix, embed));
            let dest = cmd.args.len() - 1;
            assert_eq!(cmd.args[dest], "-oProxyCommand=touch /tmp/owned@host");
            assert_eq!(cmd.args[dest - 1], "--");
        }
    }

    #[test]
    fn test_missing_sshpass_message() {
        let cmd = build_command(&server("test_pass"), &options(Platform::Unix, true));
        let message = not_found_message(&cmd);
        assert!(message.starts_with("sshpass not found"));
        assert!(message.contains("embed_password"));

        let cmd = build_command(&server("test_pass"), &options(Platform::Unix, false));
        assert!(not_found_message(&cmd).contains("`client`"));
    }

    #[test]
    fn test_windows_plink() {
        let cmd = build_command(&server("test_pass"), &options(Platform::Windows, false));
        assert_eq!(cmd.program, "plink");
        assert_eq!(cmd.args, ["-ssh", "-P", "2222", "test_user@test.server.com"]);

        let cmd = build_command(&server("test_pass"), &options(Platform::Windows, true));
        assert_eq!(
            cmd.args,
            ["-ssh", "-P", "2222", "test_user@test.server.com", "-pw", "test_pass"]
        );
        assert!(cmd.display_redacted().ends_with("-pw ********"));
    }

    #[test]
    fn test_client_override() {
        let opts = LaunchOptions {
            client: Some("/usr/local/bin/ssh".into()),
            ..options(Platform::Unix, false)
        };
        let cmd = build_command(&server("x"), &opts);
        assert_eq!(cmd.program, "/usr/local/bin/ssh");
    }

    #[test]
    fn test_missing_client_is_launch_error() {
        let opts = LaunchOptions {
            client: Some("keepass-ssh-test-no-such-client".into()),
            ..options(Platform::current(), false)
        };
        let err = connect(&server(""), &opts).unwrap_err();
        assert!(matches!(err, KeepassSshError::Launch(ref m) if m.contains("not found")));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_is_launch_error() {
        let opts = LaunchOptions {
            client: Some("false".into()),
            ..options(Platform::Unix, false)
        };
        let err = connect(&server(""), &opts).unwrap_err();
        assert!(matches!(err, KeepassSshError::Launch(_)));
    }
}
