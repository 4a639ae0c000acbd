//! keepass-ssh CLI entry point.
//!
//! This binary provides the `keepass-ssh` command: resolve server entries
//! from a KeePass database, let the user pick one, and start `ssh`.

use clap::Parser;
use keepass_ssh::cli::Cli;
use keepass_ssh::config::{Settings, PASSWORD_ENV};
use keepass_ssh::error::Result;
use keepass_ssh::selector::{self, ListStyle};
use keepass_ssh::ssh::{self, LaunchOptions, Platform};
use keepass_ssh::{loader, resolver, KeepassSshError, Resolution, Store};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::EnvFilter;

/// Set while the terminal belongs to the remote-shell client.
static SESSION_ACTIVE: AtomicBool = AtomicBool::new(false);

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    install_interrupt_handler();

    if let Err(e) = run(&cli) {
        match e {
            KeepassSshError::Cancelled => eprintln!("\n{}", e),
            _ => eprintln!("Error: {}", e),
        }
        std::process::exit(e.exit_code());
    }
}

/// Ctrl-C at a prompt is a voluntary cancellation and exits 0.
///
/// During the session the client handles its own interrupts, so the signal is
/// ignored here and the client's exit status decides the outcome.
fn install_interrupt_handler() {
    let result = ctrlc::set_handler(|| {
        if SESSION_ACTIVE.load(Ordering::SeqCst) {
            return;
        }
        let cancelled = KeepassSshError::Cancelled;
        eprintln!("\n{}", cancelled);
        std::process::exit(cancelled.exit_code());
    });
    if let Err(e) = result {
        tracing::warn!("could not install Ctrl-C handler: {}", e);
    }
}

/// Log to stderr; `RUST_LOG` wins over `-v`.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Main application logic.
fn run(cli: &Cli) -> Result<()> {
    let file_config = loader::load_config_or_default(cli.config.as_deref())?;
    let settings = Settings::resolve(
        cli,
        &file_config,
        std::env::var(PASSWORD_ENV).ok(),
        loader::discover_database,
    )?;
    tracing::debug!(
        database = %settings.database.display(),
        key_file = ?settings.key_file,
        criterion = %settings.criterion,
        "settings resolved"
    );

    let store = open_store(&settings)?;
    let resolution = resolver::resolve(&store, &settings.criterion)?;
    let style = ListStyle {
        color: settings.color,
    };

    if settings.list_only {
        let mut stdout = std::io::stdout().lock();
        selector::list_servers(&mut stdout, resolution.records(), style)?;
        return Ok(());
    }

    let server = match resolution {
        Resolution::Resolved(server) => server,
        Resolution::Choose(servers) => {
            let mut stdin = std::io::stdin().lock();
            let mut stdout = std::io::stdout().lock();
            selector::prompt_selection(&mut stdin, &mut stdout, &servers, style)?
        }
    };

    let options = LaunchOptions {
        platform: Platform::current(),
        embed_password: settings.embed_password,
        client: settings.client.clone(),
    };
    SESSION_ACTIVE.store(true, Ordering::SeqCst);
    ssh::connect(&server, &options)
}

/// Open the database, asking for the master password when needed.
fn open_store(settings: &Settings) -> Result<Store> {
    let prompted = if settings.prompt_password {
        let prompt = format!("Password for {}: ", settings.database.display());
        match rpassword::prompt_password(prompt) {
            Ok(password) => Some(password),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {
                return Err(KeepassSshError::Cancelled);
            }
            Err(e) => return Err(e.into()),
        }
    } else {
        None
    };

    let password = settings
        .password
        .as_deref()
        .or(prompted.as_deref())
        .filter(|p| !p.is_empty());
    Store::open(&settings.database, settings.key_file.as_deref(), password)
}
