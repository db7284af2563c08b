//! dockview - Main entry point.
//!
//! A terminal explorer for Docker images, containers, and registries.
//!
//! Usage: dockview [OPTIONS]
//!
//! Options:
//!   --version, -v      Show version
//!   --config <path>    Read configuration from <path> instead of ~/.dockviewrc
//!   --no-azure         Do not list Azure subscriptions

use std::env;
use std::io;
use std::panic;
use std::path::PathBuf;
use std::sync::Arc;

use crossterm::{
    event::{Event, EventStream},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;
use tokio_stream::StreamExt;

use dockview::app::{App, ChannelLoginPrompt};
use dockview::azure::{AcrClient, ArmClient, AzureAccount, AzureCliAccount, AzureEnvironment};
use dockview::config::Config;
use dockview::credentials::{CredentialStore, FileCredentialStore};
use dockview::docker::BollardDaemon;
use dockview::explorer::{AutoRefresh, Collaborators, ExplorerProvider};
use dockview::hub::HubClient;
use dockview::{VERSION, logging};

/// Parsed command-line options.
#[derive(Debug, Default)]
struct CliOptions {
    config_path: Option<PathBuf>,
    no_azure: bool,
}

fn parse_args(args: &[String]) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();
    let mut iter = args.iter().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().ok_or("--config requires a path")?;
                options.config_path = Some(PathBuf::from(path));
            }
            "--no-azure" => options.no_azure = true,
            other => return Err(format!("Unknown argument: {}", other)),
        }
    }

    Ok(options)
}

fn build_collaborators(
    config: &Config,
    no_azure: bool,
    prompt: ChannelLoginPrompt,
) -> Result<Collaborators, Box<dyn std::error::Error>> {
    let timeout = config.http_timeout();

    let store = match &config.credentials_path {
        Some(path) => FileCredentialStore::with_path(path.clone()),
        None => FileCredentialStore::new(),
    };
    let credentials: Arc<dyn CredentialStore> = Arc::new(store);

    let azure: Option<Arc<dyn AzureAccount>> = if config.azure_enabled && !no_azure {
        Some(Arc::new(AzureCliAccount::new(AzureEnvironment::public_cloud())))
    } else {
        None
    };

    Ok(Collaborators {
        daemon: Arc::new(BollardDaemon::connect_local()?),
        hub: Arc::new(HubClient::new(&config.docker_hub_url, timeout)),
        credentials: Some(credentials),
        prompt: Arc::new(prompt),
        azure,
        management: Arc::new(ArmClient::new(timeout)),
        registry: Arc::new(AcrClient::new(timeout)),
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--version" || a == "-v") {
        println!("dockview v{}", VERSION);
        return Ok(());
    }

    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{}", message);
            eprintln!("Usage: dockview [--version] [--config <path>] [--no-azure]");
            std::process::exit(2);
        }
    };

    let config = match &options.config_path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .unwrap_or_default();

    // Keep the guard alive so buffered log lines are flushed on exit
    let _log_guard = match logging::init(&config.log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Logging disabled: {}", e);
            None
        }
    };
    tracing::info!("dockview v{} starting", VERSION);

    let (app_tx, mut app_rx) = mpsc::unbounded_channel();
    let deps = build_collaborators(&config, options.no_azure, ChannelLoginPrompt::new(app_tx.clone()))?;
    let (provider, mut tree_rx) = ExplorerProvider::new(deps);
    let provider = Arc::new(provider);
    let auto_refresh = AutoRefresh::start(Arc::clone(&provider), config.refresh_interval_ms);

    // Set up panic hook to restore terminal on panic
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(provider, app_tx, auto_refresh);
    app.load_roots();

    let mut events = EventStream::new();
    while app.is_running() {
        terminal.draw(|frame| app.render(frame))?;

        tokio::select! {
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) => app.handle_key(key),
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::error!("Terminal event error: {}", e);
                    app.quit();
                }
                None => app.quit(),
            },
            Some(message) = app_rx.recv() => app.handle_message(message),
            Some(event) = tree_rx.recv() => app.handle_tree_event(event),
        }
    }

    restore_terminal()?;
    tracing::info!("dockview exiting");
    Ok(())
}

/// Restores the terminal to its original state.
fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("dockview")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parse_args() {
        let options = parse_args(&args(&["--config", "/tmp/rc", "--no-azure"])).unwrap();
        assert_eq!(options.config_path, Some(PathBuf::from("/tmp/rc")));
        assert!(options.no_azure);
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(parse_args(&args(&["--config"])).is_err());
        assert!(parse_args(&args(&["--bogus"])).is_err());
    }
}
