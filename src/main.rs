//! Entry point for the **dynadesk** daemon.
//!
//! Picks a backend, spawns its [`EventSource`] on a background thread and
//! feeds every event to a [`DesktopController`] on the main thread.

use dynadesk::config::{Config, ConfigError};
use dynadesk::controller::DesktopController;
use dynadesk::hyprland::{HyprlandEventSource, HyprlandHost};
use dynadesk::probe::{self, Backend};
use dynadesk::traits::{DesktopHost, EventSource};
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

/// Resolve the config directory (`$XDG_CONFIG_HOME/dynadesk`).
fn config_dir() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    PathBuf::from(base).join("dynadesk")
}

/// Value of `--config <path>` or `--config=<path>`, if given.
fn config_arg(mut args: impl Iterator<Item = String>) -> Option<PathBuf> {
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return Some(PathBuf::from(path));
        }
    }
    None
}

/// Load the config from `explicit` or the default location, falling back
/// to compiled-in defaults.
///
/// Runs before the logger exists, so the outcome is returned for logging
/// later.
fn load_config(explicit: Option<PathBuf>) -> (Config, Result<PathBuf, ConfigError>) {
    let path = explicit.unwrap_or_else(|| config_dir().join("config.json"));
    match Config::load(&path) {
        Ok(cfg) => (cfg, Ok(path)),
        Err(e) => (Config::default(), Err(e)),
    }
}

//  Main

fn main() {
    let (config, loaded) = load_config(config_arg(std::env::args().skip(1)));

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level)).init();

    match loaded {
        Ok(path) => info!("loaded config from {}", path.display()),
        Err(e) => warn!("{}, using defaults", e),
    }

    let backend = match probe::detect_from_env(config.backend) {
        Ok(b) => b,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    info!("using {} backend", backend);

    match backend {
        Backend::Hyprland => run(HyprlandHost::new(), HyprlandEventSource::new(), config),
        Backend::Ewmh => run_ewmh(config),
    }
}

#[cfg(feature = "backend-ewmh")]
fn run_ewmh(config: Config) {
    use dynadesk::ewmh::{EwmhEventSource, EwmhHost};

    let connected = EwmhHost::connect().and_then(|host| Ok((host, EwmhEventSource::connect()?)));
    match connected {
        Ok((host, source)) => run(host, source, config),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(not(feature = "backend-ewmh"))]
fn run_ewmh(_config: Config) {
    error!("the ewmh backend requires the `backend-ewmh` feature");
    std::process::exit(1);
}

//  Event loop

/// Drive `host` from the events of `source` until the source ends.
fn run<H: DesktopHost, S: EventSource + 'static>(host: H, mut source: S, config: Config) {
    let (tx, rx) = mpsc::channel();
    let events = thread::spawn(move || source.run(tx));

    let mut controller = DesktopController::new(host, config.desktops);
    if let Err(e) = controller.start() {
        error!("startup pass failed: {}", e);
    }

    info!("dynadesk running");
    for event in rx {
        if let Err(e) = controller.handle(event) {
            error!("event error: {}", e);
        }
    }

    match events.join() {
        Ok(Ok(())) => info!("event source closed, exiting"),
        Ok(Err(e)) => {
            error!("event source error: {}", e);
            std::process::exit(1);
        }
        Err(_) => {
            error!("event source thread panicked");
            std::process::exit(1);
        }
    }
}
