//! # WebBoot Console Entry Point
//!
//! Terminal operator console for the WebBoot Companion. The companion is a
//! small local service that owns the USB devices; this console connects to it
//! over a WebSocket, lists the devices it reports, and asks it to write an ISO
//! image to one of them (or restore one to a plain drive) while showing
//! progress.
//!
//! ## Usage
//!
//! ```bash
//! # Connect to the companion on its default port
//! webboot
//!
//! # Use another endpoint
//! webboot --endpoint ws://127.0.0.1:9000
//!
//! # Print the device list and exit
//! webboot --list --timeout 3
//! ```
//!
//! ## Key Bindings
//!
//! - `j` / `k` / arrows - select device (or form field when the form has focus)
//! - `Tab` - switch focus between the device list and the job form
//! - `i` - type the ISO image path
//! - `f` / `s` - cycle filesystem / partition scheme
//! - `c` / `r` - create bootable USB / restore USB (asks for confirmation)
//! - `R` - reconnect
//! - `?` - help
//! - `q` - quit
//!
//! Logs go to `webboot.log` in the platform data directory; set `RUST_LOG`
//! to change the level.

use webboot::probe::LsblkProbe;
use webboot::runtime::{self, RuntimeChannels, TokioVerificationSpawner, WebSocketConnector};
use webboot::session::{format_size, ConnectionState, Console, Device, JobForm};
use webboot::ui::config::Config;
use webboot::ui::theme::Theme;
use webboot::ui::{self, App};

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::panic;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// How long the UI loop waits for a key before redrawing.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Trait for reading terminal events (allows dependency injection for testing)
trait EventReader {
    fn read_event(&mut self, timeout: Duration) -> Result<Option<Event>>;
}

/// Production event reader that uses crossterm's event polling + read
struct CrosstermEventReader;

impl EventReader for CrosstermEventReader {
    fn read_event(&mut self, timeout: Duration) -> Result<Option<Event>> {
        if event::poll(timeout).context("Failed to poll for events")? {
            Ok(Some(
                event::read().context("Failed to read keyboard event")?,
            ))
        } else {
            Ok(None)
        }
    }
}

/// WebBoot - prepare bootable USB drives through the WebBoot Companion
#[derive(Parser, Debug)]
#[command(name = "webboot")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Terminal console for the WebBoot Companion", long_about = None)]
struct Args {
    /// Companion WebSocket URL (overrides the config file)
    #[arg(short, long, value_name = "URL")]
    endpoint: Option<String>,

    /// Read settings from this file instead of the default location
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Connect, print the device list reported by the companion and exit
    #[arg(long)]
    list: bool,

    /// Seconds to wait for the device list in --list mode
    #[arg(long, value_name = "SECS", default_value_t = 5)]
    timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Err(err) = init_file_logging() {
        eprintln!("Warning: file logging disabled: {:#}", err);
    }

    // Set up panic hook to ensure terminal is restored on panic
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_application(args).await;

    let _ = panic::take_hook();

    result
}

/// Send `tracing` output to `<data dir>/webboot.log`; stdout belongs to the TUI.
fn init_file_logging() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "webboot")
        .context("Could not determine data directory")?;
    let log_dir = dirs.data_dir();
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let log_path = log_dir.join("webboot.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file: {}", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(log_file))
        .init();

    Ok(log_path)
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Ok(Config::load()),
    }
}

/// Wire the console to the real WebSocket transport and device probe.
fn build_console(config: &Config, endpoint: &str) -> (Console, RuntimeChannels) {
    let (senders, channels) = runtime::channels();
    let connector = WebSocketConnector::new(endpoint, senders.links);
    let spawner = TokioVerificationSpawner::new(
        Arc::new(LsblkProbe::new()),
        config.verify_timeout(),
        senders.verifications,
    );
    let console = Console::new(config.job_form(), Box::new(connector), Box::new(spawner));
    (console, channels)
}

async fn run_application(args: Args) -> Result<()> {
    let config = load_config(args.config.as_ref())?;
    let endpoint = config.resolve_endpoint(args.endpoint.as_deref())?;
    info!(%endpoint, list = args.list, "starting webboot console");

    let (mut console, mut channels) = build_console(&config, &endpoint);
    console.connect();

    if args.list {
        let devices = wait_for_devices(
            &mut console,
            &mut channels,
            Duration::from_secs(args.timeout),
        )
        .await;
        console.shutdown();
        print_devices(&devices?);
        return Ok(());
    }

    let theme = Theme::resolve(&config.theme).clone();
    let mut app = App::new(console, endpoint, theme);

    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let mut event_reader = CrosstermEventReader;
    let run_result = run_app(&mut terminal, &mut app, &mut channels, &mut event_reader);

    app.console.shutdown();
    let cleanup_result = cleanup_terminal(&mut terminal);
    save_form_defaults(config, args.config.as_ref(), app.console.form());

    run_result?;
    cleanup_result?;

    Ok(())
}

/// Persist the filesystem and scheme the operator last used so the next
/// session starts with them.
fn save_form_defaults(mut config: Config, path: Option<&PathBuf>, form: &JobForm) {
    if !config.remember_form(form) {
        return;
    }
    let result = match path {
        Some(path) => config.save_to(path),
        None => config.save(),
    };
    match result {
        Ok(()) => info!(
            filesystem = %form.filesystem,
            scheme = %form.scheme,
            "saved job form defaults"
        ),
        Err(err) => warn!(error = %err, "failed to save job form defaults"),
    }
}

/// Pump events until the first device snapshot arrives, the link fails, or
/// `timeout` passes.
async fn wait_for_devices(
    console: &mut Console,
    channels: &mut RuntimeChannels,
    timeout: Duration,
) -> Result<Vec<Device>> {
    let wait = async {
        loop {
            if console.catalog().snapshots() > 0 {
                return Ok(console.devices().to_vec());
            }
            if matches!(
                console.connection_state(),
                ConnectionState::Errored | ConnectionState::Closed
            ) {
                bail!("{}", console.status());
            }
            if !runtime::process_next(console, channels).await {
                bail!("Companion link ended unexpectedly");
            }
        }
    };

    tokio::time::timeout(timeout, wait).await.map_err(|_| {
        anyhow!(
            "Timed out after {}s waiting for the companion to report devices",
            timeout.as_secs()
        )
    })?
}

fn print_devices(devices: &[Device]) {
    if devices.is_empty() {
        println!("No USB devices detected");
        return;
    }
    for device in devices {
        let size = device.size.map(format_size).unwrap_or_else(|| "-".to_string());
        let mounted = if device.is_mounted() { "  (mounted)" } else { "" };
        println!("{}\t{}\t{}{}", device.id, device.name, size, mounted);
    }
}

/// Apply one terminal event to the app.
fn process_event(app: &mut App, event: Event) {
    if let Event::Key(key) = event {
        if key.kind == KeyEventKind::Press {
            app.handle_key(key);
        }
    }
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    channels: &mut RuntimeChannels,
    event_reader: &mut dyn EventReader,
) -> Result<()> {
    while !app.should_quit {
        runtime::drain_pending(&mut app.console, channels);

        terminal
            .draw(|f| ui::render(f, app))
            .context("Failed to draw terminal UI")?;

        if let Some(event) = event_reader.read_event(POLL_INTERVAL)? {
            process_event(app, event);
        }
    }
    Ok(())
}

/// Clean up terminal state
fn cleanup_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;

    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to restore terminal")?;

    terminal.show_cursor().context("Failed to show cursor")?;

    Ok(())
}
