//! vtpane - interactive demo of the terminal view
//!
//! Runs the emulator on the host console through a loopback transport:
//! every key press is encoded, "sent", and echoed straight back into the
//! terminal, so cursor keys, colors in replayed files and line editing can be
//! tried without a remote shell.
//!
//! ```text
//! vtpane                         # Interactive loopback session
//! vtpane --replay session.log    # Replay captured output, then go interactive
//! vtpane --replay out.log --dump # Replay and print a text snapshot
//! ```

use std::cell::RefCell;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use vtpane::ui::{CellCanvas, ConsoleSurface, DebugRenderer, KeyPress};
use vtpane::{Config, Terminal};

/// Command line options
#[derive(Debug, Default)]
struct Options {
    /// Explicit config file (instead of ~/.vtpane/config.toml)
    config_path: Option<PathBuf>,
    /// File whose contents are written into the terminal first
    replay: Option<PathBuf>,
    /// Print a text snapshot instead of opening the console
    dump: bool,
}

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

const BANNER: &str = "\x1b[32mvtpane\x1b[0m loopback session. Keys echo back; Ctrl+Q quits.\r\n";

fn print_version() {
    eprintln!("vtpane {}", VERSION);
}

fn print_help() {
    eprintln!("vtpane {} - VT terminal view demo", VERSION);
    eprintln!();
    eprintln!("Usage: vtpane [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --config <PATH>   Load configuration from PATH");
    eprintln!("  -r, --replay <FILE>   Write FILE into the terminal before starting");
    eprintln!("  -d, --dump            Print a text snapshot and exit (needs --replay)");
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Configuration: ~/.vtpane/config.toml");
    eprintln!("Log file:      ~/.vtpane/vtpane.log (RUST_LOG to adjust)");
}

fn parse_args() -> Result<Options, String> {
    let args: Vec<String> = env::args().collect();
    let mut options = Options::default();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "-c" | "--config" => {
                i += 1;
                let path = args.get(i).ok_or("Missing config path")?;
                options.config_path = Some(PathBuf::from(path));
            }
            "-r" | "--replay" => {
                i += 1;
                let path = args.get(i).ok_or("Missing replay file")?;
                options.replay = Some(PathBuf::from(path));
            }
            "-d" | "--dump" => {
                options.dump = true;
            }
            other => {
                return Err(format!("Unknown option: {}", other));
            }
        }
        i += 1;
    }

    if options.dump && options.replay.is_none() {
        return Err("--dump needs --replay <FILE>".to_string());
    }

    Ok(options)
}

/// Log to ~/.vtpane/vtpane.log; the console belongs to the terminal view
fn init_logging() {
    let log_path = env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .map(|home| PathBuf::from(home).join(".vtpane").join("vtpane.log"))
        .unwrap_or_else(|| PathBuf::from("vtpane.log"));

    if let Some(parent) = log_path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(Level::INFO.as_str()));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

fn main() -> anyhow::Result<()> {
    let options = match parse_args() {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    init_logging();
    info!("vtpane {} starting", VERSION);

    let config = match &options.config_path {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };

    let replay = match &options.replay {
        Some(path) => {
            let bytes = fs::read(path)
                .with_context(|| format!("reading replay file {}", path.display()))?;
            Some(String::from_utf8_lossy(&bytes).into_owned())
        }
        None => None,
    };

    if options.dump {
        let mut terminal: Terminal<CellCanvas> = Terminal::new(&config);
        terminal.write(replay.as_deref().unwrap_or_default());
        print!("{}", DebugRenderer::render(terminal.state()));
        return Ok(());
    }

    run_interactive(&config, replay.as_deref())
}

/// Echoes output straight back as if a remote line discipline answered it
struct LoopbackTransport;

impl LoopbackTransport {
    fn respond(&self, sent: &str) -> String {
        let mut reply = String::with_capacity(sent.len());
        for ch in sent.chars() {
            match ch {
                '\r' => reply.push_str("\r\n"),
                '\x7f' => reply.push('\x08'),
                _ => reply.push(ch),
            }
        }
        reply
    }
}

fn run_interactive(config: &Config, replay: Option<&str>) -> anyhow::Result<()> {
    let surface = ConsoleSurface::new()?;
    let mut terminal: Terminal<ConsoleSurface> = Terminal::new(config);

    let outbox = Rc::new(RefCell::new(String::new()));
    let sink = outbox.clone();
    terminal.on_output(move |data| sink.borrow_mut().push_str(data));

    terminal.open(surface)?;
    info!(
        "console grid {}x{}",
        terminal.state().cols(),
        terminal.state().rows()
    );

    if let Some(text) = replay {
        terminal.write(text);
    }
    terminal.write(BANNER);

    let transport = LoopbackTransport;
    let result = run_main_loop(&mut terminal, &outbox, &transport);

    if let Some(mut surface) = terminal.close() {
        surface.cleanup()?;
    }
    result
}

fn run_main_loop(
    terminal: &mut Terminal<ConsoleSurface>,
    outbox: &RefCell<String>,
    transport: &LoopbackTransport,
) -> anyhow::Result<()> {
    loop {
        match event::read()? {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    info!("quit requested");
                    return Ok(());
                }

                terminal.key_down(&KeyPress::from(&key));

                let pending = std::mem::take(&mut *outbox.borrow_mut());
                if !pending.is_empty() {
                    terminal.write(&transport.respond(&pending));
                }
            }
            Event::Resize(cols, rows) => {
                if let Some(surface) = terminal.surface_mut() {
                    surface.resize(cols, rows);
                }
                // The canvas was wiped, so repaint even if the grid kept its size
                if !terminal.fit() {
                    terminal.render();
                }
            }
            _ => {}
        }
    }
}
