//! Interactive shell around [`Printer`]: reads G-code lines from stdin and
//! optionally reloads when the config directory changes.

use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use crossbeam_channel::{never, unbounded, Receiver};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer};

use macro_reload::{ConfigChange, ConfigLoader, Printer, WatcherThread};

/// Live-reloadable G-code macros over a Klipper-style config
#[derive(Parser, Debug)]
#[command(name = "macro-reload")]
#[command(version, about, long_about = None)]
struct Args {
    /// Main config file (defaults to ~/printer_data/config/printer.cfg)
    #[arg(short, long, env = "MACRO_RELOAD_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Reload automatically when a .cfg file under the config directory changes
    #[arg(short, long)]
    watch: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json: bool,
}

fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join("printer_data").join("config").join("printer.cfg"))
}

fn init_logging(args: &Args) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let fmt_layer = if args.json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer().with_writer(std::io::stderr).boxed()
    };
    let subscriber = tracing_subscriber::registry().with(fmt_layer.with_filter(filter));

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install tracing subscriber: {}", e);
        return;
    }
    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("Failed to bridge log records: {}", e);
    }
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = unbounded();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    log::error!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

fn run_and_print(printer: &mut Printer, line: &str) {
    if let Err(e) = printer.run_line(line) {
        println!("!! {}", e);
    }
    for command in printer.take_executed() {
        println!("{}", command);
    }
    for response in printer.take_responses() {
        println!("{}", response);
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args);

    let Some(config_path) = args.config.clone().or_else(default_config_path) else {
        log::error!("No config path given and no home directory found");
        return ExitCode::FAILURE;
    };
    log::info!("Starting macro-reload v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using config {}", config_path.display());

    let loader = ConfigLoader::new(&config_path);
    let config_dir = loader.config_dir();
    let mut printer = match Printer::start(Box::new(loader)) {
        Ok(printer) => printer,
        Err(e) => {
            log::error!("Startup failed: {}", e);
            return ExitCode::FAILURE;
        }
    };
    for line in printer.startup_report().lines() {
        println!("// {}", line.message);
    }

    let (mut watcher, mut changes): (Option<WatcherThread>, Receiver<ConfigChange>) =
        if args.watch {
            let (tx, rx) = unbounded();
            (Some(WatcherThread::spawn(config_dir, tx)), rx)
        } else {
            (None, never())
        };
    let lines = spawn_stdin_reader();

    loop {
        let mut watch_closed = false;
        crossbeam_channel::select! {
            recv(lines) -> line => match line {
                Ok(line) => run_and_print(&mut printer, &line),
                Err(_) => break,
            },
            recv(changes) -> change => match change {
                Ok(change) => {
                    // One reload covers a burst of changes.
                    let skipped = changes.try_iter().count();
                    log::info!(
                        "Config changed: {} (+{} more), reloading",
                        change.path,
                        skipped
                    );
                    run_and_print(&mut printer, "MACRO_RELOAD");
                }
                Err(_) => {
                    log::warn!("Config watcher stopped; continuing without auto-reload");
                    watch_closed = true;
                }
            },
        }
        if watch_closed {
            changes = never();
        }
    }

    if let Some(mut watcher) = watcher.take() {
        watcher.stop();
    }
    ExitCode::SUCCESS
}
