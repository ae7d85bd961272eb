use anyhow::{Context, Result, bail};
use crossterm::event;
use pipelog_bridge::{ALLOW_SIGNALS_ENV, BridgeDesc, IngestBridge, stdin_is_interactive};
use pipelog_framework::{AppDesc, MultiFileProvider, start_with_desc};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    crossterm::{
        execute,
        style::{Color, ResetColor, SetBackgroundColor},
        terminal::{
            Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
            enable_raw_mode,
        },
    },
};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::{
    env,
    ffi::OsString,
    fs::{self, OpenOptions},
    io, panic,
    path::PathBuf,
    time::Duration,
};

fn print_usage() {
    eprintln!("Usage: pipelog [OPTIONS] [FILE]...");
    eprintln!("       <command> | pipelog [OPTIONS]");
    eprintln!();
    eprintln!("Follow log files, or the output piped into pipelog, in an interactive");
    eprintln!("viewer. JSON lines are pretty-printed in the line panel.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --debug                 Write debug-level entries to the log file");
    eprintln!("  --version, -V           Print version information");
    eprintln!("  --help, -h              Print this help message");
}

#[derive(Debug, PartialEq)]
enum UsageOptions {
    Help,
    Version,
    Run { files: Vec<PathBuf>, debug: bool },
}

impl UsageOptions {
    fn from_args(args: &[OsString]) -> Result<Self> {
        let mut files = Vec::new();
        let mut debug = false;
        let mut only_files = false;

        for arg in args {
            if only_files {
                files.push(PathBuf::from(arg));
                continue;
            }
            match arg.to_str() {
                Some("--help" | "-h") => return Ok(Self::Help),
                Some("--version" | "-V") => return Ok(Self::Version),
                Some("--debug") => debug = true,
                Some("--") => only_files = true,
                Some(flag) if flag.starts_with('-') && flag != "-" => {
                    print_usage();
                    bail!("Unknown option: {}", flag);
                }
                _ => files.push(PathBuf::from(arg)),
            }
        }

        Ok(Self::Run { files, debug })
    }
}

fn main() -> Result<()> {
    // Collect args excluding the binary name
    let args: Vec<OsString> = env::args_os().skip(1).collect();
    let (files, debug) = match UsageOptions::from_args(&args)? {
        UsageOptions::Help => {
            print_usage();
            return Ok(());
        }
        UsageOptions::Version => {
            println!("pipelog {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        UsageOptions::Run { files, debug } => (files, debug),
    };

    init_logging(debug);
    log::info!(
        "pipelog {} started, pid {}",
        env!("CARGO_PKG_VERSION"),
        std::process::id()
    );

    if !stdin_is_interactive() {
        if !files.is_empty() {
            log::warn!(
                "Ignoring {} file argument(s) while reading piped input",
                files.len()
            );
        }
        return run_bridge(debug);
    }

    if files.is_empty() {
        print_usage();
        return Ok(());
    }

    let under_bridge = env::var_os(ALLOW_SIGNALS_ENV).is_some_and(|v| v == "1");
    run_viewer(files, under_bridge)
}

fn run_bridge(debug: bool) -> Result<()> {
    let exe = env::current_exe().context("Failed to locate the pipelog executable")?;
    let mut desc = BridgeDesc::new(exe);
    if debug {
        desc.viewer_args.push("--debug".into());
    }

    let report = IngestBridge::new(desc)
        .run()
        .context("Failed to relay piped input")?;
    log::info!(
        "Bridge finished: {:?}, {} bytes relayed, viewer {}",
        report.outcome,
        report.bytes_relayed,
        report.viewer_status
    );
    Ok(())
}

fn run_viewer(files: Vec<PathBuf>, under_bridge: bool) -> Result<()> {
    for file in &files {
        if !file.is_file() {
            bail!("No such file: {}", file.display());
        }
    }

    let mut desc = AppDesc::new();
    desc.allow_signals = under_bridge;
    desc.title = if under_bridge {
        "stdin".to_string()
    } else {
        files
            .iter()
            .map(|f| f.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut terminal = setup_terminal()?;

    // Ensure we restore the terminal on panic
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));

    let app_result = start_with_desc(&mut terminal, MultiFileProvider::new(files), desc);

    // Always restore terminal before printing or exiting
    restore_terminal()?;

    app_result
}

/// Log to `<cache dir>/pipelog/pipelog.log`; the terminal belongs to the viewer.
///
/// Logging is skipped when the file cannot be opened.
fn init_logging(debug: bool) {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let Some(dir) = dirs::cache_dir().map(|d| d.join("pipelog")) else {
        return;
    };
    if fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("pipelog.log"))
    else {
        return;
    };

    let config = ConfigBuilder::new().set_time_format_rfc3339().build();
    let _ = WriteLogger::init(level, config, file);
}

fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    // enter the alternate screen to not mess with the user's shell history
    execute!(stdout, EnterAlternateScreen)?;
    execute!(
        stdout,
        SetBackgroundColor(Color::Reset),
        Clear(ClearType::All)
    )?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

fn restore_terminal() -> io::Result<()> {
    let mut stdout = io::stdout();

    // Best-effort cleanup; ignore errors during teardown where sensible
    let _ = execute!(stdout, ResetColor);
    let _ = execute!(stdout, LeaveAlternateScreen);

    // Drain pending events so they don't leak to the shell
    while event::poll(Duration::from_millis(0)).unwrap_or(false) {
        let _ = event::read();
    }

    let _ = disable_raw_mode();

    Ok(())
}
