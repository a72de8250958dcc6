use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{error, info};

use hzwatch::data::duration::parse_duration;
use hzwatch::settings::Settings;
use hzwatch::{events, ui, App, ConfigSource, FileSource, RecordSource, StreamSource};

/// Poll interval for live streams, which push records as they arrive.
const STREAM_POLL: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(name = "hzwatch")]
#[command(about = "Validate topic frequencies reported by a recording monitor")]
struct Args {
    /// Rule file(s) with `topics` / `hz_range` entries, loaded in order
    #[arg(short = 'R', long = "rules", value_name = "FILE")]
    rules: Vec<PathBuf>,

    /// Only validate records whose emitter name contains this string
    #[arg(short, long)]
    target: Option<String>,

    /// Read statistics from a dump file, re-read when it changes
    #[arg(short, long, default_value = "statistics.log", conflicts_with = "connect")]
    file: PathBuf,

    /// Connect to a TCP endpoint sending JSON log records (host:port)
    #[arg(short, long)]
    connect: Option<String>,

    /// Settings file (TOML/YAML/JSON)
    #[arg(long, default_value = "hzwatch.toml")]
    config: PathBuf,

    /// Refresh interval for file mode (e.g. "500ms", "1s")
    #[arg(short, long)]
    refresh: Option<String>,

    /// Log results without the terminal UI until interrupted
    #[arg(long)]
    headless: bool,

    /// Validate the file once, write a JSON report and exit
    #[arg(short, long, conflicts_with_all = ["connect", "headless"])]
    export: Option<PathBuf>,

    /// Where logs go while the terminal UI is running
    #[arg(long, default_value = "hzwatch.log")]
    log_file: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let tui = !args.headless && args.export.is_none();
    init_tracing(tui.then_some(args.log_file.as_path()))?;

    let mut settings = Settings::load(Some(&args.config))?;
    if !args.rules.is_empty() {
        settings.rule_files = args.rules.clone();
    }
    if let Some(ref target) = args.target {
        settings.target_node = target.clone();
    }
    let refresh = match args.refresh {
        Some(ref s) => parse_duration(s)?,
        None => settings.refresh_interval()?,
    };
    let rule_sources = settings.rule_sources();

    // Handle export mode (non-interactive)
    if let Some(ref export_path) = args.export {
        return export_to_file(&args.file, export_path, rule_sources, &settings.target_node);
    }

    // A tokio runtime is only needed for TCP; keep it alive for the whole run
    let runtime = tokio::runtime::Runtime::new()?;
    let (source, poll_interval): (Box<dyn RecordSource>, Duration) = match args.connect {
        Some(ref addr) => (connect_tcp(&runtime, addr)?, STREAM_POLL),
        None => (Box::new(FileSource::new(&args.file)), refresh),
    };

    let app = App::new(source, rule_sources, settings.target_node);

    if args.headless {
        run_headless(&runtime, app, poll_interval)
    } else {
        run_tui(app.with_detected_theme(), poll_interval)
    }
}

/// Initialize tracing, to a file while the terminal UI owns the screen
fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hzwatch=info"));

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Arc::new(file)),
                )
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
                .init();
        }
    }
    Ok(())
}

/// Connect to a TCP endpoint and wrap it as a record source
fn connect_tcp(runtime: &tokio::runtime::Runtime, addr: &str) -> Result<Box<dyn RecordSource>> {
    runtime.block_on(async {
        use tokio::net::TcpStream;

        info!("Connecting to {}...", addr);
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                info!("Connected to {}", addr);
                Ok(Box::new(StreamSource::spawn(stream, addr)) as Box<dyn RecordSource>)
            }
            Err(e) => Err(anyhow::anyhow!("Failed to connect to {}: {}", addr, e)),
        }
    })
}

/// Poll and log results until Ctrl-C
fn run_headless(runtime: &tokio::runtime::Runtime, mut app: App, interval: Duration) -> Result<()> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    runtime.spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            flag.store(true, Ordering::SeqCst);
        }
    });

    info!("Watching {} (Ctrl-C to stop)", app.source_description());
    let mut last_error: Option<String> = None;

    while !shutdown.load(Ordering::SeqCst) {
        app.process_pending();

        // Report each distinct source error once
        if app.load_error != last_error {
            if let Some(ref err) = app.load_error {
                error!("{}: {}", app.source_description(), err);
            }
            last_error = app.load_error.clone();
        }

        std::thread::sleep(interval);
    }

    info!(
        "Stopping after {} records, {} topics failing",
        app.records_processed,
        app.watch.len()
    );
    Ok(())
}

/// Run the TUI until the user quits
fn run_tui(mut app: App, refresh_interval: Duration) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic);
    }));

    app.process_pending();

    let result = run_app(&mut terminal, &mut app, refresh_interval);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    refresh_interval: Duration,
) -> Result<()> {
    let mut last_refresh = Instant::now();

    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 12;

    while app.running {
        terminal.draw(|frame| {
            let area = frame.area();

            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                let centered = ratatui::layout::Rect::new(
                    0,
                    (area.height / 2).saturating_sub(2),
                    area.width,
                    5.min(area.height),
                );
                frame.render_widget(paragraph, centered);
                return;
            }

            ui::draw(frame, app);
        })?;

        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => events::handle_mouse_event(app, mouse),
                _ => {}
            }
        }

        if last_refresh.elapsed() >= refresh_interval {
            app.process_pending();
            last_refresh = Instant::now();
        }
    }

    Ok(())
}

/// Validate the dump file once and write a JSON report
fn export_to_file(
    record_path: &Path,
    export_path: &Path,
    rule_sources: Vec<ConfigSource>,
    target_node: &str,
) -> Result<()> {
    let source = FileSource::new(record_path);
    let mut app = App::new(Box::new(source), rule_sources, target_node);

    if app.process_pending() == 0 {
        if let Some(err) = app.load_error {
            anyhow::bail!("{}: {}", record_path.display(), err);
        }
        anyhow::bail!("No topic statistics found in {}", record_path.display());
    }

    app.export_state(export_path)?;

    let summary = app.summary();
    println!(
        "Exported {} results ({} ok, {} ng, {} not found) to: {}",
        summary.total,
        summary.ok,
        summary.ng,
        summary.not_found,
        export_path.display()
    );
    Ok(())
}
