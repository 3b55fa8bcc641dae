use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::level_filters::LevelFilter;

use asset_table::app::App;
use asset_table::events;
use asset_table::settings::Settings;
use asset_table::source::{FileSource, RowSource, StreamSource};
use asset_table::table::{ColumnDef, FileStore, Permissions, TableFeatures, TableOptions};
use asset_table::ui::{self, Theme};

#[derive(Parser, Debug)]
#[command(name = "asset-table")]
#[command(about = "Browse, search, and export asset records in the terminal")]
struct Args {
    /// JSON file of records (an array, or an object wrapping one)
    #[arg(short, long, default_value = "assets.json", conflicts_with = "connect")]
    file: PathBuf,

    /// Connect to a TCP endpoint sending newline-delimited row sets (host:port)
    #[arg(short, long, conflicts_with = "file")]
    connect: Option<String>,

    /// JSON file with column definitions; inferred from the first row when absent
    #[arg(long)]
    columns: Option<PathBuf>,

    /// Settings file (TOML, YAML, or JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Key under which the table layout is remembered
    #[arg(short = 'k', long)]
    storage_key: Option<String>,

    /// Rows per page (overrides settings)
    #[arg(long)]
    page_size: Option<usize>,

    /// Offer view and export only
    #[arg(long)]
    read_only: bool,

    /// Export the rows to a CSV or JSON file and exit
    #[arg(short, long, conflicts_with = "connect")]
    export: Option<PathBuf>,

    /// Refresh interval in seconds (only used with --file)
    #[arg(short, long, default_value = "1")]
    refresh: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(page_size) = args.page_size {
        anyhow::ensure!(page_size > 0, "--page-size must be greater than zero");
        settings.page_size = page_size;
    }
    init_logging(&settings)?;

    let options = table_options(&args, &settings);
    let columns = match &args.columns {
        Some(path) => Some(load_columns(path)?),
        None => None,
    };

    let store = match FileStore::open(&settings.state_file) {
        Ok(store) => Some(store),
        Err(e) => {
            tracing::warn!(error = %e, path = %settings.state_file.display(), "layout store unavailable");
            None
        }
    };

    // Handle export mode (non-interactive); a saved layout decides the columns
    if let Some(export_path) = &args.export {
        let app = build_app(Box::new(FileSource::new(&args.file)), options, columns, store);
        return export_to_file(app, export_path);
    }
    let theme = Theme::from_mode(settings.theme);

    // Handle TCP connection mode
    if let Some(addr) = &args.connect {
        return run_with_tcp(addr, options, columns, store, theme);
    }

    let source = Box::new(FileSource::new(&args.file));
    let app = build_app(source, options, columns, store).with_theme(theme);
    run_tui(app, Duration::from_secs(args.refresh))
}

/// Logging goes to a file when one is configured; the terminal belongs to the UI.
fn init_logging(settings: &Settings) -> Result<()> {
    let Some(path) = &settings.log_file else {
        return Ok(());
    };
    let level: LevelFilter = settings
        .log_level
        .parse()
        .with_context(|| format!("invalid log level: {}", settings.log_level))?;
    let file = File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(level)
        .init();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "asset-table starting");
    Ok(())
}

fn table_options(args: &Args, settings: &Settings) -> TableOptions {
    TableOptions {
        permissions: if args.read_only {
            Permissions::read_only()
        } else {
            Permissions::all()
        },
        features: TableFeatures {
            enable_selection: true,
            ..Default::default()
        },
        page_size: settings.page_size,
        empty_message: settings.empty_message.clone(),
        storage_key: args.storage_key.clone(),
        search_debounce: settings.search_debounce(),
        ..Default::default()
    }
}

fn load_columns(path: &Path) -> Result<Vec<ColumnDef>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("cannot read column definitions {}", path.display()))?;
    let defs: Vec<ColumnDef> = serde_json::from_str(&content)
        .with_context(|| format!("invalid column definitions in {}", path.display()))?;
    Ok(defs)
}

fn build_app(
    source: Box<dyn RowSource>,
    options: TableOptions,
    columns: Option<Vec<ColumnDef>>,
    store: Option<FileStore>,
) -> App {
    let mut app = App::new(source, options);
    if let Some(defs) = columns {
        app = app.with_columns(defs);
    }
    if let Some(store) = store {
        app = app.with_store(Box::new(store));
    }
    app
}

/// Run with a TCP stream data source
fn run_with_tcp(
    addr: &str,
    options: TableOptions,
    columns: Option<Vec<ColumnDef>>,
    store: Option<FileStore>,
    theme: Theme,
) -> Result<()> {
    // The runtime must outlive the TUI so the reader task keeps running
    let rt = tokio::runtime::Runtime::new()?;

    let source = rt.block_on(async {
        use tokio::net::TcpStream;

        println!("Connecting to {}...", addr);
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                println!("Connected!");
                Ok(Box::new(StreamSource::spawn(stream, addr)) as Box<dyn RowSource>)
            }
            Err(e) => Err(anyhow::anyhow!("Failed to connect to {}: {}", addr, e)),
        }
    })?;

    let app = build_app(source, options, columns, store).with_theme(theme);
    // For TCP, we poll continuously (no refresh interval needed)
    run_tui(app, Duration::from_millis(100))
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

    app.reload_data();

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

    while app.running {
        terminal.draw(|frame| ui::draw(frame, app))?;

        // Short timeout so debounced searches fire close to their deadline
        if let Some(event) = events::poll_event(Duration::from_millis(50))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => events::handle_mouse_event(app, mouse),
                _ => {}
            }
        }

        app.tick(Instant::now());

        if last_refresh.elapsed() >= refresh_interval {
            app.reload_data();
            last_refresh = Instant::now();
        }
    }

    Ok(())
}

/// Load the rows once and write them to `export_path`
fn export_to_file(mut app: App, export_path: &Path) -> Result<()> {
    app.reload_data();
    if let Some(err) = &app.load_error {
        anyhow::bail!("Failed to load {}: {}", app.source_description(), err);
    }
    app.export_to(export_path)?;
    let rows = app.table.as_ref().map_or(0, |t| t.rows().len());
    println!("Exported {} rows to: {}", rows, export_path.display());
    Ok(())
}
