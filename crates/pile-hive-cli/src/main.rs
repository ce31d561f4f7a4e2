mod app;
mod view;

use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
        Event,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use pile_hive_config::Config;
use pile_hive_engine::{AutoSaver, DocumentStore, FileStorage};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{
    env,
    fs::File,
    io::{Stdout, stdout},
    path::{Path, PathBuf},
    process,
    sync::{Arc, Mutex},
    time::Duration,
};

use app::App;

const LOG_FILE: &str = "pile-hive.log";

/// Log to a file inside the storage directory so the terminal UI stays clean
fn init_logging(storage_path: &Path) -> Result<()> {
    std::fs::create_dir_all(storage_path)?;
    let log_path = storage_path.join(LOG_FILE);
    let file = File::options()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn main() -> Result<()> {
    // Storage path from CLI args, falling back to the config file
    let args: Vec<String> = env::args().collect();
    let config_path = Config::config_path();

    let mut config = match Config::load_or_default() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            eprintln!("Fix or remove {}", config_path.display());
            process::exit(1);
        }
    };

    match args.len() {
        1 => {}
        2 => {
            let path = PathBuf::from(&args[1]);
            config.storage_path = Config::expand_path(&path).unwrap_or(path);
        }
        _ => {
            eprintln!("Usage: {} [storage-path]", args[0]);
            process::exit(1);
        }
    }

    init_logging(&config.storage_path)?;
    log::info!("pile-hive starting up with storage {}", config.storage_path.display());

    let storage = match FileStorage::open(&config.storage_path) {
        Ok(storage) => storage,
        Err(e) => {
            eprintln!(
                "Error: Storage path '{}' is invalid: {e}",
                config.storage_path.display()
            );
            process::exit(1);
        }
    };

    let mut store = DocumentStore::new(storage);
    store.load_document(config.document_id.as_deref());
    let store = Arc::new(Mutex::new(store));
    let mut saver = AutoSaver::spawn(store.clone(), config.autosave_interval())?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(store);
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    saver.stop();
    app.store().auto_save();
    log::info!("pile-hive shutting down");

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        let mut layout = None;
        terminal.draw(|f| layout = Some(view::draw(f, app)))?;
        if let Some(layout) = layout {
            app.set_layout(layout);
        }

        // Redraw at least once a second so the save status stays current
        if !event::poll(Duration::from_secs(1))? {
            continue;
        }
        match event::read()? {
            Event::Key(key) => app.on_key(key),
            Event::Mouse(mouse) => app.on_mouse(mouse),
            Event::Paste(text) => app.on_paste(&text),
            _ => {}
        }

        if app.should_quit() {
            return Ok(());
        }
    }
}
