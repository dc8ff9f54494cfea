use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, time::Duration};
use tokio::sync::mpsc;

use bucket_scout::app::App;
use bucket_scout::async_task::{self, Task, TaskResult};
use bucket_scout::cli::{Cli, Commands};
use bucket_scout::config::Config;
use bucket_scout::error::Result;
use bucket_scout::focus_store::FileFocusStore;
use bucket_scout::remote::MemoryStore;
use bucket_scout::{escape, event, main_lib, ui};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger only if BUCKET_SCOUT_LOG environment variable is set
    if let Ok(log_file) = std::env::var("BUCKET_SCOUT_LOG") {
        env_logger::Builder::new()
            .target(env_logger::Target::Pipe(Box::new(
                std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&log_file)
                    .map_err(|e| format!("Failed to open log file: {}", e))?,
            )))
            .filter_level(log::LevelFilter::Debug)
            .init();

        log::info!("Bucket Scout starting up");
    }

    let cli = Cli::parse();
    let store = MemoryStore::with_demo_data();

    match cli.command.unwrap_or(Commands::Run {
        bucket: None,
        prefix: String::new(),
    }) {
        Commands::Run { bucket, prefix } => run_interactive(store, bucket, prefix).await,
        Commands::Dump {
            bucket,
            prefix,
            output,
        } => main_lib::run_dump(&store, &bucket, &prefix, output.as_deref()).await,
    }
}

async fn run_interactive(store: MemoryStore, bucket: Option<String>, prefix: String) -> Result<()> {
    // Initialize application state
    let focus_store = FileFocusStore::new(
        std::env::temp_dir().join("bucket-scout-focus.json"),
    );
    let mut app = App::new(Config::load(), Box::new(focus_store), bucket.clone());
    app.prefix = prefix;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup async task channels
    let (task_sender, task_receiver) = mpsc::channel::<Task>(32);
    let (result_sender, mut result_receiver) = mpsc::unbounded_channel::<TaskResult>();

    // Start background worker
    let worker_handle = tokio::spawn(async_task::run_worker(task_receiver, result_sender, store));

    // Load initial data
    if let Err(e) = task_sender.send(Task::LoadBuckets).await {
        app.status_message = format!("Failed to load buckets: {}", e);
    }
    if bucket.is_some() {
        app.start_listing(&task_sender, false);
    }

    // Main application loop
    let tick_rate = Duration::from_millis(250);
    loop {
        // Handle forced screen redraw
        if app.force_redraw {
            terminal.clear()?;
            app.force_redraw = false;
        }

        // Draw UI
        terminal.draw(|f| ui::draw(f, &app))?;

        // Handle events with timeout
        if crossterm::event::poll(tick_rate)? {
            let event = crossterm::event::read()?;
            if let Err(e) = event::handle_event(event, &mut app, &task_sender) {
                app.status_message = format!("Error handling event: {}", e);
            }
        }

        // Handle async task results
        while let Ok(result) = result_receiver.try_recv() {
            main_lib::handle_task_result(&mut app, result);
        }

        // Check if we should quit
        if app.should_quit {
            break;
        }
    }

    // Cleanup
    worker_handle.abort();
    escape::clear();

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    Ok(())
}
