use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::{io, time::Duration};
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

mod app;
mod cli;
mod ui;

use app::App;
use cli::Cli;
use sshm::config::{AppConfig, ConfigManager};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_manager = ConfigManager::new()?;
    init_logging(&config_manager.logs_dir())?;

    let config = config_manager
        .load_config()
        .context("Failed to load settings")?;
    debug!("Settings loaded from {:?}", config_manager.config_path());

    if let Some(command) = &cli.command {
        return cli::run(&cli, command, &config_manager, &config);
    }

    let ssh_config = cli.root_config(&config);
    run_tui(config, ssh_config).await
}

fn init_logging(log_dir: &Path) -> Result<()> {
    if !log_dir.exists() {
        std::fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    let log_file = log_dir.join(format!("sshm_{}.log", Local::now().format("%Y%m%d_%H%M%S")));
    let file = File::create(&log_file).context("Failed to create log file")?;

    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("sshm=debug".parse()?))
        .with_ansi(false)
        .with_writer(file)
        .init();

    Ok(())
}

async fn run_tui(config: AppConfig, ssh_config: PathBuf) -> Result<()> {
    let app = App::new(config, ssh_config);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!("Application error: {:#}", err);
        eprintln!("Error: {:#}", err);
    }

    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw::<B>(f, &mut app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                // Key handler failures are shown, not fatal
                if let Err(e) = app.handle_key(key, terminal) {
                    tracing::error!("{:#}", e);
                    app.set_status(format!("Error: {:#}", e));
                }

                if app.should_quit {
                    return Ok(());
                }
            }
        }
    }
}
