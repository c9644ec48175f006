mod app;
mod config;
mod credentials;
mod render;
mod sheets;
mod theme;

use anyhow::Context;
use app::App;
use clap::Parser;
use config::{Args, Config};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ledger_quiz_core::QuestionBank;
use sheets::SheetClient;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let config = Config::from_args(Args::parse());
    init_logging(&config.log_file)?;
    info!(
        environment = config.environment.label(),
        sheet = %config.sheet_name,
        questions = %config.questions_path.display(),
        "starting"
    );

    let (bank, bank_warning) = load_bank(&config.questions_path);
    let sheets = SheetClient::new(
        config.environment,
        config.sheet_name.clone(),
        config.credentials.clone(),
        config.local_sheet_path.clone(),
    );
    let mut app = App::new(bank, sheets, config.theme)
        .with_leaderboard_size(config.leaderboard_size)
        .with_invite_url(config.invite_url.clone())
        .with_bank_warning(bank_warning);

    // Setup terminal
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;

    // Run the app
    let result = run_app(&mut stdout, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(stdout, LeaveAlternateScreen)?;

    // Catch a finished attempt that was not rendered before quitting
    app.persist_pending_score();

    if let Err(ref e) = result {
        warn!(error = %e, "terminal loop failed");
    }
    result.context("terminal error")
}

/// Log to a file; the terminal belongs to the game
fn init_logging(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// A missing or broken bank still lets the game start, with no questions
fn load_bank(path: &Path) -> (QuestionBank, Option<String>) {
    match QuestionBank::load(path) {
        Ok(bank) if bank.is_empty() => (
            bank,
            Some(format!("{} contains no usable questions.", path.display())),
        ),
        Ok(bank) => {
            let warning = (!bank.skipped().is_empty()).then(|| {
                format!(
                    "{} question(s) in {} were skipped as invalid.",
                    bank.skipped().len(),
                    path.display()
                )
            });
            (bank, warning)
        }
        Err(e) => {
            warn!(error = %e, "question bank unavailable");
            (
                QuestionBank::empty(),
                Some(format!("Could not load questions: {}", e)),
            )
        }
    }
}

fn run_app(stdout: &mut io::Stdout, app: &mut App) -> io::Result<()> {
    let mut last_tick = Instant::now();

    loop {
        let tick_rate = app.tick_rate();

        // Render
        render::render(stdout, app)?;
        stdout.flush()?;

        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if event::poll(timeout.min(Duration::from_millis(33)))? {
            if let Event::Key(key) = event::read()? {
                // Windows reports releases too
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                // Handle Ctrl+C
                if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                    break;
                }

                match app.handle_key(key) {
                    app::AppAction::Continue => {}
                    app::AppAction::Quit => break,
                }
            }
        }

        // Tick timers and pending saves
        if last_tick.elapsed() >= tick_rate {
            app.tick();
            last_tick = Instant::now();
        }
    }

    Ok(())
}
