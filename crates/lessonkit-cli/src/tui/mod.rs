//! Interactive terminal studio: fill in the lesson form, pick a template,
//! edit the prompt, generate and export.

pub mod app;
mod ui;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;

use lessonkit_core::generation::{GenerationError, GenerationService};

use app::{Action, App};

type GenerationResult = Result<String, GenerationError>;

/// Launch the studio.
pub async fn run_studio(
    service: Arc<dyn GenerationService>,
    output_dir: PathBuf,
    export_prefix: String,
) -> Result<()> {
    // Set up terminal.
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(service, output_dir, export_prefix);
    tracing::info!(service = app.service.name(), "studio started");

    let result = run_event_loop(&mut terminal, &mut app).await;

    // Restore terminal.
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    let (tx, mut rx) = mpsc::channel::<GenerationResult>(1);

    loop {
        terminal.draw(|f| ui::render(f, app))?;

        // Results from the background request.
        while let Ok(result) = rx.try_recv() {
            app.state.finish_generation(result);
        }

        if event::poll(app.tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Action::Generate(pending) = app.handle_key(key) {
                        spawn_generation(Arc::clone(&app.service), pending.request_text, tx.clone());
                    }
                }
            }
        }

        if app.should_quit {
            if app.is_generating() {
                tracing::info!("quitting with a request in flight; its result is dropped");
            }
            return Ok(());
        }
    }
}

/// Run the request off the event loop and send the outcome back.
fn spawn_generation(
    service: Arc<dyn GenerationService>,
    request_text: String,
    tx: mpsc::Sender<GenerationResult>,
) {
    tokio::spawn(async move {
        let result = service.generate_text(&request_text).await;
        if tx.send(result).await.is_err() {
            tracing::debug!("studio closed before generation finished");
        }
    });
}
