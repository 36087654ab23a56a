mod auth;
mod config;
mod controller;
mod error;
mod logging;
mod model;
mod view;
mod youtube;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use auth::AuthClient;
use config::{Credentials, SIGN_IN_RECHECK_DELAY};
use controller::AppController;
use model::AppModel;
use view::AppView;
use youtube::YoutubeClient;

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = logging::init_logging() {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    tracing::info!("=== TubeList Starting ===");

    let credentials = Credentials::load()?;
    let http = reqwest::Client::builder()
        .user_agent(concat!("tubelist/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let auth = Arc::new(AuthClient::init(
        &credentials.web.client_id,
        credentials.web.client_secret.as_deref(),
        http.clone(),
    ));
    let api = Arc::new(YoutubeClient::load(http, &credentials.api.key, auth.clone()));

    let model = Arc::new(AppModel::new());
    let controller = AppController::new(model.clone(), api, auth.clone());

    // Subscribe before restoring so the first status is not missed
    controller.spawn_session_watcher(auth.listen(), SIGN_IN_RECHECK_DELAY);
    controller.spawn_page_fetcher();

    let auth_for_restore = auth.clone();
    tokio::spawn(async move {
        auth_for_restore.restore_session().await;
    });

    tracing::info!("Starting TUI...");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, model, controller).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = ?err, "Application error");
    }

    tracing::info!("TubeList shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    model: Arc<AppModel>,
    controller: AppController,
) -> io::Result<()> {
    loop {
        // Auto-clear old errors (after 5 seconds)
        model.auto_clear_old_errors().await;

        let state = model.get_view_state().await;
        let should_quit = model.should_quit().await;

        terminal.draw(|f| {
            AppView::render(f, &state);
        })?;

        // Handle input with shorter poll time for smoother UI updates
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if let Err(e) = controller.handle_key_event(key).await {
                    tracing::warn!(error = %e, "Key handling failed");
                }
            }
        }

        if should_quit {
            break;
        }
    }

    Ok(())
}
