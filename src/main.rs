use anyhow::Result;

mod app;
mod client;
mod command;
mod config;
mod handler;
mod tui;
mod ui;

use app::App;
use client::AgentClient;
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    tui::install_panic_hook();

    let config = Config::load().unwrap_or_else(|_| Config::new());
    let client = AgentClient::new(config.endpoint());
    let mut app = App::new(client);

    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    let result = run(&mut terminal, &mut events, &mut app).await;

    tui::restore()?;
    result
}

async fn run(
    terminal: &mut tui::Tui,
    events: &mut tui::EventHandler,
    app: &mut App,
) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }
    Ok(())
}
