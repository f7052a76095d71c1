mod api;
mod app;
mod capture;
mod commands;
mod config;
mod interview;
mod logging;
mod playback;
mod setup;
mod ui;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    app::run().await
}
