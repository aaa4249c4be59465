use anyhow::Result;
use dotenv::dotenv;
use env_logger::{Env, Target};
use log::info;
use std::fs::OpenOptions;

use room_reviews::api::ReviewClient;
use room_reviews::config::{self, Config};
use room_reviews::room::RoomCatalog;
use room_reviews::ui::ReviewUI;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (ignore errors if file doesn't exist)
    dotenv().ok();

    // The terminal belongs to the UI, so logs go to a file.
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")?;
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(log_file)))
        .init();

    let matches = config::command().get_matches();
    let config = Config::from_args_and_env(&matches)?;
    info!(
        "Starting room-reviews against {} (dev: {})",
        config.base_url, config.dev
    );

    let catalog = match &config.rooms_path {
        Some(path) => RoomCatalog::from_file(path)?,
        None => RoomCatalog::default(),
    };

    let client = ReviewClient::new(&config);
    let mut ui = ReviewUI::new(client, catalog).await?;
    ui.run().await?;

    Ok(())
}
