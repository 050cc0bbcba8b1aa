//! unidir-files - Entry Point
//!
//! Upload store for the university directory back office.

use log::info;
use std::process;

use unidir_files::Server;
use unidir_files::config::AppConfig;
use unidir_files::error::ServerError;
use unidir_files::error::handlers::handle_error;

#[tokio::main]
async fn main() {
    // Initialize the logger (env_logger picks up RUST_LOG, defaulting to info)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Launching upload server...");

    if let Err(e) = run().await {
        handle_error(&e);
        process::exit(1);
    }
}

async fn run() -> Result<(), ServerError> {
    let config = AppConfig::load()?;
    let server = Server::bind(config).await?;
    server.run().await;
    Ok(())
}
