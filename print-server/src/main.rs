use print_server::{Config, Server, utils};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment (.env is optional)
    dotenv::dotenv().ok();

    // 2. Logging - before config load so config warnings are visible
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into());
    utils::init_logger(&log_level);

    tracing::info!("🖨️  Print bridge starting...");

    // 3. Load configuration
    let config = Config::from_env();

    // 4. Start the HTTP server
    let server = Server::new(config);
    server.run().await?;

    Ok(())
}
