use clap::Parser;
use dos::config::ServerConfig;
use dos::dos_game::api::start_api_server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::parse();
    start_api_server(config).await
}
