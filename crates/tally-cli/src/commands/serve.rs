//! Server command implementation

use anyhow::Result;
use tally_core::TallyConfig;
use tally_server::ServerConfig;

pub async fn cmd_serve(
    config: TallyConfig,
    host: &str,
    port: u16,
    allowed_origins: Vec<String>,
) -> Result<()> {
    println!("🚀 Starting Tally web server...");
    println!("   Listening: http://{}:{}", host, port);
    if !allowed_origins.is_empty() {
        println!("   CORS origins: {}", allowed_origins.join(", "));
    }
    println!(
        "   Completion timeout: {}s, anomaly threshold: {}",
        config.ai.timeout.as_secs(),
        config.anomaly.threshold
    );

    let server_config = ServerConfig { allowed_origins };
    tally_server::serve(host, port, config, server_config).await
}
