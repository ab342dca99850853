//! CLI Status Command
//!
//! Asks a running server for its health endpoint.

use anyhow::Result;
use fetchbot_config::FetchbotConfig;
use std::time::Duration;

pub async fn run(config: &FetchbotConfig) -> Result<()> {
    let host = match config.server.bind() {
        "0.0.0.0" | "::" => "127.0.0.1",
        other => other,
    };
    let url = format!("http://{host}:{}/api/health", config.server.port());

    let client = reqwest::Client::builder().timeout(Duration::from_secs(5)).build()?;
    match client.get(&url).send().await {
        Ok(resp) => {
            let body: serde_json::Value = resp.json().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Err(_) => println!("fetchbot is not running at {url}"),
    }
    Ok(())
}
