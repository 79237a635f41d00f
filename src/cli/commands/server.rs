use clap::Subcommand;
use serde_json::{json, Value};

use crate::cli::{utils, OutputFormat};

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Check server health status from the API /health endpoint")]
    Health {
        #[arg(long, default_value = "http://localhost:3000", help = "Server base URL")]
        url: String,
    },
}

pub async fn handle(cmd: ServerCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ServerCommands::Health { url } => {
            let endpoint = url::Url::parse(&url)?.join("/health")?;
            let response = reqwest::Client::new()
                .get(endpoint.clone())
                .timeout(std::time::Duration::from_secs(10))
                .send()
                .await?;

            let status = response.status();
            let body: Value = response.json().await.unwrap_or(Value::Null);

            if status.is_success() {
                utils::output_success(
                    output_format,
                    &format!("{} is healthy", url),
                    Some(json!({ "url": endpoint.as_str(), "health": body["data"] })),
                )
            } else {
                utils::output_error(
                    output_format,
                    &format!("{} answered {}", url, status),
                    Some("SERVICE_UNAVAILABLE"),
                )
            }
        }
    }
}
