use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::config::{AppConfig, DatabaseConfig};
use crate::database::DatabaseManager;

/// Print a success message; in JSON mode `data`'s keys are merged in
pub fn output_success(output_format: OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "status": "success",
                "message": message
            });

            if let (Some(Value::Object(extra)), Some(target)) = (data, response.as_object_mut()) {
                target.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

pub fn output_error(output_format: OutputFormat, message: &str, code: Option<&str>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "status": "error",
                "message": message
            });

            if let Some(code) = code {
                response["code"] = json!(code);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// Database settings for commands that talk to the store directly. Only the
/// database section is needed, so a missing JWT secret is not an error here.
pub fn database_config() -> anyhow::Result<DatabaseConfig> {
    let _ = dotenvy::dotenv();
    match AppConfig::from_env() {
        Ok(config) => Ok(config.database),
        Err(_) => {
            let url = std::env::var("DATABASE_URL").map_err(|_| anyhow::anyhow!("DATABASE_URL is not set"))?;
            Ok(DatabaseConfig {
                url,
                max_connections: 2,
                connection_timeout: 10,
                run_migrations: false,
            })
        }
    }
}

pub async fn connect() -> anyhow::Result<sqlx::PgPool> {
    let config = database_config()?;
    Ok(DatabaseManager::connect(&config).await?)
}
