#![allow(dead_code)]

use std::time::Duration;

use anyhow::{Context, Result};
use estate_api::database::models::User;
use estate_api::database::DatabaseManager;
use estate_api::{app, AppConfig, AppState};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::{json, Value};
use sqlx::PgPool;
use tempfile::TempDir;
use uuid::Uuid;

/// One server per test, bound to a free port on the test's own runtime and
/// backed by the database named in `DATABASE_URL`
pub struct TestApp {
    pub base_url: String,
    pub pool: PgPool,
    pub client: reqwest::Client,
    _uploads: TempDir,
}

impl TestApp {
    /// `None` when no database is configured; callers return early
    pub async fn spawn() -> Result<Option<Self>> {
        let _ = dotenvy::dotenv();
        let Ok(database_url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set; skipping");
            return Ok(None);
        };

        let uploads = tempfile::tempdir()?;
        let mut config = AppConfig::for_tests(database_url, uploads.path());
        config.api.enable_request_logging = false;

        let pool = DatabaseManager::connect(&config.database).await?;
        DatabaseManager::migrate(&pool).await?;

        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
        let router = app(AppState::new(pool.clone(), config));
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        let test_app = Self {
            base_url: format!("http://127.0.0.1:{}", port),
            pool,
            client: reqwest::Client::new(),
            _uploads: uploads,
        };
        test_app.wait_ready(Duration::from_secs(10)).await?;
        Ok(Some(test_app))
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Registers a fresh account and returns `(token, user)` from the response
    pub async fn register(&self) -> Result<(String, Value)> {
        let email = unique_email();
        let resp = self
            .client
            .post(self.url("/auth/register"))
            .json(&json!({ "name": "Test User", "email": email, "password": "secret123" }))
            .send()
            .await?;
        anyhow::ensure!(resp.status() == StatusCode::CREATED, "register failed: {}", resp.status());
        let body: Value = resp.json().await?;
        let token = body["data"]["token"].as_str().context("token missing")?.to_string();
        Ok((token, body["data"]["user"].clone()))
    }

    /// Registers an account, promotes it and logs in again
    pub async fn admin_token(&self) -> Result<String> {
        let (_, user) = self.register().await?;
        let email = user["email"].as_str().context("email missing")?;
        User::promote(&self.pool, email).await?.context("promote found no user")?;

        let resp = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": "secret123" }))
            .send()
            .await?;
        let body: Value = resp.json().await?;
        Ok(body["data"]["token"].as_str().context("token missing")?.to_string())
    }

    pub async fn create_region(&self, token: &str) -> Result<i64> {
        self.create_named(token, "/admin/regions", json!({ "name": unique_name("Region") })).await
    }

    pub async fn create_neighborhood(&self, token: &str) -> Result<i64> {
        self.create_named(token, "/admin/neighborhoods", json!({ "name": unique_name("Quarter") })).await
    }

    pub async fn create_feature(&self, token: &str) -> Result<i64> {
        self.create_named(
            token,
            "/admin/features",
            json!({ "name": unique_name("Feature"), "type": "BUILDING" }),
        )
        .await
    }

    async fn create_named(&self, token: &str, path: &str, body: Value) -> Result<i64> {
        let resp = self.client.post(self.url(path)).bearer_auth(token).json(&body).send().await?;
        anyhow::ensure!(resp.status() == StatusCode::CREATED, "{} failed: {}", path, resp.status());
        let body: Value = resp.json().await?;
        body["data"]["id"].as_i64().context("id missing")
    }

    pub async fn count_where(&self, table: &str, column: &str, value: &str) -> Result<i64> {
        let sql = format!("SELECT count(*) FROM {} WHERE {} = $1", table, column);
        let (count,): (i64,) = sqlx::query_as(&sql).bind(value).fetch_one(&self.pool).await?;
        Ok(count)
    }

    pub async fn count_for_property(&self, table: &str, property_id: &str) -> Result<i64> {
        let id: Uuid = property_id.parse()?;
        let sql = format!("SELECT count(*) FROM {} WHERE property_id = $1", table);
        let (count,): (i64,) = sqlx::query_as(&sql).bind(id).fetch_one(&self.pool).await?;
        Ok(count)
    }
}

pub fn unique_email() -> String {
    format!("user-{}@example.com", Uuid::new_v4().simple())
}

pub fn unique_name(prefix: &str) -> String {
    format!("{} {}", prefix, &Uuid::new_v4().simple().to_string()[..8])
}

/// A price band no other test is likely to touch, so list filters can be
/// asserted on exact totals while tests share one database
pub fn unique_price_base() -> i64 {
    let spread = (Uuid::new_v4().as_u128() % 900_000) as i64;
    10_000_000 + spread * 1_000
}

/// Valid create fields; override or drop entries per test
pub fn listing_fields(title: &str, price: i64) -> Vec<(String, String)> {
    [
        ("title", title.to_string()),
        ("description", "Bright two bedroom flat close to the park".to_string()),
        ("price", price.to_string()),
        ("currency", "EUR".to_string()),
        ("area_sqm", "84.5".to_string()),
        ("location_type", "CITY".to_string()),
        ("category", "SALE".to_string()),
        ("type", "APARTMENT".to_string()),
        ("contact_info", r#"{"phone":"+359888000000","email":"a@b.com"}"#.to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

pub fn set_field(fields: &mut Vec<(String, String)>, key: &str, value: &str) {
    fields.retain(|(k, _)| k != key);
    fields.push((key.to_string(), value.to_string()));
}

/// Smallest valid PNG header plus a unique tail so stored names differ
pub fn png_bytes() -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(Uuid::new_v4().as_bytes());
    bytes
}

pub fn multipart(fields: &[(String, String)], images: usize) -> Result<Form> {
    let files: Vec<Vec<u8>> = (0..images).map(|_| png_bytes()).collect();
    multipart_with_images(fields, &files)
}

/// PNG parts are attached in slice order
pub fn multipart_with_images(fields: &[(String, String)], images: &[Vec<u8>]) -> Result<Form> {
    let mut form = Form::new();
    for (key, value) in fields {
        form = form.text(key.clone(), value.clone());
    }
    for (i, bytes) in images.iter().enumerate() {
        let part = Part::bytes(bytes.clone())
            .file_name(format!("photo-{}.png", i))
            .mime_str("image/png")?;
        form = form.part("images", part);
    }
    Ok(form)
}
