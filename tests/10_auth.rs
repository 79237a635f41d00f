mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let Some(app) = common::TestApp::spawn().await? else { return Ok(()) };

    let res = app.client.get(app.url("/health")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["status"], "success");
    Ok(())
}

#[tokio::test]
async fn register_returns_token_and_user_without_hash() -> Result<()> {
    let Some(app) = common::TestApp::spawn().await? else { return Ok(()) };

    let (token, user) = app.register().await?;
    assert!(!token.is_empty());
    assert_eq!(user["role"], "USER");
    assert!(user.get("password_hash").is_none());
    assert!(user.get("password").is_none());
    Ok(())
}

#[tokio::test]
async fn duplicate_email_conflicts() -> Result<()> {
    let Some(app) = common::TestApp::spawn().await? else { return Ok(()) };

    let (_, user) = app.register().await?;
    let res = app
        .client
        .post(app.url("/auth/register"))
        .json(&json!({ "name": "Again", "email": user["email"], "password": "secret123" }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "CONFLICT");
    Ok(())
}

#[tokio::test]
async fn register_validates_fields() -> Result<()> {
    let Some(app) = common::TestApp::spawn().await? else { return Ok(()) };

    let res = app
        .client
        .post(app.url("/auth/register"))
        .json(&json!({ "name": "A", "email": "not-an-email", "password": "123" }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["errors"]["email"].is_array());
    assert!(body["errors"]["password"].is_array());
    Ok(())
}

#[tokio::test]
async fn login_and_me_round_trip() -> Result<()> {
    let Some(app) = common::TestApp::spawn().await? else { return Ok(()) };

    let (_, user) = app.register().await?;
    let res = app
        .client
        .post(app.url("/auth/login"))
        .json(&json!({ "email": user["email"], "password": "secret123" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    let token = body["data"]["token"].as_str().unwrap_or_default().to_string();

    let me: Value = app
        .client
        .get(app.url("/auth/me"))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(me["data"]["id"], user["id"]);
    assert_eq!(me["data"]["email"], user["email"]);
    Ok(())
}

#[tokio::test]
async fn wrong_password_is_unauthorized() -> Result<()> {
    let Some(app) = common::TestApp::spawn().await? else { return Ok(()) };

    let (_, user) = app.register().await?;
    let res = app
        .client
        .post(app.url("/auth/login"))
        .json(&json!({ "email": user["email"], "password": "not-the-password" }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn me_requires_token() -> Result<()> {
    let Some(app) = common::TestApp::spawn().await? else { return Ok(()) };

    let res = app.client.get(app.url("/auth/me")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app.client.get(app.url("/auth/me")).bearer_auth("garbage").send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
