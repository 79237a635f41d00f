mod common;

use anyhow::{Context, Result};
use common::{unique_email, unique_name, TestApp};
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn me_id(app: &TestApp, token: &str) -> Result<String> {
    let body: Value = app.client.get(app.url("/auth/me")).bearer_auth(token).send().await?.json().await?;
    Ok(body["data"]["id"].as_str().context("id missing")?.to_string())
}

#[tokio::test]
async fn admin_routes_reject_regular_users() -> Result<()> {
    let Some(app) = TestApp::spawn().await? else { return Ok(()) };
    let (token, _) = app.register().await?;

    for path in ["/admin/users", "/admin/regions", "/admin/messages"] {
        let res = app.client.get(app.url(path)).bearer_auth(&token).send().await?;
        assert_eq!(res.status(), StatusCode::FORBIDDEN, "{}", path);

        let res = app.client.get(app.url(path)).send().await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{}", path);
    }
    Ok(())
}

#[tokio::test]
async fn user_management_lifecycle() -> Result<()> {
    let Some(app) = TestApp::spawn().await? else { return Ok(()) };
    let token = app.admin_token().await?;
    let email = unique_email();

    let res = app
        .client
        .post(app.url("/admin/users"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Agent Smith", "email": email, "password": "secret123", "role": "ADMIN" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await?;
    let id = created["data"]["id"].as_str().context("id")?.to_string();
    assert_eq!(created["data"]["role"], "ADMIN");

    let res = app
        .client
        .patch(app.url(&format!("/admin/users/{}", id)))
        .bearer_auth(&token)
        .json(&json!({ "name": "Agent Jones", "role": "USER" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await?;
    assert_eq!(updated["data"]["name"], "Agent Jones");
    assert_eq!(updated["data"]["role"], "USER");
    assert_eq!(updated["data"]["email"], email);

    let list: Value = app
        .client
        .get(app.url("/admin/users?limit=5"))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(list["data"]["pagination"]["pageSize"], 5);
    assert!(list["data"]["items"].as_array().is_some_and(|items| items.len() <= 5));

    let res = app
        .client
        .delete(app.url(&format!("/admin/users/{}", id)))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .client
        .get(app.url(&format!("/admin/users/{}", id)))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn invalid_role_is_a_validation_error() -> Result<()> {
    let Some(app) = TestApp::spawn().await? else { return Ok(()) };
    let token = app.admin_token().await?;

    let res = app
        .client
        .post(app.url("/admin/users"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Bad Role", "email": unique_email(), "password": "secret123", "role": "ROOT" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert!(body["errors"]["role"].is_array());
    Ok(())
}

#[tokio::test]
async fn admin_cannot_delete_self() -> Result<()> {
    let Some(app) = TestApp::spawn().await? else { return Ok(()) };
    let token = app.admin_token().await?;
    let id = me_id(&app, &token).await?;

    let res = app
        .client
        .delete(app.url(&format!("/admin/users/{}", id)))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app.client.get(app.url("/auth/me")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn taxonomy_crud_and_public_reads() -> Result<()> {
    let Some(app) = TestApp::spawn().await? else { return Ok(()) };
    let token = app.admin_token().await?;

    let region = app.create_region(&token).await?;
    let renamed = unique_name("Renamed");
    let res = app
        .client
        .patch(app.url(&format!("/admin/regions/{}", region)))
        .bearer_auth(&token)
        .json(&json!({ "name": renamed }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let public: Value = app.client.get(app.url("/locations/regions")).send().await?.json().await?;
    let names: Vec<&str> = public["data"]
        .as_array()
        .context("regions")?
        .iter()
        .filter_map(|r| r["name"].as_str())
        .collect();
    assert!(names.contains(&renamed.as_str()));

    let res = app
        .client
        .post(app.url("/admin/features"))
        .bearer_auth(&token)
        .json(&json!({ "name": unique_name("Pool"), "type": "SPACESHIP" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .client
        .delete(app.url(&format!("/admin/regions/{}", region)))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .client
        .get(app.url(&format!("/admin/regions/{}", region)))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn contact_messages_flow() -> Result<()> {
    let Some(app) = TestApp::spawn().await? else { return Ok(()) };
    let token = app.admin_token().await?;
    let sender = unique_email();

    let res = app
        .client
        .post(app.url("/contact"))
        .json(&json!({ "name": "Curious Buyer", "email": sender, "message": "Is the seaside flat still available?" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await?;
    let id = created["data"]["id"].as_str().context("id")?.to_string();
    assert_eq!(created["data"]["is_read"], false);

    let unread: Value = app
        .client
        .get(app.url("/admin/messages?is_read=false&limit=100"))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert!(unread["data"]["unread"].as_i64().is_some_and(|n| n >= 1));
    assert!(unread["data"]["items"]
        .as_array()
        .context("items")?
        .iter()
        .all(|m| m["is_read"] == false));

    let res = app
        .client
        .patch(app.url(&format!("/admin/messages/{}/read", id)))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let read: Value = res.json().await?;
    assert_eq!(read["data"]["is_read"], true);

    let res = app
        .client
        .delete(app.url(&format!("/admin/messages/{}", id)))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(app.count_where("contact_messages", "email", &sender).await?, 0);
    Ok(())
}

#[tokio::test]
async fn contact_form_validates() -> Result<()> {
    let Some(app) = TestApp::spawn().await? else { return Ok(()) };

    let res = app
        .client
        .post(app.url("/contact"))
        .json(&json!({ "name": "X", "email": "nope", "message": "hi" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    for field in ["name", "email", "message"] {
        assert!(body["errors"][field].is_array(), "{}", field);
    }
    Ok(())
}
