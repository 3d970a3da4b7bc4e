mod common;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde_json::Value;

use common::{bearer_client, error_code, TestServer};

async fn create(client: &Client, url: String, token: &str, form: &[(&str, &str)]) -> Result<i64> {
    let res = client.post(url).bearer_auth(token).form(form).send().await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "create failed: {}", res.status());
    let body: Value = res.json().await?;
    body["id"].as_i64().context("create body has no id")
}

#[tokio::test]
async fn full_inventory_flow_for_one_user() -> Result<()> {
    let server = TestServer::start().await?;
    let (_, token) = server.signed_in("owner@example.com").await?;
    let client = bearer_client();

    let location = create(&client, server.url("/api/location"), &token, &[("name", "Home"), ("address", "1 Main St")]).await?;
    let container = create(
        &client,
        server.url("/api/container"),
        &token,
        &[("name", "Garage shelf"), ("location_id", &location.to_string())],
    )
    .await?;
    create(&client, server.url(&format!("/api/container/{}/item", container)), &token, &[("body", "Wool socks"), ("quantity", "3")]).await?;
    create(&client, server.url(&format!("/api/container/{}/item", container)), &token, &[("body", "Hammer")]).await?;

    let res = client
        .get(server.url(&format!("/api/container/{}", container)))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["location_id"], location);
    assert_eq!(body["item_count"], 2);

    let res = client
        .get(server.url("/api/item/search?term=SOCKS"))
        .bearer_auth(&token)
        .send()
        .await?;
    let page: Value = res.json().await?;
    assert_eq!(page["total"], 1);
    assert_eq!(page["data"][0]["quantity"], 3);

    let res = client
        .get(server.url(&format!("/api/container?location_id={}", location)))
        .bearer_auth(&token)
        .send()
        .await?;
    let page: Value = res.json().await?;
    assert_eq!(page["total"], 1);

    let res = client
        .get(server.url("/api/location?is_attached_to_container=T"))
        .bearer_auth(&token)
        .send()
        .await?;
    let page: Value = res.json().await?;
    assert_eq!(page["data"][0]["name"], "Home");
    Ok(())
}

#[tokio::test]
async fn other_users_resources_are_forbidden() -> Result<()> {
    let server = TestServer::start().await?;
    let (_, alice) = server.signed_in("alice@example.com").await?;
    let (_, mallory) = server.signed_in("mallory@example.com").await?;
    let client = bearer_client();

    let location = create(&client, server.url("/api/location"), &alice, &[("name", "Alice's flat")]).await?;
    let container = create(&client, server.url("/api/container"), &alice, &[("name", "Closet")]).await?;
    let item = create(&client, server.url(&format!("/api/container/{}/item", container)), &alice, &[("body", "Coat")]).await?;

    let res = client
        .get(server.url(&format!("/api/container/{}", container)))
        .bearer_auth(&mallory)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .put(server.url(&format!("/api/location/{}", location)))
        .bearer_auth(&mallory)
        .form(&[("name", "mine now")])
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_code(res).await?, -2);

    let res = client
        .delete(server.url(&format!("/api/container/{}/item/{}", container, item)))
        .bearer_auth(&mallory)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Mallory cannot put her container at Alice's location
    let own = create(&client, server.url("/api/container"), &mallory, &[("name", "Bag")]).await?;
    let res = client
        .put(server.url(&format!("/api/container/{}", own)))
        .bearer_auth(&mallory)
        .form(&[("name", "Bag"), ("location_id", &location.to_string())])
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_code(res).await?, -3);

    // Searching never crosses users
    let res = client
        .get(server.url("/api/item/search?term=coat"))
        .bearer_auth(&mallory)
        .send()
        .await?;
    let page: Value = res.json().await?;
    assert_eq!(page["total"], 0);
    Ok(())
}

#[tokio::test]
async fn missing_resources_are_not_found() -> Result<()> {
    let server = TestServer::start().await?;
    let (_, token) = server.signed_in("nobody@example.com").await?;
    let client = bearer_client();

    let res = client
        .delete(server.url("/api/location/9999"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_code(res).await?, -1);

    let res = client
        .post(server.url("/api/container"))
        .bearer_auth(&token)
        .form(&[("name", "Box"), ("location_id", "9999")])
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_code(res).await?, -5);
    Ok(())
}
