mod common;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use common::{bearer_client, error_code, xsrf_token, TestServer};

async fn stocked_container(server: &TestServer, client: &Client, token: &str, count: usize) -> Result<(i64, Vec<i64>)> {
    let res = client
        .post(server.url("/api/container"))
        .bearer_auth(token)
        .form(&[("name", "Bin")])
        .send()
        .await?;
    let container = res.json::<Value>().await?["id"].as_i64().context("no container id")?;

    let mut ids = Vec::new();
    for n in 0..count {
        let res = client
            .post(server.url(&format!("/api/container/{}/item", container)))
            .bearer_auth(token)
            .form(&[("body", format!("part {}", n))])
            .send()
            .await?;
        ids.push(res.json::<Value>().await?["id"].as_i64().context("no item id")?);
    }
    Ok((container, ids))
}

async fn item_count(server: &TestServer, client: &Client, token: &str, container: i64) -> Result<i64> {
    let res = client
        .get(server.url(&format!("/api/container/{}", container)))
        .bearer_auth(token)
        .send()
        .await?;
    res.json::<Value>().await?["item_count"].as_i64().context("no item_count")
}

#[tokio::test]
async fn owner_bulk_deletes_with_cookie_session() -> Result<()> {
    let server = TestServer::start().await?;
    let (cookie_client, token) = server.signed_in("bulk@example.com").await?;
    let client = bearer_client();
    let (container, ids) = stocked_container(&server, &client, &token, 4).await?;

    let res = cookie_client
        .post(server.url("/api/container/item/bulk-delete"))
        .header("x-xsrf-token", xsrf_token(&token)?)
        .json(&json!({ "ids": &ids[..3] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(item_count(&server, &client, &token, container).await?, 1);
    assert_eq!(server.store.delete_batches(), 1);
    Ok(())
}

#[tokio::test]
async fn unknown_id_deletes_nothing() -> Result<()> {
    let server = TestServer::start().await?;
    let (_, token) = server.signed_in("partial@example.com").await?;
    let client = bearer_client();
    let (container, mut ids) = stocked_container(&server, &client, &token, 2).await?;
    ids.push(987654);

    let res = client
        .post(server.url("/api/container/item/bulk-delete"))
        .bearer_auth(&token)
        .json(&json!({ "ids": ids }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_code(res).await?, -1);
    assert_eq!(item_count(&server, &client, &token, container).await?, 2);
    Ok(())
}

#[tokio::test]
async fn mixed_ownership_deletes_nothing() -> Result<()> {
    let server = TestServer::start().await?;
    let (_, alice) = server.signed_in("alice@example.com").await?;
    let (_, bob) = server.signed_in("bob@example.com").await?;
    let client = bearer_client();
    let (alice_box, alice_items) = stocked_container(&server, &client, &alice, 2).await?;
    let (bob_box, bob_items) = stocked_container(&server, &client, &bob, 1).await?;

    let ids: Vec<i64> = alice_items.iter().chain(&bob_items).copied().collect();
    let res = client
        .post(server.url("/api/container/item/bulk-delete"))
        .bearer_auth(&alice)
        .json(&json!({ "ids": ids }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_code(res).await?, -2);

    assert_eq!(item_count(&server, &client, &alice, alice_box).await?, 2);
    assert_eq!(item_count(&server, &client, &bob, bob_box).await?, 1);
    assert_eq!(server.store.delete_batches(), 0);
    Ok(())
}

#[tokio::test]
async fn empty_batch_is_a_no_op() -> Result<()> {
    let server = TestServer::start().await?;
    let (_, token) = server.signed_in("empty@example.com").await?;

    let res = bearer_client()
        .post(server.url("/api/container/item/bulk-delete"))
        .bearer_auth(&token)
        .json(&json!({ "ids": [] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(server.store.delete_batches(), 0);
    Ok(())
}
