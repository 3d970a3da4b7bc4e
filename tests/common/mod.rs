#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tokio::net::TcpListener;

use boxmeup_api::config::AppConfig;
use boxmeup_api::database::MemoryStore;

pub const SECRET: &str = "integration-test-secret";
pub const PASSWORD: &str = "correct horse battery";

/// A server running on this test's runtime against a fresh in-memory store
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub store: Arc<MemoryStore>,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let store = Arc::new(MemoryStore::new());
        let state = boxmeup_api::build_state(AppConfig::for_testing(SECRET), store.clone())?;
        let listener = TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test port")?;
        tokio::spawn(boxmeup_api::serve(listener, state));

        let server = Self { port, base_url, store };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::NO_CONTENT {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Register `email` and log in with a cookie-keeping client.
    /// Returns the client and the bearer token from the login body.
    pub async fn signed_in(&self, email: &str) -> Result<(Client, String)> {
        let client = Client::builder().cookie_store(true).build()?;

        let res = client
            .post(self.url("/api/user/register"))
            .form(&[("email", email), ("password", PASSWORD)])
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "register failed: {}", res.status());

        let res = client
            .post(self.url("/api/user/login"))
            .form(&[("email", email), ("password", PASSWORD)])
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());
        let body: Value = res.json().await?;
        let token = body["token"].as_str().context("login body has no token")?.to_string();

        Ok((client, token))
    }
}

/// The anti-forgery value embedded in a token's claims
pub fn xsrf_token(token: &str) -> Result<String> {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

    let payload = token.split('.').nth(1).context("token has no payload")?;
    let claims: Value = serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload)?)?;
    Ok(claims["xsrfToken"].as_str().context("no xsrfToken claim")?.to_string())
}

/// A plain client with no cookie store, for bearer-only requests
pub fn bearer_client() -> Client {
    Client::new()
}

pub async fn error_code(res: reqwest::Response) -> Result<i64> {
    let body: Value = res.json().await?;
    body["code"].as_i64().context("error body has no code")
}
