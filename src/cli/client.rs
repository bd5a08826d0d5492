use std::time::Duration;

use anyhow::{anyhow, Context};
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde_json::Value;

const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Thin JSON client for the protected API, configured from ORG_API_URL and ORG_TOKEN
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn from_env() -> anyhow::Result<Self> {
        let base_url = std::env::var("ORG_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let token = std::env::var("ORG_TOKEN").ok().filter(|t| !t.trim().is_empty());

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            http,
        })
    }

    pub async fn get(&self, path: &str) -> anyhow::Result<Value> {
        self.send(self.request(Method::GET, path)?).await
    }

    pub async fn post<B: Serialize>(&self, path: &str, body: &B) -> anyhow::Result<Value> {
        self.send(self.request(Method::POST, path)?.json(body)).await
    }

    pub async fn delete(&self, path: &str) -> anyhow::Result<Value> {
        self.send(self.request(Method::DELETE, path)?).await
    }

    fn request(&self, method: Method, path: &str) -> anyhow::Result<RequestBuilder> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| anyhow!("ORG_TOKEN is not set; mint one with `org auth token`"))?;

        Ok(self
            .http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(token))
    }

    /// Return the response body, or an error carrying the server's message
    async fn send(&self, request: RequestBuilder) -> anyhow::Result<Value> {
        let response = request.send().await.context("request to Org API failed")?;
        let status = response.status();
        let body: Value = response.json().await.context("Org API returned a non-JSON body")?;

        if status.is_success() {
            return Ok(body);
        }

        // Policy denials carry their reasons; surface them verbatim
        if body.get("validation_errors").is_some() {
            return Ok(body);
        }

        let message = body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        Err(anyhow!("{} ({})", message, status))
    }
}
