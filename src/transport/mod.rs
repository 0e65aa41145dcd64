//! HTTP transport: bearer-auth GET and JSON POST against the cluster API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::error::{Error, Result};

/// Raw response as seen by the protocol layer.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn status_text(&self) -> String {
        self.status.canonical_reason().unwrap_or_default().to_string()
    }

    /// Body of a 2xx response; anything else becomes `RemoteProtocol`.
    /// POST failures keep the response body as the description.
    pub fn into_body(self, method: &Method) -> Result<String> {
        if self.status.is_success() {
            return Ok(self.body);
        }
        let status_text = self.status_text();
        let description = if *method == Method::POST { self.body } else { String::new() };
        Err(Error::RemoteProtocol {
            status: self.status,
            status_text,
            description,
        })
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: Url, token: &str) -> Result<HttpResponse>;
    async fn post_json(&self, url: Url, token: &str, body: &Value) -> Result<HttpResponse>;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(request_timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: Url, token: &str) -> Result<HttpResponse> {
        tracing::debug!(%url, "GET");
        let resp = self.client.get(url).bearer_auth(token).send().await?;
        let status = resp.status();
        Ok(HttpResponse::new(status, resp.text().await?))
    }

    async fn post_json(&self, url: Url, token: &str, body: &Value) -> Result<HttpResponse> {
        tracing::debug!(%url, "POST");
        let resp = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        let status = resp.status();
        Ok(HttpResponse::new(status, resp.text().await?))
    }
}

pub async fn get_body(transport: &dyn Transport, url: Url, token: &str) -> Result<String> {
    transport.get(url, token).await?.into_body(&Method::GET)
}

pub async fn post_body(
    transport: &dyn Transport,
    url: Url,
    token: &str,
    body: &Value,
) -> Result<String> {
    transport.post_json(url, token, body).await?.into_body(&Method::POST)
}

pub fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| Error::decode(e, body))
}
