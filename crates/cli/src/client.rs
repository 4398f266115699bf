//! API client for the Spot Advisor service

use anyhow::{Context, Result};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

/// Response envelope used by every `/api/v1` endpoint
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

/// API client for the advisor
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(90))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        Self::unwrap_envelope(response).await
    }

    /// Make a GET request with query parameters
    pub async fn get_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .context("Failed to send request")?;

        Self::unwrap_envelope(response).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        Self::unwrap_envelope(response).await
    }

    async fn unwrap_envelope<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await.context("Failed to read response")?;

        let envelope: Envelope<T> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => anyhow::bail!("API error ({}): {}", status, body),
            Err(e) => return Err(e).context("Failed to parse response"),
        };

        if !status.is_success() || !envelope.success {
            let message = envelope.error.unwrap_or_else(|| "unknown error".to_string());
            anyhow::bail!("API error ({}): {}", status, message);
        }

        envelope.data.context("Response is missing data")
    }
}

/// Body of `GET /api/v1/families`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyList {
    pub cloud: String,
    pub families: Vec<String>,
}

/// Body of `POST /api/v1/cache/refresh`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResult {
    pub removed: usize,
}

/// Region override for `GET /api/v1/predictions/{type}`
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegionQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// Query for `GET /api/v1/zones/{type}`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ZoneQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smart: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}
