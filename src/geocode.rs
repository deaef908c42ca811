use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("Geocoding service error: {0}")]
    Service(String),
}

/// Address validation against an external geocoding service.
///
/// `Ok(Some(formatted))` means the service confirmed the address and the
/// returned normalized form is authoritative; `Ok(None)` means the service
/// rejected it; `Err` is a connectivity failure.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve(&self, address: &str) -> Result<Option<String>, GeocodeError>;
}

#[derive(Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Deserialize)]
struct GeocodeResult {
    formatted_address: String,
}

/// Geocoder backed by a Google-style geocode JSON endpoint.
pub struct HttpGeocoder {
    api_key: String,
    client: Client,
    endpoint: String,
}

impl HttpGeocoder {
    pub fn new(endpoint: &str, api_key: &str) -> Result<Self, anyhow::Error> {
        let client = Client::builder().build()?;
        Ok(Self {
            api_key: api_key.to_string(),
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl Geocoder for HttpGeocoder {
    async fn resolve(&self, address: &str) -> Result<Option<String>, GeocodeError> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("address", address), ("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| GeocodeError::Service(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(GeocodeError::Service(format!(
                "geocode request failed ({})",
                resp.status()
            )));
        }

        let body: GeocodeResponse = resp
            .json()
            .await
            .map_err(|e| GeocodeError::Service(e.to_string()))?;

        // Only a status of exactly "OK" counts as confirmation; the first
        // result's formatted address is authoritative.
        if body.status != "OK" {
            return Ok(None);
        }

        Ok(body.results.into_iter().next().map(|r| r.formatted_address))
    }
}

/// Pass-through used when geocoding is disabled: every address is accepted
/// verbatim.
pub struct PassthroughGeocoder;

#[async_trait]
impl Geocoder for PassthroughGeocoder {
    async fn resolve(&self, address: &str) -> Result<Option<String>, GeocodeError> {
        Ok(Some(address.to_string()))
    }
}
