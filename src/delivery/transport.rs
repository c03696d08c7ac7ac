use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::{config::ServiceConfig, domain::Payload};

pub const SNIPE_PATH: &str = "snipe";
pub const STATUS_PATH: &str = "status";

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with status {status}")]
    Status { url: String, status: StatusCode },
    #[error("{url} did not answer within {timeout:?}")]
    Timeout { url: String, timeout: Duration },
    #[error("invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ServiceStatus {
    #[serde(default)]
    pub video_count: u64,
    #[serde(default)]
    pub sub_count: u64,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn probe(&self) -> Result<Option<ServiceStatus>, DeliveryError>;

    async fn send(&self, payload: &Payload) -> Result<(), DeliveryError>;
}

#[derive(Clone)]
pub struct HttpTransport {
    http: Client,
    snipe_url: Url,
    status_url: Url,
    delivery_timeout: Option<Duration>,
}

impl HttpTransport {
    pub fn new(http: Client, config: &ServiceConfig) -> Result<Self, DeliveryError> {
        let base = with_trailing_slash(&config.server_base);
        Ok(Self {
            http,
            snipe_url: base.join(SNIPE_PATH)?,
            status_url: base.join(STATUS_PATH)?,
            delivery_timeout: config.delivery_timeout,
        })
    }

    pub fn snipe_url(&self) -> &Url {
        &self.snipe_url
    }

    pub fn status_url(&self) -> &Url {
        &self.status_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn probe(&self) -> Result<Option<ServiceStatus>, DeliveryError> {
        let url = self.status_url.as_str();
        let response = self
            .http
            .get(self.status_url.clone())
            .send()
            .await
            .map_err(|source| DeliveryError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(response.json::<ServiceStatus>().await.ok())
    }

    async fn send(&self, payload: &Payload) -> Result<(), DeliveryError> {
        let url = self.snipe_url.as_str();
        let mut request = self.http.post(self.snipe_url.clone()).json(payload);
        if let Some(timeout) = self.delivery_timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|source| {
            if source.is_timeout() {
                DeliveryError::Timeout {
                    url: url.to_string(),
                    timeout: self.delivery_timeout.unwrap_or_default(),
                }
            } else {
                DeliveryError::Request {
                    url: url.to_string(),
                    source,
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(())
    }
}

fn with_trailing_slash(base: &Url) -> Url {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base: &str) -> HttpTransport {
        let config = ServiceConfig {
            server_base: Url::parse(base).unwrap(),
            delivery_timeout: None,
        };
        HttpTransport::new(Client::new(), &config).unwrap()
    }

    #[test]
    fn endpoints_hang_off_server_base() {
        let t = transport("http://127.0.0.1:5005");
        assert_eq!(t.snipe_url().as_str(), "http://127.0.0.1:5005/snipe");
        assert_eq!(t.status_url().as_str(), "http://127.0.0.1:5005/status");
    }

    #[test]
    fn base_path_is_preserved() {
        let t = transport("http://localhost:8080/vanta");
        assert_eq!(t.snipe_url().as_str(), "http://localhost:8080/vanta/snipe");
        assert_eq!(t.status_url().as_str(), "http://localhost:8080/vanta/status");
    }
}
