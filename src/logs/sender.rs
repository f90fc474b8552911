use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SendError {
    #[error("logger service returned non-success status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to send log to logger service: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid auth header: {0}")]
    InvalidHeader(String),
}

/// Delivers one structured log record to the collector.
#[async_trait]
pub trait LogSender: Send + Sync {
    async fn send(&self, payload: Bytes) -> Result<(), SendError>;
}

/// Posts every record as its own `application/json` request.
#[derive(Debug, Clone)]
pub struct HttpLogSender {
    client: reqwest::Client,
    url: String,
    auth_header: Option<(HeaderName, HeaderValue)>,
}

impl HttpLogSender {
    pub fn new(
        url: impl Into<String>,
        auth_header: Option<(&str, &str)>,
        timeout: Duration,
    ) -> Result<Self, SendError> {
        let auth_header = auth_header
            .map(|(name, value)| {
                let name = HeaderName::from_bytes(name.as_bytes())
                    .map_err(|e| SendError::InvalidHeader(format!("{name}: {e}")))?;
                let mut value = HeaderValue::from_str(value)
                    .map_err(|e| SendError::InvalidHeader(format!("{name}: {e}")))?;
                value.set_sensitive(true);
                Ok::<_, SendError>((name, value))
            })
            .transpose()?;

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            url: url.into(),
            auth_header,
        })
    }
}

#[async_trait]
impl LogSender for HttpLogSender {
    async fn send(&self, payload: Bytes) -> Result<(), SendError> {
        let mut request = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload);
        if let Some((name, value)) = &self.auth_header {
            request = request.header(name.clone(), value.clone());
        }

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::OK || status == StatusCode::ACCEPTED {
            return Ok(());
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => format!("<could not read response body: {e}>"),
        };
        Err(SendError::Status {
            status: status.as_u16(),
            body,
        })
    }
}
