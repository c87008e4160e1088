//! HTTP execution boundary - the trait the dispatcher drives and its reqwest implementation

use std::time::Duration;

use async_trait::async_trait;

use crate::error::NetworkError;
use crate::models::HttpMethod;

/// Fully resolved request, ready to put on the wire
#[derive(Clone, Debug, PartialEq)]
pub struct OutboundRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// Raw response as received, before any decoding
#[derive(Clone, Debug, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub content_type: Option<String>,
}

impl RawResponse {
    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Anything that can execute an HTTP request
#[async_trait]
pub trait HttpExecutor: Send + Sync {
    async fn execute(&self, request: OutboundRequest) -> Result<RawResponse, NetworkError>;
}

/// HTTP client options
#[derive(Clone, Debug, Default)]
pub struct ClientOptions {
    pub timeout: Option<Duration>,
    pub accept_invalid_certs: bool,
}

/// Executor backed by a shared reqwest client
#[derive(Clone, Debug)]
pub struct ReqwestExecutor {
    client: reqwest::Client,
}

impl ReqwestExecutor {
    pub fn new(options: &ClientOptions) -> Self {
        ReqwestExecutor {
            client: create_client(options),
        }
    }
}

#[async_trait]
impl HttpExecutor for ReqwestExecutor {
    async fn execute(&self, request: OutboundRequest) -> Result<RawResponse, NetworkError> {
        let method = match request.method {
            HttpMethod::GET => reqwest::Method::GET,
            HttpMethod::POST => reqwest::Method::POST,
            HttpMethod::PUT => reqwest::Method::PUT,
            HttpMethod::PATCH => reqwest::Method::PATCH,
            HttpMethod::DELETE => reqwest::Method::DELETE,
            HttpMethod::HEAD => reqwest::Method::HEAD,
            HttpMethod::OPTIONS => reqwest::Method::OPTIONS,
        };

        let mut req_builder = self.client.request(method, &request.url);
        for (key, value) in &request.headers {
            req_builder = req_builder.header(key, value);
        }
        if let Some(body) = request.body {
            req_builder = req_builder.body(body);
        }

        let resp = req_builder.send().await.map_err(|e| {
            if e.is_connect() {
                NetworkError::Connect(e.to_string())
            } else {
                NetworkError::Transport(e.to_string())
            }
        })?;

        let status = resp.status();
        let headers: Vec<(String, String)> = resp
            .headers()
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
            .collect();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = resp
            .bytes()
            .await
            .map_err(|e| NetworkError::Body(e.to_string()))?;

        Ok(RawResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body: body.to_vec(),
            content_type,
        })
    }
}

/// Create an HTTP client with the given configuration
pub fn create_client(options: &ClientOptions) -> reqwest::Client {
    let mut builder = reqwest::Client::builder()
        .danger_accept_invalid_certs(options.accept_invalid_certs);
    if let Some(timeout) = options.timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "Falling back to default HTTP client");
        reqwest::Client::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let raw = RawResponse {
            status: 200,
            status_text: "OK".into(),
            headers: vec![("content-length".into(), "12".into())],
            body: vec![],
            content_type: None,
        };
        assert_eq!(raw.header("Content-Length"), Some("12"));
        assert_eq!(raw.header("ETag"), None);
    }
}
