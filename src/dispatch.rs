//! Request dispatch - turns a tab's draft into an outbound request and runs it
//!
//! Every send that reaches the network publishes a `DispatchCompleted` event,
//! success or not. History recording subscribes to those events, so a broken
//! history backend can never change what `send` returns.

use std::sync::{Arc, OnceLock};
use std::time::Instant;

use base64::Engine;
use chrono::{DateTime, Utc};
use regex::Regex;
use tokio::sync::mpsc;

use crate::clock::{Clock, SystemClock};
use crate::constants::DEFAULT_CONTENT_TYPE;
use crate::error::{DispatchError, NetworkError};
use crate::ids::TabId;
use crate::models::{AuthType, DispatchResult, HttpMethod, ResponseBody};
use crate::network::client::{HttpExecutor, OutboundRequest, RawResponse};
use crate::workspace::Tab;

/// Published once per send that reached the network
#[derive(Clone, Debug, PartialEq)]
pub struct DispatchCompleted {
    pub tab_id: TabId,
    pub method: HttpMethod,
    pub url: String,
    pub timestamp: DateTime<Utc>,
    /// Status code on success, error text on failure
    pub outcome: Result<u16, String>,
}

/// Executes drafts and announces completions
#[derive(Clone)]
pub struct RequestDispatcher {
    executor: Arc<dyn HttpExecutor>,
    events: Option<mpsc::UnboundedSender<DispatchCompleted>>,
    clock: Arc<dyn Clock>,
}

impl RequestDispatcher {
    pub fn new(executor: Arc<dyn HttpExecutor>) -> Self {
        RequestDispatcher {
            executor,
            events: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Publishes completion events on `events`
    pub fn with_events(mut self, events: mpsc::UnboundedSender<DispatchCompleted>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Validates and resolves a draft without touching the network
    pub fn prepare(&self, tab: &Tab) -> Result<(TabId, OutboundRequest), DispatchError> {
        let vars: Vec<(&str, &str)> = tab.variables.active_pairs().collect();

        let raw_url = substitute(tab.url.trim(), &vars);
        if !is_valid_url(&raw_url) {
            return Err(DispatchError::InvalidUrl { url: tab.url.clone() });
        }

        let params: Vec<(String, String)> = tab
            .parameters
            .active_pairs()
            .map(|(k, v)| (k.to_string(), substitute(v, &vars)))
            .collect();
        let url = append_query(&raw_url, &params)?;

        let mut headers: Vec<(String, String)> = Vec::new();
        for (key, value) in tab.headers.active_pairs() {
            set_header(&mut headers, key, substitute(value, &vars));
        }
        apply_auth(&mut headers, &tab.auth);
        if find_header(&headers, "Content-Type").is_none() {
            headers.push(("Content-Type".to_string(), DEFAULT_CONTENT_TYPE.to_string()));
        }

        let body = if tab.method.has_body() && !tab.body.is_empty() {
            Some(substitute(&tab.body, &vars))
        } else {
            None
        };

        Ok((
            tab.id,
            OutboundRequest {
                method: tab.method,
                url,
                headers,
                body,
            },
        ))
    }

    /// Runs a prepared request and announces its completion
    pub async fn execute(
        &self,
        tab_id: TabId,
        request: OutboundRequest,
    ) -> Result<DispatchResult, DispatchError> {
        let method = request.method;
        let url = request.url.clone();
        let timestamp = self.clock.now();

        tracing::info!(tab = %tab_id, url = %url, method = ?method, "Executing request");
        let start = Instant::now();
        let outcome = self.executor.execute(request).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let result = outcome.and_then(|raw| decode(raw, elapsed_ms));
        match &result {
            Ok(res) => tracing::info!(tab = %tab_id, status = res.status, elapsed_ms, "Request completed"),
            Err(err) => tracing::info!(tab = %tab_id, error = %err, elapsed_ms, "Request failed"),
        }

        self.announce(DispatchCompleted {
            tab_id,
            method,
            url,
            timestamp,
            outcome: match &result {
                Ok(res) => Ok(res.status),
                Err(err) => Err(err.to_string()),
            },
        });

        result.map_err(DispatchError::from)
    }

    /// `prepare` followed by `execute`
    pub async fn send(&self, tab: &Tab) -> Result<DispatchResult, DispatchError> {
        let (tab_id, request) = self.prepare(tab)?;
        self.execute(tab_id, request).await
    }

    fn announce(&self, event: DispatchCompleted) {
        if let Some(events) = &self.events {
            if events.send(event).is_err() {
                tracing::debug!("No dispatch subscriber listening");
            }
        }
    }
}

fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^https?://[a-z0-9-]+(\.[a-z0-9-]+)*\.[a-z]{2,}(:\d+)?([/?#]\S*)?$")
            .expect("URL pattern compiles")
    })
}

/// Scheme plus a host with a dotted TLD
pub fn is_valid_url(url: &str) -> bool {
    let url = url.trim();
    !url.is_empty() && url_pattern().is_match(url)
}

/// Replaces `{{name}}` placeholders with variable values
pub fn substitute(text: &str, vars: &[(&str, &str)]) -> String {
    let mut result = text.to_string();
    for (key, value) in vars {
        let pattern = format!("{{{{{}}}}}", key);
        result = result.replace(&pattern, value);
    }
    result
}

/// Appends form-encoded params to the URL as typed. Only the query is
/// encoded; the rest of the text is kept verbatim so history shows what the
/// user entered.
fn append_query(url: &str, params: &[(String, String)]) -> Result<String, DispatchError> {
    if params.is_empty() {
        return Ok(url.to_string());
    }
    let mut parsed = reqwest::Url::parse(url).map_err(|_| DispatchError::InvalidUrl {
        url: url.to_string(),
    })?;
    parsed.set_query(None);
    parsed.query_pairs_mut().extend_pairs(params);
    let query = parsed.query().unwrap_or_default();

    let (base, fragment) = match url.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (url, None),
    };
    let separator = if !base.contains('?') {
        "?"
    } else if base.ends_with('?') || base.ends_with('&') {
        ""
    } else {
        "&"
    };

    let mut resolved = format!("{}{}{}", base, separator, query);
    if let Some(fragment) = fragment {
        resolved.push('#');
        resolved.push_str(fragment);
    }
    Ok(resolved)
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Later values for the same (case-insensitive) name overwrite earlier ones in place
fn set_header(headers: &mut Vec<(String, String)>, key: &str, value: String) {
    match headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(key)) {
        Some(existing) => existing.1 = value,
        None => headers.push((key.to_string(), value)),
    }
}

fn apply_auth(headers: &mut Vec<(String, String)>, auth: &AuthType) {
    if find_header(headers, "Authorization").is_some() {
        return;
    }
    match auth {
        AuthType::Bearer(token) if !token.is_empty() => {
            headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
        }
        AuthType::Basic { username, password } if !username.is_empty() => {
            let credentials = format!("{}:{}", username, password);
            let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
            headers.push(("Authorization".to_string(), format!("Basic {}", encoded)));
        }
        _ => {}
    }
}

fn is_json_like(content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| ct.to_ascii_lowercase().contains("json"))
        .unwrap_or(false)
}

fn decode(raw: RawResponse, elapsed_ms: u64) -> Result<DispatchResult, NetworkError> {
    if raw.status >= 400 {
        return Err(NetworkError::Status {
            status: raw.status,
            status_text: raw.status_text,
        });
    }

    let body = if is_json_like(raw.content_type.as_deref()) {
        match serde_json::from_slice::<serde_json::Value>(&raw.body) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Text(String::from_utf8_lossy(&raw.body).into_owned()),
        }
    } else {
        ResponseBody::Text(String::from_utf8_lossy(&raw.body).into_owned())
    };

    let size_bytes = raw
        .header("Content-Length")
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(body.len() as u64);

    Ok(DispatchResult {
        status: raw.status,
        status_text: raw.status_text,
        headers: raw.headers,
        body,
        elapsed_ms,
        size_bytes,
    })
}
