pub mod response;

use std::time::{Duration, Instant};

use indexmap::IndexMap;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest_middleware::ClientWithMiddleware;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::auth::AuthState;
use crate::config::Config;
use crate::errors::SuiteError;
use crate::utils::http_retry;

pub use response::{Body, FailureKind, Outcome, ResponseResult};

pub const API_KEY_HEADER: &str = "X-API-Key";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Only these methods ever carry a serialized body.
    pub fn accepts_body(self) -> bool {
        matches!(self, Method::Post | Method::Put | Method::Patch)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(m: Method) -> Self {
        match m {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Per-call overrides.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    headers: IndexMap<String, String>,
    body: Option<Value>,
    timeout: Option<Duration>,
    auth: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            headers: IndexMap::new(),
            body: None,
            timeout: None,
            auth: true,
        }
    }
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
    /// Suppress bearer-token injection even when a token is configured.
    pub fn no_auth(mut self) -> Self {
        self.auth = false;
        self
    }
}

/// Fully resolved request, immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: Method,
    pub path: String,
    pub headers: IndexMap<String, String>,
    pub body: Option<Value>,
    pub timeout: Duration,
    pub auth: bool,
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    api_key: String,
    config_token: Option<String>,
    config_account_id: i64,
    default_timeout: Duration,
    http: ClientWithMiddleware,
    raw: Client,
    auth: Option<AuthState>,
}

impl ApiClient {
    pub fn new(cfg: &Config) -> Self {
        let raw = build_reqwest_client();
        let http = http_retry::build_client_with_retry(raw.clone(), &cfg.retry, cfg.verbose);
        Self {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
            config_token: cfg.jwt_token.clone(),
            config_account_id: cfg.test_account_id,
            default_timeout: cfg.timeouts.default_timeout(),
            http,
            raw,
            auth: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    pub(crate) fn raw(&self) -> &Client {
        &self.raw
    }

    /// Token from a successful login, else the configured one.
    pub fn token(&self) -> Option<&str> {
        self.auth
            .as_ref()
            .map(|a| a.token.as_str())
            .or(self.config_token.as_deref())
    }

    /// Account id from a successful login, else the configured one.
    pub fn account_id(&self) -> i64 {
        self.auth
            .as_ref()
            .and_then(|a| a.account_id)
            .unwrap_or(self.config_account_id)
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_some() || self.config_token.is_some()
    }

    pub fn auth_state(&self) -> Option<&AuthState> {
        self.auth.as_ref()
    }

    pub(crate) fn set_auth(&mut self, state: AuthState) {
        self.auth = Some(state);
    }

    pub fn logout(&mut self) {
        self.auth = None;
    }

    /// Resolve headers, body and timeout for one call.
    pub fn prepare(&self, method: Method, path: &str, options: RequestOptions) -> RequestSpec {
        let mut headers = IndexMap::new();
        set_header(&mut headers, API_KEY_HEADER, self.api_key.clone());
        set_header(&mut headers, "Content-Type", "application/json".to_string());
        // caller wins over defaults
        for (key, value) in options.headers {
            set_header(&mut headers, &key, value);
        }

        if options.auth {
            if let Some(token) = self.token() {
                set_header(&mut headers, "Authorization", format!("Bearer {token}"));
            }
        }

        RequestSpec {
            method,
            path: path.to_string(),
            headers,
            body: options.body.filter(|_| method.accepts_body()),
            timeout: options.timeout.unwrap_or(self.default_timeout),
            auth: options.auth,
        }
    }

    pub async fn request(&self, method: Method, path: &str, options: RequestOptions) -> ResponseResult {
        let spec = self.prepare(method, path, options);
        self.execute(&spec).await
    }

    /// Every outcome, including timeouts and transport errors, comes back as a `ResponseResult`.
    #[instrument(skip_all, fields(method = %spec.method, path = %spec.path))]
    pub async fn execute(&self, spec: &RequestSpec) -> ResponseResult {
        let url = format!("{}{}", self.base_url, spec.path);
        let started = Instant::now();

        let mut req = self.http.request(spec.method.into(), &url);
        for (key, value) in &spec.headers {
            req = req.header(key.as_str(), value.as_str());
        }
        if let Some(body) = &spec.body {
            req = req.body(body.to_string());
        }

        let round_trip = async {
            let resp = req.send().await?;
            let status = resp.status().as_u16();
            let headers: IndexMap<String, String> = resp
                .headers()
                .iter()
                .map(|(k, v)| (k.as_str().to_string(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
                .collect();
            let content_type = resp
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|h| h.to_str().ok())
                .map(str::to_owned);
            let bytes = resp.bytes().await?;
            Ok::<_, SuiteError>((status, headers, Body::negotiate(content_type.as_deref(), &bytes)))
        };

        let result = match tokio::time::timeout(spec.timeout, round_trip).await {
            Ok(Ok((status, headers, body))) => {
                ResponseResult::success(status, body, headers, started.elapsed())
            }
            Ok(Err(err)) => {
                let kind = if is_timeout(&err) {
                    FailureKind::Timeout
                } else {
                    FailureKind::Network
                };
                ResponseResult::failure(kind, describe_error(&err), started.elapsed())
            }
            Err(_) => ResponseResult::failure(FailureKind::Timeout, "Request timeout", started.elapsed()),
        };

        debug!(
            status = result.status(),
            elapsed_ms = result.duration_ms(),
            timed_out = result.timed_out(),
            "request finished"
        );
        result
    }

    pub async fn get(&self, path: &str, options: RequestOptions) -> ResponseResult {
        self.request(Method::Get, path, options).await
    }

    pub async fn post(&self, path: &str, body: Value, options: RequestOptions) -> ResponseResult {
        self.request(Method::Post, path, options.body(body)).await
    }

    pub async fn put(&self, path: &str, body: Value, options: RequestOptions) -> ResponseResult {
        self.request(Method::Put, path, options.body(body)).await
    }

    pub async fn patch(&self, path: &str, body: Value, options: RequestOptions) -> ResponseResult {
        self.request(Method::Patch, path, options.body(body)).await
    }

    pub async fn delete(&self, path: &str, options: RequestOptions) -> ResponseResult {
        self.request(Method::Delete, path, options).await
    }
}

/// Header names are case-insensitive; a later write replaces any spelling of the same name.
fn set_header(headers: &mut IndexMap<String, String>, key: &str, value: String) {
    headers.retain(|k, _| !k.eq_ignore_ascii_case(key));
    headers.insert(key.to_string(), value);
}

fn build_reqwest_client() -> Client {
    Client::builder()
        // Timeouts are enforced per call in `execute`.
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .build()
        .unwrap_or_else(|_| Client::new())
}

fn is_timeout(err: &SuiteError) -> bool {
    match err {
        SuiteError::Reqwest(e) => e.is_timeout(),
        SuiteError::Middleware(reqwest_middleware::Error::Reqwest(e)) => e.is_timeout(),
        _ => false,
    }
}

/// Flatten the error source chain into one line.
fn describe_error(err: &SuiteError) -> String {
    let mut msg = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        let text = cause.to_string();
        if !msg.contains(&text) {
            msg.push_str(": ");
            msg.push_str(&text);
        }
        source = cause.source();
    }
    msg
}
