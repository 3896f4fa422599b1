//! Single-attempt HTTP transports
//!
//! A transport turns one [`Request`] into one [`Response`] against one host.
//! Retrying and host selection belong to the router. Both implementations
//! share URL building, authentication defaults and response classification,
//! so they produce the same success and error envelopes.

use arangolite_core::error::{is_error_body, ArangoError, ClientError, Result};
use arangolite_core::{
    Body, Config, HostId, Method, Request, Response, ResponseBody, TransportError,
    TransportErrorKind,
};
use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use reqwest::Client as HttpClient;
use std::collections::BTreeMap;
use url::Url;

/// Credentials used for the default `Basic` authorization header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            username: "root".to_string(),
            password: String::new(),
        }
    }
}

impl Credentials {
    pub fn basic_header(&self) -> String {
        let raw = format!("{}:{}", self.username, self.password);
        format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(raw)
        )
    }
}

/// The host a single attempt is sent to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostTarget {
    pub id: HostId,
    /// Base URL without userinfo
    pub url: Url,
    pub credentials: Credentials,
}

impl HostTarget {
    /// Parses a host URL, moving any userinfo into the credentials
    pub fn parse(id: HostId, raw: &str) -> Result<Self> {
        let mut url = Url::parse(raw)
            .map_err(|e| ClientError::Config(format!("invalid host url \"{}\": {}", raw, e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "unsupported scheme in host url \"{}\"",
                raw
            )));
        }

        let credentials = if url.username().is_empty() {
            Credentials::default()
        } else {
            Credentials {
                username: url.username().to_string(),
                password: url.password().unwrap_or_default().to_string(),
            }
        };
        // Url only refuses these on cannot-be-a-base urls, excluded above
        let _ = url.set_username("");
        let _ = url.set_password(None);

        Ok(Self {
            id,
            url,
            credentials,
        })
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends one request to one host, without retrying
    async fn send(&self, request: Request, target: &HostTarget) -> Result<Response>;
}

/// Joins the host base path with the request path and merges query strings
pub fn build_url(target: &HostTarget, request: &Request) -> Url {
    let mut url = target.url.clone();

    let base = target.url.path().trim_end_matches('/');
    let path = request.path.trim_start_matches('/');
    url.set_path(&format!("{}/{}", base, path));

    if !request.query.is_empty() {
        url.query_pairs_mut().extend_pairs(
            request
                .query
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        );
    }
    url
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Head => reqwest::Method::HEAD,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

/// Builds the native request. `allow_header` filters which headers may be set.
pub(crate) fn build_request(
    client: &HttpClient,
    request: &Request,
    target: &HostTarget,
    allow_header: impl Fn(&str) -> bool,
) -> Result<reqwest::RequestBuilder> {
    let url = build_url(target, request);
    let mut builder = client.request(to_reqwest_method(request.method), url);

    for (name, value) in &request.headers {
        if allow_header(name) {
            builder = builder.header(name.as_str(), value.as_str());
        } else {
            tracing::debug!("Dropping restricted header {} for {}", name, request.summary());
        }
    }
    if request.header_value("authorization").is_none() {
        builder = builder.header("authorization", target.credentials.basic_header());
    }

    builder = match &request.body {
        Body::Empty => builder,
        Body::Json(value) => {
            let payload = serde_json::to_vec(value)?;
            if request.header_value("content-type").is_none() {
                builder = builder.header("content-type", "application/json");
            }
            builder.body(payload)
        }
        Body::Bytes(bytes) => builder.body(bytes.clone()),
    };

    if let Some(timeout) = request.timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder)
}

/// Performs the call and classifies the outcome
pub(crate) async fn execute(
    builder: reqwest::RequestBuilder,
    request: &Request,
) -> Result<Response> {
    let response = builder
        .send()
        .await
        .map_err(|e| network_error(e, request))?;

    let status = response.status().as_u16();
    let headers: BTreeMap<String, String> = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    let body = response
        .bytes()
        .await
        .map_err(|e| network_error(e, request))?;

    classify(status, headers, body, request)
}

fn network_error(err: reqwest::Error, request: &Request) -> ClientError {
    let kind = if err.is_timeout() {
        TransportErrorKind::Timeout
    } else if err.is_connect() {
        TransportErrorKind::Connect
    } else {
        TransportErrorKind::Network
    };
    TransportError::new(kind, err.to_string())
        .with_request(request.summary())
        .with_source(err)
        .into()
}

/// Turns a raw HTTP answer into a response or a classified error.
///
/// Binary responses are judged by status alone and never decoded. Other
/// bodies are parsed as JSON; a truthy `error` field makes a protocol error.
pub fn classify(
    status: u16,
    headers: BTreeMap<String, String>,
    body: Bytes,
    request: &Request,
) -> Result<Response> {
    let is_error_status = status >= 400;

    if request.expect_binary {
        if is_error_status {
            return Err(TransportError::new(
                TransportErrorKind::Status,
                format!("server responded with HTTP {}", status),
            )
            .with_status(status, body)
            .with_request(request.summary())
            .into());
        }
        return Ok(Response {
            status,
            headers,
            body: ResponseBody::Binary(body),
            host: None,
        });
    }

    if body.iter().all(u8::is_ascii_whitespace) {
        if is_error_status {
            return Err(TransportError::new(
                TransportErrorKind::Status,
                format!("server responded with HTTP {} and an empty body", status),
            )
            .with_status(status, body)
            .with_request(request.summary())
            .into());
        }
        return Ok(Response {
            status,
            headers,
            body: ResponseBody::Empty,
            host: None,
        });
    }

    let parsed: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(parsed) => parsed,
        Err(e) => {
            let (kind, message) = if is_error_status {
                (
                    TransportErrorKind::Status,
                    format!("server responded with HTTP {}", status),
                )
            } else {
                (
                    TransportErrorKind::InvalidBody,
                    format!("response body is not valid JSON: {}", e),
                )
            };
            return Err(TransportError::new(kind, message)
                .with_status(status, body)
                .with_request(request.summary())
                .into());
        }
    };

    if is_error_body(&parsed) {
        return Err(ArangoError::from_body(parsed, status, request.summary()).into());
    }
    if is_error_status {
        return Err(TransportError::new(
            TransportErrorKind::Status,
            format!("server responded with HTTP {}", status),
        )
        .with_status(status, body)
        .with_request(request.summary())
        .into());
    }

    Ok(Response {
        status,
        headers,
        body: ResponseBody::Json(parsed),
        host: None,
    })
}

/// General purpose transport with full header, pooling and credential control
pub struct NativeTransport {
    client: HttpClient,
}

impl NativeTransport {
    pub fn new(config: &Config) -> Result<Self> {
        let max_idle = if config.keep_alive {
            config.max_idle_per_host
        } else {
            0
        };
        let client = HttpClient::builder()
            .pool_max_idle_per_host(max_idle)
            .danger_accept_invalid_certs(config.insecure_skip_verify)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(client))
    }

    pub fn with_client(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for NativeTransport {
    async fn send(&self, request: Request, target: &HostTarget) -> Result<Response> {
        let builder = build_request(&self.client, &request, target, |_| true)?;
        execute(builder, &request).await
    }
}
