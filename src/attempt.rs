//! One bounded-time request attempt and its classification.

use std::time::Duration;

use reqwest::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    Method, StatusCode,
};
use tokio::time::{timeout_at, Instant};

use crate::payload::{is_json_content_type, Payload};

/// `User-Agent` attached to every outbound request.
pub const USER_AGENT: &str = concat!("cascade-fetch/", env!("CARGO_PKG_VERSION"));

const ACCEPT: &str = "application/json, text/plain;q=0.9, */*;q=0.8";
const REQUESTED_WITH: &str = "cascade-fetch";

/// Why no response was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// The attempt deadline elapsed and the attempt was abandoned.
    Timeout,
    /// Connection could not be established.
    Connect,
    /// Anything else: request build errors, body read errors, bad JSON.
    Other,
}

/// Classified result of a single attempt.
#[derive(Clone, Debug, PartialEq)]
pub enum AttemptOutcome {
    Success {
        payload: Payload,
        status: u16,
        latency_ms: u64,
    },
    RateLimited {
        latency_ms: u64,
    },
    HttpError {
        status: u16,
        latency_ms: u64,
    },
    TransportFailure {
        kind: FailureKind,
        reason: String,
        latency_ms: u64,
    },
}

impl AttemptOutcome {
    /// Response status, `0` when no response was received.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Success { status, .. } | Self::HttpError { status, .. } => *status,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS.as_u16(),
            Self::TransportFailure { .. } => 0,
        }
    }

    pub fn latency_ms(&self) -> u64 {
        match self {
            Self::Success { latency_ms, .. }
            | Self::RateLimited { latency_ms }
            | Self::HttpError { latency_ms, .. }
            | Self::TransportFailure { latency_ms, .. } => *latency_ms,
        }
    }
}

/// Fully resolved request shape for one endpoint.
#[derive(Clone, Debug)]
pub(crate) struct AttemptRequest<'a> {
    pub url: &'a str,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<String>,
    pub timeout: Duration,
}

struct RawResponse {
    status: StatusCode,
    json: bool,
    body: Option<String>,
}

/// Performs exactly one attempt bounded by `request.timeout`.
///
/// The deadline covers both sending and reading the body. On expiry the
/// in-flight exchange is dropped, so no partial response is ever returned.
pub(crate) async fn execute(http: &reqwest::Client, request: &AttemptRequest<'_>) -> AttemptOutcome {
    let started = Instant::now();
    let deadline = started + request.timeout;
    let exchanged = timeout_at(deadline, exchange(http, request)).await;
    let latency_ms = elapsed_ms(started);

    let raw = match exchanged {
        Err(_) => {
            return AttemptOutcome::TransportFailure {
                kind: FailureKind::Timeout,
                reason: format!("attempt exceeded {} ms deadline", request.timeout.as_millis()),
                latency_ms,
            }
        }
        Ok(Err(err)) => {
            return AttemptOutcome::TransportFailure {
                kind: classify_transport(&err),
                reason: err.to_string(),
                latency_ms,
            }
        }
        Ok(Ok(raw)) => raw,
    };

    if raw.status == StatusCode::TOO_MANY_REQUESTS {
        return AttemptOutcome::RateLimited { latency_ms };
    }
    if !raw.status.is_success() {
        return AttemptOutcome::HttpError {
            status: raw.status.as_u16(),
            latency_ms,
        };
    }

    let body = raw.body.unwrap_or_default();
    let payload = if raw.json {
        match serde_json::from_str(&body) {
            Ok(value) => Payload::Json(value),
            Err(err) => {
                return AttemptOutcome::TransportFailure {
                    kind: FailureKind::Other,
                    reason: format!("invalid JSON body: {err}"),
                    latency_ms,
                }
            }
        }
    } else {
        Payload::Text(body)
    };

    AttemptOutcome::Success {
        payload,
        status: raw.status.as_u16(),
        latency_ms,
    }
}

async fn exchange(
    http: &reqwest::Client,
    request: &AttemptRequest<'_>,
) -> Result<RawResponse, reqwest::Error> {
    let mut builder = http
        .request(request.method.clone(), request.url)
        .headers(request.headers.clone());
    if let Some(body) = &request.body {
        builder = builder.body(body.clone());
    }

    let response = builder.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Ok(RawResponse {
            status,
            json: false,
            body: None,
        });
    }

    let json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(is_json_content_type);
    let body = response.text().await?;
    Ok(RawResponse {
        status,
        json,
        body: Some(body),
    })
}

/// Builds request headers: fixed identification headers first, then each
/// layer in order, later layers replacing earlier values of the same name.
pub(crate) fn request_headers(layers: &[&[(String, String)]]) -> Result<HeaderMap, String> {
    let mut headers = HeaderMap::new();
    headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
    headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT));
    headers.insert(
        HeaderName::from_static("x-requested-with"),
        HeaderValue::from_static(REQUESTED_WITH),
    );

    for layer in layers {
        for (name, value) in layer.iter() {
            let name = HeaderName::from_bytes(name.trim().as_bytes())
                .map_err(|err| format!("invalid header name '{name}': {err}"))?;
            let value = HeaderValue::from_str(value)
                .map_err(|err| format!("invalid value for header '{name}': {err}"))?;
            headers.insert(name, value);
        }
    }
    Ok(headers)
}

fn classify_transport(err: &reqwest::Error) -> FailureKind {
    if err.is_timeout() {
        FailureKind::Timeout
    } else if err.is_connect() {
        FailureKind::Connect
    } else {
        FailureKind::Other
    }
}

pub(crate) fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
