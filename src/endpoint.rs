use reqwest::Method;

use crate::{CascadeError, Result};

/// One alternative remote source in a cascade.
///
/// Position in the endpoint list encodes priority; index 0 is the primary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    /// Absolute request URL.
    pub url: String,
    /// Method override; falls back to [`crate::FetchOptions::method`].
    pub method: Option<Method>,
    /// Header overrides merged over [`crate::FetchOptions::headers`].
    pub headers: Vec<(String, String)>,
    /// Body override; falls back to [`crate::FetchOptions::body`].
    pub body: Option<String>,
}

impl Endpoint {
    /// Creates an endpoint with no overrides.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: None,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Overrides the request method for this endpoint.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Adds a request header for this endpoint.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Overrides the request body for this endpoint.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Returns the host identifier used as the result `source` and in telemetry.
    ///
    /// Example: `"https://dns.google/resolve?name=x"` → `"dns.google"`
    pub fn host(&self) -> Result<String> {
        host_of(&self.url).ok_or_else(|| CascadeError::InvalidEndpoint {
            address: self.url.clone(),
        })
    }
}

impl From<&str> for Endpoint {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

impl From<String> for Endpoint {
    fn from(url: String) -> Self {
        Self::new(url)
    }
}

pub(crate) fn host_of(address: &str) -> Option<String> {
    let parsed = url::Url::parse(address.trim()).ok()?;
    let host = parsed.host_str()?;
    if host.is_empty() {
        return None;
    }
    Some(host.trim_start_matches('[').trim_end_matches(']').to_owned())
}

#[cfg(test)]
mod tests {
    use super::{host_of, Endpoint};
    use crate::CascadeError;

    #[test]
    fn host_strips_scheme_port_and_path() {
        assert_eq!(
            host_of("https://cve.circl.lu:443/api/cve/CVE-2021-44228").as_deref(),
            Some("cve.circl.lu")
        );
        assert_eq!(host_of("http://127.0.0.1:8080/x").as_deref(), Some("127.0.0.1"));
        assert_eq!(host_of("http://[::1]:9000/").as_deref(), Some("::1"));
    }

    #[test]
    fn host_rejects_malformed_addresses() {
        assert_eq!(host_of("not a url"), None);
        assert_eq!(host_of("/relative/path"), None);
        assert_eq!(host_of("mailto:ops@example.com"), None);
    }

    #[test]
    fn host_error_carries_address() {
        let err = Endpoint::new("::garbage::").host().expect_err("must fail");
        match err {
            CascadeError::InvalidEndpoint { address } => assert_eq!(address, "::garbage::"),
            other => panic!("expected invalid endpoint, got {other:?}"),
        }
    }

    #[test]
    fn builder_collects_overrides() {
        let endpoint = Endpoint::from("https://example.com/graphql")
            .with_method(reqwest::Method::POST)
            .with_header("Content-Type", "application/json")
            .with_body("{}");
        assert_eq!(endpoint.method, Some(reqwest::Method::POST));
        assert_eq!(endpoint.headers.len(), 1);
        assert_eq!(endpoint.body.as_deref(), Some("{}"));
    }
}
