use std::{fmt, sync::Arc, sync::OnceLock, time::Duration};

use tokio::time::{sleep, Instant};

use crate::{
    attempt::{self, elapsed_ms, AttemptOutcome, AttemptRequest},
    endpoint::host_of,
    metrics::{AttemptRecord, MetricsRecorder},
    policy::{next_step, Backoff, Step},
    CascadeError, CascadeResult, Endpoint, FetchOptions, Payload, Result,
};

#[derive(Clone)]
/// Cascading-fallback fetcher.
///
/// Cheap to clone; clones share the HTTP connection pool and the metrics
/// recorder.
pub struct CascadeClient {
    http: reqwest::Client,
    recorder: Arc<MetricsRecorder>,
}

impl fmt::Debug for CascadeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CascadeClient")
            .field("recorded_metrics", &self.recorder.len())
            .field("metrics_capacity", &self.recorder.capacity())
            .finish()
    }
}

impl Default for CascadeClient {
    fn default() -> Self {
        Self::new()
    }
}

impl CascadeClient {
    /// Creates a client recording into the process-wide recorder.
    pub fn new() -> Self {
        Self::with_http_client(reqwest::Client::new())
    }

    /// Creates a client from a preconfigured `reqwest` client.
    pub fn with_http_client(http: reqwest::Client) -> Self {
        Self {
            http,
            recorder: MetricsRecorder::global(),
        }
    }

    /// Creates a client from a `reqwest` builder, e.g. to set a proxy.
    pub fn from_builder(builder: reqwest::ClientBuilder) -> Result<Self> {
        let http = builder.build().map_err(CascadeError::Client)?;
        Ok(Self::with_http_client(http))
    }

    /// Records attempts into `recorder` instead of the process-wide one.
    pub fn with_recorder(mut self, recorder: Arc<MetricsRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    /// The recorder this client appends attempt metrics to.
    pub fn recorder(&self) -> &Arc<MetricsRecorder> {
        &self.recorder
    }

    /// Fetches one logical value from the first endpoint that yields a
    /// payload accepted by `validate`.
    ///
    /// Endpoints are tried strictly in order, each up to
    /// `options.retries + 1` times. Individual failures never escape; when
    /// every endpoint is exhausted the result has no data, `source` is
    /// `"none"` and `error` is `"All fallbacks failed"`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use cascade_fetch::{CascadeClient, Endpoint, FetchOptions};
    ///
    /// # async fn run() {
    /// let client = CascadeClient::new();
    /// let endpoints = [
    ///     Endpoint::new("https://dns.google/resolve?name=example.com&type=A"),
    ///     Endpoint::new("https://cloudflare-dns.com/dns-query?name=example.com&type=A")
    ///         .with_header("Accept", "application/dns-json"),
    /// ];
    /// let result = client
    ///     .resolve(
    ///         &endpoints,
    ///         |payload| payload.as_json().is_some_and(|json| json["Answer"].is_array()),
    ///         &FetchOptions::default(),
    ///     )
    ///     .await;
    /// println!("{} via {}", result.is_success(), result.source);
    /// # }
    /// ```
    pub async fn resolve<F>(
        &self,
        endpoints: &[Endpoint],
        validate: F,
        options: &FetchOptions,
    ) -> CascadeResult
    where
        F: Fn(&Payload) -> bool,
    {
        let cascade_started = Instant::now();
        let attempts = options.attempts_per_endpoint();
        let backoff = Backoff::new(options.backoff_base_ms, options.backoff_jitter_ms);
        let timeout = Duration::from_millis(options.timeout_ms);
        let mut last_status = 0u16;

        for (index, endpoint) in endpoints.iter().enumerate() {
            let Some(host) = host_of(&endpoint.url) else {
                #[cfg(feature = "tracing")]
                tracing::debug!(index, url = %endpoint.url, "skipping malformed endpoint address");
                continue;
            };

            let method = endpoint
                .method
                .clone()
                .unwrap_or_else(|| options.method.clone());
            let endpoint_started = Instant::now();

            let headers = match attempt::request_headers(&[&options.headers, &endpoint.headers]) {
                Ok(headers) => headers,
                Err(_reason) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(index, %host, reason = %_reason, "endpoint has invalid headers");
                    last_status = 0;
                    self.record(&host, elapsed_ms(endpoint_started), 0, index, &method);
                    continue;
                }
            };

            let request = AttemptRequest {
                url: endpoint.url.as_str(),
                method,
                headers,
                body: endpoint.body.clone().or_else(|| options.body.clone()),
                timeout,
            };

            let mut attempt = 0usize;
            loop {
                let outcome = attempt::execute(&self.http, &request).await;
                let accepted = match &outcome {
                    AttemptOutcome::Success { payload, .. } => validate(payload),
                    _ => false,
                };
                last_status = outcome.status_code();

                match (next_step(&outcome, accepted, attempt, attempts, &backoff), outcome) {
                    (Step::Accept, AttemptOutcome::Success { payload, status, .. }) => {
                        let latency_ms = elapsed_ms(endpoint_started);
                        self.record(&host, latency_ms, status, index, &request.method);

                        #[cfg(feature = "tracing")]
                        tracing::info!(
                            fallback_index = index,
                            %host,
                            attempt,
                            latency_ms,
                            "cascade resolved"
                        );

                        return CascadeResult::success(
                            payload,
                            host,
                            endpoint.url.clone(),
                            index,
                            latency_ms,
                            status,
                        );
                    }
                    (Step::Retry(delay), _outcome) => {
                        #[cfg(feature = "tracing")]
                        tracing::debug!(
                            index,
                            %host,
                            attempt,
                            status = _outcome.status_code(),
                            "retrying endpoint after {} ms",
                            delay.as_millis()
                        );

                        sleep(delay).await;
                        attempt += 1;
                    }
                    (_, outcome) => {
                        #[cfg(feature = "tracing")]
                        tracing::debug!(
                            index,
                            %host,
                            attempt,
                            status = outcome.status_code(),
                            "advancing past endpoint"
                        );

                        let latency_ms = elapsed_ms(endpoint_started);
                        let status = outcome.status_code();
                        self.record(&host, latency_ms, status, index, &request.method);
                        break;
                    }
                }
            }
        }

        #[cfg(feature = "tracing")]
        tracing::warn!(endpoints = endpoints.len(), last_status, "all fallbacks failed");

        CascadeResult::exhausted(elapsed_ms(cascade_started), last_status)
    }

    fn record(
        &self,
        host: &str,
        latency_ms: u64,
        status_code: u16,
        index: usize,
        method: &reqwest::Method,
    ) {
        self.recorder.record_attempt(AttemptRecord {
            endpoint_host: host.to_owned(),
            latency_ms,
            status_code,
            is_fallback: index > 0,
            method: method.as_str().to_owned(),
        });
    }
}

/// Resolves with a lazily built, process-wide default client.
///
/// See [`CascadeClient::resolve`].
pub async fn resolve<F>(
    endpoints: &[Endpoint],
    validate: F,
    options: &FetchOptions,
) -> CascadeResult
where
    F: Fn(&Payload) -> bool,
{
    static DEFAULT: OnceLock<CascadeClient> = OnceLock::new();
    DEFAULT
        .get_or_init(CascadeClient::new)
        .resolve(endpoints, validate, options)
        .await
}
