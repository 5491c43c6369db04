use std::sync::Arc;

use cascade_fetch::{CascadeClient, Endpoint, FetchOptions, MetricsRecorder, Payload};

fn live_enabled() -> bool {
    std::env::var("CASCADE_FETCH_LIVE")
        .map(|value| matches!(value.trim(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn has_dns_answer(payload: &Payload) -> bool {
    payload
        .as_json()
        .and_then(|json| json.get("Answer"))
        .and_then(|answer| answer.as_array())
        .is_some_and(|records| !records.is_empty())
}

#[tokio::test]
async fn live_dns_over_https_cascade() {
    if !live_enabled() {
        eprintln!("skipping live test: set CASCADE_FETCH_LIVE=1 to run against public resolvers");
        return;
    }

    let recorder = Arc::new(MetricsRecorder::new());
    let client = CascadeClient::new().with_recorder(Arc::clone(&recorder));
    let endpoints = [
        // Reserved TEST-NET address; never answers, so the cascade must fall back.
        Endpoint::new("http://192.0.2.1/resolve?name=example.com&type=A"),
        Endpoint::new("https://dns.google/resolve?name=example.com&type=A"),
        Endpoint::new("https://cloudflare-dns.com/dns-query?name=example.com&type=A")
            .with_header("Accept", "application/dns-json"),
    ];
    let options = FetchOptions {
        timeout_ms: 2_000,
        ..FetchOptions::from_env().expect("CASCADE_FETCH_* env must be valid")
    };

    let result = client.resolve(&endpoints, has_dns_answer, &options).await;

    assert!(result.is_success(), "live cascade failed: {result:?}");
    assert!(result.used_fallback());
    assert_ne!(result.source, "192.0.2.1");

    let metrics = recorder.list();
    assert_eq!(metrics[0].endpoint_host, "192.0.2.1");
    assert_eq!(metrics[0].status_code, 0);
    assert_eq!(
        metrics.len(),
        result.fallback_index.expect("success has an index") + 1
    );
}
