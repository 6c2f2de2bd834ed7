use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue};
use metrics::{counter, histogram};
use reqwest::Url;
use tracing::instrument;

use crate::handler::errors::ProxyError;
use crate::handler::upstream;
use crate::metrics::consts as crate_metrics;

/// A successful upstream fetch: the buffered body and the content type the
/// origin reported, if any.
pub(crate) struct FetchedImage {
    pub(crate) body: Bytes,
    pub(crate) content_type: Option<String>,
}

/// Fetches the target with impersonation headers, retrying failed attempts
/// with linearly increasing backoff. An attempt counts as successful only on
/// a 2xx status; non-2xx statuses and transport errors are both retried.
/// Issues at most [`upstream::FETCH_ATTEMPTS`] upstream calls.
#[instrument(skip_all, fields(%target))]
pub(crate) async fn fetch(
    http_client: &reqwest::Client,
    target: &Url,
    referer: &str,
) -> Result<FetchedImage, ProxyError> {
    let headers = impersonation_headers(referer)?;

    let mut last_error = None;
    for attempt in 0..upstream::FETCH_ATTEMPTS {
        let attempt_start = Instant::now();
        let result = http_client
            .get(target.clone())
            .headers(headers.clone())
            .send()
            .await;
        counter!(crate_metrics::UPSTREAM_FETCH_ATTEMPTS).increment(1);
        histogram!(crate_metrics::UPSTREAM_REQUEST_DURATION_SECS)
            .record(attempt_start.elapsed().as_secs_f64());

        match result {
            Ok(response) if response.status().is_success() => {
                let content_type = response
                    .headers()
                    .get(header::CONTENT_TYPE)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string);
                // A body read failure after a 2xx is not retried: the
                // attempt already succeeded, so this is an internal fault.
                let body = response
                    .bytes()
                    .await
                    .map_err(|error| ProxyError::Internal(error.into()))?;
                return Ok(FetchedImage { body, content_type });
            }
            Ok(response) => {
                let status = response.status().as_u16();
                tracing::warn!(attempt, status, "Upstream returned non-success");
                last_error = Some(format!("Upstream {status}"));
            }
            Err(error) => {
                tracing::warn!(attempt, %error, "Upstream request failed");
                last_error = Some(error.to_string());
            }
        }

        if attempt + 1 < upstream::FETCH_ATTEMPTS {
            tokio::time::sleep(backoff_delay(attempt)).await;
        }
    }

    counter!(crate_metrics::UPSTREAM_FETCH_EXHAUSTED).increment(1);
    Err(ProxyError::UpstreamUnavailable(
        last_error.unwrap_or_else(|| "Upstream error".to_string()),
    ))
}

/// 500ms after the first failed attempt, 1000ms after the second.
fn backoff_delay(attempt: usize) -> Duration {
    upstream::BACKOFF_STEP + upstream::BACKOFF_STEP * attempt as u32
}

fn impersonation_headers(referer: &str) -> Result<HeaderMap, ProxyError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::USER_AGENT,
        HeaderValue::from_static(upstream::IMPERSONATION_USER_AGENT),
    );
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(upstream::IMPERSONATION_ACCEPT),
    );
    headers.insert(
        header::REFERER,
        HeaderValue::from_str(referer)
            .map_err(|error| ProxyError::Internal(error.into()))?,
    );
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    async fn spawn_upstream(router: Router) -> Result<SocketAddr> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            axum::serve(listener, router.into_make_service())
                .await
                .unwrap();
        });
        Ok(addr)
    }

    fn counting_router(
        hits: Arc<AtomicUsize>,
        responder: fn(usize) -> (StatusCode, &'static str),
    ) -> Router {
        Router::new().route(
            "/img.png",
            get(move || {
                let hits = hits.clone();
                async move {
                    let attempt = hits.fetch_add(1, Ordering::SeqCst);
                    responder(attempt)
                }
            }),
        )
    }

    #[test]
    fn backoff_increases_linearly() {
        assert_eq!(backoff_delay(0), Duration::from_millis(500));
        assert_eq!(backoff_delay(1), Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn always_failing_upstream_gets_exactly_three_attempts() -> Result<()>
    {
        let hits = Arc::new(AtomicUsize::new(0));
        let router =
            counting_router(hits.clone(), |_| (StatusCode::NOT_FOUND, ""));
        let addr = spawn_upstream(router).await?;

        let target = Url::parse(&format!("http://{addr}/img.png"))?;
        let outcome = fetch(
            &reqwest::Client::new(),
            &target,
            upstream::DEFAULT_REFERER,
        )
        .await;

        assert_eq!(hits.load(Ordering::SeqCst), 3);
        match outcome {
            Err(ProxyError::UpstreamUnavailable(message)) => {
                assert_eq!(message, "Upstream 404")
            }
            _ => panic!("expected UpstreamUnavailable"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn transport_errors_are_retried_with_their_message() -> Result<()> {
        // Bind then drop a listener so the port is known to refuse
        // connections.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        drop(listener);

        let target = Url::parse(&format!("http://{addr}/img.png"))?;
        let started = Instant::now();
        let outcome = fetch(
            &reqwest::Client::new(),
            &target,
            upstream::DEFAULT_REFERER,
        )
        .await;

        // Both inter-attempt backoffs ran, so all three attempts were made.
        assert!(started.elapsed() >= Duration::from_millis(1400));
        match outcome {
            Err(ProxyError::UpstreamUnavailable(message)) => {
                assert!(message.contains("error sending request"));
                assert!(!message.starts_with("Upstream "));
            }
            _ => panic!("expected UpstreamUnavailable"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn third_attempt_success_is_relayed() -> Result<()> {
        let hits = Arc::new(AtomicUsize::new(0));
        let router = counting_router(hits.clone(), |attempt| {
            if attempt < 2 {
                (StatusCode::INTERNAL_SERVER_ERROR, "")
            } else {
                (StatusCode::OK, "image-bytes")
            }
        });
        let addr = spawn_upstream(router).await?;

        let target = Url::parse(&format!("http://{addr}/img.png"))?;
        let fetched = fetch(
            &reqwest::Client::new(),
            &target,
            upstream::DEFAULT_REFERER,
        )
        .await
        .map_err(|error| anyhow::Error::msg(error.to_string()))?;

        assert_eq!(hits.load(Ordering::SeqCst), 3);
        assert_eq!(&fetched.body[..], b"image-bytes");
        Ok(())
    }

    #[tokio::test]
    async fn first_attempt_success_stops_retrying() -> Result<()> {
        let hits = Arc::new(AtomicUsize::new(0));
        let router =
            counting_router(hits.clone(), |_| (StatusCode::OK, "payload"));
        let addr = spawn_upstream(router).await?;

        let target = Url::parse(&format!("http://{addr}/img.png"))?;
        let fetched = fetch(
            &reqwest::Client::new(),
            &target,
            upstream::DEFAULT_REFERER,
        )
        .await
        .map_err(|error| anyhow::Error::msg(error.to_string()))?;

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(&fetched.body[..], b"payload");
        Ok(())
    }

    #[tokio::test]
    async fn impersonation_headers_reach_the_upstream() -> Result<()> {
        let router = Router::new().route(
            "/img.png",
            get(|headers: HeaderMap| async move {
                let referer = headers
                    .get(header::REFERER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                let user_agent = headers
                    .get(header::USER_AGENT)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                format!("{referer}|{user_agent}")
            }),
        );
        let addr = spawn_upstream(router).await?;

        let target = Url::parse(&format!("http://{addr}/img.png"))?;
        let fetched = fetch(
            &reqwest::Client::new(),
            &target,
            "https://referer.example.com/",
        )
        .await
        .map_err(|error| anyhow::Error::msg(error.to_string()))?;

        let echoed = String::from_utf8(fetched.body.to_vec())?;
        let (referer, user_agent) =
            echoed.split_once('|').expect("echoed headers");
        assert_eq!(referer, "https://referer.example.com/");
        assert_eq!(user_agent, upstream::IMPERSONATION_USER_AGENT);
        Ok(())
    }
}
