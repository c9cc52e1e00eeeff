use http::Extensions;
use reqwest::{Client, Request, Response};
use reqwest_middleware::{
    ClientBuilder, ClientWithMiddleware, Middleware, Next, Result as MwResult,
};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::config::Retry;

const BODY_PREVIEW_CHARS: usize = 200;

/// Attempts made for one call. Shared across retries through the request extensions
/// and copied onto the final response.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AttemptCount(pub u32);

/// Number of attempts behind `resp`, 1 when retries are disabled.
pub fn attempts(resp: &Response) -> u32 {
    resp.extensions().get::<AttemptCount>().map_or(1, |c| c.0)
}

/// Counts retry attempts. Sits inside the retry layer so every retry passes through it.
struct AttemptLogger;

#[async_trait::async_trait]
impl Middleware for AttemptLogger {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> MwResult<Response> {
        let attempt = match extensions.get_mut::<AttemptCount>() {
            Some(c) => {
                c.0 += 1;
                c.0
            }
            None => {
                extensions.insert(AttemptCount(1));
                1
            }
        };

        if attempt > 1 {
            info!("↻ attempt #{attempt} {} {}", req.method(), req.url());
        }
        let mut res = next.run(req, extensions).await;
        if let Ok(resp) = res.as_mut() {
            resp.extensions_mut().insert(AttemptCount(attempt));
        }
        res
    }
}

/// Verbose request/response lines. Never alters the response.
struct VerboseLogger;

#[async_trait::async_trait]
impl Middleware for VerboseLogger {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> MwResult<Response> {
        let method = req.method().clone();
        let url = req.url().clone();
        info!("→ {method} {url}");
        if let Some(bytes) = req.body().and_then(|b| b.as_bytes()) {
            let text = String::from_utf8_lossy(bytes);
            let preview: String = text.chars().take(BODY_PREVIEW_CHARS).collect();
            info!("  Body: {preview}...");
        }

        let t0 = Instant::now();
        let res = next.run(req, extensions).await;

        match &res {
            Ok(resp) => {
                let n = attempts(resp);
                info!(
                    "← {} ({}ms){}",
                    resp.status().as_u16(),
                    t0.elapsed().as_millis(),
                    if n > 1 { format!(" after {n} attempts") } else { String::new() }
                )
            }
            Err(err) => warn!(
                "✖ {method} {url} failed after {}ms: {err}",
                t0.elapsed().as_millis()
            ),
        }
        res
    }
}

/// Wrap a plain reqwest client with the logging and retry layers the config asks for.
pub fn build_client_with_retry(
    reqwest_client: Client,
    retry: &Retry,
    verbose: bool,
) -> ClientWithMiddleware {
    let mut builder = ClientBuilder::new(reqwest_client);

    if verbose {
        builder = builder.with(VerboseLogger);
    }

    if retry.attempts > 0 {
        let base = Duration::from_millis(retry.delay_ms.max(1));
        let policy = ExponentialBackoff::builder()
            .retry_bounds(base, base * 8)
            .build_with_max_retries(retry.attempts);
        builder = builder
            .with(RetryTransientMiddleware::new_with_policy(policy))
            .with(AttemptLogger);
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn flaky_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200))
            .with_priority(2)
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried_and_counted() {
        let server = flaky_server().await;
        let retry = Retry {
            attempts: 3,
            delay_ms: 1,
        };
        let client = build_client_with_retry(Client::new(), &retry, true);

        let resp = client
            .get(format!("{}/flaky", server.uri()))
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status().as_u16(), 200);
        assert_eq!(attempts(&resp), 3);
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_no_retry_layer_when_disabled() {
        let server = flaky_server().await;
        let retry = Retry {
            attempts: 0,
            delay_ms: 1,
        };
        let client = build_client_with_retry(Client::new(), &retry, false);

        let resp = client
            .get(format!("{}/flaky", server.uri()))
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status().as_u16(), 503);
        assert_eq!(attempts(&resp), 1);
    }
}
