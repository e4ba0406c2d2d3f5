//! Outbound HTTP for the court portal.
//!
//! `Transport` is the seam the router fetches through; `HttpClient` is the
//! reqwest implementation. The portal has no documented API and turns away
//! clients that do not look like a browser, so requests carry browser-style
//! headers with our client identifier appended to the user agent.
//!
//! No retries happen here. A failed fetch is reported once and the router
//! moves on to its next strategy.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};

use crate::types::{CourtError, CourtResult};

const BROWSER_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                          AppleWebKit/537.36 (KHTML, like Gecko) \
                          Chrome/131.0.0.0 Safari/537.36";

/// Response from an HTTP GET request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Requested URL, query string included.
    pub url: String,
    /// Final URL after redirects.
    pub final_url: String,
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Something that can GET a page.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url` with `query` appended, giving up after `timeout`.
    ///
    /// Non-2xx responses are returned as `Ok`; only transport-level failures
    /// (connect, reset, timeout, unreadable body) are errors.
    async fn get(
        &self,
        url: &str,
        query: &[(String, String)],
        timeout: Duration,
    ) -> CourtResult<HttpResponse>;
}

/// reqwest-backed transport.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    /// HTTP/1.1-only fallback client for hosts that reject HTTP/2.
    h1_client: reqwest::Client,
}

impl HttpClient {
    /// Create a client whose user agent ends with `client_id`.
    pub fn new(client_id: &str, timeout: Duration) -> Self {
        let ua = format!("{BROWSER_UA} {client_id}");

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(ua.clone())
            .default_headers(headers.clone())
            .build()
            .unwrap_or_default();

        let h1_client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(ua)
            .default_headers(headers)
            .http1_only()
            .build()
            .unwrap_or_default();

        Self { client, h1_client }
    }

    async fn get_inner(
        &self,
        client: &reqwest::Client,
        url: &str,
        query: &[(String, String)],
        timeout: Duration,
    ) -> Result<HttpResponse, reqwest::Error> {
        let resp = client.get(url).query(query).timeout(timeout).send().await?;
        let status = resp.status().as_u16();
        let final_url = resp.url().to_string();
        let body = resp.text().await?;

        Ok(HttpResponse {
            url: url.to_string(),
            final_url,
            status,
            body,
        })
    }
}

#[async_trait]
impl Transport for HttpClient {
    /// Falls back to HTTP/1.1 on protocol errors (some court CDNs reject HTTP/2).
    async fn get(
        &self,
        url: &str,
        query: &[(String, String)],
        timeout: Duration,
    ) -> CourtResult<HttpResponse> {
        let result = match self.get_inner(&self.client, url, query, timeout).await {
            Ok(resp) => Ok(resp),
            Err(e) => {
                let err_str = format!("{e}");
                if !e.is_timeout()
                    && (err_str.contains("http2")
                        || err_str.contains("protocol")
                        || err_str.contains("connection closed"))
                {
                    tracing::debug!("retrying {url} over HTTP/1.1 after: {err_str}");
                    self.get_inner(&self.h1_client, url, query, timeout).await
                } else {
                    Err(e)
                }
            }
        };

        result.map_err(|e| CourtError::TransientNetwork {
            endpoint: url.to_string(),
            message: if e.is_timeout() {
                format!("timed out after {}ms", timeout.as_millis())
            } else {
                e.to_string()
            },
        })
    }
}
