//! Single request/response exchange with a bounded timeout.

use std::time::Duration;

use anyhow::{Context, Result};
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Method, Request, StatusCode, Uri};
use tokio::time::timeout;

use super::client::HyperClient;

/// Fully buffered response.
#[derive(Debug)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

/// Sends one request and buffers the whole response body.
///
/// `timeout_duration` bounds both the exchange and the body read.
pub async fn send(
    client: &HyperClient,
    method: Method,
    uri: Uri,
    headers: &[(&str, &str)],
    body: Option<Bytes>,
    timeout_duration: Duration,
) -> Result<HttpResponse> {
    let uri_str = uri.to_string();

    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    if body.is_some() {
        builder = builder.header(hyper::header::CONTENT_TYPE, "application/json");
    }
    let req = builder
        .body(Full::new(body.unwrap_or_default()))
        .with_context(|| format!("failed to build request for {}", uri_str))?;

    let exchange = async {
        let response = client
            .request(req)
            .await
            .with_context(|| format!("request to {} failed", uri_str))?;
        let (parts, incoming) = response.into_parts();
        let body = incoming
            .collect()
            .await
            .with_context(|| format!("failed to read response body from {}", uri_str))?
            .to_bytes();
        Ok::<_, anyhow::Error>(HttpResponse {
            status: parts.status,
            body,
        })
    };

    match timeout(timeout_duration, exchange).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                component = "http",
                event = "request_timeout",
                uri = %uri_str,
                timeout = ?timeout_duration,
                "request timed out"
            );
            Err(anyhow::anyhow!(
                "request to {} timed out after {:?}",
                uri_str,
                timeout_duration
            ))
        }
    }
}
