//! `/metrics` endpoint for Prometheus scraping.
//!
//! Served on its own task until the shutdown token fires. Moderation does not
//! depend on it: a failed bind only turns metrics off.

use axum::Router;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

async fn scrape() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
        crate::metrics::gather_metrics(),
    )
}

fn router() -> Router {
    Router::new().route("/metrics", get(scrape))
}

/// Serve metrics on `0.0.0.0:port` until `shutdown` is cancelled.
pub async fn serve_metrics(port: u16, shutdown: CancellationToken) {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    match TcpListener::bind(addr).await {
        Ok(listener) => serve(listener, shutdown).await,
        Err(e) => error!(%addr, error = %e, "Metrics endpoint disabled: bind failed"),
    }
}

async fn serve(listener: TcpListener, shutdown: CancellationToken) {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Metrics endpoint listening");
    }
    if let Err(e) = axum::serve(listener, router())
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
    {
        error!(error = %e, "Metrics endpoint failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn fetch(addr: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_scrape_returns_text_exposition() {
        crate::metrics::init();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = CancellationToken::new();
        let server = tokio::spawn(serve(listener, shutdown.clone()));

        let response = fetch(addr, "/metrics").await;
        assert!(response.starts_with("HTTP/1.1 200"), "{response}");
        assert!(response.contains("text/plain"));
        assert!(response.contains("warden_forbidden_words_total"));

        let missing = fetch(addr, "/").await;
        assert!(missing.starts_with("HTTP/1.1 404"), "{missing}");

        shutdown.cancel();
        server.await.unwrap();
    }
}
