//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, body limits,
//! probes, and handing request bodies to the data source.

use crate::config::AppState;
use crate::datasource::{to_wire, DataResult, DataSource, Request};
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::{Method, Request as HttpRequest, Response, StatusCode};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

pub const DISPATCH_PATH: &str = "/";
pub const LIVENESS_PATH: &str = "/healthz";
pub const READINESS_PATH: &str = "/readyz";

/// `Allow` value for the dispatch endpoint
pub const DISPATCH_METHODS: &str = "POST, OPTIONS";
/// `Allow` value for the health probes
pub const PROBE_METHODS: &str = "GET, HEAD, OPTIONS";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: HttpRequest<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let started = Instant::now();
    let mut entry = AccessLogEntry::new(
        peer_addr.to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );

    let response = route_request(req, &state, &mut entry).await;
    let response = http::with_cors(response, state.config.http.enable_cors);

    if state.cached_access_log.load(Ordering::Relaxed) {
        entry.status = response.status().as_u16();
        entry.body_bytes = usize::try_from(response.body().size_hint().exact().unwrap_or(0))
            .unwrap_or(usize::MAX);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Route request based on method and path
async fn route_request<B>(
    req: HttpRequest<B>,
    state: &Arc<AppState>,
    entry: &mut AccessLogEntry,
) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let path = req.uri().path();
    let Some(allowed) = allowed_methods(path) else {
        return http::build_404_response();
    };

    match (req.method(), path) {
        (&Method::OPTIONS, _) => {
            http::build_options_response(allowed, state.config.http.enable_cors)
        }
        (&Method::GET | &Method::HEAD, LIVENESS_PATH) => {
            http::build_text_response(StatusCode::OK, "ok")
        }
        (&Method::GET | &Method::HEAD, READINESS_PATH) => readiness(&state.datasource),
        (&Method::POST, DISPATCH_PATH) => handle_dispatch(req, state, entry).await,
        _ => {
            logger::log_warning(&format!("Method not allowed: {} {path}", req.method()));
            http::build_405_response(allowed)
        }
    }
}

/// Methods accepted on `path`, or `None` for an unknown path
fn allowed_methods(path: &str) -> Option<&'static str> {
    match path {
        DISPATCH_PATH => Some(DISPATCH_METHODS),
        LIVENESS_PATH | READINESS_PATH => Some(PROBE_METHODS),
        _ => None,
    }
}

fn readiness(datasource: &DataSource) -> Response<Full<Bytes>> {
    match datasource.failure() {
        None => http::build_text_response(StatusCode::OK, "ok"),
        Some(reason) => http::build_text_response(StatusCode::SERVICE_UNAVAILABLE, reason),
    }
}

/// Read the request body and run it through the data source
async fn handle_dispatch<B>(
    req: HttpRequest<B>,
    state: &Arc<AppState>,
    entry: &mut AccessLogEntry,
) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let max_body_size = state.config.http.max_body_size;
    if let Some(resp) = check_body_size(&req, max_body_size) {
        return resp;
    }

    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    let body = match Limited::new(req.into_body(), limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.is::<LengthLimitError>() => {
            logger::log_error(&format!("Request body exceeded {max_body_size} bytes"));
            return http::build_413_response();
        }
        Err(e) => {
            logger::log_error(&format!("Failed to read request body: {e}"));
            return http::build_400_response("Failed to read request body");
        }
    };

    let datasource = Arc::clone(&state.datasource);
    let dispatched = tokio::task::spawn_blocking(move || dispatch_body(&datasource, &body)).await;
    let (request_type, result) = match dispatched {
        Ok(outcome) => outcome,
        Err(e) => {
            logger::log_error(&format!("Dispatch task failed: {e}"));
            return http::build_text_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "500 Internal Server Error",
            );
        }
    };

    entry.request_type = request_type;
    entry.result_type = Some(result.tag().to_string());
    http::build_json_response(to_wire(&result), &state.config.http.server_name)
}

/// Decode and dispatch one request body
///
/// Returns the request type as sent (for the access log) with the result.
fn dispatch_body(datasource: &DataSource, body: &[u8]) -> (Option<String>, DataResult) {
    let parsed = std::str::from_utf8(body)
        .map_err(|e| format!("Invalid request: body is not valid UTF-8: {e}"))
        .and_then(|text| Request::parse(text).map_err(|e| e.to_string()));

    match parsed {
        Ok(request) => {
            let result = datasource.dispatch(&request);
            (request.kind, result)
        }
        Err(message) => {
            let message = datasource.failure().map_or(message, ToString::to_string);
            (None, DataResult::Error(message))
        }
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size<B>(req: &HttpRequest<B>, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::datasource::{from_wire, DataResult};
    use crate::index::MemoryIndex;

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    fn test_state(datasource: DataSource, max_body_size: u64) -> Arc<AppState> {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::load_from(&dir.path().join("none").to_string_lossy()).unwrap();
        config.http.max_body_size = max_body_size;
        config.logging.access_log = false;
        Arc::new(AppState::new(config, datasource))
    }

    fn ready_state(dir: &std::path::Path) -> Arc<AppState> {
        std::fs::write(dir.join("a.xml"), "<a/>").unwrap();
        let index = MemoryIndex::from_entries([("a", dir.join("a.xml"))]).unwrap();
        test_state(DataSource::new(index, "meta"), 1024)
    }

    async fn send(
        state: &Arc<AppState>,
        method: Method,
        path: &str,
        body: &str,
    ) -> (StatusCode, String) {
        let req = HttpRequest::builder()
            .method(method)
            .uri(path)
            .body(Full::new(Bytes::from(body.to_owned())))
            .unwrap();
        let response = handle_request(req, Arc::clone(state), peer()).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_post_dispatches() {
        let dir = tempfile::tempdir().unwrap();
        let state = ready_state(dir.path());

        let (status, body) = send(&state, Method::POST, "/", r#"{"type":"get","key":"a"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            from_wire(&body).unwrap(),
            DataResult::Document {
                content_type: crate::datasource::ContentType::Xml,
                text: "<a/>".to_string()
            }
        );

        let (_, body) = send(&state, Method::POST, "/", r#"{"type":"get-metadata"}"#).await;
        assert_eq!(from_wire(&body).unwrap(), DataResult::Metadata("meta".into()));
    }

    #[tokio::test]
    async fn test_errors_are_tagged_results() {
        let dir = tempfile::tempdir().unwrap();
        let state = ready_state(dir.path());

        let (status, body) = send(&state, Method::POST, "/", "{broken").await;
        assert_eq!(status, StatusCode::OK);
        assert!(from_wire(&body).unwrap().is_error());

        let (_, body) = send(&state, Method::POST, "/", r#"{"type":"bogus"}"#).await;
        assert_eq!(
            from_wire(&body).unwrap(),
            DataResult::error("Unsupported operation: bogus")
        );
    }

    #[tokio::test]
    async fn test_failed_service() {
        let state = test_state(DataSource::failed("index down", "meta"), 1024);

        let (status, body) = send(&state, Method::POST, "/", "{broken").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(from_wire(&body).unwrap(), DataResult::error("index down"));

        let (status, body) = send(&state, Method::GET, READINESS_PATH, "").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, "index down");

        let (status, _) = send(&state, Method::GET, LIVENESS_PATH, "").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_probes_and_protocol_errors() {
        let dir = tempfile::tempdir().unwrap();
        let state = ready_state(dir.path());

        assert_eq!(send(&state, Method::GET, READINESS_PATH, "").await.0, StatusCode::OK);
        assert_eq!(
            send(&state, Method::GET, "/", "").await.0,
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            send(&state, Method::POST, "/other", "{}").await.0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            send(&state, Method::OPTIONS, "/", "").await.0,
            StatusCode::NO_CONTENT
        );
    }

    #[tokio::test]
    async fn test_allow_header_matches_path() {
        let dir = tempfile::tempdir().unwrap();
        let state = ready_state(dir.path());

        let cases = [
            (Method::GET, DISPATCH_PATH, StatusCode::METHOD_NOT_ALLOWED, DISPATCH_METHODS),
            (Method::POST, LIVENESS_PATH, StatusCode::METHOD_NOT_ALLOWED, PROBE_METHODS),
            (Method::DELETE, READINESS_PATH, StatusCode::METHOD_NOT_ALLOWED, PROBE_METHODS),
            (Method::OPTIONS, DISPATCH_PATH, StatusCode::NO_CONTENT, DISPATCH_METHODS),
            (Method::OPTIONS, LIVENESS_PATH, StatusCode::NO_CONTENT, PROBE_METHODS),
        ];
        for (method, path, status, allow) in cases {
            let req = HttpRequest::builder()
                .method(method)
                .uri(path)
                .body(Full::new(Bytes::new()))
                .unwrap();
            let response = handle_request(req, Arc::clone(&state), peer()).await.unwrap();
            assert_eq!(response.status(), status);
            assert_eq!(response.headers()["allow"], allow);
        }

        let (status, _) = send(&state, Method::OPTIONS, "/other", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_body_limit() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        let index = MemoryIndex::from_entries([("a", dir.path().join("a.txt"))]).unwrap();
        let state = test_state(DataSource::new(index, "meta"), 16);

        let body = format!(r#"{{"type":"get","key":"{}"}}"#, "k".repeat(64));
        let (status, _) = send(&state, Method::POST, "/", &body).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

        let req = HttpRequest::builder()
            .method(Method::POST)
            .uri("/")
            .header("content-length", "4096")
            .body(Full::new(Bytes::from_static(b"{}")))
            .unwrap();
        let response = handle_request(req, Arc::clone(&state), peer()).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_dispatch_body_reports_request_type() {
        let source = DataSource::new(MemoryIndex::new(), "meta");
        let (kind, result) = dispatch_body(&source, br#"{"type":"size"}"#);
        assert_eq!(kind.as_deref(), Some("size"));
        assert_eq!(result, DataResult::Size(0));

        let (kind, result) = dispatch_body(&source, &[0xff, 0xfe]);
        assert!(kind.is_none());
        assert!(result.error_message().unwrap().contains("UTF-8"));
    }
}
