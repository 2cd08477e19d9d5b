//! HTTP boundary: `POST /calculate` with a JSON envelope.

use std::future::Future;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, ConnectInfo, Request},
    http::{Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::calc_engine::{evaluate, CalcError};
use crate::config::Config;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalculateRequest {
    #[serde(default)]
    pub expression: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: u16,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculateResponse {
    pub result: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

/// An error envelope ready to be sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub title: &'static str,
    pub description: &'static str,
}

impl ApiError {
    pub const fn new(status: StatusCode, title: &'static str, description: &'static str) -> Self {
        ApiError {
            status,
            title,
            description,
        }
    }

    fn method_not_allowed() -> Self {
        Self::new(
            StatusCode::METHOD_NOT_ALLOWED,
            "Method Not Allowed",
            "Only POST method is supported",
        )
    }

    fn invalid_request(description: &'static str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Invalid Request", description)
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        debug!(%rejection, "rejecting unreadable body");
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::new(
                StatusCode::PAYLOAD_TOO_LARGE,
                "Invalid Request",
                "Request body is too large",
            )
        } else {
            Self::invalid_request("Failed to read request body")
        }
    }
}

impl From<CalcError> for ApiError {
    fn from(err: CalcError) -> Self {
        match err {
            CalcError::InvalidExpression => Self::new(
                StatusCode::BAD_REQUEST,
                "Invalid Expression",
                "The expression format is invalid",
            ),
            CalcError::InvalidCharacter => Self::new(
                StatusCode::BAD_REQUEST,
                "Invalid Character",
                "The expression contains invalid characters",
            ),
            CalcError::MismatchedParens => Self::new(
                StatusCode::BAD_REQUEST,
                "Invalid Parentheses",
                "The expression has mismatched parentheses",
            ),
            CalcError::InvalidOperator => Self::new(
                StatusCode::BAD_REQUEST,
                "Invalid Operator",
                "The expression contains an invalid operator",
            ),
            CalcError::DivisionByZero => Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "Division by Zero",
                "Cannot divide by zero",
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(
            error = self.title,
            description = self.description,
            code = self.status.as_u16(),
            "request failed"
        );

        let body = CalculateResponse {
            result: 0.0,
            error: Some(ErrorBody {
                error: self.title.to_string(),
                code: self.status.as_u16(),
                description: self.description.to_string(),
            }),
        };
        (self.status, Json(body)).into_response()
    }
}

pub fn router() -> Router {
    Router::new()
        .route("/calculate", any(calculate))
        .layer(middleware::from_fn(log_request))
}

async fn log_request(request: Request, next: Next) -> Response {
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    info!(
        method = %request.method(),
        path = request.uri().path(),
        remote_addr = ?remote_addr,
        "request"
    );
    next.run(request).await
}

async fn calculate(
    method: Method,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<CalculateResponse>, ApiError> {
    if method != Method::POST {
        return Err(ApiError::method_not_allowed());
    }
    let body = body?;

    let request: CalculateRequest = serde_json::from_slice(&body).map_err(|err| {
        debug!(%err, "rejecting undecodable body");
        ApiError::invalid_request("Failed to parse JSON request")
    })?;

    if request.expression.is_empty() {
        return Err(ApiError::invalid_request("Expression is required"));
    }

    let result = evaluate(&request.expression)?;
    info!(expression = %request.expression, result, "calculated result");

    Ok(Json(CalculateResponse { result, error: None }))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "cannot listen for ctrl-c, running until killed");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

/// Binds to the configured port and serves until ctrl-c.
pub async fn run(config: &Config) -> Result<()> {
    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    serve(listener, shutdown_signal()).await
}

/// Serves the router on `listener` until `shutdown` resolves, then lets
/// in-flight requests finish.
pub async fn serve<F>(listener: TcpListener, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!(address = %listener.local_addr()?, "starting server");

    axum::serve(
        listener,
        router().into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
    .context("server error")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::header::CONTENT_TYPE;
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    async fn send(method: Method, body: impl Into<Body>) -> (StatusCode, Option<String>, CalculateResponse) {
        let request = axum::http::Request::builder()
            .method(method)
            .uri("/calculate")
            .header(CONTENT_TYPE, "application/json")
            .body(body.into())
            .unwrap();

        let response = router().oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let parsed = serde_json::from_slice(&bytes).unwrap();
        (status, content_type, parsed)
    }

    async fn post_expression(expression: &str) -> (StatusCode, CalculateResponse) {
        let body = serde_json::to_vec(&CalculateRequest {
            expression: expression.to_string(),
        })
        .unwrap();
        let (status, _, response) = send(Method::POST, body).await;
        (status, response)
    }

    fn assert_error(status: StatusCode, response: &CalculateResponse, code: StatusCode, title: &str) {
        assert_eq!(status, code);
        let error = response.error.as_ref().expect("error envelope");
        assert_eq!(error.error, title);
        assert_eq!(error.code, code.as_u16());
        assert!(!error.description.is_empty());
    }

    #[tokio::test]
    async fn simple_expression() {
        let (status, content_type, response) =
            send(Method::POST, r#"{"expression":"2+2"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("application/json"));
        assert_eq!(response, CalculateResponse { result: 4.0, error: None });
    }

    #[tokio::test]
    async fn complex_expression() {
        let (status, response) = post_expression("(2 + 3) * 4").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response.result, 20.0);
    }

    #[tokio::test]
    async fn negative_zero_product() {
        let (status, response) = post_expression("88 * -0.0").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response.result, 0.0);
        assert_eq!(response.error, None);
    }

    #[tokio::test]
    async fn wrong_method() {
        let (status, _, response) = send(Method::GET, Body::empty()).await;
        assert_error(status, &response, StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
    }

    #[tokio::test]
    async fn empty_body() {
        let (status, _, response) = send(Method::POST, Body::empty()).await;
        assert_error(status, &response, StatusCode::BAD_REQUEST, "Invalid Request");
    }

    #[tokio::test]
    async fn malformed_json() {
        let (status, _, response) = send(Method::POST, "invalid json").await;
        assert_error(status, &response, StatusCode::BAD_REQUEST, "Invalid Request");
        assert_eq!(
            response.error.map(|e| e.description),
            Some("Failed to parse JSON request".to_string())
        );
    }

    #[tokio::test]
    async fn empty_expression() {
        let (status, response) = post_expression("").await;
        assert_error(status, &response, StatusCode::BAD_REQUEST, "Invalid Request");

        let (status, _, response) = send(Method::POST, "{}").await;
        assert_error(status, &response, StatusCode::BAD_REQUEST, "Invalid Request");
        assert_eq!(
            response.error.map(|e| e.description),
            Some("Expression is required".to_string())
        );
    }

    #[tokio::test]
    async fn evaluation_errors() {
        let cases = [
            ("1/0", StatusCode::UNPROCESSABLE_ENTITY, "Division by Zero"),
            ("2++2", StatusCode::BAD_REQUEST, "Invalid Expression"),
            ("(2+2", StatusCode::BAD_REQUEST, "Invalid Parentheses"),
            ("2$2", StatusCode::BAD_REQUEST, "Invalid Character"),
        ];
        for (expression, code, title) in cases {
            let (status, response) = post_expression(expression).await;
            assert_error(status, &response, code, title);
            assert_eq!(response.result, 0.0);
        }
    }

    #[tokio::test]
    async fn oversized_body_still_gets_an_envelope() {
        let expression = "1+".repeat(1_100_000) + "1";
        let body = serde_json::to_vec(&CalculateRequest { expression }).unwrap();
        let (status, content_type, response) = send(Method::POST, body).await;

        assert_eq!(content_type.as_deref(), Some("application/json"));
        assert_error(status, &response, StatusCode::PAYLOAD_TOO_LARGE, "Invalid Request");
    }

    #[tokio::test]
    async fn serves_over_tcp_until_shutdown() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpStream;
        use tokio::sync::oneshot;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();
        let server = tokio::spawn(serve(listener, async move {
            let _ = stopped.await;
        }));

        let body = r#"{"expression":"2+2"}"#;
        let request = format!(
            "POST /calculate HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
        assert!(response.to_lowercase().contains("content-type: application/json"));
        assert!(response.ends_with(r#"{"result":4.0}"#), "{response}");

        stop.send(()).unwrap();
        server.await.unwrap().unwrap();
    }

    #[test]
    fn every_error_kind_has_an_envelope() {
        let invalid_operator = ApiError::from(CalcError::InvalidOperator);
        assert_eq!(invalid_operator.status, StatusCode::BAD_REQUEST);
        assert_eq!(invalid_operator.title, "Invalid Operator");
    }

    #[test]
    fn empty_description_is_omitted() {
        let body = ErrorBody {
            error: "Test Error".to_string(),
            code: 400,
            description: String::new(),
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"error":"Test Error","code":400}"#);
    }

    #[test]
    fn success_omits_error_field() {
        let json = serde_json::to_string(&CalculateResponse { result: 10.5, error: None }).unwrap();
        assert_eq!(json, r#"{"result":10.5}"#);
    }
}
