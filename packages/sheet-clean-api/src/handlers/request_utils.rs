//! Request utilities for HTTP endpoints.

use http_body_util::BodyExt;
use hyper::body::{Body, Bytes};
use hyper::{Request, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::time;

use crate::router::RouterError;

use super::response::success_response;

/// Reads the whole request body, failing with `Timeout` after `timeout_ms`.
pub async fn read_request_body_with_timeout<B>(
    req: Request<B>,
    timeout_ms: u64,
) -> Result<Bytes, RouterError>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let timeout_duration = time::Duration::from_millis(timeout_ms);
    let body = time::timeout(timeout_duration, req.into_body().collect())
        .await
        .map_err(|_| RouterError::Timeout)?
        .map_err(|e| RouterError::InternalError(format!("Failed to read request body: {}", e)))?;
    Ok(body.to_bytes())
}

/// Decodes a JSON request body. An empty body is a bad request.
pub fn parse_json_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, RouterError> {
    if body.is_empty() {
        return Err(RouterError::BadRequest("Request body is empty".to_string()));
    }
    serde_json::from_slice(body)
        .map_err(|e| RouterError::BadRequest(format!("Invalid JSON body: {}", e)))
}

/// Helper to build HTTP response with proper error handling
pub fn build_response(status: u16, json: Vec<u8>) -> Result<Response<Bytes>, RouterError> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Bytes::from(json))
        .map_err(|e| RouterError::InternalError(format!("Failed to build response: {}", e)))
}

/// Wraps `data` in a success envelope and builds a 200 response.
pub fn json_ok<T: Serialize>(data: T) -> Result<Response<Bytes>, RouterError> {
    let json = serde_json::to_vec(&success_response(data))
        .map_err(|e| RouterError::InternalError(format!("Failed to serialize response: {}", e)))?;
    build_response(200, json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;
    use serde_json::Value;

    #[tokio::test]
    async fn test_read_body() {
        let req = Request::new(Full::new(Bytes::from_static(b"{\"a\":1}")));
        let body = read_request_body_with_timeout(req, 100).await.unwrap();
        let value: Value = parse_json_body(&body).unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn test_parse_json_body_errors() {
        assert!(matches!(
            parse_json_body::<Value>(&Bytes::new()),
            Err(RouterError::BadRequest(_))
        ));
        assert!(matches!(
            parse_json_body::<Value>(&Bytes::from_static(b"{nope")),
            Err(RouterError::BadRequest(_))
        ));
    }
}
