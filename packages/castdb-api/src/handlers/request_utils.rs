//! Request utilities for HTTP endpoints.

use http_body_util::BodyExt;
use hyper::{body::Bytes, Request, Response};
use percent_encoding::percent_decode_str;
use tokio::time;

use crate::router::RouterError;
use castdb_core::query::SearchTerms;
use castdb_core::StoreError;

/// Type alias for matchit parameters with explicit lifetimes
pub type MatchitParams<'a, 'b> = matchit::Params<'a, 'b>;

/// Pagination query parameters, before defaults are applied.
#[derive(Debug, Default, PartialEq)]
pub struct PageParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

/// Helper function to read request body with timeout
pub async fn read_request_body_with_timeout(
    req: Request<hyper::body::Incoming>,
    timeout_ms: u64,
) -> Result<Bytes, RouterError> {
    let timeout_duration = time::Duration::from_millis(timeout_ms);
    let body = time::timeout(timeout_duration, req.collect())
        .await
        .map_err(|_| RouterError::Timeout)?
        .map_err(|e| RouterError::InternalError(format!("Failed to read request body: {}", e)))?;
    Ok(body.to_bytes())
}

/// Parses the `{id}` path parameter.
pub fn parse_id_param(params: &MatchitParams<'_, '_>) -> Result<i64, RouterError> {
    let raw = params.get("id").unwrap_or("0");
    raw.parse()
        .map_err(|e| RouterError::BadRequest(format!("Invalid character id '{}': {}", raw, e)))
}

/// Parses the request body as a JSON object, rejecting empty bodies.
pub fn parse_body_object(
    body: &Bytes,
) -> Result<serde_json::Map<String, serde_json::Value>, RouterError> {
    if body.is_empty() {
        return Err(RouterError::BadRequest("request body required".to_string()));
    }
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| RouterError::BadRequest(format!("Failed to parse request: {}", e)))?;
    match value {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err(RouterError::BadRequest(
            "request body must be a JSON object".to_string(),
        )),
    }
}

/// Parse pagination parameters from a URL query string.
pub fn parse_page_params(query_str: Option<&str>) -> Result<PageParams, RouterError> {
    let mut params = PageParams::default();
    let Some(query_str) = query_str else {
        return Ok(params);
    };

    for pair in query_str.split('&') {
        let Some((key, encoded)) = pair.split_once('=') else {
            continue;
        };
        let value = percent_decode_str(encoded).decode_utf8_lossy();
        match key {
            "page" => {
                params.page = Some(value.parse().map_err(|e| {
                    RouterError::BadRequest(format!("Invalid page value '{}': {}", value, e))
                })?);
            }
            "limit" => {
                params.limit = Some(value.parse().map_err(|e| {
                    RouterError::BadRequest(format!("Invalid limit value '{}': {}", value, e))
                })?);
            }
            // Unknown parameters are ignored
            _ => {}
        }
    }

    Ok(params)
}

/// Parse search terms from a URL query string.
pub fn parse_search_terms(query_str: Option<&str>) -> SearchTerms {
    let mut terms = SearchTerms::default();
    if let Some(query_str) = query_str {
        for pair in query_str.split('&') {
            let Some((key, encoded)) = pair.split_once('=') else {
                continue;
            };
            let value = percent_decode_str(encoded).decode_utf8_lossy().to_string();
            match key {
                "first_name" => terms.first_name = Some(value),
                "last_name" => terms.last_name = Some(value),
                _ => {}
            }
        }
    }
    terms
}

/// Map StoreError to the appropriate RouterError
pub fn map_store_error(e: StoreError) -> RouterError {
    match e {
        StoreError::RecordNotFound { .. } | StoreError::NoMatches => {
            RouterError::NotFound(e.to_string())
        }
        StoreError::MissingSearchTerm
        | StoreError::InvalidPagination { .. }
        | StoreError::UnknownField { .. }
        | StoreError::MissingField { .. }
        | StoreError::UnsupportedValue { .. } => RouterError::BadRequest(e.to_string()),
        _ => RouterError::InternalError(e.to_string()),
    }
}

/// Helper to build an HTTP response with proper error handling
pub fn build_response(status: u16, json: Vec<u8>) -> Result<Response<Bytes>, RouterError> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Bytes::from(json))
        .map_err(|e| RouterError::InternalError(format!("Failed to build response: {}", e)))
}
