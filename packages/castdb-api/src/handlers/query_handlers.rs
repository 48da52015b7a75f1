//! Listing and search endpoint handlers.

use hyper::{body::Bytes, Request, Response};

use crate::router::{AppState, RouterError};

use super::request_utils::{
    build_response, map_store_error, parse_page_params, parse_search_terms, MatchitParams,
};
use super::response::success_response;

/// Lists characters one page at a time.
///
/// # Endpoint
/// `GET /characters`
///
/// # Query Parameters
/// - `page`: 1-based page number (default 1)
/// - `limit`: records per page (default from configuration)
///
/// # Response
/// - **200 OK**: pagination envelope
/// ```json
/// {
///   "page": 1,
///   "limit": 10,
///   "total_pages": 3,
///   "total_records": 25,
///   "data": [ { "id": 1, "first_name": "Ross", "last_name": "Geller" } ]
/// }
/// ```
/// A page past the end of the table returns an empty `data` array.
///
/// # Errors
/// - **400 Bad Request**: non-numeric or zero `page`/`limit`
/// - **500 Internal Server Error**: store has no data loaded
///
/// # Example
/// ```bash
/// curl "http://localhost:5002/characters?page=2&limit=10"
/// ```
pub async fn list_characters(
    req: Request<hyper::body::Incoming>,
    _params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let query = parse_page_params(req.uri().query())?;
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(state.config.default_page_size);

    let listing = state.store.paginate(page, limit).map_err(map_store_error)?;

    let api_response = success_response(listing);
    let json = serde_json::to_vec(&api_response)
        .map_err(|e| RouterError::InternalError(format!("Failed to serialize response: {}", e)))?;

    build_response(200, json)
}

/// Searches characters by name.
///
/// # Endpoint
/// `GET /characters/search`
///
/// # Query Parameters
/// - `first_name`: exact, case-insensitive match on the first name
/// - `last_name`: exact, case-insensitive match on the last name
///
/// Supplied terms combine with OR; at least one is required.
///
/// # Response
/// - **200 OK**: array of matching characters
///
/// # Errors
/// - **400 Bad Request**: neither term supplied
/// - **404 Not Found**: no character matched
///
/// # Example
/// ```bash
/// curl "http://localhost:5002/characters/search?first_name=Ross"
/// ```
pub async fn search_characters(
    req: Request<hyper::body::Incoming>,
    _params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let terms = parse_search_terms(req.uri().query());

    let matches = state.store.search(&terms).map_err(map_store_error)?;

    let api_response = success_response(matches);
    let json = serde_json::to_vec(&api_response)
        .map_err(|e| RouterError::InternalError(format!("Failed to serialize response: {}", e)))?;

    build_response(200, json)
}
