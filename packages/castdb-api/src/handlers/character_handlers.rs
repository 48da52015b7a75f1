//! Character CRUD endpoint handlers.

use hyper::{body::Bytes, Request, Response};
use tokio::task;

use crate::router::{AppState, RouterError};

use super::request_utils::{
    build_response, map_store_error, parse_body_object, parse_id_param,
    read_request_body_with_timeout, MatchitParams,
};
use super::response::success_response;

/// Welcome message for the root route.
///
/// # Endpoint
/// `GET /`
pub async fn home(
    _req: Request<hyper::body::Incoming>,
    _params: MatchitParams<'_, '_>,
    _state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let api_response = success_response("Character table API over a CSV backing file");
    let json = serde_json::to_vec(&api_response)
        .map_err(|e| RouterError::InternalError(format!("Failed to serialize response: {}", e)))?;

    build_response(200, json)
}

/// Reads a single character.
///
/// # Endpoint
/// `GET /characters/{id}`
///
/// # Response
/// - **200 OK**: the character as a JSON object
///
/// # Errors
/// - **400 Bad Request**: non-integer id
/// - **404 Not Found**: no character with that id
///
/// # Example
/// ```bash
/// curl http://localhost:5002/characters/1
/// ```
pub async fn get_character(
    _req: Request<hyper::body::Incoming>,
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let id = parse_id_param(&params)?;

    let record = state.store.get_by_id(id).map_err(map_store_error)?;

    let api_response = success_response(record);
    let json = serde_json::to_vec(&api_response)
        .map_err(|e| RouterError::InternalError(format!("Failed to serialize response: {}", e)))?;

    build_response(200, json)
}

/// Creates a new character.
///
/// # Endpoint
/// `POST /characters`
///
/// # Request Body
/// A JSON object covering every column except `id`, which is assigned
/// by the store:
/// ```json
/// {
///   "first_name": "Monica",
///   "last_name": "Geller"
/// }
/// ```
///
/// # Response
/// - **201 Created**: the new character, including its assigned id
///
/// # Errors
/// - **400 Bad Request**: missing body, unknown or missing fields
/// - **500 Internal Server Error**: write-back failure (the insert is
///   rolled back)
pub async fn create_character(
    req: Request<hyper::body::Incoming>,
    _params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let body = read_request_body_with_timeout(req, state.config.request_timeout_ms).await?;
    let fields = parse_body_object(&body)?;

    // The mutation writes the backing file; keep it off the async executor.
    let store = state.store.clone();
    let record = task::spawn_blocking(move || store.insert(&fields))
        .await
        .map_err(|e| RouterError::InternalError(format!("Store task failed: {}", e)))?
        .map_err(map_store_error)?;

    let api_response = success_response(record);
    let json = serde_json::to_vec(&api_response)
        .map_err(|e| RouterError::InternalError(format!("Failed to serialize response: {}", e)))?;

    build_response(201, json)
}

/// Updates fields of an existing character.
///
/// # Endpoint
/// `PUT /characters/{id}`
///
/// # Request Body
/// A JSON object with the fields to overwrite. An `id` key is ignored;
/// the identity is immutable.
///
/// # Response
/// - **200 OK**: the updated character
///
/// # Errors
/// - **400 Bad Request**: missing body or non-integer id
/// - **404 Not Found**: no character with that id
pub async fn update_character(
    req: Request<hyper::body::Incoming>,
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let id = parse_id_param(&params)?;

    let body = read_request_body_with_timeout(req, state.config.request_timeout_ms).await?;
    let fields = parse_body_object(&body)?;

    let store = state.store.clone();
    let record = task::spawn_blocking(move || store.update(id, &fields))
        .await
        .map_err(|e| RouterError::InternalError(format!("Store task failed: {}", e)))?
        .map_err(map_store_error)?;

    let api_response = success_response(record);
    let json = serde_json::to_vec(&api_response)
        .map_err(|e| RouterError::InternalError(format!("Failed to serialize response: {}", e)))?;

    build_response(200, json)
}

/// Deletes a character.
///
/// # Endpoint
/// `DELETE /characters/{id}`
///
/// # Response
/// - **200 OK**: confirmation message
///
/// # Errors
/// - **400 Bad Request**: non-integer id
/// - **404 Not Found**: no character with that id
pub async fn delete_character(
    _req: Request<hyper::body::Incoming>,
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let id = parse_id_param(&params)?;

    let store = state.store.clone();
    task::spawn_blocking(move || store.delete(id))
        .await
        .map_err(|e| RouterError::InternalError(format!("Store task failed: {}", e)))?
        .map_err(map_store_error)?;

    let api_response = success_response(serde_json::json!({ "message": "Character deleted" }));
    let json = serde_json::to_vec(&api_response)
        .map_err(|e| RouterError::InternalError(format!("Failed to serialize response: {}", e)))?;

    build_response(200, json)
}
