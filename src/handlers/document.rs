//! Document CRUD handlers: read, get all, create, update, delete.
//!
//! Every handler resolves its [`Target`], delegates to [`CrudService`](crate::service::CrudService), commits staged
//! mutations, and maps repository failures to a status code per verb.

use crate::error::{AppError, RepositoryError};
use crate::extractors::Target;
use crate::response::{no_content, success_many, success_one};
use crate::service::RequestValidator;
use axum::{
    body::Bytes,
    extract::Path,
    http::{header, HeaderMap, StatusCode},
    response::Response,
};
use serde_json::{Map, Value};

pub const DOCUMENT_DOES_NOT_EXIST: &str = "Document does not exist";

/// Any read failure is a bad request.
fn read_failure(e: RepositoryError) -> AppError {
    AppError::BadRequest(e.to_string())
}

/// Create: conflicts map to 409, everything else to 400.
fn create_failure(e: RepositoryError) -> AppError {
    match e {
        RepositoryError::Conflict(m) => AppError::Conflict(m),
        other => AppError::BadRequest(other.to_string()),
    }
}

/// Update and delete: a missing document maps to 404, everything else to 400.
fn write_failure(e: RepositoryError) -> AppError {
    match e {
        RepositoryError::NotFound(m) => AppError::NotFound(m),
        other => AppError::BadRequest(other.to_string()),
    }
}

fn json_body(headers: &HeaderMap, body: &Bytes) -> Result<Map<String, Value>, AppError> {
    if let Some(content_type) = headers.get(header::CONTENT_TYPE) {
        let ct = content_type.to_str().unwrap_or("").to_ascii_lowercase();
        if !ct.contains("json") {
            return Err(AppError::UnsupportedMediaType(format!(
                "unsupported request content type '{}'; send JSON",
                ct
            )));
        }
    }
    RequestValidator::parse_body(body)
}

/// GET|HEAD /{endpoint}/{id}
pub async fn read(target: Target, Path(id): Path<String>) -> Response {
    tracing::debug!(method = %target.method, version = %target.version, endpoint = %target.endpoint.name, id = %id, "read");
    match target.crud().read(&id).await {
        Ok(Some(doc)) => success_one(target.format, StatusCode::OK, doc),
        Ok(None) => AppError::NotFound(DOCUMENT_DOES_NOT_EXIST.into()).render(target.format),
        Err(e) => read_failure(e).render(target.format),
    }
}

/// GET /{endpoint}: every document, only when the endpoint allows it.
pub async fn read_all(target: Target) -> Response {
    if !target.endpoint.allow_get_all {
        return AppError::BadRequest(format!(
            "fetching all documents is not allowed for endpoint '{}'",
            target.endpoint.name
        ))
        .render(target.format);
    }
    tracing::debug!(version = %target.version, endpoint = %target.endpoint.name, "read all");
    match target.crud().read_all().await {
        Ok(docs) => success_many(target.format, docs),
        Err(e) => read_failure(e).render(target.format),
    }
}

/// POST /{endpoint}
pub async fn create(target: Target, headers: HeaderMap, body: Bytes) -> Response {
    let format = target.format;
    match create_document(target, None, &headers, &body).await {
        Ok(resp) => resp,
        Err(e) => e.render(format),
    }
}

/// POST /{endpoint}/{id}: the path id becomes the document `_id`.
pub async fn create_with_id(target: Target, Path(id): Path<String>, headers: HeaderMap, body: Bytes) -> Response {
    let format = target.format;
    match create_document(target, Some(id), &headers, &body).await {
        Ok(resp) => resp,
        Err(e) => e.render(format),
    }
}

async fn create_document(
    target: Target,
    id: Option<String>,
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<Response, AppError> {
    let mut data = json_body(headers, body)?;
    RequestValidator::validate(&data, &target.endpoint)?;
    if let Some(id) = id.filter(|s| !s.is_empty()) {
        data.insert("_id".into(), Value::String(id));
    }

    let mut crud = target.crud();
    crud.create(data).map_err(create_failure)?;
    let response = crud.commit().await.map_err(create_failure)?;

    let id = response
        .items
        .first()
        .map(|item| item.id.clone())
        .ok_or_else(|| AppError::BadRequest("commit returned no items".into()))?;
    tracing::debug!(version = %target.version, endpoint = %target.endpoint.name, id = %id, "created");
    let doc = crud
        .read(&id)
        .await
        .map_err(read_failure)?
        .ok_or_else(|| AppError::NotFound(DOCUMENT_DOES_NOT_EXIST.into()))?;
    Ok(success_one(target.format, StatusCode::CREATED, doc))
}

/// PUT|PATCH /{endpoint}/{id}: partial update, 204 on success.
pub async fn update(target: Target, Path(id): Path<String>, headers: HeaderMap, body: Bytes) -> Response {
    match update_document(&target, &id, &headers, &body).await {
        Ok(()) => {
            tracing::debug!(method = %target.method, version = %target.version, endpoint = %target.endpoint.name, id = %id, "updated");
            no_content()
        }
        Err(e) => e.render(target.format),
    }
}

async fn update_document(target: &Target, id: &str, headers: &HeaderMap, body: &Bytes) -> Result<(), AppError> {
    let data = json_body(headers, body)?;
    RequestValidator::validate(&data, &target.endpoint)?;
    let mut crud = target.crud();
    crud.update(id, data).map_err(write_failure)?;
    crud.commit().await.map_err(write_failure)?;
    Ok(())
}

/// DELETE /{endpoint}/{id}: 204 with an empty body.
pub async fn delete(target: Target, Path(id): Path<String>) -> Response {
    let mut crud = target.crud();
    let result = match crud.delete(&id) {
        Ok(()) => crud.commit().await.map(|_| ()),
        Err(e) => Err(e),
    };
    match result {
        Ok(()) => {
            tracing::debug!(version = %target.version, endpoint = %target.endpoint.name, id = %id, "deleted");
            no_content()
        }
        Err(e) => write_failure(e).render(target.format),
    }
}
