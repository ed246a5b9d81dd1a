//! Private file delivery.
//!
//! Serves object bytes through the server for non-public containers.
//! Public containers are refused here; their objects are addressed by
//! URL. Authorization is the caller's concern, layered in front of this
//! route.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use stowage_core::file_types;

use crate::error::ApiError;
use crate::state::AppState;

#[tracing::instrument(
    skip_all,
    fields(container = %container_name, file_name = %file_name, operation = "fetch_file")
)]
pub async fn fetch_file(
    State(state): State<Arc<AppState>>,
    Path((container_name, file_name)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let bucket = state
        .buckets
        .get(&container_name)
        .map_err(|_| ApiError::NotFound(format!("no container named '{container_name}'")))?;

    if bucket.is_public() {
        return Err(ApiError::BadRequest(format!(
            "container '{container_name}' is public; fetch the object by its URL instead"
        )));
    }

    let media_type = file_types::media_type_for_file_name(&file_name)?;
    let bytes = bucket
        .read_bytes(&file_name)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no object named '{file_name}'")))?;

    Ok(([(header::CONTENT_TYPE, media_type)], bytes))
}
