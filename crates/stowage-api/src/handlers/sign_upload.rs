//! Upload authorization.
//!
//! Maps the declared content type to a storage suffix, assigns a random
//! unguessable name, records the pending entry, and returns a signed PUT
//! URL the client uploads to directly. Authorizations nobody follows up
//! on are reclaimed by the never-claimed sweep after its grace period.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stowage_core::{file_types, naming};

use crate::error::ApiError;
use crate::state::AppState;

const UPLOAD_URL_TTL_SECS: u64 = 3600;

#[derive(Debug, Deserialize)]
pub struct SignUploadRequest {
    pub container_name: String,
    pub content_type: String,
}

#[derive(Debug, Serialize)]
pub struct SignUploadResponse {
    pub file_name: String,
    pub upload_url: String,
    pub expires_at: DateTime<Utc>,
}

/// Authorize one direct-to-store upload.
#[tracing::instrument(
    skip(state, request),
    fields(
        container = %request.container_name,
        content_type = %request.content_type,
        operation = "sign_upload"
    )
)]
pub async fn sign_upload(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SignUploadRequest>,
) -> Result<Json<SignUploadResponse>, ApiError> {
    let suffix = file_types::suffix_for_media_type(&request.content_type)?;
    let bucket = state.buckets.get(&request.container_name).map_err(|_| {
        ApiError::NotFound(format!(
            "no container named '{}'",
            request.container_name
        ))
    })?;

    let file_name = naming::random_file_name(suffix);

    // The entry goes in before the URL goes out, so an authorization that
    // never gets used is always visible to the never-claimed sweep.
    state
        .pending
        .record_pending(&file_name, bucket.name())
        .await?;

    let upload_url = bucket
        .signed_put_url(&file_name, Duration::from_secs(UPLOAD_URL_TTL_SECS))
        .await?;
    let expires_at = Utc::now() + chrono::Duration::seconds(UPLOAD_URL_TTL_SECS as i64);

    tracing::info!(
        file_name = %file_name,
        container = %bucket.name(),
        "Issued upload authorization"
    );

    Ok(Json(SignUploadResponse {
        file_name,
        upload_url,
        expires_at,
    }))
}
