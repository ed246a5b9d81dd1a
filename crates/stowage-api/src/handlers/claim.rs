//! Claim endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use stowage_core::{ClaimedFile, NewClaimedFile};

use crate::error::ApiError;
use crate::state::AppState;

/// Claim an uploaded object for a registered kind.
///
/// Image kinds get their resize task dispatched before the response is
/// returned; the stored object may still be the original for a moment.
#[tracing::instrument(
    skip(state, new),
    fields(file_name = %new.file_name, kind = %new.kind, operation = "claim_file")
)]
pub async fn claim_file(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewClaimedFile>,
) -> Result<(StatusCode, Json<ClaimedFile>), ApiError> {
    let record = state.claims.claim(new).await?;
    Ok((StatusCode::CREATED, Json(record)))
}
