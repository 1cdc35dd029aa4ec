//! Document upload relay endpoint

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use cmon_common::{db, time};
use std::collections::HashMap;
use tracing::debug;

use super::identity::UserId;
use crate::error::{ApiError, ApiResult};
use crate::relay::{RelayReceipt, UploadFile, UploadRequest};
use crate::AppState;

/// POST /api/uploads (multipart/form-data)
///
/// Text fields: `uploadType`, `caseNumber`, `caseId`, `documentType`.
/// File fields: `courtOrder`, `caseStatus` (order bundle) or `file`.
/// A follow-up for a case the caller does not own is 404 and never relayed.
/// Answers 202 once the automation service has accepted the documents; the
/// extracted case and order rows arrive later through `/api/ingest`.
pub async fn upload_documents(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<RelayReceipt>)> {
    let relay = state
        .relay
        .clone()
        .ok_or_else(|| ApiError::Unavailable("no webhook_url configured".to_string()))?;

    let mut text = HashMap::new();
    let mut files = HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("read {} failed: {}", name, e)))?;
                debug!("Upload field {}: {} ({} bytes)", name, file_name, bytes.len());
                files.insert(name, UploadFile::new(file_name, content_type, bytes.to_vec()));
            }
            None => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("read {} failed: {}", name, e)))?;
                text.insert(name, value);
            }
        }
    }

    let request = UploadRequest::from_form(text, files)?;
    if let UploadRequest::FollowUp { case_id, .. } = &request {
        // Follow-ups attach to an existing case, which must be the caller's
        db::get_case(&state.db, user_id, *case_id, time::now()).await?;
    }
    let receipt = relay.send(user_id, request, time::now()).await?;

    Ok((StatusCode::ACCEPTED, Json(receipt)))
}
