//! HTTP request handlers
//!
//! Maps the `/identify` wire contract onto the reconciliation core and the
//! core's error taxonomy onto status codes.

use axum::{extract::State, http::StatusCode, Json};
use idlink_common::Error;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use super::AppState;
use crate::reconcile::{self, IdentityProjection, Observation};

/// POST /identify request body.
///
/// `phoneNumber` keeps the original wire spelling; at least one field must
/// carry a non-blank value.
#[derive(Debug, Deserialize)]
pub struct IdentifyRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "phoneNumber")]
    pub phone_number: Option<String>,
}

/// Successful response envelope
#[derive(Debug, Serialize)]
pub struct IdentifyResponse {
    pub contact: IdentityProjection,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// POST /identify - Reconcile one contact observation
pub async fn identify(
    State(state): State<AppState>,
    Json(request): Json<IdentifyRequest>,
) -> Result<Json<IdentifyResponse>, (StatusCode, Json<ErrorResponse>)> {
    let observation = Observation::new(request.email, request.phone_number);

    match reconcile::identify(&state.db, &observation).await {
        Ok(contact) => Ok(Json(IdentifyResponse { contact })),
        Err(Error::InvalidInput(msg)) => {
            warn!("Rejected identify request: {}", msg);
            Err((StatusCode::BAD_REQUEST, Json(ErrorResponse { error: msg })))
        }
        Err(e @ Error::Consistency(_)) => {
            // Stored data is corrupt; surface distinctly so operators can
            // investigate, never attempt a silent repair
            error!("Consistency violation during identify: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
        Err(e) => {
            error!("Identify request failed: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
    }
}
