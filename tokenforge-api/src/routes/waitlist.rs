/// Waitlist signup
///
/// ```text
/// POST /waitlist
/// { "email": "someone@example.com" }
/// ```
///
/// `201` on a new signup, `200` when the address is already listed.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    extract::ApiJson,
};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tokenforge_shared::models::waitlist::{JoinOutcome, WaitlistEntry};
use validator::Validate;

/// Waitlist request
#[derive(Debug, Deserialize, Validate)]
pub struct WaitlistRequest {
    #[validate(email(message = "A valid email is required."))]
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct WaitlistResponse {
    pub message: String,
}

pub async fn join(
    State(state): State<AppState>,
    ApiJson(mut req): ApiJson<WaitlistRequest>,
) -> ApiResult<(StatusCode, Json<WaitlistResponse>)> {
    req.email = req.email.trim().to_string();

    req.validate().map_err(|e| {
        let errors: Vec<ValidationErrorDetail> = e
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        ApiError::ValidationError(errors)
    })?;

    let (status, message) = match WaitlistEntry::join(&state.db, &req.email).await? {
        JoinOutcome::Joined => {
            tracing::info!("Waitlist signup");
            (
                StatusCode::CREATED,
                "Successfully joined the waitlist! We will be in touch.",
            )
        }
        JoinOutcome::AlreadyListed => (StatusCode::OK, "You are already on the waitlist!"),
    };

    Ok((
        status,
        Json(WaitlistResponse {
            message: message.to_string(),
        }),
    ))
}
