use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use axum_valid::Valid;

use crate::{
    dto::participant::{ParticipantSummary, RegisterParticipantRequest},
    error::AppError,
    services::group_service,
    state::SharedState,
};

/// Register a display name; the returned id goes into the `X-User-Id` header afterwards.
#[utoipa::path(
    post,
    path = "/participants",
    tag = "participants",
    request_body = RegisterParticipantRequest,
    responses(
        (status = 201, description = "Participant registered", body = ParticipantSummary),
        (status = 400, description = "Invalid name")
    )
)]
pub async fn register_participant(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<RegisterParticipantRequest>>,
) -> Result<(StatusCode, Json<ParticipantSummary>), AppError> {
    let participant = group_service::register_participant(&state, payload.name).await?;
    Ok((StatusCode::CREATED, Json(participant.into())))
}

pub fn router() -> Router<SharedState> {
    Router::new().route("/participants", post(register_participant))
}
