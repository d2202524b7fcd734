//! Round endpoints: the current round, weekly submissions and results.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::{
        results::ResultsSummary,
        round::CurrentRoundResponse,
        submission::{SubmissionRequest, SubmissionSummary},
    },
    error::AppError,
    routes::identity::ActingUser,
    services::{group_service, round_service, submission_service},
    state::SharedState,
};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/groups/{id}/rounds/current", get(current_round))
        .route(
            "/groups/{id}/rounds/{number}/submission",
            post(submit),
        )
        .route("/groups/{id}/rounds/{number}/results", get(results))
}

/// Return the current round, closing the previous one first when it is due.
#[utoipa::path(
    get,
    path = "/groups/{id}/rounds/current",
    tag = "rounds",
    params(
        ("X-User-Id" = String, Header, description = "Id of the acting participant"),
        ("id" = Uuid, Path, description = "Identifier of the group")
    ),
    responses(
        (status = 200, description = "Open or blocked current round", body = CurrentRoundResponse),
        (status = 401, description = "Not a member of the group"),
        (status = 503, description = "Storage or music service unavailable, retry later")
    )
)]
pub async fn current_round(
    State(state): State<SharedState>,
    ActingUser(user): ActingUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CurrentRoundResponse>, AppError> {
    let outcome = round_service::current_round(&state, id, user).await?;
    Ok(Json(outcome.into()))
}

/// Submit a song with votes and guesses for the current round. Replaces an earlier entry.
#[utoipa::path(
    post,
    path = "/groups/{id}/rounds/{number}/submission",
    tag = "rounds",
    params(
        ("X-User-Id" = String, Header, description = "Id of the acting participant"),
        ("id" = Uuid, Path, description = "Identifier of the group"),
        ("number" = u32, Path, description = "Number of the current round")
    ),
    request_body = SubmissionRequest,
    responses(
        (status = 200, description = "Submission stored", body = SubmissionSummary),
        (status = 400, description = "Invalid votes or guesses"),
        (status = 409, description = "Round is not the current one")
    )
)]
pub async fn submit(
    State(state): State<SharedState>,
    ActingUser(user): ActingUser,
    Path((id, number)): Path<(Uuid, u32)>,
    Valid(Json(payload)): Valid<Json<SubmissionRequest>>,
) -> Result<Json<SubmissionSummary>, AppError> {
    let submission =
        submission_service::submit(&state, id, number, user, payload.into()).await?;
    Ok(Json(submission.into()))
}

/// Results recorded when the given round closed.
#[utoipa::path(
    get,
    path = "/groups/{id}/rounds/{number}/results",
    tag = "rounds",
    params(
        ("X-User-Id" = String, Header, description = "Id of the acting participant"),
        ("id" = Uuid, Path, description = "Identifier of the group"),
        ("number" = u32, Path, description = "Number of the closed round")
    ),
    responses(
        (status = 200, description = "Results", body = ResultsSummary),
        (status = 404, description = "Round has not closed yet")
    )
)]
pub async fn results(
    State(state): State<SharedState>,
    ActingUser(user): ActingUser,
    Path((id, number)): Path<(Uuid, u32)>,
) -> Result<Json<ResultsSummary>, AppError> {
    let results = group_service::get_results(&state, id, number, user).await?;
    Ok(Json(results.into()))
}
