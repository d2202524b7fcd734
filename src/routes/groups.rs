use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::group::{CreateGroupRequest, GroupSummary, ThemeRequest},
    error::AppError,
    routes::identity::ActingUser,
    services::{group_service, theme},
    state::SharedState,
};

/// Group management endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/groups", post(create_group))
        .route("/groups/{id}", get(get_group))
        .route("/groups/{id}/members", post(join_group))
        .route("/groups/{id}/theme", put(set_theme))
}

/// Create a group owned by the acting participant, with its playlists.
#[utoipa::path(
    post,
    path = "/groups",
    tag = "groups",
    params(("X-User-Id" = String, Header, description = "Id of the acting participant")),
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created", body = GroupSummary),
        (status = 400, description = "Invalid schedule or timezone"),
        (status = 503, description = "Storage or music service unavailable")
    )
)]
pub async fn create_group(
    State(state): State<SharedState>,
    ActingUser(user): ActingUser,
    Valid(Json(payload)): Valid<Json<CreateGroupRequest>>,
) -> Result<(StatusCode, Json<GroupSummary>), AppError> {
    let details = group_service::create_group(&state, user, payload.into()).await?;
    Ok((StatusCode::CREATED, Json(details.into())))
}

/// Retrieve a group with its members.
#[utoipa::path(
    get,
    path = "/groups/{id}",
    tag = "groups",
    params(
        ("X-User-Id" = String, Header, description = "Id of the acting participant"),
        ("id" = Uuid, Path, description = "Identifier of the group")
    ),
    responses(
        (status = 200, description = "Group", body = GroupSummary),
        (status = 401, description = "Not a member of the group"),
        (status = 404, description = "Unknown group")
    )
)]
pub async fn get_group(
    State(state): State<SharedState>,
    ActingUser(user): ActingUser,
    Path(id): Path<Uuid>,
) -> Result<Json<GroupSummary>, AppError> {
    Ok(Json(group_service::get_group(&state, id, user).await?.into()))
}

/// Join a group as the acting participant. Joining twice changes nothing.
#[utoipa::path(
    post,
    path = "/groups/{id}/members",
    tag = "groups",
    params(
        ("X-User-Id" = String, Header, description = "Id of the acting participant"),
        ("id" = Uuid, Path, description = "Identifier of the group")
    ),
    responses(
        (status = 200, description = "Membership recorded", body = GroupSummary),
        (status = 404, description = "Unknown group or participant")
    )
)]
pub async fn join_group(
    State(state): State<SharedState>,
    ActingUser(user): ActingUser,
    Path(id): Path<Uuid>,
) -> Result<Json<GroupSummary>, AppError> {
    Ok(Json(group_service::join_group(&state, id, user).await?.into()))
}

/// Set the theme applied to the next round of the group. Owner only.
#[utoipa::path(
    put,
    path = "/groups/{id}/theme",
    tag = "groups",
    params(
        ("X-User-Id" = String, Header, description = "Id of the group owner"),
        ("id" = Uuid, Path, description = "Identifier of the group")
    ),
    request_body = ThemeRequest,
    responses(
        (status = 200, description = "Pending theme stored", body = GroupSummary),
        (status = 401, description = "Acting participant is not the owner")
    )
)]
pub async fn set_theme(
    State(state): State<SharedState>,
    ActingUser(user): ActingUser,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<ThemeRequest>>,
) -> Result<Json<GroupSummary>, AppError> {
    theme::set_pending(&state, id, user, payload.into()).await?;
    Ok(Json(group_service::get_group(&state, id, user).await?.into()))
}
