use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the Song of the Week backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::participants::register_participant,
        crate::routes::groups::create_group,
        crate::routes::groups::get_group,
        crate::routes::groups::join_group,
        crate::routes::groups::set_theme,
        crate::routes::rounds::current_round,
        crate::routes::rounds::submit,
        crate::routes::rounds::results,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::participant::RegisterParticipantRequest,
            crate::dto::participant::ParticipantSummary,
            crate::dto::group::CreateGroupRequest,
            crate::dto::group::ThemeRequest,
            crate::dto::group::GroupSummary,
            crate::dto::round::CurrentRoundResponse,
            crate::dto::round::RoundSummary,
            crate::dto::submission::SubmissionRequest,
            crate::dto::submission::SubmissionSummary,
            crate::dto::results::ResultsSummary,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "participants", description = "Participant registration"),
        (name = "groups", description = "Groups, memberships and themes"),
        (name = "rounds", description = "Weekly rounds, submissions and results"),
    )
)]
pub struct ApiDoc;
