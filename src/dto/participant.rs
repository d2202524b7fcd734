use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{dao::models::ParticipantEntity, dto::validation::validate_display_name};

/// Payload registering a new participant.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RegisterParticipantRequest {
    /// Display name shown to the other members of a group.
    #[validate(
        length(min = 1, max = 64),
        custom(function = "validate_display_name")
    )]
    pub name: String,
}

/// Public projection of a participant.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ParticipantSummary {
    pub id: Uuid,
    pub name: String,
}

impl From<ParticipantEntity> for ParticipantSummary {
    fn from(participant: ParticipantEntity) -> Self {
        Self {
            id: participant.id,
            name: participant.name,
        }
    }
}
