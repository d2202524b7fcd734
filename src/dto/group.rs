//! DTOs for group creation, membership and themes.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{PlaylistRefEntity, ScheduleEntity, ThemeEntity},
    dto::{
        format_timestamp,
        participant::ParticipantSummary,
        validation::{validate_display_name, validate_timezone},
    },
    services::group_service::{GroupDetails, GroupDraft},
};

/// Payload creating a group owned by the acting participant.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateGroupRequest {
    #[validate(
        length(min = 1, max = 100),
        custom(function = "validate_display_name")
    )]
    pub name: String,
    /// Day the weekly round closes, Monday = 0 through Sunday = 6.
    #[validate(range(max = 6))]
    pub weekday: u8,
    #[validate(range(max = 23))]
    pub hour: u8,
    #[validate(range(max = 59))]
    pub minute: u8,
    /// IANA timezone; the configured default applies when omitted.
    #[serde(default)]
    #[validate(custom(function = "validate_timezone"))]
    pub timezone: Option<String>,
}

impl From<CreateGroupRequest> for GroupDraft {
    fn from(request: CreateGroupRequest) -> Self {
        Self {
            name: request.name,
            weekday: request.weekday,
            hour: request.hour,
            minute: request.minute,
            timezone: request.timezone,
        }
    }
}

/// Theme to attach to the next round of a group.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ThemeRequest {
    #[validate(length(min = 1, max = 100), custom(function = "validate_display_name"))]
    pub theme: String,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub description: String,
}

impl From<ThemeRequest> for ThemeEntity {
    fn from(request: ThemeRequest) -> Self {
        Self {
            theme: request.theme,
            description: request.description,
        }
    }
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ThemeSummary {
    pub theme: String,
    pub description: String,
}

impl From<ThemeEntity> for ThemeSummary {
    fn from(theme: ThemeEntity) -> Self {
        Self {
            theme: theme.theme,
            description: theme.description,
        }
    }
}

/// Weekly close schedule as exposed to clients.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ScheduleSummary {
    pub weekday: u8,
    pub hour: u8,
    pub minute: u8,
    pub timezone: String,
}

impl From<ScheduleEntity> for ScheduleSummary {
    fn from(schedule: ScheduleEntity) -> Self {
        Self {
            weekday: schedule.weekday,
            hour: schedule.hour,
            minute: schedule.minute,
            timezone: schedule.timezone,
        }
    }
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct PlaylistSummary {
    pub id: String,
    pub link: String,
}

impl From<PlaylistRefEntity> for PlaylistSummary {
    fn from(playlist: PlaylistRefEntity) -> Self {
        Self {
            id: playlist.id,
            link: playlist.link,
        }
    }
}

/// Group settings with its members in join order.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct GroupSummary {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    pub schedule: ScheduleSummary,
    pub pending_theme: Option<ThemeSummary>,
    pub master_playlist: PlaylistSummary,
    pub best_of_playlist: PlaylistSummary,
    pub created_at: String,
    pub members: Vec<ParticipantSummary>,
}

impl From<GroupDetails> for GroupSummary {
    fn from(details: GroupDetails) -> Self {
        let GroupDetails { group, roster } = details;
        Self {
            id: group.id,
            name: group.name,
            owner_id: group.owner_id,
            schedule: group.schedule.into(),
            pending_theme: group.pending_theme.map(Into::into),
            master_playlist: group.master_playlist.into(),
            best_of_playlist: group.best_of_playlist.into(),
            created_at: format_timestamp(group.created_at),
            members: roster.into_iter().map(Into::into).collect(),
        }
    }
}
