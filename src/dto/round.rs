use serde::Serialize;
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::{RoundEntity, SurveyEntity},
    dto::{format_timestamp, group::ThemeSummary},
    services::round_service::RoundOutcome,
};

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct SurveySong {
    pub id: Uuid,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct SurveyParticipant {
    pub id: Uuid,
    pub name: String,
    pub matched: bool,
}

/// Anonymized songs and participants to vote on and match.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct SurveySummary {
    pub songs: Vec<SurveySong>,
    pub participants: Vec<SurveyParticipant>,
}

impl From<SurveyEntity> for SurveySummary {
    fn from(survey: SurveyEntity) -> Self {
        Self {
            songs: survey
                .songs
                .into_iter()
                .map(|song| SurveySong {
                    id: song.id,
                    name: song.name,
                })
                .collect(),
            participants: survey
                .participants
                .into_iter()
                .map(|participant| SurveyParticipant {
                    id: participant.id,
                    name: participant.name,
                    matched: participant.matched,
                })
                .collect(),
        }
    }
}

/// Public projection of a round.
#[skip_serializing_none]
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct RoundSummary {
    pub id: String,
    pub number: u32,
    /// RFC 3339 instant after which the round may close.
    pub close_at: String,
    pub playlist_link: Option<String>,
    pub survey: Option<SurveySummary>,
    pub theme: Option<ThemeSummary>,
}

impl From<RoundEntity> for RoundSummary {
    fn from(round: RoundEntity) -> Self {
        Self {
            id: round.id,
            number: round.number,
            close_at: format_timestamp(round.close_at),
            playlist_link: round.playlist_link,
            survey: round.survey.map(Into::into),
            theme: round.theme.map(Into::into),
        }
    }
}

/// Current round of a group, as seen by the acting participant.
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CurrentRoundResponse {
    /// The round accepts submissions.
    Open {
        round: RoundSummary,
        submitted: bool,
    },
    /// The round is past due and waits on the participation gate.
    Blocked {
        round: RoundSummary,
        submitted: bool,
        reason_code: String,
        message: String,
        missing_participants: Vec<String>,
    },
}

impl From<RoundOutcome> for CurrentRoundResponse {
    fn from(outcome: RoundOutcome) -> Self {
        match outcome {
            RoundOutcome::Current { round, submitted } => Self::Open {
                round: round.into(),
                submitted,
            },
            RoundOutcome::Blocked {
                round,
                submitted,
                reason_code,
                message,
                missing_participants,
            } => Self::Blocked {
                round: round.into(),
                submitted,
                reason_code: reason_code.to_owned(),
                message,
                missing_participants,
            },
        }
    }
}
