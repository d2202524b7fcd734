use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::SubmissionEntity,
    dto::{format_timestamp, validation::validate_track_id},
    services::submission_service::SubmissionDraft,
};

/// A guess pairing a survey song with the participant believed to have submitted it.
#[derive(Debug, Deserialize, ToSchema)]
pub struct GuessInput {
    pub song_id: Uuid,
    pub participant_id: Uuid,
}

/// Weekly entry: a song for next week plus votes and guesses on this week's survey.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SubmissionRequest {
    #[validate(custom(function = "validate_track_id"))]
    pub track_id: String,
    /// Exactly two survey songs, omitted for the first week.
    #[serde(default)]
    pub votes: Vec<Uuid>,
    #[serde(default)]
    pub guesses: Vec<GuessInput>,
}

impl From<SubmissionRequest> for SubmissionDraft {
    fn from(request: SubmissionRequest) -> Self {
        Self {
            track_id: request.track_id,
            votes: request.votes,
            guesses: request
                .guesses
                .into_iter()
                .map(|guess| (guess.song_id, guess.participant_id))
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmittedSong {
    pub id: Uuid,
    pub name: String,
    pub track_id: String,
}

/// Stored submission, returned to its author.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubmissionSummary {
    pub id: Uuid,
    pub round_number: u32,
    pub song: SubmittedSong,
    pub votes: Vec<Uuid>,
    pub correct_guesses: u32,
    pub submitted_at: String,
}

impl From<SubmissionEntity> for SubmissionSummary {
    fn from(submission: SubmissionEntity) -> Self {
        Self {
            id: submission.id,
            round_number: submission.round_number,
            song: SubmittedSong {
                id: submission.song.id,
                name: submission.song.name,
                track_id: submission.song.track_id,
            },
            votes: submission.votes,
            correct_guesses: submission.correct_guesses,
            submitted_at: format_timestamp(submission.submitted_at),
        }
    }
}
