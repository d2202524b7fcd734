use indexmap::IndexMap;
use serde::Serialize;
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::ResultsEntity,
    dto::{format_timestamp, group::ThemeSummary},
};

/// Votes received by one song.
#[derive(Debug, Serialize, ToSchema)]
pub struct SongTally {
    pub name: String,
    pub votes: Vec<String>,
    pub submitter: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GuessSummary {
    pub song: String,
    pub submitter_guess: String,
    pub correct: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GuessingSummary {
    pub participant_id: Uuid,
    pub name: String,
    pub guesses: Vec<GuessSummary>,
    pub correct_guesses: u32,
}

/// Outcome of a closed round.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct ResultsSummary {
    pub round_number: u32,
    pub first_place: Vec<String>,
    pub second_place: Vec<String>,
    /// Song tallies keyed by song id, in survey order.
    #[schema(value_type = Object)]
    pub songs: IndexMap<Uuid, SongTally>,
    /// Best guessers first.
    pub guessing: Vec<GuessingSummary>,
    pub theme: Option<ThemeSummary>,
    pub created_at: String,
}

impl From<ResultsEntity> for ResultsSummary {
    fn from(results: ResultsEntity) -> Self {
        Self {
            round_number: results.round_number,
            first_place: results.first_place,
            second_place: results.second_place,
            songs: results
                .songs
                .into_iter()
                .map(|song| {
                    (
                        song.song_id,
                        SongTally {
                            name: song.name,
                            votes: song.voters,
                            submitter: song.submitter,
                        },
                    )
                })
                .collect(),
            guessing: results
                .guessing
                .into_iter()
                .map(|entry| GuessingSummary {
                    participant_id: entry.participant_id,
                    name: entry.name,
                    guesses: entry
                        .guesses
                        .into_iter()
                        .map(|guess| GuessSummary {
                            song: guess.song,
                            submitter_guess: guess.submitter_guess,
                            correct: guess.correct,
                        })
                        .collect(),
                    correct_guesses: entry.correct_guesses,
                })
                .collect(),
            theme: results.theme.map(Into::into),
            created_at: format_timestamp(results.created_at),
        }
    }
}
