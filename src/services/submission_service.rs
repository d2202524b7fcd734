//! Song submissions, votes and guesses for the current round.

use std::collections::{HashMap, HashSet};

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{
        models::{GuessMatchEntity, RoundEntity, SongEntity, SubmissionEntity, SurveyEntity},
        round_store::RoundStore,
    },
    error::ServiceError,
    services::round_service::{load_group, require_member},
    state::SharedState,
};

const VOTES_PER_SUBMISSION: usize = 2;

/// Entry sent by a participant, before validation and scoring.
#[derive(Debug, Clone, Default)]
pub struct SubmissionDraft {
    /// Track proposed for the next round.
    pub track_id: String,
    /// Survey songs voted for.
    pub votes: Vec<Uuid>,
    /// `(song, participant believed to have submitted it)`.
    pub guesses: Vec<(Uuid, Uuid)>,
}

/// Store the acting participant's entry for round `round_number`, replacing any earlier one.
pub async fn submit(
    state: &SharedState,
    group_id: Uuid,
    round_number: u32,
    acting_user: Uuid,
    draft: SubmissionDraft,
) -> Result<SubmissionEntity, ServiceError> {
    let store = state.require_round_store().await?;
    load_group(store.as_ref(), group_id).await?;
    require_member(store.as_ref(), group_id, acting_user).await?;

    let participant = store
        .find_participant(acting_user)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("participant `{acting_user}` not found")))?;

    let round = store
        .latest_round(group_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("group `{group_id}` has no round yet")))?;
    if round.number != round_number {
        return Err(ServiceError::InvalidState(
            "Survey responses can only be sent for the current week.".into(),
        ));
    }

    let track_id = draft.track_id.trim().to_owned();
    if track_id.is_empty() {
        return Err(ServiceError::InvalidInput("a track is required".into()));
    }

    let (votes, guesses) = if round.number == 0 {
        if !draft.votes.is_empty() || !draft.guesses.is_empty() {
            return Err(ServiceError::InvalidInput(
                "the first week has no survey to vote on".into(),
            ));
        }
        (Vec::new(), Vec::new())
    } else {
        let survey = round.survey.as_ref().ok_or_else(|| {
            ServiceError::Inconsistent(format!("round `{}` has no survey", round.id))
        })?;
        check_votes(survey, &draft.votes)?;
        check_guesses(survey, &draft.guesses)?;
        let guesses = score_guesses(store.as_ref(), &round, &draft.guesses).await?;
        (draft.votes, guesses)
    };

    let track = state
        .music()
        .lookup_track(track_id.clone(), acting_user)
        .await?;

    let submission = SubmissionEntity {
        id: Uuid::new_v4(),
        group_id,
        round_id: round.id.clone(),
        round_number: round.number,
        song: SongEntity {
            id: Uuid::new_v4(),
            name: track.display_name(),
            track_id,
            submitter_id: participant.id,
        },
        participant,
        votes,
        correct_guesses: guesses.iter().filter(|guess| guess.correct).count() as u32,
        guesses,
        submitted_at: state.now(),
    };

    store.replace_submission(submission.clone()).await?;
    info!(
        group_id = %group_id,
        round = round.number,
        participant_id = %acting_user,
        correct_guesses = submission.correct_guesses,
        "submission stored"
    );

    Ok(submission)
}

fn check_votes(survey: &SurveyEntity, votes: &[Uuid]) -> Result<(), ServiceError> {
    let distinct: HashSet<&Uuid> = votes.iter().collect();
    if votes.len() != VOTES_PER_SUBMISSION || distinct.len() != VOTES_PER_SUBMISSION {
        return Err(ServiceError::InvalidInput(format!(
            "exactly {VOTES_PER_SUBMISSION} distinct votes are required"
        )));
    }
    if let Some(unknown) = votes.iter().find(|id| survey.song_position(**id).is_none()) {
        return Err(ServiceError::InvalidInput(format!(
            "song `{unknown}` is not part of this week's survey"
        )));
    }
    Ok(())
}

/// Guesses must pair every survey song with a distinct survey participant.
fn check_guesses(survey: &SurveyEntity, guesses: &[(Uuid, Uuid)]) -> Result<(), ServiceError> {
    if guesses.len() != survey.songs.len() {
        return Err(ServiceError::InvalidInput(format!(
            "expected a guess for each of the {} songs",
            survey.songs.len()
        )));
    }

    let mut songs = HashSet::new();
    let mut participants = HashSet::new();
    for (song_id, participant_id) in guesses {
        if survey.song_position(*song_id).is_none() || !songs.insert(song_id) {
            return Err(ServiceError::InvalidInput(format!(
                "song `{song_id}` is unknown or guessed twice"
            )));
        }
        if !survey.lists_participant(*participant_id) || !participants.insert(participant_id) {
            return Err(ServiceError::InvalidInput(format!(
                "participant `{participant_id}` is unknown or guessed twice"
            )));
        }
    }
    Ok(())
}

/// Mark each guess against the submitters of the round whose songs are surveyed.
async fn score_guesses(
    store: &dyn RoundStore,
    round: &RoundEntity,
    guesses: &[(Uuid, Uuid)],
) -> Result<Vec<GuessMatchEntity>, ServiceError> {
    let prior_number = round.number - 1;
    let prior = store
        .round_by_number(round.group_id, prior_number)
        .await?
        .ok_or_else(|| {
            ServiceError::Inconsistent(format!(
                "round {prior_number} of group `{}` is missing",
                round.group_id
            ))
        })?;
    let submitters: HashMap<Uuid, Uuid> = store
        .submissions_for_round(prior.id)
        .await?
        .into_iter()
        .map(|submission| (submission.song.id, submission.song.submitter_id))
        .collect();

    Ok(guesses
        .iter()
        .map(|&(song_id, participant_id)| GuessMatchEntity {
            song_id,
            participant_id,
            correct: submitters.get(&song_id) == Some(&participant_id),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::{SurveyParticipantEntity, SurveySongEntity};

    fn survey(size: usize) -> SurveyEntity {
        SurveyEntity {
            songs: (0..size)
                .map(|i| SurveySongEntity {
                    id: Uuid::new_v4(),
                    name: format!("song{i}"),
                })
                .collect(),
            participants: (0..size)
                .map(|i| SurveyParticipantEntity {
                    id: Uuid::new_v4(),
                    name: format!("player{i}"),
                    matched: false,
                })
                .collect(),
        }
    }

    #[test]
    fn votes_must_be_two_distinct_survey_songs() {
        let survey = survey(3);
        let song = |i: usize| survey.songs[i].id;

        assert!(check_votes(&survey, &[song(0), song(2)]).is_ok());
        assert!(check_votes(&survey, &[song(0)]).is_err());
        assert!(check_votes(&survey, &[song(0), song(0)]).is_err());
        assert!(check_votes(&survey, &[song(0), song(1), song(2)]).is_err());
        assert!(check_votes(&survey, &[song(0), Uuid::new_v4()]).is_err());
    }

    #[test]
    fn guesses_must_be_one_to_one() {
        let survey = survey(3);
        let pair = |s: usize, p: usize| (survey.songs[s].id, survey.participants[p].id);

        assert!(check_guesses(&survey, &[pair(0, 2), pair(1, 0), pair(2, 1)]).is_ok());
        assert!(check_guesses(&survey, &[pair(0, 2), pair(1, 0)]).is_err());
        assert!(check_guesses(&survey, &[pair(0, 2), pair(1, 2), pair(2, 1)]).is_err());
        assert!(check_guesses(&survey, &[pair(0, 2), pair(0, 0), pair(2, 1)]).is_err());
        assert!(
            check_guesses(
                &survey,
                &[pair(0, 2), pair(1, 0), (survey.songs[2].id, Uuid::new_v4())]
            )
            .is_err()
        );
    }
}
