//! Vote tallying, guess scoring and placements of a closing round.

use std::collections::HashMap;

use indexmap::IndexMap;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::{
        models::{
            GroupEntity, GuessEntity, GuessingEntryEntity, ResultsEntity, RoundEntity,
            SongTallyEntity, SubmissionEntity,
        },
        round_store::RoundStore,
    },
    error::ServiceError,
    music::MusicClient,
};

/// Song ids holding first and second place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placements {
    pub first: Vec<Uuid>,
    pub second: Vec<Uuid>,
}

/// Result of tallying a closing round, before anything is persisted.
#[derive(Debug, Clone)]
pub struct Tally {
    /// Songs in survey order.
    pub songs: IndexMap<Uuid, SongTallyEntity>,
    pub guessing: Vec<GuessingEntryEntity>,
    pub placements: Placements,
}

impl Tally {
    fn names(&self, ids: &[Uuid]) -> Vec<String> {
        ids.iter()
            .filter_map(|id| self.songs.get(id))
            .map(|song| song.name.clone())
            .collect()
    }

    /// Track ids to add to the best-of playlist: the winners, plus the runners-up
    /// when a single song won.
    pub fn best_of_tracks(&self) -> Vec<String> {
        let mut ids = self.placements.first.clone();
        if ids.len() == 1 {
            ids.extend(self.placements.second.iter().copied());
        }
        ids.iter()
            .filter_map(|id| self.songs.get(id))
            .map(|song| song.track_id.clone())
            .collect()
    }
}

/// Rank songs by vote count in a single pass over `(song, votes)` in display order.
///
/// Equal counts tie. A song beating first place pushes the previous first place down
/// to second. Songs without votes are never placed and nothing ranks below second.
pub fn place(songs: impl IntoIterator<Item = (Uuid, usize)>) -> Placements {
    let mut placements = Placements::default();
    let mut first_count = 0;
    let mut second_count = 0;

    for (song_id, votes) in songs {
        if votes == 0 {
            continue;
        }
        if votes > first_count {
            placements.second = std::mem::replace(&mut placements.first, vec![song_id]);
            second_count = first_count;
            first_count = votes;
        } else if votes == first_count {
            placements.first.push(song_id);
        } else if votes > second_count {
            placements.second = vec![song_id];
            second_count = votes;
        } else if votes == second_count {
            placements.second.push(song_id);
        }
    }

    placements
}

/// Tally the votes and guesses cast in `closing` on the songs submitted in the round
/// before it.
pub fn tally(
    closing: &RoundEntity,
    prior_submissions: &[SubmissionEntity],
    closing_submissions: &[SubmissionEntity],
) -> Tally {
    let submitter_names: HashMap<Uuid, &str> = prior_submissions
        .iter()
        .map(|submission| (submission.participant.id, submission.participant.name.as_str()))
        .collect();
    let mut pending: IndexMap<Uuid, SongTallyEntity> = prior_submissions
        .iter()
        .map(|submission| {
            (
                submission.song.id,
                SongTallyEntity {
                    song_id: submission.song.id,
                    name: submission.song.name.clone(),
                    voters: Vec::new(),
                    submitter: submission.participant.name.clone(),
                    track_id: submission.song.track_id.clone(),
                },
            )
        })
        .collect();

    let survey = closing.survey.as_ref();
    let mut songs = IndexMap::with_capacity(pending.len());
    for survey_song in survey.map(|survey| survey.songs.as_slice()).unwrap_or_default() {
        if let Some(entry) = pending.shift_remove(&survey_song.id) {
            songs.insert(survey_song.id, entry);
        }
    }
    songs.extend(pending);

    let position = |song_id: Uuid| {
        survey
            .and_then(|survey| survey.song_position(song_id))
            .unwrap_or(usize::MAX)
    };

    let mut guessing = Vec::with_capacity(closing_submissions.len());
    for submission in closing_submissions {
        for vote in &submission.votes {
            match songs.get_mut(vote) {
                Some(song) => song.voters.push(submission.participant.name.clone()),
                None => warn!(
                    round_id = %closing.id,
                    song_id = %vote,
                    voter = %submission.participant.id,
                    "vote for a song outside the round; ignored"
                ),
            }
        }

        let mut guesses: Vec<(usize, GuessEntity)> = submission
            .guesses
            .iter()
            .map(|guess| {
                let song = songs
                    .get(&guess.song_id)
                    .map(|song| song.name.clone())
                    .unwrap_or_default();
                let submitter_guess = submitter_names
                    .get(&guess.participant_id)
                    .map(|name| (*name).to_owned())
                    .unwrap_or_default();
                (
                    position(guess.song_id),
                    GuessEntity {
                        song,
                        submitter_guess,
                        correct: guess.correct,
                    },
                )
            })
            .collect();
        guesses.sort_by_key(|(position, _)| *position);

        guessing.push(GuessingEntryEntity {
            participant_id: submission.participant.id,
            name: submission.participant.name.clone(),
            guesses: guesses.into_iter().map(|(_, guess)| guess).collect(),
            correct_guesses: submission.correct_guesses,
        });
    }
    guessing.sort_by(|a, b| b.correct_guesses.cmp(&a.correct_guesses));

    let placements = place(songs.iter().map(|(id, song)| (*id, song.voters.len())));

    Tally {
        songs,
        guessing,
        placements,
    }
}

/// Compute the results of `closing`, whose survey lists the songs of `prior`.
///
/// Adds every judged song to its submitter's personal playlist and the winners to
/// the group's best-of playlist; the returned record is not persisted.
pub async fn compute(
    store: &dyn RoundStore,
    music: &dyn MusicClient,
    config: &AppConfig,
    group: &GroupEntity,
    closing: &RoundEntity,
    closing_submissions: &[SubmissionEntity],
    prior: &RoundEntity,
    now: OffsetDateTime,
) -> Result<ResultsEntity, ServiceError> {
    let prior_submissions = store.submissions_for_round(prior.id.clone()).await?;

    for submission in &prior_submissions {
        let Some(membership) = store
            .find_membership(group.id, submission.participant.id)
            .await?
        else {
            warn!(
                group_id = %group.id,
                participant_id = %submission.participant.id,
                "submitter is no longer a member; personal playlist skipped"
            );
            continue;
        };
        music
            .add_tracks(
                membership.personal_playlist.id,
                vec![config.track_uri(&submission.song.track_id)],
                submission.participant.id,
            )
            .await?;
    }

    let tally = tally(closing, &prior_submissions, closing_submissions);

    let best_of: Vec<String> = tally
        .best_of_tracks()
        .iter()
        .map(|track_id| config.track_uri(track_id))
        .collect();
    if !best_of.is_empty() {
        music
            .add_tracks(group.best_of_playlist.id.clone(), best_of, group.owner_id)
            .await?;
    }

    let results = ResultsEntity {
        id: Uuid::new_v4(),
        group_id: group.id,
        round_id: closing.id.clone(),
        round_number: closing.number,
        songs_round_id: prior.id.clone(),
        first_place: tally.names(&tally.placements.first),
        second_place: tally.names(&tally.placements.second),
        songs: tally.songs.into_values().collect(),
        guessing: tally.guessing,
        theme: prior.theme.clone(),
        created_at: now,
    };

    info!(
        group_id = %group.id,
        round = closing.number,
        first = ?results.first_place,
        second = ?results.second_place,
        "results computed"
    );

    Ok(results)
}
