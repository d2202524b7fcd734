//! Anonymized survey of a round's songs and submitters.

use rand::{Rng, seq::SliceRandom};

use crate::dao::models::{
    SubmissionEntity, SurveyEntity, SurveyParticipantEntity, SurveySongEntity,
};

/// Build a survey from `submissions`.
///
/// Songs and participants are shuffled separately so a song's position says nothing
/// about who submitted it.
pub fn build<R: Rng + ?Sized>(submissions: &[SubmissionEntity], rng: &mut R) -> SurveyEntity {
    let mut songs: Vec<SurveySongEntity> = submissions
        .iter()
        .map(|submission| SurveySongEntity {
            id: submission.song.id,
            name: submission.song.name.clone(),
        })
        .collect();
    songs.shuffle(&mut *rng);

    let mut participants: Vec<SurveyParticipantEntity> = submissions
        .iter()
        .map(|submission| SurveyParticipantEntity {
            id: submission.participant.id,
            name: submission.participant.name.clone(),
            matched: false,
        })
        .collect();
    participants.shuffle(rng);

    SurveyEntity {
        songs,
        participants,
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};
    use time::macros::datetime;
    use uuid::Uuid;

    use super::*;
    use crate::dao::models::{ParticipantEntity, SongEntity};

    fn submissions(count: usize) -> Vec<SubmissionEntity> {
        (0..count)
            .map(|i| {
                let participant = ParticipantEntity {
                    id: Uuid::new_v4(),
                    name: format!("player{i}"),
                };
                SubmissionEntity {
                    id: Uuid::new_v4(),
                    group_id: Uuid::nil(),
                    round_id: "g+0".into(),
                    round_number: 0,
                    song: SongEntity {
                        id: Uuid::new_v4(),
                        name: format!("song{i}"),
                        track_id: format!("track{i}"),
                        submitter_id: participant.id,
                    },
                    participant,
                    votes: Vec::new(),
                    guesses: Vec::new(),
                    correct_guesses: 0,
                    submitted_at: datetime!(2024-01-10 12:00 UTC),
                }
            })
            .collect()
    }

    /// Index of each survey entry in the submission list.
    fn permutations(survey: &SurveyEntity, source: &[SubmissionEntity]) -> (Vec<usize>, Vec<usize>) {
        let songs = survey
            .songs
            .iter()
            .map(|song| source.iter().position(|s| s.song.id == song.id).unwrap())
            .collect();
        let participants = survey
            .participants
            .iter()
            .map(|p| source.iter().position(|s| s.participant.id == p.id).unwrap())
            .collect();
        (songs, participants)
    }

    #[test]
    fn lists_every_song_and_participant_unmatched() {
        let source = submissions(5);
        let survey = build(&source, &mut StdRng::seed_from_u64(7));

        assert_eq!(survey.songs.len(), 5);
        assert_eq!(survey.participants.len(), 5);
        assert!(survey.participants.iter().all(|p| !p.matched));

        let (mut songs, mut participants) = permutations(&survey, &source);
        songs.sort_unstable();
        participants.sort_unstable();
        assert_eq!(songs, vec![0, 1, 2, 3, 4]);
        assert_eq!(participants, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn song_and_participant_orders_are_not_correlated() {
        let source = submissions(6);
        let mut rng = StdRng::seed_from_u64(42);

        let differing = (0..20)
            .filter(|_| {
                let survey = build(&source, &mut rng);
                let (songs, participants) = permutations(&survey, &source);
                songs != participants
            })
            .count();
        assert!(differing > 0);
    }

    #[test]
    fn empty_round_gives_empty_survey() {
        let survey = build(&[], &mut StdRng::seed_from_u64(1));
        assert!(survey.songs.is_empty());
        assert!(survey.participants.is_empty());
    }
}
