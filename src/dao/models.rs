use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Registered participant able to join groups and submit songs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParticipantEntity {
    /// Stable identifier for the participant.
    pub id: Uuid,
    /// Display name shown in surveys and results.
    pub name: String,
}

/// Weekly close schedule of a group, expressed as wall-clock time in a timezone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleEntity {
    /// Day of the week, Monday = 0 through Sunday = 6.
    pub weekday: u8,
    /// Hour of the day (0-23).
    pub hour: u8,
    /// Minute of the hour (0-59).
    pub minute: u8,
    /// IANA timezone name (e.g. "America/New_York").
    pub timezone: String,
}

/// Optional theme attached to a round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThemeEntity {
    pub theme: String,
    pub description: String,
}

/// Handle on a playlist owned by the external music service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaylistRefEntity {
    /// Identifier of the playlist on the music service.
    pub id: String,
    /// Public link to the playlist.
    pub link: String,
}

/// A song-of-the-week competition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupEntity {
    /// Primary key of the group.
    pub id: Uuid,
    /// Display name of the competition.
    pub name: String,
    /// Participant who created the group.
    pub owner_id: Uuid,
    /// Weekly close schedule.
    pub schedule: ScheduleEntity,
    /// Theme waiting to be applied to the next created round.
    pub pending_theme: Option<ThemeEntity>,
    /// Playlist collecting every submitted song.
    pub master_playlist: PlaylistRefEntity,
    /// Playlist collecting the weekly winners.
    pub best_of_playlist: PlaylistRefEntity,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Membership of a participant in a group, with their personal playlist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MembershipEntity {
    pub group_id: Uuid,
    pub participant_id: Uuid,
    /// Playlist collecting every song this participant submitted to the group.
    pub personal_playlist: PlaylistRefEntity,
    #[serde(with = "time::serde::rfc3339")]
    pub joined_at: OffsetDateTime,
}

/// Song entry listed in a survey.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SurveySongEntity {
    pub id: Uuid,
    pub name: String,
}

/// Participant entry listed in a survey.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SurveyParticipantEntity {
    pub id: Uuid,
    pub name: String,
    /// Guessing UI state; always stored as `false`.
    pub matched: bool,
}

/// Anonymized survey built from the previous round's submissions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SurveyEntity {
    pub songs: Vec<SurveySongEntity>,
    pub participants: Vec<SurveyParticipantEntity>,
}

impl SurveyEntity {
    /// Position of a song in the survey order, if listed.
    pub fn song_position(&self, song_id: Uuid) -> Option<usize> {
        self.songs.iter().position(|song| song.id == song_id)
    }

    /// Whether the participant is listed in the survey.
    pub fn lists_participant(&self, participant_id: Uuid) -> bool {
        self.participants
            .iter()
            .any(|participant| participant.id == participant_id)
    }
}

/// One weekly round of a group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundEntity {
    /// Composite identifier `"{group_id}+{suffix}"`.
    pub id: String,
    pub group_id: Uuid,
    /// Round number, starting at 0 and contiguous within a group.
    pub number: u32,
    /// Instant after which the round may close.
    #[serde(with = "time::serde::rfc3339")]
    pub close_at: OffsetDateTime,
    /// Link to the playlist holding the songs under survey (absent for round 0).
    pub playlist_link: Option<String>,
    /// Survey of the previous round's songs (absent for round 0).
    pub survey: Option<SurveyEntity>,
    /// Theme snapshot taken when the round was created.
    pub theme: Option<ThemeEntity>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Song submitted by a participant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SongEntity {
    pub id: Uuid,
    /// Display name, `"{track} - {artists}"`.
    pub name: String,
    /// Track identifier on the music service.
    pub track_id: String,
    pub submitter_id: Uuid,
}

/// One guess: the participant believed to have submitted a song.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuessMatchEntity {
    pub song_id: Uuid,
    pub participant_id: Uuid,
    /// Computed once when the submission is scored.
    pub correct: bool,
}

/// A participant's entry for a round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmissionEntity {
    pub id: Uuid,
    pub group_id: Uuid,
    pub round_id: String,
    pub round_number: u32,
    pub participant: ParticipantEntity,
    /// Song put forward for the next round's survey.
    pub song: SongEntity,
    /// Ids of the two survey songs voted for (empty for round 0).
    pub votes: Vec<Uuid>,
    pub guesses: Vec<GuessMatchEntity>,
    pub correct_guesses: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub submitted_at: OffsetDateTime,
}

/// Vote tally of a song in the results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SongTallyEntity {
    pub song_id: Uuid,
    pub name: String,
    /// Display names of the participants who voted for the song.
    pub voters: Vec<String>,
    /// Display name of the participant who submitted the song.
    pub submitter: String,
    pub track_id: String,
}

/// One guess as displayed in the results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuessEntity {
    pub song: String,
    pub submitter_guess: String,
    pub correct: bool,
}

/// Guessing performance of a participant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuessingEntryEntity {
    pub participant_id: Uuid,
    pub name: String,
    pub guesses: Vec<GuessEntity>,
    pub correct_guesses: u32,
}

/// Computed outcome of a closed round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultsEntity {
    pub id: Uuid,
    pub group_id: Uuid,
    /// Round whose survey was voted on.
    pub round_id: String,
    pub round_number: u32,
    /// Round in which the judged songs were submitted.
    pub songs_round_id: String,
    pub first_place: Vec<String>,
    pub second_place: Vec<String>,
    /// Tallies in survey order.
    pub songs: Vec<SongTallyEntity>,
    /// Guessing performance, best first.
    pub guessing: Vec<GuessingEntryEntity>,
    pub theme: Option<ThemeEntity>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
