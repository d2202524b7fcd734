use std::time::SystemTime;

use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::dao::models::{
    GroupEntity, GuessMatchEntity, GuessingEntryEntity, MembershipEntity, ParticipantEntity,
    PlaylistRefEntity, ResultsEntity, RoundEntity, ScheduleEntity, SongEntity, SongTallyEntity,
    SubmissionEntity, SurveyEntity, ThemeEntity,
};

use super::error::{MongoDaoError, MongoResult};

// Identifiers are stored as strings so filters do not depend on the binary UUID encoding.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGroupDocument {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    owner_id: String,
    schedule: ScheduleEntity,
    pending_theme: Option<ThemeEntity>,
    master_playlist: PlaylistRefEntity,
    best_of_playlist: PlaylistRefEntity,
    created_at: DateTime,
}

impl From<GroupEntity> for MongoGroupDocument {
    fn from(value: GroupEntity) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name,
            owner_id: value.owner_id.to_string(),
            schedule: value.schedule,
            pending_theme: value.pending_theme,
            master_playlist: value.master_playlist,
            best_of_playlist: value.best_of_playlist,
            created_at: to_bson_datetime(value.created_at),
        }
    }
}

impl TryFrom<MongoGroupDocument> for GroupEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoGroupDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_uuid("group", &value.id, &value.id)?,
            owner_id: parse_uuid("group", &value.id, &value.owner_id)?,
            name: value.name,
            schedule: value.schedule,
            pending_theme: value.pending_theme,
            master_playlist: value.master_playlist,
            best_of_playlist: value.best_of_playlist,
            created_at: from_bson_datetime(value.created_at),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoParticipantDocument {
    #[serde(rename = "_id")]
    id: String,
    name: String,
}

impl From<ParticipantEntity> for MongoParticipantDocument {
    fn from(value: ParticipantEntity) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name,
        }
    }
}

impl TryFrom<MongoParticipantDocument> for ParticipantEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoParticipantDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_uuid("participant", &value.id, &value.id)?,
            name: value.name,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMembershipDocument {
    pub group_id: String,
    pub participant_id: String,
    personal_playlist: PlaylistRefEntity,
    joined_at: DateTime,
}

impl From<MembershipEntity> for MongoMembershipDocument {
    fn from(value: MembershipEntity) -> Self {
        Self {
            group_id: value.group_id.to_string(),
            participant_id: value.participant_id.to_string(),
            personal_playlist: value.personal_playlist,
            joined_at: to_bson_datetime(value.joined_at),
        }
    }
}

impl TryFrom<MongoMembershipDocument> for MembershipEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoMembershipDocument) -> MongoResult<Self> {
        Ok(Self {
            group_id: parse_uuid("membership", &value.group_id, &value.group_id)?,
            participant_id: parse_uuid("membership", &value.group_id, &value.participant_id)?,
            personal_playlist: value.personal_playlist,
            joined_at: from_bson_datetime(value.joined_at),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoRoundDocument {
    #[serde(rename = "_id")]
    id: String,
    group_id: String,
    number: i64,
    close_at: DateTime,
    playlist_link: Option<String>,
    survey: Option<SurveyEntity>,
    theme: Option<ThemeEntity>,
    created_at: DateTime,
}

impl From<RoundEntity> for MongoRoundDocument {
    fn from(value: RoundEntity) -> Self {
        Self {
            id: value.id,
            group_id: value.group_id.to_string(),
            number: i64::from(value.number),
            close_at: to_bson_datetime(value.close_at),
            playlist_link: value.playlist_link,
            survey: value.survey,
            theme: value.theme,
            created_at: to_bson_datetime(value.created_at),
        }
    }
}

impl TryFrom<MongoRoundDocument> for RoundEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoRoundDocument) -> MongoResult<Self> {
        Ok(Self {
            group_id: parse_uuid("round", &value.id, &value.group_id)?,
            number: parse_number("round", &value.id, value.number)?,
            id: value.id,
            close_at: from_bson_datetime(value.close_at),
            playlist_link: value.playlist_link,
            survey: value.survey,
            theme: value.theme,
            created_at: from_bson_datetime(value.created_at),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoSubmissionDocument {
    #[serde(rename = "_id")]
    id: String,
    group_id: String,
    round_id: String,
    round_number: i64,
    participant_id: String,
    participant: ParticipantEntity,
    song: SongEntity,
    votes: Vec<Uuid>,
    guesses: Vec<GuessMatchEntity>,
    correct_guesses: i64,
    submitted_at: DateTime,
}

impl From<SubmissionEntity> for MongoSubmissionDocument {
    fn from(value: SubmissionEntity) -> Self {
        Self {
            id: value.id.to_string(),
            group_id: value.group_id.to_string(),
            round_id: value.round_id,
            round_number: i64::from(value.round_number),
            participant_id: value.participant.id.to_string(),
            participant: value.participant,
            song: value.song,
            votes: value.votes,
            guesses: value.guesses,
            correct_guesses: i64::from(value.correct_guesses),
            submitted_at: to_bson_datetime(value.submitted_at),
        }
    }
}

impl TryFrom<MongoSubmissionDocument> for SubmissionEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoSubmissionDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_uuid("submission", &value.id, &value.id)?,
            group_id: parse_uuid("submission", &value.id, &value.group_id)?,
            round_number: parse_number("submission", &value.id, value.round_number)?,
            correct_guesses: parse_number("submission", &value.id, value.correct_guesses)?,
            round_id: value.round_id,
            participant: value.participant,
            song: value.song,
            votes: value.votes,
            guesses: value.guesses,
            submitted_at: from_bson_datetime(value.submitted_at),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoResultsDocument {
    #[serde(rename = "_id")]
    id: String,
    group_id: String,
    round_id: String,
    round_number: i64,
    songs_round_id: String,
    first_place: Vec<String>,
    second_place: Vec<String>,
    songs: Vec<SongTallyEntity>,
    guessing: Vec<GuessingEntryEntity>,
    theme: Option<ThemeEntity>,
    created_at: DateTime,
}

impl From<ResultsEntity> for MongoResultsDocument {
    fn from(value: ResultsEntity) -> Self {
        Self {
            id: value.id.to_string(),
            group_id: value.group_id.to_string(),
            round_id: value.round_id,
            round_number: i64::from(value.round_number),
            songs_round_id: value.songs_round_id,
            first_place: value.first_place,
            second_place: value.second_place,
            songs: value.songs,
            guessing: value.guessing,
            theme: value.theme,
            created_at: to_bson_datetime(value.created_at),
        }
    }
}

impl TryFrom<MongoResultsDocument> for ResultsEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoResultsDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_uuid("results", &value.id, &value.id)?,
            group_id: parse_uuid("results", &value.id, &value.group_id)?,
            round_number: parse_number("results", &value.id, value.round_number)?,
            round_id: value.round_id,
            songs_round_id: value.songs_round_id,
            first_place: value.first_place,
            second_place: value.second_place,
            songs: value.songs,
            guessing: value.guessing,
            theme: value.theme,
            created_at: from_bson_datetime(value.created_at),
        })
    }
}

pub fn doc_id(id: impl ToString) -> Document {
    doc! {"_id": id.to_string()}
}

fn to_bson_datetime(value: OffsetDateTime) -> DateTime {
    DateTime::from_system_time(SystemTime::from(value))
}

fn from_bson_datetime(value: DateTime) -> OffsetDateTime {
    OffsetDateTime::from(value.to_system_time())
}

fn parse_uuid(entity: &'static str, id: &str, raw: &str) -> MongoResult<Uuid> {
    Uuid::parse_str(raw).map_err(|err| MongoDaoError::Malformed {
        entity,
        id: id.to_owned(),
        reason: format!("invalid uuid `{raw}`: {err}"),
    })
}

fn parse_number(entity: &'static str, id: &str, raw: i64) -> MongoResult<u32> {
    u32::try_from(raw).map_err(|_| MongoDaoError::Malformed {
        entity,
        id: id.to_owned(),
        reason: format!("number {raw} out of range"),
    })
}
