#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use futures::future::BoxFuture;
use reqwest::StatusCode;
use time::{OffsetDateTime, macros::datetime};
use uuid::Uuid;

use sotw_back::{
    config::AppConfig,
    dao::{
        models::{ParticipantEntity, RoundEntity},
        round_store::{RoundStore, memory::InMemoryRoundStore},
    },
    music::{MusicClient, MusicError, MusicResult, PlaylistHandle, TrackInfo},
    services::{
        group_service::{self, GroupDraft},
        round_service::{self, RoundOutcome},
        schedule::Clock,
        submission_service::{self, SubmissionDraft},
    },
    state::{AppState, SharedState},
};

/// Monday 2024-01-01 12:00 UTC; groups close on Mondays at 18:00 UTC.
pub const START: OffsetDateTime = datetime!(2024-01-01 12:00 UTC);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MusicCall {
    CreatePlaylist { name: String, acting_user: Uuid },
    AddTracks {
        playlist_id: String,
        track_uris: Vec<String>,
        acting_user: Uuid,
    },
    LookupTrack { track_id: String },
}

/// Music client recording every call, able to fail on demand.
#[derive(Clone, Default)]
pub struct RecordingMusic {
    calls: Arc<Mutex<Vec<MusicCall>>>,
    failing: Arc<AtomicBool>,
    next_playlist: Arc<AtomicUsize>,
}

impl RecordingMusic {
    pub fn calls(&self) -> Vec<MusicCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn created_playlists(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MusicCall::CreatePlaylist { name, .. } => Some(name),
                _ => None,
            })
            .collect()
    }

    pub fn tracks_added_to(&self, playlist_id: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MusicCall::AddTracks {
                    playlist_id: id,
                    track_uris,
                    ..
                } if id == playlist_id => Some(track_uris),
                _ => None,
            })
            .flatten()
            .collect()
    }

    fn check(&self, path: &str) -> MusicResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MusicError::Status {
                path: path.to_owned(),
                status: StatusCode::BAD_GATEWAY,
            });
        }
        Ok(())
    }

    fn record(&self, call: MusicCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl MusicClient for RecordingMusic {
    fn create_playlist(
        &self,
        name: String,
        _description: String,
        acting_user: Uuid,
    ) -> BoxFuture<'static, MusicResult<PlaylistHandle>> {
        let result = self.check("/playlists").map(|()| {
            let id = format!("pl{}", self.next_playlist.fetch_add(1, Ordering::SeqCst));
            self.record(MusicCall::CreatePlaylist { name, acting_user });
            PlaylistHandle {
                external_url: format!("https://music.test/playlist/{id}"),
                id,
            }
        });
        Box::pin(async move { result })
    }

    fn add_tracks(
        &self,
        playlist_id: String,
        track_uris: Vec<String>,
        acting_user: Uuid,
    ) -> BoxFuture<'static, MusicResult<()>> {
        let result = self.check("/playlists/tracks").map(|()| {
            self.record(MusicCall::AddTracks {
                playlist_id,
                track_uris,
                acting_user,
            })
        });
        Box::pin(async move { result })
    }

    fn lookup_track(
        &self,
        track_id: String,
        _acting_user: Uuid,
    ) -> BoxFuture<'static, MusicResult<TrackInfo>> {
        let result = self.check("/tracks").map(|()| {
            self.record(MusicCall::LookupTrack {
                track_id: track_id.clone(),
            });
            TrackInfo {
                name: format!("Song {track_id}"),
                artists: vec!["The Testers".into()],
            }
        });
        Box::pin(async move { result })
    }
}

/// Clock the tests move by hand.
pub struct ManualClock(Mutex<OffsetDateTime>);

impl ManualClock {
    pub fn set(&self, now: OffsetDateTime) {
        *self.0.lock().unwrap() = now;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *self.0.lock().unwrap()
    }
}

pub struct Harness {
    pub state: SharedState,
    pub store: InMemoryRoundStore,
    pub music: RecordingMusic,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub async fn new() -> Self {
        let music = RecordingMusic::default();
        let clock = Arc::new(ManualClock(Mutex::new(START)));
        let state = AppState::with_clock(
            AppConfig::default(),
            Arc::new(music.clone()),
            clock.clone(),
        );
        let store = InMemoryRoundStore::new();
        state.set_round_store(Arc::new(store.clone())).await;
        Self {
            state,
            store,
            music,
            clock,
        }
    }

    pub async fn participant(&self, name: &str) -> ParticipantEntity {
        group_service::register_participant(&self.state, name.into())
            .await
            .unwrap()
    }

    /// Group owned by the first participant, joined by the others in order.
    pub async fn group(&self, members: &[&ParticipantEntity]) -> Uuid {
        let (owner, others) = members.split_first().unwrap();
        let group = group_service::create_group(
            &self.state,
            owner.id,
            GroupDraft {
                name: "Friends".into(),
                weekday: 0,
                hour: 18,
                minute: 0,
                timezone: Some("UTC".into()),
            },
        )
        .await
        .unwrap()
        .group;
        for member in others {
            group_service::join_group(&self.state, group.id, member.id)
                .await
                .unwrap();
        }
        group.id
    }

    pub async fn current(&self, group_id: Uuid, user: Uuid) -> RoundOutcome {
        round_service::current_round(&self.state, group_id, user)
            .await
            .unwrap()
    }

    pub async fn current_round(&self, group_id: Uuid, user: Uuid) -> RoundEntity {
        self.current(group_id, user).await.round().clone()
    }

    pub async fn submit_song(&self, group_id: Uuid, round: u32, user: Uuid, track: &str) {
        submission_service::submit(
            &self.state,
            group_id,
            round,
            user,
            SubmissionDraft {
                track_id: track.into(),
                ..SubmissionDraft::default()
            },
        )
        .await
        .unwrap();
    }

    /// Move the clock just past the close time of `round`.
    pub fn pass(&self, round: &RoundEntity) {
        self.clock.set(round.close_at + time::Duration::hours(1));
    }

    pub async fn round_count(&self, group_id: Uuid) -> u32 {
        let mut count = 0;
        while self
            .store
            .round_by_number(group_id, count)
            .await
            .unwrap()
            .is_some()
        {
            count += 1;
        }
        count
    }
}

/// Survey song id whose display name mentions `track`.
pub fn survey_song(round: &RoundEntity, track: &str) -> Uuid {
    round
        .survey
        .as_ref()
        .unwrap()
        .songs
        .iter()
        .find(|song| song.name.contains(track))
        .unwrap()
        .id
}
