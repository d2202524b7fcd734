mod common;

use std::{
    io,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use axum::{http::StatusCode, response::IntoResponse};
use futures::future::BoxFuture;
use uuid::Uuid;

use common::{Harness, survey_song};
use sotw_back::{
    config::AppConfig,
    dao::{
        models::{
            GroupEntity, MembershipEntity, ParticipantEntity, ResultsEntity, RoundEntity,
            SubmissionEntity, ThemeEntity,
        },
        round_store::{RoundStore, memory::InMemoryRoundStore},
        storage::{StorageError, StorageResult},
    },
    error::{AppError, ServiceError},
    services::{
        group_service, round_service,
        submission_service::{self, SubmissionDraft},
        theme,
    },
    state::{AppState, SharedState},
};

/// In-memory store with scripted misbehaviour: a one-off round creation failure, a
/// round hidden from lookups by number and latest-round reads lagging one round behind.
#[derive(Clone, Default)]
struct ScriptedStore {
    inner: InMemoryRoundStore,
    fail_round: Arc<Mutex<Option<u32>>>,
    hidden_round: Arc<Mutex<Option<u32>>>,
    stale_reads: Arc<AtomicUsize>,
}

impl ScriptedStore {
    fn over(inner: &InMemoryRoundStore) -> Self {
        Self {
            inner: inner.clone(),
            ..Self::default()
        }
    }

    fn fail_next_create(&self, number: u32) {
        *self.fail_round.lock().unwrap() = Some(number);
    }

    fn hide_round(&self, number: Option<u32>) {
        *self.hidden_round.lock().unwrap() = number;
    }

    fn lag_latest_reads(&self, reads: usize) {
        self.stale_reads.store(reads, Ordering::SeqCst);
    }

    fn take_stale_read(&self) -> bool {
        self.stale_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok()
    }
}

impl RoundStore for ScriptedStore {
    fn find_group(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GroupEntity>>> {
        self.inner.find_group(id)
    }
    fn save_group(&self, group: GroupEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.save_group(group)
    }
    fn save_participant(
        &self,
        participant: ParticipantEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.save_participant(participant)
    }
    fn find_participant(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>> {
        self.inner.find_participant(id)
    }
    fn add_membership(
        &self,
        membership: MembershipEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.add_membership(membership)
    }
    fn find_membership(
        &self,
        group_id: Uuid,
        participant_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<MembershipEntity>>> {
        self.inner.find_membership(group_id, participant_id)
    }
    fn group_roster(
        &self,
        group_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>> {
        self.inner.group_roster(group_id)
    }
    fn latest_round(
        &self,
        group_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<RoundEntity>>> {
        let inner = self.inner.clone();
        let stale = self.take_stale_read();
        Box::pin(async move {
            match inner.latest_round(group_id).await? {
                Some(round) if stale => match round.number.checked_sub(1) {
                    Some(previous) => inner.round_by_number(group_id, previous).await,
                    None => Ok(None),
                },
                latest => Ok(latest),
            }
        })
    }
    fn round_by_number(
        &self,
        group_id: Uuid,
        number: u32,
    ) -> BoxFuture<'static, StorageResult<Option<RoundEntity>>> {
        if *self.hidden_round.lock().unwrap() == Some(number) {
            return Box::pin(async { Ok(None) });
        }
        self.inner.round_by_number(group_id, number)
    }
    fn create_round(&self, round: RoundEntity) -> BoxFuture<'static, StorageResult<()>> {
        let mut fail_round = self.fail_round.lock().unwrap();
        if *fail_round == Some(round.number) {
            *fail_round = None;
            return Box::pin(async {
                Err(StorageError::unavailable(
                    "write interrupted".into(),
                    io::Error::new(io::ErrorKind::ConnectionReset, "reset"),
                ))
            });
        }
        self.inner.create_round(round)
    }
    fn submissions_for_round(
        &self,
        round_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<SubmissionEntity>>> {
        self.inner.submissions_for_round(round_id)
    }
    fn submitted_participants(
        &self,
        round_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<Uuid>>> {
        self.inner.submitted_participants(round_id)
    }
    fn replace_submission(
        &self,
        submission: SubmissionEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.replace_submission(submission)
    }
    fn replace_results(&self, results: ResultsEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.replace_results(results)
    }
    fn results_for_round(
        &self,
        group_id: Uuid,
        round_number: u32,
    ) -> BoxFuture<'static, StorageResult<Option<ResultsEntity>>> {
        self.inner.results_for_round(group_id, round_number)
    }
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.health_check()
    }
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.try_reconnect()
    }
}

/// Install a scripted view of the harness store on its state.
async fn scripted(h: &Harness) -> ScriptedStore {
    let store = ScriptedStore::over(&h.store);
    h.state.set_round_store(Arc::new(store.clone())).await;
    store
}

/// A second application instance sharing the harness store, music service and clock.
async fn second_instance(h: &Harness, store: Arc<dyn RoundStore>) -> SharedState {
    let state = AppState::with_clock(
        AppConfig::default(),
        Arc::new(h.music.clone()),
        h.clock.clone(),
    );
    state.set_round_store(store).await;
    state
}

/// Ballot voting for `votes`, guessing the survey in listing order.
fn ballot(round: &RoundEntity, track: &str, votes: [&str; 2]) -> SubmissionDraft {
    let survey = round.survey.as_ref().unwrap();
    SubmissionDraft {
        track_id: track.into(),
        votes: votes.iter().map(|vote| survey_song(round, vote)).collect(),
        guesses: survey
            .songs
            .iter()
            .zip(&survey.participants)
            .map(|(song, participant)| (song.id, participant.id))
            .collect(),
    }
}

/// Three members with round 0 closed on tracks tA, tB and tC; returns round 1.
async fn round_one(h: &Harness, people: &[&ParticipantEntity; 3]) -> (Uuid, RoundEntity) {
    let group = h.group(people).await;
    let round0 = h.current_round(group, people[0].id).await;
    for (who, track) in people.iter().zip(["tA", "tB", "tC"]) {
        h.submit_song(group, 0, who.id, track).await;
    }
    h.pass(&round0);
    let round1 = h.current_round(group, people[0].id).await;
    assert_eq!(round1.number, 1);
    (group, round1)
}

#[tokio::test]
async fn retry_after_failed_round_creation_records_fresh_results() {
    let h = Harness::new().await;
    let ann = h.participant("Ann").await;
    let bob = h.participant("Bob").await;
    let cat = h.participant("Cat").await;
    let (group, round1) = round_one(&h, &[&ann, &bob, &cat]).await;
    let store = scripted(&h).await;

    for (who, track) in [(&ann, "n1"), (&bob, "n2"), (&cat, "n3")] {
        let draft = ballot(&round1, track, ["tA", "tB"]);
        submission_service::submit(&h.state, group, 1, who.id, draft)
            .await
            .unwrap();
    }
    theme::set_pending(
        &h.state,
        group,
        ann.id,
        ThemeEntity {
            theme: "Duets".into(),
            description: String::new(),
        },
    )
    .await
    .unwrap();

    store.fail_next_create(2);
    h.pass(&round1);
    let err = round_service::current_round(&h.state, group, ann.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Unavailable(_)));
    assert_eq!(h.round_count(group).await, 2);
    let pending = h.store.find_group(group).await.unwrap().unwrap().pending_theme;
    assert_eq!(pending.map(|t| t.theme), Some("Duets".into()));
    let first_attempt = h.store.results_for_round(group, 1).await.unwrap().unwrap();
    assert_eq!(first_attempt.first_place.len(), 2);

    // Round 1 is still current, so Cat may change their votes before the retry.
    let revote = ballot(&round1, "n3", ["tC", "tB"]);
    submission_service::submit(&h.state, group, 1, cat.id, revote)
        .await
        .unwrap();

    let round2 = h.current_round(group, ann.id).await;
    assert_eq!(round2.number, 2);
    assert_eq!(round2.theme.map(|t| t.theme), Some("Duets".into()));

    let results = group_service::get_results(&h.state, group, 1, bob.id)
        .await
        .unwrap();
    assert_eq!(results.id, first_attempt.id);
    assert_eq!(results.first_place, vec!["Song tB - The Testers"]);
    assert_eq!(results.second_place, vec!["Song tA - The Testers"]);
    let c = results
        .songs
        .iter()
        .find(|song| song.song_id == survey_song(&round1, "tC"))
        .unwrap();
    assert_eq!(c.voters, vec!["Cat"]);
}

#[tokio::test]
async fn missing_prior_round_is_reported_as_inconsistent() {
    let h = Harness::new().await;
    let ann = h.participant("Ann").await;
    let bob = h.participant("Bob").await;
    let cat = h.participant("Cat").await;
    let (group, round1) = round_one(&h, &[&ann, &bob, &cat]).await;
    let store = scripted(&h).await;

    for (who, track) in [(&ann, "n1"), (&bob, "n2"), (&cat, "n3")] {
        let draft = ballot(&round1, track, ["tA", "tB"]);
        submission_service::submit(&h.state, group, 1, who.id, draft)
            .await
            .unwrap();
    }

    store.hide_round(Some(0));
    h.pass(&round1);
    let err = round_service::current_round(&h.state, group, ann.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Inconsistent(_)));
    assert_eq!(
        AppError::from(err).into_response().status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(h.round_count(group).await, 2);
    assert!(h.store.results_for_round(group, 1).await.unwrap().is_none());

    store.hide_round(None);
    assert_eq!(h.current_round(group, ann.id).await.number, 2);
}

#[tokio::test]
async fn instance_losing_the_bootstrap_race_reads_the_winner() {
    let h = Harness::new().await;
    let ann = h.participant("Ann").await;
    let bob = h.participant("Bob").await;
    let cat = h.participant("Cat").await;
    let group = h.group(&[&ann, &bob, &cat]).await;

    let lagging = ScriptedStore::over(&h.store);
    let other = second_instance(&h, Arc::new(lagging.clone())).await;

    let round0 = h.current_round(group, ann.id).await;
    // The other instance still sees no round, both before and after taking its lock.
    lagging.lag_latest_reads(2);
    let outcome = round_service::current_round(&other, group, bob.id)
        .await
        .unwrap();

    assert_eq!(outcome.round(), &round0);
    assert_eq!(h.round_count(group).await, 1);
}

#[tokio::test]
async fn instance_losing_the_advance_race_reads_the_winner() {
    let h = Harness::new().await;
    let ann = h.participant("Ann").await;
    let bob = h.participant("Bob").await;
    let cat = h.participant("Cat").await;
    let group = h.group(&[&ann, &bob, &cat]).await;

    let lagging = ScriptedStore::over(&h.store);
    let other = second_instance(&h, Arc::new(lagging.clone())).await;

    let round0 = h.current_round(group, ann.id).await;
    for (who, track) in [(&ann, "tA"), (&bob, "tB"), (&cat, "tC")] {
        h.submit_song(group, 0, who.id, track).await;
    }
    h.pass(&round0);
    let round1 = h.current_round(group, ann.id).await;
    assert_eq!(round1.number, 1);

    // The other instance still sees round 0 as current and tries to close it again.
    lagging.lag_latest_reads(2);
    let outcome = round_service::current_round(&other, group, cat.id)
        .await
        .unwrap();

    assert_eq!(outcome.round(), &round1);
    assert_eq!(h.round_count(group).await, 2);
    assert!(h.store.round_by_number(group, 2).await.unwrap().is_none());
}
