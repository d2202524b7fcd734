//! Process-local store used for development runs and tests.

use std::{collections::HashMap, sync::Arc};

use futures::future::BoxFuture;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dao::{
    models::{
        GroupEntity, MembershipEntity, ParticipantEntity, ResultsEntity, RoundEntity,
        SubmissionEntity,
    },
    round_store::RoundStore,
    storage::{StorageError, StorageResult},
};

/// [`RoundStore`] keeping every record in memory behind a single lock.
#[derive(Clone, Default)]
pub struct InMemoryRoundStore {
    inner: Arc<RwLock<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    groups: HashMap<Uuid, GroupEntity>,
    participants: HashMap<Uuid, ParticipantEntity>,
    memberships: Vec<MembershipEntity>,
    rounds: Vec<RoundEntity>,
    submissions: Vec<SubmissionEntity>,
    results: Vec<ResultsEntity>,
}

impl InMemoryRoundStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RoundStore for InMemoryRoundStore {
    fn find_group(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GroupEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.read().await.groups.get(&id).cloned()) })
    }

    fn save_group(&self, group: GroupEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.write().await.groups.insert(group.id, group);
            Ok(())
        })
    }

    fn save_participant(
        &self,
        participant: ParticipantEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner
                .write()
                .await
                .participants
                .insert(participant.id, participant);
            Ok(())
        })
    }

    fn find_participant(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.read().await.participants.get(&id).cloned()) })
    }

    fn add_membership(
        &self,
        membership: MembershipEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut guard = inner.write().await;
            if guard.memberships.iter().any(|existing| {
                existing.group_id == membership.group_id
                    && existing.participant_id == membership.participant_id
            }) {
                return Err(StorageError::conflict(format!(
                    "participant `{}` already belongs to group `{}`",
                    membership.participant_id, membership.group_id
                )));
            }
            guard.memberships.push(membership);
            Ok(())
        })
    }

    fn find_membership(
        &self,
        group_id: Uuid,
        participant_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<MembershipEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(inner
                .read()
                .await
                .memberships
                .iter()
                .find(|m| m.group_id == group_id && m.participant_id == participant_id)
                .cloned())
        })
    }

    fn group_roster(
        &self,
        group_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let guard = inner.read().await;
            Ok(guard
                .memberships
                .iter()
                .filter(|m| m.group_id == group_id)
                .filter_map(|m| guard.participants.get(&m.participant_id).cloned())
                .collect())
        })
    }

    fn latest_round(
        &self,
        group_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<RoundEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(inner
                .read()
                .await
                .rounds
                .iter()
                .filter(|round| round.group_id == group_id)
                .max_by_key(|round| round.number)
                .cloned())
        })
    }

    fn round_by_number(
        &self,
        group_id: Uuid,
        number: u32,
    ) -> BoxFuture<'static, StorageResult<Option<RoundEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(inner
                .read()
                .await
                .rounds
                .iter()
                .find(|round| round.group_id == group_id && round.number == number)
                .cloned())
        })
    }

    fn create_round(&self, round: RoundEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut guard = inner.write().await;
            if guard.rounds.iter().any(|existing| {
                existing.id == round.id
                    || (existing.group_id == round.group_id && existing.number == round.number)
            }) {
                return Err(StorageError::conflict(format!(
                    "round {} of group `{}` already exists",
                    round.number, round.group_id
                )));
            }
            guard.rounds.push(round);
            Ok(())
        })
    }

    fn submissions_for_round(
        &self,
        round_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<SubmissionEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(inner
                .read()
                .await
                .submissions
                .iter()
                .filter(|submission| submission.round_id == round_id)
                .cloned()
                .collect())
        })
    }

    fn submitted_participants(
        &self,
        round_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<Uuid>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(inner
                .read()
                .await
                .submissions
                .iter()
                .filter(|submission| submission.round_id == round_id)
                .map(|submission| submission.participant.id)
                .collect())
        })
    }

    fn replace_submission(
        &self,
        submission: SubmissionEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut guard = inner.write().await;
            guard.submissions.retain(|existing| {
                !(existing.round_id == submission.round_id
                    && existing.participant.id == submission.participant.id)
            });
            guard.submissions.push(submission);
            Ok(())
        })
    }

    fn replace_results(
        &self,
        mut results: ResultsEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut guard = inner.write().await;
            match guard
                .results
                .iter_mut()
                .find(|existing| existing.round_id == results.round_id)
            {
                Some(existing) => {
                    results.id = existing.id;
                    *existing = results;
                }
                None => guard.results.push(results),
            }
            Ok(())
        })
    }

    fn results_for_round(
        &self,
        group_id: Uuid,
        round_number: u32,
    ) -> BoxFuture<'static, StorageResult<Option<ResultsEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(inner
                .read()
                .await
                .results
                .iter()
                .find(|r| r.group_id == group_id && r.round_number == round_number)
                .cloned())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
