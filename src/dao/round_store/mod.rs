pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{
    GroupEntity, MembershipEntity, ParticipantEntity, ResultsEntity, RoundEntity,
    SubmissionEntity,
};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use uuid::Uuid;

/// Abstraction over the persistence layer for groups, rounds, submissions and results.
///
/// Stores must enforce uniqueness of rounds per `(group_id, number)` and per id, of
/// submissions per `(round_id, participant_id)` and of memberships per
/// `(group_id, participant_id)`, reporting violations as [`StorageError::Conflict`].
///
/// [`StorageError::Conflict`]: crate::dao::storage::StorageError::Conflict
pub trait RoundStore: Send + Sync {
    fn find_group(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GroupEntity>>>;
    fn save_group(&self, group: GroupEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn save_participant(
        &self,
        participant: ParticipantEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    fn find_participant(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>>;
    fn add_membership(&self, membership: MembershipEntity)
    -> BoxFuture<'static, StorageResult<()>>;
    fn find_membership(
        &self,
        group_id: Uuid,
        participant_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<MembershipEntity>>>;
    /// Members of the group in join order.
    fn group_roster(
        &self,
        group_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>>;
    /// Round with the highest number, if the group has any.
    fn latest_round(&self, group_id: Uuid)
    -> BoxFuture<'static, StorageResult<Option<RoundEntity>>>;
    fn round_by_number(
        &self,
        group_id: Uuid,
        number: u32,
    ) -> BoxFuture<'static, StorageResult<Option<RoundEntity>>>;
    fn create_round(&self, round: RoundEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Submissions of a round in submission order.
    fn submissions_for_round(
        &self,
        round_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<SubmissionEntity>>>;
    fn submitted_participants(
        &self,
        round_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<Uuid>>>;
    /// Remove any earlier submission of the same participant for the round, then store this one.
    fn replace_submission(
        &self,
        submission: SubmissionEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Store the results of a round, overwriting any earlier record for the same round id.
    ///
    /// The overwritten record's id is kept.
    fn replace_results(&self, results: ResultsEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn results_for_round(
        &self,
        group_id: Uuid,
        round_number: u32,
    ) -> BoxFuture<'static, StorageResult<Option<ResultsEntity>>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
