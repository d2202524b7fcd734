use std::{collections::HashMap, sync::Arc};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{Document, doc},
    error::Error as MongoError,
    options::IndexOptions,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        MongoGroupDocument, MongoMembershipDocument, MongoParticipantDocument,
        MongoResultsDocument, MongoRoundDocument, MongoSubmissionDocument, doc_id,
    },
};
use crate::dao::{
    models::{
        GroupEntity, MembershipEntity, ParticipantEntity, ResultsEntity, RoundEntity,
        SubmissionEntity,
    },
    round_store::RoundStore,
    storage::StorageResult,
};

const GROUPS: &str = "groups";
const PARTICIPANTS: &str = "participants";
const MEMBERSHIPS: &str = "memberships";
const ROUNDS: &str = "rounds";
const SUBMISSIONS: &str = "submissions";
const RESULTS: &str = "results";

/// MongoDB-backed [`RoundStore`].
#[derive(Clone)]
pub struct MongoRoundStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    #[allow(dead_code)]
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = self.state.read().await.database.clone();
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoRoundStore {
    /// Establish a connection to MongoDB and ensure the unique indexes exist.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let store = Self {
            inner: Arc::new(MongoInner {
                state: RwLock::new(MongoState { client, database }),
                config,
            }),
        };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let indexes: [(&'static str, &'static str, Document); 4] = [
            (ROUNDS, "group_id,number", doc! {"group_id": 1, "number": 1}),
            (
                SUBMISSIONS,
                "round_id,participant_id",
                doc! {"round_id": 1, "participant_id": 1},
            ),
            (RESULTS, "round_id", doc! {"round_id": 1}),
            (
                MEMBERSHIPS,
                "group_id,participant_id",
                doc! {"group_id": 1, "participant_id": 1},
            ),
        ];

        let database = self.database().await;
        for (collection, index, keys) in indexes {
            let model = IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .name(Some(format!("{collection}_{}_idx", index.replace(',', "_"))))
                        .unique(Some(true))
                        .build(),
                )
                .build();
            database
                .collection::<Document>(collection)
                .create_index(model)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection,
                    index,
                    source,
                })?;
        }
        Ok(())
    }

    async fn database(&self) -> Database {
        self.inner.state.read().await.database.clone()
    }

    async fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.inner.state.read().await.database.collection::<T>(name)
    }

    async fn find_group(&self, id: Uuid) -> MongoResult<Option<GroupEntity>> {
        let document = self
            .collection::<MongoGroupDocument>(GROUPS)
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::Load {
                entity: "group",
                id: id.to_string(),
                source,
            })?;
        document.map(TryInto::try_into).transpose()
    }

    async fn save_group(&self, group: GroupEntity) -> MongoResult<()> {
        let id = group.id;
        let document: MongoGroupDocument = group.into();
        self.collection::<MongoGroupDocument>(GROUPS)
            .await
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::write("group", id.to_string(), source))?;
        Ok(())
    }

    async fn save_participant(&self, participant: ParticipantEntity) -> MongoResult<()> {
        let id = participant.id;
        let document: MongoParticipantDocument = participant.into();
        self.collection::<MongoParticipantDocument>(PARTICIPANTS)
            .await
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::write("participant", id.to_string(), source))?;
        Ok(())
    }

    async fn find_participant(&self, id: Uuid) -> MongoResult<Option<ParticipantEntity>> {
        let document = self
            .collection::<MongoParticipantDocument>(PARTICIPANTS)
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::Load {
                entity: "participant",
                id: id.to_string(),
                source,
            })?;
        document.map(TryInto::try_into).transpose()
    }

    async fn add_membership(&self, membership: MembershipEntity) -> MongoResult<()> {
        let key = format!("{}/{}", membership.group_id, membership.participant_id);
        let document: MongoMembershipDocument = membership.into();
        self.collection::<MongoMembershipDocument>(MEMBERSHIPS)
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::write("membership", key, source))?;
        Ok(())
    }

    async fn find_membership(
        &self,
        group_id: Uuid,
        participant_id: Uuid,
    ) -> MongoResult<Option<MembershipEntity>> {
        let document = self
            .collection::<MongoMembershipDocument>(MEMBERSHIPS)
            .await
            .find_one(doc! {
                "group_id": group_id.to_string(),
                "participant_id": participant_id.to_string(),
            })
            .await
            .map_err(|source| MongoDaoError::Load {
                entity: "membership",
                id: format!("{group_id}/{participant_id}"),
                source,
            })?;
        document.map(TryInto::try_into).transpose()
    }

    async fn group_roster(&self, group_id: Uuid) -> MongoResult<Vec<ParticipantEntity>> {
        let load_error = |source: MongoError| MongoDaoError::Load {
            entity: "roster",
            id: group_id.to_string(),
            source,
        };

        let memberships: Vec<MongoMembershipDocument> = self
            .collection::<MongoMembershipDocument>(MEMBERSHIPS)
            .await
            .find(doc! {"group_id": group_id.to_string()})
            .sort(doc! {"joined_at": 1, "_id": 1})
            .await
            .map_err(load_error)?
            .try_collect()
            .await
            .map_err(load_error)?;

        let ids: Vec<String> = memberships
            .iter()
            .map(|membership| membership.participant_id.clone())
            .collect();
        let documents: Vec<MongoParticipantDocument> = self
            .collection::<MongoParticipantDocument>(PARTICIPANTS)
            .await
            .find(doc! {"_id": {"$in": ids.clone()}})
            .await
            .map_err(load_error)?
            .try_collect()
            .await
            .map_err(load_error)?;

        let mut by_id = HashMap::new();
        for document in documents {
            let participant: ParticipantEntity = document.try_into()?;
            by_id.insert(participant.id.to_string(), participant);
        }

        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    async fn find_round(&self, filter: Document, id: String) -> MongoResult<Option<RoundEntity>> {
        let document = self
            .collection::<MongoRoundDocument>(ROUNDS)
            .await
            .find_one(filter)
            .sort(doc! {"number": -1})
            .await
            .map_err(|source| MongoDaoError::Load {
                entity: "round",
                id,
                source,
            })?;
        document.map(TryInto::try_into).transpose()
    }

    async fn create_round(&self, round: RoundEntity) -> MongoResult<()> {
        let id = round.id.clone();
        let document: MongoRoundDocument = round.into();
        self.collection::<MongoRoundDocument>(ROUNDS)
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::write("round", id, source))?;
        Ok(())
    }

    async fn submissions_for_round(&self, round_id: String) -> MongoResult<Vec<SubmissionEntity>> {
        let load_error = |source: MongoError| MongoDaoError::Load {
            entity: "submissions",
            id: round_id.clone(),
            source,
        };

        let documents: Vec<MongoSubmissionDocument> = self
            .collection::<MongoSubmissionDocument>(SUBMISSIONS)
            .await
            .find(doc! {"round_id": round_id.as_str()})
            .sort(doc! {"submitted_at": 1})
            .await
            .map_err(load_error)?
            .try_collect()
            .await
            .map_err(load_error)?;

        documents.into_iter().map(TryInto::try_into).collect()
    }

    async fn replace_submission(&self, submission: SubmissionEntity) -> MongoResult<()> {
        let key = format!("{}/{}", submission.round_id, submission.participant.id);
        let collection = self
            .collection::<MongoSubmissionDocument>(SUBMISSIONS)
            .await;

        collection
            .delete_one(doc! {
                "round_id": submission.round_id.as_str(),
                "participant_id": submission.participant.id.to_string(),
            })
            .await
            .map_err(|source| MongoDaoError::write("submission", key.clone(), source))?;

        let document: MongoSubmissionDocument = submission.into();
        collection
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::write("submission", key, source))?;
        Ok(())
    }

    async fn replace_results(&self, mut results: ResultsEntity) -> MongoResult<()> {
        let round_id = results.round_id.clone();
        let collection = self.collection::<MongoResultsDocument>(RESULTS).await;

        let existing = collection
            .find_one(doc! { "round_id": round_id.as_str() })
            .await
            .map_err(|source| MongoDaoError::Load {
                entity: "results",
                id: round_id.clone(),
                source,
            })?;
        if let Some(existing) = existing {
            results.id = ResultsEntity::try_from(existing)?.id;
        }

        let id = results.id;
        let document: MongoResultsDocument = results.into();
        collection
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::write("results", round_id, source))?;
        Ok(())
    }

    async fn results_for_round(
        &self,
        group_id: Uuid,
        round_number: u32,
    ) -> MongoResult<Option<ResultsEntity>> {
        let document = self
            .collection::<MongoResultsDocument>(RESULTS)
            .await
            .find_one(doc! {
                "group_id": group_id.to_string(),
                "round_number": i64::from(round_number),
            })
            .await
            .map_err(|source| MongoDaoError::Load {
                entity: "results",
                id: format!("{group_id}#{round_number}"),
                source,
            })?;
        document.map(TryInto::try_into).transpose()
    }
}

impl RoundStore for MongoRoundStore {
    fn find_group(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GroupEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_group(id).await.map_err(Into::into) })
    }

    fn save_group(&self, group: GroupEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_group(group).await.map_err(Into::into) })
    }

    fn save_participant(
        &self,
        participant: ParticipantEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_participant(participant).await.map_err(Into::into) })
    }

    fn find_participant(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_participant(id).await.map_err(Into::into) })
    }

    fn add_membership(
        &self,
        membership: MembershipEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.add_membership(membership).await.map_err(Into::into) })
    }

    fn find_membership(
        &self,
        group_id: Uuid,
        participant_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<MembershipEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_membership(group_id, participant_id)
                .await
                .map_err(Into::into)
        })
    }

    fn group_roster(
        &self,
        group_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.group_roster(group_id).await.map_err(Into::into) })
    }

    fn latest_round(
        &self,
        group_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<RoundEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_round(doc! {"group_id": group_id.to_string()}, group_id.to_string())
                .await
                .map_err(Into::into)
        })
    }

    fn round_by_number(
        &self,
        group_id: Uuid,
        number: u32,
    ) -> BoxFuture<'static, StorageResult<Option<RoundEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_round(
                    doc! {"group_id": group_id.to_string(), "number": i64::from(number)},
                    format!("{group_id}#{number}"),
                )
                .await
                .map_err(Into::into)
        })
    }

    fn create_round(&self, round: RoundEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.create_round(round).await.map_err(Into::into) })
    }

    fn submissions_for_round(
        &self,
        round_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<SubmissionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.submissions_for_round(round_id).await.map_err(Into::into) })
    }

    fn submitted_participants(
        &self,
        round_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<Uuid>>> {
        let store = self.clone();
        Box::pin(async move {
            let submissions = store.submissions_for_round(round_id).await?;
            Ok(submissions
                .into_iter()
                .map(|submission| submission.participant.id)
                .collect())
        })
    }

    fn replace_submission(
        &self,
        submission: SubmissionEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.replace_submission(submission).await.map_err(Into::into) })
    }

    fn replace_results(&self, results: ResultsEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.replace_results(results).await.map_err(Into::into) })
    }

    fn results_for_round(
        &self,
        group_id: Uuid,
        round_number: u32,
    ) -> BoxFuture<'static, StorageResult<Option<ResultsEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .results_for_round(group_id, round_number)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
