//! Pending theme of a group, consumed by the next round created.

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        models::{GroupEntity, ThemeEntity},
        round_store::RoundStore,
    },
    error::ServiceError,
    state::SharedState,
};

/// Store a theme for the next round of the group. Existing rounds keep their snapshot.
pub async fn set_pending(
    state: &SharedState,
    group_id: Uuid,
    acting_user: Uuid,
    theme: ThemeEntity,
) -> Result<GroupEntity, ServiceError> {
    let store = state.require_round_store().await?;
    let mut group = store
        .find_group(group_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("group `{group_id}` not found")))?;

    if group.owner_id != acting_user {
        return Err(ServiceError::Unauthorized(
            "only the group owner can set the theme".into(),
        ));
    }

    info!(group_id = %group_id, theme = %theme.theme, "pending theme set");
    group.pending_theme = Some(theme);
    store.save_group(group.clone()).await?;
    Ok(group)
}

/// Take the pending theme off the group, returning it for the round being created.
pub async fn apply_and_clear(
    store: &dyn RoundStore,
    group_id: Uuid,
) -> Result<Option<ThemeEntity>, ServiceError> {
    let Some(mut group) = store.find_group(group_id).await? else {
        return Err(ServiceError::NotFound(format!(
            "group `{group_id}` not found"
        )));
    };

    let taken = group.pending_theme.take();
    if taken.is_some() {
        store.save_group(group).await?;
    }
    Ok(taken)
}

/// Put back a theme taken by [`apply_and_clear`] when the round could not be created.
///
/// A theme set in the meantime wins over the restored one.
pub async fn restore_pending(store: &dyn RoundStore, group_id: Uuid, theme: ThemeEntity) {
    let restored = async {
        let Some(mut group) = store.find_group(group_id).await? else {
            return Ok(());
        };
        if group.pending_theme.is_none() {
            group.pending_theme = Some(theme);
            store.save_group(group).await?;
        }
        Ok::<_, ServiceError>(())
    };

    if let Err(err) = restored.await {
        warn!(group_id = %group_id, error = %err, "failed to restore pending theme");
    }
}
