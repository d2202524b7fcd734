//! Participant registration, group creation, membership and results lookup.

use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{
        models::{
            GroupEntity, MembershipEntity, ParticipantEntity, PlaylistRefEntity, ResultsEntity,
            ScheduleEntity,
        },
        round_store::RoundStore,
    },
    error::ServiceError,
    music::{MusicClient, PlaylistHandle},
    services::{
        round_service::{load_group, require_member},
        schedule,
    },
    state::SharedState,
};

/// Settings of a group about to be created.
#[derive(Debug, Clone)]
pub struct GroupDraft {
    pub name: String,
    pub weekday: u8,
    pub hour: u8,
    pub minute: u8,
    /// Falls back to the configured default timezone.
    pub timezone: Option<String>,
}

/// A group with its roster in join order.
#[derive(Debug, Clone)]
pub struct GroupDetails {
    pub group: GroupEntity,
    pub roster: Vec<ParticipantEntity>,
}

/// Register a display name and return the new participant.
pub async fn register_participant(
    state: &SharedState,
    name: String,
) -> Result<ParticipantEntity, ServiceError> {
    let store = state.require_round_store().await?;
    let name = name.trim().to_owned();
    if name.is_empty() {
        return Err(ServiceError::InvalidInput("name must not be empty".into()));
    }

    let participant = ParticipantEntity {
        id: Uuid::new_v4(),
        name,
    };
    store.save_participant(participant.clone()).await?;
    info!(participant_id = %participant.id, "participant registered");
    Ok(participant)
}

/// Create a group owned by `owner_id` together with its playlists.
pub async fn create_group(
    state: &SharedState,
    owner_id: Uuid,
    draft: GroupDraft,
) -> Result<GroupDetails, ServiceError> {
    let store = state.require_round_store().await?;
    let owner = find_participant(store.as_ref(), owner_id).await?;

    let name = draft.name.trim().to_owned();
    if name.is_empty() {
        return Err(ServiceError::InvalidInput(
            "group name must not be empty".into(),
        ));
    }
    let schedule = ScheduleEntity {
        weekday: draft.weekday,
        hour: draft.hour,
        minute: draft.minute,
        timezone: draft
            .timezone
            .unwrap_or_else(|| state.config().default_timezone().to_owned()),
    };
    schedule::validate(&schedule)?;

    let music = state.music();
    let master = music
        .create_playlist(
            format!("{name} Master Playlist"),
            format!("All the songs contained in every week of the {name} song of the week."),
            owner_id,
        )
        .await?;
    let best_of = music
        .create_playlist(
            format!("{name} Song of the Year Playlist"),
            format!(
                "The winners from each week so far of the {name} Song of the Week for this year."
            ),
            owner_id,
        )
        .await?;

    let now = state.now();
    let group = GroupEntity {
        id: Uuid::new_v4(),
        name,
        owner_id,
        schedule,
        pending_theme: None,
        master_playlist: playlist_ref(master),
        best_of_playlist: playlist_ref(best_of),
        created_at: now,
    };
    let membership = new_membership(music.as_ref(), &group, &owner, now).await?;

    store.save_group(group.clone()).await?;
    store.add_membership(membership).await?;
    info!(group_id = %group.id, owner_id = %owner_id, "group created");

    Ok(GroupDetails {
        group,
        roster: vec![owner],
    })
}

/// Add the participant to the group. Joining a group twice changes nothing.
pub async fn join_group(
    state: &SharedState,
    group_id: Uuid,
    participant_id: Uuid,
) -> Result<GroupDetails, ServiceError> {
    let store = state.require_round_store().await?;
    let group = load_group(store.as_ref(), group_id).await?;
    let participant = find_participant(store.as_ref(), participant_id).await?;

    if store
        .find_membership(group_id, participant_id)
        .await?
        .is_none()
    {
        let membership =
            new_membership(state.music().as_ref(), &group, &participant, state.now()).await?;
        match store.add_membership(membership).await {
            Ok(()) => {
                info!(group_id = %group_id, participant_id = %participant_id, "participant joined")
            }
            Err(err) if err.is_conflict() => {}
            Err(err) => return Err(err.into()),
        }
    }

    let roster = store.group_roster(group_id).await?;
    Ok(GroupDetails { group, roster })
}

/// Group settings and roster, visible to members only.
pub async fn get_group(
    state: &SharedState,
    group_id: Uuid,
    acting_user: Uuid,
) -> Result<GroupDetails, ServiceError> {
    let store = state.require_round_store().await?;
    let group = load_group(store.as_ref(), group_id).await?;
    require_member(store.as_ref(), group_id, acting_user).await?;
    let roster = store.group_roster(group_id).await?;
    Ok(GroupDetails { group, roster })
}

/// Results recorded when round `round_number` closed.
pub async fn get_results(
    state: &SharedState,
    group_id: Uuid,
    round_number: u32,
    acting_user: Uuid,
) -> Result<ResultsEntity, ServiceError> {
    let store = state.require_round_store().await?;
    load_group(store.as_ref(), group_id).await?;
    require_member(store.as_ref(), group_id, acting_user).await?;

    store
        .results_for_round(group_id, round_number)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "no results for round {round_number} of group `{group_id}`"
            ))
        })
}

async fn find_participant(
    store: &dyn RoundStore,
    participant_id: Uuid,
) -> Result<ParticipantEntity, ServiceError> {
    store
        .find_participant(participant_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("participant `{participant_id}` not found")))
}

/// Membership with a freshly created personal playlist.
async fn new_membership(
    music: &dyn MusicClient,
    group: &GroupEntity,
    participant: &ParticipantEntity,
    now: OffsetDateTime,
) -> Result<MembershipEntity, ServiceError> {
    let playlist = music
        .create_playlist(
            format!("{}'s {} Song of the Week Playlist", participant.name, group.name),
            format!(
                "All songs submitted for the {} Song of the Week for this year by {}.",
                group.name, participant.name
            ),
            participant.id,
        )
        .await?;

    Ok(MembershipEntity {
        group_id: group.id,
        participant_id: participant.id,
        personal_playlist: playlist_ref(playlist),
        joined_at: now,
    })
}

fn playlist_ref(handle: PlaylistHandle) -> PlaylistRefEntity {
    PlaylistRefEntity {
        id: handle.id,
        link: handle.external_url,
    }
}
