//! Lazy round advancement: every read of the current round may close it and open the next.

use rand::seq::SliceRandom;
use time::OffsetDateTime;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        models::{GroupEntity, RoundEntity, SubmissionEntity, SurveyEntity},
        round_store::RoundStore,
    },
    error::ServiceError,
    music::PlaylistHandle,
    services::{
        gate::{self, GateResult},
        results, schedule, survey, theme,
    },
    state::{
        SharedState,
        round_machine::{RoundEvent, RoundPhase, Step, next_step},
    },
};

/// What the caller gets back from [`current_round`].
#[derive(Debug, Clone, PartialEq)]
pub enum RoundOutcome {
    /// The round is open for submissions.
    Current {
        round: RoundEntity,
        /// Whether the acting participant already submitted for this round.
        submitted: bool,
    },
    /// The round is past due but cannot close yet; it stays current.
    Blocked {
        round: RoundEntity,
        submitted: bool,
        reason_code: &'static str,
        message: String,
        missing_participants: Vec<String>,
    },
}

impl RoundOutcome {
    pub fn round(&self) -> &RoundEntity {
        match self {
            RoundOutcome::Current { round, .. } | RoundOutcome::Blocked { round, .. } => round,
        }
    }
}

/// Advancement result before the acting participant's submission status is known.
enum Advanced {
    Current(RoundEntity),
    Blocked {
        round: RoundEntity,
        reason_code: &'static str,
        message: String,
        missing_participants: Vec<String>,
    },
}

/// Return the current round of a group, closing it and opening the next one when it is
/// past due and every member submitted.
pub async fn current_round(
    state: &SharedState,
    group_id: Uuid,
    acting_user: Uuid,
) -> Result<RoundOutcome, ServiceError> {
    let store = state.require_round_store().await?;
    let group = load_group(store.as_ref(), group_id).await?;
    require_member(store.as_ref(), group_id, acting_user).await?;

    let advanced = advance(state, store.as_ref(), &group).await?;

    let round_id = match &advanced {
        Advanced::Current(round) | Advanced::Blocked { round, .. } => round.id.clone(),
    };
    let submitted = store
        .submitted_participants(round_id)
        .await?
        .contains(&acting_user);

    Ok(match advanced {
        Advanced::Current(round) => RoundOutcome::Current { round, submitted },
        Advanced::Blocked {
            round,
            reason_code,
            message,
            missing_participants,
        } => RoundOutcome::Blocked {
            round,
            submitted,
            reason_code,
            message,
            missing_participants,
        },
    })
}

pub(crate) async fn load_group(
    store: &dyn RoundStore,
    group_id: Uuid,
) -> Result<GroupEntity, ServiceError> {
    store
        .find_group(group_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("group `{group_id}` not found")))
}

pub(crate) async fn require_member(
    store: &dyn RoundStore,
    group_id: Uuid,
    participant_id: Uuid,
) -> Result<(), ServiceError> {
    if store
        .find_membership(group_id, participant_id)
        .await?
        .is_none()
    {
        return Err(ServiceError::Unauthorized(format!(
            "participant `{participant_id}` is not a member of group `{group_id}`"
        )));
    }
    Ok(())
}

fn phase_of(round: Option<&RoundEntity>) -> RoundPhase {
    round.map_or(RoundPhase::NoRound, |round| RoundPhase::Round(round.number))
}

fn observe(round: Option<&RoundEntity>, now: OffsetDateTime) -> RoundEvent {
    RoundEvent::Observed {
        past_due: round.is_some_and(|round| now >= round.close_at),
    }
}

async fn advance(
    state: &SharedState,
    store: &dyn RoundStore,
    group: &GroupEntity,
) -> Result<Advanced, ServiceError> {
    let latest = store.latest_round(group.id).await?;
    let now = state.now();
    if let (Step::Hold, Some(round)) = (
        next_step(phase_of(latest.as_ref()), observe(latest.as_ref(), now))?,
        &latest,
    ) {
        return Ok(Advanced::Current(round.clone()));
    }

    let gate_lock = state.advancement_gate(group.id);
    let _guard = gate_lock.lock().await;

    // Another request may have advanced the group while we waited.
    let latest = store.latest_round(group.id).await?;
    let now = state.now();
    let phase = phase_of(latest.as_ref());

    match (next_step(phase, observe(latest.as_ref(), now))?, latest) {
        (Step::Bootstrap, _) => bootstrap(store, group, now).await.map(Advanced::Current),
        (Step::Hold, Some(round)) => Ok(Advanced::Current(round)),
        (Step::EvaluateGate, Some(round)) => {
            let roster = store.group_roster(group.id).await?;
            let submitted = store.submitted_participants(round.id.clone()).await?;
            let gate = gate::evaluate(&roster, &submitted);

            match next_step(phase, RoundEvent::GateEvaluated(gate.verdict()))? {
                step @ Step::Advance {
                    closing,
                    with_results,
                    ..
                } => {
                    let (true, Some(RoundPhase::Round(next))) =
                        (closing == round.number, step.successor())
                    else {
                        return Err(ServiceError::InvalidState(format!(
                            "step {step:?} does not close round {}",
                            round.number
                        )));
                    };
                    advance_round(state, store, group, round, next, with_results, now)
                        .await
                        .map(Advanced::Current)
                }
                Step::Blocked => {
                    let GateResult::Blocked {
                        reason_code,
                        message,
                        missing_participants,
                    } = gate
                    else {
                        return Err(ServiceError::InvalidState(
                            "gate verdict does not match its result".into(),
                        ));
                    };
                    debug!(
                        group_id = %group.id,
                        round = round.number,
                        reason_code,
                        missing = ?missing_participants,
                        "round past due but gate blocked"
                    );
                    Ok(Advanced::Blocked {
                        round,
                        reason_code,
                        message,
                        missing_participants,
                    })
                }
                step => Err(ServiceError::InvalidState(format!(
                    "unexpected step {step:?} after gate evaluation"
                ))),
            }
        }
        (step, _) => Err(ServiceError::InvalidState(format!(
            "unexpected step {step:?} for group `{}`",
            group.id
        ))),
    }
}

/// Create round 0 of a group.
async fn bootstrap(
    store: &dyn RoundStore,
    group: &GroupEntity,
    now: OffsetDateTime,
) -> Result<RoundEntity, ServiceError> {
    let round = RoundEntity {
        id: format!("{}+0", group.id),
        group_id: group.id,
        number: 0,
        close_at: close_time(group, now)?,
        playlist_link: None,
        survey: None,
        theme: None,
        created_at: now,
    };

    match store.create_round(round.clone()).await {
        Ok(()) => {
            info!(group_id = %group.id, close_at = %round.close_at, "round 0 created");
            Ok(round)
        }
        Err(err) if err.is_conflict() => {
            warn!(group_id = %group.id, "round 0 created concurrently; re-reading");
            reread_latest(store, group.id).await
        }
        Err(err) => Err(err.into()),
    }
}

/// Close `closing` and open round `next`.
///
/// Every music service call happens before anything is persisted, so a failure leaves
/// `closing` current and the operation can be retried.
async fn advance_round(
    state: &SharedState,
    store: &dyn RoundStore,
    group: &GroupEntity,
    closing: RoundEntity,
    next: u32,
    with_results: bool,
    now: OffsetDateTime,
) -> Result<RoundEntity, ServiceError> {
    let music = state.music();
    let config = state.config();
    let closing_submissions = store.submissions_for_round(closing.id.clone()).await?;

    let results = if with_results {
        let prior_number = closing.number - 1;
        let prior = store
            .round_by_number(group.id, prior_number)
            .await?
            .ok_or_else(|| {
                ServiceError::Inconsistent(format!(
                    "round {prior_number} of group `{}` is missing",
                    group.id
                ))
            })?;
        Some(
            results::compute(
                store,
                music.as_ref(),
                config,
                group,
                &closing,
                &closing_submissions,
                &prior,
                now,
            )
            .await?,
        )
    } else {
        None
    };

    let close_at = close_time(group, now)?;
    let (track_uris, survey) = shuffle_round(state, &closing_submissions);

    let playlist = create_round_playlist(state, group, &closing, track_uris).await?;

    // Overwrites the tally of an earlier attempt whose round creation failed.
    if let Some(results) = results {
        match store.replace_results(results).await {
            Ok(()) => {}
            Err(err) if err.is_conflict() => {
                info!(
                    group_id = %group.id,
                    round = closing.number,
                    "results recorded concurrently"
                );
            }
            Err(err) => return Err(err.into()),
        }
    }

    let theme = theme::apply_and_clear(store, group.id).await?;

    let round = RoundEntity {
        id: format!(
            "{}+{}",
            group.id,
            closing.close_at.unix_timestamp_nanos() / 1_000_000
        ),
        group_id: group.id,
        number: next,
        close_at,
        playlist_link: Some(playlist.external_url),
        survey: Some(survey),
        theme: theme.clone(),
        created_at: now,
    };

    match store.create_round(round.clone()).await {
        Ok(()) => {
            info!(
                group_id = %group.id,
                round = next,
                close_at = %round.close_at,
                "round advanced"
            );
            Ok(round)
        }
        Err(err) => {
            if let Some(theme) = theme {
                theme::restore_pending(store, group.id, theme).await;
            }
            if err.is_conflict() {
                warn!(group_id = %group.id, round = next, "round created concurrently; re-reading");
                reread_latest(store, group.id).await
            } else {
                Err(err.into())
            }
        }
    }
}

fn close_time(group: &GroupEntity, now: OffsetDateTime) -> Result<OffsetDateTime, ServiceError> {
    schedule::next_occurrence(now, &group.schedule).map_err(|err| {
        ServiceError::Inconsistent(format!("stored schedule of group `{}`: {err}", group.id))
    })
}

/// Independently shuffled track list and survey for the songs of the closing round.
fn shuffle_round(
    state: &SharedState,
    submissions: &[SubmissionEntity],
) -> (Vec<String>, SurveyEntity) {
    let mut rng = rand::rng();
    let mut track_uris: Vec<String> = submissions
        .iter()
        .map(|submission| state.config().track_uri(&submission.song.track_id))
        .collect();
    track_uris.shuffle(&mut rng);
    let survey = survey::build(submissions, &mut rng);
    (track_uris, survey)
}

/// Create the playlist of the songs under survey and mirror them into the master playlist.
async fn create_round_playlist(
    state: &SharedState,
    group: &GroupEntity,
    closing: &RoundEntity,
    track_uris: Vec<String>,
) -> Result<PlaylistHandle, ServiceError> {
    let music = state.music();
    let playlist = music
        .create_playlist(
            format!("{} SOTW #{}", group.name, closing.number),
            format!("Week {} for {} Song of the Week.", closing.number, group.name),
            group.owner_id,
        )
        .await
        .inspect_err(|err| warn!(group_id = %group.id, error = %err, "round playlist creation failed"))?;

    if !track_uris.is_empty() {
        music
            .add_tracks(playlist.id.clone(), track_uris.clone(), group.owner_id)
            .await?;
        music
            .add_tracks(group.master_playlist.id.clone(), track_uris, group.owner_id)
            .await?;
    }

    Ok(playlist)
}

async fn reread_latest(store: &dyn RoundStore, group_id: Uuid) -> Result<RoundEntity, ServiceError> {
    store.latest_round(group_id).await?.ok_or_else(|| {
        ServiceError::Inconsistent(format!(
            "round creation conflicted but group `{group_id}` has no round"
        ))
    })
}
