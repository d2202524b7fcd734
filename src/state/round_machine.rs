//! Transition table driving the lifecycle of a group's rounds.
//!
//! The table only decides *what* must happen; the round service performs the side
//! effects of the returned [`Step`]. A blocked gate maps to [`Step::Blocked`], which
//! carries no successor phase, so nothing can be persisted on that path.

use thiserror::Error;

/// Observable phase of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// The group has never had a round.
    NoRound,
    /// Round `n` is current.
    Round(u32),
}

/// Verdict of the participation gate, stripped of its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateVerdict {
    Proceed,
    Blocked,
}

/// Inputs fed to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundEvent {
    /// The current phase was read; `past_due` tells whether its close time has passed.
    Observed { past_due: bool },
    /// The participation gate was evaluated for a past-due round.
    GateEvaluated(GateVerdict),
}

/// Action to perform for a `(phase, event)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Create round 0.
    Bootstrap,
    /// Keep the current round; nothing to do.
    Hold,
    /// The round is past due; evaluate the gate before deciding.
    EvaluateGate,
    /// Close `closing` and open `next`, computing results when `with_results` is set.
    Advance {
        closing: u32,
        next: u32,
        with_results: bool,
    },
    /// The gate refused; the current round stays current.
    Blocked,
}

/// Error returned when an event cannot be applied to a phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the group was in when the invalid event was received.
    pub from: RoundPhase,
    /// The event that cannot be applied from this phase.
    pub event: RoundEvent,
}

/// Look up the step for an event observed in a phase.
pub fn next_step(phase: RoundPhase, event: RoundEvent) -> Result<Step, InvalidTransition> {
    let step = match (phase, event) {
        (RoundPhase::NoRound, RoundEvent::Observed { .. }) => Step::Bootstrap,
        (RoundPhase::Round(_), RoundEvent::Observed { past_due: false }) => Step::Hold,
        (RoundPhase::Round(_), RoundEvent::Observed { past_due: true }) => Step::EvaluateGate,
        (RoundPhase::Round(n), RoundEvent::GateEvaluated(GateVerdict::Proceed)) => {
            Step::Advance {
                closing: n,
                next: n + 1,
                with_results: n >= 1,
            }
        }
        (RoundPhase::Round(_), RoundEvent::GateEvaluated(GateVerdict::Blocked)) => Step::Blocked,
        (from, event) => return Err(InvalidTransition { from, event }),
    };

    Ok(step)
}

impl Step {
    /// Phase reached once the step has been carried out, if it changes the phase.
    pub fn successor(&self) -> Option<RoundPhase> {
        match self {
            Step::Bootstrap => Some(RoundPhase::Round(0)),
            Step::Advance { next, .. } => Some(RoundPhase::Round(*next)),
            Step::Hold | Step::EvaluateGate | Step::Blocked => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observed(past_due: bool) -> RoundEvent {
        RoundEvent::Observed { past_due }
    }

    #[test]
    fn first_access_bootstraps_round_zero() {
        let step = next_step(RoundPhase::NoRound, observed(false)).unwrap();
        assert_eq!(step, Step::Bootstrap);
        assert_eq!(step.successor(), Some(RoundPhase::Round(0)));
    }

    #[test]
    fn round_before_close_time_is_held() {
        let step = next_step(RoundPhase::Round(4), observed(false)).unwrap();
        assert_eq!(step, Step::Hold);
        assert_eq!(step.successor(), None);
    }

    #[test]
    fn past_due_round_goes_through_gate() {
        assert_eq!(
            next_step(RoundPhase::Round(0), observed(true)).unwrap(),
            Step::EvaluateGate
        );
    }

    #[test]
    fn closing_round_zero_skips_results() {
        let step = next_step(
            RoundPhase::Round(0),
            RoundEvent::GateEvaluated(GateVerdict::Proceed),
        )
        .unwrap();
        assert_eq!(
            step,
            Step::Advance {
                closing: 0,
                next: 1,
                with_results: false
            }
        );
        assert_eq!(step.successor(), Some(RoundPhase::Round(1)));
    }

    #[test]
    fn closing_later_rounds_computes_results() {
        let step = next_step(
            RoundPhase::Round(3),
            RoundEvent::GateEvaluated(GateVerdict::Proceed),
        )
        .unwrap();
        assert_eq!(
            step,
            Step::Advance {
                closing: 3,
                next: 4,
                with_results: true
            }
        );
    }

    #[test]
    fn blocked_gate_keeps_phase() {
        let step = next_step(
            RoundPhase::Round(2),
            RoundEvent::GateEvaluated(GateVerdict::Blocked),
        )
        .unwrap();
        assert_eq!(step, Step::Blocked);
        assert_eq!(step.successor(), None);
    }

    #[test]
    fn gate_without_round_is_rejected() {
        let err = next_step(
            RoundPhase::NoRound,
            RoundEvent::GateEvaluated(GateVerdict::Proceed),
        )
        .unwrap_err();
        assert_eq!(err.from, RoundPhase::NoRound);
        assert!(err.to_string().contains("invalid transition"));
    }
}
