//! Participation gate deciding whether a past-due round may close.

use uuid::Uuid;

use crate::{dao::models::ParticipantEntity, state::round_machine::GateVerdict};

/// Minimum roster size for a competition to run.
pub const MIN_PARTICIPANTS: usize = 3;

pub const NOT_ENOUGH_PARTICIPANTS: &str = "not_enough_participants";
pub const MISSING_SUBMISSIONS: &str = "missing_submissions";

const NOT_ENOUGH_PARTICIPANTS_MESSAGE: &str = "You will need at least three players in your Song of the Week competition in order to continue playing.";

/// Outcome of [`evaluate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateResult {
    Proceed,
    Blocked {
        reason_code: &'static str,
        message: String,
        /// Display names, in roster order.
        missing_participants: Vec<String>,
    },
}

impl GateResult {
    pub fn verdict(&self) -> GateVerdict {
        match self {
            GateResult::Proceed => GateVerdict::Proceed,
            GateResult::Blocked { .. } => GateVerdict::Blocked,
        }
    }
}

/// Check the roster size, then that every member submitted for the round.
pub fn evaluate(roster: &[ParticipantEntity], submitted: &[Uuid]) -> GateResult {
    if roster.len() < MIN_PARTICIPANTS {
        return GateResult::Blocked {
            reason_code: NOT_ENOUGH_PARTICIPANTS,
            message: NOT_ENOUGH_PARTICIPANTS_MESSAGE.to_owned(),
            missing_participants: Vec::new(),
        };
    }

    let missing: Vec<String> = roster
        .iter()
        .filter(|participant| !submitted.contains(&participant.id))
        .map(|participant| participant.name.clone())
        .collect();

    if missing.is_empty() {
        return GateResult::Proceed;
    }

    let players = if missing.len() == 1 { "player" } else { "players" };
    let message = format!(
        "Please make sure everyone has submitted their surveys for the week. Looks like we're still waiting on {} {players} to submit: {}",
        missing.len(),
        enumerate(&missing),
    );

    GateResult::Blocked {
        reason_code: MISSING_SUBMISSIONS,
        message,
        missing_participants: missing,
    }
}

/// English enumeration: "A", "A and B", "A, B, and C".
pub fn enumerate(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{first} and {second}"),
        [init @ .., last] => format!("{}, and {last}", init.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(names: &[&str]) -> Vec<ParticipantEntity> {
        names
            .iter()
            .map(|name| ParticipantEntity {
                id: Uuid::new_v4(),
                name: (*name).to_owned(),
            })
            .collect()
    }

    #[test]
    fn enumerates_with_oxford_comma() {
        let names = |list: &[&str]| list.iter().map(|n| n.to_string()).collect::<Vec<_>>();
        assert_eq!(enumerate(&names(&["A"])), "A");
        assert_eq!(enumerate(&names(&["A", "B"])), "A and B");
        assert_eq!(enumerate(&names(&["A", "B", "C"])), "A, B, and C");
        assert_eq!(enumerate(&names(&["A", "B", "C", "D"])), "A, B, C, and D");
    }

    #[test]
    fn small_roster_is_blocked_even_when_everyone_submitted() {
        let members = roster(&["ann", "bob"]);
        let submitted: Vec<Uuid> = members.iter().map(|p| p.id).collect();

        let GateResult::Blocked {
            reason_code,
            message,
            missing_participants,
        } = evaluate(&members, &submitted)
        else {
            panic!("expected blocked");
        };
        assert_eq!(reason_code, NOT_ENOUGH_PARTICIPANTS);
        assert_eq!(message, NOT_ENOUGH_PARTICIPANTS_MESSAGE);
        assert!(missing_participants.is_empty());
    }

    #[test]
    fn lists_missing_participants_in_roster_order() {
        let members = roster(&["test1", "test2", "test3", "test4"]);
        let submitted = vec![members[2].id];

        let GateResult::Blocked {
            reason_code,
            message,
            missing_participants,
        } = evaluate(&members, &submitted)
        else {
            panic!("expected blocked");
        };
        assert_eq!(reason_code, MISSING_SUBMISSIONS);
        assert_eq!(missing_participants, vec!["test1", "test2", "test4"]);
        assert_eq!(
            message,
            "Please make sure everyone has submitted their surveys for the week. Looks like we're still waiting on 3 players to submit: test1, test2, and test4"
        );
    }

    #[test]
    fn single_missing_participant_uses_singular() {
        let members = roster(&["ann", "bob", "cat"]);
        let submitted = vec![members[0].id, members[2].id];

        let result = evaluate(&members, &submitted);
        let GateResult::Blocked { message, .. } = &result else {
            panic!("expected blocked");
        };
        assert!(message.ends_with("waiting on 1 player to submit: bob"));
        assert_eq!(result.verdict(), GateVerdict::Blocked);
    }

    #[test]
    fn complete_round_proceeds() {
        let members = roster(&["ann", "bob", "cat"]);
        let submitted: Vec<Uuid> = members.iter().rev().map(|p| p.id).collect();
        assert_eq!(evaluate(&members, &submitted), GateResult::Proceed);
    }
}
