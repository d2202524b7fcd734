/// OpenAPI documentation generation.
pub mod documentation;
/// ParticipationGate: may a past-due round close?
pub mod gate;
/// Participants, groups, memberships and results lookup.
pub mod group_service;
/// Health check service.
pub mod health_service;
/// ResultsCalculator: vote tally, guess ranking and placements.
pub mod results;
/// RoundAdvancer: get-or-advance of a group's current round.
pub mod round_service;
/// TimeScheduleResolver and the clock abstraction.
pub mod schedule;
/// Storage connection supervisor toggling degraded mode.
pub mod storage_supervisor;
/// Song submissions with votes and guesses.
pub mod submission_service;
/// SurveyGenerator: anonymized, independently shuffled survey.
pub mod survey;
/// ThemeManager: pending theme of a group.
pub mod theme;
