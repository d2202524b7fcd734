use axum::Router;

use crate::state::SharedState;

pub mod docs;
pub mod groups;
pub mod health;
pub mod identity;
pub mod participants;
pub mod rounds;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    health::router()
        .merge(participants::router())
        .merge(groups::router())
        .merge(rounds::router())
        .merge(docs::router())
        .with_state(state)
}
