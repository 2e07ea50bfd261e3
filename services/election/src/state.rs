use tokio::sync::watch;

use pilketua_store::DocumentStore;

use crate::config::ElectionConfig;
use crate::domain::window::WindowPolicy;
use crate::projections::{Scoreboard, spawn_scoreboard_feed};

/// Shared application state passed to every handler via axum `State`.
/// Generic over the store so the HTTP layer, like the usecases, runs
/// against any injected backend.
#[derive(Clone)]
pub struct AppState<S>
where
    S: DocumentStore,
{
    pub store: S,
    pub scoreboard: watch::Receiver<Scoreboard>,
    pub policy: WindowPolicy,
    pub admin_user: String,
    pub admin_pass: String,
}

impl<S> AppState<S>
where
    S: DocumentStore,
{
    pub fn new(store: S, config: &ElectionConfig) -> Self {
        Self {
            scoreboard: spawn_scoreboard_feed(store.clone()),
            store,
            policy: WindowPolicy {
                open_when_unscheduled: config.open_when_unscheduled,
            },
            admin_user: config.admin_user.clone(),
            admin_pass: config.admin_pass.clone(),
        }
    }
}
