pub mod admin;
pub mod health;
pub mod leads;
pub mod posts;
pub mod publish;
pub mod sitemap;

use axum::Router;

use crate::state::AppState;

/// Assemble the full router with all route groups.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(posts::routes())
        .merge(publish::routes())
        .merge(leads::routes())
        .merge(admin::routes())
        .merge(sitemap::routes())
        .with_state(state)
}
