pub mod accounts;
pub mod common;
pub mod game;
pub mod reconcile;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::state::AppState;

/// Routes under `/api`
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/state", get(reconcile::get_state))
        .route("/api/refresh-account", get(reconcile::refresh_account))
        .route("/api/accounts", get(accounts::list_accounts))
        .route(
            "/api/account",
            post(accounts::add_account)
                .put(accounts::update_account)
                .delete(accounts::delete_account),
        )
        .route("/api/add-account", post(accounts::add_account))
        .route("/api/delete-account", post(accounts::delete_account_legacy))
        .route("/api/update-note", post(accounts::update_note))
        .route("/api/stats", get(accounts::get_stats))
        .route("/api/export", get(accounts::export_accounts))
        .route("/api/hub/:phone", get(game::get_hub))
        .route("/api/game/start/:phone", get(game::start_game))
        .route("/api/game/end", post(game::end_game))
        .route("/api/wallet/:phone", get(game::get_wallet))
}
