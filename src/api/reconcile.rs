use axum::{
    extract::{Query, State},
    Json,
};
use shared::{AccountState, Result};
use std::sync::Arc;

use crate::{
    api::common::{required, PhoneQuery},
    state::AppState,
};

/// GET /api/state
///
/// Runs a sweep over every account and returns the resulting states.
pub async fn get_state(State(state): State<Arc<AppState>>) -> Result<Json<Vec<AccountState>>> {
    let accounts = state.accounts.reconcile_all().await?;
    Ok(Json(accounts))
}

/// GET /api/refresh-account?phone=
pub async fn refresh_account(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PhoneQuery>,
) -> Result<Json<Vec<AccountState>>> {
    let phone = required(query.phone.as_deref(), "phone")?;
    let accounts = state.accounts.refresh_account(&phone).await?;
    Ok(Json(accounts))
}
