use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use shared::{GameEndResponse, GameStartResponse, HubStats, Result, WalletListResponse};
use std::sync::Arc;
use tracing::info;

use crate::{api::common::required, state::AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndGameRequest {
    pub phone: Option<String>,
    pub game_id: Option<String>,
}

/// GET /api/hub/:phone
pub async fn get_hub(
    State(state): State<Arc<AppState>>,
    Path(phone): Path<String>,
) -> Result<Json<HubStats>> {
    info!("📊 Hub stats requested for {}", phone);
    let hub = state.accounts.fetch_hub(&phone).await?;
    Ok(Json(hub))
}

/// GET /api/game/start/:phone
///
/// Starts a game without claiming it; returns the game server's answer as is.
pub async fn start_game(
    State(state): State<Arc<AppState>>,
    Path(phone): Path<String>,
) -> Result<Json<GameStartResponse>> {
    info!("🎮 Manual game start for {}", phone);
    let response = state.accounts.start_game(&phone).await?;
    Ok(Json(response))
}

/// POST /api/game/end
pub async fn end_game(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EndGameRequest>,
) -> Result<Json<GameEndResponse>> {
    let phone = required(request.phone.as_deref(), "phone")?;
    let game_id = required(request.game_id.as_deref(), "gameId")?;

    info!("🏁 Ending game {} for {}", game_id, phone);
    let response = state.accounts.end_game(&phone, &game_id).await?;
    Ok(Json(response))
}

/// GET /api/wallet/:phone
pub async fn get_wallet(
    State(state): State<Arc<AppState>>,
    Path(phone): Path<String>,
) -> Result<Json<WalletListResponse>> {
    let wallet = state.accounts.fetch_wallet(&phone).await?;
    info!("👛 Wallet for {}: {} vouchers", phone, wallet.vouchers.len());
    Ok(Json(wallet))
}
