use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use shared::{AccountConfig, AccountState, AccountStatus, AppError, DashboardStats, Result};
use std::sync::Arc;
use tracing::info;

use crate::{
    api::common::{normalize_note, required, PhoneQuery, SimpleApiResponse},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddAccountRequest {
    pub phone: Option<String>,
    pub token: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    pub old_phone: Option<String>,
    pub new_phone: Option<String>,
    pub token: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteAccountRequest {
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateNoteRequest {
    pub phone: Option<String>,
    pub note: Option<String>,
}

/// GET /api/accounts
///
/// Config accounts merged with their state, ordered by status priority.
/// `status` filters by one status (`all` or absent means no filter),
/// `search` is a case-insensitive substring match on the phone.
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<AccountState>>> {
    let status = match query.status.as_deref().map(str::trim) {
        None | Some("") | Some("all") => None,
        Some(raw) => Some(raw.parse::<AccountStatus>().map_err(AppError::validation)?),
    };
    let search = query
        .search
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let mut accounts: Vec<AccountState> = state
        .accounts
        .list_accounts()
        .await
        .into_iter()
        .filter(|account| status.map_or(true, |s| account.status == s))
        .filter(|account| {
            search
                .as_deref()
                .map_or(true, |needle| account.phone.to_lowercase().contains(needle))
        })
        .collect();
    accounts.sort_by_key(|account| account.status.priority());

    Ok(Json(accounts))
}

/// POST /api/account (and the legacy POST /api/add-account)
pub async fn add_account(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AddAccountRequest>,
) -> Result<Json<SimpleApiResponse>> {
    let phone = required(request.phone.as_deref(), "phone")?;
    let token = required(request.token.as_deref(), "token")?;
    let note = normalize_note(request.note);

    state
        .store
        .update_config(|config| {
            if config.iter().any(|account| account.phone == phone) {
                return Err(AppError::conflict("An account with this phone number already exists"));
            }
            config.push(AccountConfig {
                phone: phone.clone(),
                token,
                note,
            });
            Ok(())
        })
        .await?;

    info!("➕ Account {} added", phone);
    Ok(Json(SimpleApiResponse::message("Account added successfully")))
}

/// PUT /api/account
///
/// Replaces phone, token and note. A changed phone moves the stored state
/// to the new key.
pub async fn update_account(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UpdateAccountRequest>,
) -> Result<Json<SimpleApiResponse>> {
    let old_phone = required(request.old_phone.as_deref(), "oldPhone")?;
    let new_phone = required(request.new_phone.as_deref(), "newPhone")?;
    let token = required(request.token.as_deref(), "token")?;
    let updated = AccountConfig {
        phone: new_phone.clone(),
        token,
        note: normalize_note(request.note),
    };

    let entry = updated.clone();
    let _accounts = state.accounts.exclusive().await;
    state
        .store
        .update_config(|config| {
            let index = config
                .iter()
                .position(|account| account.phone == old_phone)
                .ok_or_else(|| AppError::not_found("Account"))?;
            if old_phone != new_phone && config.iter().any(|account| account.phone == new_phone) {
                return Err(AppError::conflict(
                    "An account with the new phone number already exists",
                ));
            }
            config[index] = entry;
            Ok(())
        })
        .await?;

    if old_phone != new_phone {
        state
            .store
            .update_state(|accounts| {
                if let Some(mut moved) = accounts.remove(&old_phone) {
                    moved.phone = new_phone.clone();
                    accounts.insert(new_phone.clone(), moved.merged_with(&updated));
                }
                Ok(())
            })
            .await?;
        info!("✏️ Account {} renamed to {}", old_phone, new_phone);
    } else {
        info!("✏️ Account {} updated", new_phone);
    }

    Ok(Json(SimpleApiResponse::message("Account updated successfully")))
}

/// DELETE /api/account?phone=
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PhoneQuery>,
) -> Result<Json<SimpleApiResponse>> {
    let phone = required(query.phone.as_deref(), "phone")?;

    let _accounts = state.accounts.exclusive().await;
    state
        .store
        .update_config(|config| {
            let before = config.len();
            config.retain(|account| account.phone != phone);
            if config.len() == before {
                return Err(AppError::not_found("Account"));
            }
            Ok(())
        })
        .await?;
    remove_state(&state, &phone).await?;

    info!("🗑️ Account {} deleted", phone);
    Ok(Json(SimpleApiResponse::message("Account deleted successfully")))
}

/// POST /api/delete-account
///
/// Older body-based variant; deleting an unknown phone is not an error.
pub async fn delete_account_legacy(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DeleteAccountRequest>,
) -> Result<Json<SimpleApiResponse>> {
    let phone = required(request.phone.as_deref(), "phone")?;

    let _accounts = state.accounts.exclusive().await;
    state
        .store
        .update_config(|config| {
            config.retain(|account| account.phone != phone);
            Ok(())
        })
        .await?;
    remove_state(&state, &phone).await?;

    info!("🗑️ Account {} deleted", phone);
    Ok(Json(SimpleApiResponse::message("Account deleted successfully")))
}

/// POST /api/update-note
pub async fn update_note(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UpdateNoteRequest>,
) -> Result<Json<SimpleApiResponse>> {
    let phone = required(request.phone.as_deref(), "phone")?;
    let note = normalize_note(request.note);

    state
        .store
        .update_config(|config| {
            let account = config
                .iter_mut()
                .find(|account| account.phone == phone)
                .ok_or_else(|| AppError::not_found("Account"))?;
            account.note = note;
            Ok(())
        })
        .await?;

    Ok(Json(SimpleApiResponse::message("Note updated successfully")))
}

/// GET /api/stats
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<DashboardStats> {
    let accounts = state.accounts.list_accounts().await;
    Json(DashboardStats::from_accounts(&accounts))
}

/// GET /api/export
pub async fn export_accounts(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let accounts = state.accounts.list_accounts().await;
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        export_text(&accounts, Utc::now()),
    )
}

async fn remove_state(state: &AppState, phone: &str) -> Result<()> {
    state
        .store
        .update_state(|accounts| {
            accounts.remove(phone);
            Ok(())
        })
        .await
}

/// One block per account listing its unexpired prizes with redeem links.
pub fn export_text(accounts: &[AccountState], now: DateTime<Utc>) -> String {
    let mut lines = Vec::new();
    for account in accounts {
        lines.push(format!("Account: {}", account.phone));

        let mut prizes = account.valid_prizes(now).peekable();
        if prizes.peek().is_none() {
            lines.push("  (No valid prizes)".to_string());
        }
        for prize in prizes {
            lines.push(format!("  - {}: {}", prize.title, prize.redeem_url()));
        }
        lines.push(String::new());
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Voucher;

    fn voucher(id: &str, title: &str, expires: &str) -> Voucher {
        Voucher {
            id: id.to_string(),
            title: title.to_string(),
            expires: Some(expires.to_string()),
            created: Some("2025-07-01".to_string()),
            sprite: None,
        }
    }

    #[test]
    fn test_export_lists_only_valid_prizes() {
        let now = Utc::now();
        let mut first = AccountState::fresh(&AccountConfig {
            phone: "111".to_string(),
            token: "t".to_string(),
            note: None,
        });
        first.prizes = vec![
            voucher("7", "Free Coffee", "2099-01-01"),
            voucher("8", "Old Chips", "2000-01-01"),
        ];
        let second = AccountState::fresh(&AccountConfig {
            phone: "222".to_string(),
            token: "t".to_string(),
            note: None,
        });

        let text = export_text(&[first, second], now);
        assert_eq!(
            text,
            "Account: 111\n  - Free Coffee: https://rockpaperprizes.com/?p=7&wallet=true\n\nAccount: 222\n  (No valid prizes)\n"
        );
    }

    #[test]
    fn test_export_of_nothing_is_empty() {
        assert_eq!(export_text(&[], Utc::now()), "");
    }
}
