//! Account reconciliation against the game server
//!
//! For each account: hub stats → cooldown or play → start game →
//! end game (claims the prize) → wallet → persist. Accounts are processed one
//! at a time and whole sweeps never overlap.

use chrono::{DateTime, Duration, Utc};
use shared::{
    config::MAX_COOLDOWN_HOURS, utils::parse_api_timestamp, AccountConfig, AccountState, AccountStatus, AppError,
    GameEndResponse, GameStartOutcome, GameStartResponse, HubStats, Result, WalletListResponse,
};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::observability::{record_reconcile, update_account_gauges};
use crate::services::game_client::GameApiClient;
use crate::storage::FileStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileMode {
    /// Respect a cooldown that is still running locally.
    Sweep,
    /// Ask the game server even if the local cooldown has not expired.
    Force,
}

/// What a play attempt found out, applied to the stored state afterwards
#[derive(Debug, Clone, PartialEq)]
pub struct PlayReport {
    pub hub: Option<HubStats>,
    pub result: PlayResult,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlayResult {
    Cooldown {
        until: DateTime<Utc>,
    },
    Claimed {
        prize: Option<String>,
        wallet: WalletListResponse,
        until: DateTime<Utc>,
    },
    Failed {
        message: String,
    },
}

impl PlayReport {
    pub fn apply(self, state: &mut AccountState, now: DateTime<Utc>) {
        if let Some(hub) = self.hub {
            state.hub_stats = Some(hub);
        }
        state.last_checked = Some(now);

        match self.result {
            PlayResult::Cooldown { until } => {
                state.status = AccountStatus::Cooldown;
                state.cooldown_until = Some(until);
                state.error = None;
            }
            PlayResult::Claimed { prize, wallet, until } => {
                state.status = AccountStatus::PrizeClaimed;
                if prize.is_some() {
                    state.last_prize = prize;
                }
                state.prizes = wallet.vouchers;
                if wallet.wallet_link.is_some() {
                    state.wallet_link = wallet.wallet_link;
                }
                state.cooldown_until = Some(until);
                state.error = None;
            }
            PlayResult::Failed { message } => {
                state.status = AccountStatus::Error;
                state.error = Some(message);
            }
        }
    }
}

pub struct AccountService {
    store: Arc<FileStore>,
    game: GameApiClient,
    cooldown: Duration,
    /// Held by sweeps, refreshes, single-step game calls and by account
    /// edits that move or drop state, so none of them interleave.
    sweep_lock: Mutex<()>,
}

impl AccountService {
    pub fn new(store: Arc<FileStore>, game: GameApiClient, cooldown_hours: i64) -> Self {
        Self {
            store,
            game,
            cooldown: Duration::hours(cooldown_hours.clamp(1, MAX_COOLDOWN_HOURS)),
            sweep_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    /// Waits for any running sweep and keeps the next one from starting
    /// until the guard is dropped.
    pub async fn exclusive(&self) -> MutexGuard<'_, ()> {
        self.sweep_lock.lock().await
    }

    /// Config accounts merged with their stored state, in config order.
    pub async fn list_accounts(&self) -> Vec<AccountState> {
        let config = self.store.read_config().await;
        let mut state = self.store.read_state().await;

        config
            .iter()
            .map(|account| match state.remove(&account.phone) {
                Some(existing) => existing.merged_with(account),
                None => AccountState::fresh(account),
            })
            .collect()
    }

    pub async fn find_account(&self, phone: &str) -> Result<AccountConfig> {
        self.store
            .read_config()
            .await
            .into_iter()
            .find(|account| account.phone == phone)
            .ok_or_else(|| AppError::not_found("Account"))
    }

    /// Reconciles every configured account and drops state for removed ones.
    pub async fn reconcile_all(&self) -> Result<Vec<AccountState>> {
        let _sweep = self.sweep_lock.lock().await;
        // A broken account file must not read as "every account was removed"
        let loaded = self.store.load_config().await.map_err(|e| {
            warn!("❌ Sweep aborted, {} is unreadable: {}", self.store.config_path().display(), e);
            AppError::configuration(format!(
                "{} is invalid: {}",
                self.store.config_path().display(),
                e
            ))
        })?;
        let prune = loaded.is_some();
        let config = loaded.unwrap_or_default();
        info!("🔄 Reconciling {} accounts", config.len());

        let mut states = Vec::with_capacity(config.len());
        for account in &config {
            states.push(self.reconcile_account(account, ReconcileMode::Sweep).await?);
        }

        if prune {
            self.store
                .update_state(|state| {
                    state.retain(|phone, _| config.iter().any(|account| &account.phone == phone));
                    Ok(())
                })
                .await?;
        } else {
            warn!("⚠️ {} not found, keeping stored state", self.store.config_path().display());
        }

        update_account_gauges(&states);
        info!("✅ Sweep finished: {}", summarize(&states));
        Ok(states)
    }

    /// Reconciles one account ignoring its local cooldown, returns all accounts.
    pub async fn refresh_account(&self, phone: &str) -> Result<Vec<AccountState>> {
        let _sweep = self.sweep_lock.lock().await;
        let account = self.find_account(phone).await?;
        self.reconcile_account(&account, ReconcileMode::Force).await?;

        let accounts = self.list_accounts().await;
        update_account_gauges(&accounts);
        Ok(accounts)
    }

    pub async fn reconcile_account(&self, account: &AccountConfig, mode: ReconcileMode) -> Result<AccountState> {
        let now = Utc::now();
        let existing = self
            .store
            .read_state()
            .await
            .remove(&account.phone)
            .map(|state| state.merged_with(account))
            .unwrap_or_else(|| AccountState::fresh(account));

        if mode == ReconcileMode::Sweep && existing.is_cooling_down(now) {
            debug!("⏳ {} cooling down until {:?}", account.phone, existing.cooldown_until);
            return self
                .modify_state(account, |state| state.status = AccountStatus::Cooldown)
                .await;
        }

        self.modify_state(account, |state| {
            state.status = AccountStatus::Checking;
            state.last_checked = Some(now);
        })
        .await?;

        let report = self.play(account, now).await;
        let state = self.modify_state(account, |state| report.apply(state, now)).await?;

        record_reconcile(state.status);
        info!("🎯 {} → {}", account.phone, state.status);
        Ok(state)
    }

    async fn play(&self, account: &AccountConfig, now: DateTime<Utc>) -> PlayReport {
        let hub = match self.game.get_hub(&account.token).await {
            Ok(hub) => Some(hub),
            Err(e) => {
                warn!("⚠️ Hub check failed for {}, trying to play anyway: {}", account.phone, e);
                None
            }
        };

        let already_played = hub
            .as_ref()
            .filter(|hub| hub.played_today)
            .map(|hub| hub.next_play_at().unwrap_or(now + self.cooldown));
        if let Some(until) = already_played {
            info!("⏳ {} already played today, next game at {}", account.phone, until);
            return PlayReport {
                hub,
                result: PlayResult::Cooldown { until },
            };
        }

        let result = match self.start_and_claim(account, now).await {
            Ok(result) => result,
            Err(e) => {
                warn!("❌ Error processing account {}: {}", account.phone, e);
                PlayResult::Failed {
                    message: e.account_message(),
                }
            }
        };

        PlayReport { hub, result }
    }

    async fn start_and_claim(&self, account: &AccountConfig, now: DateTime<Utc>) -> Result<PlayResult> {
        let response = self.game.start_game(&account.token).await?;

        match response.outcome() {
            GameStartOutcome::Cooldown { .. } => Ok(PlayResult::Cooldown {
                until: now + self.cooldown,
            }),
            GameStartOutcome::Started { game_id, prize_title } => {
                info!("🏆 {} won {:?}, claiming game {}", account.phone, prize_title, game_id);
                let end = self.game.end_game(&account.token, &game_id).await?;
                if !end.success {
                    warn!("⚠️ game_end for {} did not report success", account.phone);
                }
                let wallet = self.game.get_wallet(&account.token).await?;

                Ok(PlayResult::Claimed {
                    prize: prize_title,
                    wallet,
                    until: now + self.cooldown,
                })
            }
            GameStartOutcome::Unrecognized => Err(AppError::unexpected_response(
                crate::services::game_client::GAME_SERVICE,
                "game_start returned neither a game nor a cooldown",
            )),
        }
    }

    // ------------------------------------------------------------------
    // Single-step actions used by the per-account endpoints
    // ------------------------------------------------------------------

    pub async fn fetch_hub(&self, phone: &str) -> Result<HubStats> {
        let _sweep = self.sweep_lock.lock().await;
        let account = self.find_account(phone).await?;
        let now = Utc::now();

        match self.game.get_hub(&account.token).await {
            Ok(hub) => {
                let cooldown_until = hub.next_play_at().unwrap_or(now + self.cooldown);
                let stored = hub.clone();
                self.modify_state(&account, |state| {
                    state.last_checked = Some(now);
                    if stored.played_today {
                        state.status = AccountStatus::Cooldown;
                        state.cooldown_until = Some(cooldown_until);
                    }
                    state.hub_stats = Some(stored);
                })
                .await?;
                Ok(hub)
            }
            Err(e) => {
                self.record_failure(&account, &e, now).await?;
                Err(e)
            }
        }
    }

    /// Starts a game without claiming it.
    pub async fn start_game(&self, phone: &str) -> Result<GameStartResponse> {
        let _sweep = self.sweep_lock.lock().await;
        let account = self.find_account(phone).await?;
        self.modify_state(&account, |state| state.status = AccountStatus::Checking)
            .await?;

        let now = Utc::now();
        let response = match self.game.start_game(&account.token).await {
            Ok(response) => response,
            Err(e) => {
                self.record_failure(&account, &e, now).await?;
                return Err(e);
            }
        };

        match response.outcome() {
            GameStartOutcome::Cooldown { time } => {
                let until = time
                    .as_deref()
                    .and_then(parse_api_timestamp)
                    .unwrap_or(now + self.cooldown);
                self.modify_state(&account, |state| {
                    state.status = AccountStatus::Cooldown;
                    state.cooldown_until = Some(until);
                    state.last_checked = Some(now);
                })
                .await?;
            }
            GameStartOutcome::Started { prize_title, .. } => {
                self.modify_state(&account, |state| {
                    state.status = AccountStatus::PrizeClaimed;
                    if prize_title.is_some() {
                        state.last_prize = prize_title;
                    }
                    state.last_checked = Some(now);
                })
                .await?;
            }
            GameStartOutcome::Unrecognized => {
                let e = AppError::unexpected_response(
                    crate::services::game_client::GAME_SERVICE,
                    "game_start returned neither a game nor a cooldown",
                );
                self.record_failure(&account, &e, now).await?;
                return Err(e);
            }
        }

        Ok(response)
    }

    /// Ends a game started earlier, which claims its prize.
    pub async fn end_game(&self, phone: &str, game_id: &str) -> Result<GameEndResponse> {
        let _sweep = self.sweep_lock.lock().await;
        let account = self.find_account(phone).await?;
        let now = Utc::now();

        match self.game.end_game(&account.token, game_id).await {
            Ok(response) => {
                self.modify_state(&account, |state| {
                    state.status = AccountStatus::PrizeClaimed;
                    state.last_checked = Some(now);
                })
                .await?;
                Ok(response)
            }
            Err(e) => {
                self.record_failure(&account, &e, now).await?;
                Err(e)
            }
        }
    }

    pub async fn fetch_wallet(&self, phone: &str) -> Result<WalletListResponse> {
        let _sweep = self.sweep_lock.lock().await;
        let account = self.find_account(phone).await?;

        match self.game.get_wallet(&account.token).await {
            Ok(wallet) => {
                let prizes = wallet.vouchers.clone();
                let link = wallet.wallet_link.clone();
                self.modify_state(&account, |state| {
                    state.prizes = prizes;
                    if link.is_some() {
                        state.wallet_link = link;
                    }
                })
                .await?;
                Ok(wallet)
            }
            Err(e) => {
                // A wallet failure does not say anything about the play status
                let message = e.account_message();
                self.modify_state(&account, |state| state.error = Some(message))
                    .await?;
                Err(e)
            }
        }
    }

    async fn record_failure(&self, account: &AccountConfig, error: &AppError, now: DateTime<Utc>) -> Result<()> {
        let message = error.account_message();
        self.modify_state(account, |state| {
            state.status = AccountStatus::Error;
            state.error = Some(message);
            state.last_checked = Some(now);
        })
        .await
        .map(|_| ())
    }

    /// Applies `f` to the stored state of `account` (fresh state if none) and persists it.
    async fn modify_state<F>(&self, account: &AccountConfig, f: F) -> Result<AccountState>
    where
        F: FnOnce(&mut AccountState),
    {
        self.store
            .update_state(|state| {
                let mut entry = state
                    .remove(&account.phone)
                    .map(|existing| existing.merged_with(account))
                    .unwrap_or_else(|| AccountState::fresh(account));
                f(&mut entry);
                state.insert(account.phone.clone(), entry.clone());
                Ok(entry)
            })
            .await
    }
}

fn summarize(states: &[AccountState]) -> String {
    AccountStatus::ALL
        .iter()
        .filter_map(|status| {
            let count = states.iter().filter(|s| s.status == *status).count();
            (count > 0).then(|| format!("{}={}", status, count))
        })
        .collect::<Vec<_>>()
        .join(", ")
}
