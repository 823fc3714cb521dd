//! Account models persisted by the dashboard

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::{HubStats, Voucher};

/// One entry of `config.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountConfig {
    pub phone: String,
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    #[default]
    Idle,
    Cooldown,
    PrizeClaimed,
    Error,
    Checking,
}

impl AccountStatus {
    pub const ALL: [AccountStatus; 5] = [
        AccountStatus::PrizeClaimed,
        AccountStatus::Cooldown,
        AccountStatus::Error,
        AccountStatus::Checking,
        AccountStatus::Idle,
    ];

    /// Dashboard ordering, lowest first.
    pub fn priority(self) -> u8 {
        match self {
            AccountStatus::PrizeClaimed => 1,
            AccountStatus::Cooldown => 2,
            AccountStatus::Error => 3,
            AccountStatus::Checking => 4,
            AccountStatus::Idle => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AccountStatus::Idle => "idle",
            AccountStatus::Cooldown => "cooldown",
            AccountStatus::PrizeClaimed => "prize_claimed",
            AccountStatus::Error => "error",
            AccountStatus::Checking => "checking",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccountStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown account status: {}", s))
    }
}

/// Live state of an account, persisted in `state.json` keyed by phone
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountState {
    pub phone: String,
    pub token: String,
    #[serde(default)]
    pub status: AccountStatus,
    #[serde(default)]
    pub last_checked: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_prize: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub prizes: Vec<Voucher>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hub_stats: Option<HubStats>,
}

impl AccountState {
    /// Minimal state for an account that was never reconciled.
    pub fn fresh(account: &AccountConfig) -> Self {
        Self {
            phone: account.phone.clone(),
            token: account.token.clone(),
            status: AccountStatus::Idle,
            last_checked: None,
            last_prize: None,
            cooldown_until: None,
            prizes: Vec::new(),
            wallet_link: None,
            error: None,
            note: account.note.clone(),
            hub_stats: None,
        }
    }

    /// Keeps the live fields, takes token and note from the config entry.
    pub fn merged_with(mut self, account: &AccountConfig) -> Self {
        self.token = account.token.clone();
        self.note = account.note.clone();
        self
    }

    pub fn is_cooling_down(&self, now: DateTime<Utc>) -> bool {
        self.cooldown_until.map(|until| until > now).unwrap_or(false)
    }

    pub fn valid_prizes(&self, now: DateTime<Utc>) -> impl Iterator<Item = &Voucher> {
        self.prizes.iter().filter(move |prize| !prize.is_expired(now))
    }
}

/// Headline numbers shown at the top of the dashboard
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_accounts: usize,
    pub total_prizes: usize,
    pub recently_claimed: usize,
    pub on_cooldown: usize,
    pub errors: usize,
}

impl DashboardStats {
    pub fn from_accounts(accounts: &[AccountState]) -> Self {
        let count = |status: AccountStatus| accounts.iter().filter(|a| a.status == status).count();
        Self {
            total_accounts: accounts.len(),
            total_prizes: accounts.iter().map(|a| a.prizes.len()).sum(),
            recently_claimed: count(AccountStatus::PrizeClaimed),
            on_cooldown: count(AccountStatus::Cooldown),
            errors: count(AccountStatus::Error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn account() -> AccountConfig {
        AccountConfig {
            phone: "5551234567".to_string(),
            token: "tok-1".to_string(),
            note: Some("main".to_string()),
        }
    }

    #[test]
    fn test_fresh_state_serializes_like_dashboard_expects() {
        let state = AccountState::fresh(&account());
        let value = serde_json::to_value(&state).unwrap();

        assert_eq!(
            value,
            json!({
                "phone": "5551234567",
                "token": "tok-1",
                "status": "idle",
                "lastChecked": null,
                "prizes": [],
                "note": "main"
            })
        );
    }

    #[test]
    fn test_state_reads_legacy_file_entry() {
        let state: AccountState = serde_json::from_value(json!({
            "phone": "5551234567",
            "token": "old",
            "status": "prize_claimed",
            "lastChecked": "2025-07-20T10:00:00.000Z",
            "lastPrize": "Free Coffee",
            "cooldownUntil": "2025-07-21T10:00:00.000Z",
            "prizes": [{ "id": "v1", "title": "Free Coffee", "expires": "2025-08-01", "created": "2025-07-20", "sprite": "c" }]
        }))
        .unwrap();

        assert_eq!(state.status, AccountStatus::PrizeClaimed);
        assert_eq!(state.prizes.len(), 1);

        let merged = state.merged_with(&account());
        assert_eq!(merged.token, "tok-1");
        assert_eq!(merged.note.as_deref(), Some("main"));
        assert_eq!(merged.last_prize.as_deref(), Some("Free Coffee"));
    }

    #[test]
    fn test_cooldown_check() {
        let now = Utc::now();
        let mut state = AccountState::fresh(&account());
        assert!(!state.is_cooling_down(now));

        state.cooldown_until = Some(now + Duration::hours(1));
        assert!(state.is_cooling_down(now));

        state.cooldown_until = Some(now - Duration::seconds(1));
        assert!(!state.is_cooling_down(now));
    }

    #[test]
    fn test_status_parsing_and_priority() {
        assert_eq!("prize_claimed".parse::<AccountStatus>(), Ok(AccountStatus::PrizeClaimed));
        assert!("sleeping".parse::<AccountStatus>().is_err());
        assert!(AccountStatus::PrizeClaimed.priority() < AccountStatus::Idle.priority());
        assert_eq!(AccountStatus::Checking.to_string(), "checking");
    }

    #[test]
    fn test_dashboard_stats() {
        let base = AccountState::fresh(&account());
        let voucher: Voucher = serde_json::from_value(json!({ "id": "v1", "title": "Chips" })).unwrap();

        let claimed = AccountState {
            status: AccountStatus::PrizeClaimed,
            prizes: vec![voucher.clone(), voucher],
            ..base.clone()
        };
        let cooling = AccountState {
            status: AccountStatus::Cooldown,
            ..base.clone()
        };
        let failed = AccountState {
            status: AccountStatus::Error,
            ..base.clone()
        };

        let stats = DashboardStats::from_accounts(&[claimed, cooling, failed, base]);
        assert_eq!(
            stats,
            DashboardStats {
                total_accounts: 4,
                total_prizes: 2,
                recently_claimed: 1,
                on_cooldown: 1,
                errors: 1,
            }
        );
    }
}
