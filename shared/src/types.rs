//! Wire types for the external prize-game server

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::utils::{
    bool_or_int, lenient_u32, map_or_seq, opt_string_or_number, parse_api_timestamp,
    string_or_number,
};

pub const REDEEM_BASE_URL: &str = "https://rockpaperprizes.com/";

fn is_false(value: &bool) -> bool {
    !*value
}

/// A prize/voucher held in an account's wallet
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Voucher {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub expires: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprite: Option<String>,
}

impl Voucher {
    /// Expired only when the expiry parses and lies in the past.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires
            .as_deref()
            .and_then(parse_api_timestamp)
            .map(|expires| expires < now)
            .unwrap_or(false)
    }

    pub fn redeem_url(&self) -> String {
        format!(
            "{}?p={}&wallet=true",
            REDEEM_BASE_URL,
            urlencoding::encode(&self.id)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RppBonus {
    #[serde(default)]
    pub value: Value,
    #[serde(default, deserialize_with = "bool_or_int")]
    pub completed: bool,
}

/// Daily play summary returned by the `hub` route
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct HubStats {
    #[serde(default, deserialize_with = "bool_or_int")]
    pub played_today: bool,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub completed: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub won: u32,
    #[serde(default, deserialize_with = "map_or_seq")]
    pub rpp_bonus: BTreeMap<String, RppBonus>,
    #[serde(
        default,
        deserialize_with = "opt_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub tomorrow: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HubStats {
    /// Percentage of completed games that were won, rounded.
    pub fn win_rate(&self) -> u32 {
        if self.completed == 0 {
            return 0;
        }
        ((self.won as f64 / self.completed as f64) * 100.0).round() as u32
    }

    /// When the next game becomes available, if the server said so.
    pub fn next_play_at(&self) -> Option<DateTime<Utc>> {
        self.tomorrow.as_deref().and_then(parse_api_timestamp)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GamePrize {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprite: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameTurn {
    #[serde(default, deserialize_with = "lenient_u32")]
    pub current: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub max: u32,
}

/// Response of the `game_start` route.
///
/// The server answers with one of two shapes: a started game (`videokey`,
/// `turn`, ...) or, when the account already played, the finished game with
/// `completed: true`. Both carry `game_id`, `prize` and `time`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct GameStartResponse {
    #[serde(default, deserialize_with = "bool_or_int", skip_serializing_if = "is_false")]
    pub completed: bool,
    #[serde(
        default,
        deserialize_with = "opt_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub game_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prize: Option<GamePrize>,
    #[serde(
        default,
        deserialize_with = "opt_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub videokey: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn: Option<GameTurn>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameStartOutcome {
    /// Already played; `time` is the server-reported timestamp, if any.
    Cooldown { time: Option<String> },
    Started {
        game_id: String,
        prize_title: Option<String>,
    },
    Unrecognized,
}

impl GameStartResponse {
    pub fn outcome(&self) -> GameStartOutcome {
        if self.completed {
            return GameStartOutcome::Cooldown {
                time: self.time.clone(),
            };
        }
        match &self.game_id {
            Some(game_id) if !game_id.is_empty() => GameStartOutcome::Started {
                game_id: game_id.clone(),
                prize_title: self
                    .prize
                    .as_ref()
                    .map(|p| p.title.clone())
                    .filter(|t| !t.is_empty()),
            },
            _ => GameStartOutcome::Unrecognized,
        }
    }
}

/// Response of the `game_end` route
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct GameEndResponse {
    #[serde(default, deserialize_with = "bool_or_int")]
    pub success: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of the `wallet_list` route
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct WalletListResponse {
    #[serde(default)]
    pub vouchers: Vec<Voucher>,
    #[serde(rename = "walletLink", default, skip_serializing_if = "Option::is_none")]
    pub wallet_link: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_game_start_outcome_started() {
        let response: GameStartResponse = serde_json::from_value(json!({
            "videokey": "abc",
            "prize": { "title": "Free Coffee", "sprite": "coffee" },
            "game_id": "g-1",
            "time": "2025-07-20 10:00:00",
            "turn": { "current": 1, "max": 3 }
        }))
        .unwrap();

        assert_eq!(
            response.outcome(),
            GameStartOutcome::Started {
                game_id: "g-1".to_string(),
                prize_title: Some("Free Coffee".to_string()),
            }
        );
    }

    #[test]
    fn test_game_start_outcome_cooldown_wins_over_game_id() {
        let response: GameStartResponse = serde_json::from_value(json!({
            "completed": true,
            "game_id": 991,
            "prize": { "title": "Chips", "sprite": "chips" },
            "time": "2025-07-21T04:00:00Z"
        }))
        .unwrap();

        assert_eq!(
            response.outcome(),
            GameStartOutcome::Cooldown {
                time: Some("2025-07-21T04:00:00Z".to_string())
            }
        );
    }

    #[test]
    fn test_game_start_outcome_unrecognized() {
        let response: GameStartResponse =
            serde_json::from_value(json!({ "message": "maintenance" })).unwrap();
        assert_eq!(response.outcome(), GameStartOutcome::Unrecognized);
        assert_eq!(response.extra.get("message"), Some(&json!("maintenance")));
    }

    #[test]
    fn test_hub_stats_parsing_and_win_rate() {
        let hub: HubStats = serde_json::from_value(json!({
            "played_today": 1,
            "completed": "8",
            "won": 3,
            "rpp_bonus": { "streak": { "value": "x2", "completed": true } },
            "tomorrow": "2025-07-21T04:00:00Z",
            "points": 120
        }))
        .unwrap();

        assert!(hub.played_today);
        assert_eq!(hub.win_rate(), 38);
        assert!(hub.rpp_bonus["streak"].completed);
        assert_eq!(hub.extra.get("points"), Some(&json!(120)));
        assert_eq!(
            hub.next_play_at(),
            Some(Utc.with_ymd_and_hms(2025, 7, 21, 4, 0, 0).unwrap())
        );

        let empty: HubStats = serde_json::from_value(json!({ "rpp_bonus": [] })).unwrap();
        assert!(!empty.played_today);
        assert_eq!(empty.win_rate(), 0);
        assert!(empty.rpp_bonus.is_empty());
    }

    #[test]
    fn test_voucher_expiry_and_redeem_url() {
        let now = Utc.with_ymd_and_hms(2025, 7, 20, 12, 0, 0).unwrap();
        let voucher: Voucher = serde_json::from_value(json!({
            "id": 12345,
            "title": "Free Coffee",
            "expires": "2025-07-19 23:59:59",
            "created": "2025-07-01 10:00:00",
            "sprite": "coffee"
        }))
        .unwrap();

        assert!(voucher.is_expired(now));
        assert_eq!(voucher.redeem_url(), "https://rockpaperprizes.com/?p=12345&wallet=true");

        let no_expiry = Voucher {
            expires: None,
            ..voucher.clone()
        };
        assert!(!no_expiry.is_expired(now));

        let garbage = Voucher {
            expires: Some("soon".to_string()),
            ..voucher
        };
        assert!(!garbage.is_expired(now));
    }

    #[test]
    fn test_wallet_link_renamed() {
        let wallet: WalletListResponse = serde_json::from_value(json!({
            "vouchers": [{ "id": "v1", "title": "Chips" }],
            "walletLink": "https://wallet.example/abc"
        }))
        .unwrap();
        assert_eq!(wallet.vouchers.len(), 1);
        assert_eq!(wallet.wallet_link.as_deref(), Some("https://wallet.example/abc"));
    }
}
