//! HTTP client for the external prize-game server
//!
//! Every call is a `POST` of `{ "route": ..., "data": { ... } }` to a single
//! endpoint, sent with the headers the official web client uses.

use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, ORIGIN, REFERER},
    Client, Response,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use shared::{
    config::GameApiConfig, AppError, GameEndResponse, GameStartResponse, HubStats, Result,
    WalletListResponse,
};
use std::time::{Duration, Instant};
use tracing::{debug, error};

use crate::observability::record_game_api_call;

pub const GAME_SERVICE: &str = "game_api";

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36";
const GAME_TYPE: &str = "rpp";
const GAME_NAME: &str = "default";

#[derive(Debug, Clone)]
pub struct GameApiClient {
    client: Client,
    api_url: String,
}

impl GameApiClient {
    pub fn new(config: &GameApiConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(default_headers(config)?)
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: config.url.clone(),
        })
    }

    /// Starts a game, or reports the finished game if the account already played.
    pub async fn start_game(&self, session: &str) -> Result<GameStartResponse> {
        self.post_route(
            "game_start",
            json!({ "type": GAME_TYPE, "name": GAME_NAME, "session": session }),
        )
        .await
    }

    /// Ends a started game, which claims its prize.
    pub async fn end_game(&self, session: &str, game_id: &str) -> Result<GameEndResponse> {
        self.post_route(
            "game_end",
            json!({
                "type": GAME_TYPE,
                "name": GAME_NAME,
                "session": session,
                "game_id": game_id,
                "playtime": null
            }),
        )
        .await
    }

    pub async fn get_wallet(&self, session: &str) -> Result<WalletListResponse> {
        self.post_route(
            "wallet_list",
            json!({ "session": session, "name": GAME_NAME, "getLink": true }),
        )
        .await
    }

    pub async fn get_hub(&self, session: &str) -> Result<HubStats> {
        self.post_route("hub", json!({ "session": session, "name": GAME_NAME }))
            .await
    }

    async fn post_route<T>(&self, route: &str, data: Value) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let payload = json!({ "route": route, "data": data });
        debug!("🎮 [API] Request: route={}", route);

        let start = Instant::now();
        let result = match self.client.post(&self.api_url).json(&payload).send().await {
            Ok(response) => self.handle_response(route, response).await,
            Err(e) => Err(map_reqwest_error(route, e)),
        };
        record_game_api_call(route, result.is_ok(), start.elapsed().as_secs_f64());

        if let Err(e) = &result {
            error!("❌ [API] {} failed: {}", route, e);
        }
        result
    }

    async fn handle_response<T>(&self, route: &str, response: Response) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::external_service(
                GAME_SERVICE,
                format!("API request failed with status {}: {}", status.as_u16(), error_text),
            ));
        }

        let body: Value = response.json().await.map_err(|e| {
            AppError::unexpected_response(GAME_SERVICE, format!("{} returned invalid JSON: {}", route, e))
        })?;
        debug!("🎮 [API] Response: route={} status={} body={}", route, status.as_u16(), body);

        if let Some(message) = body.get("error").and_then(Value::as_str) {
            return Err(AppError::unexpected_response(
                GAME_SERVICE,
                format!("{} rejected: {}", route, message),
            ));
        }

        serde_json::from_value(body).map_err(|e| {
            AppError::unexpected_response(GAME_SERVICE, format!("Failed to decode {} response: {}", route, e))
        })
    }
}

fn default_headers(config: &GameApiConfig) -> Result<HeaderMap> {
    let origin = config.origin.trim_end_matches('/');
    let header = |value: &str| {
        HeaderValue::from_str(value)
            .map_err(|e| AppError::configuration(format!("Invalid header value {:?}: {}", value, e)))
    };

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(HeaderName::from_static("bm-country"), header(&config.country)?);
    headers.insert(ORIGIN, header(origin)?);
    headers.insert(REFERER, header(&format!("{}/", origin))?);
    headers.insert(
        HeaderName::from_static("sec-ch-ua"),
        HeaderValue::from_static("\"Not)A;Brand\";v=\"8\", \"Chromium\";v=\"138\""),
    );
    headers.insert(HeaderName::from_static("sec-ch-ua-mobile"), HeaderValue::from_static("?0"));
    headers.insert(HeaderName::from_static("sec-ch-ua-platform"), HeaderValue::from_static("\"Linux\""));
    headers.insert(HeaderName::from_static("sec-fetch-dest"), HeaderValue::from_static("empty"));
    headers.insert(HeaderName::from_static("sec-fetch-mode"), HeaderValue::from_static("cors"));
    headers.insert(HeaderName::from_static("sec-fetch-site"), HeaderValue::from_static("cross-site"));
    Ok(headers)
}

fn map_reqwest_error(route: &str, error: reqwest::Error) -> AppError {
    if error.is_timeout() {
        AppError::timeout(format!("{} request to the game server timed out", route))
    } else if error.is_connect() {
        AppError::service_unavailable(GAME_SERVICE)
    } else {
        AppError::external_service(GAME_SERVICE, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Config, GameStartOutcome};
    use wiremock::matchers::{body_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> GameApiClient {
        let mut config = Config::default().game_api;
        config.url = format!("{}/server.php", server.uri());
        GameApiClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_start_game_sends_route_envelope_and_browser_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("origin", "https://rockpaperprizes.com"))
            .and(header("referer", "https://rockpaperprizes.com/"))
            .and(header("bm-country", "ca"))
            .and(body_json(json!({
                "route": "game_start",
                "data": { "type": "rpp", "name": "default", "session": "sess-1" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "videokey": "vk",
                "prize": { "title": "Free Coffee", "sprite": "coffee" },
                "game_id": "g-42",
                "time": "2025-07-20 10:00:00",
                "turn": { "current": 1, "max": 1 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client_for(&server).start_game("sess-1").await.unwrap();
        assert_eq!(
            response.outcome(),
            GameStartOutcome::Started {
                game_id: "g-42".to_string(),
                prize_title: Some("Free Coffee".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_end_game_sends_null_playtime() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(json!({
                "route": "game_end",
                "data": {
                    "type": "rpp",
                    "name": "default",
                    "session": "sess-1",
                    "game_id": "g-42",
                    "playtime": null
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client_for(&server).end_game("sess-1", "g-42").await.unwrap();
        assert!(response.success);
    }

    #[tokio::test]
    async fn test_wallet_and_hub_requests() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(json!({
                "route": "wallet_list",
                "data": { "session": "sess-1", "name": "default", "getLink": true }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "vouchers": [{ "id": 7, "title": "Chips", "expires": "2030-01-01", "created": "2025-07-20", "sprite": "chips" }],
                "walletLink": "https://wallet.example/w"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_json(json!({
                "route": "hub",
                "data": { "session": "sess-1", "name": "default" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "played_today": false,
                "completed": 4,
                "won": 2,
                "rpp_bonus": []
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let wallet = client.get_wallet("sess-1").await.unwrap();
        assert_eq!(wallet.vouchers[0].id, "7");
        assert_eq!(wallet.wallet_link.as_deref(), Some("https://wallet.example/w"));

        let hub = client.get_hub("sess-1").await.unwrap();
        assert!(!hub.played_today);
        assert_eq!(hub.win_rate(), 50);
    }

    #[tokio::test]
    async fn test_non_success_status_carries_code_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("session expired"))
            .mount(&server)
            .await;

        let error = client_for(&server).get_hub("bad").await.unwrap_err();
        assert!(matches!(error, AppError::ExternalService { .. }));
        assert_eq!(
            error.account_message(),
            "API request failed with status 401: session expired"
        );
    }

    #[tokio::test]
    async fn test_error_payload_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": "invalid session" })))
            .mount(&server)
            .await;

        let error = client_for(&server).get_wallet("bad").await.unwrap_err();
        assert!(matches!(error, AppError::UnexpectedResponse { .. }));
        assert_eq!(error.account_message(), "wallet_list rejected: invalid session");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_service_unavailable() {
        let mut config = Config::default().game_api;
        config.url = "http://127.0.0.1:9/server.php".to_string();
        let client = GameApiClient::new(&config).unwrap();

        let error = client.start_game("sess").await.unwrap_err();
        assert!(matches!(
            error,
            AppError::ServiceUnavailable { .. } | AppError::ExternalService { .. } | AppError::Timeout { .. }
        ));
    }
}
