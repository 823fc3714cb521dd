pub mod account_service;
pub mod game_client;

pub use account_service::{AccountService, PlayReport, PlayResult, ReconcileMode};
pub use game_client::GameApiClient;
