pub mod account_sweep;

pub use account_sweep::start_account_sweep_scheduler;
