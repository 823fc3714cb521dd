//! File-backed persistence for accounts and their live state

pub mod file_store;

pub use file_store::{FileStore, StateMap};
