// Shuffle - picks the next item for a list
// Either plain random, or a fair round where nothing repeats until every item has shown up

pub mod manager; // per-list rounds behind a mutex

pub use manager::ShuffleSessionManager;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShuffleError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
