//! Refresh worker for the covenant database.
//!
//! The binary wires these modules together; everything that talks to the
//! store or the API goes through the [`store::CharacterStore`] and
//! [`source::SoulbindSource`] seams so it can be tested in memory.

pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod insert;
pub mod progress;
pub mod seed;
pub mod source;
pub mod store;

pub use engine::{RecordOutcome, RefreshEngine, RunOutcome};
pub use error::WorkerError;
pub use progress::{Progress, RunContext};
pub use store::{CharacterStore, PgCharacterStore};
