//! Domain types shared by every covdb crate.
//!
//! This crate has zero internal deps so the store adapter, the API client
//! and the worker can all depend on it without cycles.

pub mod covenant;
pub mod error;
pub mod realm;
pub mod region;
pub mod retry;
pub mod roster;
pub mod staleness;
pub mod types;

pub use covenant::Covenant;
pub use error::CovdbError;
pub use realm::RealmTable;
pub use region::{Collection, Faction, Region};
