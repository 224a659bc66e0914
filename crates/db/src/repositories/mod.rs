//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument and the target [`Collection`]
//! as the second.
//!
//! [`Collection`]: covdb_core::Collection

pub mod character_repo;

pub use character_repo::CharacterRepo;
