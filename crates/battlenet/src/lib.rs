//! Battle.net API client library.
//!
//! Provides the OAuth2 client-credentials session that authenticates every
//! outbound call, the typed profile (soulbinds) client built on top of it,
//! and a fixed-interval request limiter.

pub mod error;
pub mod limiter;
pub mod oauth;
pub mod profile;

pub use error::ApiError;
pub use limiter::RequestLimiter;
pub use oauth::{ApiResponse, Credentials, OAuthSession};
pub use profile::{ProfileClient, SoulbindLookup, SoulbindSummary};
