use std::path::PathBuf;

/// Errors raised while loading or validating domain data.
///
/// Every variant here is fatal at startup: the worker refuses to touch the
/// store or the API until its static inputs are well formed.
#[derive(Debug, thiserror::Error)]
pub enum CovdbError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid slug '{slug}' for realm '{realm}'")]
    InvalidSlug { realm: String, slug: String },

    #[error("Realm '{0}' is not in the realm table")]
    UnknownRealm(String),

    #[error("Unknown region '{0}' (expected one of us, eu, kr, tw)")]
    UnknownRegion(String),

    #[error("Unknown faction '{0}' (expected horde or alliance)")]
    UnknownFaction(String),

    #[error("No credentials configured for worker '{0}'")]
    MissingCredentials(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}
