/// Errors from the Battle.net API layer.
///
/// HTTP statuses other than a failed token request are not errors here:
/// the profile client turns them into a [`SoulbindLookup`] so the caller can
/// decide between retrying and deleting.
///
/// [`SoulbindLookup`]: crate::profile::SoulbindLookup
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, body).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The token endpoint refused the client-credentials grant.
    #[error("Token request failed ({status}): {body}")]
    Token {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A profile URL could not be built from the configured base.
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_error_display() {
        let err = ApiError::Token {
            status: 401,
            body: "invalid_client".into(),
        };
        assert_eq!(err.to_string(), "Token request failed (401): invalid_client");
    }

    #[test]
    fn request_error_display() {
        let req_err = reqwest::Client::new().get("://bad").build().unwrap_err();
        let err = ApiError::Request(req_err);
        assert!(err.to_string().contains("HTTP request failed"));
    }
}
