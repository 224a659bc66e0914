//! Character profile client for the soulbinds endpoint.
//!
//! Wraps `GET /profile/wow/character/{realm}/{name}/soulbinds` and
//! classifies the response by status code so the refresh engine never has
//! to look at raw HTTP.

use covdb_core::Region;
use reqwest::Url;
use serde::Deserialize;

use crate::error::ApiError;
use crate::oauth::OAuthSession;

/// Default API base. `{region}` is replaced with the lowercase region code.
pub const DEFAULT_API_BASE: &str = "https://{region}.api.blizzard.com";

/// Success body of the soulbinds endpoint (only the fields we keep).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SoulbindSummary {
    #[serde(default)]
    pub renown_level: Option<i32>,
    #[serde(default)]
    pub chosen_covenant: Option<ChosenCovenant>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChosenCovenant {
    pub id: i32,
}

impl SoulbindSummary {
    /// `(renown_level, chosen_covenant_id)` when the body carries covenant
    /// data. A missing `chosen_covenant` means none was chosen (id 0).
    pub fn covenant_fields(&self) -> Option<(i32, i32)> {
        let renown = self.renown_level?;
        let id = self.chosen_covenant.as_ref().map_or(0, |c| c.id);
        Some((renown, id))
    }
}

/// Outcome of one soulbinds lookup, classified by HTTP status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoulbindLookup {
    /// 200 with a body that parsed.
    Found(SoulbindSummary),
    /// 200 whose body was not valid JSON for [`SoulbindSummary`].
    Malformed { error: String },
    /// 403 or 404: the character does not exist (any more).
    NotFound { status: u16 },
    /// Anything else, including a 401 that survived re-authentication.
    Unexpected { status: u16 },
}

/// Typed client for character profile endpoints.
pub struct ProfileClient {
    session: OAuthSession,
    api_base: String,
}

impl ProfileClient {
    /// Create a client using [`DEFAULT_API_BASE`].
    pub fn new(session: OAuthSession) -> Self {
        Self::with_api_base(session, DEFAULT_API_BASE)
    }

    /// Create a client against a custom base URL template (tests, proxies).
    pub fn with_api_base(session: OAuthSession, api_base: impl Into<String>) -> Self {
        Self {
            session,
            api_base: api_base.into(),
        }
    }

    /// Build the soulbinds URL. The character name is lowercased and every
    /// path segment is percent-encoded.
    pub fn soulbinds_url(
        &self,
        region: Region,
        realm_slug: &str,
        name: &str,
    ) -> Result<Url, ApiError> {
        let base = self.api_base.replace("{region}", region.as_str());
        let mut url = Url::parse(&base).map_err(|e| ApiError::InvalidUrl(format!("{base}: {e}")))?;
        let character = name.to_lowercase();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(format!("{base}: cannot be a base")))?
            .pop_if_empty()
            .extend([
                "profile",
                "wow",
                "character",
                realm_slug,
                character.as_str(),
                "soulbinds",
            ]);
        url.query_pairs_mut()
            .append_pair("namespace", &region.profile_namespace());
        Ok(url)
    }

    /// Fetch and classify a character's soulbind summary.
    pub async fn soulbinds(
        &self,
        region: Region,
        realm_slug: &str,
        name: &str,
    ) -> Result<SoulbindLookup, ApiError> {
        let url = self.soulbinds_url(region, realm_slug, name)?;
        let response = self.session.call(url.as_str()).await?;
        let status = response.status().as_u16();

        match status {
            200 => {
                let body = response.body();
                match serde_json::from_str::<SoulbindSummary>(body) {
                    Ok(summary) => Ok(SoulbindLookup::Found(summary)),
                    Err(e) => {
                        tracing::debug!(url = %url, body = %body, "Unparseable soulbinds body");
                        Ok(SoulbindLookup::Malformed {
                            error: e.to_string(),
                        })
                    }
                }
            }
            403 | 404 => Ok(SoulbindLookup::NotFound { status }),
            _ => Ok(SoulbindLookup::Unexpected { status }),
        }
    }
}

#[cfg(test)]
mod tests {
    use covdb_core::retry::RetryPolicy;

    use super::*;
    use crate::oauth::Credentials;

    fn client(base: &str) -> ProfileClient {
        let session = OAuthSession::new(
            reqwest::Client::new(),
            "http://localhost/oauth/token",
            Credentials {
                client_id: "id".into(),
                client_secret: "secret".into(),
            },
            RetryPolicy::none(),
        );
        ProfileClient::with_api_base(session, base)
    }

    #[test]
    fn default_url_uses_region_host_and_namespace() {
        let url = client(DEFAULT_API_BASE)
            .soulbinds_url(Region::Eu, "argent-dawn", "Alice")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://eu.api.blizzard.com/profile/wow/character/argent-dawn/alice/soulbinds?namespace=profile-eu"
        );
    }

    #[test]
    fn non_ascii_names_are_lowercased_and_encoded() {
        let url = client("http://127.0.0.1:8080/")
            .soulbinds_url(Region::Us, "area-52", "Ñoño")
            .unwrap();
        assert_eq!(
            url.path(),
            "/profile/wow/character/area-52/%C3%B1o%C3%B1o/soulbinds"
        );
    }

    #[test]
    fn invalid_base_is_rejected() {
        let err = client("not a url")
            .soulbinds_url(Region::Us, "area-52", "x")
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidUrl(_)));
    }

    #[test]
    fn covenant_fields_from_full_body() {
        let summary: SoulbindSummary = serde_json::from_str(
            r#"{"renown_level":12,"chosen_covenant":{"id":3,"name":"Night Fae"},"soulbinds":[]}"#,
        )
        .unwrap();
        assert_eq!(summary.covenant_fields(), Some((12, 3)));
    }

    #[test]
    fn covenant_fields_without_chosen_covenant() {
        let summary: SoulbindSummary = serde_json::from_str(r#"{"renown_level":1}"#).unwrap();
        assert_eq!(summary.covenant_fields(), Some((1, 0)));
    }

    #[test]
    fn covenant_fields_absent_without_renown() {
        let summary: SoulbindSummary = serde_json::from_str(r#"{"character":{}}"#).unwrap();
        assert_eq!(summary.covenant_fields(), None);
    }
}
