//! Soulbind source seam between the refresh engine and the profile API.

use async_trait::async_trait;
use covdb_battlenet::{ApiError, ProfileClient, SoulbindLookup};
use covdb_core::Region;

#[async_trait]
pub trait SoulbindSource: Send + Sync {
    async fn soulbinds(
        &self,
        region: Region,
        realm_slug: &str,
        name: &str,
    ) -> Result<SoulbindLookup, ApiError>;
}

#[async_trait]
impl SoulbindSource for ProfileClient {
    async fn soulbinds(
        &self,
        region: Region,
        realm_slug: &str,
        name: &str,
    ) -> Result<SoulbindLookup, ApiError> {
        ProfileClient::soulbinds(self, region, realm_slug, name).await
    }
}
