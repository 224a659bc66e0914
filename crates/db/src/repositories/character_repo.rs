//! Repository for the per-collection `characters_*` tables.
//!
//! Table names come from [`Collection::table_name`], which is built from
//! closed enums, so interpolating them into SQL is safe.

use covdb_core::types::{DbId, Timestamp};
use covdb_core::{Collection, Covenant};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::character::{Character, NewCharacter};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, realm, last_modified, covenant, created_at, updated_at";

/// Due predicate. `$1` is the cutoff.
const DUE: &str = "(last_modified IS NULL OR last_modified <= $1)";

/// Provides the store operations the refresh engine, seeding and export need.
pub struct CharacterRepo;

impl CharacterRepo {
    /// Current database time, the clock every `NOW()` stamp is taken from.
    pub async fn now(pool: &PgPool) -> Result<Timestamp, sqlx::Error> {
        sqlx::query_scalar::<_, Timestamp>("SELECT NOW()")
            .fetch_one(pool)
            .await
    }

    /// Count every character in the collection.
    pub async fn count_all(pool: &PgPool, collection: Collection) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM {}", collection.table_name());
        sqlx::query_scalar::<_, i64>(&query).fetch_one(pool).await
    }

    /// Count characters that are due relative to `cutoff`.
    pub async fn count_due(
        pool: &PgPool,
        collection: Collection,
        cutoff: Timestamp,
    ) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM {} WHERE {DUE}", collection.table_name());
        sqlx::query_scalar::<_, i64>(&query)
            .bind(cutoff)
            .fetch_one(pool)
            .await
    }

    /// Atomically claim the next due character.
    ///
    /// Stamps `last_modified = NOW()` in the same statement that selects the
    /// row, so the record leaves the due set for every other claimer. Uses
    /// `FOR UPDATE SKIP LOCKED` to avoid blocking on a row another worker is
    /// claiming.
    ///
    /// Rows reset at or after `pass_started` (NULL `last_modified` with a
    /// newer `updated_at`) are skipped so a failing record is retried on the
    /// next pass instead of this one.
    pub async fn claim_next_due(
        pool: &PgPool,
        collection: Collection,
        cutoff: Timestamp,
        pass_started: Timestamp,
    ) -> Result<Option<Character>, sqlx::Error> {
        let table = collection.table_name();
        let query = format!(
            "UPDATE {table} \
             SET last_modified = NOW(), updated_at = NOW() \
             WHERE id = ( \
                 SELECT id FROM {table} \
                 WHERE {DUE} \
                   AND NOT (last_modified IS NULL AND updated_at >= $2) \
                 ORDER BY last_modified ASC NULLS FIRST \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Character>(&query)
            .bind(cutoff)
            .bind(pass_started)
            .fetch_optional(pool)
            .await
    }

    /// Insert a character unless `(name, realm)` already exists.
    ///
    /// Returns `None` when the pair is already present; the existing row is
    /// left untouched.
    pub async fn insert(
        pool: &PgPool,
        collection: Collection,
        input: &NewCharacter,
    ) -> Result<Option<Character>, sqlx::Error> {
        let query = format!(
            "INSERT INTO {} (name, realm, last_modified) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (name, realm) DO NOTHING \
             RETURNING {COLUMNS}",
            collection.table_name()
        );
        sqlx::query_as::<_, Character>(&query)
            .bind(&input.name)
            .bind(&input.realm)
            .bind(input.last_modified)
            .fetch_optional(pool)
            .await
    }

    /// Batch-insert names for one realm, skipping existing pairs.
    ///
    /// Returns the number of rows actually inserted.
    pub async fn insert_many(
        pool: &PgPool,
        collection: Collection,
        realm: &str,
        names: &[String],
        last_modified: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        if names.is_empty() {
            return Ok(0);
        }
        let query = format!(
            "INSERT INTO {} (name, realm, last_modified) \
             SELECT DISTINCT n, $2, $3 FROM UNNEST($1::TEXT[]) AS n \
             ON CONFLICT (name, realm) DO NOTHING",
            collection.table_name()
        );
        let result = sqlx::query(&query)
            .bind(names)
            .bind(realm)
            .bind(last_modified)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Store a successful refresh.
    ///
    /// When `covenant` is `Some` it replaces the stored sub-record; `None`
    /// keeps whatever was there. `last_modified` is stamped to now either way.
    pub async fn mark_refreshed(
        pool: &PgPool,
        collection: Collection,
        id: DbId,
        covenant: Option<&Covenant>,
    ) -> Result<bool, sqlx::Error> {
        let query = format!(
            "UPDATE {} \
             SET covenant = COALESCE($2, covenant), last_modified = NOW(), updated_at = NOW() \
             WHERE id = $1",
            collection.table_name()
        );
        let result = sqlx::query(&query)
            .bind(id)
            .bind(covenant.map(Json))
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Clear `last_modified` so the character is due again on the next pass.
    pub async fn reset_last_modified(
        pool: &PgPool,
        collection: Collection,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let query = format!(
            "UPDATE {} SET last_modified = NULL, updated_at = NOW() WHERE id = $1",
            collection.table_name()
        );
        let result = sqlx::query(&query).bind(id).execute(pool).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Permanently delete a character. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, collection: Collection, id: DbId) -> Result<bool, sqlx::Error> {
        let query = format!("DELETE FROM {} WHERE id = $1", collection.table_name());
        let result = sqlx::query(&query).bind(id).execute(pool).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Find a character by its `(name, realm)` identity.
    pub async fn find_by_name_realm(
        pool: &PgPool,
        collection: Collection,
        name: &str,
        realm: &str,
    ) -> Result<Option<Character>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM {} WHERE name = $1 AND realm = $2",
            collection.table_name()
        );
        sqlx::query_as::<_, Character>(&query)
            .bind(name)
            .bind(realm)
            .fetch_optional(pool)
            .await
    }

    /// Distinct realms present in the collection, sorted.
    pub async fn list_realms(
        pool: &PgPool,
        collection: Collection,
    ) -> Result<Vec<String>, sqlx::Error> {
        let query = format!(
            "SELECT DISTINCT realm FROM {} ORDER BY realm ASC",
            collection.table_name()
        );
        sqlx::query_scalar::<_, String>(&query).fetch_all(pool).await
    }

    /// Every character with a chosen covenant, ordered by realm then name.
    pub async fn list_with_covenant(
        pool: &PgPool,
        collection: Collection,
    ) -> Result<Vec<Character>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM {} \
             WHERE covenant IS NOT NULL \
               AND (covenant->>'chosen_covenant_id')::INTEGER <> 0 \
             ORDER BY realm ASC, name ASC",
            collection.table_name()
        );
        sqlx::query_as::<_, Character>(&query).fetch_all(pool).await
    }
}
