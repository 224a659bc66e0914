//! Refresh engine.
//!
//! Claims one due character at a time with
//! [`CharacterStore::claim_next_due`], fetches its soulbinds and writes one
//! of three terminal outcomes back: updated, reset (retry next pass) or
//! deleted. Cancellation is checked between records only, so the record in
//! flight always reaches a terminal state before the loop exits.

use std::fmt;

use covdb_battlenet::{RequestLimiter, SoulbindLookup};
use covdb_core::{Collection, Covenant, RealmTable};
use covdb_db::models::character::Character;

use crate::error::WorkerError;
use crate::progress::RunContext;
use crate::source::SoulbindSource;
use crate::store::CharacterStore;

/// How a pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// No due record was left to claim.
    Exhausted,
    /// The cancellation token fired.
    Cancelled,
}

/// Why a record was removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteReason {
    /// The realm is not in the realm table.
    UnknownRealm,
    /// The API answered 403 or 404.
    NotFound { status: u16 },
}

impl fmt::Display for DeleteReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteReason::UnknownRealm => f.write_str("unknown realm"),
            DeleteReason::NotFound { status } => write!(f, "not found ({status})"),
        }
    }
}

/// Terminal state of one claimed record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Fetched successfully. `covenant` is `None` when the body carried no
    /// renown, in which case only `last_modified` is stamped.
    Updated { covenant: Option<Covenant> },
    /// Transient failure; `last_modified` is cleared so the next pass retries.
    Reset { reason: String },
    Deleted { reason: DeleteReason },
}

impl RecordOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            RecordOutcome::Updated { .. } => "updated",
            RecordOutcome::Reset { .. } => "reset",
            RecordOutcome::Deleted { .. } => "deleted",
        }
    }
}

/// Drives refresh passes over character collections.
pub struct RefreshEngine<'a> {
    store: &'a dyn CharacterStore,
    source: &'a dyn SoulbindSource,
    realms: &'a RealmTable,
    limiter: RequestLimiter,
}

impl<'a> RefreshEngine<'a> {
    pub fn new(
        store: &'a dyn CharacterStore,
        source: &'a dyn SoulbindSource,
        realms: &'a RealmTable,
        limiter: RequestLimiter,
    ) -> Self {
        Self {
            store,
            source,
            realms,
            limiter,
        }
    }

    /// Run one pass over every collection in turn.
    pub async fn run_all(&mut self, ctx: &mut RunContext) -> Result<RunOutcome, WorkerError> {
        for collection in Collection::all() {
            if self.run(collection, ctx).await? == RunOutcome::Cancelled {
                return Ok(RunOutcome::Cancelled);
            }
        }
        Ok(RunOutcome::Exhausted)
    }

    /// Refresh due records in `collection` until none is left or the run
    /// is cancelled.
    ///
    /// Claim and count failures abort the pass. Failures writing a terminal
    /// outcome are logged and counted, and the loop moves on.
    pub async fn run(
        &mut self,
        collection: Collection,
        ctx: &mut RunContext,
    ) -> Result<RunOutcome, WorkerError> {
        ctx.progress.restart();
        // Records reset from here on stay due but wait for the next pass.
        let pass_started = self.store.now().await?;

        let records = self.store.count_all(collection).await?;
        tracing::info!(%collection, records, "Refresh pass started");

        loop {
            if ctx.cancel.is_cancelled() {
                tracing::info!(
                    %collection,
                    processed = ctx.progress.processed(),
                    "Graceful shutdown",
                );
                return Ok(RunOutcome::Cancelled);
            }

            if ctx.progress.tick() {
                let counted_at = self.store.now().await?;
                let cutoff = covdb_core::staleness::due_cutoff(counted_at);
                let due = self.store.count_due(collection, cutoff).await?;
                ctx.progress.recount(counted_at, due);
            }

            let claimed = self
                .store
                .claim_next_due(collection, ctx.progress.cutoff(), pass_started)
                .await?;
            let Some(character) = claimed else {
                let tally = ctx.progress.tally();
                tracing::info!(
                    %collection,
                    processed = ctx.progress.processed(),
                    updated = tally.updated,
                    reset = tally.reset,
                    deleted = tally.deleted,
                    write_failures = tally.write_failures,
                    elapsed_secs = ctx.progress.elapsed().as_secs(),
                    "No more due records",
                );
                return Ok(RunOutcome::Exhausted);
            };
            ctx.progress.claimed();

            let outcome = self.process(collection, &character).await;

            let tally = ctx.progress.tally_mut();
            match self.persist(collection, &character, &outcome).await {
                Ok(()) => match outcome {
                    RecordOutcome::Updated { .. } => tally.updated += 1,
                    RecordOutcome::Reset { .. } => tally.reset += 1,
                    RecordOutcome::Deleted { .. } => tally.deleted += 1,
                },
                Err(e) => {
                    tally.write_failures += 1;
                    tracing::error!(
                        %collection,
                        character_id = character.id,
                        outcome = outcome.label(),
                        error = %e,
                        "Failed to write refresh outcome",
                    );
                }
            }
            log_progress(collection, &character, &outcome, ctx);
        }
    }

    /// Classify one claimed record. Never fails; API errors become resets.
    pub async fn process(&mut self, collection: Collection, character: &Character) -> RecordOutcome {
        let Some(slug) = self.realms.resolve(&character.realm) else {
            return RecordOutcome::Deleted {
                reason: DeleteReason::UnknownRealm,
            };
        };

        self.limiter.acquire().await;

        match self
            .source
            .soulbinds(collection.region, slug, &character.name)
            .await
        {
            Ok(SoulbindLookup::Found(summary)) => RecordOutcome::Updated {
                covenant: summary
                    .covenant_fields()
                    .map(|(renown, id)| Covenant::merge(character.covenant(), renown, id)),
            },
            Ok(SoulbindLookup::Malformed { error }) => RecordOutcome::Reset {
                reason: format!("malformed body: {error}"),
            },
            Ok(SoulbindLookup::NotFound { status }) => RecordOutcome::Deleted {
                reason: DeleteReason::NotFound { status },
            },
            Ok(SoulbindLookup::Unexpected { status }) => RecordOutcome::Reset {
                reason: format!("unexpected status {status}"),
            },
            Err(e) => RecordOutcome::Reset {
                reason: e.to_string(),
            },
        }
    }

    async fn persist(
        &self,
        collection: Collection,
        character: &Character,
        outcome: &RecordOutcome,
    ) -> Result<(), sqlx::Error> {
        match outcome {
            RecordOutcome::Updated { covenant } => {
                self.store
                    .mark_refreshed(collection, character.id, covenant.as_ref())
                    .await?;
            }
            RecordOutcome::Reset { .. } => {
                self.store
                    .reset_last_modified(collection, character.id)
                    .await?;
            }
            RecordOutcome::Deleted { .. } => {
                self.store.delete(collection, character.id).await?;
            }
        }
        Ok(())
    }
}

fn log_progress(
    collection: Collection,
    character: &Character,
    outcome: &RecordOutcome,
    ctx: &RunContext,
) {
    let progress = &ctx.progress;
    let line = format!(
        "[{}/{}] {} {}-{}-{}",
        progress.current(),
        progress.total(),
        outcome.label(),
        collection.region,
        character.realm,
        character.name,
    );
    let rate = format!("{:.1}", progress.rate());
    match outcome {
        RecordOutcome::Updated { covenant } => tracing::info!(
            renown_level = covenant.map(|c| c.renown_level),
            chosen_covenant_id = covenant.map(|c| c.chosen_covenant_id),
            remaining = progress.remaining(),
            per_sec = %rate,
            "{line}",
        ),
        RecordOutcome::Reset { reason } => tracing::warn!(
            reason = %reason,
            remaining = progress.remaining(),
            per_sec = %rate,
            "{line}",
        ),
        RecordOutcome::Deleted { reason } => tracing::warn!(
            reason = %reason,
            remaining = progress.remaining(),
            per_sec = %rate,
            "{line}",
        ),
    }
}
