//! Import run orchestration
//!
//! Owns the end-to-end run: advisory lock acquisition, descending
//! iteration over the requested Congress range, per-session pagination
//! and batched reconciliation, error aggregation, and guaranteed lock
//! release on every exit path.
//!
//! Failure tiers are deliberately asymmetric: a per-member failure is
//! recorded and the run continues, while a session-level fetch failure
//! ends the whole run early. Losing an entire session silently is worse
//! than a degraded total.

use crate::config::Config;
use crate::db::{legislators, locks};
use crate::error::Result;
use crate::models::{ImportResult, ImportStatus, Legislator, RawMember, SessionRange};
use crate::services::congress_client::CongressClient;
use futures::future::join_all;
use sqlx::SqlitePool;
use std::time::Duration;

/// How a member record landed in the store
enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Counters and error list accumulated across all sessions of a run
#[derive(Debug, Default)]
struct RunTally {
    imported: usize,
    updated: usize,
    errors: Vec<String>,
}

/// Orchestrates one import run over a session range
pub struct ImportOrchestrator {
    db: SqlitePool,
    client: CongressClient,
    batch_size: usize,
    batch_pause: Duration,
}

impl ImportOrchestrator {
    pub fn new(db: SqlitePool, config: &Config) -> Result<Self> {
        Ok(Self {
            db,
            client: CongressClient::new(config)?,
            batch_size: config.batch_size.max(1),
            batch_pause: config.batch_pause,
        })
    }

    /// Execute a full import run.
    ///
    /// Returns `Ok` for every outcome reached through the normal
    /// control path: locked, success, and session-level failure all
    /// produce an `ImportResult`. `Err` means the run could not even
    /// reach the pipeline (e.g. the lock table is unreachable).
    pub async fn run(&self, range: SessionRange) -> Result<ImportResult> {
        let lock_key = range.lock_key();

        if !locks::acquire(&self.db, &lock_key).await? {
            tracing::warn!(lock_key = %lock_key, "Import already running, refusing to start");
            return Ok(ImportResult::locked());
        }

        tracing::info!(
            start_congress = range.start_congress,
            end_congress = range.end_congress,
            lock_key = %lock_key,
            "Import lock acquired, starting run"
        );

        // The run body is scoped so the release below executes on every
        // path out of it before the outcome is inspected.
        let mut tally = RunTally::default();
        let outcome = self.run_sessions(range, &mut tally).await;

        if let Err(e) = locks::release(&self.db, &lock_key).await {
            tracing::warn!(lock_key = %lock_key, error = %e, "Failed to release import lock");
        } else {
            tracing::debug!(lock_key = %lock_key, "Import lock released");
        }

        let status = match outcome {
            Ok(()) => ImportStatus::Success,
            Err(e) => {
                tracing::error!(error = %e, "Import run aborted on session-level failure");
                tally.errors.push(e.to_string());
                ImportStatus::Error
            }
        };

        tracing::info!(
            status = ?status,
            imported = tally.imported,
            updated = tally.updated,
            errors = tally.errors.len(),
            "Import run finished"
        );

        Ok(ImportResult::completed(
            status,
            tally.imported,
            tally.updated,
            tally.errors,
        ))
    }

    /// Iterate the range descending; a session's pagination failure
    /// propagates and ends the run with whatever was accumulated so
    /// far. The failing session's partial pages are discarded with it.
    async fn run_sessions(&self, range: SessionRange, tally: &mut RunTally) -> Result<()> {
        for congress in range.sessions() {
            tracing::info!(congress, "Importing session");

            let members = self.client.list_members(congress).await?;
            self.reconcile_session(congress, &members, tally).await;
        }

        Ok(())
    }

    /// Reconcile one session's full member list in fixed-size batches.
    ///
    /// Batches run sequentially with a fixed pause between them; within
    /// a batch all members are reconciled concurrently and the wave is
    /// joined before the next starts. Per-member failures are recorded
    /// and never abort the batch or the run.
    async fn reconcile_session(&self, congress: u16, members: &[RawMember], tally: &mut RunTally) {
        for (batch_index, batch) in members.chunks(self.batch_size).enumerate() {
            if batch_index > 0 {
                tokio::time::sleep(self.batch_pause).await;
            }

            let outcomes = join_all(batch.iter().map(|raw| self.reconcile_member(raw))).await;

            for outcome in outcomes {
                match outcome {
                    Ok(UpsertOutcome::Inserted) => tally.imported += 1,
                    Ok(UpsertOutcome::Updated) => tally.updated += 1,
                    Err(entry) => tally.errors.push(entry),
                }
            }

            tracing::debug!(
                congress,
                batch = batch_index,
                batch_len = batch.len(),
                "Batch reconciled"
            );
        }

        tracing::info!(
            congress,
            members = members.len(),
            total_imported = tally.imported,
            total_updated = tally.updated,
            total_errors = tally.errors.len(),
            "Session reconciled"
        );
    }

    /// Map and upsert one member. Failures come back as the error-list
    /// entry (`"<bioguideId>: <message>"`) rather than an error type so
    /// the caller can aggregate without unwinding.
    async fn reconcile_member(&self, raw: &RawMember) -> std::result::Result<UpsertOutcome, String> {
        let Some(record) = Legislator::from_raw(raw) else {
            tracing::warn!("Member record missing bioguideId, skipping");
            return Err("unknown: missing bioguideId".to_string());
        };

        match self.upsert(&record).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                tracing::warn!(bioguide_id = %record.bioguide_id, error = %e, "Failed to reconcile member");
                Err(format!("{}: {}", record.bioguide_id, e))
            }
        }
    }

    /// Existence is probed before the upsert to classify the outcome.
    /// SQLite's upsert doesn't report insert-vs-update, so the split is
    /// best-effort if the same ID appears twice inside one batch.
    async fn upsert(&self, record: &Legislator) -> Result<UpsertOutcome> {
        let existed = legislators::exists(&self.db, &record.bioguide_id).await?;
        legislators::upsert_legislator(&self.db, record).await?;

        Ok(if existed {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        })
    }
}
