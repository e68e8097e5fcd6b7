// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sync orchestration.
//!
//! Each operation fetches from Scoutbook, maps the payloads and upserts the
//! resulting documents, then appends one entry to `sync_log`. A full sync
//! runs roster first, then every scout, then events, dashboards and adult
//! calendars. A failing scout is recorded against that scout and the run
//! carries on.

use crate::config::Config;
use crate::db::{collections, DocumentStore};
use crate::error::Result;
use crate::models::{
    AdvancementType, DashboardKind, SyncCounts, SyncLogEntry, SyncOperation, SyncOutcome,
};
use crate::services::mapping;
use crate::services::scoutbook::ScoutbookClient;
use crate::time_utils::{format_provider_date, format_utc_rfc3339, Clock, SystemClock};
use chrono::Days;
use futures_util::stream::{self, StreamExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

/// Concurrent document writes per batch.
const MAX_CONCURRENT_WRITES: usize = 20;

/// Something an operation produced that can be summarized in `sync_log`.
trait RunSummary {
    fn counts(&self) -> SyncCounts;

    fn outcome(&self) -> SyncOutcome {
        SyncOutcome::Success
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RosterSyncResult {
    pub scout_ids: Vec<String>,
    pub adult_ids: Vec<String>,
    pub counts: SyncCounts,
}

impl RunSummary for RosterSyncResult {
    fn counts(&self) -> SyncCounts {
        self.counts
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoutSyncResult {
    pub user_id: String,
    pub counts: SyncCounts,
}

impl RunSummary for ScoutSyncResult {
    fn counts(&self) -> SyncCounts {
        self.counts
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EventsSyncResult {
    pub from: String,
    pub to: String,
    pub counts: SyncCounts,
}

impl RunSummary for EventsSyncResult {
    fn counts(&self) -> SyncCounts {
        self.counts
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardsSyncResult {
    pub counts: SyncCounts,
}

impl RunSummary for DashboardsSyncResult {
    fn counts(&self) -> SyncCounts {
        self.counts
    }
}

/// An entity whose sync failed inside a larger run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityFailure {
    pub id: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarsSyncResult {
    pub counts: SyncCounts,
    pub failures: Vec<EntityFailure>,
}

impl RunSummary for CalendarsSyncResult {
    fn counts(&self) -> SyncCounts {
        self.counts
    }

    fn outcome(&self) -> SyncOutcome {
        if self.failures.is_empty() {
            SyncOutcome::Success
        } else {
            SyncOutcome::Partial
        }
    }
}

/// Per-scout line in a full sync result.
#[derive(Debug, Clone, Serialize)]
pub struct ScoutOutcome {
    pub user_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub counts: SyncCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct FullSyncResult {
    pub result: SyncOutcome,
    pub counts: SyncCounts,
    pub scouts: Vec<ScoutOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dashboards_error: Option<String>,
    pub calendar_failures: Vec<EntityFailure>,
    pub duration_ms: u64,
}

impl FullSyncResult {
    pub fn failed_scouts(&self) -> impl Iterator<Item = &ScoutOutcome> {
        self.scouts.iter().filter(|s| !s.success)
    }
}

/// Outcome of a credentials-only run.
#[derive(Debug, Clone, Serialize)]
pub struct DryRunResult {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_expires_at: Option<String>,
}

/// Authenticate without touching storage.
pub async fn verify_credentials(client: &ScoutbookClient) -> Result<DryRunResult> {
    client.session().ensure_valid().await?;
    let session = client.session().current().await;

    tracing::info!("Dry run: credentials verified, nothing written");

    Ok(DryRunResult {
        authenticated: true,
        subject_id: session.as_ref().and_then(|s| s.subject_id.clone()),
        session_expires_at: session.map(|s| format_utc_rfc3339(s.expires_at)),
    })
}

/// Drives syncs against one document store.
pub struct SyncOrchestrator<S: DocumentStore> {
    client: ScoutbookClient,
    store: S,
    clock: Arc<dyn Clock>,
    events_past_days: u64,
    events_future_days: u64,
}

impl<S: DocumentStore> SyncOrchestrator<S> {
    pub fn new(config: &Config, client: ScoutbookClient, store: S) -> Self {
        Self {
            client,
            store,
            clock: Arc::new(SystemClock),
            events_past_days: config.events_past_days.max(0) as u64,
            events_future_days: config.events_future_days.max(0) as u64,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ─── Operations ──────────────────────────────────────────────────────────

    /// Youth, adults and parents for the unit.
    pub async fn sync_roster(&self) -> Result<RosterSyncResult> {
        self.logged(SyncOperation::Roster, None, self.roster_inner())
            .await
    }

    /// Advancements, requirements and activity totals for one scout.
    pub async fn sync_scout(&self, user_id: &str) -> Result<ScoutSyncResult> {
        self.logged(SyncOperation::Scout, Some(user_id), self.scout_inner(user_id))
            .await
    }

    /// Unit events within the configured window around today.
    pub async fn sync_events(&self) -> Result<EventsSyncResult> {
        self.logged(SyncOperation::Events, None, self.events_inner())
            .await
    }

    /// Advancement and activity dashboard snapshots.
    pub async fn sync_dashboards(&self) -> Result<DashboardsSyncResult> {
        self.logged(SyncOperation::Dashboards, None, self.dashboards_inner())
            .await
    }

    /// Calendar subscriptions for each user. One user's failure does not stop
    /// the others.
    pub async fn sync_calendars(&self, user_ids: &[String]) -> Result<CalendarsSyncResult> {
        self.logged(
            SyncOperation::Calendars,
            None,
            self.calendars_inner(user_ids),
        )
        .await
    }

    /// Roster, then each scout, then events, dashboards and calendars.
    ///
    /// Only a roster failure fails the run. Scout failures make it partial;
    /// events, dashboard and calendar failures are reported but leave the
    /// outcome alone.
    pub async fn sync_all(&self) -> Result<FullSyncResult> {
        let started = Instant::now();
        tracing::info!("Full sync started");

        let roster = match self.sync_roster().await {
            Ok(roster) => roster,
            Err(e) => {
                self.write_log(
                    SyncOperation::All,
                    SyncOutcome::Error,
                    SyncCounts::default(),
                    started,
                    None,
                    Some(format!("Roster sync failed: {}", e)),
                )
                .await;
                return Err(e);
            }
        };

        let mut counts = roster.counts;
        let mut scouts = Vec::with_capacity(roster.scout_ids.len());

        for user_id in &roster.scout_ids {
            match self.sync_scout(user_id).await {
                Ok(result) => {
                    counts += result.counts;
                    scouts.push(ScoutOutcome {
                        user_id: result.user_id,
                        success: true,
                        error: None,
                        counts: result.counts,
                    });
                }
                Err(e) => {
                    tracing::warn!(user_id = %user_id, error = %e, "Scout sync failed, continuing");
                    counts.failures += 1;
                    scouts.push(ScoutOutcome {
                        user_id: user_id.clone(),
                        success: false,
                        error: Some(e.to_string()),
                        counts: SyncCounts::default(),
                    });
                }
            }
        }

        let events_error = match self.sync_events().await {
            Ok(result) => {
                counts += result.counts;
                None
            }
            Err(e) => Some(e.to_string()),
        };

        let dashboards_error = match self.sync_dashboards().await {
            Ok(result) => {
                counts += result.counts;
                None
            }
            Err(e) => Some(e.to_string()),
        };

        let calendar_failures = match self.sync_calendars(&roster.adult_ids).await {
            Ok(result) => {
                counts += result.counts;
                result.failures
            }
            Err(e) => vec![EntityFailure {
                id: "*".to_string(),
                error: e.to_string(),
            }],
        };

        let failed = scouts.iter().filter(|s| !s.success).count();
        let result = if failed == 0 {
            SyncOutcome::Success
        } else {
            SyncOutcome::Partial
        };
        let summary_error =
            (failed > 0).then(|| format!("{} of {} scouts failed", failed, scouts.len()));

        let duration_ms = self
            .write_log(
                SyncOperation::All,
                result,
                counts,
                started,
                None,
                summary_error,
            )
            .await;

        tracing::info!(
            result = ?result,
            scouts = scouts.len(),
            failed,
            duration_ms,
            "Full sync finished"
        );

        Ok(FullSyncResult {
            result,
            counts,
            scouts,
            events_error,
            dashboards_error,
            calendar_failures,
            duration_ms,
        })
    }

    // ─── Operation bodies ────────────────────────────────────────────────────

    async fn roster_inner(&self) -> Result<RosterSyncResult> {
        let (youths, adults, links) = tokio::try_join!(
            self.client.youth_roster(),
            self.client.adult_roster(),
            self.client.parent_links(),
        )?;

        let synced_at = self.clock.now();
        let unit = self.client.unit_link();

        let scouts: Vec<_> = youths
            .iter()
            .map(|m| mapping::map_scout(m, &unit, synced_at))
            .collect();
        let adults: Vec<_> = adults
            .iter()
            .map(|m| mapping::map_adult(m, &unit, synced_at))
            .collect();
        let parents = mapping::aggregate_parents(&links, &unit, synced_at);

        let counts = SyncCounts {
            scouts: self
                .upsert_batch(collections::SCOUTS, &scouts, |s| s.user_id.clone())
                .await?,
            adults: self
                .upsert_batch(collections::ADULTS, &adults, |a| a.user_id.clone())
                .await?,
            parents: self
                .upsert_batch(collections::PARENTS, &parents, |p| p.user_id.clone())
                .await?,
            ..Default::default()
        };

        Ok(RosterSyncResult {
            scout_ids: scouts.into_iter().map(|s| s.user_id).collect(),
            adult_ids: adults.into_iter().map(|a| a.user_id).collect(),
            counts,
        })
    }

    async fn scout_inner(&self, user_id: &str) -> Result<ScoutSyncResult> {
        let programs = self.client.ranks(user_id).await?;
        let merit_badges = self.client.merit_badges(user_id).await?;
        let awards = self.client.awards(user_id).await?;
        let summary = self.client.activity_summary(user_id).await?;

        let synced_at = self.clock.now();

        let mut advancements = mapping::map_ranks(user_id, &programs, synced_at);
        advancements.extend(
            merit_badges
                .iter()
                .map(|mb| mapping::map_merit_badge(user_id, mb, synced_at)),
        );
        for award in &awards {
            match mapping::map_award(user_id, award, synced_at) {
                Some(advancement) => advancements.push(advancement),
                None => tracing::warn!(
                    user_id,
                    name = %award.name,
                    "Skipping award without an id"
                ),
            }
        }

        let advancement_count = self
            .upsert_batch(collections::ADVANCEMENTS, &advancements, |a| {
                a.document_id()
            })
            .await?;

        let mut requirements = Vec::new();
        for advancement in advancements.iter().filter(|a| a.has_progress()) {
            let provider_reqs = match advancement.advancement_type {
                AdvancementType::Rank => {
                    self.client
                        .rank_requirements(user_id, &advancement.advancement_id)
                        .await?
                }
                AdvancementType::MeritBadge => {
                    self.client
                        .merit_badge_requirements(user_id, &advancement.advancement_id)
                        .await?
                }
                AdvancementType::Award => continue,
            };

            requirements.extend(provider_reqs.iter().map(|req| {
                mapping::map_requirement(
                    user_id,
                    advancement.advancement_type,
                    &advancement.advancement_id,
                    req,
                    synced_at,
                )
            }));
        }

        let requirement_count = self
            .upsert_batch(collections::REQUIREMENTS, &requirements, |r| {
                r.document_id()
            })
            .await?;

        let patch = mapping::map_activity_summary(&summary, synced_at);
        self.store
            .upsert(collections::SCOUTS, user_id, &patch)
            .await?;

        tracing::debug!(
            user_id,
            advancements = advancement_count,
            requirements = requirement_count,
            "Scout synced"
        );

        Ok(ScoutSyncResult {
            user_id: user_id.to_string(),
            counts: SyncCounts {
                advancements: advancement_count,
                requirements: requirement_count,
                ..Default::default()
            },
        })
    }

    async fn events_inner(&self) -> Result<EventsSyncResult> {
        let today = self.clock.now().date_naive();
        let from = today
            .checked_sub_days(Days::new(self.events_past_days))
            .unwrap_or(today);
        let to = today
            .checked_add_days(Days::new(self.events_future_days))
            .unwrap_or(today);

        let events = self.client.events(from, to).await?;
        let synced_at = self.clock.now();
        let events: Vec<_> = events
            .iter()
            .map(|e| mapping::map_event(e, synced_at))
            .collect();

        let count = self
            .upsert_batch(collections::EVENTS, &events, |e| e.event_id.clone())
            .await?;

        Ok(EventsSyncResult {
            from: format_provider_date(from),
            to: format_provider_date(to),
            counts: SyncCounts {
                events: count,
                ..Default::default()
            },
        })
    }

    async fn dashboards_inner(&self) -> Result<DashboardsSyncResult> {
        let (advancement, activities) = tokio::try_join!(
            self.client.advancement_dashboard(),
            self.client.activities_dashboard(),
        )?;

        let synced_at = self.clock.now();
        let org_guid = self.client.org_guid();
        let snapshots = vec![
            mapping::map_dashboard(org_guid, DashboardKind::Advancement, advancement, synced_at),
            mapping::map_dashboard(org_guid, DashboardKind::Activities, activities, synced_at),
        ];

        let count = self
            .upsert_batch(collections::DASHBOARDS, &snapshots, |d| d.document_id())
            .await?;

        Ok(DashboardsSyncResult {
            counts: SyncCounts {
                dashboards: count,
                ..Default::default()
            },
        })
    }

    async fn calendars_inner(&self, user_ids: &[String]) -> Result<CalendarsSyncResult> {
        let mut counts = SyncCounts::default();
        let mut failures = Vec::new();

        for user_id in user_ids {
            match self.calendars_for(user_id).await {
                Ok(count) => counts.calendars += count,
                Err(e) => {
                    tracing::warn!(user_id = %user_id, error = %e, "Calendar sync failed for user");
                    failures.push(EntityFailure {
                        id: user_id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        counts.failures = failures.len() as u32;
        Ok(CalendarsSyncResult { counts, failures })
    }

    async fn calendars_for(&self, user_id: &str) -> Result<u32> {
        let calendars = self.client.calendars(user_id).await?;
        let synced_at = self.clock.now();
        let subscriptions: Vec<_> = calendars
            .iter()
            .map(|c| mapping::map_calendar(c, user_id, synced_at))
            .collect();

        self.upsert_batch(collections::CALENDARS, &subscriptions, |c| {
            c.user_calendar_id.clone()
        })
        .await
    }

    // ─── Plumbing ────────────────────────────────────────────────────────────

    /// Upsert every document, a bounded number at a time. Returns how many
    /// were written; the first failure fails the batch.
    async fn upsert_batch<T, F>(&self, collection: &str, docs: &[T], id_of: F) -> Result<u32>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: Fn(&T) -> String,
    {
        let results: Vec<Result<()>> = stream::iter(docs)
            .map(|doc| {
                let id = id_of(doc);
                async move { self.store.upsert(collection, &id, doc).await }
            })
            .buffer_unordered(MAX_CONCURRENT_WRITES)
            .collect()
            .await;

        results.into_iter().collect::<Result<Vec<()>>>()?;
        Ok(docs.len() as u32)
    }

    /// Run one operation and record its outcome in `sync_log`.
    async fn logged<T, Fut>(
        &self,
        operation: SyncOperation,
        target: Option<&str>,
        work: Fut,
    ) -> Result<T>
    where
        T: RunSummary,
        Fut: Future<Output = Result<T>>,
    {
        let started = Instant::now();
        tracing::info!(operation = %operation, entity = target.unwrap_or("-"), "Sync started");

        match work.await {
            Ok(summary) => {
                let duration_ms = self
                    .write_log(
                        operation,
                        summary.outcome(),
                        summary.counts(),
                        started,
                        target,
                        None,
                    )
                    .await;
                tracing::info!(
                    operation = %operation,
                    entity = target.unwrap_or("-"),
                    duration_ms,
                    "Sync finished"
                );
                Ok(summary)
            }
            Err(e) => {
                tracing::error!(
                    operation = %operation,
                    entity = target.unwrap_or("-"),
                    error = %e,
                    "Sync failed"
                );
                self.write_log(
                    operation,
                    SyncOutcome::Error,
                    SyncCounts::default(),
                    started,
                    target,
                    Some(e.to_string()),
                )
                .await;
                Err(e)
            }
        }
    }

    /// Append a log entry. A failed write is logged and otherwise ignored.
    /// Returns the elapsed time recorded in the entry.
    async fn write_log(
        &self,
        operation: SyncOperation,
        result: SyncOutcome,
        counts: SyncCounts,
        started: Instant,
        target: Option<&str>,
        error: Option<String>,
    ) -> u64 {
        let duration_ms = started.elapsed().as_millis() as u64;
        let entry = SyncLogEntry {
            timestamp: self.clock.now(),
            operation,
            result,
            counts,
            duration_ms,
            target: target.map(str::to_string),
            error,
        };

        if let Err(e) = self.store.append(collections::SYNC_LOG, &entry).await {
            tracing::warn!(operation = %operation, error = %e, "Failed to write sync log entry");
        }
        duration_ms
    }
}
