// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Append-only audit records for sync runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::AddAssign;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOperation {
    Roster,
    Scout,
    Events,
    Dashboards,
    Calendars,
    All,
}

impl SyncOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncOperation::Roster => "roster",
            SyncOperation::Scout => "scout",
            SyncOperation::Events => "events",
            SyncOperation::Dashboards => "dashboards",
            SyncOperation::Calendars => "calendars",
            SyncOperation::All => "all",
        }
    }
}

impl fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    Success,
    Partial,
    Error,
}

/// Per-resource-type tallies for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCounts {
    #[serde(default)]
    pub scouts: u32,
    #[serde(default)]
    pub adults: u32,
    #[serde(default)]
    pub parents: u32,
    #[serde(default)]
    pub advancements: u32,
    #[serde(default)]
    pub requirements: u32,
    #[serde(default)]
    pub events: u32,
    #[serde(default)]
    pub calendars: u32,
    #[serde(default)]
    pub dashboards: u32,
    /// Entities whose sync failed inside an otherwise successful run
    #[serde(default)]
    pub failures: u32,
}

impl AddAssign for SyncCounts {
    fn add_assign(&mut self, other: Self) {
        self.scouts += other.scouts;
        self.adults += other.adults;
        self.parents += other.parents;
        self.advancements += other.advancements;
        self.requirements += other.requirements;
        self.events += other.events;
        self.calendars += other.calendars;
        self.dashboards += other.dashboards;
        self.failures += other.failures;
    }
}

/// Stored in `sync_log` with a generated ID. Never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncLogEntry {
    pub timestamp: DateTime<Utc>,
    pub operation: SyncOperation,
    pub result: SyncOutcome,
    pub counts: SyncCounts,
    pub duration_ms: u64,
    /// Entity the run was scoped to (scout user ID for `scout` runs)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_accumulate() {
        let mut total = SyncCounts {
            scouts: 3,
            ..Default::default()
        };
        total += SyncCounts {
            advancements: 10,
            requirements: 40,
            failures: 1,
            ..Default::default()
        };
        total += SyncCounts {
            advancements: 5,
            ..Default::default()
        };

        assert_eq!(total.scouts, 3);
        assert_eq!(total.advancements, 15);
        assert_eq!(total.requirements, 40);
        assert_eq!(total.failures, 1);
    }

    #[test]
    fn test_log_entry_omits_absent_error() {
        let entry = SyncLogEntry {
            timestamp: Utc::now(),
            operation: SyncOperation::Roster,
            result: SyncOutcome::Success,
            counts: SyncCounts::default(),
            duration_ms: 12,
            target: None,
            error: None,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["operation"], "roster");
        assert_eq!(json["result"], "success");
        assert!(json.get("error").is_none());
    }
}
