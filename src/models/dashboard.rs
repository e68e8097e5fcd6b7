// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Unit dashboard snapshots.

use crate::db::document_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardKind {
    Advancement,
    Activities,
}

impl DashboardKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DashboardKind::Advancement => "advancement",
            DashboardKind::Activities => "activities",
        }
    }
}

/// Stored in `dashboards`, keyed by (org_guid, kind).
///
/// The payload is kept as raw JSON; its shape is owned by the provider and
/// only read by reporting views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub org_guid: String,
    pub kind: DashboardKind,
    pub data: serde_json::Value,
    pub synced_at: DateTime<Utc>,
}

impl DashboardSnapshot {
    pub fn document_id(&self) -> String {
        document_id(&[&self.org_guid, self.kind.as_str()])
    }
}
