// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Advancement and requirement records.

use crate::db::document_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of advancement tracked by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AdvancementType {
    Rank,
    MeritBadge,
    Award,
}

impl AdvancementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdvancementType::Rank => "rank",
            AdvancementType::MeritBadge => "meritBadge",
            AdvancementType::Award => "award",
        }
    }
}

impl fmt::Display for AdvancementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized completion state derived from the provider's free-text status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionState {
    NotStarted,
    InProgress,
    Completed,
    Awarded,
}

/// Stored in `advancements`, keyed by (user_id, advancement_type, advancement_id).
///
/// Never deleted; history accumulates across syncs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advancement {
    pub user_id: String,
    pub advancement_type: AdvancementType,
    pub advancement_id: String,
    pub name: String,
    pub version: Option<String>,
    pub program_id: Option<i64>,
    /// Rank order within the program (ranks only)
    pub level: Option<i64>,
    /// Provider status text, verbatim
    pub status: Option<String>,
    pub completion: CompletionState,
    /// 0.0 to 1.0
    pub percent_completed: f64,
    pub date_started: Option<String>,
    pub date_completed: Option<String>,
    pub date_awarded: Option<String>,
    /// Assigned counselor (merit badges only)
    pub counselor_user_id: Option<String>,
    /// Eagle-required flag (merit badges only)
    pub eagle_required: Option<bool>,
    pub synced_at: DateTime<Utc>,
}

impl Advancement {
    pub fn document_id(&self) -> String {
        document_id(&[
            &self.user_id,
            self.advancement_type.as_str(),
            &self.advancement_id,
        ])
    }

    /// Whether the provider reports any progress, which is when requirement
    /// details are worth fetching.
    pub fn has_progress(&self) -> bool {
        self.percent_completed > 0.0 || self.completion != CompletionState::NotStarted
    }
}

/// Stored in `requirements`, keyed by
/// (user_id, advancement_type, advancement_id, requirement_id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub user_id: String,
    pub advancement_type: AdvancementType,
    pub advancement_id: String,
    pub requirement_id: String,
    /// Printed requirement number ("4a")
    pub number: Option<String>,
    pub short: Option<String>,
    pub name: Option<String>,
    pub started: bool,
    pub completed: bool,
    pub date_started: Option<String>,
    pub date_completed: Option<String>,
    pub leader_approved_date: Option<String>,
    pub synced_at: DateTime<Utc>,
}

impl Requirement {
    pub fn document_id(&self) -> String {
        document_id(&[
            &self.user_id,
            self.advancement_type.as_str(),
            &self.advancement_id,
            &self.requirement_id,
        ])
    }
}
