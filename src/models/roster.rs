// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Roster documents: scouts, adults and parents.
//!
//! All three are keyed by the provider's `userId` and rewritten on every
//! roster sync.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Organization linkage stamped on every roster document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitLink {
    pub org_guid: String,
    pub unit_id: String,
}

/// Patrol a scout currently belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patrol {
    pub id: Option<String>,
    pub name: String,
}

/// Highest rank a scout has been awarded in their primary program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentRank {
    pub rank_id: String,
    pub name: String,
    pub level: i64,
    pub program_id: Option<i64>,
    pub date_earned: Option<String>,
}

/// Youth member stored in `scouts`, keyed by user_id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scout {
    /// Provider user ID (also used as document ID)
    pub user_id: String,
    pub member_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub nick_name: Option<String>,
    /// Display name ("Nick Last" when a nickname is set)
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<String>,
    pub grade: Option<i64>,
    pub gender: Option<String>,
    pub patrol: Option<Patrol>,
    /// Position titles held in the unit
    pub positions: Vec<String>,
    pub current_rank: Option<CurrentRank>,
    pub unit: UnitLink,
    /// When the roster fields were last mapped
    pub synced_at: DateTime<Utc>,
}

/// Logged camping/hiking/service totals for a scout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub camping_days: f64,
    pub camping_nights: f64,
    pub hiking_miles: f64,
    pub service_hours: f64,
    pub long_cruise_days: f64,
}

/// Partial update applied to a scout document after a per-scout sync.
///
/// Written with field-level `$set` so roster syncs and scout syncs never
/// clobber each other's fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoutActivityPatch {
    pub activity_summary: ActivitySummary,
    pub activity_synced_at: DateTime<Utc>,
}

/// Adult leader stored in `adults`, keyed by user_id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adult {
    pub user_id: String,
    pub member_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub nick_name: Option<String>,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub positions: Vec<String>,
    pub unit: UnitLink,
    pub synced_at: DateTime<Utc>,
}

/// Parent/guardian stored in `parents`, keyed by the parent's user_id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parent {
    pub user_id: String,
    pub member_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub nick_name: Option<String>,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Linked scouts, sorted and deduplicated
    pub scout_user_ids: Vec<String>,
    pub unit: UnitLink,
    pub synced_at: DateTime<Utc>,
}
