// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Unit calendar events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unit (or patrol) an event is organized for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventUnit {
    pub unit_id: Option<String>,
    pub name: Option<String>,
    pub patrol_id: Option<String>,
    pub patrol_name: Option<String>,
}

/// Invited member and their RSVP state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitee {
    pub user_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_adult: bool,
    /// "Y", "N", "M" or None when the member never answered
    pub rsvp: Option<String>,
    pub attended: bool,
}

/// Stored in `events`, keyed by event_id.
///
/// `invitees` is the provider's snapshot and replaces the stored list whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: String,
    pub name: String,
    pub event_type: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub rsvp_enabled: bool,
    pub units: Vec<EventUnit>,
    pub invitees: Vec<Invitee>,
    pub created_by_user_id: Option<String>,
    pub date_last_modified: Option<String>,
    pub synced_at: DateTime<Utc>,
}
