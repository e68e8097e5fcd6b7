// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored in `calendar_subscriptions`, keyed by user_calendar_id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarSubscription {
    pub user_calendar_id: String,
    pub user_id: String,
    pub unit_id: Option<String>,
    pub patrol_id: Option<String>,
    pub calendar_code: Option<String>,
    pub color: Option<String>,
    pub show_calendar: bool,
    pub synced_at: DateTime<Utc>,
}
