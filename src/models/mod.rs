// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Local document shapes persisted by the sync.

pub mod advancement;
pub mod calendar;
pub mod dashboard;
pub mod event;
pub mod roster;
pub mod sync_log;

pub use advancement::{Advancement, AdvancementType, CompletionState, Requirement};
pub use calendar::CalendarSubscription;
pub use dashboard::{DashboardKind, DashboardSnapshot};
pub use event::{Event, EventUnit, Invitee};
pub use roster::{
    ActivitySummary, Adult, CurrentRank, Parent, Patrol, Scout, ScoutActivityPatch, UnitLink,
};
pub use sync_log::{SyncCounts, SyncLogEntry, SyncOperation, SyncOutcome};
