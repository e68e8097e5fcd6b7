// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Provider payload to stored document mapping.
//!
//! Everything here is pure: no I/O, no clock reads. The caller supplies
//! `synced_at` so a whole batch carries one timestamp.

use crate::models::{
    ActivitySummary, Adult, Advancement, AdvancementType, CalendarSubscription, CompletionState,
    CurrentRank, DashboardKind, DashboardSnapshot, Event, EventUnit, Invitee, Parent, Patrol,
    Requirement, Scout, ScoutActivityPatch, UnitLink,
};
use crate::services::scoutbook::{
    AwardedRank, LogTotals, MemberPosition, ParentInformation, ParentLink, ProgramRanks,
    ProviderActivitySummary, ProviderAward, ProviderCalendar, ProviderEvent, ProviderMeritBadge,
    ProviderRank, ProviderRequirement, RosterMember,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Program whose ranks define a scout's "current rank".
pub const SCOUTS_BSA_PROGRAM_ID: i64 = 2;

/// Eagle-required merit badges, matched by name when the provider leaves
/// `isEagleRequired` out. Name matching breaks if a badge is renamed.
const EAGLE_REQUIRED_BADGES: &[&str] = &[
    "camping",
    "citizenship in society",
    "citizenship in the community",
    "citizenship in the nation",
    "citizenship in the world",
    "communication",
    "cooking",
    "cycling",
    "emergency preparedness",
    "environmental science",
    "family life",
    "first aid",
    "hiking",
    "lifesaving",
    "personal fitness",
    "personal management",
    "sustainability",
    "swimming",
];

// ─── Small helpers ───────────────────────────────────────────────────────────

/// Interpret a provider flag. Booleans, "true"/"True"/"1" and the number 1
/// are true; anything else, including absence, is false.
pub fn normalize_flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => {
            let s = s.trim();
            s.eq_ignore_ascii_case("true") || s == "1"
        }
        Some(Value::Number(n)) => n.as_f64() == Some(1.0),
        _ => false,
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn full_name(first: &str, last: &str, nick: Option<&str>) -> String {
    let given = nick.filter(|n| !n.trim().is_empty()).unwrap_or(first);
    format!("{} {}", given.trim(), last.trim()).trim().to_string()
}

fn phone(mobile: Option<&str>, home: Option<&str>) -> Option<String> {
    non_empty(mobile).or_else(|| non_empty(home))
}

/// Provider percentages come as either a fraction or 0-100. Values up to and
/// including 1.0 are read as fractions, so an exact `1.0` is 100% and `2.0`
/// is 2%.
fn normalize_percent(value: Option<f64>) -> f64 {
    match value {
        Some(p) if p.is_finite() && p > 1.0 => (p / 100.0).min(1.0),
        Some(p) if p.is_finite() && p > 0.0 => p,
        _ => 0.0,
    }
}

/// Derive a completion state from the provider's free-text status.
pub fn completion_state(
    status: Option<&str>,
    awarded: bool,
    has_completion_date: bool,
    percent_completed: f64,
) -> CompletionState {
    let status = status.unwrap_or_default().to_ascii_lowercase();

    if awarded || status.contains("awarded") {
        CompletionState::Awarded
    } else if has_completion_date || status.contains("completed") || status.contains("approved")
    {
        CompletionState::Completed
    } else if percent_completed > 0.0 || status.contains("started") || status.contains("progress")
    {
        CompletionState::InProgress
    } else {
        CompletionState::NotStarted
    }
}

pub fn is_eagle_required_name(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    EAGLE_REQUIRED_BADGES.iter().any(|badge| name.contains(badge))
}

// ─── Roster ──────────────────────────────────────────────────────────────────

/// Highest awarded rank, preferring Scouts BSA ranks when any exist.
/// Equal levels resolve to the most recently earned.
pub fn current_rank(ranks: &[AwardedRank]) -> Option<CurrentRank> {
    let primary: Vec<&AwardedRank> = ranks
        .iter()
        .filter(|r| r.program_id == Some(SCOUTS_BSA_PROGRAM_ID))
        .collect();
    let candidates = if primary.is_empty() {
        ranks.iter().collect()
    } else {
        primary
    };

    candidates
        .into_iter()
        .max_by(|a, b| {
            a.level
                .cmp(&b.level)
                .then_with(|| a.date_earned.cmp(&b.date_earned))
        })
        .map(|rank| CurrentRank {
            rank_id: rank.id.clone(),
            name: rank
                .name
                .clone()
                .or_else(|| rank.rank.clone())
                .unwrap_or_default(),
            level: rank.level,
            program_id: rank.program_id,
            date_earned: rank.date_earned.clone(),
        })
}

/// First position that names a patrol.
pub fn current_patrol(positions: &[MemberPosition]) -> Option<Patrol> {
    positions.iter().find_map(|p| {
        non_empty(p.patrol_name.as_deref()).map(|name| Patrol {
            id: p.patrol_id.clone(),
            name,
        })
    })
}

fn position_titles(positions: &[MemberPosition]) -> Vec<String> {
    let titles: BTreeSet<String> = positions
        .iter()
        .filter_map(|p| non_empty(p.position.as_deref()))
        .collect();
    titles.into_iter().collect()
}

pub fn map_scout(member: &RosterMember, unit: &UnitLink, synced_at: DateTime<Utc>) -> Scout {
    Scout {
        user_id: member.user_id.clone(),
        member_id: member.member_id.clone(),
        first_name: member.first_name.trim().to_string(),
        last_name: member.last_name.trim().to_string(),
        nick_name: non_empty(member.nick_name.as_deref()),
        full_name: full_name(
            &member.first_name,
            &member.last_name,
            member.nick_name.as_deref(),
        ),
        email: non_empty(member.email.as_deref()),
        phone: phone(member.mobile_phone.as_deref(), member.home_phone.as_deref()),
        date_of_birth: non_empty(member.date_of_birth.as_deref()),
        grade: member.grade,
        gender: non_empty(member.gender.as_deref()),
        patrol: current_patrol(&member.positions),
        positions: position_titles(&member.positions),
        current_rank: current_rank(&member.highest_ranks_awarded),
        unit: unit.clone(),
        synced_at,
    }
}

pub fn map_adult(member: &RosterMember, unit: &UnitLink, synced_at: DateTime<Utc>) -> Adult {
    Adult {
        user_id: member.user_id.clone(),
        member_id: member.member_id.clone(),
        first_name: member.first_name.trim().to_string(),
        last_name: member.last_name.trim().to_string(),
        nick_name: non_empty(member.nick_name.as_deref()),
        full_name: full_name(
            &member.first_name,
            &member.last_name,
            member.nick_name.as_deref(),
        ),
        email: non_empty(member.email.as_deref()),
        phone: phone(member.mobile_phone.as_deref(), member.home_phone.as_deref()),
        positions: position_titles(&member.positions),
        unit: unit.clone(),
        synced_at,
    }
}

/// Fill any blank contact fields in `into` from a later row for the same parent.
fn merge_parent_info(into: &mut ParentInformation, from: &ParentInformation) {
    fn fill(slot: &mut Option<String>, other: &Option<String>) {
        if non_empty(slot.as_deref()).is_none() {
            if let Some(value) = non_empty(other.as_deref()) {
                *slot = Some(value);
            }
        }
    }

    fill(&mut into.member_id, &from.member_id);
    fill(&mut into.first_name, &from.first_name);
    fill(&mut into.last_name, &from.last_name);
    fill(&mut into.nick_name, &from.nick_name);
    fill(&mut into.email, &from.email);
    fill(&mut into.mobile_phone, &from.mobile_phone);
    fill(&mut into.home_phone, &from.home_phone);
}

/// Collapse (parent, youth) rows into one record per parent.
///
/// Output is ordered by parent ID, and each parent's scout list is sorted with
/// duplicates removed.
pub fn aggregate_parents(
    links: &[ParentLink],
    unit: &UnitLink,
    synced_at: DateTime<Utc>,
) -> Vec<Parent> {
    let mut by_parent: BTreeMap<&str, (ParentInformation, BTreeSet<&str>)> = BTreeMap::new();

    for link in links {
        let (info, scouts) = by_parent
            .entry(link.parent_user_id.as_str())
            .or_insert_with(|| (link.parent_information.clone(), BTreeSet::new()));
        merge_parent_info(info, &link.parent_information);
        scouts.insert(link.youth_user_id.as_str());
    }

    by_parent
        .into_iter()
        .map(|(parent_id, (info, scouts))| {
            let first = info.first_name.as_deref().unwrap_or_default();
            let last = info.last_name.as_deref().unwrap_or_default();
            Parent {
                user_id: parent_id.to_string(),
                member_id: non_empty(info.member_id.as_deref()),
                first_name: first.trim().to_string(),
                last_name: last.trim().to_string(),
                nick_name: non_empty(info.nick_name.as_deref()),
                full_name: full_name(first, last, info.nick_name.as_deref()),
                email: non_empty(info.email.as_deref()),
                phone: phone(info.mobile_phone.as_deref(), info.home_phone.as_deref()),
                scout_user_ids: scouts.into_iter().map(str::to_string).collect(),
                unit: unit.clone(),
                synced_at,
            }
        })
        .collect()
}

// ─── Advancement ─────────────────────────────────────────────────────────────

pub fn map_rank(
    user_id: &str,
    program: &ProgramRanks,
    rank: &ProviderRank,
    synced_at: DateTime<Utc>,
) -> Advancement {
    let percent_completed = normalize_percent(rank.percent_completed);
    let awarded = normalize_flag(rank.awarded.as_ref());

    Advancement {
        user_id: user_id.to_string(),
        advancement_type: AdvancementType::Rank,
        advancement_id: rank.id.clone(),
        name: rank.name.clone(),
        version: rank.version.clone(),
        program_id: rank.program_id.or(program.program_id),
        level: rank.level,
        status: non_empty(rank.status.as_deref()),
        completion: completion_state(
            rank.status.as_deref(),
            awarded,
            rank.marked_completed_date.is_some(),
            percent_completed,
        ),
        percent_completed,
        date_started: rank.date_started.clone(),
        date_completed: rank.marked_completed_date.clone(),
        date_awarded: rank.awarded_date.clone().or_else(|| rank.date_earned.clone()),
        counselor_user_id: None,
        eagle_required: None,
        synced_at,
    }
}

/// Every rank across every program.
pub fn map_ranks(
    user_id: &str,
    programs: &[ProgramRanks],
    synced_at: DateTime<Utc>,
) -> Vec<Advancement> {
    programs
        .iter()
        .flat_map(|program| {
            program
                .ranks
                .iter()
                .map(move |rank| map_rank(user_id, program, rank, synced_at))
        })
        .collect()
}

pub fn map_merit_badge(
    user_id: &str,
    badge: &ProviderMeritBadge,
    synced_at: DateTime<Utc>,
) -> Advancement {
    let percent_completed = normalize_percent(badge.percent_completed);
    let awarded = normalize_flag(badge.awarded.as_ref());
    let eagle_required = match &badge.is_eagle_required {
        Some(flag) if !flag.is_null() => normalize_flag(Some(flag)),
        _ => is_eagle_required_name(&badge.name),
    };

    Advancement {
        user_id: user_id.to_string(),
        advancement_type: AdvancementType::MeritBadge,
        advancement_id: badge.id.clone(),
        name: badge.name.clone(),
        version: badge.version.clone(),
        program_id: None,
        level: None,
        status: non_empty(badge.status.as_deref()),
        completion: completion_state(
            badge.status.as_deref(),
            awarded,
            badge.date_completed.is_some(),
            percent_completed,
        ),
        percent_completed,
        date_started: badge.date_started.clone(),
        date_completed: badge.date_completed.clone(),
        date_awarded: badge.awarded_date.clone(),
        counselor_user_id: badge.assigned_counselor_user_id.clone(),
        eagle_required: Some(eagle_required),
        synced_at,
    }
}

/// `None` when the award carries neither `awardId` nor `id`.
pub fn map_award(
    user_id: &str,
    award: &ProviderAward,
    synced_at: DateTime<Utc>,
) -> Option<Advancement> {
    let advancement_id = award.award_id.clone().or_else(|| award.id.clone())?;
    let percent_completed = normalize_percent(award.percent_completed);
    let awarded = normalize_flag(award.awarded.as_ref());

    Some(Advancement {
        user_id: user_id.to_string(),
        advancement_type: AdvancementType::Award,
        advancement_id,
        name: award.name.clone(),
        version: None,
        program_id: None,
        level: None,
        status: non_empty(award.status.as_deref()),
        completion: completion_state(
            award.status.as_deref(),
            awarded,
            award.date_completed.is_some(),
            percent_completed,
        ),
        percent_completed,
        date_started: award.date_started.clone(),
        date_completed: award.date_completed.clone(),
        date_awarded: award.awarded_date.clone().or_else(|| award.date_earned.clone()),
        counselor_user_id: None,
        eagle_required: None,
        synced_at,
    })
}

pub fn map_requirement(
    user_id: &str,
    advancement_type: AdvancementType,
    advancement_id: &str,
    requirement: &ProviderRequirement,
    synced_at: DateTime<Utc>,
) -> Requirement {
    let completed = normalize_flag(requirement.completed.as_ref());
    Requirement {
        user_id: user_id.to_string(),
        advancement_type,
        advancement_id: advancement_id.to_string(),
        requirement_id: requirement.id.clone(),
        number: non_empty(requirement.requirement_number.as_deref())
            .or_else(|| non_empty(requirement.list_number.as_deref())),
        short: non_empty(requirement.short.as_deref()),
        name: non_empty(requirement.name.as_deref()),
        started: completed || normalize_flag(requirement.started.as_ref()),
        completed,
        date_started: requirement.date_started.clone(),
        date_completed: requirement.date_completed.clone(),
        leader_approved_date: requirement.leader_approved_date.clone(),
        synced_at,
    }
}

pub fn map_activity_summary(
    summary: &ProviderActivitySummary,
    synced_at: DateTime<Utc>,
) -> ScoutActivityPatch {
    fn total(logs: &Option<LogTotals>, pick: fn(&LogTotals) -> Option<f64>) -> f64 {
        logs.as_ref().and_then(pick).unwrap_or(0.0)
    }

    ScoutActivityPatch {
        activity_summary: ActivitySummary {
            camping_days: total(&summary.camping_logs, |l| l.total_number_of_days),
            camping_nights: total(&summary.camping_logs, |l| l.total_number_of_nights),
            hiking_miles: total(&summary.hiking_logs, |l| l.total_number_of_miles),
            service_hours: total(&summary.service_logs, |l| l.total_number_of_hours),
            long_cruise_days: total(&summary.long_cruise_logs, |l| l.total_number_of_days),
        },
        activity_synced_at: synced_at,
    }
}

// ─── Calendar ────────────────────────────────────────────────────────────────

/// Map an event; the provider's invitee list replaces whatever was stored.
pub fn map_event(event: &ProviderEvent, synced_at: DateTime<Utc>) -> Event {
    Event {
        event_id: event.id.clone(),
        name: event.name.trim().to_string(),
        event_type: non_empty(event.event_type.as_deref()),
        start_date: event.start_date.clone(),
        end_date: event.end_date.clone(),
        location: non_empty(event.location.as_deref()),
        description: non_empty(event.description.as_deref()),
        notes: non_empty(event.notes.as_deref()),
        rsvp_enabled: normalize_flag(event.rsvp.as_ref()),
        units: event
            .units
            .iter()
            .map(|u| EventUnit {
                unit_id: u.unit_id.clone(),
                name: non_empty(u.unit_full_name.as_deref()),
                patrol_id: u.patrol_id.clone(),
                patrol_name: non_empty(u.patrol_name.as_deref()),
            })
            .collect(),
        invitees: event
            .invited_users
            .iter()
            .map(|i| Invitee {
                user_id: i.user_id.clone(),
                first_name: non_empty(i.first_name.as_deref()),
                last_name: non_empty(i.last_name.as_deref()),
                is_adult: normalize_flag(i.is_adult.as_ref()),
                rsvp: non_empty(i.rsvp_code.as_deref()),
                attended: normalize_flag(i.attended.as_ref()),
            })
            .collect(),
        created_by_user_id: event.created_by.as_ref().and_then(|u| u.user_id.clone()),
        date_last_modified: event.date_last_modified.clone(),
        synced_at,
    }
}

/// Map a calendar subscription; `owner_id` fills in a missing `userId`.
pub fn map_calendar(
    calendar: &ProviderCalendar,
    owner_id: &str,
    synced_at: DateTime<Utc>,
) -> CalendarSubscription {
    CalendarSubscription {
        user_calendar_id: calendar.user_calendar_id.clone(),
        user_id: calendar
            .user_id
            .clone()
            .unwrap_or_else(|| owner_id.to_string()),
        unit_id: calendar.unit_id.clone(),
        patrol_id: calendar.patrol_id.clone(),
        calendar_code: non_empty(calendar.calendar_code.as_deref()),
        color: non_empty(calendar.color.as_deref()),
        show_calendar: normalize_flag(calendar.show_calendar.as_ref()),
        synced_at,
    }
}

pub fn map_dashboard(
    org_guid: &str,
    kind: DashboardKind,
    data: Value,
    synced_at: DateTime<Utc>,
) -> DashboardSnapshot {
    DashboardSnapshot {
        org_guid: org_guid.to_string(),
        kind,
        data,
        synced_at,
    }
}
