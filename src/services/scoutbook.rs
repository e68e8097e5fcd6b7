// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Scoutbook API client.
//!
//! Typed accessors for each endpoint family, plus the provider's response
//! shapes. Paths are built here; authentication, pacing and retries are the
//! executor's job, and its errors pass through unchanged.

use crate::config::Config;
use crate::error::{Result, SyncError};
use crate::models::UnitLink;
use crate::services::executor::RequestExecutor;
use crate::services::rate_limit::RateLimiter;
use crate::services::session::SessionManager;
use crate::time_utils::format_provider_date;
use anyhow::Context;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Scoutbook API client.
#[derive(Clone)]
pub struct ScoutbookClient {
    executor: Arc<RequestExecutor>,
    org_guid: String,
    unit_id: String,
}

impl ScoutbookClient {
    /// Wire up session, rate limiter and executor from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .context("failed building Scoutbook HTTP client")?;

        let session = Arc::new(SessionManager::new(config, http.clone()));
        Ok(Self::with_session(config, http, session))
    }

    /// Build a client around an existing session manager.
    pub fn with_session(
        config: &Config,
        http: reqwest::Client,
        session: Arc<SessionManager>,
    ) -> Self {
        let limiter = Arc::new(RateLimiter::new(config.rate_limit_interval));
        let executor = Arc::new(RequestExecutor::new(config, http, session, limiter));
        Self::new(config, executor)
    }

    pub fn new(config: &Config, executor: Arc<RequestExecutor>) -> Self {
        Self {
            executor,
            org_guid: config.org_guid.clone(),
            unit_id: config.unit_id.clone(),
        }
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        self.executor.session()
    }

    pub fn org_guid(&self) -> &str {
        &self.org_guid
    }

    pub fn unit_link(&self) -> UnitLink {
        UnitLink {
            org_guid: self.org_guid.clone(),
            unit_id: self.unit_id.clone(),
        }
    }

    // ─── Roster ──────────────────────────────────────────────────────────────

    pub async fn youth_roster(&self) -> Result<Vec<RosterMember>> {
        let path = format!("/organizations/v2/units/{}/youths", enc(&self.org_guid));
        let roster: RosterResponse = self.executor.get(&path).await?;
        Ok(roster.users)
    }

    pub async fn adult_roster(&self) -> Result<Vec<RosterMember>> {
        let path = format!("/organizations/v2/units/{}/adults", enc(&self.org_guid));
        let roster: RosterResponse = self.executor.get(&path).await?;
        Ok(roster.users)
    }

    /// One row per (parent, youth) pair.
    pub async fn parent_links(&self) -> Result<Vec<ParentLink>> {
        let path = format!("/organizations/v2/units/{}/parents", enc(&self.org_guid));
        self.executor.get(&path).await
    }

    // ─── Advancement ─────────────────────────────────────────────────────────

    pub async fn ranks(&self, user_id: &str) -> Result<Vec<ProgramRanks>> {
        let path = format!("/advancements/v2/youth/{}/ranks", enc(user_id));
        let ranks: RanksResponse = self.executor.get(&path).await?;
        Ok(ranks.program)
    }

    pub async fn rank_requirements(
        &self,
        user_id: &str,
        rank_id: &str,
    ) -> Result<Vec<ProviderRequirement>> {
        let path = format!(
            "/advancements/v2/youth/{}/ranks/{}/requirements",
            enc(user_id),
            enc(rank_id)
        );
        let payload: RequirementsPayload = self.executor.get(&path).await?;
        Ok(payload.into_requirements())
    }

    pub async fn merit_badges(&self, user_id: &str) -> Result<Vec<ProviderMeritBadge>> {
        let path = format!("/advancements/v2/youth/{}/meritBadges", enc(user_id));
        self.executor.get(&path).await
    }

    pub async fn merit_badge_requirements(
        &self,
        user_id: &str,
        merit_badge_id: &str,
    ) -> Result<Vec<ProviderRequirement>> {
        let path = format!(
            "/advancements/v2/youth/{}/meritBadges/{}/requirements",
            enc(user_id),
            enc(merit_badge_id)
        );
        let payload: RequirementsPayload = self.executor.get(&path).await?;
        Ok(payload.into_requirements())
    }

    pub async fn awards(&self, user_id: &str) -> Result<Vec<ProviderAward>> {
        let path = format!("/advancements/v2/youth/{}/awards", enc(user_id));
        self.executor.get(&path).await
    }

    pub async fn activity_summary(&self, user_id: &str) -> Result<ProviderActivitySummary> {
        let path = format!("/advancements/v2/{}/userActivitySummary", enc(user_id));
        self.executor.get(&path).await
    }

    // ─── Calendar ────────────────────────────────────────────────────────────

    /// Unit events between two dates (inclusive).
    pub async fn events(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<ProviderEvent>> {
        if from > to {
            return Err(SyncError::Internal(anyhow::anyhow!(
                "Event window starts after it ends: {} > {}",
                from,
                to
            )));
        }

        let body = serde_json::json!({
            "unitId": self.unit_id,
            "fromDate": format_provider_date(from),
            "toDate": format_provider_date(to),
            "showDLEvents": true,
        });
        self.executor.post("/advancements/events", &body).await
    }

    pub async fn calendars(&self, user_id: &str) -> Result<Vec<ProviderCalendar>> {
        let path = format!("/advancements/v2/users/{}/calendars", enc(user_id));
        self.executor.get(&path).await
    }

    // ─── Dashboards & profiles ───────────────────────────────────────────────

    pub async fn advancement_dashboard(&self) -> Result<Value> {
        let path = format!("/organizations/v2/{}/advancementDashboard", enc(&self.org_guid));
        self.executor.get(&path).await
    }

    pub async fn activities_dashboard(&self) -> Result<Value> {
        let path = format!(
            "/organizations/v2/{}/unitActivitiesDashboard",
            enc(&self.org_guid)
        );
        self.executor.get(&path).await
    }

    /// Full person profile, returned as the provider sends it.
    pub async fn person_profile(&self, user_id: &str) -> Result<Value> {
        let path = format!("/persons/v2/{}/personprofile", enc(user_id));
        self.executor.get(&path).await
    }
}

fn enc(segment: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(segment)
}

// ─────────────────────────────────────────────────────────────────────────────
// Provider response shapes
// ─────────────────────────────────────────────────────────────────────────────

/// Provider IDs arrive as either JSON numbers or strings; store them as strings.
fn value_to_id(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn de_id<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    value_to_id(value).ok_or_else(|| serde::de::Error::custom("expected a string or numeric id"))
}

fn de_opt_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(value_to_id))
}

/// Explicit `null` reads as the field's default, same as a missing key.
fn de_or_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Deserialize)]
struct RosterResponse {
    #[serde(default, deserialize_with = "de_or_default")]
    users: Vec<RosterMember>,
}

/// Youth or adult roster entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterMember {
    #[serde(deserialize_with = "de_id")]
    pub user_id: String,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub member_id: Option<String>,
    #[serde(default, deserialize_with = "de_or_default")]
    pub first_name: String,
    #[serde(default, deserialize_with = "de_or_default")]
    pub last_name: String,
    #[serde(default)]
    pub nick_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub mobile_phone: Option<String>,
    #[serde(default)]
    pub home_phone: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub grade: Option<i64>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "de_or_default")]
    pub positions: Vec<MemberPosition>,
    #[serde(default, deserialize_with = "de_or_default")]
    pub highest_ranks_awarded: Vec<AwardedRank>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberPosition {
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub patrol_id: Option<String>,
    #[serde(default)]
    pub patrol_name: Option<String>,
}

/// Entry in a member's `highestRanksAwarded` list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardedRank {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub rank: Option<String>,
    #[serde(default, deserialize_with = "de_or_default")]
    pub level: i64,
    #[serde(default)]
    pub program_id: Option<i64>,
    #[serde(default)]
    pub date_earned: Option<String>,
}

/// Parent-to-youth link row.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentLink {
    #[serde(deserialize_with = "de_id")]
    pub youth_user_id: String,
    #[serde(deserialize_with = "de_id")]
    pub parent_user_id: String,
    #[serde(default, deserialize_with = "de_or_default")]
    pub parent_information: ParentInformation,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentInformation {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub member_id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub nick_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub mobile_phone: Option<String>,
    #[serde(default)]
    pub home_phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct RanksResponse {
    #[serde(default, deserialize_with = "de_or_default")]
    program: Vec<ProgramRanks>,
}

/// Ranks grouped under one program (Cub Scouting, Scouts BSA, ...).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramRanks {
    #[serde(default)]
    pub program_id: Option<i64>,
    #[serde(default)]
    pub program: Option<String>,
    #[serde(default, deserialize_with = "de_or_default")]
    pub ranks: Vec<ProviderRank>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderRank {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default, deserialize_with = "de_or_default")]
    pub name: String,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub version: Option<String>,
    #[serde(default)]
    pub level: Option<i64>,
    #[serde(default)]
    pub program_id: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub percent_completed: Option<f64>,
    #[serde(default)]
    pub date_started: Option<String>,
    #[serde(default)]
    pub marked_completed_date: Option<String>,
    #[serde(default)]
    pub awarded_date: Option<String>,
    #[serde(default)]
    pub date_earned: Option<String>,
    #[serde(default)]
    pub awarded: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderMeritBadge {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default, deserialize_with = "de_or_default")]
    pub name: String,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub version: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub percent_completed: Option<f64>,
    #[serde(default)]
    pub date_started: Option<String>,
    #[serde(default)]
    pub date_completed: Option<String>,
    #[serde(default)]
    pub awarded_date: Option<String>,
    #[serde(default)]
    pub awarded: Option<Value>,
    #[serde(default)]
    pub is_eagle_required: Option<Value>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub assigned_counselor_user_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderAward {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub award_id: Option<String>,
    #[serde(default, deserialize_with = "de_or_default")]
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub percent_completed: Option<f64>,
    #[serde(default)]
    pub date_started: Option<String>,
    #[serde(default)]
    pub date_completed: Option<String>,
    #[serde(default)]
    pub awarded_date: Option<String>,
    #[serde(default)]
    pub date_earned: Option<String>,
    #[serde(default)]
    pub awarded: Option<Value>,
}

/// Requirement endpoints answer either with a bare list or with the parent
/// advancement wrapping a `requirements` list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RequirementsPayload {
    Wrapped {
        #[serde(default, deserialize_with = "de_or_default")]
        requirements: Vec<ProviderRequirement>,
    },
    Bare(Vec<ProviderRequirement>),
}

impl RequirementsPayload {
    fn into_requirements(self) -> Vec<ProviderRequirement> {
        match self {
            RequirementsPayload::Wrapped { requirements } => requirements,
            RequirementsPayload::Bare(requirements) => requirements,
        }
    }
}

/// Flags such as `started`/`completed` arrive as booleans or as "True"/"False"
/// strings depending on the endpoint, so they are kept raw here.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderRequirement {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub requirement_number: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub list_number: Option<String>,
    #[serde(default)]
    pub short: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub started: Option<Value>,
    #[serde(default)]
    pub completed: Option<Value>,
    #[serde(default)]
    pub date_started: Option<String>,
    #[serde(default)]
    pub date_completed: Option<String>,
    #[serde(default)]
    pub leader_approved_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderActivitySummary {
    #[serde(default)]
    pub camping_logs: Option<LogTotals>,
    #[serde(default)]
    pub hiking_logs: Option<LogTotals>,
    #[serde(default)]
    pub service_logs: Option<LogTotals>,
    #[serde(default)]
    pub long_cruise_logs: Option<LogTotals>,
}

/// Totals block shared by the camping/hiking/service/cruise logs.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogTotals {
    #[serde(default)]
    pub total_number_of_days: Option<f64>,
    #[serde(default)]
    pub total_number_of_nights: Option<f64>,
    #[serde(default)]
    pub total_number_of_miles: Option<f64>,
    #[serde(default)]
    pub total_number_of_hours: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderEvent {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default, deserialize_with = "de_or_default")]
    pub name: String,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub rsvp: Option<Value>,
    #[serde(default, deserialize_with = "de_or_default")]
    pub units: Vec<ProviderEventUnit>,
    #[serde(default, deserialize_with = "de_or_default")]
    pub invited_users: Vec<ProviderInvitee>,
    #[serde(default)]
    pub created_by: Option<ProviderEventUser>,
    #[serde(default)]
    pub date_last_modified: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderEventUnit {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub unit_id: Option<String>,
    #[serde(default)]
    pub unit_full_name: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub patrol_id: Option<String>,
    #[serde(default)]
    pub patrol_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInvitee {
    #[serde(deserialize_with = "de_id")]
    pub user_id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub is_adult: Option<Value>,
    #[serde(default)]
    pub rsvp_code: Option<String>,
    #[serde(default)]
    pub attended: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderEventUser {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCalendar {
    #[serde(deserialize_with = "de_id")]
    pub user_calendar_id: String,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub unit_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub patrol_id: Option<String>,
    #[serde(default)]
    pub calendar_code: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub show_calendar: Option<Value>,
}
