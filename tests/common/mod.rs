// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use scoutbook_sync::config::Config;
use scoutbook_sync::db::FirestoreDb;
use scoutbook_sync::services::{ScoutbookClient, SessionManager};
use scoutbook_sync::time_utils::Clock;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const USERNAME: &str = "leader1";
pub const ORG_GUID: &str = "ORG-GUID-1";
pub const UNIT_ID: &str = "121";
pub const AUTH_PATH: &str = "/api/users/leader1/authenticate";

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Clock that only moves when told to.
#[allow(dead_code)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

#[allow(dead_code)]
impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(now),
        })
    }

    pub fn advance(&self, by: ChronoDuration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Fixed starting point for clock-driven tests.
#[allow(dead_code)]
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

/// Mint a provider-style token expiring at `exp`.
#[allow(dead_code)]
pub fn mint_token(exp: DateTime<Utc>) -> String {
    #[derive(serde::Serialize)]
    struct Claims {
        sub: String,
        exp: i64,
    }

    encode(
        &Header::new(Algorithm::HS256),
        &Claims {
            sub: "9001".to_string(),
            exp: exp.timestamp(),
        },
        &EncodingKey::from_secret(b"not-our-secret"),
    )
    .unwrap()
}

/// Config pointed at the mock server with near-zero pacing.
#[allow(dead_code)]
pub fn test_config(server: &MockServer) -> Config {
    Config {
        username: USERNAME.to_string(),
        password: "hunter2".to_string(),
        org_guid: ORG_GUID.to_string(),
        unit_id: UNIT_ID.to_string(),
        api_url: server.uri(),
        auth_url: server.uri(),
        rate_limit_interval: Duration::from_millis(1),
        max_retries: 3,
        retry_base_delay: Duration::from_millis(5),
        ..Default::default()
    }
}

#[allow(dead_code)]
pub fn auth_response(exp: DateTime<Utc>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "token": mint_token(exp),
        "account": {"userId": 9001}
    }))
}

/// Authentication that always succeeds with a token good for a day.
#[allow(dead_code)]
pub async fn mount_auth(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(AUTH_PATH))
        .respond_with(auth_response(Utc::now() + ChronoDuration::hours(24)))
        .mount(server)
        .await;
}

/// Session manager using `clock`, plus a client sharing it.
#[allow(dead_code)]
pub fn client_with_clock(
    config: &Config,
    clock: Arc<dyn Clock>,
) -> (ScoutbookClient, Arc<SessionManager>) {
    let http = reqwest::Client::new();
    let session = Arc::new(SessionManager::new(config, http.clone()).with_clock(clock));
    let client = ScoutbookClient::with_session(config, http, session.clone());
    (client, session)
}

/// Number of requests the server has seen on `request_path`.
#[allow(dead_code)]
pub async fn request_count(server: &MockServer, request_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == request_path)
        .count()
}

#[allow(dead_code)]
fn roster_member(user_id: u64, first: &str, last: &str) -> serde_json::Value {
    json!({
        "userId": user_id,
        "memberId": format!("13{:07}", user_id),
        "firstName": first,
        "lastName": last,
        "positions": [{"position": "Scouts BSA", "patrolId": 8, "patrolName": "Hawks"}],
        "highestRanksAwarded": [
            {"id": 2, "rank": "Tenderfoot", "level": 2, "programId": 2, "dateEarned": "2025-01-10"},
            {"id": 3, "rank": "Second Class", "level": 3, "programId": 2, "dateEarned": "2025-06-10"}
        ]
    })
}

/// Unit with youth 1, 2 and 3, adult 50 and parent 60 (of youth 1 and 2).
#[allow(dead_code)]
pub async fn mount_roster(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("/organizations/v2/units/{}/youths", ORG_GUID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [
                roster_member(1, "Alex", "Able"),
                roster_member(2, "Blair", "Baker"),
                roster_member(3, "Casey", "Cole")
            ]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/organizations/v2/units/{}/adults", ORG_GUID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [{
                "userId": 50,
                "firstName": "Dana",
                "lastName": "Dunn",
                "positions": [{"position": "Scoutmaster"}]
            }]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/organizations/v2/units/{}/parents", ORG_GUID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"youthUserId": 1, "parentUserId": 60, "parentInformation": {"firstName": "Pat", "lastName": "Able"}},
            {"youthUserId": 2, "parentUserId": 60, "parentInformation": {"firstName": "Pat", "lastName": "Able"}}
        ])))
        .mount(server)
        .await;
}

/// Advancement endpoints for any youth: one rank in progress with two
/// requirements, one merit badge not started, no awards.
#[allow(dead_code)]
pub async fn mount_advancement(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/advancements/v2/youth/\d+/ranks$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "program": [{
                "programId": 2,
                "program": "Scouts BSA",
                "ranks": [{
                    "id": 4,
                    "name": "First Class",
                    "level": 4,
                    "programId": 2,
                    "status": "Started",
                    "percentCompleted": 0.5
                }]
            }]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/advancements/v2/youth/\d+/ranks/\d+/requirements$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 4,
            "requirements": [
                {"id": 401, "listNumber": "1a", "completed": "True"},
                {"id": 402, "listNumber": "1b", "completed": "False"}
            ]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/advancements/v2/youth/\d+/meritBadges$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 77, "name": "Archery", "percentCompleted": 0}
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/advancements/v2/youth/\d+/awards$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/advancements/v2/\d+/userActivitySummary$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "campingLogs": {"totalNumberOfDays": 6, "totalNumberOfNights": 5},
            "hikingLogs": {"totalNumberOfMiles": 10.5}
        })))
        .mount(server)
        .await;
}

/// Events, dashboards and calendars for the unit.
#[allow(dead_code)]
pub async fn mount_unit_extras(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/advancements/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 3001,
            "name": "Spring Campout",
            "startDate": "2026-03-20T17:00:00",
            "rsvp": true,
            "invitedUsers": [{"userId": 1, "rsvpCode": "Y"}]
        }])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/organizations/v2/[^/]+/advancementDashboard$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ranks": {"total": 3}})))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/organizations/v2/[^/]+/unitActivitiesDashboard$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"campouts": 4})))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/advancements/v2/users/\d+/calendars$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"userCalendarId": 900, "unitId": 121, "showCalendar": true}
        ])))
        .mount(server)
        .await;
}
