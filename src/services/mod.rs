// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - Scoutbook access and sync logic.

pub mod executor;
pub mod mapping;
pub mod rate_limit;
pub mod scoutbook;
pub mod session;
pub mod sync;

pub use executor::{RequestExecutor, RetryPolicy};
pub use rate_limit::RateLimiter;
pub use scoutbook::ScoutbookClient;
pub use session::{Session, SessionManager};
pub use sync::{verify_credentials, FullSyncResult, SyncOrchestrator};
