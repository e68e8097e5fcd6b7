// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Scoutbook-Sync: mirror a unit's Scoutbook roster and advancement data
//!
//! This crate pulls roster, advancement, calendar and dashboard data from
//! the Scoutbook API and upserts it into a document store.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod time_utils;
