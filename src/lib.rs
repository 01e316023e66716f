//! adtrack - Advertisement engagement tracking for the journal website
//!
//! Records impressions, viewable impressions and clicks for the ads shown
//! on journal pages and serves read-time metrics to the editorial dashboard.
//!
//! # Architecture
//! - `session`: anonymous per-context session identifiers
//! - `tracker`: client-side viewport engagement detection
//! - `analytics`: event model and pure metric/bucketing math
//! - `storage`: SeaORM event store and advertisement directory
//! - `services`: ingestion, aggregation and realtime publishing
//! - `api`: HTTP endpoints and middleware
//! - `interfaces`: command-line interface
//! - `config`: configuration management
//! - `runtime`: application lifecycle and execution modes
//! - `system`: logging setup

pub mod analytics;
pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod runtime;
pub mod services;
pub mod session;
pub mod storage;
pub mod system;
pub mod tracker;
