//! Job service server: JSON RPC facade, event ingestion, and `PostgreSQL`
//! storage around a single time-bounded domain service.

pub mod app;
pub mod config;
pub mod ingest;
pub mod network;
pub mod rpc;
pub mod service;
pub mod storage;
pub mod telemetry;

pub use app::{App, RunMode};
pub use config::AppConfig;

