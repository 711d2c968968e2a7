//! # DNS Proxy Store
//!
//! This crate provides the persistent configuration store behind a
//! DNS-resolution proxy: named environments mapping hostnames to IPv4
//! addresses with TTLs, a list of upstream ("remote") DNS servers used as
//! resolution fallback, and a pointer to the currently active environment.
//!
//! ## Modules
//!
//! - [`config`]: The in-memory data model and its query/mutation methods
//! - [`error`]: Error types and handling
//! - [`logging`]: Logging setup for embedding binaries
//! - [`store`]: JSON persistence and the thread-safe [`ConfigStore`] handle
//!
//! ## Example
//!
//! ```ignore
//! use dns_proxy_store::{ConfigStore, Environment, MappingRequest};
//!
//! // Load the configuration file, or bootstrap a fresh one.
//! let store = ConfigStore::open("conf/config.json")?;
//!
//! store.add_env(Environment::new("prod"))?;
//! store.add_hostname(MappingRequest {
//!     env: "prod".to_string(),
//!     hostname: "api.local".to_string(),
//!     ip: [10, 0, 0, 5],
//!     ttl: 300,
//! })?;
//! ```
//!
//! ## Persistence
//!
//! The store is materialized from a JSON file once at startup and every
//! mutation rewrites the full file before returning, while the internal
//! lock is still held. Consumers (the DNS resolver, the management API)
//! interact only through [`ConfigStore`] operations, never by touching
//! the file directly.

pub mod config;
pub mod error;
pub mod logging;
pub mod store;

pub use config::{Configuration, Environment, HostnameMapping, MappingRequest};
pub use error::{Result, StoreError};
pub use store::ConfigStore;
