//! # explore-with-me
//!
//! Event discovery platform split into two HTTP services.
//!
//! The **main service** lets users publish events, request participation,
//! comment and browse curated compilations; administrators moderate events
//! and comments. The **statistics service** records endpoint hits and
//! answers aggregated view counts, which the main service attaches to every
//! event it returns.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── Services (service/) ──── StatsClient (client/) ──► statistics service
//!     ├── Domain rules (domain/)
//!     │
//!     └── Stores (persistence/): PostgreSQL or in-memory
//! ```

pub mod api;
pub mod app_state;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod telemetry;
