//! Watchtower - client-side API orchestration for the Watchtower security
//! monitoring dashboard.
//!
//! This library owns everything between the dashboard views and the backend:
//! which backend requests go to, the credentials attached to them, resilient
//! request execution, the session lifecycle, the remote-server cache, and
//! coordinated dashboard refreshes.

pub mod cli;
pub mod client;
pub mod config;
pub mod credentials;
pub mod exports;
pub mod logging;
pub mod refresh;
pub mod registry;
pub mod remote;
pub mod session;
pub mod storage;
