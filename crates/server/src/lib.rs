//! BugTrack API Server
//!
//! HTTP API over the bug repository: CRUD, filtering, derived statistics.

pub mod config;
pub mod server;
pub mod state;
pub mod stats;

pub use config::ServerConfig;
pub use server::{ApiAuth, ApiServer, ApiServerConfig, BugView};
pub use state::StateManager;
pub use stats::BugStats;
