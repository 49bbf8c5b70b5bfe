//! BugTrack E2E Test Support
//!
//! Boots the API server on an ephemeral port and exposes its base URL so
//! integration tests can drive the live HTTP surface with a real client.

pub mod server;

pub use server::TestServer;
