//! Webhook HTTP server and event dispatcher.

mod server;

pub use server::{dispatch, run_server, BridgeState};
