//! larkbridge core library — webhook event intake, session history, dedup,
//! command routing, and reply dispatch for the Lark → answer-service relay.

pub mod answer;
pub mod command;
pub mod config;
pub mod dedup;
pub mod event;
pub mod gateway;
pub mod reply;
pub mod session;
pub mod transport;
