//! Utilities shared by the PingSpace server and client.

pub mod logger;
pub mod time;
