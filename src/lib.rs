//! Minecraft server list and login honeypot.
//!
//! Answers status pings with a configurable server entry, kicks every login
//! attempt, and reports both to an optional webhook.
pub mod config;
pub mod counter;
pub mod error;
pub mod honeypot;
pub mod logging;
pub mod metrics;
pub mod notify;
pub mod packet;
pub mod responses;
pub mod session;
pub mod telemetry;
pub mod threat;
pub mod utils;
