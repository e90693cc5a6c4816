use std::{
    fmt::{Debug, Display},
    net::{IpAddr, SocketAddr},
    time::Duration,
};

use log::{debug, error, info, warn};

pub struct HoneypotLogger;

impl HoneypotLogger {
    pub fn init() {
        #[cfg(debug_assertions)]
        env_logger::builder()
            .filter_level(log::LevelFilter::Debug)
            .parse_default_env()
            .init();
        #[cfg(not(debug_assertions))]
        env_logger::init();
    }

    pub fn unknown_config_field(key: &str, value: &dyn Debug) {
        warn!("Unknown configuration '{}' with value {:?}", key, value);
    }

    pub fn preparing_socket(address: &str) {
        info!("Preparing socket {}", address);
    }

    pub fn listening(address: &SocketAddr) {
        info!("Listening on {}", address);
    }

    pub fn tcp_nodelay_failed(err: &std::io::Error) {
        error!("Failed to set TCP_NODELAY: {err}");
    }

    pub fn accept_failed(err: &std::io::Error) {
        warn!("Failed to accept connection: {err}");
    }

    pub fn connection_limited(addr: &SocketAddr) {
        debug!("Connection limit reached, dropping {addr}");
    }

    pub fn new_connection(address: &SocketAddr) {
        debug!("New connection {}", address);
    }

    pub fn handshake_completed(addr: &SocketAddr, protocol_version: u32, next_state: &str) {
        debug!("Handshake from {addr}: v{protocol_version}, next state: {next_state}");
    }

    pub fn ping(addr: &SocketAddr, host: &str, port: u16, protocol_version: u32, seq: u32) {
        info!("Ping from {addr} ({host}:{port}) v{protocol_version} #{seq}");
    }

    pub fn join(
        addr: &SocketAddr,
        username: &str,
        host: &str,
        port: u16,
        protocol_version: u32,
        seq: u32,
    ) {
        info!("Join from {username} at {addr} ({host}:{port}) v{protocol_version} #{seq}");
    }

    pub fn session_finished(addr: &SocketAddr, state: &str, elapsed_ms: u64) {
        debug!("Connection {addr} finished {state} in {elapsed_ms}ms");
    }

    pub fn connection_error(client: &SocketAddr, err: &dyn Display) {
        if dotenvy::var("DO_NOT_LOG_CONNECTION_ERROR").is_ok() {
            return;
        }
        debug!("connection error@{client}: {}", err);
    }

    pub fn deadline_missed(stage: &str, duration: Duration, client: &SocketAddr) {
        debug!(
            "Deadline exceeded while {stage} (limit {:?}) client={client}",
            duration
        );
    }

    pub fn notify_throttled(ip: &IpAddr, kind: &str) {
        debug!("Throttled {kind} notification for {ip}");
    }

    pub fn notify_failed(kind: &str, err: &dyn Display) {
        debug!("Failed to deliver {kind} notification: {err}");
    }

    pub fn notify_rejected(kind: &str, status: u16) {
        warn!("Webhook rejected {kind} notification with status {status}");
    }

    pub fn stopping() {
        info!("Received signal, stopping...");
    }
}
