use std::{
    fmt::Display,
    net::{IpAddr, SocketAddr},
    time::Duration,
};

use log::{debug, error, info, warn};

use crate::session::ShutdownReport;

pub struct SessionLogger;

impl SessionLogger {
    pub fn preparing_socket(address: &str) {
        info!("Preparing socket {}", address);
    }

    pub fn rate_limited(ip: &IpAddr) {
        debug!("Rate-limited {ip}");
    }

    pub fn tcp_nodelay_failed(err: &std::io::Error) {
        error!("Failed to set TCP_NODELAY: {err}");
    }

    pub fn new_connection(address: &SocketAddr) {
        info!("New connection {}", address);
    }

    pub fn handshake_completed(elapsed_ms: u64, next_state: &str, version: &dyn Display) {
        debug!(
            "Handshake completed in {}ms, next state: {}, version: {}",
            elapsed_ms, next_state, version
        );
    }

    pub fn connection_closed(addr: &SocketAddr, err: &dyn Display) {
        debug!("Connection {addr} closed: {err}");
    }

    pub fn connection_error(client: &SocketAddr, err: &dyn Display) {
        if dotenvy::var("DO_NOT_LOG_CONNECTION_ERROR").is_ok() {
            return;
        }
        error!("connection error@{client}: {}", err);
    }

    pub fn disconnect_warning(addr: &SocketAddr, reason: &str) {
        warn!("Disconnecting client {addr}: {reason}");
    }

    pub fn parser_failure(addr: &SocketAddr, stage: &str, err: &dyn Display) {
        warn!("Parser failed during {stage} for client {addr}: {err}");
    }

    pub fn encode_failure(addr: &SocketAddr, packet: &str, err: &dyn Display) {
        error!("Failed to encode {packet} for {addr}: {err}");
    }

    pub fn writer_failed(addr: &SocketAddr, err: &std::io::Error) {
        debug!("Writer for {addr} stopped: {err}");
    }

    pub fn login_started(addr: &SocketAddr, username: &str, version: &dyn Display) {
        info!("{username} ({addr}) logging in with {version}");
    }

    pub fn plugin_probe_answered(addr: &SocketAddr, channel: &str, understood: bool) {
        debug!("Plugin probe {channel} for {addr}: understood={understood}");
    }

    pub fn unmatched_plugin_response(addr: &SocketAddr, id: i32) {
        debug!("Ignoring plugin response {id} from {addr}: no request outstanding");
    }

    pub fn backend_switch_started(addr: &SocketAddr) {
        debug!("Sending {addr} back to configuration for a backend switch");
    }

    pub fn backend_switch_finished(addr: &SocketAddr) {
        debug!("{addr} is back in play");
    }

    pub fn bossbars_replayed(addr: &SocketAddr, count: usize) {
        debug!("Replayed {count} boss bars to {addr}");
    }

    pub fn config_unknown_field(key: &str) {
        warn!("Unknown setting '{key}' in settings.toml");
    }

    pub fn shutdown_started(sessions: usize, grace: Duration) {
        info!("Shutting down, waiting up to {grace:?} for {sessions} sessions");
    }

    pub fn shutdown_finished(report: &ShutdownReport) {
        if report.forced > 0 {
            warn!(
                "Shutdown forced cleanup of {} of {} sessions after {:?}",
                report.forced, report.initial, report.elapsed
            );
        } else {
            info!(
                "Shutdown complete, {} sessions drained in {:?}",
                report.initial, report.elapsed
            );
        }
    }
}
