use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Largest payload a single IPv4 UDP datagram can carry.
pub const MAX_UDP_PAYLOAD: usize = 65_507;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub web_root: PathBuf,
    pub max_body_size: usize,
    pub log_level: String,
    pub relay: RelayConfig,
    pub store: StoreConfig,
}

/// Settings handed to the HTTP relay.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub store_addr: SocketAddr,
    pub timeout: Duration,
    pub reply_buffer: usize,
}

/// Settings handed to the UDP store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub bind_addr: SocketAddr,
    pub log_path: PathBuf,
    pub max_datagram: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let host: IpAddr = env_or("MSGDROP_HTTP_HOST", "127.0.0.1")
            .parse()
            .map_err(|e| format!("Invalid MSGDROP_HTTP_HOST: {e}"))?;

        let port: u16 = env_or("MSGDROP_HTTP_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid MSGDROP_HTTP_PORT: {e}"))?;

        let udp_host: IpAddr = env_or("MSGDROP_UDP_HOST", "127.0.0.1")
            .parse()
            .map_err(|e| format!("Invalid MSGDROP_UDP_HOST: {e}"))?;

        let udp_port: u16 = env_or("MSGDROP_UDP_PORT", "5000")
            .parse()
            .map_err(|e| format!("Invalid MSGDROP_UDP_PORT: {e}"))?;

        let storage_dir = PathBuf::from(env_or("MSGDROP_STORAGE_DIR", "storage"));
        let log_file = env_or("MSGDROP_LOG_FILE", "data.json");
        let web_root = PathBuf::from(env_or("MSGDROP_WEB_ROOT", "."));

        let timeout_secs: u64 = env_or("MSGDROP_RELAY_TIMEOUT_SECS", "5")
            .parse()
            .map_err(|e| format!("Invalid MSGDROP_RELAY_TIMEOUT_SECS: {e}"))?;

        let max_body_size: usize = env_or("MSGDROP_MAX_BODY_SIZE", &MAX_UDP_PAYLOAD.to_string())
            .parse()
            .map_err(|e| format!("Invalid MSGDROP_MAX_BODY_SIZE: {e}"))?;

        if max_body_size > MAX_UDP_PAYLOAD {
            return Err(format!(
                "Invalid MSGDROP_MAX_BODY_SIZE: {max_body_size} exceeds the UDP payload limit of {MAX_UDP_PAYLOAD}"
            ));
        }

        let log_level = env_or("MSGDROP_LOG_LEVEL", "info");

        let store_addr = SocketAddr::new(udp_host, udp_port);

        Ok(Config {
            host,
            port,
            web_root,
            max_body_size,
            log_level,
            relay: RelayConfig {
                store_addr,
                timeout: Duration::from_secs(timeout_secs),
                reply_buffer: 1024,
            },
            store: StoreConfig {
                bind_addr: store_addr,
                log_path: storage_dir.join(log_file),
                max_datagram: 65_535,
            },
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
