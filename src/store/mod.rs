pub mod log;

use std::net::SocketAddr;

use tokio::net::UdpSocket;
use tokio::sync::watch;

use crate::config::StoreConfig;
use crate::message::{Reply, Submission};

pub use self::log::{Log, MessageLog};

/// UDP back end: one datagram in, one status datagram out.
pub struct Store {
    socket: UdpSocket,
    log: MessageLog,
    max_datagram: usize,
}

impl Store {
    pub async fn bind(config: &StoreConfig) -> std::io::Result<Self> {
        let socket = UdpSocket::bind(config.bind_addr).await?;
        Ok(Self {
            socket,
            log: MessageLog::new(&config.log_path),
            max_datagram: config.max_datagram,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    /// Decode and persist one payload, returning the reply for its sender.
    pub async fn handle_datagram(&self, payload: &[u8]) -> Reply {
        let submission = match Submission::decode(payload) {
            Ok(submission) => submission,
            Err(err) => {
                tracing::warn!("Rejected malformed submission: {err}");
                return Reply::Malformed;
            }
        };

        match self.log.append(&submission).await {
            Ok(key) => {
                tracing::info!(key = %key, fields = submission.len(), "Stored message");
                Reply::Ack
            }
            Err(err) => {
                tracing::error!("Failed to store message: {err}");
                Reply::StorageFailed
            }
        }
    }

    /// Serve datagrams one at a time until `shutdown` flips to true or its
    /// sender goes away. Per-datagram failures never end the loop.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut buf = vec![0u8; self.max_datagram];

        tracing::debug!("Store loop started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                received = self.socket.recv_from(&mut buf) => match received {
                    Ok((len, peer)) => {
                        let reply = self.handle_datagram(&buf[..len]).await;
                        if let Err(e) = self.socket.send_to(reply.as_bytes(), peer).await {
                            tracing::error!("Failed to reply to {peer}: {e}");
                        }
                    }
                    Err(e) => {
                        tracing::error!("Store receive failed: {e}");
                    }
                },
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Store loop stopped");
    }
}
