use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use tokio::net::UdpSocket;

use crate::config::RelayConfig;
use crate::message::Reply;

#[derive(Debug)]
pub enum RelayError {
    Io(std::io::Error),
    Timeout,
    UnexpectedReply(String),
}

impl std::fmt::Display for RelayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelayError::Io(err) => write!(f, "UDP round-trip failed: {err}"),
            RelayError::Timeout => write!(f, "store did not reply in time"),
            RelayError::UnexpectedReply(reply) => write!(f, "unexpected store reply {reply:?}"),
        }
    }
}

impl std::error::Error for RelayError {}

impl From<std::io::Error> for RelayError {
    fn from(err: std::io::Error) -> Self {
        RelayError::Io(err)
    }
}

/// Forwards raw form bodies to the store, one fresh socket per request.
#[derive(Debug, Clone)]
pub struct RelayClient {
    config: RelayConfig,
}

impl RelayClient {
    pub fn new(config: RelayConfig) -> Self {
        Self { config }
    }

    pub fn store_addr(&self) -> SocketAddr {
        self.config.store_addr
    }

    /// Send `payload` as a single datagram and wait for the store's reply.
    pub async fn round_trip(&self, payload: &[u8]) -> Result<Reply, RelayError> {
        let store_addr = self.config.store_addr;
        let local: SocketAddr = if store_addr.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let exchange = async {
            let socket = UdpSocket::bind(local).await?;
            socket.connect(store_addr).await?;
            socket.send(payload).await?;

            let mut buf = vec![0u8; self.config.reply_buffer];
            let len = socket.recv(&mut buf).await?;
            Ok::<_, std::io::Error>(buf[..len].to_vec())
        };

        let reply = tokio::time::timeout(self.config.timeout, exchange)
            .await
            .map_err(|_| RelayError::Timeout)??;

        Reply::parse(&reply)
            .ok_or_else(|| RelayError::UnexpectedReply(String::from_utf8_lossy(&reply).into_owned()))
    }
}
