//! Fire-and-forget UDP transmission.

use std::net::SocketAddr;

use tokio::net::UdpSocket;
use tracing::{debug, warn};

/// Sends encoded records to a fixed destination over UDP.
///
/// Transmission is best-effort: a failed send is logged and dropped, never
/// surfaced as an error. The receiver being absent is a normal operating
/// condition for the agent.
pub struct Sender {
    socket: UdpSocket,
    destination: SocketAddr,
}

impl Sender {
    /// Bind an unspecified local port for sending to `destination`.
    pub async fn bind(destination: SocketAddr) -> std::io::Result<Self> {
        let local: SocketAddr = if destination.is_ipv4() {
            "0.0.0.0:0".parse().map_err(std::io::Error::other)?
        } else {
            "[::]:0".parse().map_err(std::io::Error::other)?
        };
        let socket = UdpSocket::bind(local).await?;

        debug!(%destination, "sender bound");
        Ok(Self {
            socket,
            destination,
        })
    }

    pub fn destination(&self) -> SocketAddr {
        self.destination
    }

    /// Send one datagram. Returns whether the payload left the socket.
    pub async fn send(&self, payload: &[u8]) -> bool {
        // Largest UDP payload over IPv4; bigger records (a long process
        // list) will be rejected by the OS below.
        if payload.len() > 65_507 {
            warn!(bytes = payload.len(), "record exceeds maximum datagram size");
        }

        match self.socket.send_to(payload, self.destination).await {
            Ok(sent) => {
                if sent != payload.len() {
                    warn!(
                        sent,
                        expected = payload.len(),
                        "datagram truncated on send"
                    );
                }
                debug!(bytes = sent, "record sent");
                true
            }
            Err(e) => {
                // Includes ICMP port-unreachable surfacing as a refusal on a
                // connected-style send. The agent keeps running regardless.
                warn!(error = %e, destination = %self.destination, "send failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_and_receive() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let destination = receiver.local_addr().unwrap();

        let sender = Sender::bind(destination).await.unwrap();
        assert!(sender.send(b"{\"head/name\":\"ws01\"}").await);

        let mut buf = [0u8; 128];
        let (len, _) = receiver.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], b"{\"head/name\":\"ws01\"}");
    }

    #[tokio::test]
    async fn test_send_to_closed_port_does_not_panic() {
        // Grab a port and release it so nothing is listening there.
        let probe = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let destination = probe.local_addr().unwrap();
        drop(probe);

        let sender = Sender::bind(destination).await.unwrap();
        // UDP sends to a closed port may or may not report an error; either
        // way the sender must survive repeated attempts.
        let _ = sender.send(b"one").await;
        let _ = sender.send(b"two").await;
    }
}
