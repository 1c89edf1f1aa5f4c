//! Transport implementations: a TCP stream to the server's primary port and
//! a connectionless UDP fallback. One frame per send; a failed stream is
//! dropped and reopened on the next connect.

use bytes::Bytes;
use millitag_lib::BeaconError;
use millitag_lib::net::Transport;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpStream, UdpSocket};
use tracing::{debug, info};

pub struct TcpTransport {
    host: String,
    port: u16,
    stream: Option<TcpStream>,
}

impl TcpTransport {
    pub fn new(host: String, port: u16) -> Self {
        TcpTransport {
            host,
            port,
            stream: None,
        }
    }
}

impl Transport for TcpTransport {
    async fn connect(&mut self) -> Result<(), BeaconError> {
        let stream = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|e| {
                BeaconError::Network(format!("connect {}:{}: {e}", self.host, self.port))
            })?;
        info!(host = %self.host, port = self.port, "TCP connected");
        self.stream = Some(stream);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn send(&mut self, frame: Bytes) -> Result<(), BeaconError> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(BeaconError::Network("not connected".into()));
        };
        let result = async {
            stream.write_all(&frame).await?;
            stream.flush().await
        }
        .await;
        match result {
            Ok(()) => {
                debug!(bytes = frame.len(), "frame sent");
                Ok(())
            }
            Err(e) => {
                // A broken stream is useless; force a reconnect next cycle.
                self.stream = None;
                Err(BeaconError::Network(format!("send failed: {e}")))
            }
        }
    }

    async fn disconnect(&mut self) -> Result<(), BeaconError> {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
        }
        Ok(())
    }
}

pub struct UdpTransport {
    host: String,
    port: u16,
    socket: Option<UdpSocket>,
}

impl UdpTransport {
    pub fn new(host: String, port: u16) -> Self {
        UdpTransport {
            host,
            port,
            socket: None,
        }
    }
}

impl Transport for UdpTransport {
    async fn connect(&mut self) -> Result<(), BeaconError> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket
            .connect((self.host.as_str(), self.port))
            .await
            .map_err(|e| {
                BeaconError::Network(format!("resolve {}:{}: {e}", self.host, self.port))
            })?;
        info!(host = %self.host, port = self.port, "UDP socket ready");
        self.socket = Some(socket);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.socket.is_some()
    }

    async fn send(&mut self, frame: Bytes) -> Result<(), BeaconError> {
        let Some(socket) = self.socket.as_ref() else {
            return Err(BeaconError::Network("socket not ready".into()));
        };
        let sent = socket
            .send(&frame)
            .await
            .map_err(|e| BeaconError::Network(format!("send failed: {e}")))?;
        if sent != frame.len() {
            return Err(BeaconError::Network(format!(
                "short datagram: {sent} of {} bytes",
                frame.len()
            )));
        }
        debug!(bytes = sent, "datagram sent");
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), BeaconError> {
        self.socket = None;
        Ok(())
    }
}
