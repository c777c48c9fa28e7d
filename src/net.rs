//! Channel implementations over std I/O
//!
//! `UdpChannel` is the primary datagram channel: simple, connectionless,
//! fire and forget. `StreamChannel` wraps any writer (a serial port, stdout)
//! as the fallback.

use std::io::{self, Write};
use std::net::UdpSocket;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::NetworkConfig;
use crate::transport::{Channel, PrimaryChannel};

/// UDP telemetry sender
pub struct UdpChannel {
    socket: Option<UdpSocket>,
    server_addr: String,
    bind_addr: String,
    ssid: String,
    link_up: bool,
}

impl UdpChannel {
    pub fn new(server_addr: &str, bind_addr: &str) -> Self {
        Self {
            socket: None,
            server_addr: server_addr.to_string(),
            bind_addr: bind_addr.to_string(),
            ssid: String::new(),
            link_up: false,
        }
    }

    pub fn from_config(config: &NetworkConfig) -> Self {
        Self {
            ssid: config.ssid.clone(),
            ..Self::new(&config.server_addr, &config.bind_addr)
        }
    }

    pub fn server_addr(&self) -> &str {
        &self.server_addr
    }

    fn open(&self, timeout: Duration) -> io::Result<UdpSocket> {
        let socket = UdpSocket::bind(self.bind_addr.as_str())?;
        // A zero timeout is rejected by the OS; treat it as "do not wait"
        let write_timeout = if timeout.is_zero() { None } else { Some(timeout) };
        socket.set_write_timeout(write_timeout)?;
        socket.connect(self.server_addr.as_str())?;
        Ok(socket)
    }
}

impl Channel for UdpChannel {
    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        let Some(socket) = &self.socket else {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "UDP socket not initialised"));
        };
        match socket.send(bytes) {
            Ok(_) => Ok(()),
            Err(error) => {
                // Only a lost route takes the link down. A refused or timed
                // out datagram is dropped like any other best-effort send,
                // since reconnecting a UDP socket would succeed at once.
                if is_link_lost(error.kind()) {
                    self.link_up = false;
                }
                Err(error)
            }
        }
    }
}

fn is_link_lost(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::NetworkUnreachable
            | io::ErrorKind::NetworkDown
            | io::ErrorKind::HostUnreachable
            | io::ErrorKind::AddrNotAvailable
    )
}

impl PrimaryChannel for UdpChannel {
    fn is_connected(&self) -> bool {
        self.link_up
    }

    fn connect(&mut self, timeout: Duration) -> bool {
        if self.ssid.is_empty() {
            info!(server = %self.server_addr, "opening UDP channel");
        } else {
            info!(ssid = %self.ssid, server = %self.server_addr, "opening UDP channel");
        }

        match self.open(timeout) {
            Ok(socket) => {
                self.socket = Some(socket);
                self.link_up = true;
                info!(server = %self.server_addr, "UDP channel ready");
                true
            }
            Err(error) => {
                self.socket = None;
                self.link_up = false;
                warn!(%error, server = %self.server_addr, "UDP channel unavailable");
                false
            }
        }
    }
}

/// Writes each message to a byte stream and flushes it
pub struct StreamChannel<W> {
    writer: W,
}

impl<W: Write> StreamChannel<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl StreamChannel<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Channel for StreamChannel<W> {
    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.writer.write_all(bytes)?;
        // The whole line goes out before anything else is written
        self.writer.flush()
    }
}
