// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Controller links.
//
// A link owns one handle to the controller device. A send, reopening
// included, runs inside one write timeout; any failure drops the handle and
// the next send reopens it. Dropping the link releases the handle.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use scanwerk_core::config::ControllerConfig;
use scanwerk_core::error::{Result, ScanwerkError};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// Budget for an explicit [`ControllerLink::reconnect`].
const MIN_OPEN_TIMEOUT: Duration = Duration::from_millis(250);

/// Tokens held while a freshly opened serial device settles.
const HELD_LIMIT: usize = 16;

/// Write access to the controller device.
#[allow(async_fn_in_trait)]
pub trait ControllerLink {
    /// Write one token, reopening the link first if needed. Never takes
    /// longer than the link's write timeout.
    async fn send(&mut self, token: &str) -> bool;

    fn is_connected(&self) -> bool;

    /// Drop any current handle and open a new one.
    async fn reconnect(&mut self) -> bool;
}

/// Outcome of a send that finished inside its budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Sent,
    /// The device is still settling; the token goes out with the next send.
    Held,
}

// -- Serial -------------------------------------------------------------------

/// A serial device opened as a character device.
///
/// Line settings (baud rate, framing) are left to the OS configuration of
/// the device. After each open the link waits out a settle period without
/// blocking: tokens sent meanwhile are held and written ahead of the first
/// send after it.
#[derive(Debug)]
pub struct SerialLink {
    device: PathBuf,
    write_timeout: Duration,
    settle: Duration,
    port: Option<File>,
    ready_at: Option<Instant>,
    held: Vec<String>,
}

impl SerialLink {
    pub fn new(device: impl Into<PathBuf>, config: &ControllerConfig) -> Self {
        Self {
            device: device.into(),
            write_timeout: config.write_timeout(),
            settle: config.settle(),
            port: None,
            ready_at: None,
            held: Vec::new(),
        }
    }

    /// Whether the settle period after the last open has passed.
    pub fn is_settled(&self) -> bool {
        self.ready_at.is_none_or(|at| Instant::now() >= at)
    }

    fn attach(&mut self, port: File) {
        self.ready_at = Some(Instant::now() + self.settle);
        info!(
            device = %self.device.display(),
            settle_ms = self.settle.as_millis() as u64,
            "serial controller connected"
        );
        self.port = Some(port);
    }

    fn detach(&mut self) {
        self.port = None;
        self.ready_at = None;
    }

    async fn deliver(&mut self, token: &str) -> io::Result<Delivery> {
        if self.port.is_none() {
            let port = open_device(&self.device).await?;
            self.attach(port);
        }

        if !self.is_settled() {
            if self.held.len() < HELD_LIMIT {
                self.held.push(token.to_owned());
            }
            return Ok(Delivery::Held);
        }

        let mut payload = self.held.concat();
        payload.push_str(token);
        let Some(port) = self.port.as_mut() else {
            return Err(io::Error::from(io::ErrorKind::NotConnected));
        };
        port.write_all(payload.as_bytes()).await?;
        port.flush().await?;
        self.held.clear();
        Ok(Delivery::Sent)
    }
}

async fn open_device(device: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.append(true);
    options.open(device).await
}

impl ControllerLink for SerialLink {
    async fn send(&mut self, token: &str) -> bool {
        let outcome = tokio::time::timeout(self.write_timeout, self.deliver(token)).await;
        match outcome {
            Ok(Ok(Delivery::Sent)) => {
                debug!(token = token.trim_end(), "sent to serial controller");
                true
            }
            Ok(Ok(Delivery::Held)) => {
                debug!(token = token.trim_end(), "serial controller settling; token held");
                false
            }
            Ok(Err(err)) => {
                warn!(device = %self.device.display(), error = %err, "serial write failed");
                self.detach();
                false
            }
            Err(_) => {
                warn!(device = %self.device.display(), "serial send timed out");
                self.detach();
                false
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }

    async fn reconnect(&mut self) -> bool {
        self.detach();

        let budget = self.write_timeout.max(MIN_OPEN_TIMEOUT);
        match tokio::time::timeout(budget, open_device(&self.device)).await {
            Ok(Ok(port)) => {
                self.attach(port);
                true
            }
            Ok(Err(err)) => {
                warn!(device = %self.device.display(), error = %err, "serial controller unavailable");
                false
            }
            Err(_) => {
                warn!(device = %self.device.display(), "opening serial controller timed out");
                false
            }
        }
    }
}

// -- TCP ----------------------------------------------------------------------

/// A controller reachable over TCP.
#[derive(Debug)]
pub struct TcpLink {
    addr: String,
    write_timeout: Duration,
    stream: Option<TcpStream>,
}

impl TcpLink {
    pub fn new(addr: impl Into<String>, config: &ControllerConfig) -> Self {
        Self {
            addr: addr.into(),
            write_timeout: config.write_timeout(),
            stream: None,
        }
    }

    fn attach(&mut self, stream: TcpStream) {
        if let Err(err) = stream.set_nodelay(true) {
            debug!(error = %err, "could not disable nagle");
        }
        info!(addr = %self.addr, "tcp controller connected");
        self.stream = Some(stream);
    }

    async fn deliver(&mut self, token: &str) -> io::Result<()> {
        if self.stream.is_none() {
            let stream = TcpStream::connect(&self.addr).await?;
            self.attach(stream);
        }
        let Some(stream) = self.stream.as_mut() else {
            return Err(io::Error::from(io::ErrorKind::NotConnected));
        };
        stream.write_all(token.as_bytes()).await?;
        stream.flush().await
    }
}

impl ControllerLink for TcpLink {
    async fn send(&mut self, token: &str) -> bool {
        let outcome = tokio::time::timeout(self.write_timeout, self.deliver(token)).await;
        match outcome {
            Ok(Ok(())) => {
                debug!(token = token.trim_end(), "sent to tcp controller");
                true
            }
            Ok(Err(err)) => {
                warn!(addr = %self.addr, error = %err, "tcp send failed");
                self.stream = None;
                false
            }
            Err(_) => {
                warn!(addr = %self.addr, "tcp send timed out");
                self.stream = None;
                false
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn reconnect(&mut self) -> bool {
        self.stream = None;

        let budget = self.write_timeout.max(MIN_OPEN_TIMEOUT);
        match tokio::time::timeout(budget, TcpStream::connect(&self.addr)).await {
            Ok(Ok(stream)) => {
                self.attach(stream);
                true
            }
            Ok(Err(err)) => {
                warn!(addr = %self.addr, error = %err, "tcp controller unavailable");
                false
            }
            Err(_) => {
                warn!(addr = %self.addr, "tcp controller connect timed out");
                false
            }
        }
    }
}

// -- None ---------------------------------------------------------------------

/// No controller attached. Every send succeeds.
#[derive(Debug, Default)]
pub struct NullLink;

impl ControllerLink for NullLink {
    async fn send(&mut self, token: &str) -> bool {
        debug!(token = token.trim_end(), "no controller attached");
        true
    }

    fn is_connected(&self) -> bool {
        true
    }

    async fn reconnect(&mut self) -> bool {
        true
    }
}

// -- Selection ----------------------------------------------------------------

/// The link chosen by configuration.
#[derive(Debug)]
pub enum AnyLink {
    Serial(SerialLink),
    Tcp(TcpLink),
    Null(NullLink),
}

impl ControllerLink for AnyLink {
    async fn send(&mut self, token: &str) -> bool {
        match self {
            Self::Serial(link) => link.send(token).await,
            Self::Tcp(link) => link.send(token).await,
            Self::Null(link) => link.send(token).await,
        }
    }

    fn is_connected(&self) -> bool {
        match self {
            Self::Serial(link) => link.is_connected(),
            Self::Tcp(link) => link.is_connected(),
            Self::Null(link) => link.is_connected(),
        }
    }

    async fn reconnect(&mut self) -> bool {
        match self {
            Self::Serial(link) => link.reconnect().await,
            Self::Tcp(link) => link.reconnect().await,
            Self::Null(link) => link.reconnect().await,
        }
    }
}

/// Build the link named by `config.link`.
///
/// Accepts `none`, `serial:<device>`, `tcp:<host:port>`, or a bare device
/// path (`/dev/...` or `COMn`).
pub fn link_from_config(config: &ControllerConfig) -> Result<AnyLink> {
    let ident = config.link.trim();

    if ident.is_empty() || ident.eq_ignore_ascii_case("none") {
        return Ok(AnyLink::Null(NullLink));
    }
    if let Some(device) = ident.strip_prefix("serial:") {
        return Ok(AnyLink::Serial(SerialLink::new(device, config)));
    }
    if let Some(addr) = ident.strip_prefix("tcp:") {
        if !addr.contains(':') {
            return Err(ScanwerkError::Config(format!(
                "tcp controller address `{addr}` needs a port"
            )));
        }
        return Ok(AnyLink::Tcp(TcpLink::new(addr, config)));
    }
    if ident.starts_with('/') || ident.to_ascii_uppercase().starts_with("COM") {
        return Ok(AnyLink::Serial(SerialLink::new(ident, config)));
    }

    Err(ScanwerkError::Config(format!(
        "unrecognised controller link `{ident}`"
    )))
}
