//! TCP Transport implementation

use std::future::Future;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::sync::Notify;
use tracing::{debug, trace};

use crate::common::{Address, CancelToken, Error, Result};
use crate::config::TcpConfig;

use super::{Conn, DialFuture};

const EMPTY_INFO: &str = "empty tcp conn";

/// Exclusively owned OS handle.
///
/// Operations borrow the handle for their duration. Release takes it out
/// of the slot and fires `closed`, so parked operations drop their borrow
/// and the socket is freed once the last one returns.
struct Handle<T> {
    slot: Mutex<Option<Arc<T>>>,
    closed: CancelToken,
}

impl<T> Handle<T> {
    fn new(inner: T) -> Self {
        Self {
            slot: Mutex::new(Some(Arc::new(inner))),
            closed: CancelToken::new(),
        }
    }

    fn get(&self) -> Result<Arc<T>> {
        self.slot.lock().clone().ok_or(Error::ConnectionClosed)
    }

    fn release(&self) -> Result<()> {
        let taken = self.slot.lock().take().ok_or(Error::ConnectionClosed)?;
        self.closed.cancel();
        drop(taken);
        Ok(())
    }
}

enum Role {
    Unbound,
    Connected {
        local: SocketAddr,
        peer: SocketAddr,
        stream: Handle<TcpStream>,
    },
    Listening {
        local: SocketAddr,
        listener: Handle<TcpListener>,
    },
}

/// TCP conn: an unbound factory, a connected stream, or a listener.
///
/// The role is fixed at construction. `dial`, `listen` and `accept` never
/// change the receiver; they return a new conn.
pub struct TcpConn {
    role: Role,
    config: TcpConfig,
    /// Wakes every dial currently in flight on this conn
    dial_abort: Notify,
    info: OnceLock<String>,
}

impl TcpConn {
    /// Unbound factory with default settings
    pub fn new() -> Self {
        Self::with_config(TcpConfig::default())
    }

    /// Unbound factory whose produced conns inherit `config`
    pub fn with_config(config: TcpConfig) -> Self {
        Self::from_role(Role::Unbound, config)
    }

    fn from_role(role: Role, config: TcpConfig) -> Self {
        Self {
            role,
            config,
            dial_abort: Notify::new(),
            info: OnceLock::new(),
        }
    }

    fn connected(stream: TcpStream, peer: SocketAddr, config: TcpConfig) -> Result<Self> {
        stream.set_nodelay(config.nodelay)?;
        let local = stream.local_addr()?;

        Ok(Self::from_role(
            Role::Connected {
                local,
                peer,
                stream: Handle::new(stream),
            },
            config,
        ))
    }

    /// Local address of a connected or listening conn
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &self.role {
            Role::Unbound => None,
            Role::Connected { local, .. } | Role::Listening { local, .. } => Some(*local),
        }
    }

    /// Remote address of a connected conn
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        match &self.role {
            Role::Connected { peer, .. } => Some(*peer),
            _ => None,
        }
    }

    /// Whether this conn owns an established stream
    pub fn is_connected(&self) -> bool {
        matches!(self.role, Role::Connected { .. })
    }

    /// Whether this conn owns a listener
    pub fn is_listening(&self) -> bool {
        matches!(self.role, Role::Listening { .. })
    }

    fn stream(&self) -> Result<&Handle<TcpStream>> {
        match &self.role {
            Role::Connected { stream, .. } => Ok(stream),
            _ => Err(Error::EmptyConnection),
        }
    }

    /// Connect to `dst`. Aborted by `close()` on this conn.
    pub fn dial<'a>(&'a self, dst: &'a str) -> impl Future<Output = Result<TcpConn>> + Send + 'a {
        self.dial_with_cancel(dst, CancelToken::new())
    }

    /// Connect to `dst`, aborted by either `close()` on this conn or `cancel`.
    ///
    /// The abort registration happens when this is called, not when the
    /// future is first polled.
    pub fn dial_with_cancel<'a>(
        &'a self,
        dst: &'a str,
        cancel: CancelToken,
    ) -> impl Future<Output = Result<TcpConn>> + Send + 'a {
        let aborted = self.dial_abort.notified();

        async move {
            let attempt = async {
                let addr = dst.parse::<Address>()?.resolve().await?;
                trace!("Dialing {} ({})", dst, addr);
                let stream = TcpStream::connect(addr).await.map_err(Error::Dial)?;
                Ok::<_, Error>((stream, addr))
            };

            let (stream, peer) = tokio::select! {
                biased;
                _ = aborted => return Err(Error::Cancelled),
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                result = attempt => result?,
            };

            let conn = TcpConn::connected(stream, peer, self.config.clone())?;
            debug!("Dialed {}", conn.info());
            Ok(conn)
        }
    }

    /// Bind `addr` and start listening
    pub async fn listen(&self, addr: &str) -> Result<TcpConn> {
        let addr = addr.parse::<Address>()?.resolve().await?;

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .map_err(Error::Bind)?;
        // On Windows SO_REUSEADDR lets a second socket bind a port in use.
        #[cfg(not(windows))]
        socket
            .set_reuseaddr(self.config.reuse_address)
            .map_err(Error::Bind)?;
        socket.bind(addr).map_err(Error::Bind)?;
        let listener = socket.listen(self.config.backlog).map_err(Error::Bind)?;
        let local = listener.local_addr()?;

        debug!("Listening on {}", local);

        Ok(Self::from_role(
            Role::Listening {
                local,
                listener: Handle::new(listener),
            },
            self.config.clone(),
        ))
    }

    /// Wait for one inbound connection
    pub async fn accept(&self) -> Result<TcpConn> {
        let handle = match &self.role {
            Role::Listening { listener, .. } => listener,
            _ => return Err(Error::NotListening),
        };
        let listener = handle.get()?;

        let (stream, peer) = tokio::select! {
            biased;
            _ = handle.closed.cancelled() => return Err(Error::ConnectionClosed),
            accepted = listener.accept() => accepted?,
        };

        trace!("Accepted connection from {}", peer);
        TcpConn::connected(stream, peer, self.config.clone())
    }
}

impl Default for TcpConn {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TcpConn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let role = match self.role {
            Role::Unbound => "unbound",
            Role::Connected { .. } => "connected",
            Role::Listening { .. } => "listening",
        };
        f.debug_struct("TcpConn")
            .field("role", &role)
            .field("local", &self.local_addr())
            .field("peer", &self.peer_addr())
            .finish()
    }
}

#[async_trait]
impl Conn for TcpConn {
    fn name(&self) -> &'static str {
        "tcp"
    }

    async fn read(&self, buf: &mut [u8]) -> Result<usize> {
        let handle = self.stream()?;
        let stream = handle.get()?;
        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            tokio::select! {
                biased;
                _ = handle.closed.cancelled() => return Err(Error::ConnectionClosed),
                ready = stream.readable() => ready?,
            }

            match stream.try_read(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == ErrorKind::WouldBlock => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn write(&self, buf: &[u8]) -> Result<usize> {
        let handle = self.stream()?;
        let stream = handle.get()?;
        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            tokio::select! {
                biased;
                _ = handle.closed.cancelled() => return Err(Error::ConnectionClosed),
                ready = stream.writable() => ready?,
            }

            match stream.try_write(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == ErrorKind::WouldBlock => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn close(&self) -> Result<()> {
        self.dial_abort.notify_waiters();

        match &self.role {
            Role::Unbound => Ok(()),
            Role::Connected { stream, .. } => {
                stream.release()?;
                debug!("Closed {}", self.info());
                Ok(())
            }
            Role::Listening { listener, .. } => {
                listener.release()?;
                debug!("Closed {}", self.info());
                Ok(())
            }
        }
    }

    fn info(&self) -> &str {
        self.info.get_or_init(|| match &self.role {
            Role::Unbound => EMPTY_INFO.to_string(),
            Role::Connected { local, peer, .. } => format!("{}<--tcp-->{}", local, peer),
            Role::Listening { local, .. } => format!("tcp--{}", local),
        })
    }

    fn dial<'a>(&'a self, dst: &'a str) -> DialFuture<'a> {
        let dialing = TcpConn::dial(self, dst);
        Box::pin(async move { Ok(Box::new(dialing.await?) as Box<dyn Conn>) })
    }

    async fn listen(&self, addr: &str) -> Result<Box<dyn Conn>> {
        Ok(Box::new(TcpConn::listen(self, addr).await?))
    }

    async fn accept(&self) -> Result<Box<dyn Conn>> {
        Ok(Box::new(TcpConn::accept(self).await?))
    }
}
