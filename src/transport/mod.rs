//! Transport Layer
//!
//! Responsibilities:
//! - Establish lowest-level connections (dial, listen, accept)
//! - Move raw bytes over them
//! - NO encryption, NO framing, NO retries
//!
//! Every transport is reached through the [`Conn`] capability set. A conn
//! plays one role: an unbound factory, a connected stream, or a listener.
//! Dial, listen and accept always hand back a new conn.

mod tcp;

pub use tcp::TcpConn;

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use crate::common::{Error, Result};
use crate::config::TcpConfig;

/// Future returned by [`Conn::dial`]
pub type DialFuture<'a> = Pin<Box<dyn Future<Output = Result<Box<dyn Conn>>> + Send + 'a>>;

/// Capability set shared by all transports
#[async_trait]
pub trait Conn: Send + Sync {
    /// Constant transport identifier, e.g. "tcp"
    fn name(&self) -> &'static str;

    /// Read available bytes. `Ok(0)` means end of stream.
    async fn read(&self, buf: &mut [u8]) -> Result<usize>;

    /// Write some of `buf`, returning how many bytes were accepted
    async fn write(&self, buf: &[u8]) -> Result<usize>;

    /// Release the underlying handle and abort any in-flight dial
    fn close(&self) -> Result<()>;

    /// Human-readable descriptor, computed once
    fn info(&self) -> &str;

    /// Connect to `dst` and return a new connected conn.
    ///
    /// Not an `async fn`: implementations register for abort by `close()`
    /// before returning, so a close between this call and the first poll
    /// still cancels the dial.
    fn dial<'a>(&'a self, dst: &'a str) -> DialFuture<'a>;

    /// Bind `addr` and return a new listening conn
    async fn listen(&self, addr: &str) -> Result<Box<dyn Conn>>;

    /// Wait for one inbound connection on a listening conn
    async fn accept(&self) -> Result<Box<dyn Conn>>;

    /// Write the whole buffer
    async fn write_all(&self, mut buf: &[u8]) -> Result<()> {
        while !buf.is_empty() {
            match self.write(buf).await? {
                0 => {
                    return Err(Error::Io(std::io::Error::new(
                        std::io::ErrorKind::WriteZero,
                        "failed to write whole buffer",
                    )))
                }
                n => buf = &buf[n..],
            }
        }
        Ok(())
    }

    /// Fill the whole buffer, failing on early end of stream
    async fn read_exact(&self, mut buf: &mut [u8]) -> Result<()> {
        while !buf.is_empty() {
            match self.read(buf).await? {
                0 => {
                    return Err(Error::Io(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "failed to fill whole buffer",
                    )))
                }
                n => {
                    let rest = std::mem::take(&mut buf);
                    buf = &mut rest[n..];
                }
            }
        }
        Ok(())
    }
}

/// Build an unbound factory for the named transport
pub fn by_name(name: &str, config: TcpConfig) -> Result<Box<dyn Conn>> {
    match name {
        "tcp" => Ok(Box::new(TcpConn::with_config(config))),
        other => Err(Error::Unsupported(format!("transport {:?}", other))),
    }
}
