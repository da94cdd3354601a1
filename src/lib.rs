//! netconn - pluggable connection adapters
//!
//! # Architecture
//!
//! ```text
//! caller
//! → Conn (name / read / write / close / info / dial / listen / accept)
//! → TcpConn (unbound | connected | listening)
//! → tokio TcpStream / TcpListener
//! ```
//!
//! ## Core Principles
//!
//! - Callers only see the `Conn` capability set
//! - A conn's role is fixed when it is created
//! - Dial, listen and accept return new conns
//! - Errors go straight back to the caller: no retries, no hidden recovery
//!
//! ## Module Structure
//!
//! ```text
//! src/
//! ├── common/          # Address, CancelToken
//! ├── transport/       # Conn trait, TCP implementation
//! ├── config.rs        # TcpConfig
//! └── error.rs         # Error, Result
//! ```

// Core types
pub mod common;
pub mod error;

pub mod config;
pub mod transport;

// Re-exports for convenience
pub use common::{Address, CancelToken};
pub use config::TcpConfig;
pub use error::{Error, Result};
pub use transport::{by_name, Conn, TcpConn};
