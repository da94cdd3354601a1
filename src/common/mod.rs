//! Common types shared by every transport
//!
//! - Address: dial/listen target representation
//! - CancelToken: one-shot cancellation signal
//! - Error: unified error types

mod address;
mod cancel;

pub use address::Address;
pub use cancel::CancelToken;

// Re-export error types from crate root
pub use crate::error::{Error, Result};
