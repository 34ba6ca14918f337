//! challack core library
//!
//! Shared error handling and value types for the challack workspace:
//! the crate-wide [`Error`], MAC addresses, the TCP [`FourTuple`] and the
//! captured [`Packet`].

pub mod error;
pub mod packet;
pub mod types;

// Re-export commonly used types
pub use error::{Error, Result};
pub use packet::Packet;
pub use types::*;
