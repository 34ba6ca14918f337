//! Error types for challack

use std::time::Duration;
use thiserror::Error;

/// Result type alias for challack operations
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure an interception can end with
#[derive(Error, Debug)]
pub enum Error {
    /// Network I/O error
    #[error("Network I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration rejected at construction time
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    /// Capture device does not exist or cannot be selected
    #[error("Device '{0}' not found")]
    DeviceNotFound(String),

    /// Privilege or driver failure while opening the device
    #[error("Failed to open device '{device}': {reason}")]
    DeviceOpenFailed { device: String, reason: String },

    /// The composed BPF filter could not be compiled or installed
    #[error("Failed to install filter '{filter}': {reason}")]
    FilterInstallFailed { filter: String, reason: String },

    /// A captured frame lacked a recognizable link, network or transport layer
    #[error("Malformed packet: {0}")]
    PacketMalformed(String),

    /// Layer assembly or checksum computation could not complete
    #[error("Packet construction error: {0}")]
    PacketConstruction(String),

    /// The spoofed SYN could not be built or written
    #[error("Failed to send SYN: {0}")]
    SynSendFailed(String),

    /// Every RST write attempt failed
    #[error("All {attempts} RST attempts failed to send")]
    RstExhausted { attempts: u32 },

    /// No qualifying frame arrived before the overall timeout
    #[error("Intercept deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    /// The frame source failed or ended underneath the interception
    #[error("Packet capture error: {0}")]
    Capture(String),
}

impl Error {
    /// Create a configuration error with a custom message
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::ConfigInvalid(msg.into())
    }

    /// Create a malformed-packet error with a custom message
    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        Error::PacketMalformed(msg.into())
    }

    /// Create a packet construction error with a custom message
    pub fn construction<S: Into<String>>(msg: S) -> Self {
        Error::PacketConstruction(msg.into())
    }

    /// Short stable name of the error kind, used in the fatal diagnostic
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Io(_) => "Io",
            Error::ConfigInvalid(_) => "ConfigInvalid",
            Error::DeviceNotFound(_) => "DeviceNotFound",
            Error::DeviceOpenFailed { .. } => "DeviceOpenFailed",
            Error::FilterInstallFailed { .. } => "FilterInstallFailed",
            Error::PacketMalformed(_) => "PacketMalformed",
            Error::PacketConstruction(_) => "PacketConstruction",
            Error::SynSendFailed(_) => "SynSendFailed",
            Error::RstExhausted { .. } => "RstExhausted",
            Error::DeadlineExceeded(_) => "DeadlineExceeded",
            Error::Capture(_) => "Capture",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::RstExhausted { attempts: 3 };
        assert_eq!(err.to_string(), "All 3 RST attempts failed to send");

        let err = Error::DeviceNotFound("eth9".to_string());
        assert_eq!(err.to_string(), "Device 'eth9' not found");
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(Error::config("no filter").kind(), "ConfigInvalid");
        assert_eq!(Error::malformed("no tcp").kind(), "PacketMalformed");
        assert_eq!(
            Error::DeadlineExceeded(Duration::from_millis(50)).kind(),
            "DeadlineExceeded"
        );
    }
}
