//! Capture handle abstraction
//!
//! The interception controller only talks to these two traits, so it can
//! run against a live pcap device or an in-memory double.

use crate::filters::CaptureFilter;
use challack_core::{Packet, Result};
use tokio::sync::mpsc::UnboundedReceiver;

/// Lazy, non-restartable stream of captured frames.
///
/// Yields `None` once the underlying source stops producing.
pub type FrameStream = UnboundedReceiver<Packet>;

/// Opens capture handles on a named device.
pub trait CaptureOpener {
    type Handle: CaptureHandle;

    /// Open `device` and install `filter`.
    ///
    /// Fails with `DeviceNotFound`, `DeviceOpenFailed`, `FilterInstallFailed`,
    /// or `ConfigInvalid` when the filter selects nothing beyond `"tcp"`.
    fn open(&self, device: &str, filter: &CaptureFilter) -> Result<Self::Handle>;
}

/// An open device: frames in, raw datagrams and frames out.
///
/// `close` may block while the device winds down, so callers on an async
/// runtime move the handle to a blocking thread to close it.
pub trait CaptureHandle: Send + 'static {
    /// Take the frame stream. Only the first call succeeds.
    fn frames(&mut self) -> Result<FrameStream>;

    /// Write an IPv4 datagram without a link layer; the host routes it.
    fn send_datagram(&mut self, datagram: &[u8]) -> Result<()>;

    /// Inject a complete link-layer frame on the device.
    fn send_frame(&mut self, frame: &[u8]) -> Result<()>;

    /// Release the device. Consumes the handle, so it happens once.
    fn close(self);
}
