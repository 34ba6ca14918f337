//! Capture and injection for challack
//!
//! Opens one pcap device per interception, filtered down to a single TCP
//! flow, and exposes it through the [`CaptureOpener`] / [`CaptureHandle`]
//! traits so the controller can be driven by a test double.
//!
//! ## Example
//!
//! ```no_run
//! use challack_capture::{filters, CaptureFilter, CaptureHandle, CaptureOpener, PcapOpener};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut filter = CaptureFilter::new();
//! filter.push(filters::dst_port_filter(22));
//!
//! let mut capture = PcapOpener::new().open("eth0", &filter)?;
//! let mut frames = capture.frames()?;
//! if let Some(frame) = frames.blocking_recv() {
//!     println!("Got frame: {} bytes", frame.len());
//! }
//! capture.close();
//! # Ok(())
//! # }
//! ```

pub mod capture;
pub mod filters;
pub mod handle;
pub mod interface;

// Re-export main types
pub use capture::{CaptureConfig, LiveCapture, PcapOpener};
pub use filters::CaptureFilter;
pub use handle::{CaptureHandle, CaptureOpener, FrameStream};
pub use interface::{list_capture_interfaces, list_interfaces, InterfaceInfo};
