//! Captured frames as handed from the capture layer to the controller

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// One raw link-layer frame read off the wire
#[derive(Debug, Clone)]
pub struct Packet {
    /// Capture timestamp
    pub timestamp: SystemTime,
    /// Interface the frame was received on
    pub interface: String,
    /// Frame bytes, starting with the Ethernet header
    pub data: Vec<u8>,
    /// Length on the wire; larger than `data.len()` when the snapshot cut it
    pub len: usize,
}

impl Packet {
    /// A frame stamped with the current time and no truncation
    pub fn new(interface: String, data: Vec<u8>) -> Self {
        let len = data.len();
        Self {
            timestamp: SystemTime::now(),
            interface,
            data,
            len,
        }
    }

    /// A frame as reported by the capture library: seconds and
    /// microseconds since the epoch plus the original wire length.
    pub fn captured(interface: String, data: Vec<u8>, secs: i64, micros: i64, wire_len: u32) -> Self {
        let offset = Duration::from_secs(secs.max(0) as u64)
            + Duration::from_micros(micros.max(0) as u64);
        Self {
            timestamp: UNIX_EPOCH + offset,
            interface,
            data,
            len: wire_len as usize,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True when the snapshot length cut the frame short
    pub fn is_truncated(&self) -> bool {
        self.data.len() < self.len
    }
}
