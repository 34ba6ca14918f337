//! TCP segment construction and parsing

use crate::checksum::transport_checksum;
use crate::ip::IpProtocol;
use bytes::{BufMut, BytesMut};
use std::fmt;
use std::net::Ipv4Addr;

/// TCP control flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TcpFlags {
    /// FIN - No more data from sender
    pub fin: bool,
    /// SYN - Synchronize sequence numbers
    pub syn: bool,
    /// RST - Reset the connection
    pub rst: bool,
    /// PSH - Push function
    pub psh: bool,
    /// ACK - Acknowledgment field is significant
    pub ack: bool,
    /// URG - Urgent pointer field is significant
    pub urg: bool,
    /// ECE - ECN-Echo
    pub ece: bool,
    /// CWR - Congestion Window Reduced
    pub cwr: bool,
}

impl TcpFlags {
    pub const NONE: TcpFlags = TcpFlags::from_u8(0);
    pub const SYN: TcpFlags = TcpFlags::from_u8(0x02);
    pub const RST: TcpFlags = TcpFlags::from_u8(0x04);
    pub const ACK: TcpFlags = TcpFlags::from_u8(0x10);
    pub const FIN_ACK: TcpFlags = TcpFlags::from_u8(0x11);
    pub const RST_ACK: TcpFlags = TcpFlags::from_u8(0x14);

    /// Convert flags to the wire byte
    pub fn to_u8(self) -> u8 {
        (self.fin as u8)
            | (self.syn as u8) << 1
            | (self.rst as u8) << 2
            | (self.psh as u8) << 3
            | (self.ack as u8) << 4
            | (self.urg as u8) << 5
            | (self.ece as u8) << 6
            | (self.cwr as u8) << 7
    }

    /// Parse flags from the wire byte
    pub const fn from_u8(value: u8) -> Self {
        TcpFlags {
            fin: (value & 0x01) != 0,
            syn: (value & 0x02) != 0,
            rst: (value & 0x04) != 0,
            psh: (value & 0x08) != 0,
            ack: (value & 0x10) != 0,
            urg: (value & 0x20) != 0,
            ece: (value & 0x40) != 0,
            cwr: (value & 0x80) != 0,
        }
    }

    /// True when the segment opens, closes or aborts a connection
    pub fn is_control(self) -> bool {
        self.syn || self.fin || self.rst
    }
}

impl fmt::Display for TcpFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (self.syn, "SYN"),
            (self.fin, "FIN"),
            (self.rst, "RST"),
            (self.psh, "PSH"),
            (self.ack, "ACK"),
            (self.urg, "URG"),
            (self.ece, "ECE"),
            (self.cwr, "CWR"),
        ];
        let set: Vec<&str> = names.iter().filter(|(on, _)| *on).map(|(_, n)| *n).collect();
        if set.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", set.join("|"))
        }
    }
}

/// TCP segment
#[derive(Debug, Clone)]
pub struct TcpSegment {
    pub source_port: u16,
    pub destination_port: u16,
    pub sequence_number: u32,
    pub acknowledgment_number: u32,
    /// Data offset in 32-bit words (minimum 5)
    pub data_offset: u8,
    pub flags: TcpFlags,
    /// Receive window
    pub window_size: u16,
    pub checksum: u16,
    pub urgent_pointer: u16,
    /// Options (if data_offset > 5)
    pub options: Vec<u8>,
    pub payload: Vec<u8>,
}

impl TcpSegment {
    /// Minimum TCP header size (without options)
    pub const MIN_HEADER_SIZE: usize = 20;

    /// Create a new segment with no options and a zero checksum
    pub fn new(
        source_port: u16,
        destination_port: u16,
        sequence_number: u32,
        acknowledgment_number: u32,
        flags: TcpFlags,
        window_size: u16,
        payload: Vec<u8>,
    ) -> Self {
        TcpSegment {
            source_port,
            destination_port,
            sequence_number,
            acknowledgment_number,
            data_offset: 5,
            flags,
            window_size,
            checksum: 0,
            urgent_pointer: 0,
            options: Vec::new(),
            payload,
        }
    }

    /// Calculate and set the checksum over the IPv4 pseudo-header
    pub fn calculate_checksum(&mut self, src_ip: Ipv4Addr, dst_ip: Ipv4Addr) {
        self.checksum = 0;
        let data = self.to_bytes();
        self.checksum = transport_checksum(src_ip, dst_ip, IpProtocol::TCP.to_u8(), &data);
    }

    /// Serialize header, options and payload as they currently stand
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer =
            BytesMut::with_capacity(Self::MIN_HEADER_SIZE + self.options.len() + self.payload.len());

        buffer.put_u16(self.source_port);
        buffer.put_u16(self.destination_port);
        buffer.put_u32(self.sequence_number);
        buffer.put_u32(self.acknowledgment_number);
        // Data offset (4 bits) + reserved
        buffer.put_u8(self.data_offset << 4);
        buffer.put_u8(self.flags.to_u8());
        buffer.put_u16(self.window_size);
        buffer.put_u16(self.checksum);
        buffer.put_u16(self.urgent_pointer);
        buffer.put_slice(&self.options);
        buffer.put_slice(&self.payload);

        buffer.to_vec()
    }

    /// Parse a TCP segment; `None` if the header is truncated or the data
    /// offset is below 5
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < Self::MIN_HEADER_SIZE {
            return None;
        }

        let data_offset = data[12] >> 4;
        let header_len = (data_offset as usize) * 4;
        if header_len < Self::MIN_HEADER_SIZE || data.len() < header_len {
            return None;
        }

        Some(TcpSegment {
            source_port: u16::from_be_bytes([data[0], data[1]]),
            destination_port: u16::from_be_bytes([data[2], data[3]]),
            sequence_number: u32::from_be_bytes([data[4], data[5], data[6], data[7]]),
            acknowledgment_number: u32::from_be_bytes([data[8], data[9], data[10], data[11]]),
            data_offset,
            flags: TcpFlags::from_u8(data[13]),
            window_size: u16::from_be_bytes([data[14], data[15]]),
            checksum: u16::from_be_bytes([data[16], data[17]]),
            urgent_pointer: u16::from_be_bytes([data[18], data[19]]),
            options: data[Self::MIN_HEADER_SIZE..header_len].to_vec(),
            payload: data[header_len..].to_vec(),
        })
    }

    /// Get the header size in bytes
    pub fn header_len(&self) -> usize {
        (self.data_offset as usize) * 4
    }
}
