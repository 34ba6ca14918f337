//! Ethernet II frame construction and parsing

use bytes::{BufMut, BytesMut};
use challack_core::{ethertypes, MacAddr};
use std::fmt;

/// EtherType values this tool needs to tell apart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtherType {
    /// IPv4 (0x0800)
    IPv4,
    /// ARP (0x0806)
    ARP,
    /// VLAN-tagged frame (0x8100)
    VLAN,
    /// IPv6 (0x86DD)
    IPv6,
    /// 802.3 length field (value <= 1500), not an EtherType
    Length(u16),
    /// Any other EtherType
    Custom(u16),
}

impl EtherType {
    /// Convert EtherType to its wire value
    pub fn to_u16(self) -> u16 {
        match self {
            EtherType::IPv4 => ethertypes::IPV4,
            EtherType::ARP => ethertypes::ARP,
            EtherType::VLAN => ethertypes::DOT1Q,
            EtherType::IPv6 => ethertypes::IPV6,
            EtherType::Length(len) => len,
            EtherType::Custom(val) => val,
        }
    }

    /// Create EtherType from its wire value
    pub fn from_u16(value: u16) -> Self {
        match value {
            ethertypes::IPV4 => EtherType::IPv4,
            ethertypes::ARP => EtherType::ARP,
            ethertypes::DOT1Q => EtherType::VLAN,
            ethertypes::IPV6 => EtherType::IPv6,
            len if len <= 1500 => EtherType::Length(len),
            val => EtherType::Custom(val),
        }
    }
}

impl fmt::Display for EtherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EtherType::IPv4 => write!(f, "IPv4"),
            EtherType::ARP => write!(f, "ARP"),
            EtherType::VLAN => write!(f, "VLAN"),
            EtherType::IPv6 => write!(f, "IPv6"),
            EtherType::Length(len) => write!(f, "802.3 length {}", len),
            EtherType::Custom(val) => write!(f, "0x{:04X}", val),
        }
    }
}

/// Ethernet II frame
#[derive(Debug, Clone)]
pub struct EthernetFrame {
    /// Destination MAC address
    pub destination: MacAddr,
    /// Source MAC address
    pub source: MacAddr,
    /// EtherType
    pub ethertype: EtherType,
    /// Payload data (may include trailer padding when parsed)
    pub payload: Vec<u8>,
}

impl EthernetFrame {
    /// Minimum Ethernet frame size (without FCS)
    pub const MIN_FRAME_SIZE: usize = 60;

    /// Ethernet header size (dst + src + type)
    pub const HEADER_SIZE: usize = 14;

    pub fn new(destination: MacAddr, source: MacAddr, ethertype: EtherType, payload: Vec<u8>) -> Self {
        EthernetFrame {
            destination,
            source,
            ethertype,
            payload,
        }
    }

    /// Serialize the frame, zero-padding it to the 60 byte minimum
    pub fn to_bytes(&self) -> Vec<u8> {
        let len = (Self::HEADER_SIZE + self.payload.len()).max(Self::MIN_FRAME_SIZE);
        let mut buffer = BytesMut::with_capacity(len);

        buffer.put_slice(self.destination.as_bytes());
        buffer.put_slice(self.source.as_bytes());
        buffer.put_u16(self.ethertype.to_u16());
        buffer.put_slice(&self.payload);

        if buffer.len() < Self::MIN_FRAME_SIZE {
            buffer.put_bytes(0, Self::MIN_FRAME_SIZE - buffer.len());
        }

        buffer.to_vec()
    }

    /// Parse an Ethernet II frame; `None` if shorter than the header
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < Self::HEADER_SIZE {
            return None;
        }

        let mut destination = [0u8; 6];
        destination.copy_from_slice(&data[0..6]);
        let mut source = [0u8; 6];
        source.copy_from_slice(&data[6..12]);
        let ethertype = EtherType::from_u16(u16::from_be_bytes([data[12], data[13]]));

        Some(EthernetFrame {
            destination: MacAddr(destination),
            source: MacAddr(source),
            ethertype,
            payload: data[Self::HEADER_SIZE..].to_vec(),
        })
    }

    /// Get the serialized frame size in bytes
    pub fn len(&self) -> usize {
        (Self::HEADER_SIZE + self.payload.len()).max(Self::MIN_FRAME_SIZE)
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}
