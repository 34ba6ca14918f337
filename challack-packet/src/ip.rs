//! IPv4 packet construction and parsing

use crate::checksum::internet_checksum;
use bytes::{BufMut, BytesMut};
use std::net::Ipv4Addr;

/// IP protocol numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpProtocol {
    /// ICMP (1)
    ICMP,
    /// TCP (6)
    TCP,
    /// UDP (17)
    UDP,
    /// Custom protocol number
    Custom(u8),
}

impl IpProtocol {
    pub fn to_u8(self) -> u8 {
        match self {
            IpProtocol::ICMP => 1,
            IpProtocol::TCP => 6,
            IpProtocol::UDP => 17,
            IpProtocol::Custom(val) => val,
        }
    }

    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => IpProtocol::ICMP,
            6 => IpProtocol::TCP,
            17 => IpProtocol::UDP,
            val => IpProtocol::Custom(val),
        }
    }
}

/// IP flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IpFlags {
    /// Don't Fragment flag
    pub dont_fragment: bool,
    /// More Fragments flag
    pub more_fragments: bool,
}

impl IpFlags {
    /// No flags set
    pub const NONE: IpFlags = IpFlags {
        dont_fragment: false,
        more_fragments: false,
    };

    /// Convert to the 3-bit wire value (reserved bit always clear)
    pub fn to_u8(self) -> u8 {
        let mut flags = 0u8;
        if self.dont_fragment {
            flags |= 0b010;
        }
        if self.more_fragments {
            flags |= 0b001;
        }
        flags
    }

    pub fn from_u8(value: u8) -> Self {
        IpFlags {
            dont_fragment: (value & 0b010) != 0,
            more_fragments: (value & 0b001) != 0,
        }
    }
}

/// IPv4 packet
#[derive(Debug, Clone)]
pub struct Ipv4Packet {
    /// Internet Header Length in 32-bit words (minimum 5)
    pub ihl: u8,
    /// Type of Service / DSCP
    pub tos: u8,
    /// Total length (header + data) in bytes
    pub total_length: u16,
    pub identification: u16,
    pub flags: IpFlags,
    /// Fragment offset (in 8-byte blocks)
    pub fragment_offset: u16,
    /// Time to Live
    pub ttl: u8,
    pub protocol: IpProtocol,
    /// Header checksum
    pub checksum: u16,
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    /// Options (if IHL > 5)
    pub options: Vec<u8>,
    /// Payload data, bounded by `total_length`
    pub payload: Vec<u8>,
}

impl Ipv4Packet {
    /// Minimum IPv4 header size (without options)
    pub const MIN_HEADER_SIZE: usize = 20;

    /// Maximum IPv4 packet size
    pub const MAX_PACKET_SIZE: usize = 65535;

    /// Default Time to Live for forged packets
    pub const DEFAULT_TTL: u8 = 64;

    /// Create a new IPv4 packet with no options, no flags and TTL 64
    pub fn new(source: Ipv4Addr, destination: Ipv4Addr, protocol: IpProtocol, payload: Vec<u8>) -> Self {
        let total_length = (Self::MIN_HEADER_SIZE + payload.len()) as u16;

        Ipv4Packet {
            ihl: 5,
            tos: 0,
            total_length,
            identification: 0,
            flags: IpFlags::NONE,
            fragment_offset: 0,
            ttl: Self::DEFAULT_TTL,
            protocol,
            checksum: 0,
            source,
            destination,
            options: Vec::new(),
            payload,
        }
    }

    /// Recompute the header checksum over the current header fields
    pub fn calculate_checksum(&mut self) {
        self.checksum = 0;
        self.checksum = internet_checksum(&self.header_bytes());
    }

    fn header_bytes(&self) -> Vec<u8> {
        let mut buffer = BytesMut::with_capacity(Self::MIN_HEADER_SIZE + self.options.len());

        // Version 4 + IHL
        buffer.put_u8((4 << 4) | (self.ihl & 0x0F));
        buffer.put_u8(self.tos);
        buffer.put_u16(self.total_length);
        buffer.put_u16(self.identification);
        buffer.put_u16(((self.flags.to_u8() as u16) << 13) | (self.fragment_offset & 0x1FFF));
        buffer.put_u8(self.ttl);
        buffer.put_u8(self.protocol.to_u8());
        buffer.put_u16(self.checksum);
        buffer.put_slice(&self.source.octets());
        buffer.put_slice(&self.destination.octets());
        buffer.put_slice(&self.options);

        buffer.to_vec()
    }

    /// Serialize with the total length fixed up and a fresh header checksum
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut packet = self.clone();
        packet.ihl = ((Self::MIN_HEADER_SIZE + packet.options.len()) / 4) as u8;
        packet.total_length =
            (Self::MIN_HEADER_SIZE + packet.options.len() + packet.payload.len()) as u16;
        packet.calculate_checksum();

        let mut buffer = BytesMut::with_capacity(packet.total_length as usize);
        buffer.put_slice(&packet.header_bytes());
        buffer.put_slice(&packet.payload);
        buffer.to_vec()
    }

    /// Parse an IPv4 packet.
    ///
    /// Returns `None` for a version other than 4, a header length below 20
    /// bytes, or input shorter than the advertised header. Bytes beyond
    /// `total_length` (link-layer padding) are dropped from the payload.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < Self::MIN_HEADER_SIZE {
            return None;
        }

        if data[0] >> 4 != 4 {
            return None;
        }
        let ihl = data[0] & 0x0F;
        let header_len = (ihl as usize) * 4;
        if header_len < Self::MIN_HEADER_SIZE || data.len() < header_len {
            return None;
        }

        let total_length = u16::from_be_bytes([data[2], data[3]]);
        let flags_and_offset = u16::from_be_bytes([data[6], data[7]]);

        let end = (total_length as usize).clamp(header_len, data.len());

        Some(Ipv4Packet {
            ihl,
            tos: data[1],
            total_length,
            identification: u16::from_be_bytes([data[4], data[5]]),
            flags: IpFlags::from_u8((flags_and_offset >> 13) as u8),
            fragment_offset: flags_and_offset & 0x1FFF,
            ttl: data[8],
            protocol: IpProtocol::from_u8(data[9]),
            checksum: u16::from_be_bytes([data[10], data[11]]),
            source: Ipv4Addr::new(data[12], data[13], data[14], data[15]),
            destination: Ipv4Addr::new(data[16], data[17], data[18], data[19]),
            options: data[Self::MIN_HEADER_SIZE..header_len].to_vec(),
            payload: data[header_len..end].to_vec(),
        })
    }

    /// Get the header size in bytes
    pub fn header_len(&self) -> usize {
        (self.ihl as usize) * 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::validate_checksum;

    #[test]
    fn test_ip_protocol_conversion() {
        assert_eq!(IpProtocol::TCP.to_u8(), 6);
        assert_eq!(IpProtocol::from_u8(6), IpProtocol::TCP);
        assert_eq!(IpProtocol::from_u8(47), IpProtocol::Custom(47));
    }

    #[test]
    fn test_ip_flags() {
        let df = IpFlags {
            dont_fragment: true,
            more_fragments: false,
        };
        assert_eq!(df.to_u8(), 0b010);
        assert_eq!(IpFlags::from_u8(0b010), df);
        assert_eq!(IpFlags::default(), IpFlags::NONE);
    }

    #[test]
    fn test_ipv4_packet_to_bytes() {
        let src = Ipv4Addr::new(192, 168, 1, 1);
        let dst = Ipv4Addr::new(192, 168, 1, 2);

        let bytes = Ipv4Packet::new(src, dst, IpProtocol::TCP, vec![0x01, 0x02, 0x03, 0x04]).to_bytes();

        assert_eq!(bytes.len(), 24);
        assert_eq!(bytes[0], 0x45);
        assert_eq!(u16::from_be_bytes([bytes[2], bytes[3]]), 24);
        assert_eq!(u16::from_be_bytes([bytes[6], bytes[7]]), 0);
        assert_eq!(bytes[8], 64);
        assert_eq!(bytes[9], 6);
        assert_eq!(&bytes[12..16], &[192, 168, 1, 1]);
        assert_eq!(&bytes[16..20], &[192, 168, 1, 2]);
        assert!(validate_checksum(&bytes[..20]));
        assert_eq!(&bytes[20..24], &[0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_ipv4_from_bytes_strips_trailer() {
        let src = Ipv4Addr::new(10, 0, 0, 1);
        let dst = Ipv4Addr::new(10, 0, 0, 2);
        let mut bytes = Ipv4Packet::new(src, dst, IpProtocol::TCP, vec![0xAB; 4]).to_bytes();
        // Ethernet minimum-size padding
        bytes.extend_from_slice(&[0u8; 6]);

        let packet = Ipv4Packet::from_bytes(&bytes).unwrap();
        assert_eq!(packet.source, src);
        assert_eq!(packet.destination, dst);
        assert_eq!(packet.protocol, IpProtocol::TCP);
        assert_eq!(packet.payload, vec![0xAB; 4]);
    }

    #[test]
    fn test_ipv4_from_bytes_rejects() {
        assert!(Ipv4Packet::from_bytes(&[0x45; 10]).is_none());

        let mut v6 = vec![0u8; 40];
        v6[0] = 0x60;
        assert!(Ipv4Packet::from_bytes(&v6).is_none());

        // IHL claims 24 bytes of header but only 20 are present
        let mut short = vec![0u8; 20];
        short[0] = 0x46;
        assert!(Ipv4Packet::from_bytes(&short).is_none());
    }
}
