//! Layered packet builder
//!
//! Assembles a packet bottom-up from the transport layer: TCP is serialized
//! with its pseudo-header checksum, wrapped in IPv4 (lengths and header
//! checksum fixed up), and optionally wrapped in an Ethernet II frame.

use crate::ethernet::{EtherType, EthernetFrame};
use crate::ip::{IpProtocol, Ipv4Packet};
use crate::tcp::{TcpFlags, TcpSegment};
use challack_core::{Error, MacAddr, Result};
use std::net::Ipv4Addr;

#[derive(Debug, Clone, Copy)]
struct Link {
    src: MacAddr,
    dst: MacAddr,
}

#[derive(Debug, Clone, Copy)]
struct Network {
    src: Ipv4Addr,
    dst: Ipv4Addr,
}

#[derive(Debug, Clone, Copy)]
struct Transport {
    src_port: u16,
    dst_port: u16,
    seq: u32,
    ack: u32,
    flags: TcpFlags,
    window: u16,
}

/// Packet builder with a fluent API
///
/// # Examples
///
/// ```
/// use std::net::Ipv4Addr;
/// use challack_packet::PacketBuilder;
/// use challack_packet::tcp::TcpFlags;
///
/// let datagram = PacketBuilder::new()
///     .ipv4(Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2))
///     .tcp(40000, 22, 10000, 0, TcpFlags::SYN)
///     .build()
///     .unwrap();
/// assert_eq!(datagram.len(), 40);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PacketBuilder {
    link: Option<Link>,
    network: Option<Network>,
    transport: Option<Transport>,
    payload: Vec<u8>,
}

impl PacketBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an Ethernet II layer carrying IPv4
    pub fn ethernet(mut self, src: MacAddr, dst: MacAddr) -> Self {
        self.link = Some(Link { src, dst });
        self
    }

    /// Add an IPv4 layer with TTL 64
    pub fn ipv4(mut self, src: Ipv4Addr, dst: Ipv4Addr) -> Self {
        self.network = Some(Network { src, dst });
        self
    }

    /// Add a TCP layer with a zero receive window
    pub fn tcp(mut self, src_port: u16, dst_port: u16, seq: u32, ack: u32, flags: TcpFlags) -> Self {
        self.transport = Some(Transport {
            src_port,
            dst_port,
            seq,
            ack,
            flags,
            window: 0,
        });
        self
    }

    /// Set the TCP window. Must be called after `tcp()`.
    pub fn window(mut self, new_window: u16) -> Self {
        if let Some(transport) = self.transport.as_mut() {
            transport.window = new_window;
        }
        self
    }

    pub fn payload(mut self, data: Vec<u8>) -> Self {
        self.payload = data;
        self
    }

    /// Build the packet from all configured layers.
    ///
    /// # Errors
    ///
    /// `PacketConstruction` when TCP is configured without IPv4, when no
    /// header layer is configured at all, or when the result would exceed
    /// the IPv4 maximum packet size.
    pub fn build(self) -> Result<Vec<u8>> {
        let mut data = self.payload;

        if let Some(t) = self.transport {
            let network = self
                .network
                .ok_or_else(|| Error::construction("TCP layer requires an IPv4 layer"))?;

            let mut segment = TcpSegment::new(
                t.src_port, t.dst_port, t.seq, t.ack, t.flags, t.window, data,
            );
            segment.calculate_checksum(network.src, network.dst);
            data = segment.to_bytes();
        }

        if let Some(n) = self.network {
            if Ipv4Packet::MIN_HEADER_SIZE + data.len() > Ipv4Packet::MAX_PACKET_SIZE {
                return Err(Error::construction(format!(
                    "IPv4 payload of {} bytes exceeds the maximum packet size",
                    data.len()
                )));
            }

            let protocol = match self.transport {
                Some(_) => IpProtocol::TCP,
                None => IpProtocol::Custom(0),
            };
            data = Ipv4Packet::new(n.src, n.dst, protocol, data).to_bytes();
        }

        match self.link {
            Some(link) => {
                let ethertype = if self.network.is_some() {
                    EtherType::IPv4
                } else {
                    EtherType::Custom(0)
                };
                Ok(EthernetFrame::new(link.dst, link.src, ethertype, data).to_bytes())
            }
            None if self.network.is_some() => Ok(data),
            None => Err(Error::construction("no header layer configured")),
        }
    }
}
