//! Layer recognition for captured frames
//!
//! A frame is accepted only when it carries Ethernet II (optionally 802.1Q
//! tagged), then an unfragmented IPv4 datagram, then a complete TCP header.
//! Anything else is `PacketMalformed`; no partial decode is ever returned.
//! Flow matching is left to the capture filter.

use crate::ethernet::{EtherType, EthernetFrame};
use crate::ip::{IpProtocol, Ipv4Packet};
use crate::tcp::TcpSegment;
use challack_core::{Error, FourTuple, Result};

/// Size of one 802.1Q tag (TCI + inner ethertype)
const VLAN_TAG_SIZE: usize = 4;

/// The three layer views of one captured frame
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    /// Outer Ethernet header; `ethertype` and `payload` describe what follows
    /// the last VLAN tag
    pub link: EthernetFrame,
    /// VLAN IDs in the order the tags appear, outermost first
    pub vlans: Vec<u16>,
    pub network: Ipv4Packet,
    pub transport: TcpSegment,
}

impl DecodedFrame {
    /// The flow direction this frame travelled in
    pub fn tuple(&self) -> FourTuple {
        FourTuple::new(
            self.network.source,
            self.network.destination,
            self.transport.source_port,
            self.transport.destination_port,
        )
    }
}

/// Decode a raw captured frame into link, network and transport views.
pub fn decode(frame: &[u8]) -> Result<DecodedFrame> {
    let mut link = EthernetFrame::from_bytes(frame)
        .ok_or_else(|| Error::malformed(format!("no link layer in {} byte frame", frame.len())))?;

    let mut vlans = Vec::new();
    while link.ethertype == EtherType::VLAN {
        if link.payload.len() < VLAN_TAG_SIZE {
            return Err(Error::malformed("truncated 802.1Q tag"));
        }
        let tci = u16::from_be_bytes([link.payload[0], link.payload[1]]);
        vlans.push(tci & 0x0FFF);
        link.ethertype = EtherType::from_u16(u16::from_be_bytes([link.payload[2], link.payload[3]]));
        link.payload.drain(..VLAN_TAG_SIZE);
    }

    if link.ethertype != EtherType::IPv4 {
        return Err(Error::malformed(format!(
            "not an IPv4 frame (ethertype {})",
            link.ethertype
        )));
    }

    let network = Ipv4Packet::from_bytes(&link.payload)
        .ok_or_else(|| Error::malformed("not ip layer"))?;

    if network.protocol != IpProtocol::TCP {
        return Err(Error::malformed(format!(
            "not tcp layer (protocol {})",
            network.protocol.to_u8()
        )));
    }
    if network.fragment_offset != 0 || network.flags.more_fragments {
        return Err(Error::malformed("not tcp layer (fragmented datagram)"));
    }

    let transport =
        TcpSegment::from_bytes(&network.payload).ok_or_else(|| Error::malformed("not tcp layer"))?;

    Ok(DecodedFrame {
        link,
        vlans,
        network,
        transport,
    })
}
