//! Packet construction and decoding for challack
//!
//! Wire-exact Ethernet II, IPv4 and TCP handling, limited to what a
//! challenge-ACK interception needs:
//!
//! - [`builder`] - layered builder that fixes lengths and checksums
//! - [`forge`] - the spoofed SYN and RST packets
//! - [`classify`] - Ethernet/IPv4/TCP recognition of captured frames
//! - [`ethernet`], [`ip`], [`tcp`] - individual layers
//! - [`checksum`] - RFC 1071 checksums
//!
//! # Example
//!
//! ```rust
//! use std::net::Ipv4Addr;
//! use challack_core::{FourTuple, MacAddr};
//! use challack_packet::{build_rst, decode};
//!
//! let tuple = FourTuple::new(Ipv4Addr::new(10, 0, 0, 5), Ipv4Addr::new(10, 0, 0, 9), 51000, 22);
//! let src = MacAddr([0x02, 0, 0, 0, 0, 0x0a]);
//! let dst = MacAddr([0x02, 0, 0, 0, 0, 0x0b]);
//!
//! let frame = build_rst(&tuple, src, dst, 55555).unwrap();
//! let decoded = decode(&frame).unwrap();
//! assert!(decoded.transport.flags.rst);
//! ```

pub mod builder;
pub mod checksum;
pub mod classify;
pub mod ethernet;
pub mod forge;
pub mod ip;
pub mod tcp;

pub use builder::PacketBuilder;
pub use checksum::{internet_checksum, transport_checksum};
pub use classify::{decode, DecodedFrame};
pub use ethernet::{EtherType, EthernetFrame};
pub use forge::{build_rst, build_syn, sequence_guess, INITIAL_SEQUENCE};
pub use ip::{IpProtocol, Ipv4Packet};
pub use tcp::{TcpFlags, TcpSegment};
