//! Common types used throughout challack

use std::fmt;
use std::net::Ipv4Addr;

/// MAC Address (6 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    /// Get bytes as slice
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

/// One direction of a TCP flow.
///
/// Addresses are optional because a run may filter on ports only; the forge
/// refuses to build a packet while either address is unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FourTuple {
    pub src_ip: Option<Ipv4Addr>,
    pub dst_ip: Option<Ipv4Addr>,
    pub src_port: u16,
    pub dst_port: u16,
}

impl FourTuple {
    pub fn new(src_ip: Ipv4Addr, dst_ip: Ipv4Addr, src_port: u16, dst_port: u16) -> Self {
        Self {
            src_ip: Some(src_ip),
            dst_ip: Some(dst_ip),
            src_port,
            dst_port,
        }
    }

    /// The same flow seen from the other endpoint
    pub fn reversed(&self) -> Self {
        Self {
            src_ip: self.dst_ip,
            dst_ip: self.src_ip,
            src_port: self.dst_port,
            dst_port: self.src_port,
        }
    }
}

impl fmt::Display for FourTuple {
    /// tcpdump-like rendering, e.g. `IP 10.0.0.1.443 > 10.0.0.2.51000: `
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn addr(ip: &Option<Ipv4Addr>) -> String {
            ip.map(|ip| ip.to_string()).unwrap_or_else(|| "*".to_string())
        }

        write!(
            f,
            "IP {}.{} > {}.{}: ",
            addr(&self.src_ip),
            self.src_port,
            addr(&self.dst_ip),
            self.dst_port
        )
    }
}

/// Ethertype constants
pub mod ethertypes {
    pub const IPV4: u16 = 0x0800;
    pub const ARP: u16 = 0x0806;
    pub const DOT1Q: u16 = 0x8100;
    pub const IPV6: u16 = 0x86DD;
}
