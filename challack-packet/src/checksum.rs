//! Internet checksum (RFC 1071) and the TCP pseudo-header variant

use std::net::Ipv4Addr;

/// Adds `data` as big-endian 16-bit words into a running 32-bit sum.
///
/// An odd trailing byte is padded with a zero low byte.
fn accumulate(mut sum: u32, data: &[u8]) -> u32 {
    let mut chunks = data.chunks_exact(2);
    for chunk in &mut chunks {
        sum += u16::from_be_bytes([chunk[0], chunk[1]]) as u32;
    }
    if let Some(&byte) = chunks.remainder().first() {
        sum += (byte as u32) << 8;
    }
    sum
}

/// Folds carries back into the low 16 bits and takes the one's complement
fn finish(mut sum: u32) -> u16 {
    while (sum >> 16) != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    !(sum as u16)
}

/// Calculates the Internet Checksum over `data`.
///
/// Used for the IPv4 header checksum.
///
/// # Examples
///
/// ```
/// use challack_packet::checksum::internet_checksum;
///
/// assert_eq!(internet_checksum(&[]), 0xFFFF);
/// ```
pub fn internet_checksum(data: &[u8]) -> u16 {
    finish(accumulate(0, data))
}

/// Calculates a transport checksum over the IPv4 pseudo-header followed by
/// `segment` (the transport header with a zeroed checksum field, plus payload).
///
/// The pseudo-header is source address, destination address, a zero byte,
/// the protocol number and the segment length.
pub fn transport_checksum(src_ip: Ipv4Addr, dst_ip: Ipv4Addr, protocol: u8, segment: &[u8]) -> u16 {
    let mut sum = accumulate(0, &src_ip.octets());
    sum = accumulate(sum, &dst_ip.octets());
    sum += protocol as u32;
    sum += segment.len() as u32;
    finish(accumulate(sum, segment))
}

/// Returns true when `data`, checksum field included, sums to zero
pub fn validate_checksum(data: &[u8]) -> bool {
    let result = internet_checksum(data);
    result == 0 || result == 0xFFFF
}

/// Returns true when a transport segment's embedded checksum is correct for
/// the given pseudo-header addresses
pub fn validate_transport_checksum(
    src_ip: Ipv4Addr,
    dst_ip: Ipv4Addr,
    protocol: u8,
    segment: &[u8],
) -> bool {
    let result = transport_checksum(src_ip, dst_ip, protocol, segment);
    result == 0 || result == 0xFFFF
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internet_checksum_empty() {
        assert_eq!(internet_checksum(&[]), 0xFFFF);
    }

    #[test]
    fn test_internet_checksum_rfc1071_sample() {
        // RFC 1071 section 3: the folded sum of these words is 0xddf2
        let data = [0x00, 0x01, 0xf2, 0x03, 0xf4, 0xf5, 0xf6, 0xf7];
        assert_eq!(internet_checksum(&data), !0xddf2);
    }

    #[test]
    fn test_internet_checksum_odd_length() {
        // 0x0001 + 0x0200 = 0x0201
        assert_eq!(internet_checksum(&[0x00, 0x01, 0x02]), !0x0201);
    }

    #[test]
    fn test_known_ipv4_header() {
        // Classic example header with checksum 0xb861
        let header = [
            0x45, 0x00, 0x00, 0x73, 0x00, 0x00, 0x40, 0x00, 0x40, 0x11, 0x00, 0x00, 0xc0, 0xa8,
            0x00, 0x01, 0xc0, 0xa8, 0x00, 0xc7,
        ];
        assert_eq!(internet_checksum(&header), 0xb861);

        let mut with_sum = header;
        with_sum[10] = 0xb8;
        with_sum[11] = 0x61;
        assert!(validate_checksum(&with_sum));
    }

    #[test]
    fn test_transport_checksum_validates() {
        let src = Ipv4Addr::new(192, 168, 1, 1);
        let dst = Ipv4Addr::new(192, 168, 1, 2);
        // Minimal TCP header, checksum field zeroed
        let mut segment = vec![
            0x30, 0x39, 0x00, 0x50, 0x00, 0x00, 0x27, 0x10, 0x00, 0x00, 0x00, 0x00, 0x50, 0x02,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        let sum = transport_checksum(src, dst, 6, &segment);
        segment[16..18].copy_from_slice(&sum.to_be_bytes());

        assert!(validate_transport_checksum(src, dst, 6, &segment));
        // Wrong pseudo-header address must not validate
        assert!(!validate_transport_checksum(
            Ipv4Addr::new(192, 168, 1, 3),
            dst,
            6,
            &segment
        ));
    }
}
