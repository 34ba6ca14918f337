//! Network interface enumeration and information

use challack_core::{Error, MacAddr, Result};
use ipnetwork::IpNetwork;
use pnet_datalink::{self, NetworkInterface};
use std::fmt;
use std::net::Ipv4Addr;

/// Information about a network interface
#[derive(Debug, Clone)]
pub struct InterfaceInfo {
    /// Interface name (e.g., "eth0", "wlan0")
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// MAC address if available
    pub mac: Option<MacAddr>,
    /// IPv4 addresses assigned to this interface
    pub ipv4: Vec<Ipv4Addr>,
    pub is_up: bool,
    pub is_loopback: bool,
}

impl From<&NetworkInterface> for InterfaceInfo {
    fn from(iface: &NetworkInterface) -> Self {
        let mac = iface
            .mac
            .map(|mac| MacAddr([mac.0, mac.1, mac.2, mac.3, mac.4, mac.5]));

        let ipv4 = iface
            .ips
            .iter()
            .filter_map(|network| match network {
                IpNetwork::V4(v4) => Some(v4.ip()),
                IpNetwork::V6(_) => None,
            })
            .collect();

        InterfaceInfo {
            name: iface.name.clone(),
            description: iface.description.clone(),
            mac,
            ipv4,
            is_up: iface.is_up(),
            is_loopback: iface.is_loopback(),
        }
    }
}

impl InterfaceInfo {
    /// Up, not loopback, and able to carry Ethernet frames
    pub fn is_capture_capable(&self) -> bool {
        self.is_up && !self.is_loopback && self.mac.is_some()
    }
}

impl fmt::Display for InterfaceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mac = self
            .mac
            .map(|m| m.to_string())
            .unwrap_or_else(|| "-".to_string());
        let ips = self
            .ipv4
            .iter()
            .map(|ip| ip.to_string())
            .collect::<Vec<_>>()
            .join(",");
        write!(
            f,
            "{:<16} {:<17} {:<4} {}",
            self.name,
            mac,
            if self.is_up { "up" } else { "down" },
            if ips.is_empty() { "-" } else { ips.as_str() }
        )
    }
}

/// List all available network interfaces
pub fn list_interfaces() -> Result<Vec<InterfaceInfo>> {
    let interfaces = pnet_datalink::interfaces();

    if interfaces.is_empty() {
        return Err(Error::Capture(
            "No network interfaces found. Are you running with sufficient privileges?".to_string(),
        ));
    }

    Ok(interfaces.iter().map(InterfaceInfo::from).collect())
}

/// List all interfaces suitable for injecting Ethernet frames
pub fn list_capture_interfaces() -> Result<Vec<InterfaceInfo>> {
    Ok(list_interfaces()?
        .into_iter()
        .filter(|iface| iface.is_capture_capable())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_interfaces_has_loopback() {
        let interfaces = list_interfaces().unwrap();
        assert!(interfaces.iter().any(|iface| iface.is_loopback));
    }

    #[test]
    fn test_capture_capable() {
        let mut info = InterfaceInfo {
            name: "eth0".to_string(),
            description: String::new(),
            mac: Some(MacAddr([0x02, 0, 0, 0, 0, 1])),
            ipv4: vec![Ipv4Addr::new(10, 0, 0, 5)],
            is_up: true,
            is_loopback: false,
        };
        assert!(info.is_capture_capable());
        assert!(info.to_string().starts_with("eth0"));
        assert!(info.to_string().ends_with("10.0.0.5"));

        info.is_loopback = true;
        assert!(!info.is_capture_capable());
    }
}
