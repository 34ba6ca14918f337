//! BPF (Berkeley Packet Filter) expressions for one TCP flow
//!
//! Clauses use tcpdump syntax and are combined with `" and "`, without
//! parentheses, starting from the mandatory `"tcp"` clause.

use std::fmt;
use std::net::Ipv4Addr;

/// Baseline clause every interception filter starts with
pub fn tcp_filter() -> String {
    "tcp".to_string()
}

/// Filter for specific source IP
pub fn src_ip_filter(ip: Ipv4Addr) -> String {
    format!("src host {}", ip)
}

/// Filter for specific destination IP
pub fn dst_ip_filter(ip: Ipv4Addr) -> String {
    format!("dst host {}", ip)
}

/// Filter for specific source or destination IP
pub fn host_filter(ip: Ipv4Addr) -> String {
    format!("host {}", ip)
}

/// Filter for specific source port
pub fn src_port_filter(port: u16) -> String {
    format!("src port {}", port)
}

/// Filter for specific destination port
pub fn dst_port_filter(port: u16) -> String {
    format!("dst port {}", port)
}

/// Filter for specific port (source or destination)
pub fn port_filter(port: u16) -> String {
    format!("port {}", port)
}

/// Combine clauses with AND logic, exactly as given
pub fn combine_filters(filters: &[String]) -> String {
    filters.join(" and ")
}

/// Ordered set of filter clauses, always starting with `"tcp"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureFilter {
    clauses: Vec<String>,
}

impl CaptureFilter {
    /// A filter holding only the baseline `"tcp"` clause
    pub fn new() -> Self {
        Self {
            clauses: vec![tcp_filter()],
        }
    }

    /// Append a clause; selection order is preserved
    pub fn push(&mut self, clause: String) {
        self.clauses.push(clause);
    }

    pub fn clauses(&self) -> &[String] {
        &self.clauses
    }

    /// True once at least one clause beyond the baseline was selected
    pub fn has_criteria(&self) -> bool {
        self.clauses.len() > 1
    }

    /// The expression handed to the capture library
    pub fn expression(&self) -> String {
        combine_filters(&self.clauses)
    }
}

impl Default for CaptureFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CaptureFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expression())
    }
}
