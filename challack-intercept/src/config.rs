//! Validated interception parameters
//!
//! Built through [`InterceptConfigBuilder`]. Each tuple field accepts its
//! first assignment only; later assignments of the same field are dropped,
//! together with the filter clause they would have added.

use challack_capture::{filters, CaptureFilter};
use challack_core::{Error, FourTuple, Result};
use std::net::Ipv4Addr;
use std::time::Duration;
use tracing::debug;

/// RST attempts per challenge ACK when none is configured
pub const DEFAULT_RETRY: u32 = 3;

/// Everything one interception needs, checked at construction
#[derive(Debug, Clone)]
pub struct InterceptConfig {
    device: String,
    filter: CaptureFilter,
    tuple: FourTuple,
    retry: u32,
    timeout: Option<Duration>,
    delay: Option<Duration>,
}

impl InterceptConfig {
    /// Start building a configuration for `device`
    pub fn builder(device: impl Into<String>) -> InterceptConfigBuilder {
        InterceptConfigBuilder::new(device)
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn filter(&self) -> &CaptureFilter {
        &self.filter
    }

    /// The spoofed flow as seen from the forged SYN's sender
    pub fn tuple(&self) -> &FourTuple {
        &self.tuple
    }

    pub fn retry(&self) -> u32 {
        self.retry
    }

    /// Overall bound on the wait for a challenge ACK; `None` waits forever
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Pause before the device is opened
    pub fn delay(&self) -> Option<Duration> {
        self.delay
    }
}

/// First-wins builder for [`InterceptConfig`]
#[derive(Debug, Clone)]
pub struct InterceptConfigBuilder {
    device: String,
    filter: CaptureFilter,
    tuple: FourTuple,
    src_port_set: bool,
    dst_port_set: bool,
    retry: u32,
    timeout: Option<Duration>,
    delay: Option<Duration>,
}

impl InterceptConfigBuilder {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            filter: CaptureFilter::new(),
            tuple: FourTuple::default(),
            src_port_set: false,
            dst_port_set: false,
            retry: DEFAULT_RETRY,
            timeout: None,
            delay: None,
        }
    }

    /// Source address of the spoofed flow (`src host H`)
    pub fn src_host(mut self, ip: Ipv4Addr) -> Self {
        if self.tuple.src_ip.is_none() {
            self.tuple.src_ip = Some(ip);
            self.filter.push(filters::src_ip_filter(ip));
        } else {
            debug!("ignoring src host {}: already set", ip);
        }
        self
    }

    /// Destination address of the spoofed flow (`dst host H`)
    pub fn dst_host(mut self, ip: Ipv4Addr) -> Self {
        if self.tuple.dst_ip.is_none() {
            self.tuple.dst_ip = Some(ip);
            self.filter.push(filters::dst_ip_filter(ip));
        } else {
            debug!("ignoring dst host {}: already set", ip);
        }
        self
    }

    /// Both addresses at once (`host H`); ignored if either is set
    pub fn host(mut self, ip: Ipv4Addr) -> Self {
        if self.tuple.src_ip.is_none() && self.tuple.dst_ip.is_none() {
            self.tuple.src_ip = Some(ip);
            self.tuple.dst_ip = Some(ip);
            self.filter.push(filters::host_filter(ip));
        } else {
            debug!("ignoring host {}: an address is already set", ip);
        }
        self
    }

    /// Source port of the spoofed flow (`src port P`)
    pub fn src_port(mut self, port: u16) -> Self {
        if !self.src_port_set {
            self.src_port_set = true;
            self.tuple.src_port = port;
            self.filter.push(filters::src_port_filter(port));
        } else {
            debug!("ignoring src port {}: already set", port);
        }
        self
    }

    /// Destination port of the spoofed flow (`dst port P`)
    pub fn dst_port(mut self, port: u16) -> Self {
        if !self.dst_port_set {
            self.dst_port_set = true;
            self.tuple.dst_port = port;
            self.filter.push(filters::dst_port_filter(port));
        } else {
            debug!("ignoring dst port {}: already set", port);
        }
        self
    }

    /// Both ports at once (`port P`); ignored if either is set
    pub fn port(mut self, port: u16) -> Self {
        if !self.src_port_set && !self.dst_port_set {
            self.src_port_set = true;
            self.dst_port_set = true;
            self.tuple.src_port = port;
            self.tuple.dst_port = port;
            self.filter.push(filters::port_filter(port));
        } else {
            debug!("ignoring port {}: a port is already set", port);
        }
        self
    }

    /// RST attempts per challenge ACK; 0 keeps [`DEFAULT_RETRY`]
    pub fn retry(mut self, retry: u32) -> Self {
        if retry > 0 {
            self.retry = retry;
        }
        self
    }

    /// Overall wait bound; zero means unbounded
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    /// Pre-open pause; zero means none
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = (!delay.is_zero()).then_some(delay);
        self
    }

    pub fn build(self) -> Result<InterceptConfig> {
        if self.device.trim().is_empty() {
            return Err(Error::config("no capture device given"));
        }
        if !self.filter.has_criteria() {
            return Err(Error::config(
                "no filter criteria: at least one host or port must be selected",
            ));
        }
        if self.src_port_set && self.tuple.src_port == 0 {
            return Err(Error::config("source port must be in 1..=65535"));
        }
        if self.dst_port_set && self.tuple.dst_port == 0 {
            return Err(Error::config("destination port must be in 1..=65535"));
        }

        Ok(InterceptConfig {
            device: self.device,
            filter: self.filter,
            tuple: self.tuple,
            retry: self.retry,
            timeout: self.timeout,
            delay: self.delay,
        })
    }
}
