//! CLI argument parsing
//!
//! Flow selection flags are fed to the config builder in a fixed order
//! (`--src-ip`, `--dst-ip`, `--host`, `--src-port`, `--dst-port`, `--port`),
//! so `--host` and `--port` only apply when neither of their specific
//! counterparts is given.

use challack_core::Result;
use challack_intercept::InterceptConfig;
use clap::{Parser, Subcommand};
use std::net::Ipv4Addr;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "challack")]
#[command(
    version,
    about = "Reset a TCP flow from off path by provoking a challenge ACK",
    long_about = None
)]
pub struct Cli {
    /// Network interface to capture and inject on
    #[arg(short = 'i', long, value_name = "DEVICE")]
    pub interface: Option<String>,

    /// RST attempts per challenge ACK (0 keeps the default)
    #[arg(short = 'r', long, default_value_t = 3)]
    pub retry: u32,

    /// Source address of the spoofed flow
    #[arg(long, value_name = "IPV4")]
    pub src_ip: Option<Ipv4Addr>,

    /// Destination address of the spoofed flow
    #[arg(long, value_name = "IPV4")]
    pub dst_ip: Option<Ipv4Addr>,

    /// Use one address as both source and destination filter
    #[arg(long, value_name = "IPV4")]
    pub host: Option<Ipv4Addr>,

    /// Source port of the spoofed flow
    #[arg(long, value_name = "PORT", value_parser = clap::value_parser!(u16).range(1..))]
    pub src_port: Option<u16>,

    /// Destination port of the spoofed flow
    #[arg(long, value_name = "PORT", value_parser = clap::value_parser!(u16).range(1..))]
    pub dst_port: Option<u16>,

    /// Use one port as both source and destination filter
    #[arg(long, value_name = "PORT", value_parser = clap::value_parser!(u16).range(1..))]
    pub port: Option<u16>,

    /// Give up waiting for a challenge ACK after this many milliseconds (0 = never)
    #[arg(short = 't', long, value_name = "MS", default_value_t = 0)]
    pub timeout: u64,

    /// Wait this many milliseconds before opening the device
    #[arg(short = 'd', long, value_name = "MS", default_value_t = 0)]
    pub delay: u64,

    /// Verbose output (-v, -vv for increasing verbosity)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List network interfaces usable for capture and injection
    Interfaces {
        /// Include interfaces that are down, loopback or lack a MAC
        #[arg(short, long)]
        all: bool,
    },
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Log level directive implied by `-v`
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    /// Translate the interception flags into a validated configuration
    pub fn to_config(&self) -> Result<InterceptConfig> {
        let mut builder = InterceptConfig::builder(self.interface.clone().unwrap_or_default())
            .retry(self.retry)
            .timeout(Duration::from_millis(self.timeout))
            .delay(Duration::from_millis(self.delay));

        if let Some(ip) = self.src_ip {
            builder = builder.src_host(ip);
        }
        if let Some(ip) = self.dst_ip {
            builder = builder.dst_host(ip);
        }
        if let Some(ip) = self.host {
            builder = builder.host(ip);
        }
        if let Some(port) = self.src_port {
            builder = builder.src_port(port);
        }
        if let Some(port) = self.dst_port {
            builder = builder.dst_port(port);
        }
        if let Some(port) = self.port {
            builder = builder.port(port);
        }

        builder.build()
    }
}
