//! Challenge-ACK interception for challack
//!
//! This crate ties capture, forging and classification together:
//!
//! - `InterceptConfig`: validated, first-wins flow selection plus retry,
//!   timeout and delay
//! - `Interceptor`: runs one SYN / challenge ACK / RST exchange over any
//!   `CaptureOpener`
//!
//! # Example
//!
//! ```no_run
//! use std::net::Ipv4Addr;
//! use challack_capture::PcapOpener;
//! use challack_intercept::{InterceptConfig, Interceptor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = InterceptConfig::builder("eth0")
//!         .src_host(Ipv4Addr::new(10, 0, 0, 5))
//!         .dst_host(Ipv4Addr::new(10, 0, 0, 9))
//!         .src_port(51000)
//!         .dst_port(22)
//!         .build()?;
//!
//!     let report = Interceptor::new(config, PcapOpener::new()).intercept().await?;
//!     println!("{}", report);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod interceptor;

pub use config::{InterceptConfig, InterceptConfigBuilder, DEFAULT_RETRY};
pub use interceptor::{InterceptReport, Interceptor};
