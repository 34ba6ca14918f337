//! Live capture and injection on a pcap device
//!
//! A [`LiveCapture`] owns three things for one device: a filtered pcap reader
//! running on its own thread, an unfiltered pcap handle used to inject
//! link-layer frames, and a raw IPv4 socket for datagrams the host routes.

use pcap::{Active, Capture, Device};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, error, info};
use challack_core::{Error, Packet, Result};

use crate::filters::CaptureFilter;
use crate::handle::{CaptureHandle, CaptureOpener, FrameStream};

/// Default snapshot length (maximum bytes per packet)
const DEFAULT_SNAPLEN: i32 = 65535;

/// Default read timeout in milliseconds. Bounds how long closing waits for
/// the reader thread.
const DEFAULT_TIMEOUT_MS: i32 = 100;

/// Configuration for packet capture
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Maximum bytes to capture per packet
    pub snaplen: i32,
    /// Read timeout in milliseconds
    pub timeout_ms: i32,
    /// Enable promiscuous mode
    pub promiscuous: bool,
    /// Enable immediate mode (deliver packets immediately)
    pub immediate_mode: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            snaplen: DEFAULT_SNAPLEN,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            promiscuous: true,
            immediate_mode: true,
        }
    }
}

/// Opens [`LiveCapture`] handles through libpcap
#[derive(Debug, Clone, Default)]
pub struct PcapOpener {
    config: CaptureConfig,
}

impl PcapOpener {
    pub fn new() -> Self {
        Self::default()
    }

    fn lookup(&self, device: &str) -> Result<Device> {
        let devices = Device::list().map_err(|e| Error::DeviceOpenFailed {
            device: device.to_string(),
            reason: e.to_string(),
        })?;

        devices
            .into_iter()
            .find(|d| d.name == device)
            .ok_or_else(|| Error::DeviceNotFound(device.to_string()))
    }

    fn open_reader(&self, device: Device, filter: &CaptureFilter) -> Result<Capture<Active>> {
        let name = device.name.clone();
        let open_failed = |e: pcap::Error| Error::DeviceOpenFailed {
            device: name.clone(),
            reason: e.to_string(),
        };

        let mut capture = Capture::from_device(device)
            .map_err(open_failed)?
            .promisc(self.config.promiscuous)
            .snaplen(self.config.snaplen)
            .timeout(self.config.timeout_ms)
            .immediate_mode(self.config.immediate_mode)
            .open()
            .map_err(open_failed)?;

        let expression = filter.expression();
        capture
            .filter(&expression, true)
            .map_err(|e| Error::FilterInstallFailed {
                filter: expression.clone(),
                reason: e.to_string(),
            })?;
        debug!("Applied filter: {}", expression);

        Ok(capture)
    }

    fn open_injector(&self, device: Device) -> Result<Capture<Active>> {
        let name = device.name.clone();
        Capture::from_device(device)
            .and_then(|c| c.snaplen(self.config.snaplen).open())
            .map_err(|e| Error::DeviceOpenFailed {
                device: name,
                reason: e.to_string(),
            })
    }

    fn open_raw_socket(device: &str) -> Result<Socket> {
        let open_failed = |e: std::io::Error| Error::DeviceOpenFailed {
            device: device.to_string(),
            reason: format!("raw socket: {}", e),
        };

        let socket = Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::TCP)).map_err(open_failed)?;
        socket.set_header_included(true).map_err(open_failed)?;
        Ok(socket)
    }
}

impl CaptureOpener for PcapOpener {
    type Handle = LiveCapture;

    fn open(&self, device: &str, filter: &CaptureFilter) -> Result<LiveCapture> {
        if !filter.has_criteria() {
            return Err(Error::config(
                "no filter criteria: at least one host or port must be selected",
            ));
        }

        let found = self.lookup(device)?;
        let reader = self.open_reader(found.clone(), filter)?;
        let injector = self.open_injector(found)?;
        let socket = Self::open_raw_socket(device)?;

        info!("Capture opened on {} with filter '{}'", device, filter);
        Ok(LiveCapture::start(device, reader, injector, socket))
    }
}

/// An open device with its reader thread running
pub struct LiveCapture {
    interface: String,
    injector: Capture<Active>,
    socket: Socket,
    frames: Option<FrameStream>,
    stop: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl LiveCapture {
    fn start(
        interface: &str,
        reader: Capture<Active>,
        injector: Capture<Active>,
        socket: Socket,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let stop = Arc::new(AtomicBool::new(false));

        let thread_stop = Arc::clone(&stop);
        let thread_interface = interface.to_string();
        let handle = thread::spawn(move || read_loop(reader, thread_interface, tx, thread_stop));

        Self {
            interface: interface.to_string(),
            injector,
            socket,
            frames: Some(rx),
            stop,
            reader: Some(handle),
        }
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.reader.take() {
            if handle.join().is_err() {
                error!("Capture thread on {} panicked", self.interface);
            }
            info!("Capture closed on {}", self.interface);
        }
    }
}

fn read_loop(
    mut capture: Capture<Active>,
    interface: String,
    tx: UnboundedSender<Packet>,
    stop: Arc<AtomicBool>,
) {
    while !stop.load(Ordering::SeqCst) {
        match capture.next_packet() {
            Ok(packet) => {
                let frame = Packet::captured(
                    interface.clone(),
                    packet.data.to_vec(),
                    packet.header.ts.tv_sec as i64,
                    packet.header.ts.tv_usec as i64,
                    packet.header.len,
                );
                if tx.send(frame).is_err() {
                    // Receiver dropped: nobody is listening anymore
                    break;
                }
            }
            Err(pcap::Error::TimeoutExpired) => continue,
            Err(e) => {
                error!("Packet capture error on {}: {}", interface, e);
                break;
            }
        }
    }
    debug!("Capture thread on {} finished", interface);
}

/// Destination of a header-included IPv4 datagram
fn datagram_destination(datagram: &[u8]) -> Result<SockAddr> {
    if datagram.len() < 20 {
        return Err(Error::construction(format!(
            "datagram of {} bytes has no IPv4 header",
            datagram.len()
        )));
    }
    let dst = Ipv4Addr::new(datagram[16], datagram[17], datagram[18], datagram[19]);
    Ok(SocketAddr::new(IpAddr::V4(dst), 0).into())
}

impl CaptureHandle for LiveCapture {
    fn frames(&mut self) -> Result<FrameStream> {
        self.frames
            .take()
            .ok_or_else(|| Error::Capture("frame stream already taken".to_string()))
    }

    fn send_datagram(&mut self, datagram: &[u8]) -> Result<()> {
        let target = datagram_destination(datagram)?;
        let written = self.socket.send_to(datagram, &target)?;
        if written != datagram.len() {
            return Err(Error::Capture(format!(
                "short datagram write: {} of {} bytes",
                written,
                datagram.len()
            )));
        }
        Ok(())
    }

    fn send_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.injector
            .sendpacket(frame)
            .map_err(|e| Error::Capture(format!("inject on {}: {}", self.interface, e)))
    }

    fn close(mut self) {
        self.shutdown();
    }
}

impl Drop for LiveCapture {
    fn drop(&mut self) {
        self.shutdown();
    }
}
