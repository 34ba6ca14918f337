//! Example: print frames of one TCP port as they are captured
//!
//! Run with: sudo cargo run --example watch_flow -- eth0 22

use challack_capture::{filters, CaptureFilter, CaptureHandle, CaptureOpener, PcapOpener};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let device = args.next().unwrap_or_else(|| "eth0".to_string());
    let port: u16 = args.next().as_deref().unwrap_or("22").parse()?;

    let mut filter = CaptureFilter::new();
    filter.push(filters::port_filter(port));

    println!("Listening on {} with filter '{}'", device, filter);

    let mut capture = PcapOpener::new().open(&device, &filter)?;
    let mut frames = capture.frames()?;

    for _ in 0..10 {
        match frames.blocking_recv() {
            Some(frame) => println!(
                "{} bytes on the wire, {} captured",
                frame.len(),
                frame.data().len()
            ),
            None => break,
        }
    }

    capture.close();
    Ok(())
}
