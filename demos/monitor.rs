//! Monitor - print every event from a sensor board as a JSON line.
//!
//! This example demonstrates:
//! - Opening a session on a serial device with the builder
//! - Requesting thermal captures on an interval with a cloned stop handle
//! - Consuming events in wire order until the link ends or Ctrl-C
//!
//! # Running
//!
//! ```text
//! cargo run --example monitor -- /dev/ttyUSB0 2000
//! RUST_LOG=sensorlink=debug cargo run --example monitor -- /dev/ttyUSB0
//! ```
//!
//! The optional second argument is the capture interval in milliseconds.
//! Without a port argument the available ports are listed.

use std::time::Duration;

use sensorlink::transport::available_ports;
use sensorlink::{DomainEvent, LinkSession};
use tracing_subscriber::EnvFilter;

/// What woke the monitor loop.
enum Step {
    Event(Option<DomainEvent>),
    Capture,
    Interrupt,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let Some(port) = args.next() else {
        eprintln!("usage: monitor <port> [capture-interval-ms]");
        for name in available_ports() {
            eprintln!("  {}", name);
        }
        return Ok(());
    };
    let interval = args
        .next()
        .map(|ms| ms.parse::<u64>().map(Duration::from_millis))
        .transpose()?;

    let mut session = LinkSession::builder().open(&port).await?;
    let mut ticker = interval.map(tokio::time::interval);
    let stop = session.stop_handle();

    loop {
        let step = tokio::select! {
            event = session.next_event() => Step::Event(event),
            _ = async {
                match ticker.as_mut() {
                    Some(ticker) => ticker.tick().await,
                    None => std::future::pending().await,
                }
            } => Step::Capture,
            _ = tokio::signal::ctrl_c() => Step::Interrupt,
        };

        match step {
            Step::Event(Some(event)) => {
                println!("{}", serde_json::to_string(&event)?);
                if let DomainEvent::LinkError(_) = event {
                    break;
                }
            }
            Step::Event(None) => break,
            Step::Capture => session.request_thermal_capture().await?,
            Step::Interrupt => {
                stop.stop();
                break;
            }
        }
    }

    session.close().await?;
    Ok(())
}
