//! Session builder and runtime loop.
//!
//! The [`LinkSessionBuilder`] provides a fluent API for configuring and
//! opening a session. The [`LinkSession`] manages the lifecycle:
//! 1. Open the endpoint (or take a ready reader/writer pair)
//! 2. Spawn the writer task for outbound frames
//! 3. Spawn the worker that reads bytes, decodes frames and emits events
//! 4. Stop both tasks on `close()`, a stop handle, or end of stream; the
//!    endpoint is shut down with them
//!
//! # Example
//!
//! ```ignore
//! use sensorlink::{DomainEvent, LinkSession};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = LinkSession::open("/dev/ttyUSB0").await?;
//!     session.request_thermal_capture().await?;
//!
//!     while let Some(event) = session.next_event().await {
//!         if let DomainEvent::ThermalFrame(frame) = event {
//!             println!("max {:.2} °C", frame.max());
//!             break;
//!         }
//!     }
//!
//!     session.close().await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::error::{LinkError, Result};
use crate::event::{interpret_frame, DomainEvent};
use crate::protocol::{commands, encode_frame, FrameDecoder};
use crate::transport::{open_serial, SerialConfig};
use crate::writer::{spawn_writer_task, stopped, WriterHandle, DEFAULT_CHANNEL_CAPACITY};

/// Default time a read may stay silent before a half-read header is dropped.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Default size of the worker's read buffer.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 512;

/// Default number of undelivered events before the worker blocks.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Runtime settings of a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Silence after which a half-read frame header is abandoned.
    pub read_timeout: Duration,
    /// Bytes requested from the endpoint per read.
    pub read_buffer_size: usize,
    /// Capacity of the event channel.
    pub event_capacity: usize,
    /// Capacity of the outbound frame channel.
    pub writer_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            read_timeout: DEFAULT_READ_TIMEOUT,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            writer_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Builder for configuring and opening a [`LinkSession`].
pub struct LinkSessionBuilder {
    config: SessionConfig,
    serial: SerialConfig,
}

impl LinkSessionBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: SessionConfig::default(),
            serial: SerialConfig::default(),
        }
    }

    /// Set the read timeout.
    ///
    /// Default: 1 second
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    /// Set the read buffer size.
    ///
    /// Default: 512 bytes
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.config.read_buffer_size = size;
        self
    }

    /// Set how many events may wait for the consumer.
    ///
    /// When this limit is reached the worker stops reading until the
    /// consumer catches up.
    /// Default: 64
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_capacity = capacity;
        self
    }

    /// Set the outbound frame channel capacity.
    ///
    /// Default: 32
    pub fn writer_capacity(mut self, capacity: usize) -> Self {
        self.config.writer_capacity = capacity;
        self
    }

    /// Set the serial line speed.
    ///
    /// Default: 115200
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.serial.baud_rate = baud_rate;
        self
    }

    /// Replace all serial port settings.
    pub fn serial_config(mut self, serial: SerialConfig) -> Self {
        self.serial = serial;
        self
    }

    /// Open a serial device and start the session on it.
    ///
    /// The device is opened on the blocking thread pool.
    pub async fn open(self, endpoint: &str) -> Result<LinkSession> {
        let path = endpoint.to_string();
        let serial = self.serial.clone();
        let (reader, writer) = tokio::task::spawn_blocking(move || open_serial(&path, &serial))
            .await
            .map_err(std::io::Error::from)??;
        tracing::info!(endpoint, "Link session opened");
        Ok(self.connect(reader, writer))
    }

    /// Start the session over an already open reader/writer pair.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect<R, W>(self, reader: R, writer: W) -> LinkSession
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        LinkSession::start(self.config, reader, writer)
    }
}

impl Default for LinkSessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Requests a session to stop from anywhere.
///
/// This is cheaply cloneable.
#[derive(Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    /// Raise the stop signal.
    ///
    /// The worker ends without emitting further events, queued outbound
    /// frames are dropped and the endpoint is shut down.
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    /// Check if stop has been requested or the worker has ended.
    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }
}

/// A running link session.
///
/// Use `next_event()` to receive decoded events in wire order and `send()`
/// to write frames to the device. When the worker ends, for any reason, it
/// raises the stop signal so the writer closes too. Dropping the session
/// raises the stop signal.
pub struct LinkSession {
    /// Consumer side of the event channel.
    events: Option<mpsc::Receiver<DomainEvent>>,
    /// Writer handle for sending frames.
    writer: WriterHandle,
    /// Stop signal shared with the worker.
    stop: StopHandle,
    /// Worker task handle.
    worker: Option<JoinHandle<Result<()>>>,
    /// Writer task handle.
    writer_task: Option<JoinHandle<Result<()>>>,
}

impl LinkSession {
    /// Create a new session builder.
    pub fn builder() -> LinkSessionBuilder {
        LinkSessionBuilder::new()
    }

    /// Open a serial device with default settings.
    ///
    /// Fails once with [`LinkError::EndpointUnavailable`]; there is no retry.
    pub async fn open(endpoint: &str) -> Result<Self> {
        LinkSessionBuilder::new().open(endpoint).await
    }

    fn start<R, W>(config: SessionConfig, reader: R, writer: W) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (stop_tx, stop_rx) = watch::channel(false);
        let stop = StopHandle {
            tx: Arc::new(stop_tx),
        };
        let (writer, writer_task) =
            spawn_writer_task(writer, config.writer_capacity, stop_rx.clone());
        let (events_tx, events_rx) = mpsc::channel(config.event_capacity.max(1));

        let worker_stop = stop.clone();
        let worker = tokio::spawn(async move {
            let result = read_loop(reader, config, events_tx, stop_rx).await;
            if let Err(e) = &result {
                tracing::error!("Read loop error: {}", e);
            }
            // The link is over; take the writer down with the reader.
            worker_stop.stop();
            result
        });

        LinkSession {
            events: Some(events_rx),
            writer,
            stop,
            worker: Some(worker),
            writer_task: Some(writer_task),
        }
    }

    /// Wait for the next event.
    ///
    /// Returns `None` once the worker has ended and every event has been
    /// delivered, or after [`take_events`](Self::take_events).
    pub async fn next_event(&mut self) -> Option<DomainEvent> {
        match self.events.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }

    /// Take the event receiver to consume events on another task.
    ///
    /// Returns `None` if it was already taken.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<DomainEvent>> {
        self.events.take()
    }

    /// Encode a frame and write it to the device.
    ///
    /// Resolves once the bytes have been flushed. Fails with
    /// [`LinkError::PayloadTooLarge`] before anything is written,
    /// [`LinkError::WriteFailure`] if the endpoint rejected the write, and
    /// [`LinkError::ConnectionClosed`] after an earlier write failure or
    /// once the session has stopped.
    pub async fn send(&self, command: u8, payload: &[u8]) -> Result<()> {
        let bytes = encode_frame(command, payload)?;
        tracing::trace!(command, len = payload.len(), "Sending frame");
        self.writer.send(Bytes::from(bytes)).await
    }

    /// Ask the board for a thermal capture.
    ///
    /// The reply arrives later as [`DomainEvent::ThermalFrame`].
    pub async fn request_thermal_capture(&self) -> Result<()> {
        self.send(commands::THERMAL_CAPTURE, &[]).await
    }

    /// Get a handle that can stop the session from another task.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Check if the worker is still reading.
    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.is_finished())
    }

    /// Stop the worker and the writer and wait for both to end.
    ///
    /// Returns the worker's result: `Ok(())` for a stop or end of stream, the
    /// error that ended it otherwise. A write failure was already reported to
    /// the `send` that hit it. The endpoint is shut down when this returns.
    pub async fn close(mut self) -> Result<()> {
        self.stop.stop();

        let result = match self.worker.take() {
            Some(worker) => worker.await.map_err(std::io::Error::from)?,
            None => Ok(()),
        };
        if let Some(writer_task) = self.writer_task.take() {
            let _ = writer_task.await;
        }
        tracing::info!("Link session closed");
        result
    }
}

impl Drop for LinkSession {
    fn drop(&mut self) {
        self.stop.stop();
    }
}

/// Hand an event to the consumer, giving up if stop is requested first.
///
/// Returns `false` when the event could not be delivered.
async fn deliver(
    events: &mpsc::Sender<DomainEvent>,
    stop: &mut watch::Receiver<bool>,
    event: DomainEvent,
) -> bool {
    tokio::select! {
        biased;
        _ = stopped(stop) => false,
        sent = events.send(event) => sent.is_ok(),
    }
}

/// Main read loop - reads bytes, decodes frames and emits events.
async fn read_loop<R: AsyncRead + Unpin>(
    mut reader: R,
    config: SessionConfig,
    events: mpsc::Sender<DomainEvent>,
    mut stop: watch::Receiver<bool>,
) -> Result<()> {
    let mut decoder = FrameDecoder::new();
    let mut buf = vec![0u8; config.read_buffer_size.max(1)];

    let result = loop {
        let read = tokio::select! {
            biased;
            _ = stopped(&mut stop) => {
                tracing::debug!(mid_frame = decoder.is_mid_frame(), "Stop requested");
                break Ok(());
            }
            read = tokio::time::timeout(config.read_timeout, reader.read(&mut buf)) => read,
        };

        let n = match read {
            Err(_elapsed) => {
                decoder.on_read_timeout();
                continue;
            }
            Ok(Ok(0)) => {
                tracing::info!(mid_frame = decoder.is_mid_frame(), "Endpoint closed");
                break Ok(());
            }
            Ok(Ok(n)) => n,
            Ok(Err(e)) => {
                tracing::warn!("Read from endpoint failed: {}", e);
                deliver(&events, &mut stop, DomainEvent::LinkError(e.to_string())).await;
                break Err(LinkError::Io(e));
            }
        };

        let mut halted = false;
        for frame in decoder.push(&buf[..n]) {
            let event = match interpret_frame(frame) {
                Ok(event) => event,
                Err(e) => {
                    deliver(&events, &mut stop, DomainEvent::LinkError(e.to_string())).await;
                    return Err(e);
                }
            };

            if !deliver(&events, &mut stop, event).await {
                halted = true;
                break;
            }
        }

        if halted {
            tracing::debug!("Event delivery stopped");
            break Ok(());
        }
    };

    let stats = decoder.stats();
    tracing::debug!(
        frames = stats.frames,
        skipped = stats.skipped_bytes,
        discarded = stats.discarded(),
        header_timeouts = stats.header_timeouts,
        "Decoder finished"
    );
    result
}
