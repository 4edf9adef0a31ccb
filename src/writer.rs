//! Dedicated writer task for outbound frames.
//!
//! All writes to the endpoint go through a single task that owns the write
//! half. Callers hand it encoded frames over an mpsc channel and wait for a
//! per-frame completion signal, so a failed write is reported to the caller
//! that issued it while the decode loop keeps sole ownership of the read half.
//! The task shares the session's stop signal: once it is raised, queued frames
//! are dropped unwritten and the write half is shut down.
//!
//! # Architecture
//!
//! ```text
//! send() ─┐
//! send() ─┼─► mpsc::Sender<OutboundFrame> ─► Writer Task ─► Endpoint
//! send() ─┘          ◄── oneshot result ──────┘
//! ```

use bytes::Bytes;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::error::{LinkError, Result};

/// Default channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 32;

/// An encoded frame waiting to be written.
#[derive(Debug)]
struct OutboundFrame {
    /// Complete wire bytes, header to footer.
    bytes: Bytes,
    /// Completion signal back to the sender.
    done: oneshot::Sender<std::io::Result<()>>,
}

/// Handle for sending frames to the writer task.
///
/// This is cheaply cloneable.
#[derive(Clone)]
pub struct WriterHandle {
    tx: mpsc::Sender<OutboundFrame>,
}

impl WriterHandle {
    /// Write an encoded frame and wait until it has been flushed.
    ///
    /// Returns [`LinkError::WriteFailure`] if the endpoint rejected the
    /// write and [`LinkError::ConnectionClosed`] if the writer task is gone or
    /// stopped before writing the frame.
    pub async fn send(&self, bytes: Bytes) -> Result<()> {
        let (done, result) = oneshot::channel();
        self.tx
            .send(OutboundFrame { bytes, done })
            .await
            .map_err(|_| LinkError::ConnectionClosed)?;

        match result.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(LinkError::WriteFailure(e)),
            Err(_) => Err(LinkError::ConnectionClosed),
        }
    }
}

/// Spawn the writer task and return a handle for sending frames.
///
/// The task ends cleanly once stop is raised or every handle is dropped, and
/// with the I/O error of the first failed write otherwise.
pub fn spawn_writer_task<W>(
    writer: W,
    capacity: usize,
    stop: watch::Receiver<bool>,
) -> (WriterHandle, JoinHandle<Result<()>>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let task = tokio::spawn(writer_loop(rx, writer, stop));
    (WriterHandle { tx }, task)
}

/// Resolve once stop is requested or every stop sender is gone.
pub(crate) async fn stopped(stop: &mut watch::Receiver<bool>) {
    let _ = stop.wait_for(|stopped| *stopped).await;
}

/// Main writer loop - receives frames and writes them to the endpoint.
async fn writer_loop<W>(
    mut rx: mpsc::Receiver<OutboundFrame>,
    mut writer: W,
    mut stop: watch::Receiver<bool>,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    loop {
        let frame = tokio::select! {
            biased;
            _ = stopped(&mut stop) => {
                tracing::debug!("Stop requested, closing writer");
                break;
            }
            frame = rx.recv() => match frame {
                Some(frame) => frame,
                None => break,
            },
        };

        let written = tokio::select! {
            biased;
            _ = stopped(&mut stop) => {
                tracing::debug!("Stop requested mid-write, closing writer");
                break;
            }
            written = write_frame(&mut writer, &frame.bytes) => written,
        };

        match written {
            Ok(()) => {
                let _ = frame.done.send(Ok(()));
            }
            Err(e) => {
                tracing::warn!("Write to endpoint failed: {}", e);
                let kind = e.kind();
                let message = e.to_string();
                let _ = frame.done.send(Err(e));
                return Err(LinkError::WriteFailure(std::io::Error::new(kind, message)));
            }
        }
    }

    // Pending senders see ConnectionClosed once their frames are dropped.
    drop(rx);
    let _ = writer.shutdown().await;
    Ok(())
}

async fn write_frame<W>(writer: &mut W, bytes: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(bytes).await?;
    writer.flush().await
}
