//! Async adapters over blocking `std::io` handles.
//!
//! Serial drivers only offer blocking reads and writes with a timeout. These
//! adapters move the handle into `spawn_blocking` for each operation and take
//! it back when the operation finishes, the same way `tokio::fs::File` does.
//! All in-flight state lives in the adapter, so dropping a pending `read()`
//! future (e.g. on a `tokio::time::timeout`) loses no data.

use std::future::Future;
use std::io::{self, Read, Write};
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::task::JoinHandle;

/// Default size of a single blocking read.
pub const DEFAULT_READ_CHUNK: usize = 256;

enum ReadState<R> {
    Idle(R, Vec<u8>),
    Busy(JoinHandle<(R, Vec<u8>, io::Result<usize>)>),
    Closed,
}

/// [`AsyncRead`] over a blocking reader with a read timeout.
///
/// `TimedOut` errors from the inner reader mean "nothing yet" and are retried;
/// `Ok(0)` is passed on as end of stream.
pub struct BlockingReader<R> {
    state: ReadState<R>,
    /// Bytes read but not yet handed to the caller.
    pending: BytesMut,
}

impl<R: Read + Send + Unpin + 'static> BlockingReader<R> {
    /// Wrap a blocking reader.
    pub fn new(inner: R) -> Self {
        Self::with_chunk_size(inner, DEFAULT_READ_CHUNK)
    }

    /// Wrap a blocking reader, reading at most `chunk_size` bytes per call.
    pub fn with_chunk_size(inner: R, chunk_size: usize) -> Self {
        Self {
            state: ReadState::Idle(inner, vec![0u8; chunk_size.max(1)]),
            pending: BytesMut::new(),
        }
    }
}

impl<R: Read + Send + Unpin + 'static> AsyncRead for BlockingReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        loop {
            if !this.pending.is_empty() {
                let n = buf.remaining().min(this.pending.len());
                buf.put_slice(&this.pending.split_to(n));
                return Poll::Ready(Ok(()));
            }

            match std::mem::replace(&mut this.state, ReadState::Closed) {
                ReadState::Idle(mut inner, mut scratch) => {
                    this.state = ReadState::Busy(tokio::task::spawn_blocking(move || {
                        let result = inner.read(&mut scratch);
                        (inner, scratch, result)
                    }));
                }
                ReadState::Busy(mut handle) => match Pin::new(&mut handle).poll(cx) {
                    Poll::Pending => {
                        this.state = ReadState::Busy(handle);
                        return Poll::Pending;
                    }
                    Poll::Ready(Err(e)) => return Poll::Ready(Err(io::Error::from(e))),
                    Poll::Ready(Ok((inner, scratch, result))) => match result {
                        Ok(0) => {
                            this.state = ReadState::Idle(inner, scratch);
                            return Poll::Ready(Ok(()));
                        }
                        Ok(n) => {
                            this.pending.extend_from_slice(&scratch[..n]);
                            this.state = ReadState::Idle(inner, scratch);
                        }
                        Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                            this.state = ReadState::Idle(inner, scratch);
                        }
                        Err(e) => {
                            this.state = ReadState::Idle(inner, scratch);
                            return Poll::Ready(Err(e));
                        }
                    },
                },
                ReadState::Closed => return Poll::Ready(Err(closed())),
            }
        }
    }
}

enum WriteState<W> {
    Idle(W),
    Busy(JoinHandle<(W, io::Result<()>)>),
    Closed,
}

/// [`AsyncWrite`] over a blocking writer.
///
/// Each `poll_write` hands a copy of the buffer to a blocking task and reports
/// it as written; the outcome is reported by the next write or flush.
pub struct BlockingWriter<W> {
    state: WriteState<W>,
}

impl<W: Write + Send + Unpin + 'static> BlockingWriter<W> {
    /// Wrap a blocking writer.
    pub fn new(inner: W) -> Self {
        Self {
            state: WriteState::Idle(inner),
        }
    }

    /// Drive an in-flight write to completion.
    fn poll_complete(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match std::mem::replace(&mut self.state, WriteState::Closed) {
            WriteState::Idle(inner) => {
                self.state = WriteState::Idle(inner);
                Poll::Ready(Ok(()))
            }
            WriteState::Busy(mut handle) => match Pin::new(&mut handle).poll(cx) {
                Poll::Pending => {
                    self.state = WriteState::Busy(handle);
                    Poll::Pending
                }
                Poll::Ready(Ok((inner, result))) => {
                    self.state = WriteState::Idle(inner);
                    Poll::Ready(result)
                }
                Poll::Ready(Err(e)) => Poll::Ready(Err(io::Error::from(e))),
            },
            WriteState::Closed => Poll::Ready(Err(closed())),
        }
    }
}

impl<W: Write + Send + Unpin + 'static> AsyncWrite for BlockingWriter<W> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        ready!(this.poll_complete(cx))?;

        let WriteState::Idle(mut inner) = std::mem::replace(&mut this.state, WriteState::Closed)
        else {
            return Poll::Ready(Err(closed()));
        };

        let data = buf.to_vec();
        this.state = WriteState::Busy(tokio::task::spawn_blocking(move || {
            let result = inner.write_all(&data).and_then(|_| inner.flush());
            (inner, result)
        }));
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.get_mut().poll_complete(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.get_mut().poll_complete(cx)
    }
}

fn closed() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "endpoint handle lost")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    /// Reader replaying a script of results, like a serial port with a timeout.
    struct ScriptedReader {
        script: VecDeque<io::Result<Vec<u8>>>,
    }

    impl Read for ScriptedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.script.pop_front() {
                Some(Ok(data)) => {
                    buf[..data.len()].copy_from_slice(&data);
                    Ok(data.len())
                }
                Some(Err(e)) => Err(e),
                None => Ok(0),
            }
        }
    }

    #[derive(Clone, Default)]
    struct SharedSink {
        written: Arc<Mutex<Vec<u8>>>,
        fail: bool,
    }

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.fail {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"));
            }
            self.written.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn timed_out() -> io::Result<Vec<u8>> {
        Err(io::Error::new(io::ErrorKind::TimedOut, "no data"))
    }

    #[tokio::test]
    async fn test_reader_skips_timeouts() {
        let reader = ScriptedReader {
            script: VecDeque::from(vec![timed_out(), Ok(vec![1, 2, 3]), timed_out(), Ok(vec![4])]),
        };
        let mut reader = BlockingReader::new(reader);

        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_reader_keeps_leftover_for_small_buffers() {
        let reader = ScriptedReader {
            script: VecDeque::from(vec![Ok(vec![1, 2, 3, 4, 5])]),
        };
        let mut reader = BlockingReader::new(reader);

        let mut buf = [0u8; 2];
        assert_eq!(reader.read(&mut buf).await.unwrap(), 2);
        assert_eq!(buf, [1, 2]);
        assert_eq!(reader.read(&mut buf).await.unwrap(), 2);
        assert_eq!(buf, [3, 4]);
        assert_eq!(reader.read(&mut buf).await.unwrap(), 1);
        assert_eq!(buf[0], 5);
        assert_eq!(reader.read(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reader_passes_errors() {
        let reader = ScriptedReader {
            script: VecDeque::from(vec![Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "gone",
            ))]),
        };
        let mut reader = BlockingReader::new(reader);

        let mut buf = [0u8; 8];
        let err = reader.read(&mut buf).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[tokio::test]
    async fn test_writer_writes_and_flushes() {
        let sink = SharedSink::default();
        let mut writer = BlockingWriter::new(sink.clone());

        writer.write_all(&[0xA5, 0x10]).await.unwrap();
        writer.write_all(&[0x00, 0xB5, 0x5A]).await.unwrap();
        writer.flush().await.unwrap();

        assert_eq!(*sink.written.lock().unwrap(), vec![0xA5, 0x10, 0x00, 0xB5, 0x5A]);
    }

    #[tokio::test]
    async fn test_writer_reports_failure_on_flush() {
        let sink = SharedSink {
            fail: true,
            ..Default::default()
        };
        let mut writer = BlockingWriter::new(sink);

        writer.write_all(&[0xA5]).await.unwrap();
        let err = writer.flush().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
