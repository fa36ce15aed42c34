//! Byte streams for response bodies.
//!
//! Files are read through `tokio::fs`. Archive entries can only be read
//! synchronously, so they are copied on the blocking pool into one end of an
//! in-memory duplex pipe while the other end is streamed. Dropping the stream
//! closes the pipe; the copy's next write fails and it returns, dropping the
//! archive handle it owned.

use axum::body::Bytes;
use futures::Stream;
use std::io::{self, Write};
use std::pin::Pin;
use tokio::io::AsyncRead;
use tokio_util::io::{ReaderStream, SyncIoBridge};

/// Stream of file bytes, as served in a response body.
pub type ByteStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

const CHUNK_SIZE: usize = 64 * 1024;

/// Stream everything `reader` yields.
pub fn from_async_reader<R>(reader: R) -> ByteStream
where
    R: AsyncRead + Send + 'static,
{
    Box::pin(ReaderStream::with_capacity(reader, CHUNK_SIZE))
}

/// Run `copy` on the blocking pool and stream everything it writes.
///
/// A failing copy ends the stream early. Must be called from within a Tokio
/// runtime.
pub fn from_blocking_copy<F>(copy: F) -> ByteStream
where
    F: FnOnce(&mut dyn Write) -> io::Result<()> + Send + 'static,
{
    let (writer, reader) = tokio::io::duplex(CHUNK_SIZE);
    let mut bridge = SyncIoBridge::new(writer);

    tokio::task::spawn_blocking(move || {
        let result = copy(&mut bridge).and_then(|()| bridge.shutdown());
        match result {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                tracing::debug!("Stream closed before completion");
            }
            Err(e) => tracing::warn!(error = %e, "Stream aborted"),
        }
    });

    from_async_reader(reader)
}
