//! Streaming adapters between the upstream body and the downstream response.
//!
//! ```text
//! upstream Incoming
//!     → ChunkedStream (re-slice into chunks of at most `chunk_size` bytes)
//!     → MeteredStream (count bytes, log completion, failure or early drop)
//!     → Body::from_stream
//! ```
//!
//! Neither adapter buffers more than the single frame the upstream handed
//! over. An upstream error is passed through as a stream error, which makes
//! the server abort the downstream response instead of ending it cleanly.

use std::fmt::Display;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use axum::body::Bytes;
use futures_util::{Stream, StreamExt};

use crate::observability::metrics;

/// Re-slices a byte stream so no chunk exceeds `chunk_size` bytes.
///
/// Bytes are never copied, reordered or dropped; empty frames are skipped.
pub struct ChunkedStream<S> {
    inner: S,
    pending: Bytes,
    chunk_size: usize,
}

impl<S> ChunkedStream<S> {
    /// A `chunk_size` of zero is treated as one.
    pub fn new(inner: S, chunk_size: usize) -> Self {
        Self {
            inner,
            pending: Bytes::new(),
            chunk_size: chunk_size.max(1),
        }
    }
}

impl<S, E> Stream for ChunkedStream<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    type Item = Result<Bytes, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        loop {
            if !this.pending.is_empty() {
                let n = this.pending.len().min(this.chunk_size);
                return Poll::Ready(Some(Ok(this.pending.split_to(n))));
            }

            match ready!(this.inner.poll_next_unpin(cx)) {
                Some(Ok(frame)) => this.pending = frame,
                Some(Err(e)) => return Poll::Ready(Some(Err(e))),
                None => return Poll::Ready(None),
            }
        }
    }
}

/// Tracks one relayed body from first byte to completion or abandonment.
///
/// Dropping it before the end (client went away) drops the upstream body
/// with it, which releases the upstream connection.
pub struct MeteredStream<S> {
    inner: S,
    request_id: String,
    bytes: u64,
    finished: bool,
}

impl<S> MeteredStream<S> {
    pub fn new(inner: S, request_id: impl Into<String>) -> Self {
        Self {
            inner,
            request_id: request_id.into(),
            bytes: 0,
            finished: false,
        }
    }
}

impl<S, E> Stream for MeteredStream<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Display,
{
    type Item = Result<Bytes, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        if this.finished {
            return Poll::Ready(None);
        }

        let item = ready!(this.inner.poll_next_unpin(cx));
        match &item {
            Some(Ok(chunk)) => this.bytes += chunk.len() as u64,
            Some(Err(e)) => {
                this.finished = true;
                tracing::warn!(
                    request_id = %this.request_id,
                    bytes = this.bytes,
                    error = %e,
                    "Upstream body failed mid-stream, aborting response"
                );
                metrics::record_upstream_error("stream");
                metrics::record_bytes_streamed(this.bytes);
            }
            None => {
                this.finished = true;
                tracing::debug!(
                    request_id = %this.request_id,
                    bytes = this.bytes,
                    "Relay stream complete"
                );
                metrics::record_bytes_streamed(this.bytes);
            }
        }
        Poll::Ready(item)
    }
}

impl<S> Drop for MeteredStream<S> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::info!(
                request_id = %self.request_id,
                bytes = self.bytes,
                "Downstream closed before relay completed, releasing upstream"
            );
            metrics::record_bytes_streamed(self.bytes);
        }
    }
}
