//! Idle detection on the read side of a session
//!
//! Wraps a reader so that any single read which makes no progress for the
//! configured duration fails with `ErrorKind::TimedOut`. Applies to command
//! lines and upload payloads alike.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, ReadBuf};
use tokio::time::{Instant, Sleep, sleep};

/// Reader that errors with `TimedOut` when the peer stalls
#[derive(Debug)]
pub struct IdleTimeout<R> {
    inner: R,
    timeout: Duration,
    deadline: Pin<Box<Sleep>>,
    armed: bool,
}

impl<R> IdleTimeout<R> {
    pub fn new(inner: R, timeout: Duration) -> Self {
        Self {
            inner,
            timeout,
            deadline: Box::pin(sleep(timeout)),
            armed: false,
        }
    }
}

/// Whether an I/O error came from an idle peer
pub fn is_idle_timeout(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::TimedOut
}

impl<R> AsyncRead for IdleTimeout<R>
where
    R: AsyncRead + Unpin,
{
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = &mut *self;

        match Pin::new(&mut this.inner).poll_read(cx, buf) {
            Poll::Ready(result) => {
                this.armed = false;
                Poll::Ready(result)
            }
            Poll::Pending => {
                if !this.armed {
                    this.deadline.as_mut().reset(Instant::now() + this.timeout);
                    this.armed = true;
                }

                match this.deadline.as_mut().poll(cx) {
                    Poll::Ready(()) => {
                        this.armed = false;
                        Poll::Ready(Err(io::Error::new(
                            io::ErrorKind::TimedOut,
                            format!("no data from peer for {:?}", this.timeout),
                        )))
                    }
                    Poll::Pending => Poll::Pending,
                }
            }
        }
    }
}
