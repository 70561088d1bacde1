//! Consumer loop: the single worker that drains the ring into the sink.
//!
//! # States
//!
//! ```text
//!          notify.wait()               read() == 0
//! WAITING ──────────────▶ DRAINING ─────────────────▶ WAITING
//!                           │  ▲
//!                           └──┘ read() > 0 → sink.pop(bytes)
//! ```
//!
//! # Rules
//!
//! - `notify.wait()` is the only blocking point of the worker.
//! - The sink runs on the worker, outside the output lock. A sink that
//!   blocks stalls every future drain.
//! - Shutdown is a cleared running flag plus one final wake; the worker
//!   drains what is left and returns.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::config::poll_buf_len;
use crate::context::FifoContext;
use crate::platform::{Notify, Platform};

/// Destination for drained bytes.
///
/// Called only from the consumer worker, with whatever contiguous run of
/// bytes one read produced. Message boundaries are not preserved.
pub trait Sink: Send + 'static {
    fn pop(&mut self, bytes: &[u8]);
}

impl<F> Sink for F
where
    F: FnMut(&[u8]) + Send + 'static,
{
    #[inline]
    fn pop(&mut self, bytes: &[u8]) {
        self(bytes)
    }
}

/// Consumer worker state.
pub struct Consumer<P: Platform, const N: usize, const M: usize> {
    ctx: Arc<FifoContext<P, N, M>>,
    sink: Box<dyn Sink>,
    scratch: Box<[u8]>,
}

impl<P: Platform, const N: usize, const M: usize> Consumer<P, N, M> {
    /// Create a consumer with a scratch buffer of `N - POLL_BUF_MARGIN` bytes.
    pub fn new(ctx: Arc<FifoContext<P, N, M>>, sink: Box<dyn Sink>) -> Self {
        Self {
            ctx,
            sink,
            scratch: vec![0u8; poll_buf_len(N)].into_boxed_slice(),
        }
    }

    /// Drain the ring to empty. Returns the number of bytes delivered.
    pub fn drain(&mut self) -> usize {
        let mut total = 0;
        loop {
            let sink = &mut self.sink;
            let n = self.ctx.drain_once(&mut self.scratch, |bytes| sink.pop(bytes));
            if n == 0 {
                break;
            }
            total += n;
        }
        total
    }

    /// Worker body: wait, drain, repeat until shutdown.
    pub fn run(mut self) {
        debug!("consumer started");
        while self.ctx.is_running() {
            self.ctx.notify().wait();
            let delivered = self.drain();
            trace!(delivered, "drained");
        }
        // Shutdown may land before the first wait; nothing buffered is lost.
        self.drain();
        debug!("consumer stopped");
    }
}
