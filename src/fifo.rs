//! Lifecycle controller.
//!
//! # States
//!
//! ```text
//!                init()          start()
//! UNINITIALIZED ───────▶ INITIALIZED ───────▶ STARTED
//!       ▲                     │    ◀─────────   │
//!       │                     │      stop()     │
//!       └──── deinit() ───────┴─────────────────┘
//! ```
//!
//! `init` is idempotent. `start`, `stop` and `deinit` before `init` do
//! nothing. Dropping a [`Fifo`] runs `deinit`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::{WorkerConfig, MAX_MSG_LEN, OUTPUT_BUF_SIZE, VERSION};
use crate::consumer::{Consumer, Sink};
use crate::context::FifoContext;
use crate::error::Result;
use crate::platform::{DefaultPlatform, Platform, WorkerHandle};

/// Observable lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Initialized,
    Started,
    Stopped,
}

/// Asynchronous log transport.
///
/// `N` is the ring capacity, `M` the maximum rendered message size, both in
/// bytes. `P` supplies the lock, wake signal and worker.
///
/// # Example
///
/// ```ignore
/// let mut fifo: Fifo = Fifo::new();
/// fifo.init(|bytes: &[u8]| uart.write(bytes))?;
/// fifo.start();
/// fifo_push!(fifo, "boot complete in {}ms\n", elapsed);
/// ```
pub struct Fifo<P: Platform = DefaultPlatform, const N: usize = OUTPUT_BUF_SIZE, const M: usize = MAX_MSG_LEN> {
    config: WorkerConfig,
    ctx: Option<Arc<FifoContext<P, N, M>>>,
    worker: Option<P::Worker>,
    stopped: AtomicBool,
}

impl<P: Platform, const N: usize, const M: usize> Fifo<P, N, M> {
    /// Create an uninitialized transport with default worker settings.
    pub fn new() -> Self {
        Self::with_config(WorkerConfig::default())
    }

    /// Create an uninitialized transport with explicit worker settings.
    pub fn with_config(config: WorkerConfig) -> Self {
        Self {
            config,
            ctx: None,
            worker: None,
            stopped: AtomicBool::new(false),
        }
    }

    /// Bring up primitives and the consumer worker, then enable the lock.
    ///
    /// Returns immediately if already initialized. On failure nothing is
    /// left running and the transport stays uninitialized.
    pub fn init<S: Sink>(&mut self, sink: S) -> Result<()> {
        if self.ctx.is_some() {
            return Ok(());
        }

        let ctx = FifoContext::<P, N, M>::create()
            .map(Arc::new)
            .inspect_err(|e| error!(error = %e, "fifo init failed"))?;

        let consumer = Consumer::new(Arc::clone(&ctx), Box::new(sink));
        let worker = P::spawn_worker(&self.config, move || consumer.run())
            .inspect_err(|e| error!(error = %e, "fifo init failed"))?;

        // Replays any lock()/unlock() recorded while disabled.
        ctx.output_lock().set_enabled(true);

        self.ctx = Some(ctx);
        self.worker = Some(worker);
        self.stopped.store(false, Ordering::Relaxed);
        debug!(capacity = N, max_msg_len = M, "fifo initialized");
        Ok(())
    }

    /// Enable output; pushes are enqueued from now on.
    pub fn start(&self) {
        let Some(ctx) = &self.ctx else {
            return;
        };
        ctx.set_output_enabled(true);
        self.stopped.store(false, Ordering::Relaxed);
        info!("{} started", VERSION);
    }

    /// Disable output. Buffered bytes still drain.
    pub fn stop(&self) {
        let Some(ctx) = &self.ctx else {
            return;
        };
        ctx.set_output_enabled(false);
        self.stopped.store(true, Ordering::Relaxed);
        info!("{} stopped", VERSION);
    }

    /// Shut down the worker, join it and release the primitives.
    pub fn deinit(&mut self) {
        let Some(ctx) = self.ctx.take() else {
            return;
        };

        ctx.set_output_enabled(false);
        ctx.shutdown();
        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.join() {
                warn!(error = %e, "consumer did not exit cleanly");
            }
        }
        ctx.output_lock().set_enabled(false);
        self.stopped.store(false, Ordering::Relaxed);
        debug!(dropped = ctx.dropped(), "fifo deinitialized");
    }

    /// Render and enqueue a message. Fire-and-forget.
    #[inline]
    pub fn push(&self, args: core::fmt::Arguments<'_>) {
        if let Some(ctx) = &self.ctx {
            ctx.push_fmt(args);
        }
    }

    /// Enqueue an already-rendered payload. Fire-and-forget.
    #[inline]
    pub fn push_bytes(&self, bytes: &[u8]) {
        if let Some(ctx) = &self.ctx {
            ctx.push_bytes(bytes);
        }
    }

    pub fn state(&self) -> LifecycleState {
        match &self.ctx {
            None => LifecycleState::Uninitialized,
            Some(ctx) if ctx.is_output_enabled() => LifecycleState::Started,
            Some(_) if self.stopped.load(Ordering::Relaxed) => LifecycleState::Stopped,
            Some(_) => LifecycleState::Initialized,
        }
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.ctx.is_some()
    }

    #[inline]
    pub fn is_started(&self) -> bool {
        self.ctx.as_ref().is_some_and(|ctx| ctx.is_output_enabled())
    }

    /// Shared context, if initialized.
    pub fn context(&self) -> Option<&Arc<FifoContext<P, N, M>>> {
        self.ctx.as_ref()
    }

    /// Bytes currently buffered (0 when uninitialized).
    pub fn used(&self) -> usize {
        self.ctx.as_ref().map_or(0, |ctx| ctx.used())
    }

    pub fn is_empty(&self) -> bool {
        self.ctx.as_ref().map_or(true, |ctx| ctx.is_empty())
    }

    /// Bytes dropped by overflow since init or the last reset.
    pub fn dropped(&self) -> usize {
        self.ctx.as_ref().map_or(0, |ctx| ctx.dropped())
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }
}

impl<P: Platform, const N: usize, const M: usize> Default for Fifo<P, N, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Platform, const N: usize, const M: usize> Drop for Fifo<P, N, M> {
    fn drop(&mut self) {
        self.deinit();
    }
}
