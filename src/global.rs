//! Process-wide transport instance.
//!
//! Free-function front end over one [`Fifo`] with the default platform and
//! sizes, for code that logs from anywhere without threading a handle
//! through. Producers take a shared read lock only around the enqueue;
//! init/deinit take it exclusively.

use parking_lot::RwLock;

use crate::config::MAX_MSG_LEN;
use crate::consumer::Sink;
use crate::error::Result;
use crate::fifo::{Fifo, LifecycleState};
use crate::producer::format_to_buffer;

static GLOBAL_FIFO: RwLock<Option<Fifo>> = parking_lot::const_rwlock(None);

/// Initialize the process-wide transport. Idempotent.
pub fn init<S: Sink>(sink: S) -> Result<()> {
    let mut slot = GLOBAL_FIFO.write();
    if slot.is_some() {
        return Ok(());
    }

    let mut fifo = Fifo::new();
    fifo.init(sink)?;
    *slot = Some(fifo);
    Ok(())
}

/// Enable output. No-op before [`init`].
pub fn start() {
    if let Some(fifo) = GLOBAL_FIFO.read().as_ref() {
        fifo.start();
    }
}

/// Disable output. No-op before [`init`].
pub fn stop() {
    if let Some(fifo) = GLOBAL_FIFO.read().as_ref() {
        fifo.stop();
    }
}

/// Tear down the process-wide transport. No-op before [`init`].
pub fn deinit() {
    // Take it out first so the join happens without the lock held.
    let fifo = GLOBAL_FIFO.write().take();
    if let Some(mut fifo) = fifo {
        fifo.deinit();
    }
}

/// Render and enqueue a message. Prefer the [`push!`](crate::push) macro.
///
/// `args` is rendered before the instance lock is taken: a `Display` impl
/// may itself call [`push!`](crate::push) without re-entering the lock.
pub fn push(args: core::fmt::Arguments<'_>) {
    if !GLOBAL_FIFO.read().as_ref().is_some_and(Fifo::is_started) {
        return;
    }

    let mut scratch = [0u8; MAX_MSG_LEN];
    if let Some(len) = format_to_buffer(&mut scratch, args) {
        push_bytes(&scratch[..len]);
    }
}

/// Enqueue an already-rendered payload.
#[inline]
pub fn push_bytes(bytes: &[u8]) {
    if let Some(fifo) = GLOBAL_FIFO.read().as_ref() {
        fifo.push_bytes(bytes);
    }
}

/// Current lifecycle state of the process-wide transport.
pub fn state() -> LifecycleState {
    GLOBAL_FIFO
        .read()
        .as_ref()
        .map_or(LifecycleState::Uninitialized, Fifo::state)
}

/// Bytes currently buffered in the process-wide transport.
pub fn used() -> usize {
    GLOBAL_FIFO.read().as_ref().map_or(0, Fifo::used)
}
