//! Shared transport context.
//!
//! One [`FifoContext`] holds everything producers and the consumer share:
//! the ring, the output lock guarding it, the wake signal, and the lifecycle
//! flags. The controller owns it through an `Arc` and hands a clone to the
//! consumer worker.
//!
//! ```text
//! push ─▶ lock ─▶ ring.write ─▶ unlock ─▶ notify.signal
//!                                              │
//! sink ◀─ drain_once ◀─ ring.read under lock ◀─ notify.wait
//! ```

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::config::{MAX_MSG_LEN, OUTPUT_BUF_SIZE};
use crate::lock::OutputLock;
use crate::platform::{Notify, Platform};
use crate::producer::format_to_buffer;
use crate::ring::RingBuffer;

/// State shared between producers and the consumer.
pub struct FifoContext<P: Platform, const N: usize = OUTPUT_BUF_SIZE, const M: usize = MAX_MSG_LEN> {
    lock: OutputLock<P::Lock>,
    ring: UnsafeCell<RingBuffer<N>>,
    notify: P::Notify,
    output_enabled: AtomicBool,
    running: AtomicBool,
    dropped: AtomicUsize,
}

// SAFETY: `ring` is only reached through `with_ring`, which touches it only
// while the calling thread holds the platform lock.
unsafe impl<P: Platform, const N: usize, const M: usize> Sync for FifoContext<P, N, M> {}
unsafe impl<P: Platform, const N: usize, const M: usize> Send for FifoContext<P, N, M> {}

impl<P: Platform, const N: usize, const M: usize> FifoContext<P, N, M> {
    /// Build a context from freshly created primitives.
    ///
    /// The output lock starts disabled and output starts stopped.
    pub fn new(lock: P::Lock, notify: P::Notify) -> Self {
        Self {
            lock: OutputLock::new(lock),
            ring: UnsafeCell::new(RingBuffer::new()),
            notify,
            output_enabled: AtomicBool::new(false),
            running: AtomicBool::new(true),
            dropped: AtomicUsize::new(0),
        }
    }

    /// Create both primitives through `P` and build a context.
    pub fn create() -> crate::Result<Self> {
        let lock = P::create_lock()?;
        let notify = P::create_notify()?;
        Ok(Self::new(lock, notify))
    }

    /// Run `f` with exclusive access to the ring.
    ///
    /// Returns `None` without touching the ring while the output lock is
    /// disabled: the call is only recorded then.
    #[inline]
    fn with_ring<R>(&self, f: impl FnOnce(&mut RingBuffer<N>) -> R) -> Option<R> {
        let guard = self.lock.guard();
        if !guard.is_held() {
            return None;
        }
        // SAFETY: the platform lock is held for the lifetime of `guard`.
        Some(f(unsafe { &mut *self.ring.get() }))
    }

    /// The output lock guarding the ring.
    pub fn output_lock(&self) -> &OutputLock<P::Lock> {
        &self.lock
    }

    /// The consumer wake signal.
    pub fn notify(&self) -> &P::Notify {
        &self.notify
    }

    pub fn set_output_enabled(&self, enabled: bool) {
        self.output_enabled.store(enabled, Ordering::Release);
    }

    #[inline]
    pub fn is_output_enabled(&self) -> bool {
        self.output_enabled.load(Ordering::Acquire)
    }

    /// Whether the consumer should keep looping.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Ask the consumer to exit and wake it so it observes the request.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::Release);
        self.notify.signal();
    }

    /// Enqueue raw bytes (truncated to `M`) and wake the consumer.
    ///
    /// No-op while output is disabled. Returns the number of bytes stored;
    /// anything past the free space is dropped.
    pub fn push_bytes(&self, bytes: &[u8]) -> usize {
        if !self.is_output_enabled() {
            return 0;
        }

        let bytes = &bytes[..bytes.len().min(M)];
        let written = self.with_ring(|ring| ring.write(bytes)).unwrap_or(0);

        let lost = bytes.len() - written;
        if lost > 0 {
            self.dropped.fetch_add(lost, Ordering::Relaxed);
        }
        if written > 0 {
            self.notify.signal();
        }
        written
    }

    /// Render `args` into an `M`-byte scratch buffer and enqueue it.
    ///
    /// Output past `M` bytes is truncated. If a `Display` impl reports an
    /// error the whole message is discarded.
    pub fn push_fmt(&self, args: core::fmt::Arguments<'_>) -> usize {
        if !self.is_output_enabled() {
            return 0;
        }

        let mut scratch = [0u8; M];
        match format_to_buffer(&mut scratch, args) {
            Some(len) => self.push_bytes(&scratch[..len]),
            None => 0,
        }
    }

    /// Move up to `out.len()` bytes out of the ring.
    pub fn read(&self, out: &mut [u8]) -> usize {
        self.with_ring(|ring| ring.read(out)).unwrap_or(0)
    }

    /// One consumer drain step: read into `scratch` under the lock, then
    /// hand the bytes to `sink` outside it.
    ///
    /// Returns the number of bytes delivered (0 when the ring was empty).
    pub fn drain_once(&self, scratch: &mut [u8], mut sink: impl FnMut(&[u8])) -> usize {
        let len = self.read(scratch);
        if len > 0 {
            sink(&scratch[..len]);
        }
        len
    }

    /// Bytes currently buffered.
    pub fn used(&self) -> usize {
        self.with_ring(|ring| ring.used()).unwrap_or(0)
    }

    /// Whether the ring holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.with_ring(|ring| ring.is_empty()).unwrap_or(true)
    }

    /// Whether the ring is at capacity.
    pub fn is_full(&self) -> bool {
        self.with_ring(|ring| ring.is_full()).unwrap_or(false)
    }

    /// Ring capacity in bytes.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Maximum rendered message size in bytes.
    pub const fn max_msg_len(&self) -> usize {
        M
    }

    /// Total bytes discarded by drop-on-full.
    #[inline]
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Reset the dropped-byte counter (e.g., after reporting).
    #[inline]
    pub fn reset_dropped(&self) {
        self.dropped.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::HostPlatform;

    type TestContext = FifoContext<HostPlatform, 16, 8>;

    fn live_context() -> TestContext {
        let ctx = TestContext::create().unwrap();
        ctx.output_lock().set_enabled(true);
        ctx.set_output_enabled(true);
        ctx
    }

    #[test]
    fn test_push_truncates_to_max_msg_len() {
        let ctx = live_context();
        assert_eq!(ctx.push_bytes(b"0123456789"), 8);
        assert_eq!(ctx.used(), 8);
        // Truncation is not counted as overflow loss.
        assert_eq!(ctx.dropped(), 0);
    }

    #[test]
    fn test_push_fmt_truncates() {
        let ctx = live_context();
        assert_eq!(ctx.push_fmt(format_args!("value={}", 123456)), 8);

        let mut out = [0u8; 16];
        let n = ctx.read(&mut out);
        assert_eq!(&out[..n], b"value=12");
    }

    #[test]
    fn test_push_fmt_error_discards_message() {
        struct Broken;
        impl core::fmt::Display for Broken {
            fn fmt(&self, _: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                Err(core::fmt::Error)
            }
        }

        let ctx = live_context();
        assert_eq!(ctx.push_fmt(format_args!("ab{}", Broken)), 0);
        assert_eq!(ctx.used(), 0);
        assert!(!ctx.notify().is_pending());
    }

    #[test]
    fn test_overflow_counts_dropped_bytes() {
        let ctx = live_context();
        ctx.push_bytes(b"12345678");
        ctx.push_bytes(b"abcdefgh");
        assert_eq!(ctx.push_bytes(b"XYZ"), 0);
        assert_eq!(ctx.dropped(), 3);

        ctx.reset_dropped();
        assert_eq!(ctx.dropped(), 0);
    }

    #[test]
    fn test_push_signals_only_when_stored() {
        let ctx = live_context();
        ctx.push_bytes(b"12345678");
        ctx.push_bytes(b"abcdefgh");
        ctx.notify().wait();

        ctx.push_bytes(b"dropped");
        assert!(!ctx.notify().is_pending());
    }

    #[test]
    fn test_push_while_stopped_is_noop() {
        let ctx = TestContext::create().unwrap();
        ctx.output_lock().set_enabled(true);
        assert_eq!(ctx.push_bytes(b"abc"), 0);
        assert_eq!(ctx.used(), 0);
        assert!(!ctx.notify().is_pending());
    }

    #[test]
    fn test_disabled_lock_keeps_ring_untouched() {
        let ctx = TestContext::create().unwrap();
        ctx.set_output_enabled(true);

        // Recorded only; nothing is stored and nobody is woken.
        assert_eq!(ctx.push_bytes(b"abc"), 0);
        assert!(!ctx.notify().is_pending());
        assert!(!ctx.output_lock().raw().is_locked());

        ctx.output_lock().set_enabled(true);
        assert!(!ctx.output_lock().raw().is_locked());
        assert_eq!(ctx.push_bytes(b"abc"), 3);
        assert_eq!(ctx.used(), 3);
    }

    #[test]
    fn test_shutdown_wakes_consumer() {
        let ctx = TestContext::create().unwrap();
        assert!(ctx.is_running());
        ctx.shutdown();
        assert!(!ctx.is_running());
        assert!(ctx.notify().is_pending());
    }
}
