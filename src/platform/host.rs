//! Hosted port: `parking_lot` mutex, condvar semaphore, `std::thread`.

use std::thread::{self, JoinHandle};

use parking_lot::lock_api::RawMutex as _;
use parking_lot::{Condvar, Mutex, RawMutex};
use tracing::debug;

use super::{Notify, Platform, RawLock, WorkerHandle};
use crate::config::WorkerConfig;
use crate::error::{FifoError, Primitive, Result};

/// Port for targets with `std` threads.
pub struct HostPlatform;

impl Platform for HostPlatform {
    type Lock = HostLock;
    type Notify = HostNotify;
    type Worker = HostWorker;

    fn create_lock() -> Result<HostLock> {
        Ok(HostLock::new())
    }

    fn create_notify() -> Result<HostNotify> {
        Ok(HostNotify::new())
    }

    fn spawn_worker<F>(config: &WorkerConfig, body: F) -> Result<HostWorker>
    where
        F: FnOnce() + Send + 'static,
    {
        // `config.priority` is not applied: std threads have no portable
        // priority knob.
        debug!(
            name = config.name,
            stack_size = config.stack_size,
            priority = config.priority,
            "spawning consumer thread (priority is advisory on host)"
        );

        thread::Builder::new()
            .name(config.name.to_string())
            .stack_size(config.stack_size)
            .spawn(body)
            .map(HostWorker)
            .map_err(|e| FifoError::init_failure(Primitive::Worker, e.to_string()))
    }
}

/// Raw mutex with split lock/unlock.
pub struct HostLock {
    raw: RawMutex,
}

impl HostLock {
    pub const fn new() -> Self {
        Self { raw: RawMutex::INIT }
    }

    /// Try to take the lock without blocking.
    pub fn try_lock(&self) -> bool {
        self.raw.try_lock()
    }

    /// Whether some thread currently holds the lock.
    pub fn is_locked(&self) -> bool {
        self.raw.is_locked()
    }
}

impl Default for HostLock {
    fn default() -> Self {
        Self::new()
    }
}

impl RawLock for HostLock {
    #[inline]
    fn lock(&self) {
        self.raw.lock();
    }

    #[inline]
    unsafe fn unlock(&self) {
        // SAFETY: forwarded caller contract, the lock is held.
        unsafe { self.raw.unlock() }
    }
}

/// Binary semaphore built on a condvar.
pub struct HostNotify {
    pending: Mutex<bool>,
    cond: Condvar,
}

impl HostNotify {
    pub const fn new() -> Self {
        Self {
            pending: parking_lot::const_mutex(false),
            cond: Condvar::new(),
        }
    }

    /// Whether a wake token is waiting to be consumed.
    pub fn is_pending(&self) -> bool {
        *self.pending.lock()
    }
}

impl Default for HostNotify {
    fn default() -> Self {
        Self::new()
    }
}

impl Notify for HostNotify {
    fn signal(&self) {
        let mut pending = self.pending.lock();
        *pending = true;
        self.cond.notify_one();
    }

    fn wait(&self) {
        let mut pending = self.pending.lock();
        while !*pending {
            self.cond.wait(&mut pending);
        }
        *pending = false;
    }
}

/// Join handle of the consumer thread.
pub struct HostWorker(JoinHandle<()>);

impl WorkerHandle for HostWorker {
    fn join(self) -> Result<()> {
        self.0
            .join()
            .map_err(|_| FifoError::WorkerJoin("consumer thread panicked".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_notify_signals_coalesce() {
        let notify = HostNotify::new();
        notify.signal();
        notify.signal();
        notify.signal();
        assert!(notify.is_pending());

        notify.wait();
        assert!(!notify.is_pending());
    }

    #[test]
    fn test_notify_wakes_blocked_waiter() {
        let notify = Arc::new(HostNotify::new());
        let waiter = {
            let notify = Arc::clone(&notify);
            thread::spawn(move || notify.wait())
        };

        thread::sleep(Duration::from_millis(20));
        notify.signal();
        waiter.join().unwrap();
    }

    #[test]
    fn test_lock_split_calls() {
        let lock = HostLock::new();
        lock.lock();
        assert!(lock.is_locked());
        assert!(!lock.try_lock());
        unsafe { lock.unlock() };
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_spawn_and_join_worker() {
        let (tx, rx) = std::sync::mpsc::channel();
        let worker = HostPlatform::spawn_worker(&WorkerConfig::default(), move || {
            tx.send(thread::current().name().map(str::to_owned)).unwrap();
        })
        .unwrap();
        worker.join().unwrap();
        assert_eq!(rx.recv().unwrap().as_deref(), Some("fifo_output"));
    }

    #[test]
    fn test_spawn_ignores_priority() {
        let config = WorkerConfig {
            priority: u8::MAX,
            name: "prio_worker",
            ..WorkerConfig::default()
        };
        let (tx, rx) = std::sync::mpsc::channel();
        let worker = HostPlatform::spawn_worker(&config, move || {
            tx.send(thread::current().name().map(str::to_owned)).unwrap();
        })
        .unwrap();
        worker.join().unwrap();
        assert_eq!(rx.recv().unwrap().as_deref(), Some("prio_worker"));
    }
}
