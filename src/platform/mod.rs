//! Platform capability layer.
//!
//! The transport core never touches an OS primitive directly. Each port
//! implements [`Platform`] and hands back three things:
//!
//! - a [`RawLock`] for the output mutex,
//! - a [`Notify`] single-slot wake signal,
//! - a [`WorkerHandle`] for the spawned consumer.
//!
//! # Contract
//!
//! - `Notify::wait()` blocks until `Notify::signal()` has been called at least
//!   once since the last wake. Signals coalesce; the slot holds one token.
//! - Lock/unlock calls are balanced within one critical section. No
//!   reentrancy is required.
//!
//! The port for the current target is [`DefaultPlatform`].

use crate::config::WorkerConfig;
use crate::error::Result;

pub mod host;

#[cfg(target_os = "espidf")]
pub mod freertos;

pub use host::HostPlatform;

#[cfg(target_os = "espidf")]
pub use freertos::FreeRtosPlatform;

/// Port selected for the build target.
#[cfg(not(target_os = "espidf"))]
pub type DefaultPlatform = HostPlatform;

/// Port selected for the build target.
#[cfg(target_os = "espidf")]
pub type DefaultPlatform = FreeRtosPlatform;

/// Raw mutual-exclusion primitive with split lock/unlock.
pub trait RawLock: Send + Sync + 'static {
    /// Block until the lock is held by the caller.
    fn lock(&self);

    /// Release the lock.
    ///
    /// # Safety
    ///
    /// The lock must currently be held by a matching `lock()` call.
    unsafe fn unlock(&self);
}

/// Single-slot wake signal.
pub trait Notify: Send + Sync + 'static {
    /// Post the wake token. Never blocks.
    fn signal(&self);

    /// Block until a token is available, then consume it.
    fn wait(&self);
}

/// Handle to the spawned consumer.
pub trait WorkerHandle: Send + Sync + 'static {
    /// Wait for the worker to exit.
    fn join(self) -> Result<()>;
}

/// Strategy supplying the primitives for one execution environment.
pub trait Platform: Send + Sync + 'static {
    type Lock: RawLock;
    type Notify: Notify;
    type Worker: WorkerHandle;

    fn create_lock() -> Result<Self::Lock>;

    fn create_notify() -> Result<Self::Notify>;

    fn spawn_worker<F>(config: &WorkerConfig, body: F) -> Result<Self::Worker>
    where
        F: FnOnce() + Send + 'static;
}
