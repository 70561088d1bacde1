//! FreeRTOS port for ESP-IDF targets.
//!
//! - Output lock: FreeRTOS mutex semaphore.
//! - Notify: FreeRTOS binary semaphore (one token, coalescing gives).
//! - Worker: std thread spawned under a `ThreadSpawnConfiguration` so the
//!   task gets the configured name, stack and priority.

use core::ffi::c_void;
use core::ptr;

use esp_idf_svc::hal::delay::BLOCK;
use esp_idf_svc::hal::task::thread::ThreadSpawnConfiguration;
use esp_idf_svc::sys;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

use super::{Notify, Platform, RawLock, WorkerHandle};
use crate::config::WorkerConfig;
use crate::error::{FifoError, Primitive, Result};

// queue.h object types
const QUEUE_TYPE_MUTEX: u8 = 1;
const QUEUE_TYPE_BINARY_SEMAPHORE: u8 = 3;
const QUEUE_SEND_TO_BACK: sys::BaseType_t = 0;

/// Port for ESP-IDF (FreeRTOS) targets.
pub struct FreeRtosPlatform;

impl Platform for FreeRtosPlatform {
    type Lock = FreeRtosLock;
    type Notify = FreeRtosNotify;
    type Worker = FreeRtosWorker;

    fn create_lock() -> Result<FreeRtosLock> {
        // SAFETY: plain constructor, result checked for NULL.
        let handle = unsafe { sys::xQueueCreateMutex(QUEUE_TYPE_MUTEX) };
        if handle.is_null() {
            return Err(FifoError::init_failure(Primitive::Lock, "xQueueCreateMutex returned NULL"));
        }
        Ok(FreeRtosLock(Semaphore(handle)))
    }

    fn create_notify() -> Result<FreeRtosNotify> {
        // SAFETY: plain constructor, result checked for NULL.
        let handle = unsafe { sys::xQueueGenericCreate(1, 0, QUEUE_TYPE_BINARY_SEMAPHORE) };
        if handle.is_null() {
            return Err(FifoError::init_failure(Primitive::Notify, "xQueueGenericCreate returned NULL"));
        }
        Ok(FreeRtosNotify(Semaphore(handle)))
    }

    fn spawn_worker<F>(config: &WorkerConfig, body: F) -> Result<FreeRtosWorker>
    where
        F: FnOnce() + Send + 'static,
    {
        debug!(
            name = config.name,
            stack_size = config.stack_size,
            priority = config.priority,
            "spawning consumer task"
        );

        let spawn_cfg = ThreadSpawnConfiguration {
            stack_size: config.stack_size,
            priority: config.priority,
            ..Default::default()
        };
        spawn_cfg
            .set()
            .map_err(|e| FifoError::init_failure(Primitive::Worker, e.to_string()))?;

        let spawned = thread::Builder::new()
            .name(config.name.to_string())
            .stack_size(config.stack_size)
            .spawn(body);

        // Restore defaults for whoever spawns next.
        if let Err(e) = ThreadSpawnConfiguration::default().set() {
            warn!(error = %e, "thread spawn configuration not restored");
        }

        spawned
            .map(FreeRtosWorker)
            .map_err(|e| FifoError::init_failure(Primitive::Worker, e.to_string()))
    }
}

/// Owned FreeRTOS semaphore handle.
struct Semaphore(sys::QueueHandle_t);

// SAFETY: FreeRTOS queue handles may be used from any task.
unsafe impl Send for Semaphore {}
unsafe impl Sync for Semaphore {}

impl Semaphore {
    #[inline]
    fn take(&self) {
        // SAFETY: handle is valid until drop.
        unsafe {
            sys::xQueueSemaphoreTake(self.0, BLOCK);
        }
    }

    #[inline]
    fn give(&self) {
        // SAFETY: handle is valid until drop.
        unsafe {
            sys::xQueueGenericSend(self.0, ptr::null::<c_void>(), 0, QUEUE_SEND_TO_BACK);
        }
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        // SAFETY: created by xQueue*Create, deleted exactly once.
        unsafe { sys::vQueueDelete(self.0) }
    }
}

/// Output lock backed by a FreeRTOS mutex.
pub struct FreeRtosLock(Semaphore);

impl RawLock for FreeRtosLock {
    #[inline]
    fn lock(&self) {
        self.0.take();
    }

    #[inline]
    unsafe fn unlock(&self) {
        self.0.give();
    }
}

/// Wake signal backed by a FreeRTOS binary semaphore.
pub struct FreeRtosNotify(Semaphore);

impl Notify for FreeRtosNotify {
    #[inline]
    fn signal(&self) {
        // Giving an already-given binary semaphore fails: that is the coalescing.
        self.0.give();
    }

    #[inline]
    fn wait(&self) {
        self.0.take();
    }
}

/// Join handle of the consumer task.
pub struct FreeRtosWorker(JoinHandle<()>);

impl WorkerHandle for FreeRtosWorker {
    fn join(self) -> Result<()> {
        self.0
            .join()
            .map_err(|_| FifoError::WorkerJoin("consumer task panicked".to_string()))
    }
}
