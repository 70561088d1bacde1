//! Build-time configuration for the log transport.
//!
//! Buffer sizes are const generics on [`Fifo`](crate::Fifo) with the
//! defaults below. Worker settings are captured in [`WorkerConfig`] when the
//! transport is constructed and never change while the worker is alive.

/// Ring buffer capacity in bytes for the default transport.
pub const OUTPUT_BUF_SIZE: usize = 8 * 1024;

/// Maximum rendered size of a single pushed message, in bytes.
pub const MAX_MSG_LEN: usize = 1024;

/// Bytes kept back from the consumer's scratch buffer.
///
/// The consumer polls with `capacity - POLL_BUF_MARGIN` bytes per read.
pub const POLL_BUF_MARGIN: usize = 4;

/// Consumer worker stack size in bytes.
#[cfg(target_os = "espidf")]
pub const WORKER_STACK_SIZE: usize = 4 * 1024;

/// Consumer worker stack size in bytes.
#[cfg(not(target_os = "espidf"))]
pub const WORKER_STACK_SIZE: usize = 64 * 1024;

/// Consumer worker priority (FreeRTOS task priority).
pub const WORKER_PRIORITY: u8 = 2;

/// Consumer worker name.
pub const WORKER_NAME: &str = "fifo_output";

/// Version string (set by build.rs, includes git hash)
pub const VERSION: &str = env!("VERSION_STRING");

/// Consumer worker spawn parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerConfig {
    pub stack_size: usize,
    /// FreeRTOS task priority. Ignored by the host port: `std::thread` has
    /// no portable priority, so the worker runs at the default.
    pub priority: u8,
    pub name: &'static str,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            stack_size: WORKER_STACK_SIZE,
            priority: WORKER_PRIORITY,
            name: WORKER_NAME,
        }
    }
}

/// Scratch size the consumer reads with for a ring of `capacity` bytes.
#[inline]
pub const fn poll_buf_len(capacity: usize) -> usize {
    if capacity > POLL_BUF_MARGIN {
        capacity - POLL_BUF_MARGIN
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_buf_len_keeps_margin() {
        assert_eq!(poll_buf_len(OUTPUT_BUF_SIZE), OUTPUT_BUF_SIZE - 4);
        assert_eq!(poll_buf_len(16), 12);
    }

    #[test]
    fn test_poll_buf_len_tiny_ring() {
        assert_eq!(poll_buf_len(4), 1);
        assert_eq!(poll_buf_len(1), 1);
    }

    #[test]
    fn test_worker_config_default() {
        let cfg = WorkerConfig::default();
        assert_eq!(cfg.stack_size, WORKER_STACK_SIZE);
        assert_eq!(cfg.priority, WORKER_PRIORITY);
        assert_eq!(cfg.name, "fifo_output");
    }
}
