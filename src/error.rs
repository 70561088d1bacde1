//! Transport error types

use thiserror::Error;

/// Platform primitive that failed to come up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// Output mutex
    Lock,
    /// Consumer wake signal
    Notify,
    /// Consumer worker thread/task
    Worker,
}

impl Primitive {
    /// Get primitive name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lock => "output lock",
            Self::Notify => "notify channel",
            Self::Worker => "consumer worker",
        }
    }
}

impl core::fmt::Display for Primitive {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by the transport and its platform ports.
///
/// `InitFailure` is the only error returned to callers. Pushing never reports
/// an error: bytes that do not fit are dropped. `WorkerJoin` stays inside
/// `deinit`, which logs it and carries on tearing down.
#[derive(Error, Debug)]
pub enum FifoError {
    /// A platform primitive could not be constructed during init.
    #[error("init failed: {primitive}: {reason}")]
    InitFailure { primitive: Primitive, reason: String },

    /// The consumer did not exit cleanly.
    #[error("consumer worker join failed: {0}")]
    WorkerJoin(String),
}

impl FifoError {
    pub fn init_failure(primitive: Primitive, reason: impl Into<String>) -> Self {
        FifoError::InitFailure {
            primitive,
            reason: reason.into(),
        }
    }

    /// Which primitive failed.
    pub fn primitive(&self) -> Primitive {
        match self {
            FifoError::InitFailure { primitive, .. } => *primitive,
            FifoError::WorkerJoin(_) => Primitive::Worker,
        }
    }
}

pub type Result<T> = std::result::Result<T, FifoError>;
