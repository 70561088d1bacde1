//! # fifo-log
//!
//! Asynchronous, thread-safe log transport.
//!
//! ## Architecture
//!
//! ```text
//! Producers (any thread)        FifoContext              Consumer worker
//! ──────────────────────        ───────────              ───────────────
//!
//! push!() ── render ──▶ lock ▶ [ring bytes] ▶ unlock     notify.wait()
//!  stack scratch, ≤ M           drop-on-full       ─────▶ read under lock
//!            └──────────── notify.signal() ───────┘       sink(bytes)
//! ```
//!
//! - Producers never block on buffer space; excess bytes are dropped.
//! - One consumer drains to empty on every wake; wakes coalesce.
//! - Platform primitives come from a [`Platform`](platform::Platform) port:
//!   [`HostPlatform`](platform::HostPlatform) on `std` hosts,
//!   `FreeRtosPlatform` on ESP-IDF.

pub mod config;
pub mod consumer;
pub mod context;
pub mod error;
pub mod fifo;
pub mod global;
pub mod lock;
pub mod platform;
pub mod producer;
pub mod ring;

pub use config::{WorkerConfig, MAX_MSG_LEN, OUTPUT_BUF_SIZE, VERSION};
pub use consumer::Sink;
pub use context::FifoContext;
pub use error::{FifoError, Primitive, Result};
pub use fifo::{Fifo, LifecycleState};
pub use lock::{LockAction, LockState, OutputLock};
pub use platform::{DefaultPlatform, Platform};
pub use ring::RingBuffer;
