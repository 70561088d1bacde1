//! Shared helpers for integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Sink output collected on the consumer thread.
#[derive(Clone, Default)]
pub struct Collected(Arc<Mutex<Vec<Vec<u8>>>>);

impl Collected {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink closure appending each delivery.
    pub fn sink(&self) -> impl FnMut(&[u8]) + Send + 'static {
        let out = Arc::clone(&self.0);
        move |bytes: &[u8]| out.lock().push(bytes.to_vec())
    }

    /// All delivered bytes, concatenated.
    pub fn bytes(&self) -> Vec<u8> {
        self.0.lock().concat()
    }

    pub fn deliveries(&self) -> usize {
        self.0.lock().len()
    }

    /// Wait until at least `len` bytes were delivered.
    pub fn wait_for(&self, len: usize) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if self.bytes().len() >= len {
                return true;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        false
    }
}

/// Route crate diagnostics to the test output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
