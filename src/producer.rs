//! Producer side: message rendering and push macros.
//!
//! # Rules
//!
//! - Rendering happens on the caller's stack, outside the output lock.
//! - A rendered message never exceeds the scratch size; longer output is cut.
//! - Pushing never blocks on buffer space and never reports loss.

/// Format a message into a buffer, truncating at `buf.len()`.
///
/// Returns the number of bytes written, or `None` if a `Display` impl
/// reported an error (the partial output is then meaningless).
#[inline]
pub fn format_to_buffer(buf: &mut [u8], args: core::fmt::Arguments<'_>) -> Option<usize> {
    use core::fmt::Write;

    struct BufWriter<'a> {
        buf: &'a mut [u8],
        pos: usize,
    }

    impl<'a> Write for BufWriter<'a> {
        fn write_str(&mut self, s: &str) -> core::fmt::Result {
            let bytes = s.as_bytes();
            let remaining = self.buf.len() - self.pos;
            let to_write = bytes.len().min(remaining);
            self.buf[self.pos..self.pos + to_write].copy_from_slice(&bytes[..to_write]);
            self.pos += to_write;
            Ok(())
        }
    }

    // Fast path: a literal with no arguments needs no formatting machinery.
    if let Some(s) = args.as_str() {
        let len = s.len().min(buf.len());
        buf[..len].copy_from_slice(&s.as_bytes()[..len]);
        return Some(len);
    }

    let mut writer = BufWriter { buf, pos: 0 };
    match core::fmt::write(&mut writer, args) {
        Ok(()) => Some(writer.pos),
        Err(_) => None,
    }
}

/// Push a formatted message into a [`Fifo`](crate::Fifo).
///
/// # Example
///
/// ```ignore
/// fifo_push!(fifo, "key {} @ {}us\n", key, now);
/// ```
#[macro_export]
macro_rules! fifo_push {
    ($fifo:expr, $($arg:tt)*) => {
        $fifo.push(format_args!($($arg)*))
    };
}

/// Push a formatted message into the process-wide transport.
///
/// No-op until [`global::init`](crate::global::init) and
/// [`global::start`](crate::global::start) have run.
#[macro_export]
macro_rules! push {
    ($($arg:tt)*) => {
        $crate::global::push(format_args!($($arg)*))
    };
}
