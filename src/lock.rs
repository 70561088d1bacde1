//! Output lock with enable/disable replay.
//!
//! # Why replay
//!
//! Lock and unlock calls can arrive while the lock is disabled (during the
//! multi-step init, before the primitive may be touched). Those calls are
//! recorded, not executed. Enabling the lock reconciles the recorded state
//! with the primitive so the net lock balance is preserved:
//!
//! ```text
//!            lock()/unlock()                lock()/unlock()
//! DISABLED ───────────────▶ record     ENABLED ───────────────▶ primitive
//!    │                      `requested`    ▲                    + `held`
//!    └──── set_enabled(true): requested != held → lock/unlock ──┘
//! ```
//!
//! [`LockState`] is the pure state machine; [`OutputLock`] drives a
//! [`RawLock`] with it.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::platform::RawLock;

/// Primitive action requested by a [`LockState`] transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockAction {
    /// Leave the primitive alone.
    None,
    /// Acquire the primitive.
    Acquire,
    /// Release the primitive.
    Release,
}

/// Enable/replay state machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LockState {
    /// Lock subsystem is live.
    pub enabled: bool,
    /// Net locked before the last disable (the primitive is held).
    pub locked_before_disable: bool,
    /// Net locked as requested while disabled.
    pub locked_before_enable: bool,
}

impl LockState {
    /// New state: disabled, nothing held, nothing requested.
    pub const fn new() -> Self {
        Self {
            enabled: false,
            locked_before_disable: false,
            locked_before_enable: false,
        }
    }

    /// Transition for a `lock()` call.
    pub fn on_lock(&mut self) -> LockAction {
        if self.enabled {
            self.locked_before_disable = true;
            LockAction::Acquire
        } else {
            self.locked_before_enable = true;
            LockAction::None
        }
    }

    /// Transition for an `unlock()` call.
    pub fn on_unlock(&mut self) -> LockAction {
        if self.enabled {
            self.locked_before_disable = false;
            LockAction::Release
        } else {
            self.locked_before_enable = false;
            LockAction::None
        }
    }

    /// Transition for enabling or disabling the subsystem.
    ///
    /// Only a disabled → enabled edge can yield a primitive action.
    pub fn set_enabled(&mut self, enabled: bool) -> LockAction {
        if enabled == self.enabled {
            return LockAction::None;
        }

        if !enabled {
            // Start the disabled period from the real held state.
            self.enabled = false;
            self.locked_before_enable = self.locked_before_disable;
            return LockAction::None;
        }

        self.enabled = true;
        let requested = self.locked_before_enable;
        self.locked_before_enable = false;

        match (self.locked_before_disable, requested) {
            (false, true) => self.on_lock(),
            (true, false) => self.on_unlock(),
            _ => LockAction::None,
        }
    }

    /// Lock state callers currently observe.
    pub fn is_locked(&self) -> bool {
        if self.enabled {
            self.locked_before_disable
        } else {
            self.locked_before_enable
        }
    }
}

/// Mutual-exclusion wrapper around a platform [`RawLock`].
///
/// Starts disabled. While disabled, `lock()`/`unlock()` are recorded and the
/// primitive is never touched.
///
/// # Concurrency
///
/// `held` is only written by the thread holding the primitive. Callers that
/// touch shared data must check [`OutputGuard::is_held`]: a guard taken while
/// disabled only records the request.
pub struct OutputLock<L: RawLock> {
    raw: L,
    enabled: AtomicBool,
    held: AtomicBool,
    requested: AtomicBool,
}

impl<L: RawLock> OutputLock<L> {
    /// Wrap a freshly created primitive. The lock starts disabled.
    pub const fn new(raw: L) -> Self {
        Self {
            raw,
            enabled: AtomicBool::new(false),
            held: AtomicBool::new(false),
            requested: AtomicBool::new(false),
        }
    }

    fn load_state(&self) -> LockState {
        LockState {
            enabled: self.enabled.load(Ordering::Acquire),
            locked_before_disable: self.held.load(Ordering::Acquire),
            locked_before_enable: self.requested.load(Ordering::Acquire),
        }
    }

    fn store_state(&self, state: LockState) {
        self.held.store(state.locked_before_disable, Ordering::Release);
        self.requested.store(state.locked_before_enable, Ordering::Release);
        self.enabled.store(state.enabled, Ordering::Release);
    }

    fn apply(&self, action: LockAction) {
        match action {
            LockAction::None => {}
            LockAction::Acquire => {
                self.raw.lock();
                self.held.store(true, Ordering::Release);
            }
            LockAction::Release => {
                self.held.store(false, Ordering::Release);
                // SAFETY: `held` recorded a matching acquire.
                unsafe { self.raw.unlock() }
            }
        }
    }

    /// Run a call transition of the state machine against the primitive.
    fn step(&self, transition: fn(&mut LockState) -> LockAction) -> LockAction {
        let mut state = self.load_state();
        let action = transition(&mut state);
        match action {
            // Disabled: only the recorded request moved.
            LockAction::None => self
                .requested
                .store(state.locked_before_enable, Ordering::Release),
            LockAction::Acquire | LockAction::Release => self.apply(action),
        }
        action
    }

    /// Acquire the output lock (or record the request while disabled).
    pub fn lock(&self) {
        self.step(LockState::on_lock);
    }

    /// Release the output lock (or record the release while disabled).
    pub fn unlock(&self) {
        self.step(LockState::on_unlock);
    }

    /// Enable or disable the lock, replaying recorded calls on enable.
    pub fn set_enabled(&self, enabled: bool) {
        let mut state = self.load_state();
        let action = state.set_enabled(enabled);
        // The primitive action records `held` itself.
        match action {
            LockAction::None => self.store_state(state),
            LockAction::Acquire | LockAction::Release => {
                self.requested.store(state.locked_before_enable, Ordering::Release);
                self.enabled.store(state.enabled, Ordering::Release);
                self.apply(action);
            }
        }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Snapshot of the replay state.
    pub fn state(&self) -> LockState {
        self.load_state()
    }

    /// The wrapped primitive.
    pub fn raw(&self) -> &L {
        &self.raw
    }

    /// `lock()` and return a guard that runs `unlock()` on drop.
    pub fn guard(&self) -> OutputGuard<'_, L> {
        let held = self.step(LockState::on_lock) == LockAction::Acquire;
        OutputGuard { lock: self, held }
    }
}

/// Scoped hold of an [`OutputLock`].
pub struct OutputGuard<'a, L: RawLock> {
    lock: &'a OutputLock<L>,
    held: bool,
}

impl<L: RawLock> OutputGuard<'_, L> {
    /// Whether this guard really acquired the primitive (lock was enabled).
    #[inline]
    pub fn is_held(&self) -> bool {
        self.held
    }
}

impl<L: RawLock> Drop for OutputGuard<'_, L> {
    fn drop(&mut self) {
        self.lock.unlock();
    }
}
