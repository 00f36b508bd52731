// Ports the simulation core depends on.

/// Monotonic time source used for every cooldown comparison.
///
/// One instance is owned by the simulation and handed to each component that needs the
/// current time; nothing in the core reads the wall clock on its own.
pub trait Clock: Send + Sync {
    /// Milliseconds since an arbitrary, fixed origin. Never decreases.
    fn now_ms(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

/// Returns true once at least `cooldown_ms` has passed since `last_ms`.
///
/// `None` means the action never happened, so it is always allowed.
pub fn cooldown_elapsed(last_ms: Option<u64>, now_ms: u64, cooldown_ms: u64) -> bool {
    match last_ms {
        Some(last) => now_ms.saturating_sub(last) >= cooldown_ms,
        None => true,
    }
}
