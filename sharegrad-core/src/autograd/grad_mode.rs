use std::cell::Cell;

thread_local! {
    static GRAD_ENABLED: Cell<bool> = const { Cell::new(true) };
}

/// Whether tensor operations on the current thread are recorded into the graph.
pub fn is_grad_enabled() -> bool {
    GRAD_ENABLED.with(|flag| flag.get())
}

/// Scoped override of the grad-mode flag. The previous value is restored on drop, including
/// during unwinding.
#[must_use = "grad mode is restored as soon as the guard is dropped"]
pub struct GradModeGuard {
    prev: bool,
}

impl GradModeGuard {
    pub fn new(enabled: bool) -> Self {
        let prev = GRAD_ENABLED.with(|flag| flag.replace(enabled));
        Self { prev }
    }

    /// Disables recording until the guard is dropped.
    pub fn disabled() -> Self {
        Self::new(false)
    }
}

impl Drop for GradModeGuard {
    fn drop(&mut self) {
        GRAD_ENABLED.with(|flag| flag.set(self.prev));
    }
}

/// Runs `f` with graph recording disabled.
pub fn no_grad<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = GradModeGuard::disabled();
    f()
}
