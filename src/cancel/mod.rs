//! One-shot cancellation token
//!
//! The token fires at most once. Hooks registered before it fires run on
//! the firing thread; a hook registered after it fired runs immediately.
//! Dropping the [`HookGuard`] returned by [`CancelToken::on_cancel`]
//! unregisters a hook that hasn't run yet.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

type Hook = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct Inner {
    fired: AtomicBool,
    next_id: AtomicU64,
    hooks: Mutex<Vec<(u64, Hook)>>,
}

/// Shared, cloneable cancellation token
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the token has fired
    pub fn is_cancelled(&self) -> bool {
        self.inner.fired.load(Ordering::SeqCst)
    }

    /// Fire the token and run every registered hook.
    ///
    /// Returns true for the call that actually fired it; later calls are
    /// no-ops and return false.
    pub fn cancel(&self) -> bool {
        if self.inner.fired.swap(true, Ordering::SeqCst) {
            return false;
        }

        let hooks = match self.inner.hooks.lock() {
            Ok(mut hooks) => std::mem::take(&mut *hooks),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        for (_, hook) in hooks {
            hook();
        }
        true
    }

    /// Register a hook to run when the token fires.
    pub fn on_cancel<F>(&self, hook: F) -> HookGuard
    where
        F: FnOnce() + Send + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        {
            let mut hooks = match self.inner.hooks.lock() {
                Ok(hooks) => hooks,
                Err(poisoned) => poisoned.into_inner(),
            };
            if !self.is_cancelled() {
                hooks.push((id, Box::new(hook)));
                return HookGuard {
                    token: Some(self.clone()),
                    id,
                };
            }
        }

        hook();
        HookGuard { token: None, id }
    }

    fn remove_hook(&self, id: u64) {
        if let Ok(mut hooks) = self.inner.hooks.lock() {
            hooks.retain(|(hook_id, _)| *hook_id != id);
        }
    }

    /// Number of hooks waiting for the token to fire
    pub fn pending_hooks(&self) -> usize {
        self.inner.hooks.lock().map(|h| h.len()).unwrap_or_default()
    }
}

/// Unregisters its hook when dropped
#[must_use = "dropping the guard unregisters the hook"]
pub struct HookGuard {
    token: Option<CancelToken>,
    id: u64,
}

impl Drop for HookGuard {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            token.remove_hook(self.id);
        }
    }
}
