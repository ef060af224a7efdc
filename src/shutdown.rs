//! Best-effort cleanup on exit and on panic.
//!
//! Components register a hook when they start (stop the gamepad poller,
//! cancel a running capture, flush the configuration). The hooks run once,
//! either from the normal exit path in `main` or from the panic hook.

use std::panic;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use tracing::{debug, error, warn};

type Hook = Box<dyn FnOnce() + Send>;

#[derive(Clone, Default)]
pub struct ShutdownHooks {
    hooks: Arc<Mutex<Vec<(String, Hook)>>>,
}

impl ShutdownHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: impl Into<String>, hook: impl FnOnce() + Send + 'static) {
        let name = name.into();
        debug!("Registered shutdown hook {}", name);
        self.hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((name, Box::new(hook)));
    }

    /// Runs every registered hook in registration order. Later calls are
    /// no-ops.
    pub fn run_all(&self) {
        let hooks = std::mem::take(&mut *self.hooks.lock().unwrap_or_else(PoisonError::into_inner));
        for (name, hook) in hooks {
            debug!("Running shutdown hook {}", name);
            hook();
        }
    }

    pub fn len(&self) -> usize {
        self.hooks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ShutdownHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownHooks")
            .field("pending", &self.len())
            .finish()
    }
}

/// Chains a hook in front of the current panic hook. Call from the main
/// thread after `color_eyre::install` so its report is still printed.
///
/// Only a panic on the installing thread ends the process, so only that one
/// runs the shutdown hooks. Panics in worker threads and tasks are logged and
/// leave the hooks registered.
pub fn install_panic_hook(hooks: ShutdownHooks) {
    let owner = thread::current().id();
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        error!("Panic: {}", info);
        let current = thread::current();
        if current.id() == owner {
            hooks.run_all();
        } else {
            warn!(
                "Panic on thread {}, shutdown hooks kept",
                current.name().unwrap_or("<unnamed>")
            );
        }
        previous(info);
    }));
}
