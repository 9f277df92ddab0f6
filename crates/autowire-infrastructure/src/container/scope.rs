//! Temporary service overrides
//!
//! ```text
//! enter:  check bindings ─► push overlay (this thread, this container)
//! get:    overlay ─► shared instances ─► build (into the overlay while scoped)
//! drop:   pop overlay
//! ```
//!
//! Overlays live in a thread-local stack, so a scope is only seen by the
//! thread running it. Other threads and the shared instance cache are
//! never touched. Threads spawned inside a scope do not see it.
//!
//! Popping happens in `Drop`, so it runs when the scoped closure returns,
//! fails or panics.

use std::cell::RefCell;
use std::collections::BTreeMap;

use autowire_domain::Instance;
use autowire_domain::error::Result;
use tracing::debug;

use crate::container::{Container, ServiceSource};

struct Overlay {
    container: u64,
    services: BTreeMap<String, ServiceSource>,
}

thread_local! {
    static SCOPES: RefCell<Vec<Overlay>> = const { RefCell::new(Vec::new()) };
}

/// Pops its overlay when dropped
pub(crate) struct ScopeGuard {
    _private: (),
}

impl ScopeGuard {
    /// Push an overlay with `bindings` for the current thread
    ///
    /// Every binding is checked before anything becomes visible.
    pub(crate) fn enter(container: &Container, bindings: Vec<(String, ServiceSource)>) -> Result<Self> {
        let mut services = BTreeMap::new();
        for (name, source) in bindings {
            if let ServiceSource::Instance(instance) = &source {
                container.check_type(&name, instance)?;
            }
            debug!(service = %name, "Scoped binding applied");
            services.insert(name, source);
        }

        SCOPES.with(|scopes| {
            scopes.borrow_mut().push(Overlay {
                container: container.id(),
                services,
            });
        });
        Ok(Self { _private: () })
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        let _ = SCOPES.try_with(|scopes| scopes.borrow_mut().pop());
        debug!("Scope restored");
    }
}

/// Whether a scope of `container` is active on this thread
pub(crate) fn is_active(container: u64) -> bool {
    SCOPES.with(|scopes| scopes.borrow().iter().any(|overlay| overlay.container == container))
}

/// The innermost scoped entry for `name`, built or not
pub(crate) fn lookup(container: u64, name: &str) -> Option<ServiceSource> {
    SCOPES.with(|scopes| {
        scopes
            .borrow()
            .iter()
            .rev()
            .filter(|overlay| overlay.container == container)
            .find_map(|overlay| overlay.services.get(name).cloned())
    })
}

/// The scoped instance of `name`, when one was bound or built
pub(crate) fn instance(container: u64, name: &str) -> Option<Instance> {
    match lookup(container, name) {
        Some(ServiceSource::Instance(instance)) => Some(instance),
        _ => None,
    }
}

/// Keep `instance` in the innermost scope of `container` on this thread
pub(crate) fn store(container: u64, name: &str, instance: Instance) {
    SCOPES.with(|scopes| {
        let mut scopes = scopes.borrow_mut();
        if let Some(overlay) = scopes.iter_mut().rev().find(|overlay| overlay.container == container) {
            overlay
                .services
                .insert(name.to_string(), ServiceSource::Instance(instance));
        }
    });
}

/// Names bound or built in the scopes of `container` on this thread
pub(crate) fn names(container: u64) -> Vec<String> {
    SCOPES.with(|scopes| {
        scopes
            .borrow()
            .iter()
            .filter(|overlay| overlay.container == container)
            .flat_map(|overlay| overlay.services.keys().cloned())
            .collect()
    })
}
