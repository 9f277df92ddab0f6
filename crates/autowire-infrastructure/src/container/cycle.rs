//! Per-thread chain of services under construction

use std::cell::RefCell;

use autowire_domain::error::{Error, Result};

thread_local! {
    static CREATING: RefCell<Vec<(u64, String)>> = const { RefCell::new(Vec::new()) };
}

/// Marks a service as being created on this thread until dropped
pub(crate) struct CreatingGuard {
    _private: (),
}

impl CreatingGuard {
    /// Enter `name`, failing when it is already being created
    ///
    /// The error lists every service of this container currently being
    /// created on this thread, ending with `name` again.
    pub(crate) fn enter(container: u64, name: &str) -> Result<Self> {
        CREATING.with(|chain| {
            let mut chain = chain.borrow_mut();
            if chain.iter().any(|(id, creating)| *id == container && creating == name) {
                let mut names: Vec<String> = chain
                    .iter()
                    .filter(|(id, _)| *id == container)
                    .map(|(_, creating)| creating.clone())
                    .collect();
                names.push(name.to_string());
                return Err(Error::circular_reference(names));
            }
            chain.push((container, name.to_string()));
            Ok(Self { _private: () })
        })
    }
}

impl Drop for CreatingGuard {
    fn drop(&mut self) {
        let _ = CREATING.try_with(|chain| chain.borrow_mut().pop());
    }
}

/// Whether anything of `container` is being created on this thread
#[cfg(test)]
pub(crate) fn is_idle(container: u64) -> bool {
    CREATING.with(|chain| chain.borrow().iter().all(|(id, _)| *id != container))
}
