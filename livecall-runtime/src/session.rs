//! Per-session execution context
//!
//! Every thread that produces UI output for a session must have that
//! session's context attached. The bridge captures the caller's context and
//! attaches it on the event loop while the caller's work runs there.

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

thread_local! {
    static CURRENT: RefCell<Option<SessionContext>> = const { RefCell::new(None) };
}

#[derive(Debug)]
struct SessionInner {
    id: Uuid,
    label: String,
}

/// Handle to one user session
#[derive(Debug, Clone)]
pub struct SessionContext {
    inner: Arc<SessionInner>,
}

impl SessionContext {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                id: Uuid::new_v4(),
                label: label.into(),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// The context attached to the current thread
    pub fn current() -> Option<SessionContext> {
        CURRENT.with(|current| current.borrow().clone())
    }

    /// Attach this context to the current thread until the guard drops
    pub fn attach(&self) -> SessionGuard {
        let previous = CURRENT.with(|current| current.borrow_mut().replace(self.clone()));
        SessionGuard {
            previous,
            _not_send: std::marker::PhantomData,
        }
    }

    pub fn same_session(&self, other: &SessionContext) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Display for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.inner.label, self.inner.id)
    }
}

/// Restores the previously attached context on drop
#[must_use = "the session is detached as soon as the guard is dropped"]
pub struct SessionGuard {
    previous: Option<SessionContext>,
    // Guards restore thread-local state and must drop on the thread that made them.
    _not_send: std::marker::PhantomData<*const ()>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT.with(|current| *current.borrow_mut() = previous);
    }
}

/// Attach an optional context; a `None` leaves the thread untouched
pub(crate) fn attach_optional(context: Option<&SessionContext>) -> Option<SessionGuard> {
    context.map(SessionContext::attach)
}
