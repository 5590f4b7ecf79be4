//! # Target References
//!
//! Ownership wrapper around a registered listener. A strong reference shares
//! ownership of the listener with the registrant; a weak reference does not
//! keep it alive and stops resolving once every strong owner is gone.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

/// Type-erased listener object as stored by the registry
pub type SharedTarget = Arc<dyn Any + Send + Sync>;

/// Identity of a target: the address of its allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetKey(usize);

impl TargetKey {
    pub fn of<T: ?Sized>(target: &Arc<T>) -> Self {
        Self(Arc::as_ptr(target).cast::<()>() as usize)
    }
}

pub enum TargetRef {
    Strong(SharedTarget),
    Weak(Weak<dyn Any + Send + Sync>),
}

impl TargetRef {
    pub fn new(target: SharedTarget, strong: bool) -> Self {
        if strong {
            TargetRef::Strong(target)
        } else {
            TargetRef::Weak(Arc::downgrade(&target))
        }
    }

    /// Resolve the reference, `None` once a weak target has been dropped
    pub fn get(&self) -> Option<SharedTarget> {
        match self {
            TargetRef::Strong(target) => Some(Arc::clone(target)),
            TargetRef::Weak(target) => target.upgrade(),
        }
    }

    pub fn is_available(&self) -> bool {
        match self {
            TargetRef::Strong(_) => true,
            TargetRef::Weak(target) => target.strong_count() > 0,
        }
    }

    pub fn is_weak(&self) -> bool {
        matches!(self, TargetRef::Weak(_))
    }

    /// Key of the resolved object, `None` if it is unavailable
    pub fn resolved_key(&self) -> Option<TargetKey> {
        self.get().map(|target| TargetKey::of(&target))
    }
}

impl fmt::Debug for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetRef::Strong(target) => f.debug_tuple("Strong").field(&TargetKey::of(target)).finish(),
            TargetRef::Weak(_) if !self.is_available() => f.write_str("Weak(<unavailable>)"),
            TargetRef::Weak(target) => f
                .debug_tuple("Weak")
                .field(&TargetKey(target.as_ptr().cast::<()>() as usize))
                .finish(),
        }
    }
}
