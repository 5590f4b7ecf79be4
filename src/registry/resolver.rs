//! # Resolvers
//!
//! Registration-time collaborators that turn declarative data into the
//! `(category, dispatcher)` pair the registry stores. Both are explicit tables
//! filled by the application; nothing is discovered by introspection.
//!
//! - [`CategoryResolver`]: listener type -> event category
//!   ([`NamingConvention`], [`ListenerTable`])
//! - [`HandlerResolver`]: (target type, handler name, category) -> dispatcher
//!   ([`HandlerTable`])

use super::dispatcher::{Dispatcher, HandlerDispatcher};
use crate::error::BoxError;
use crate::events::category::short_type_name;
use crate::events::{Event, EventCategory, EventType};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

const LISTENER_SUFFIX: &str = "Listener";
const EVENT_SUFFIX: &str = "Event";

/// Type of a listener being registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerType {
    id: TypeId,
    name: &'static str,
}

impl ListenerType {
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

pub trait CategoryResolver: Send + Sync {
    fn resolve_category(&self, listener: &ListenerType) -> Option<EventCategory>;
}

/// Derives `FooEvent` from a listener named `FooListener`.
///
/// Only categories made known to the convention can be found.
#[derive(Debug, Clone, Default)]
pub struct NamingConvention {
    known: Vec<EventCategory>,
}

impl NamingConvention {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<E: EventType>(mut self) -> Self {
        self.add(EventCategory::of::<E>());
        self
    }

    pub fn add(&mut self, category: EventCategory) {
        if !self.known.contains(&category) {
            self.known.push(category);
        }
    }

    /// `app::ClickListener` -> `app::ClickEvent`
    pub fn event_name_for(listener_name: &str) -> Option<String> {
        listener_name
            .strip_suffix(LISTENER_SUFFIX)
            .map(|stem| format!("{stem}{EVENT_SUFFIX}"))
    }
}

impl CategoryResolver for NamingConvention {
    fn resolve_category(&self, listener: &ListenerType) -> Option<EventCategory> {
        let wanted = Self::event_name_for(listener.name())?;

        if let Some(category) = self.known.iter().find(|c| c.name() == wanted) {
            return Some(*category);
        }

        // Fall back to the bare type name when it is unambiguous
        let short = Self::event_name_for(short_type_name(listener.name()))?;
        let mut candidates = self.known.iter().filter(|c| c.short_name() == short);
        match (candidates.next(), candidates.next()) {
            (Some(category), None) => Some(*category),
            _ => None,
        }
    }
}

/// Explicit listener type -> category bindings
#[derive(Debug, Clone, Default)]
pub struct ListenerTable {
    bindings: HashMap<TypeId, EventCategory>,
}

impl ListenerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind<L: Any, E: EventType>(mut self) -> Self {
        self.insert(ListenerType::of::<L>(), EventCategory::of::<E>());
        self
    }

    pub fn insert(&mut self, listener: ListenerType, category: EventCategory) {
        self.bindings.insert(listener.id(), category);
    }
}

impl CategoryResolver for ListenerTable {
    fn resolve_category(&self, listener: &ListenerType) -> Option<EventCategory> {
        self.bindings.get(&listener.id()).copied()
    }
}

pub trait HandlerResolver: Send + Sync {
    /// Dispatcher for the handler `method` of `target` able to receive `category`
    fn resolve_handler(
        &self,
        target: &ListenerType,
        method: &str,
        category: &EventCategory,
    ) -> Option<Arc<dyn Dispatcher>>;
}

struct HandlerEntry {
    target: TypeId,
    dispatcher: Arc<HandlerDispatcher>,
}

/// Named handlers per target type.
///
/// One name may be bound several times for different event types; the first
/// registration compatible with the requested category wins. Typed handlers
/// never match an extensible category.
#[derive(Default)]
pub struct HandlerTable {
    handlers: Vec<HandlerEntry>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn typed<T, E, F>(mut self, method: &str, handler: F) -> Self
    where
        T: Any + Send + Sync,
        E: EventType,
        F: Fn(&T, &E) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.insert::<T>(HandlerDispatcher::typed(method, handler));
        self
    }

    pub fn dynamic<T, F>(mut self, method: &str, handler: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T, &dyn Event) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.insert::<T>(HandlerDispatcher::dynamic(method, handler));
        self
    }

    pub fn without_event<T, F>(mut self, method: &str, handler: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.insert::<T>(HandlerDispatcher::without_event(method, handler));
        self
    }

    /// Add a handler for targets of type `T`, named after the dispatcher
    pub fn insert<T: Any>(&mut self, dispatcher: HandlerDispatcher) {
        debug!(
            target_type = %std::any::type_name::<T>(),
            method = %dispatcher.name(),
            "Handler added"
        );
        self.handlers.push(HandlerEntry {
            target: TypeId::of::<T>(),
            dispatcher: Arc::new(dispatcher),
        });
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl HandlerResolver for HandlerTable {
    fn resolve_handler(
        &self,
        target: &ListenerType,
        method: &str,
        category: &EventCategory,
    ) -> Option<Arc<dyn Dispatcher>> {
        self.handlers
            .iter()
            .find(|entry| {
                entry.target == target.id()
                    && entry.dispatcher.name() == method
                    && entry.dispatcher.is_compatible_with(category)
            })
            .map(|entry| Arc::clone(&entry.dispatcher) as Arc<dyn Dispatcher>)
    }
}
