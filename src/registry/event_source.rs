//! # Event Source
//!
//! Convenience registration surface over an [`EventRegistry`]. Categories can
//! be inferred from the listener type and handlers looked up by name; both
//! are answered by the configured resolvers, and a failed lookup is returned
//! to the caller as a [`RegistryError`].
//!
//! ```rust
//! use event_registry::registry::{EventRegistry, EventSource, HandlerTable, NamingConvention};
//! use event_registry::event_type;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! struct SaveEvent;
//! event_type!(SaveEvent);
//!
//! #[derive(Default)]
//! struct SaveListener {
//!     saves: AtomicUsize,
//! }
//!
//! let handlers = HandlerTable::new().typed("on_save", |l: &SaveListener, _: &SaveEvent| {
//!     l.saves.fetch_add(1, Ordering::SeqCst);
//!     Ok(())
//! });
//! let source = EventSource::new(EventRegistry::new(), handlers)
//!     .with_category_resolver(NamingConvention::new().with::<SaveEvent>());
//!
//! let listener = Arc::new(SaveListener::default());
//! source.add_listener(&listener, "on_save")?;
//! source.dispatch_event(&SaveEvent);
//! assert_eq!(listener.saves.load(Ordering::SeqCst), 1);
//! # Ok::<(), event_registry::RegistryError>(())
//! ```

use super::dispatcher::Dispatcher;
use super::event_registry::{DispatchSummary, EventRegistry};
use super::resolver::{CategoryResolver, HandlerResolver, ListenerType};
use crate::error::{RegistryError, Result};
use crate::events::{Event, EventCategory};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

pub struct EventSource {
    registry: EventRegistry,
    category_resolvers: Vec<Arc<dyn CategoryResolver>>,
    handlers: Arc<dyn HandlerResolver>,
}

impl EventSource {
    pub fn new(registry: EventRegistry, handlers: impl HandlerResolver + 'static) -> Self {
        Self {
            registry,
            category_resolvers: Vec::new(),
            handlers: Arc::new(handlers),
        }
    }

    /// Add a resolver consulted, in insertion order, when inferring categories
    pub fn with_category_resolver(mut self, resolver: impl CategoryResolver + 'static) -> Self {
        self.category_resolvers.push(Arc::new(resolver));
        self
    }

    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }

    fn infer_category<T: Any>(&self) -> Result<EventCategory> {
        let listener = ListenerType::of::<T>();
        self.category_resolvers
            .iter()
            .find_map(|resolver| resolver.resolve_category(&listener))
            .ok_or(RegistryError::NoEventCategory {
                listener: listener.name(),
            })
    }

    fn resolve_handler<T: Any>(
        &self,
        category: &EventCategory,
        method: &str,
    ) -> Result<Arc<dyn Dispatcher>> {
        let target = ListenerType::of::<T>();
        self.handlers
            .resolve_handler(&target, method, category)
            .ok_or_else(|| RegistryError::NoHandler {
                method: method.to_string(),
                target: target.name(),
                category: category.name(),
            })
    }

    fn attach<T: Any + Send + Sync>(
        &self,
        category: EventCategory,
        target: &Arc<T>,
        method: &str,
        strong: bool,
    ) -> Result<()> {
        let dispatcher = self.resolve_handler::<T>(&category, method)?;
        self.registry.register(category, target, dispatcher, strong);
        Ok(())
    }

    /// Infer the category from the listener type and bind the named handler
    pub fn add_listener<T: Any + Send + Sync>(&self, target: &Arc<T>, method: &str) -> Result<()> {
        let category = self.infer_category::<T>()?;
        self.attach(category, target, method, true)
    }

    pub fn add_weak_listener<T: Any + Send + Sync>(
        &self,
        target: &Arc<T>,
        method: &str,
    ) -> Result<()> {
        let category = self.infer_category::<T>()?;
        self.attach(category, target, method, false)
    }

    pub fn add_listener_dispatcher<T: Any + Send + Sync>(
        &self,
        target: &Arc<T>,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Result<()> {
        let category = self.infer_category::<T>()?;
        self.registry.register(category, target, dispatcher, true);
        Ok(())
    }

    pub fn add_weak_listener_dispatcher<T: Any + Send + Sync>(
        &self,
        target: &Arc<T>,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Result<()> {
        let category = self.infer_category::<T>()?;
        self.registry.register(category, target, dispatcher, false);
        Ok(())
    }

    /// Register under `category` with the configured default handler name
    pub fn add_target<T: Any + Send + Sync>(
        &self,
        category: EventCategory,
        target: &Arc<T>,
    ) -> Result<()> {
        let method = self.registry.config().default_handler.clone();
        self.attach(category, target, &method, true)
    }

    pub fn add_weak_target<T: Any + Send + Sync>(
        &self,
        category: EventCategory,
        target: &Arc<T>,
    ) -> Result<()> {
        let method = self.registry.config().default_handler.clone();
        self.attach(category, target, &method, false)
    }

    pub fn add_target_method<T: Any + Send + Sync>(
        &self,
        category: EventCategory,
        target: &Arc<T>,
        method: &str,
    ) -> Result<()> {
        self.attach(category, target, method, true)
    }

    pub fn add_weak_target_method<T: Any + Send + Sync>(
        &self,
        category: EventCategory,
        target: &Arc<T>,
        method: &str,
    ) -> Result<()> {
        self.attach(category, target, method, false)
    }

    pub fn add_event_target<T: Any + Send + Sync>(
        &self,
        category: EventCategory,
        target: &Arc<T>,
        dispatcher: Arc<dyn Dispatcher>,
        strong: bool,
    ) {
        self.registry.register(category, target, dispatcher, strong);
    }

    /// Remove `target` from the category inferred from its type
    pub fn remove_listener<T: Any + Send + Sync>(&self, target: &Arc<T>) -> Result<bool> {
        let category = self.infer_category::<T>()?;
        Ok(self.registry.unregister(category, target))
    }

    pub fn remove_event_target<T>(&self, category: EventCategory, target: &Arc<T>) -> bool
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.registry.unregister(category, target)
    }

    pub fn clear_event_targets(&self) {
        self.registry.clear();
    }

    pub fn has_event_targets_for(&self, category: EventCategory) -> bool {
        self.registry.has_targets_for(category)
    }

    pub fn dispatch_event(&self, event: &dyn Event) -> DispatchSummary {
        self.registry.dispatch(event)
    }
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.registry.config().name, self.registry)
    }
}
