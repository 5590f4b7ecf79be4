//! # Event Registry
//!
//! Thread-safe mapping from event categories to interested targets, with
//! covariant dispatch and lazy cleanup of expired weak targets.
//!
//! ## Locking
//!
//! One [`ReentrantMutex`] serialises every traversal and mutation. The table
//! is created on first registration through a [`OnceLock`].
//!
//! Dispatchers run on the publishing thread while the lock is held. They may
//! call back into the registry:
//!
//! - reads (`has_targets_for`, `target_count`, `categories`, `Display`) see the
//!   table as it is at that moment;
//! - `register`, `unregister` and `clear` are queued and applied in request
//!   order once the outermost dispatch returns;
//! - a nested `dispatch` delivers normally and leaves purging of expired weak
//!   targets to the outer dispatch.
//!
//! Other threads block until the dispatch completes.
//!
//! ## Usage
//!
//! ```rust
//! use event_registry::registry::{EventRegistry, HandlerDispatcher};
//! use event_registry::{event_type, EventCategory};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! struct Click;
//! event_type!(Click);
//!
//! #[derive(Default)]
//! struct Button {
//!     clicks: AtomicUsize,
//! }
//!
//! let registry = EventRegistry::new();
//! let button = Arc::new(Button::default());
//! let on_click = HandlerDispatcher::typed("on_click", |b: &Button, _: &Click| {
//!     b.clicks.fetch_add(1, Ordering::SeqCst);
//!     Ok(())
//! });
//!
//! registry.register(EventCategory::of::<Click>(), &button, on_click.into_shared(), true);
//! registry.dispatch(&Click);
//! assert_eq!(button.clicks.load(Ordering::SeqCst), 1);
//! ```

use super::dispatcher::Dispatcher;
use super::recovery::{DispatchFailure, LogRecovery, RecoveryHook, SilentRecovery};
use super::table::{CategoryTable, Entry, PendingOp};
use super::target::{SharedTarget, TargetKey, TargetRef};
use crate::config::RegistryConfig;
use crate::error::DispatchError;
use crate::events::{Event, EventCategory};
use crate::logging::log_registry_operation;
use parking_lot::{ReentrantMutex, RwLock};
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};
use tracing::{debug, error, trace};

type Table = ReentrantMutex<RefCell<CategoryTable>>;

/// Name reported for a failing dispatcher whose `name()` panicked
const UNNAMED_DISPATCHER: &str = "<unnamed dispatcher>";

/// Lowers the dispatch depth when a dispatch ends, unwinding included, and
/// applies the queued mutations once the outermost dispatch is done.
struct DepthGuard<'a> {
    table: &'a RefCell<CategoryTable>,
    registry: &'a str,
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        let pending = {
            let mut table = self.table.borrow_mut();
            table.dispatch_depth -= 1;
            if table.dispatch_depth == 0 {
                std::mem::take(&mut table.pending)
            } else {
                Vec::new()
            }
        };
        if pending.is_empty() {
            return;
        }

        let count = pending.len();
        let mut table = self.table.borrow_mut();
        for op in pending {
            table.apply(op);
        }
        debug!(registry = %self.registry, applied = count, "Deferred registry operations applied");
    }
}

/// Outcome of one `dispatch` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Categories the event satisfied
    pub matched_categories: usize,
    /// Deliveries that returned `Ok`
    pub delivered: usize,
    /// Deliveries that returned an error or panicked
    pub failed: usize,
    /// Expired weak targets removed during the traversal
    pub purged: usize,
}

pub struct EventRegistry {
    config: RegistryConfig,
    table: OnceLock<Table>,
    recovery: RwLock<Arc<dyn RecoveryHook>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        let recovery: Arc<dyn RecoveryHook> = if config.log_failures {
            Arc::new(LogRecovery::new(config.name.clone()))
        } else {
            Arc::new(SilentRecovery)
        };

        Self {
            config,
            table: OnceLock::new(),
            recovery: RwLock::new(recovery),
        }
    }

    pub fn with_recovery_hook(self, hook: impl RecoveryHook + 'static) -> Self {
        self.set_recovery_hook(Arc::new(hook));
        self
    }

    /// Replace the hook receiving delivery failures
    pub fn set_recovery_hook(&self, hook: Arc<dyn RecoveryHook>) {
        *self.recovery.write() = hook;
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn table(&self) -> &Table {
        self.table.get_or_init(|| {
            debug!(registry = %self.config.name, "Category table initialized");
            ReentrantMutex::new(RefCell::new(CategoryTable::default()))
        })
    }

    /// Register `target` under `category`.
    ///
    /// Duplicates are kept: registering the same target twice delivers each
    /// event to it twice. A weak registration does not keep `target` alive.
    pub fn register<T: Any + Send + Sync>(
        &self,
        category: EventCategory,
        target: &Arc<T>,
        dispatcher: Arc<dyn Dispatcher>,
        strong: bool,
    ) {
        let shared: SharedTarget = target.clone();
        self.register_shared(category, shared, dispatcher, strong);
    }

    /// [`register`](Self::register) for an already type-erased target
    pub fn register_shared(
        &self,
        category: EventCategory,
        target: SharedTarget,
        dispatcher: Arc<dyn Dispatcher>,
        strong: bool,
    ) {
        let entry = Entry {
            target: TargetRef::new(target, strong),
            dispatcher,
        };
        let kind = if strong { "strong" } else { "weak" };

        let guard = self.table().lock();
        let mut table = guard.borrow_mut();
        if table.dispatch_depth > 0 {
            table.pending.push(PendingOp::Register { category, entry });
            log_registry_operation(&self.config.name, "register", Some(category.name()), "deferred", Some(kind));
            return;
        }

        table.insert(category, entry);
        log_registry_operation(&self.config.name, "register", Some(category.name()), "ok", Some(kind));
    }

    /// Remove the most recently registered entry for `target` under `category`.
    ///
    /// Expired weak entries passed over during the scan are purged as well.
    /// Returns whether an entry was removed; removals requested from inside a
    /// dispatch are deferred and report `false`.
    pub fn unregister<T>(&self, category: EventCategory, target: &Arc<T>) -> bool
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let Some(lock) = self.table.get() else {
            return false;
        };
        let key = TargetKey::of(target);

        let guard = lock.lock();
        let mut table = guard.borrow_mut();
        if table.dispatch_depth > 0 {
            table.pending.push(PendingOp::Unregister {
                category,
                key,
                _target: Box::new(Arc::clone(target)),
            });
            log_registry_operation(&self.config.name, "unregister", Some(category.name()), "deferred", None);
            return false;
        }

        let outcome = table.remove(&category, key);
        let details = format!(
            "removed={} purged={} category_dropped={}",
            outcome.removed, outcome.purged, outcome.category_dropped
        );
        log_registry_operation(&self.config.name, "unregister", Some(category.name()), "ok", Some(&details));
        outcome.removed
    }

    pub fn clear(&self) {
        let Some(lock) = self.table.get() else {
            return;
        };

        let guard = lock.lock();
        let mut table = guard.borrow_mut();
        if table.dispatch_depth > 0 {
            table.pending.push(PendingOp::Clear);
            log_registry_operation(&self.config.name, "clear", None, "deferred", None);
            return;
        }

        table.clear();
        log_registry_operation(&self.config.name, "clear", None, "ok", None);
    }

    /// True if an event of `category` would match a registered category.
    ///
    /// Does not purge, so expired weak targets may still count.
    pub fn has_targets_for(&self, category: EventCategory) -> bool {
        let Some(lock) = self.table.get() else {
            return false;
        };

        let guard = lock.lock();
        let table = guard.borrow();
        table
            .lists
            .iter()
            .any(|list| !list.entries.is_empty() && list.category.is_assignable_from(&category))
    }

    /// Deliver `event` to every live target whose category it satisfies.
    ///
    /// Categories and entries are visited newest first. Failures are handed
    /// to the recovery hook and never abort the remaining deliveries.
    pub fn dispatch(&self, event: &dyn Event) -> DispatchSummary {
        let mut summary = DispatchSummary::default();
        let Some(lock) = self.table.get() else {
            return summary;
        };

        let guard = lock.lock();
        let outermost = {
            let mut table = guard.borrow_mut();
            if table.lists.is_empty() && table.dispatch_depth == 0 {
                return summary;
            }
            table.dispatch_depth += 1;
            table.dispatch_depth == 1
        };
        let _depth = DepthGuard {
            table: &*guard,
            registry: &self.config.name,
        };

        let hook = Arc::clone(&*self.recovery.read());
        let event_category = event.category();

        // Indices stay valid: only this loop removes while the depth is raised
        let mut i = guard.borrow().lists.len();
        while i > 0 {
            i -= 1;
            let category = guard.borrow().lists[i].category;
            if !self.category_matches(&category, &event_category) {
                continue;
            }
            summary.matched_categories += 1;

            let mut j = guard.borrow().lists[i].entries.len();
            while j > 0 {
                j -= 1;
                let resolved = {
                    let mut table = guard.borrow_mut();
                    let entries = &mut table.lists[i].entries;
                    match entries[j].target.get() {
                        Some(target) => Ok((target, Arc::clone(&entries[j].dispatcher))),
                        None if outermost => Err(Some(entries.remove(j))),
                        None => Err(None),
                    }
                };
                let (target, dispatcher) = match resolved {
                    Ok(live) => live,
                    Err(expired) => {
                        if let Some(entry) = expired {
                            summary.purged += 1;
                            self.release(entry);
                        }
                        continue;
                    }
                };

                let result = catch_unwind(AssertUnwindSafe(|| dispatcher.dispatch(event, &*target)))
                    .unwrap_or_else(|payload| Err(DispatchError::from_panic(payload.as_ref())));
                match result {
                    Ok(()) => summary.delivered += 1,
                    Err(error) => {
                        summary.failed += 1;
                        let name = catch_unwind(AssertUnwindSafe(|| dispatcher.name().to_string()))
                            .unwrap_or_else(|_| UNNAMED_DISPATCHER.to_string());
                        self.recover(
                            hook.as_ref(),
                            DispatchFailure {
                                event,
                                category,
                                target: &*target,
                                dispatcher: name.as_str(),
                                error,
                            },
                        );
                    }
                }
                self.release((target, dispatcher));
            }

            if outermost {
                let mut table = guard.borrow_mut();
                if table.lists[i].entries.is_empty() {
                    table.lists.remove(i);
                    log_registry_operation(&self.config.name, "purge", Some(category.name()), "ok", Some("category emptied"));
                }
            }
        }

        trace!(
            registry = %self.config.name,
            event = %event_category.name(),
            matched = summary.matched_categories,
            delivered = summary.delivered,
            failed = summary.failed,
            purged = summary.purged,
            "Event dispatched"
        );
        summary
    }

    /// Covariant match; a category whose supertype declaration panics matches nothing
    fn category_matches(&self, category: &EventCategory, event_category: &EventCategory) -> bool {
        catch_unwind(AssertUnwindSafe(|| category.is_assignable_from(event_category))).unwrap_or_else(|_| {
            error!(
                registry = %self.config.name,
                category = %category.name(),
                event = %event_category.name(),
                "Supertype lookup panicked; category skipped"
            );
            false
        })
    }

    fn recover(&self, hook: &dyn RecoveryHook, failure: DispatchFailure<'_>) {
        let dispatcher = failure.dispatcher.to_string();
        if catch_unwind(AssertUnwindSafe(|| hook.handle_dispatch_error(failure))).is_err() {
            error!(
                registry = %self.config.name,
                dispatcher = %dispatcher,
                "Recovery hook panicked while handling a dispatch failure"
            );
        }
    }

    /// Drop references held during delivery; listener destructors may panic
    fn release<T>(&self, value: T) {
        if catch_unwind(AssertUnwindSafe(move || drop(value))).is_err() {
            error!(
                registry = %self.config.name,
                "Destructor panicked while releasing a dispatch target"
            );
        }
    }

    /// Registered categories in insertion order
    pub fn categories(&self) -> Vec<EventCategory> {
        let Some(lock) = self.table.get() else {
            return Vec::new();
        };
        let guard = lock.lock();
        let table = guard.borrow();
        table.lists.iter().map(|list| list.category).collect()
    }

    pub fn category_count(&self) -> usize {
        self.table
            .get()
            .map(|lock| lock.lock().borrow().lists.len())
            .unwrap_or(0)
    }

    /// Entries registered under exactly `category`, expired weak ones included
    pub fn target_count(&self, category: EventCategory) -> usize {
        let Some(lock) = self.table.get() else {
            return 0;
        };
        let guard = lock.lock();
        let table = guard.borrow();
        table
            .position(&category)
            .map(|idx| table.lists[idx].entries.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.category_count() == 0
    }

    /// Summary such as `[Click: 1 target, Event: 2 targets]`
    pub fn targets_to_string(&self) -> String {
        let Some(lock) = self.table.get() else {
            return "[no event targets]".to_string();
        };
        let guard = lock.lock();
        let table = guard.borrow();

        let parts: Vec<String> = table
            .lists
            .iter()
            .filter(|list| !list.entries.is_empty())
            .map(|list| {
                let n = list.entries.len();
                let noun = if n == 1 { "target" } else { "targets" };
                format!("{}: {n} {noun}", list.category)
            })
            .collect();

        if parts.is_empty() {
            "[no event targets]".to_string()
        } else {
            format!("[{}]", parts.join(", "))
        }
    }
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.targets_to_string())
    }
}

impl fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRegistry")
            .field("name", &self.config.name)
            .field("targets", &self.targets_to_string())
            .finish()
    }
}
