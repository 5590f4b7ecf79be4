//! # Dispatchers
//!
//! A [`Dispatcher`] delivers one event to one target. The registry never
//! needs to know how a dispatcher was produced; [`HandlerDispatcher`] is the
//! default implementation, bound to a handler resolved at registration time.

use crate::error::{BoxError, DispatchError};
use crate::events::{Event, EventCategory, EventType};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Delivers an event to a target
pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, event: &dyn Event, target: &(dyn Any + Send + Sync))
        -> Result<(), DispatchError>;

    /// Name used in diagnostics
    fn name(&self) -> &str {
        "dispatcher"
    }
}

impl<F> Dispatcher for F
where
    F: Fn(&dyn Event, &(dyn Any + Send + Sync)) -> Result<(), DispatchError> + Send + Sync,
{
    fn dispatch(
        &self,
        event: &dyn Event,
        target: &(dyn Any + Send + Sync),
    ) -> Result<(), DispatchError> {
        self(event, target)
    }
}

type EventHandler =
    dyn Fn(&(dyn Any + Send + Sync), &dyn Event) -> Result<(), DispatchError> + Send + Sync;
type BareHandler = dyn Fn(&(dyn Any + Send + Sync)) -> Result<(), DispatchError> + Send + Sync;

enum Handler {
    WithEvent(Box<EventHandler>),
    WithoutEvent(Box<BareHandler>),
}

/// Dispatcher bound to a fixed handler
pub struct HandlerDispatcher {
    name: String,
    /// Event parameter category, `None` for handlers taking any event or none
    accepts: Option<EventCategory>,
    handler: Handler,
}

impl HandlerDispatcher {
    /// Handler receiving the target and the event as concrete types.
    ///
    /// Events whose concrete type is not `E` are rejected with
    /// [`DispatchError::EventMismatch`]. Use [`dynamic`](Self::dynamic) for
    /// extensible categories, whose events may be of any subtype.
    pub fn typed<T, E, F>(name: impl Into<String>, handler: F) -> Self
    where
        T: Any + Send + Sync,
        E: EventType,
        F: Fn(&T, &E) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let name = name.into();
        let handler_name = name.clone();
        let invoke = move |target: &(dyn Any + Send + Sync),
                           event: &dyn Event|
              -> Result<(), DispatchError> {
            let target = downcast_target::<T>(target)?;
            let typed = event
                .downcast_ref::<E>()
                .ok_or_else(|| DispatchError::EventMismatch {
                    expected: std::any::type_name::<E>(),
                    actual: event.category().name(),
                })?;
            handler(target, typed).map_err(|e| unwrap_handler_error(&handler_name, e))
        };

        Self {
            name,
            accepts: Some(EventCategory::of::<E>()),
            handler: Handler::WithEvent(Box::new(invoke)),
        }
    }

    /// Handler receiving the target and the event through `dyn Event`
    pub fn dynamic<T, F>(name: impl Into<String>, handler: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T, &dyn Event) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let name = name.into();
        let handler_name = name.clone();
        let invoke = move |target: &(dyn Any + Send + Sync),
                           event: &dyn Event|
              -> Result<(), DispatchError> {
            let target = downcast_target::<T>(target)?;
            handler(target, event).map_err(|e| unwrap_handler_error(&handler_name, e))
        };

        Self {
            name,
            accepts: None,
            handler: Handler::WithEvent(Box::new(invoke)),
        }
    }

    /// Handler that ignores the event and only receives the target
    pub fn without_event<T, F>(name: impl Into<String>, handler: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let name = name.into();
        let handler_name = name.clone();
        let invoke = move |target: &(dyn Any + Send + Sync)| -> Result<(), DispatchError> {
            let target = downcast_target::<T>(target)?;
            handler(target).map_err(|e| unwrap_handler_error(&handler_name, e))
        };

        Self {
            name,
            accepts: None,
            handler: Handler::WithoutEvent(Box::new(invoke)),
        }
    }

    pub fn uses_event(&self) -> bool {
        matches!(self.handler, Handler::WithEvent(_))
    }

    /// Category of the event parameter for typed handlers
    pub fn accepts(&self) -> Option<EventCategory> {
        self.accepts
    }

    /// Whether the handler can receive every event delivered under `category`.
    ///
    /// A typed handler only fits its own category, and only when no subtype
    /// can be declared for it.
    pub fn is_compatible_with(&self, category: &EventCategory) -> bool {
        match &self.accepts {
            Some(accepted) => accepted == category && !category.is_extensible(),
            None => true,
        }
    }

    pub fn into_shared(self) -> Arc<dyn Dispatcher> {
        Arc::new(self)
    }
}

impl Dispatcher for HandlerDispatcher {
    fn dispatch(
        &self,
        event: &dyn Event,
        target: &(dyn Any + Send + Sync),
    ) -> Result<(), DispatchError> {
        match &self.handler {
            Handler::WithEvent(handler) => handler(target, event),
            Handler::WithoutEvent(handler) => handler(target),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for HandlerDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDispatcher")
            .field("name", &self.name)
            .field("accepts", &self.accepts)
            .field("uses_event", &self.uses_event())
            .finish()
    }
}

fn downcast_target<T: Any>(target: &(dyn Any + Send + Sync)) -> Result<&T, DispatchError> {
    target
        .downcast_ref::<T>()
        .ok_or(DispatchError::TargetMismatch {
            expected: std::any::type_name::<T>(),
        })
}

/// A handler that already produced a `DispatchError` is passed through
/// instead of being wrapped a second time.
fn unwrap_handler_error(handler: &str, err: BoxError) -> DispatchError {
    match err.downcast::<DispatchError>() {
        Ok(inner) => *inner,
        Err(source) => DispatchError::Handler {
            handler: handler.to_string(),
            source,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Ping(u32);
    struct Pong;
    struct Signal;
    crate::event_type!(Ping);
    crate::event_type!(Pong);
    crate::event_type!(extensible Signal);

    #[derive(Default)]
    struct Counter {
        total: AtomicUsize,
    }

    #[test]
    fn test_typed_handler_receives_event() {
        let dispatcher = HandlerDispatcher::typed("on_ping", |c: &Counter, e: &Ping| {
            c.total.fetch_add(e.0 as usize, Ordering::SeqCst);
            Ok(())
        });
        let counter = Counter::default();

        assert!(dispatcher.uses_event());
        dispatcher.dispatch(&Ping(5), &counter).unwrap();
        assert_eq!(counter.total.load(Ordering::SeqCst), 5);
        assert_eq!(dispatcher.name(), "on_ping");
    }

    #[test]
    fn test_handler_without_event() {
        let dispatcher = HandlerDispatcher::without_event("reset", |c: &Counter| {
            c.total.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        let counter = Counter::default();

        assert!(!dispatcher.uses_event());
        dispatcher.dispatch(&Pong, &counter).unwrap();
        dispatcher.dispatch(&Ping(9), &counter).unwrap();
        assert_eq!(counter.total.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_mismatched_target_and_event() {
        let dispatcher = HandlerDispatcher::typed("on_ping", |_: &Counter, _: &Ping| Ok(()));

        let err = dispatcher.dispatch(&Ping(1), &"not a counter").unwrap_err();
        assert!(matches!(err, DispatchError::TargetMismatch { .. }));

        let err = dispatcher.dispatch(&Pong, &Counter::default()).unwrap_err();
        assert!(matches!(err, DispatchError::EventMismatch { .. }));
    }

    #[test]
    fn test_handler_errors_are_wrapped_once() {
        let failing = HandlerDispatcher::dynamic("fail", |_: &Counter, _: &dyn Event| {
            Err(anyhow::anyhow!("boom").into())
        });
        match failing.dispatch(&Pong, &Counter::default()).unwrap_err() {
            DispatchError::Handler { handler, source } => {
                assert_eq!(handler, "fail");
                assert_eq!(source.to_string(), "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let nested = HandlerDispatcher::dynamic("nested", |_: &Counter, _: &dyn Event| {
            Err(Box::new(DispatchError::Panicked {
                message: "inner".to_string(),
            }) as BoxError)
        });
        assert!(matches!(
            nested.dispatch(&Pong, &Counter::default()).unwrap_err(),
            DispatchError::Panicked { .. }
        ));
    }

    #[test]
    fn test_compatibility() {
        let typed = HandlerDispatcher::typed("on_ping", |_: &Counter, _: &Ping| Ok(()));
        assert!(typed.is_compatible_with(&EventCategory::of::<Ping>()));
        assert!(!typed.is_compatible_with(&EventCategory::of::<Pong>()));

        // Subtypes of Signal could never reach a handler typed on Signal itself
        let abstract_typed = HandlerDispatcher::typed("on_signal", |_: &Counter, _: &Signal| Ok(()));
        assert!(!abstract_typed.is_compatible_with(&EventCategory::of::<Signal>()));

        let dynamic = HandlerDispatcher::dynamic("any", |_: &Counter, _: &dyn Event| Ok(()));
        assert!(dynamic.is_compatible_with(&EventCategory::of::<Pong>()));
        assert!(dynamic.is_compatible_with(&EventCategory::of::<Signal>()));
    }

    #[test]
    fn test_closure_dispatcher() {
        let dispatcher = |event: &dyn Event,
                          _target: &(dyn Any + Send + Sync)|
         -> Result<(), DispatchError> {
            assert!(event.is::<Pong>());
            Ok(())
        };
        dispatcher.dispatch(&Pong, &Counter::default()).unwrap();
        assert_eq!(Dispatcher::name(&dispatcher), "dispatcher");
    }
}
