//! # Recovery Hooks
//!
//! Delivery failures never leave `dispatch`; they are handed to a
//! [`RecoveryHook`] and delivery continues with the next target.

use crate::error::DispatchError;
use crate::events::{Event, EventCategory};
use std::any::Any;
use tracing::error;

/// One failed delivery
pub struct DispatchFailure<'a> {
    pub event: &'a dyn Event,
    /// Category the failing entry was registered under
    pub category: EventCategory,
    pub target: &'a (dyn Any + Send + Sync),
    pub dispatcher: &'a str,
    pub error: DispatchError,
}

pub trait RecoveryHook: Send + Sync {
    fn handle_dispatch_error(&self, failure: DispatchFailure<'_>);
}

impl<F> RecoveryHook for F
where
    F: Fn(DispatchFailure<'_>) + Send + Sync,
{
    fn handle_dispatch_error(&self, failure: DispatchFailure<'_>) {
        self(failure)
    }
}

/// Reports failures through `tracing`
#[derive(Debug, Clone, Default)]
pub struct LogRecovery {
    registry: String,
}

impl LogRecovery {
    pub fn new(registry: impl Into<String>) -> Self {
        Self {
            registry: registry.into(),
        }
    }
}

impl RecoveryHook for LogRecovery {
    fn handle_dispatch_error(&self, failure: DispatchFailure<'_>) {
        error!(
            registry = %self.registry,
            event = %failure.event.category().name(),
            category = %failure.category,
            dispatcher = %failure.dispatcher,
            error = %failure.error,
            "Event dispatch failed"
        );
    }
}

/// Discards failures
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentRecovery;

impl RecoveryHook for SilentRecovery {
    fn handle_dispatch_error(&self, _failure: DispatchFailure<'_>) {}
}
