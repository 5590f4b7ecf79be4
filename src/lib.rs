#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Event Registry
//!
//! In-process event registry: independent parts of a program register
//! interest in typed events and receive them when published, without the
//! publisher knowing its subscribers' concrete types.
//!
//! ## Overview
//!
//! - **Typed categories** with declared supertypes; dispatch is covariant, so a
//!   target registered for a category receives events of every subtype
//! - **Strong and weak targets**; weak targets expire with their last owner and
//!   are purged lazily during dispatch and removal
//! - **Thread-safe** registration, removal and dispatch behind one lock, with
//!   well-defined re-entrant calls from inside handlers
//! - **Failure isolation**: a failing or panicking handler is reported through a
//!   replaceable recovery hook and never stops delivery to other targets
//!
//! ## Module Organization
//!
//! - [`events`] - Event categories and the runtime event trait
//! - [`registry`] - Category table, dispatch engine, dispatchers and resolvers
//! - [`config`] - Configuration management
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust
//! use event_registry::registry::{EventRegistry, HandlerDispatcher};
//! use event_registry::{event_type, EventCategory};
//! use std::sync::Arc;
//!
//! struct AppEvent;
//! struct ClickEvent { x: i32 }
//! event_type!(extensible AppEvent);
//! event_type!(ClickEvent: AppEvent);
//!
//! struct Logger;
//!
//! let registry = EventRegistry::new();
//! let logger = Arc::new(Logger);
//!
//! // Registered for the base category, so it also receives ClickEvent
//! let on_any = HandlerDispatcher::dynamic("on_any", |_: &Logger, event: &dyn event_registry::Event| {
//!     if let Some(click) = event.downcast_ref::<ClickEvent>() {
//!         println!("click at {}", click.x);
//!     }
//!     Ok(())
//! });
//! registry.register(EventCategory::of::<AppEvent>(), &logger, on_any.into_shared(), false);
//!
//! assert!(registry.has_targets_for(EventCategory::of::<ClickEvent>()));
//! assert_eq!(registry.dispatch(&ClickEvent { x: 3 }).delivered, 1);
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod registry;

pub use config::RegistryConfig;
pub use error::{BoxError, DispatchError, RegistryError, Result};
pub use events::{Event, EventCategory, EventType};
pub use registry::{
    DispatchSummary, Dispatcher, EventRegistry, EventSource, HandlerDispatcher, RecoveryHook,
};
