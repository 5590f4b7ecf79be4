//! # Registry Infrastructure
//!
//! Category table, dispatch engine and the collaborators around it.
//!
//! ## Architecture
//!
//! ```text
//! Registry Infrastructure
//! ├── EventSource        (convenience registration, inference, config errors)
//! │   ├── CategoryResolver   (listener type -> category)
//! │   └── HandlerResolver    (handler name -> Dispatcher)
//! └── EventRegistry      (category table, locking, dispatch, lazy purge)
//!     ├── TargetRef          (strong / weak target ownership)
//!     ├── Dispatcher         (delivers one event to one target)
//!     └── RecoveryHook       (receives delivery failures)
//! ```

pub mod dispatcher;
pub mod event_registry;
pub mod event_source;
pub mod recovery;
pub mod resolver;
mod table;
pub mod target;

// Re-export main types for easy access
pub use dispatcher::{Dispatcher, HandlerDispatcher};
pub use event_registry::{DispatchSummary, EventRegistry};
pub use event_source::EventSource;
pub use recovery::{DispatchFailure, LogRecovery, RecoveryHook, SilentRecovery};
pub use resolver::{
    CategoryResolver, HandlerResolver, HandlerTable, ListenerTable, ListenerType, NamingConvention,
};
pub use target::{SharedTarget, TargetKey, TargetRef};
