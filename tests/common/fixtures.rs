use event_registry::registry::{DispatchFailure, HandlerDispatcher, RecoveryHook};
use event_registry::{event_type, Dispatcher, Event, EventRegistry, RegistryConfig};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Root of the test hierarchy
pub struct BaseEvent;
/// Abstract input category
pub struct InputEvent;
pub struct ClickEvent {
    pub x: i32,
    pub y: i32,
}
pub struct KeyEvent {
    pub code: u32,
}
pub struct ResizeEvent;

event_type!(extensible BaseEvent);
event_type!(extensible InputEvent: BaseEvent);
event_type!(ClickEvent: InputEvent);
event_type!(KeyEvent: InputEvent);
event_type!(ResizeEvent: BaseEvent);

pub fn click() -> ClickEvent {
    ClickEvent { x: 10, y: 20 }
}

/// Deliveries in the order they happened, shared by several listeners
pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub struct Listener {
    pub id: &'static str,
    pub hits: AtomicUsize,
    journal: Journal,
}

impl Listener {
    pub fn new(id: &'static str, journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            id,
            hits: AtomicUsize::new(0),
            journal: Arc::clone(journal),
        })
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    fn record(&self, entry: String) {
        self.hits.fetch_add(1, Ordering::SeqCst);
        self.journal.lock().push(entry);
    }
}

/// Records `<listener id>` for every delivery
pub fn recording() -> Arc<dyn Dispatcher> {
    HandlerDispatcher::without_event("record", |l: &Listener| {
        l.record(l.id.to_string());
        Ok(())
    })
    .into_shared()
}

/// Records `<listener id>:<label>` for every delivery
pub fn recording_as(label: &'static str) -> Arc<dyn Dispatcher> {
    HandlerDispatcher::dynamic(label, move |l: &Listener, _: &dyn Event| {
        l.record(format!("{}:{label}", l.id));
        Ok(())
    })
    .into_shared()
}

pub fn failing(message: &'static str) -> Arc<dyn Dispatcher> {
    HandlerDispatcher::without_event("failing", move |_: &Listener| {
        Err(anyhow::anyhow!(message).into())
    })
    .into_shared()
}

pub fn panicking() -> Arc<dyn Dispatcher> {
    HandlerDispatcher::without_event("panicking", |_: &Listener| -> Result<(), event_registry::BoxError> {
        panic!("listener exploded")
    })
    .into_shared()
}

/// Recovery hook remembering every failure it saw
#[derive(Default)]
pub struct CollectingHook {
    failures: Mutex<Vec<String>>,
}

impl CollectingHook {
    pub fn failures(&self) -> Vec<String> {
        self.failures.lock().clone()
    }
}

impl RecoveryHook for CollectingHook {
    fn handle_dispatch_error(&self, failure: DispatchFailure<'_>) {
        self.failures
            .lock()
            .push(format!("{}: {}", failure.dispatcher, failure.error));
    }
}

/// Registry that does not log expected failures
pub fn quiet_registry() -> EventRegistry {
    EventRegistry::with_config(RegistryConfig {
        log_failures: false,
        ..RegistryConfig::default()
    })
}
