use super::fixtures::{BaseEvent, ClickEvent, InputEvent, KeyEvent, ResizeEvent};
use event_registry::{Event, EventCategory};
use proptest::prelude::*;

/// Number of distinct listeners used by generated operation sequences
pub const LISTENERS: usize = 4;

/// Categories of the test hierarchy, indexable by generated values
pub fn categories() -> [EventCategory; 5] {
    [
        EventCategory::of::<BaseEvent>(),
        EventCategory::of::<InputEvent>(),
        EventCategory::of::<ClickEvent>(),
        EventCategory::of::<KeyEvent>(),
        EventCategory::of::<ResizeEvent>(),
    ]
}

/// An instance of the category at `index`
pub fn event_for(index: usize) -> Box<dyn Event> {
    match index {
        0 => Box::new(BaseEvent),
        1 => Box::new(InputEvent),
        2 => Box::new(ClickEvent { x: 1, y: 2 }),
        3 => Box::new(KeyEvent { code: 13 }),
        _ => Box::new(ResizeEvent),
    }
}

#[derive(Debug, Clone)]
pub enum RegistryOp {
    Register {
        listener: usize,
        category: usize,
        strong: bool,
    },
    Unregister {
        listener: usize,
        category: usize,
    },
    Dispatch {
        event: usize,
    },
    Clear,
}

/// Strategy for generating a single registry operation
pub fn registry_op_strategy() -> impl Strategy<Value = RegistryOp> {
    prop_oneof![
        4 => (0..LISTENERS, 0..5usize, any::<bool>()).prop_map(|(listener, category, strong)| {
            RegistryOp::Register {
                listener,
                category,
                strong,
            }
        }),
        2 => (0..LISTENERS, 0..5usize)
            .prop_map(|(listener, category)| RegistryOp::Unregister { listener, category }),
        3 => (0..5usize).prop_map(|event| RegistryOp::Dispatch { event }),
        1 => Just(RegistryOp::Clear),
    ]
}

/// Strategy for generating operation sequences
pub fn registry_ops_strategy() -> impl Strategy<Value = Vec<RegistryOp>> {
    prop::collection::vec(registry_op_strategy(), 0..40)
}

/// Strategy for generating `(strong, dropped)` flags for a set of listeners
pub fn weak_population_strategy() -> impl Strategy<Value = Vec<(bool, bool)>> {
    prop::collection::vec((any::<bool>(), any::<bool>()), 1..16)
}
