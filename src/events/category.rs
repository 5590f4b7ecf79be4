//! # Event Categories
//!
//! Categories are type identifiers arranged in a subtype lattice. Rust has no
//! class inheritance, so every event type declares its direct supertypes
//! through [`EventType::supertypes`]; abstract marker types play the role of
//! base classes and interfaces.

use std::any::{Any, TypeId};
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A type usable as an event category
pub trait EventType: Any + Send + Sync {
    /// Whether other categories may name this one as a supertype.
    ///
    /// `event_type!` rejects a parent that is not extensible at compile time.
    const EXTENSIBLE: bool = false;

    /// Direct supertypes of this category
    fn supertypes() -> Vec<EventCategory>
    where
        Self: Sized,
    {
        Vec::new()
    }
}

/// Identifier of an event category
#[derive(Clone, Copy)]
pub struct EventCategory {
    id: TypeId,
    name: &'static str,
    extensible: bool,
    supertypes: fn() -> Vec<EventCategory>,
}

impl EventCategory {
    pub fn of<E: EventType>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: std::any::type_name::<E>(),
            extensible: E::EXTENSIBLE,
            supertypes: E::supertypes,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path
    pub fn short_name(&self) -> &'static str {
        short_type_name(self.name)
    }

    /// True if events of other types may be delivered under this category
    pub fn is_extensible(&self) -> bool {
        self.extensible
    }

    pub fn direct_supertypes(&self) -> Vec<EventCategory> {
        (self.supertypes)()
    }

    /// This category followed by all of its ancestors, breadth-first.
    ///
    /// Diamonds are visited once and declaration cycles terminate.
    pub fn ancestry(&self) -> Vec<EventCategory> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([*self]);
        let mut ancestry = Vec::new();

        while let Some(category) = queue.pop_front() {
            if !seen.insert(category.id) {
                continue;
            }
            ancestry.push(category);
            queue.extend(category.direct_supertypes());
        }

        ancestry
    }

    /// True if `other` is this category or one of its descendants
    pub fn is_assignable_from(&self, other: &EventCategory) -> bool {
        if self.id == other.id {
            return true;
        }
        other.ancestry().iter().any(|ancestor| ancestor.id == self.id)
    }

    /// True if the runtime type of `event` satisfies this category
    pub fn matches(&self, event: &dyn Event) -> bool {
        self.is_assignable_from(&event.category())
    }
}

impl PartialEq for EventCategory {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventCategory {}

impl Hash for EventCategory {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventCategory").field(&self.name).finish()
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Runtime view of a published event
pub trait Event: Any + Send + Sync {
    /// Category of the event's concrete type
    fn category(&self) -> EventCategory;

    fn as_any(&self) -> &dyn Any;
}

impl<E: EventType> Event for E {
    fn category(&self) -> EventCategory {
        EventCategory::of::<E>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl dyn Event {
    pub fn is<E: EventType>(&self) -> bool {
        self.as_any().is::<E>()
    }

    pub fn downcast_ref<E: EventType>(&self) -> Option<&E> {
        self.as_any().downcast_ref::<E>()
    }
}

impl fmt::Debug for dyn Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Event({})", self.category().name())
    }
}

pub(crate) fn short_type_name(name: &'static str) -> &'static str {
    // Generic arguments may contain `::` themselves
    let base = name.split('<').next().unwrap_or(name);
    match base.rfind("::") {
        Some(idx) => &name[idx + 2..],
        None => name,
    }
}

/// Implement [`EventType`] for a type, optionally naming its direct supertypes.
///
/// A type used as a supertype must be declared `extensible`.
///
/// ```
/// use event_registry::event_type;
///
/// struct UiEvent;
/// struct ClickEvent { x: i32, y: i32 }
///
/// event_type!(extensible UiEvent);
/// event_type!(ClickEvent: UiEvent);
/// ```
///
/// ```compile_fail
/// use event_registry::event_type;
///
/// struct KeyEvent;
/// struct ShortcutEvent;
///
/// event_type!(KeyEvent);
/// event_type!(ShortcutEvent: KeyEvent);
/// ```
#[macro_export]
macro_rules! event_type {
    (extensible $ty:ty) => {
        impl $crate::events::EventType for $ty {
            const EXTENSIBLE: bool = true;
        }
    };
    (extensible $ty:ty : $($parent:ty),+ $(,)?) => {
        $crate::event_type!(@parents $($parent),+);
        impl $crate::events::EventType for $ty {
            const EXTENSIBLE: bool = true;

            fn supertypes() -> ::std::vec::Vec<$crate::events::EventCategory> {
                ::std::vec![$($crate::events::EventCategory::of::<$parent>()),+]
            }
        }
    };
    (@parents $($parent:ty),+) => {
        $(
            const _: () = ::std::assert!(
                <$parent as $crate::events::EventType>::EXTENSIBLE,
                "supertypes must be declared with `event_type!(extensible ...)`"
            );
        )+
    };
    ($ty:ty) => {
        impl $crate::events::EventType for $ty {}
    };
    ($ty:ty : $($parent:ty),+ $(,)?) => {
        $crate::event_type!(@parents $($parent),+);
        impl $crate::events::EventType for $ty {
            fn supertypes() -> ::std::vec::Vec<$crate::events::EventCategory> {
                ::std::vec![$($crate::events::EventCategory::of::<$parent>()),+]
            }
        }
    };
}
