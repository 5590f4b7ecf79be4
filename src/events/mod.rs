pub mod category;

// Re-export key types for convenience
pub use category::{Event, EventCategory, EventType};
